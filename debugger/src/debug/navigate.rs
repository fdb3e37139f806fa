//! Depth-first single-fault navigation over a goal tree.
//!
//! Pull-based protocol: the shell calls [`Navigator::next`] for the node to
//! judge, collects the oracle's verdict, calls [`Navigator::mark`], and
//! repeats until `next` returns `None`. Each node is handed out and marked
//! at most once, so the search asks at most one question per tree node.

use crate::debug::tree::{GoalTree, Judgment, NodeId};
use crate::error::ProtocolError;

/// Stateful search that narrows an observed misbehavior to one tree node.
///
/// Assumes a consistent oracle and at most one faulty node per tree. If the
/// whole tree is exonerated the search concludes with [`Navigator::final_bug`]
/// unset, which means "no bug in this tree", not "no bug exists".
pub struct Navigator {
    tree: GoalTree,
    current: Option<NodeId>,
    final_bug: Option<NodeId>,
    concluded: bool,
}

impl Navigator {
    pub fn new(tree: GoalTree) -> Self {
        Self {
            tree,
            current: None,
            final_bug: None,
            concluded: false,
        }
    }

    pub fn tree(&self) -> &GoalTree {
        &self.tree
    }

    /// Hand out the next node requiring an oracle judgment.
    ///
    /// Returns `Ok(None)` permanently once the search has concluded. The
    /// previously handed-out node must have been marked valid or invalid.
    pub fn next(&mut self) -> Result<Option<NodeId>, ProtocolError> {
        if self.concluded {
            return Ok(None);
        }

        let current = match self.current {
            None => {
                // First call: start at the root.
                let root = self.tree.root();
                self.current = Some(root);
                return Ok(Some(root));
            }
            Some(current) => current,
        };

        match self.tree.node(current).judgment {
            Judgment::Undecided | Judgment::Skipped => Err(ProtocolError::UnjudgedCurrent),
            Judgment::Invalid => {
                // The node's result was wrong, but the root cause may lie in
                // a sub-expansion it spawned: check depth before blaming it.
                match self.tree.node(current).children.first() {
                    Some(&child) => {
                        self.current = Some(child);
                        Ok(Some(child))
                    }
                    None => {
                        self.final_bug = Some(current);
                        self.concluded = true;
                        Ok(None)
                    }
                }
            }
            Judgment::Valid => {
                if let Some(sibling) = self.tree.node(current).next_sibling {
                    self.current = Some(sibling);
                    return Ok(Some(sibling));
                }
                // Last sibling exonerated; every earlier sibling was valid
                // too, or the search could not have advanced past it. An
                // invalid parent whose children all validated is itself the
                // root cause.
                if let Some(parent) = self.tree.node(current).parent
                    && self.tree.node(parent).judgment == Judgment::Invalid
                {
                    self.final_bug = Some(parent);
                }
                self.concluded = true;
                Ok(None)
            }
        }
    }

    /// Record the oracle's verdict for a node handed out by [`Navigator::next`].
    ///
    /// Must be called exactly once per handed-out node.
    pub fn mark(&mut self, node: NodeId, judgment: Judgment) -> Result<(), ProtocolError> {
        if judgment == Judgment::Undecided {
            return Err(ProtocolError::InvalidVerdict);
        }
        if self.current != Some(node) {
            return Err(ProtocolError::NotCurrent);
        }
        let node = self.tree.node_mut(node);
        if node.judgment != Judgment::Undecided {
            return Err(ProtocolError::AlreadyMarked);
        }
        node.judgment = judgment;
        Ok(())
    }

    /// The localized faulty node, once the search has concluded with one.
    pub fn final_bug(&self) -> Option<NodeId> {
        self.final_bug
    }
}
