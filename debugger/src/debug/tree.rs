//! Rooted goal-expansion tree for one debugging session.
//!
//! The tree is a derived view over the trace: a flat arena of nodes indexed
//! by [`NodeId`], mirroring the trace's parent/child links in spawn order.
//! The only mutable state is each node's judgment.

use crate::error::TraceError;
use crate::model::AgentTrace;

/// Index into the tree's node arena.
pub type NodeId = usize;

/// Oracle judgment state of one tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Judgment {
    Undecided,
    Valid,
    Invalid,
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    /// Goal-expansion this node mirrors.
    pub expansion: u64,
    /// Display label: trigger text plus expansion id.
    pub label: String,
    pub parent: Option<NodeId>,
    /// Children in the order their sub-goals were posted.
    pub children: Vec<NodeId>,
    /// Immediate next sibling, used for sibling-skip during navigation.
    pub next_sibling: Option<NodeId>,
    pub judgment: Judgment,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoalTree {
    pub(crate) nodes: Vec<TreeNode>,
    pub(crate) root: NodeId,
}

impl GoalTree {
    /// Build the tree rooted at `root_expansion` by walking the trace's
    /// existing parent/child links.
    pub fn build(trace: &AgentTrace, root_expansion: u64) -> Result<Self, TraceError> {
        let mut tree = Self {
            nodes: Vec::new(),
            root: 0,
        };
        tree.root = tree.add_subtree(trace, root_expansion, None)?;
        Ok(tree)
    }

    /// Ids of the expansions that instantiated the given plan, in id order.
    /// Each is a candidate root for a debugging session.
    pub fn roots_for_plan(trace: &AgentTrace, label: &str) -> Vec<u64> {
        trace
            .expansions()
            .filter(|expansion| expansion.plan == label)
            .map(|expansion| expansion.id)
            .collect()
    }

    fn add_subtree(
        &mut self,
        trace: &AgentTrace,
        expansion_id: u64,
        parent: Option<NodeId>,
    ) -> Result<NodeId, TraceError> {
        let expansion = trace
            .expansion(expansion_id)
            .ok_or(TraceError::UnknownExpansion { id: expansion_id })?;

        let id = self.nodes.len();
        self.nodes.push(TreeNode {
            expansion: expansion_id,
            label: format!("{} id={}", expansion.trigger, expansion.id),
            parent,
            children: Vec::new(),
            next_sibling: None,
            judgment: Judgment::Undecided,
        });

        let mut children = Vec::with_capacity(expansion.children.len());
        for &child_expansion in &expansion.children {
            children.push(self.add_subtree(trace, child_expansion, Some(id))?);
        }
        for pair in children.windows(2) {
            self.nodes[pair[0]].next_sibling = Some(pair[1]);
        }
        self.nodes[id].children = children;
        Ok(id)
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &TreeNode {
        &self.nodes[id]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut TreeNode {
        &mut self.nodes[id]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Pre-order traversal with the depth of each node.
    pub fn traverse(&self) -> Vec<(NodeId, usize)> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![(self.root, 0)];
        while let Some((id, depth)) = stack.pop() {
            out.push((id, depth));
            for &child in self.node(id).children.iter().rev() {
                stack.push((child, depth + 1));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::parse_trace;
    use crate::test_support::sample_log;

    #[test]
    fn build_mirrors_spawn_order_with_sibling_links() {
        let trace = parse_trace(&sample_log()).expect("parse");
        let tree = GoalTree::build(&trace, 100).expect("build");

        assert_eq!(tree.len(), 3);
        let root = tree.node(tree.root());
        assert_eq!(root.expansion, 100);
        assert_eq!(root.label, "+!start id=100");
        assert_eq!(root.parent, None);
        assert_eq!(root.children.len(), 2);

        let first = tree.node(root.children[0]);
        let second = tree.node(root.children[1]);
        assert_eq!(first.expansion, 101);
        assert_eq!(second.expansion, 102);
        assert_eq!(first.next_sibling, Some(root.children[1]));
        assert_eq!(second.next_sibling, None);
        assert_eq!(first.parent, Some(tree.root()));
        assert_eq!(first.judgment, Judgment::Undecided);
    }

    #[test]
    fn build_rejects_unknown_root() {
        let trace = parse_trace(&sample_log()).expect("parse");
        let err = GoalTree::build(&trace, 999).expect_err("should fail");
        assert!(matches!(err, TraceError::UnknownExpansion { id: 999 }));
    }

    #[test]
    fn roots_for_plan_finds_instantiations() {
        let trace = parse_trace(&sample_log()).expect("parse");
        assert_eq!(GoalTree::roots_for_plan(&trace, "p0"), vec![100]);
        assert_eq!(GoalTree::roots_for_plan(&trace, "p2"), vec![102]);
        assert!(GoalTree::roots_for_plan(&trace, "ghost").is_empty());
    }

    #[test]
    fn traverse_is_preorder_with_depths() {
        let trace = parse_trace(&sample_log()).expect("parse");
        let tree = GoalTree::build(&trace, 100).expect("build");
        let order: Vec<(u64, usize)> = tree
            .traverse()
            .into_iter()
            .map(|(id, depth)| (tree.node(id).expansion, depth))
            .collect();
        assert_eq!(order, vec![(100, 0), (101, 1), (102, 1)]);
    }
}
