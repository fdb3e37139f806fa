//! Algorithmic debugging: goal-tree construction, the oracle-driven
//! navigation search, and instruction-level localization.

pub mod localize;
pub mod navigate;
pub mod tree;

pub use localize::{Guidance, InstructionPrompt, LocalizeOutcome, Localizer, Verdict};
pub use navigate::Navigator;
pub use tree::{GoalTree, Judgment, NodeId, TreeNode};
