//! Test-only helpers for building traces, logs, and goal trees.

use std::fs;
use std::path::{Path, PathBuf};

use crate::debug::tree::{GoalTree, Judgment, NodeId, TreeNode};
use crate::model::{AgentTrace, BeliefChange};

/// A small but complete trace for agent `bob`: one intention, a root
/// goal-expansion (`+!start`, id 100) with two children (`+!prepare`, id 101,
/// achieved; `+!launch`, id 102, failed), instructions, beliefs, and a
/// failure detail on the failed expansion.
pub fn sample_log() -> String {
    [
        r#"{"agent":"bob","platform":"jason","source":"bob.asl","plans":{"p0":{"trigger":"+!start","ctx":"T","body":"!prepare; !launch","file":"bob.asl","line":5},"p1":{"trigger":"+!prepare","ctx":"ready","body":"+prepared","file":"bob.asl","line":12},"p2":{"trigger":"+!launch","ctx":"prepared","body":".print(go); launch_rocket","file":"bob.asl","line":20}}}"#,
        r#"{"nr":1,"B+":["ready"]}"#,
        r#"{"nr":2,"E+":[{"id":1,"t":"+!start","src":"E","nf":true}]}"#,
        r#"{"nr":3,"I+":10,"IM+":[{"id":100,"i":10,"plan":"p0","trigger":"+!start","ctx":"T","file":"bob.asl","line":5}],"SE":1}"#,
        r#"{"nr":4,"I":{"im":100,"file":"bob.asl","line":6,"instr":"!prepare"},"E+":[{"id":2,"t":"+!prepare","src":"E"}]}"#,
        r#"{"nr":5,"IM+":[{"id":101,"i":10,"plan":"p1","trigger":"+!prepare","ctx":"ready","file":"bob.asl","line":12}],"SE":2}"#,
        r#"{"nr":6,"I":{"im":101,"file":"bob.asl","line":13,"instr":"+prepared"},"B+":["prepared"]}"#,
        r#"{"nr":7,"IM-":[{"id":101,"res":"achieved"}]}"#,
        r#"{"nr":8,"I":{"im":100,"file":"bob.asl","line":7,"instr":"!launch"},"E+":[{"id":3,"t":"+!launch","src":"E"}]}"#,
        r#"{"nr":9,"IM+":[{"id":102,"i":10,"plan":"p2","trigger":"+!launch","ctx":"prepared","file":"bob.asl","line":20}],"SE":3}"#,
        r#"{"nr":10,"I":{"im":102,"file":"bob.asl","line":21,"instr":".print(go)"},"U":{"X":"go"}}"#,
        r#"{"nr":11,"I":{"im":102,"file":"bob.asl","line":22,"instr":"launch_rocket"}}"#,
        r#"{"nr":12,"IM-":[{"id":102,"res":"failed","reason":{"msg":"no rocket","type":"action_failed","file":"bob.asl","line":22}}],"B-":["ready"]}"#,
        r#"{"nr":13,"IM-":[{"id":100,"res":"failed"}],"I-":[10]}"#,
        "",
    ]
    .join("\n")
}

/// A header-only log followed by one belief change per cycle. Changes are
/// `(cycle, "+belief")` or `(cycle, "-belief")`.
pub fn belief_log(changes: &[(u64, &str)]) -> String {
    let mut log = String::from("{\"agent\":\"a\",\"plans\":{}}\n");
    for (cycle, change) in changes {
        let (key, belief) = if let Some(belief) = change.strip_prefix('+') {
            ("B+", belief)
        } else if let Some(belief) = change.strip_prefix('-') {
            ("B-", belief)
        } else {
            panic!("belief change must start with + or -: {change}");
        };
        log.push_str(&format!("{{\"nr\":{cycle},\"{key}\":[\"{belief}\"]}}\n"));
    }
    log
}

/// An otherwise-empty trace carrying raw belief changes, bypassing the
/// ingestor's integrity checks. Changes are `(cycle, added, belief)`.
pub fn trace_with_belief_changes(changes: &[(u64, bool, &str)]) -> AgentTrace {
    AgentTrace {
        agent: "a".to_string(),
        platform: String::new(),
        source: String::new(),
        plans: Default::default(),
        intentions: Default::default(),
        expansions: Default::default(),
        events: Default::default(),
        beliefs: changes
            .iter()
            .map(|&(cycle, added, belief)| BeliefChange {
                cycle,
                added,
                belief: belief.to_string(),
            })
            .collect(),
        last_cycle: changes.last().map_or(0, |&(cycle, ..)| cycle),
    }
}

/// Temporary folder of agent logs for repository and CLI tests.
pub struct LogDir {
    temp: tempfile::TempDir,
}

impl LogDir {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            temp: tempfile::tempdir().expect("tempdir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp.path()
    }

    /// Write `<agent>.log` into the folder and return its path.
    pub fn add_agent(&self, agent: &str, contents: &str) -> PathBuf {
        let path = self.temp.path().join(format!("{agent}.log"));
        fs::write(&path, contents).expect("write agent log");
        path
    }
}

fn bare_node(expansion: u64, parent: Option<NodeId>) -> TreeNode {
    TreeNode {
        expansion,
        label: format!("+!g{expansion} id={expansion}"),
        parent,
        children: Vec::new(),
        next_sibling: None,
        judgment: Judgment::Undecided,
    }
}

/// A single-node tree.
pub fn leaf_tree() -> GoalTree {
    GoalTree {
        nodes: vec![bare_node(1, None)],
        root: 0,
    }
}

/// A root with `n` leaf children, sibling-linked in order.
pub fn tree_with_children(n: usize) -> GoalTree {
    let mut nodes = vec![bare_node(1, None)];
    for index in 0..n {
        let id = nodes.len();
        nodes.push(bare_node(10 + index as u64, Some(0)));
        nodes[0].children.push(id);
        if index > 0 {
            nodes[id - 1].next_sibling = Some(id);
        }
    }
    GoalTree { nodes, root: 0 }
}

/// `root -> [a -> [a1], b]`: four nodes with one inner subtree.
pub fn nested_tree() -> GoalTree {
    let mut nodes = vec![
        bare_node(1, None),
        bare_node(2, Some(0)),
        bare_node(3, Some(1)),
        bare_node(4, Some(0)),
    ];
    nodes[0].children = vec![1, 3];
    nodes[1].children = vec![2];
    nodes[1].next_sibling = Some(3);
    GoalTree { nodes, root: 0 }
}
