//! Error taxonomy: trace-integrity faults vs. protocol misuse.
//!
//! Inconclusive-but-valid outcomes (search finishing without a bug,
//! localization finding no culprit) are ordinary values, never errors.

use thiserror::Error;

/// Fatal trace-integrity fault.
///
/// Ingestion aborts on the first fault and never publishes a partially
/// built trace; downstream components assume full referential integrity.
#[derive(Debug, Error)]
pub enum TraceError {
    #[error("read trace {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("trace is empty: missing header record")]
    MissingHeader,

    #[error("line {line}: malformed record: {source}")]
    Malformed {
        /// 1-based line number in the trace file.
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("cycle {cycle}: unknown {kind} id {id}")]
    UnknownId {
        cycle: u64,
        kind: &'static str,
        id: u64,
    },

    #[error("cycle {cycle}: unknown plan '{label}'")]
    UnknownPlan { cycle: u64, label: String },

    #[error("cycle {cycle}: duplicate {kind} id {id}")]
    DuplicateId {
        cycle: u64,
        kind: &'static str,
        id: u64,
    },

    #[error("cycle {cycle}: {kind} {id} resolved twice")]
    ResolvedTwice {
        cycle: u64,
        kind: &'static str,
        id: u64,
    },

    #[error("cycle {cycle}: cycle number does not increase (previous {previous})")]
    OutOfOrderCycle { cycle: u64, previous: u64 },

    #[error("cycle {cycle}: removal of absent belief '{belief}'")]
    AbsentBelief { cycle: u64, belief: String },

    #[error("unknown goal-expansion {id}")]
    UnknownExpansion { id: u64 },
}

/// Misuse of the pull-based navigation/localization protocol.
///
/// Tolerating any of these silently would break the single-visit-per-node
/// termination guarantee, so they surface to the caller instead.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("current node must be judged valid or invalid before requesting the next one")]
    UnjudgedCurrent,

    #[error("node was not handed out for judgment")]
    NotCurrent,

    #[error("node already marked")]
    AlreadyMarked,

    #[error("a node cannot be marked undecided")]
    InvalidVerdict,

    #[error("outstanding prompt must be answered before requesting the next one")]
    UnansweredPrompt,

    #[error("no outstanding prompt to answer")]
    NoPrompt,
}
