//! In-memory model of one agent's completed execution.
//!
//! Entities live in arenas owned by [`trace::AgentTrace`] and reference each
//! other by id only, never by value. All of them are immutable once the
//! trace has been built.

pub mod bdi;
pub mod trace;

pub use bdi::{
    BdiEvent, BeliefChange, EventKind, ExpansionResult, FailureDetail, GoalExpansion, Instruction,
    InstructionKind, Intention, Plan,
};
pub use trace::AgentTrace;
