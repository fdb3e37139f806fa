//! Algorithmic debugger for completed BDI agent execution traces.
//!
//! The crate reconstructs the causal history of one agent (intentions,
//! goal-expansions, events, belief changes) from an append-only trace and
//! drives an oracle-guided search that narrows an observed misbehavior to a
//! single faulty goal-expansion and, where possible, a single instruction.
//! The architecture keeps a strict separation:
//!
//! - **[`model`]**: immutable entities and the [`model::AgentTrace`] arena.
//! - **[`ingest`]**: the only module reading raw trace text; builds traces
//!   fail-closed and caches them per agent.
//! - **[`state`]**: pure point-in-time queries over a built trace.
//! - **[`debug`]**: goal-tree construction plus the pull-based
//!   `next`/`mark` navigation and instruction localization protocols, so
//!   the core has no dependency on any UI event loop.
//!
//! The CLI in `main.rs` is a thin shell: it renders snapshots and prompts,
//! and feeds oracle verdicts back into the protocols.

pub mod config;
pub mod debug;
pub mod error;
pub mod exit_codes;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod state;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
