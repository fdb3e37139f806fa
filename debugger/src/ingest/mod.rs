//! Trace ingestion: the only module that reads raw trace text.
//!
//! A trace file is newline-delimited JSON: one header record (agent identity
//! and the static plan library) followed by one record per reasoning cycle.
//! [`builder::parse_trace`] turns a file's contents into an [`crate::model::AgentTrace`];
//! [`repository::AgentRepository`] caches built traces per agent.

pub mod builder;
pub(crate) mod record;
pub mod repository;

pub use builder::parse_trace;
pub use repository::AgentRepository;
