//! Serde shapes for the raw trace records.
//!
//! Field names follow the log producer's compact keys (`nr`, `I+`, `IM+`,
//! `E+`, `SE`, `I`, `U`, `IM-`, `I-`, `B+`, `B-`). Everything here is an
//! ingestion detail; the rest of the crate only sees the built model.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::model::ExpansionResult;

/// First line of a trace file: agent identity and the static plan library.
#[derive(Debug, Deserialize)]
pub(crate) struct HeaderRecord {
    pub agent: String,
    #[serde(default)]
    pub platform: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub plans: BTreeMap<String, PlanRecord>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PlanRecord {
    pub trigger: String,
    /// Guard/context expression; omitted when trivially true.
    #[serde(default = "trivial_context")]
    pub ctx: String,
    pub body: String,
    pub file: String,
    pub line: u32,
}

fn trivial_context() -> String {
    "T".to_string()
}

/// One reasoning cycle. Every field except `nr` is optional; a cycle record
/// carries only what happened that cycle.
#[derive(Debug, Deserialize)]
pub(crate) struct CycleRecord {
    /// Cycle number, strictly increasing across records.
    pub nr: u64,
    /// Intention created this cycle.
    #[serde(rename = "I+")]
    pub intention_added: Option<u64>,
    /// Goal-expansions created this cycle.
    #[serde(rename = "IM+", default)]
    pub means_added: Vec<MeansAddedRecord>,
    /// Events posted this cycle.
    #[serde(rename = "E+", default)]
    pub events_added: Vec<EventRecord>,
    /// Event selected for handling this cycle.
    #[serde(rename = "SE")]
    pub selected_event: Option<u64>,
    /// Instruction executed this cycle.
    #[serde(rename = "I")]
    pub instruction: Option<InstructionRecord>,
    /// Substitution snapshot for the executed instruction.
    #[serde(rename = "U")]
    pub unifier: Option<BTreeMap<String, String>>,
    /// Goal-expansions resolved this cycle.
    #[serde(rename = "IM-", default)]
    pub means_ended: Vec<MeansEndedRecord>,
    /// Intentions dropped this cycle.
    #[serde(rename = "I-", default)]
    pub intentions_ended: Vec<u64>,
    #[serde(rename = "B+", default)]
    pub beliefs_added: Vec<String>,
    #[serde(rename = "B-", default)]
    pub beliefs_removed: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MeansAddedRecord {
    pub id: u64,
    /// Owning intention.
    pub i: u64,
    pub plan: String,
    pub trigger: String,
    #[serde(default = "trivial_context")]
    pub ctx: String,
    pub file: String,
    pub line: u32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MeansEndedRecord {
    /// `-1` means the selected event had no applicable plan and no
    /// expansion was ever created for it.
    pub id: i64,
    pub res: ExpansionResult,
    pub reason: Option<FailureRecord>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FailureRecord {
    #[serde(default)]
    pub msg: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    pub file: Option<String>,
    pub line: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EventRecord {
    pub id: u64,
    /// Human-readable trigger text.
    pub t: String,
    /// Event source; `"B"` marks a belief-driven event.
    pub src: String,
    /// Present when the goal was posted with new focus (`!!`).
    pub nf: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct InstructionRecord {
    /// Goal-expansion currently executing.
    pub im: u64,
    pub file: String,
    pub line: u32,
    pub instr: String,
}
