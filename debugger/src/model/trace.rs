//! The `AgentTrace` arena owning every entity of one agent's execution.

use std::collections::BTreeMap;

use crate::model::bdi::{BdiEvent, BeliefChange, GoalExpansion, Intention, Plan};

/// Fully cross-linked causal model of one completed agent execution.
///
/// Built once by the ingestor, read-only afterwards. Entities are stored in
/// `BTreeMap` arenas keyed by id so iteration order is deterministic, and
/// they reference each other by id resolved through this trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentTrace {
    pub agent: String,
    pub platform: String,
    pub source: String,
    pub(crate) plans: BTreeMap<String, Plan>,
    pub(crate) intentions: BTreeMap<u64, Intention>,
    pub(crate) expansions: BTreeMap<u64, GoalExpansion>,
    pub(crate) events: BTreeMap<u64, BdiEvent>,
    pub(crate) beliefs: Vec<BeliefChange>,
    pub(crate) last_cycle: u64,
}

impl AgentTrace {
    pub fn plan(&self, label: &str) -> Option<&Plan> {
        self.plans.get(label)
    }

    /// Plans in label order.
    pub fn plans(&self) -> impl Iterator<Item = &Plan> {
        self.plans.values()
    }

    pub fn intention(&self, id: u64) -> Option<&Intention> {
        self.intentions.get(&id)
    }

    pub fn intentions(&self) -> impl Iterator<Item = &Intention> {
        self.intentions.values()
    }

    pub fn expansion(&self, id: u64) -> Option<&GoalExpansion> {
        self.expansions.get(&id)
    }

    pub fn expansions(&self) -> impl Iterator<Item = &GoalExpansion> {
        self.expansions.values()
    }

    pub fn event(&self, id: u64) -> Option<&BdiEvent> {
        self.events.get(&id)
    }

    pub fn events(&self) -> impl Iterator<Item = &BdiEvent> {
        self.events.values()
    }

    /// Belief changes in encounter order.
    pub fn belief_changes(&self) -> &[BeliefChange] {
        &self.beliefs
    }

    /// Highest cycle number seen in the trace.
    pub fn last_cycle(&self) -> u64 {
        self.last_cycle
    }
}
