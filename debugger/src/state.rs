//! Point-in-time state reconstruction over an immutable trace.
//!
//! Both queries are pure functions of the [`AgentTrace`]: each call folds
//! the belief log and scans the arenas from scratch, so they may be called
//! any number of times in any order.

use std::collections::BTreeSet;

use crate::error::TraceError;
use crate::model::AgentTrace;

/// Reconstructed agent state at one cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentState {
    pub beliefs: BTreeSet<String>,
    /// Ids of goal-expansions whose window contains the cycle.
    pub active_expansions: BTreeSet<u64>,
    /// Ids of intentions whose window contains the cycle.
    pub active_intentions: Vec<u64>,
}

/// What changed between two cycles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateDiff {
    pub beliefs_added: BTreeSet<String>,
    pub beliefs_removed: BTreeSet<String>,
    /// Expansions started at or after the first cycle.
    pub expansions_started: Vec<u64>,
    /// Expansions resolved by the second cycle.
    pub expansions_finished: Vec<u64>,
}

/// Reconstruct the agent's state at `cycle`.
///
/// Beliefs fold every change with `change.cycle <= cycle` in trace order;
/// removing a belief that is not currently held is a trace-integrity fault,
/// never a silent no-op.
pub fn state_at(trace: &AgentTrace, cycle: u64) -> Result<AgentState, TraceError> {
    let mut beliefs = BTreeSet::new();
    for change in trace.belief_changes() {
        if change.cycle > cycle {
            break;
        }
        if change.added {
            beliefs.insert(change.belief.clone());
        } else if !beliefs.remove(&change.belief) {
            return Err(TraceError::AbsentBelief {
                cycle: change.cycle,
                belief: change.belief.clone(),
            });
        }
    }

    let active_expansions = trace
        .expansions()
        .filter(|expansion| expansion.active_at(cycle))
        .map(|expansion| expansion.id)
        .collect();
    let active_intentions = trace
        .intentions()
        .filter(|intention| intention.active_at(cycle))
        .map(|intention| intention.id)
        .collect();

    Ok(AgentState {
        beliefs,
        active_expansions,
        active_intentions,
    })
}

/// Compute what changed between `cycle1` and `cycle2`.
pub fn diff(trace: &AgentTrace, cycle1: u64, cycle2: u64) -> Result<StateDiff, TraceError> {
    let before = state_at(trace, cycle1)?;
    let after = state_at(trace, cycle2)?;

    let beliefs_added = after
        .beliefs
        .difference(&before.beliefs)
        .cloned()
        .collect();
    let beliefs_removed = before
        .beliefs
        .difference(&after.beliefs)
        .cloned()
        .collect();

    let mut expansions_started = Vec::new();
    let mut expansions_finished = Vec::new();
    for expansion in trace.expansions() {
        if expansion.start >= cycle1 {
            expansions_started.push(expansion.id);
        }
        if expansion.end.is_some_and(|end| end <= cycle2) {
            expansions_finished.push(expansion.id);
        }
    }

    Ok(StateDiff {
        beliefs_added,
        beliefs_removed,
        expansions_started,
        expansions_finished,
    })
}

/// Changes introduced by a single cycle.
pub fn cycle_diff(trace: &AgentTrace, cycle: u64) -> Result<StateDiff, TraceError> {
    diff(trace, cycle.saturating_sub(1), cycle)
}
