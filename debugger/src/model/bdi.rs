//! BDI entities reconstructed from a trace.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Plan template from the agent's static plan library.
///
/// Immutable except for `used`, which counts how many times the plan was
/// selected as an intended means over the whole trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub label: String,
    pub trigger: String,
    pub context: String,
    pub body: String,
    pub file: String,
    pub line: u32,
    pub used: u32,
}

/// Kind of a posted event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    BeliefUpdate,
    SubGoal,
    NewFocusGoal,
}

/// A notification (belief change or goal request) that may cause a new
/// goal-expansion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BdiEvent {
    pub id: u64,
    /// Goal-expansion whose execution raised this event. Belief-driven
    /// events and initial goals have none.
    pub parent: Option<u64>,
    pub trigger: String,
    pub kind: EventKind,
    pub cycle_posted: u64,
    /// Set exactly once when the event is selected for handling.
    pub cycle_selected: Option<u64>,
}

/// Result tag of a concluded goal-expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpansionResult {
    Running,
    Achieved,
    NoApplicablePlan,
    Failed,
}

/// Failure detail attached to a goal-expansion that ended `Failed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureDetail {
    pub message: String,
    pub kind: String,
    pub file: Option<String>,
    pub line: Option<u32>,
}

/// Classified kind of an executed instruction, derived from its text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstructionKind {
    AchievementGoal,
    AchievementGoalNewFocus,
    TestGoal,
    Action,
    InternalAction,
    MentalNote,
    Expression,
}

impl InstructionKind {
    /// Classify an instruction from its source text.
    pub fn classify(text: &str) -> Self {
        let text = text.trim_start();
        if text.starts_with("!!") {
            Self::AchievementGoalNewFocus
        } else if text.starts_with('!') {
            Self::AchievementGoal
        } else if text.starts_with('?') {
            Self::TestGoal
        } else if text.starts_with('+') || text.starts_with('-') {
            Self::MentalNote
        } else if text.starts_with('.') {
            Self::InternalAction
        } else if is_action_call(text) {
            Self::Action
        } else {
            Self::Expression
        }
    }
}

/// A bare atom or `functor(args)` with a lowercase functor is an action;
/// anything else (operators, variables) is an expression.
fn is_action_call(text: &str) -> bool {
    let functor = text.split('(').next().unwrap_or("").trim();
    !functor.is_empty()
        && functor
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_lowercase())
        && functor.chars().all(|c| c.is_alphanumeric() || c == '_')
}

/// One instruction executed inside a goal-expansion. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub file: String,
    pub line: u32,
    pub text: String,
    pub cycle: u64,
    pub kind: InstructionKind,
    /// Substitution snapshot at execution time, if the producer recorded one.
    pub unifier: Option<BTreeMap<String, String>>,
}

/// One attempt to achieve or test a goal occurrence using one selected plan
/// (an "intended means").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoalExpansion {
    pub id: u64,
    /// Owning intention.
    pub intention: u64,
    pub start: u64,
    /// `None` while the expansion is unresolved.
    pub end: Option<u64>,
    pub result: ExpansionResult,
    pub failure: Option<FailureDetail>,
    /// Label of the plan this expansion instantiated.
    pub plan: String,
    pub trigger: String,
    pub context: String,
    pub file: String,
    pub line: u32,
    pub instructions: Vec<Instruction>,
    /// Child expansions in the order their sub-goals were posted.
    pub children: Vec<u64>,
    pub parent: Option<u64>,
    /// Event whose selection caused this expansion.
    pub event: Option<u64>,
}

impl GoalExpansion {
    /// True if the expansion's `[start, end]` window contains `cycle`
    /// (an unresolved end counts as infinity).
    pub fn active_at(&self, cycle: u64) -> bool {
        self.start <= cycle && self.end.is_none_or(|end| cycle <= end)
    }
}

/// One independent focus of execution within the agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Intention {
    pub id: u64,
    pub start: u64,
    pub end: Option<u64>,
    /// Goal-expansions belonging to this intention, in creation order.
    pub means: Vec<u64>,
    /// Events this intention raised or was created for.
    pub events: Vec<u64>,
}

impl Intention {
    pub fn active_at(&self, cycle: u64) -> bool {
        self.start <= cycle && self.end.is_none_or(|end| cycle <= end)
    }
}

/// Append-only belief log entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeliefChange {
    pub cycle: u64,
    /// True for `+belief`, false for `-belief`.
    pub added: bool,
    pub belief: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_covers_all_marker_prefixes() {
        let cases = [
            ("!!alert(owner)", InstructionKind::AchievementGoalNewFocus),
            ("!prepare", InstructionKind::AchievementGoal),
            ("?ready(X)", InstructionKind::TestGoal),
            ("+prepared", InstructionKind::MentalNote),
            ("-stale(X)", InstructionKind::MentalNote),
            (".print(go)", InstructionKind::InternalAction),
            ("launch_rocket", InstructionKind::Action),
            ("move(3, 4)", InstructionKind::Action),
            ("X = Y + 1", InstructionKind::Expression),
        ];
        for (text, expected) in cases {
            assert_eq!(InstructionKind::classify(text), expected, "{text}");
        }
    }

    #[test]
    fn active_window_treats_open_end_as_infinity() {
        let open = GoalExpansion {
            id: 1,
            intention: 1,
            start: 3,
            end: None,
            result: ExpansionResult::Running,
            failure: None,
            plan: "p".to_string(),
            trigger: "+!g".to_string(),
            context: "T".to_string(),
            file: "a.asl".to_string(),
            line: 1,
            instructions: Vec::new(),
            children: Vec::new(),
            parent: None,
            event: None,
        };
        assert!(!open.active_at(2));
        assert!(open.active_at(3));
        assert!(open.active_at(1_000_000));

        let closed = GoalExpansion {
            end: Some(5),
            ..open
        };
        assert!(closed.active_at(5));
        assert!(!closed.active_at(6));
    }
}
