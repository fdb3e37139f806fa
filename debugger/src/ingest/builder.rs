//! Two-phase trace building.
//!
//! Each line is deserialized as a whole before any of it is applied, then its
//! fields are applied in dependency order (intentions, expansions, events,
//! instruction, resolutions, event selection, beliefs). Expansions created in
//! a cycle are buffered until that cycle's selected event is resolved, so the
//! relative order of creation and selection records does not matter.
//!
//! Building fails closed: the first integrity fault aborts and nothing is
//! published.

use std::collections::{BTreeMap, HashSet};

use tracing::debug;

use crate::error::TraceError;
use crate::ingest::record::{
    CycleRecord, EventRecord, HeaderRecord, MeansAddedRecord, MeansEndedRecord,
};
use crate::model::{
    AgentTrace, BdiEvent, BeliefChange, EventKind, ExpansionResult, FailureDetail, GoalExpansion,
    Instruction, InstructionKind, Intention, Plan,
};

/// Parse one agent's complete trace text into an [`AgentTrace`].
///
/// The first non-empty line must be the header record; every further
/// non-empty line is one cycle record with a strictly increasing `nr`.
pub fn parse_trace(text: &str) -> Result<AgentTrace, TraceError> {
    let mut lines = text
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty());

    let (line_nr, header_line) = lines.next().ok_or(TraceError::MissingHeader)?;
    let header: HeaderRecord =
        serde_json::from_str(header_line).map_err(|source| TraceError::Malformed {
            line: line_nr + 1,
            source,
        })?;

    let mut builder = TraceBuilder::new(header);
    for (line_nr, line) in lines {
        let cycle: CycleRecord =
            serde_json::from_str(line).map_err(|source| TraceError::Malformed {
                line: line_nr + 1,
                source,
            })?;
        builder.apply_cycle(cycle)?;
    }

    let trace = builder.finish();
    debug!(
        agent = %trace.agent,
        cycles = trace.last_cycle(),
        intentions = trace.intentions.len(),
        expansions = trace.expansions.len(),
        "trace built"
    );
    Ok(trace)
}

struct TraceBuilder {
    agent: String,
    platform: String,
    source: String,
    plans: BTreeMap<String, Plan>,
    intentions: BTreeMap<u64, Intention>,
    expansions: BTreeMap<u64, GoalExpansion>,
    events: BTreeMap<u64, BdiEvent>,
    beliefs: Vec<BeliefChange>,
    /// Working belief set used to reject removal of absent beliefs.
    held: HashSet<String>,
    last_cycle: Option<u64>,
}

impl TraceBuilder {
    fn new(header: HeaderRecord) -> Self {
        let plans = header
            .plans
            .into_iter()
            .map(|(label, p)| {
                let plan = Plan {
                    label: label.clone(),
                    trigger: p.trigger,
                    context: p.ctx,
                    body: p.body,
                    file: p.file,
                    line: p.line,
                    used: 0,
                };
                (label, plan)
            })
            .collect();
        Self {
            agent: header.agent,
            platform: header.platform,
            source: header.source,
            plans,
            intentions: BTreeMap::new(),
            expansions: BTreeMap::new(),
            events: BTreeMap::new(),
            beliefs: Vec::new(),
            held: HashSet::new(),
            last_cycle: None,
        }
    }

    fn apply_cycle(&mut self, cycle: CycleRecord) -> Result<(), TraceError> {
        let nr = cycle.nr;
        if let Some(previous) = self.last_cycle
            && nr <= previous
        {
            return Err(TraceError::OutOfOrderCycle {
                cycle: nr,
                previous,
            });
        }
        self.last_cycle = Some(nr);

        if let Some(id) = cycle.intention_added {
            self.add_intention(nr, id)?;
        }

        // Expansions created this cycle stay buffered (by id) until the
        // selected event is known.
        let mut pending = Vec::with_capacity(cycle.means_added.len());
        for means in &cycle.means_added {
            self.add_expansion(nr, means)?;
            pending.push(means.id);
        }

        for event in &cycle.events_added {
            self.add_event(nr, event, &cycle)?;
        }

        if let Some(instr) = &cycle.instruction {
            let kind = InstructionKind::classify(&instr.instr);
            let expansion = self
                .expansions
                .get_mut(&instr.im)
                .ok_or(TraceError::UnknownId {
                    cycle: nr,
                    kind: "goal-expansion",
                    id: instr.im,
                })?;
            expansion.instructions.push(Instruction {
                file: instr.file.clone(),
                line: instr.line,
                text: instr.instr.clone(),
                cycle: nr,
                kind,
                unifier: cycle.unifier.clone(),
            });
        }

        for ended in &cycle.means_ended {
            self.resolve_expansion(nr, ended)?;
        }

        for &id in &cycle.intentions_ended {
            let intention = self.intentions.get_mut(&id).ok_or(TraceError::UnknownId {
                cycle: nr,
                kind: "intention",
                id,
            })?;
            if intention.end.is_some() {
                return Err(TraceError::ResolvedTwice {
                    cycle: nr,
                    kind: "intention",
                    id,
                });
            }
            intention.end = Some(nr);
        }

        if let Some(event_id) = cycle.selected_event {
            self.select_event(nr, event_id, cycle.intention_added, &pending)?;
        }

        for belief in cycle.beliefs_added {
            self.held.insert(belief.clone());
            self.beliefs.push(BeliefChange {
                cycle: nr,
                added: true,
                belief,
            });
        }
        for belief in cycle.beliefs_removed {
            if !self.held.remove(&belief) {
                return Err(TraceError::AbsentBelief { cycle: nr, belief });
            }
            self.beliefs.push(BeliefChange {
                cycle: nr,
                added: false,
                belief,
            });
        }

        Ok(())
    }

    fn add_intention(&mut self, nr: u64, id: u64) -> Result<(), TraceError> {
        if self.intentions.contains_key(&id) {
            return Err(TraceError::DuplicateId {
                cycle: nr,
                kind: "intention",
                id,
            });
        }
        self.intentions.insert(
            id,
            Intention {
                id,
                start: nr,
                end: None,
                means: Vec::new(),
                events: Vec::new(),
            },
        );
        Ok(())
    }

    fn add_expansion(&mut self, nr: u64, means: &MeansAddedRecord) -> Result<(), TraceError> {
        if self.expansions.contains_key(&means.id) {
            return Err(TraceError::DuplicateId {
                cycle: nr,
                kind: "goal-expansion",
                id: means.id,
            });
        }
        let plan = self
            .plans
            .get_mut(&means.plan)
            .ok_or_else(|| TraceError::UnknownPlan {
                cycle: nr,
                label: means.plan.clone(),
            })?;
        plan.used += 1;
        let intention = self
            .intentions
            .get_mut(&means.i)
            .ok_or(TraceError::UnknownId {
                cycle: nr,
                kind: "intention",
                id: means.i,
            })?;
        intention.means.push(means.id);
        self.expansions.insert(
            means.id,
            GoalExpansion {
                id: means.id,
                intention: means.i,
                start: nr,
                end: None,
                result: ExpansionResult::Running,
                failure: None,
                plan: means.plan.clone(),
                trigger: means.trigger.clone(),
                context: means.ctx.clone(),
                file: means.file.clone(),
                line: means.line,
                instructions: Vec::new(),
                children: Vec::new(),
                parent: None,
                event: None,
            },
        );
        Ok(())
    }

    /// Post an event. For goal events the raising expansion is the one
    /// executing this cycle, or the parent of this cycle's selected event
    /// when no plan was applicable. Initial goals have no raiser.
    fn add_event(
        &mut self,
        nr: u64,
        event: &EventRecord,
        cycle: &CycleRecord,
    ) -> Result<(), TraceError> {
        if self.events.contains_key(&event.id) {
            return Err(TraceError::DuplicateId {
                cycle: nr,
                kind: "event",
                id: event.id,
            });
        }

        let (kind, parent) = if event.src == "B" {
            (EventKind::BeliefUpdate, None)
        } else {
            let kind = if event.nf.is_some() {
                EventKind::NewFocusGoal
            } else {
                EventKind::SubGoal
            };
            let parent = self.raising_expansion(nr, cycle)?;
            (kind, parent)
        };

        if let Some(parent_id) = parent {
            let owner = self
                .expansions
                .get(&parent_id)
                .map(|expansion| expansion.intention)
                .ok_or(TraceError::UnknownId {
                    cycle: nr,
                    kind: "goal-expansion",
                    id: parent_id,
                })?;
            if let Some(intention) = self.intentions.get_mut(&owner) {
                intention.events.push(event.id);
            }
        }

        self.events.insert(
            event.id,
            BdiEvent {
                id: event.id,
                parent,
                trigger: event.t.clone(),
                kind,
                cycle_posted: nr,
                cycle_selected: None,
            },
        );
        Ok(())
    }

    fn raising_expansion(
        &self,
        nr: u64,
        cycle: &CycleRecord,
    ) -> Result<Option<u64>, TraceError> {
        if let Some(instr) = &cycle.instruction {
            if !self.expansions.contains_key(&instr.im) {
                return Err(TraceError::UnknownId {
                    cycle: nr,
                    kind: "goal-expansion",
                    id: instr.im,
                });
            }
            return Ok(Some(instr.im));
        }
        if let Some(event_id) = cycle.selected_event {
            let selected = self.events.get(&event_id).ok_or(TraceError::UnknownId {
                cycle: nr,
                kind: "event",
                id: event_id,
            })?;
            return Ok(selected.parent);
        }
        Ok(None)
    }

    fn resolve_expansion(&mut self, nr: u64, ended: &MeansEndedRecord) -> Result<(), TraceError> {
        if ended.id == -1 {
            // Selected event had no applicable plan; there is no expansion
            // to resolve.
            return Ok(());
        }
        let id = u64::try_from(ended.id).map_err(|_| TraceError::UnknownId {
            cycle: nr,
            kind: "goal-expansion",
            id: ended.id.unsigned_abs(),
        })?;
        let expansion = self.expansions.get_mut(&id).ok_or(TraceError::UnknownId {
            cycle: nr,
            kind: "goal-expansion",
            id,
        })?;
        if expansion.end.is_some() {
            return Err(TraceError::ResolvedTwice {
                cycle: nr,
                kind: "goal-expansion",
                id,
            });
        }
        expansion.end = Some(nr);
        expansion.result = ended.res;
        expansion.failure = ended.reason.as_ref().map(|reason| FailureDetail {
            message: reason.msg.clone(),
            kind: reason.kind.clone(),
            file: reason.file.clone(),
            line: reason.line,
        });
        Ok(())
    }

    /// Record event selection and link this cycle's buffered expansions to
    /// the selected event (and, through it, to their parent expansion).
    fn select_event(
        &mut self,
        nr: u64,
        event_id: u64,
        intention_added: Option<u64>,
        pending: &[u64],
    ) -> Result<(), TraceError> {
        let (event_kind, event_parent) = {
            let event = self.events.get_mut(&event_id).ok_or(TraceError::UnknownId {
                cycle: nr,
                kind: "event",
                id: event_id,
            })?;
            if event.cycle_selected.is_some() {
                return Err(TraceError::ResolvedTwice {
                    cycle: nr,
                    kind: "event",
                    id: event_id,
                });
            }
            event.cycle_selected = Some(nr);
            (event.kind, event.parent)
        };

        // A non-sub-goal event that spawned an intention this cycle belongs
        // to that new intention.
        if event_kind != EventKind::SubGoal
            && let Some(intention_id) = intention_added
            && let Some(intention) = self.intentions.get_mut(&intention_id)
        {
            intention.events.push(event_id);
        }

        for &expansion_id in pending {
            if let Some(expansion) = self.expansions.get_mut(&expansion_id) {
                expansion.event = Some(event_id);
                expansion.parent = event_parent;
            }
            if let Some(parent_id) = event_parent
                && let Some(parent) = self.expansions.get_mut(&parent_id)
            {
                parent.children.push(expansion_id);
            }
        }
        Ok(())
    }

    fn finish(self) -> AgentTrace {
        AgentTrace {
            agent: self.agent,
            platform: self.platform,
            source: self.source,
            plans: self.plans,
            intentions: self.intentions,
            expansions: self.expansions,
            events: self.events,
            beliefs: self.beliefs,
            last_cycle: self.last_cycle.unwrap_or(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_log;

    #[test]
    fn parses_header_and_plan_library() {
        let trace = parse_trace(&sample_log()).expect("parse");
        assert_eq!(trace.agent, "bob");
        assert_eq!(trace.plans().count(), 3);

        let plan = trace.plan("p1").expect("plan p1");
        assert_eq!(plan.trigger, "+!prepare");
        assert_eq!(plan.context, "ready");
        assert_eq!(plan.line, 12);
        assert_eq!(plan.used, 1);
    }

    #[test]
    fn links_expansions_to_events_and_parents() {
        let trace = parse_trace(&sample_log()).expect("parse");

        let root = trace.expansion(100).expect("expansion 100");
        assert_eq!(root.intention, 10);
        assert_eq!(root.start, 3);
        assert_eq!(root.end, Some(13));
        assert_eq!(root.children, vec![101, 102]);
        assert_eq!(root.parent, None);
        assert_eq!(root.event, Some(1));

        let child = trace.expansion(101).expect("expansion 101");
        assert_eq!(child.parent, Some(100));
        assert_eq!(child.event, Some(2));
        assert_eq!(child.result, ExpansionResult::Achieved);

        let event = trace.event(2).expect("event 2");
        assert_eq!(event.kind, EventKind::SubGoal);
        assert_eq!(event.parent, Some(100));
        assert_eq!(event.cycle_posted, 4);
        assert_eq!(event.cycle_selected, Some(5));
    }

    #[test]
    fn records_instructions_with_kind_and_unifier() {
        let trace = parse_trace(&sample_log()).expect("parse");
        let expansion = trace.expansion(102).expect("expansion 102");

        let texts: Vec<&str> = expansion
            .instructions
            .iter()
            .map(|instr| instr.text.as_str())
            .collect();
        assert_eq!(texts, vec![".print(go)", "launch_rocket"]);

        let print = &expansion.instructions[0];
        assert_eq!(print.kind, InstructionKind::InternalAction);
        assert_eq!(
            print.unifier.as_ref().and_then(|u| u.get("X")),
            Some(&"go".to_string())
        );
        assert_eq!(expansion.instructions[1].kind, InstructionKind::Action);
    }

    #[test]
    fn records_failure_detail() {
        let trace = parse_trace(&sample_log()).expect("parse");
        let expansion = trace.expansion(102).expect("expansion 102");
        assert_eq!(expansion.result, ExpansionResult::Failed);

        let failure = expansion.failure.as_ref().expect("failure detail");
        assert_eq!(failure.message, "no rocket");
        assert_eq!(failure.kind, "action_failed");
        assert_eq!(failure.line, Some(22));
    }

    #[test]
    fn resolved_expansions_end_after_start() {
        let trace = parse_trace(&sample_log()).expect("parse");
        for expansion in trace.expansions() {
            if let Some(end) = expansion.end {
                assert!(end >= expansion.start, "expansion {}", expansion.id);
            }
        }
    }

    #[test]
    fn children_nest_inside_parent_window() {
        let trace = parse_trace(&sample_log()).expect("parse");
        for expansion in trace.expansions() {
            for &child_id in &expansion.children {
                let child = trace.expansion(child_id).expect("child");
                assert!(child.start >= expansion.start);
                if let (Some(child_end), Some(end)) = (child.end, expansion.end) {
                    assert!(child_end <= end);
                }
            }
        }
    }

    #[test]
    fn missing_header_is_fatal() {
        let err = parse_trace("").expect_err("should fail");
        assert!(matches!(err, TraceError::MissingHeader));
    }

    #[test]
    fn malformed_record_reports_line_number() {
        let log = "{\"agent\":\"a\",\"plans\":{}}\nnot json\n";
        let err = parse_trace(log).expect_err("should fail");
        match err {
            TraceError::Malformed { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn unknown_intention_reference_is_fatal() {
        let log = concat!(
            "{\"agent\":\"a\",\"plans\":{\"p\":{\"trigger\":\"+!g\",\"body\":\"x\",\"file\":\"a.asl\",\"line\":1}}}\n",
            "{\"nr\":1,\"IM+\":[{\"id\":1,\"i\":99,\"plan\":\"p\",\"trigger\":\"+!g\",\"file\":\"a.asl\",\"line\":1}]}\n",
        );
        let err = parse_trace(log).expect_err("should fail");
        assert!(matches!(
            err,
            TraceError::UnknownId {
                kind: "intention",
                id: 99,
                ..
            }
        ));
    }

    #[test]
    fn unknown_plan_is_fatal() {
        let log = concat!(
            "{\"agent\":\"a\",\"plans\":{}}\n",
            "{\"nr\":1,\"I+\":1}\n",
            "{\"nr\":2,\"IM+\":[{\"id\":1,\"i\":1,\"plan\":\"ghost\",\"trigger\":\"+!g\",\"file\":\"a.asl\",\"line\":1}]}\n",
        );
        let err = parse_trace(log).expect_err("should fail");
        assert!(matches!(err, TraceError::UnknownPlan { label, .. } if label == "ghost"));
    }

    #[test]
    fn non_increasing_cycle_number_is_fatal() {
        let log = concat!(
            "{\"agent\":\"a\",\"plans\":{}}\n",
            "{\"nr\":5}\n",
            "{\"nr\":5}\n",
        );
        let err = parse_trace(log).expect_err("should fail");
        assert!(matches!(
            err,
            TraceError::OutOfOrderCycle {
                cycle: 5,
                previous: 5
            }
        ));
    }

    #[test]
    fn removal_of_absent_belief_is_fatal() {
        let log = concat!(
            "{\"agent\":\"a\",\"plans\":{}}\n",
            "{\"nr\":1,\"B+\":[\"b1\"]}\n",
            "{\"nr\":4,\"B-\":[\"b3\"]}\n",
        );
        let err = parse_trace(log).expect_err("should fail");
        assert!(matches!(err, TraceError::AbsentBelief { cycle: 4, belief } if belief == "b3"));
    }

    #[test]
    fn no_applicable_plan_resolution_is_tolerated() {
        let log = concat!(
            "{\"agent\":\"a\",\"plans\":{}}\n",
            "{\"nr\":1,\"E+\":[{\"id\":1,\"t\":\"+!g\",\"src\":\"E\"}]}\n",
            "{\"nr\":2,\"SE\":1,\"IM-\":[{\"id\":-1,\"res\":\"no_applicable_plan\"}]}\n",
        );
        let trace = parse_trace(log).expect("parse");
        assert_eq!(trace.expansions().count(), 0);
        assert_eq!(trace.event(1).expect("event").cycle_selected, Some(2));
    }
}
