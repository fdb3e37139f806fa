//! Instruction-level localization inside the faulty goal-expansion.
//!
//! Same pull/push protocol as navigation: [`Localizer::next`] yields the
//! next instruction prompt, [`Localizer::answer`] records the oracle's
//! verdict. The first `Unexpected` verdict wins; confirming every
//! instruction is an ordinary inconclusive outcome, not an error.

use crate::error::{ProtocolError, TraceError};
use crate::model::{AgentTrace, Instruction, InstructionKind};
use crate::state::{StateDiff, cycle_diff};

/// Oracle verdict on a single instruction: did it produce the expected
/// result?
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Expected,
    Unexpected,
}

/// Categories to consider when no single instruction can be blamed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guidance {
    MissingInstruction,
    CounterproductiveInstruction,
    WrongOrdering,
    ExternalInfluence,
}

impl Guidance {
    pub const ALL: [Self; 4] = [
        Self::MissingInstruction,
        Self::CounterproductiveInstruction,
        Self::WrongOrdering,
        Self::ExternalInfluence,
    ];

    pub fn describe(self) -> &'static str {
        match self {
            Self::MissingInstruction => "an instruction may be missing from the plan body",
            Self::CounterproductiveInstruction => {
                "an individually correct instruction may be counterproductive here"
            }
            Self::WrongOrdering => "the instructions may run in the wrong order",
            Self::ExternalInfluence => {
                "the misbehavior may originate outside this plan (environment or other intention)"
            }
        }
    }
}

/// One instruction presented to the oracle, with a belief snapshot where the
/// instruction kind calls for one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstructionPrompt {
    pub instruction: Instruction,
    /// Belief changes at the instruction's cycle, for mental notes.
    pub snapshot: Option<StateDiff>,
}

/// Terminal outcome of a localization session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalizeOutcome {
    /// A single instruction was identified as the bug.
    Culprit(Instruction),
    /// Every instruction was confirmed; the fault lies elsewhere.
    Inconclusive([Guidance; 4]),
}

/// Walks the bug expansion's instructions in execution order.
///
/// Achievement-goal instructions (`!`/`!!`) are auto-trusted by default:
/// their correctness was already covered by the goal-tree search through the
/// child expansions they spawned.
#[derive(Debug)]
pub struct Localizer {
    prompts: Vec<InstructionPrompt>,
    cursor: usize,
    awaiting: bool,
    outcome: Option<LocalizeOutcome>,
}

impl Localizer {
    pub fn new(trace: &AgentTrace, expansion: u64) -> Result<Self, TraceError> {
        Self::with_auto_trust(trace, expansion, true)
    }

    /// `auto_trust` controls whether achievement-goal instructions are
    /// skipped without asking the oracle.
    pub fn with_auto_trust(
        trace: &AgentTrace,
        expansion: u64,
        auto_trust: bool,
    ) -> Result<Self, TraceError> {
        let expansion = trace
            .expansion(expansion)
            .ok_or(TraceError::UnknownExpansion { id: expansion })?;

        let mut prompts = Vec::new();
        for instruction in &expansion.instructions {
            if auto_trust && instruction.text.trim_start().starts_with('!') {
                continue;
            }
            let snapshot = if instruction.kind == InstructionKind::MentalNote {
                Some(cycle_diff(trace, instruction.cycle)?)
            } else {
                None
            };
            prompts.push(InstructionPrompt {
                instruction: instruction.clone(),
                snapshot,
            });
        }

        Ok(Self {
            prompts,
            cursor: 0,
            awaiting: false,
            outcome: None,
        })
    }

    /// Hand out the next instruction prompt, or `Ok(None)` once concluded.
    pub fn next(&mut self) -> Result<Option<&InstructionPrompt>, ProtocolError> {
        if self.outcome.is_some() {
            return Ok(None);
        }
        if self.awaiting {
            return Err(ProtocolError::UnansweredPrompt);
        }
        if self.cursor >= self.prompts.len() {
            self.outcome = Some(LocalizeOutcome::Inconclusive(Guidance::ALL));
            return Ok(None);
        }
        self.awaiting = true;
        Ok(Some(&self.prompts[self.cursor]))
    }

    /// Record the oracle's verdict for the outstanding prompt.
    pub fn answer(&mut self, verdict: Verdict) -> Result<(), ProtocolError> {
        if !self.awaiting {
            return Err(ProtocolError::NoPrompt);
        }
        self.awaiting = false;
        match verdict {
            Verdict::Unexpected => {
                let culprit = self.prompts[self.cursor].instruction.clone();
                self.outcome = Some(LocalizeOutcome::Culprit(culprit));
            }
            Verdict::Expected => self.cursor += 1,
        }
        Ok(())
    }

    /// Terminal outcome, once the session has concluded.
    pub fn outcome(&self) -> Option<&LocalizeOutcome> {
        self.outcome.as_ref()
    }
}
