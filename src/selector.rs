//! Transition selection.
//!
//! The collaborator is asked to name one successor of the current phase. Its
//! answer is trimmed and matched exactly (case-sensitive) against the
//! configured successor set; anything else halts the session. There are no
//! retries and no fuzzy matching.

use tracing::{debug, info, warn};

use crate::errors::{CollaboratorError, InvalidTransition};
use crate::graph::PhaseGraph;
use crate::llm::{ChatBackend, ModelSettings};
use crate::phase::Phase;
use crate::prompts::{self, MASTER_SYSTEM_PROMPT};

/// Why no further transition is possible.
#[derive(Debug)]
pub enum HaltReason {
    /// The current phase has no successors
    Terminal,
    /// The collaborator named a phase outside the successor set
    Rejected(InvalidTransition),
    /// The collaborator failed to answer
    Collaborator(CollaboratorError),
}

impl HaltReason {
    pub fn is_terminal(&self) -> bool {
        matches!(self, HaltReason::Terminal)
    }
}

impl std::fmt::Display for HaltReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HaltReason::Terminal => write!(f, "End of the attack chain"),
            HaltReason::Rejected(err) => write!(f, "Invalid next phase: {}", err),
            HaltReason::Collaborator(err) => write!(f, "{} error: {}", err.category(), err),
        }
    }
}

/// Outcome of one selection step.
#[derive(Debug)]
pub enum Transition {
    Advance(Phase),
    Halt(HaltReason),
}

impl Transition {
    /// The validated next phase, if the selection advanced.
    pub fn next_phase(&self) -> Option<&Phase> {
        match self {
            Transition::Advance(phase) => Some(phase),
            Transition::Halt(_) => None,
        }
    }
}

pub struct TransitionSelector<'a> {
    backend: &'a dyn ChatBackend,
    graph: &'a PhaseGraph,
    settings: &'a ModelSettings,
}

impl<'a> TransitionSelector<'a> {
    pub fn new(
        backend: &'a dyn ChatBackend,
        graph: &'a PhaseGraph,
        settings: &'a ModelSettings,
    ) -> Self {
        Self {
            backend,
            graph,
            settings,
        }
    }

    /// Pick the next phase after `phase` given the story so far and the player's text.
    ///
    /// Terminal phases halt without contacting the collaborator.
    pub async fn select(&self, phase: &Phase, context: &str, player_input: &str) -> Transition {
        let successors = self.graph.successors(phase.as_str());
        if successors.is_empty() {
            debug!(phase = %phase, "Terminal phase, no selection needed");
            return Transition::Halt(HaltReason::Terminal);
        }

        let prompt = prompts::transition_prompt(self.graph, phase, context, player_input);
        let request = self.settings.request(MASTER_SYSTEM_PROMPT, prompt);

        let answer = match self.backend.complete(&request).await {
            Ok(answer) => answer,
            Err(err) => {
                warn!(phase = %phase, category = err.category(), error = %err, "Transition selection failed");
                return Transition::Halt(HaltReason::Collaborator(err));
            }
        };

        let trimmed = answer.trim();
        match successors.iter().find(|s| s.as_str() == trimmed) {
            Some(next) => {
                info!(from = %phase, to = %next, "Advancing");
                Transition::Advance(next.clone())
            }
            None => {
                warn!(phase = %phase, answer = trimmed, "Collaborator named an illegal successor");
                Transition::Halt(HaltReason::Rejected(InvalidTransition {
                    phase: phase.to_string(),
                    answer: trimmed.to_string(),
                    allowed: successors.iter().map(Phase::to_string).collect(),
                }))
            }
        }
    }
}
