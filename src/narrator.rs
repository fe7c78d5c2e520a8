use tracing::{debug, warn};

use crate::errors::CollaboratorError;
use crate::graph::PhaseGraph;
use crate::llm::{ChatBackend, ModelSettings};
use crate::phase::Phase;
use crate::prompts::{self, INTRO_SYSTEM_PROMPT, STORY_SYSTEM_PROMPT};

/// Produces story text for the setup and for each entered phase.
///
/// An `Err` means narration was unavailable; `Ok("")` means the collaborator
/// answered with empty text. Callers treat the two differently.
pub struct Narrator<'a> {
    backend: &'a dyn ChatBackend,
    settings: &'a ModelSettings,
}

impl<'a> Narrator<'a> {
    pub fn new(backend: &'a dyn ChatBackend, settings: &'a ModelSettings) -> Self {
        Self { backend, settings }
    }

    /// Opening story for a new session.
    pub async fn introduce(&self, graph: &PhaseGraph) -> Result<String, CollaboratorError> {
        let request = self
            .settings
            .request(INTRO_SYSTEM_PROMPT, prompts::intro_prompt(graph));
        debug!(root = %graph.root(), "Requesting introduction");
        self.backend.complete(&request).await.inspect_err(|e| {
            warn!(category = e.category(), error = %e, "Introduction unavailable");
        })
    }

    /// Narrative for `phase`, given the story so far.
    pub async fn narrate(
        &self,
        graph: &PhaseGraph,
        phase: &Phase,
        context: &str,
    ) -> Result<String, CollaboratorError> {
        let request = self.settings.request(
            STORY_SYSTEM_PROMPT,
            prompts::narration_prompt(graph, phase, context),
        );
        debug!(phase = %phase, context_len = context.len(), "Requesting narration");
        self.backend.complete(&request).await.inspect_err(|e| {
            warn!(phase = %phase, category = e.category(), error = %e, "Narration unavailable");
        })
    }
}
