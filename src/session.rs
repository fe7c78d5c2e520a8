//! The play session state machine.
//!
//! A session bootstraps an opening story, then alternates between reading
//! player text and narrating the phase the selector advanced to, until no
//! valid transition remains. The loop is iterative and bounded by
//! `max_steps`.

use tracing::{debug, info, warn};

use crate::graph::PhaseGraph;
use crate::input::PlayerInput;
use crate::llm::{ChatBackend, ModelSettings};
use crate::narrator::Narrator;
use crate::phase::Phase;
use crate::selector::{HaltReason, Transition, TransitionSelector};
use crate::ui::SessionUi;

pub const DEFAULT_MAX_STEPS: usize = 32;

/// Where the session loop currently is.
#[derive(Debug)]
pub enum SessionState {
    Bootstrapping,
    AwaitingInput(Phase),
    Narrating(Phase),
    Terminated(EndReason),
}

/// Why a session stopped.
#[derive(Debug)]
pub enum EndReason {
    /// The player reached a phase with no successors
    Completed,
    /// The selector could not produce a valid transition
    Halted(HaltReason),
    /// The player closed input
    InputClosed,
    /// The step counter hit `max_steps`
    StepLimit,
    /// The opening story could not be generated
    SetupFailed(crate::errors::CollaboratorError),
}

/// Final report of a finished session.
#[derive(Debug)]
pub struct SessionOutcome {
    pub reason: EndReason,
    /// Phase the session ended in. `None` if setup failed.
    pub final_phase: Option<Phase>,
    /// Phases visited after the root, in order
    pub path: Vec<Phase>,
    pub steps: usize,
}

impl SessionOutcome {
    /// Process exit code for this outcome.
    ///
    /// 0 for a normal end, 1 for setup failure, 2 for a collaborator error
    /// during transition selection.
    pub fn exit_code(&self) -> u8 {
        match &self.reason {
            EndReason::SetupFailed(_) => 1,
            EndReason::Halted(HaltReason::Collaborator(_)) => 2,
            _ => 0,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self.reason, EndReason::Completed)
    }

    /// One-line human summary.
    pub fn summary(&self) -> String {
        match &self.reason {
            EndReason::Completed => format!(
                "End of the attack chain: reached '{}' after {} step(s)",
                self.final_phase.as_ref().map_or("?", Phase::as_str),
                self.steps
            ),
            EndReason::Halted(reason) => format!("Session halted. {}", reason),
            EndReason::InputClosed => "Input closed, ending session".to_string(),
            EndReason::StepLimit => format!("Step limit of {} reached", self.steps),
            EndReason::SetupFailed(err) => {
                format!("Failed to generate initial story ({}): {}", err.category(), err)
            }
        }
    }
}

/// Tunables for one session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub model: ModelSettings,
    pub max_steps: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            model: ModelSettings::default(),
            max_steps: DEFAULT_MAX_STEPS,
        }
    }
}

/// Owns the session state: current phase, accumulated narrative and step count.
pub struct Session<'a> {
    graph: &'a PhaseGraph,
    backend: &'a dyn ChatBackend,
    config: &'a SessionConfig,
    ui: &'a SessionUi,
    context: String,
    steps: usize,
    path: Vec<Phase>,
}

impl<'a> Session<'a> {
    pub fn new(
        graph: &'a PhaseGraph,
        backend: &'a dyn ChatBackend,
        config: &'a SessionConfig,
        ui: &'a SessionUi,
    ) -> Self {
        Self {
            graph,
            backend,
            config,
            ui,
            context: String::new(),
            steps: 0,
            path: Vec::new(),
        }
    }

    /// Drive the session to completion.
    pub async fn run(mut self, input: &mut dyn PlayerInput) -> anyhow::Result<SessionOutcome> {
        let config = self.config;
        let narrator = Narrator::new(self.backend, &config.model);
        let selector = TransitionSelector::new(self.backend, self.graph, &config.model);

        let mut state = SessionState::Bootstrapping;
        let mut current: Option<Phase> = None;

        let reason = loop {
            debug!(state = ?state, steps = self.steps, "Session state");
            state = match state {
                SessionState::Bootstrapping => {
                    self.ui.heading("Initial Setup");
                    let spinner = self.ui.spinner("Setting the scene...");
                    let intro = narrator.introduce(self.graph).await;
                    spinner.finish_and_clear();
                    match intro {
                        Ok(text) => {
                            self.ui.narrative(&text);
                            self.context = text;
                            info!(root = %self.graph.root(), "Session started");
                            SessionState::AwaitingInput(self.graph.root().clone())
                        }
                        Err(err) => SessionState::Terminated(EndReason::SetupFailed(err)),
                    }
                }
                SessionState::AwaitingInput(phase) => {
                    current = Some(phase.clone());
                    if self.graph.is_terminal(phase.as_str()) {
                        SessionState::Terminated(EndReason::Completed)
                    } else if self.steps >= config.max_steps {
                        warn!(max_steps = config.max_steps, "Step limit reached");
                        SessionState::Terminated(EndReason::StepLimit)
                    } else {
                        self.ui.phase_header(phase.as_str(), self.steps + 1);
                        match input.read_action(phase.as_str())? {
                            None => SessionState::Terminated(EndReason::InputClosed),
                            Some(action) => {
                                let spinner = self.ui.spinner("Consulting the master controller...");
                                let transition =
                                    selector.select(&phase, &self.context, &action).await;
                                spinner.finish_and_clear();
                                match transition {
                                    Transition::Advance(next) => {
                                        self.ui.transition(phase.as_str(), next.as_str());
                                        SessionState::Narrating(next)
                                    }
                                    Transition::Halt(reason) => {
                                        SessionState::Terminated(EndReason::Halted(reason))
                                    }
                                }
                            }
                        }
                    }
                }
                SessionState::Narrating(phase) => {
                    current = Some(phase.clone());
                    let spinner = self.ui.spinner("Writing the next chapter...");
                    let narrative = narrator.narrate(self.graph, &phase, &self.context).await;
                    spinner.finish_and_clear();
                    match narrative {
                        Ok(text) => {
                            self.ui.narrative(&text);
                            self.context.push_str("\n\n");
                            self.context.push_str(&text);
                        }
                        Err(err) => {
                            self.ui.failure(
                                err.category(),
                                &format!("Narration unavailable for '{}': {}", phase, err),
                            );
                        }
                    }
                    self.steps += 1;
                    self.path.push(phase.clone());
                    SessionState::AwaitingInput(phase)
                }
                SessionState::Terminated(reason) => break reason,
            };
        };

        let outcome = SessionOutcome {
            reason,
            final_phase: current,
            path: self.path,
            steps: self.steps,
        };
        info!(
            steps = outcome.steps,
            final_phase = ?outcome.final_phase.as_ref().map(Phase::as_str),
            exit_code = outcome.exit_code(),
            "Session ended"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::CollaboratorError;
    use crate::input::ScriptedInput;
    use crate::llm::{ScriptStep, ScriptedBackend};
    use crate::phase::default_graph;
    use crate::prompts::{MASTER_SYSTEM_PROMPT, parse_options};

    /// Backend that narrates with the phase name and always picks the first successor.
    fn first_successor_backend() -> ScriptedBackend {
        ScriptedBackend::from_fn(|req| {
            let prompt = req.user_prompt().unwrap_or_default();
            if req.system_prompt() == Some(MASTER_SYSTEM_PROMPT) {
                let choice = parse_options(prompt).first().copied().unwrap_or_default();
                ScriptStep::reply(choice)
            } else {
                ScriptStep::reply("Once upon a time.")
            }
        })
    }

    async fn play(
        backend: &ScriptedBackend,
        input: &mut ScriptedInput,
        max_steps: usize,
    ) -> SessionOutcome {
        let graph = default_graph().unwrap();
        let config = SessionConfig {
            max_steps,
            ..SessionConfig::default()
        };
        let ui = SessionUi::quiet();
        Session::new(&graph, backend, &config, &ui)
            .run(input)
            .await
            .unwrap()
    }

    fn path_names(outcome: &SessionOutcome) -> Vec<&str> {
        outcome.path.iter().map(Phase::as_str).collect()
    }

    // =====================================
    // Full runs
    // =====================================

    #[tokio::test]
    async fn test_first_successor_walk_reaches_terminal() {
        let backend = first_successor_backend();
        let mut input = ScriptedInput::new(["a", "b", "c", "d", "e", "f"]);

        let outcome = play(&backend, &mut input, DEFAULT_MAX_STEPS).await;

        assert!(outcome.is_completed());
        assert_eq!(
            path_names(&outcome),
            vec![
                "OSINT",
                "Exploiting Vulnerability",
                "Backdoor Installation",
                "Credential Manipulation"
            ]
        );
        assert_eq!(
            outcome.final_phase.as_ref().map(Phase::as_str),
            Some("Credential Manipulation")
        );
        assert_eq!(outcome.steps, 4);
        assert_eq!(outcome.exit_code(), 0);
        // The terminal phase is never prompted for
        assert_eq!(input.prompted_phases().len(), 4);
    }

    #[tokio::test]
    async fn test_empty_player_input_is_sent_as_is() {
        let backend = first_successor_backend();
        let mut input = ScriptedInput::new(["", "", "", ""]);

        let outcome = play(&backend, &mut input, DEFAULT_MAX_STEPS).await;
        assert!(outcome.is_completed());
    }

    // =====================================
    // Halting paths
    // =====================================

    #[tokio::test]
    async fn test_invalid_answer_halts_with_exit_zero() {
        let backend = ScriptedBackend::replies(["Intro", "Hacking"]);
        let mut input = ScriptedInput::new(["hack"]);

        let outcome = play(&backend, &mut input, DEFAULT_MAX_STEPS).await;

        assert!(matches!(
            outcome.reason,
            EndReason::Halted(HaltReason::Rejected(_))
        ));
        assert_eq!(outcome.final_phase.as_ref().map(Phase::as_str), Some("Start"));
        assert_eq!(outcome.exit_code(), 0);
    }

    #[tokio::test]
    async fn test_selector_timeout_halts_with_exit_two() {
        let backend = ScriptedBackend::new([ScriptStep::reply("Intro"), ScriptStep::Timeout]);
        let mut input = ScriptedInput::new(["scan"]);

        let outcome = play(&backend, &mut input, DEFAULT_MAX_STEPS).await;

        assert!(matches!(
            outcome.reason,
            EndReason::Halted(HaltReason::Collaborator(CollaboratorError::Timeout(_)))
        ));
        assert_eq!(outcome.exit_code(), 2);
    }

    #[tokio::test]
    async fn test_rejected_answer_exits_zero_while_collaborator_error_exits_two() {
        let rejected = ScriptedBackend::replies(["Intro", "Not A Phase"]);
        let failed = ScriptedBackend::new([
            ScriptStep::reply("Intro"),
            ScriptStep::Fail("down".to_string()),
        ]);

        let rejected = play(&rejected, &mut ScriptedInput::new(["scan"]), DEFAULT_MAX_STEPS).await;
        let failed = play(&failed, &mut ScriptedInput::new(["scan"]), DEFAULT_MAX_STEPS).await;

        // A bad answer ends the story normally; a broken service does not
        assert!(matches!(
            rejected.reason,
            EndReason::Halted(HaltReason::Rejected(_))
        ));
        assert_eq!(rejected.exit_code(), 0);
        assert!(matches!(
            failed.reason,
            EndReason::Halted(HaltReason::Collaborator(_))
        ));
        assert_eq!(failed.exit_code(), 2);
    }

    #[tokio::test]
    async fn test_intro_failure_is_setup_failure() {
        let backend = ScriptedBackend::new([ScriptStep::Fail("no key".to_string())]);
        let mut input = ScriptedInput::new(["scan"]);

        let outcome = play(&backend, &mut input, DEFAULT_MAX_STEPS).await;

        assert!(matches!(outcome.reason, EndReason::SetupFailed(_)));
        assert!(outcome.final_phase.is_none());
        assert_eq!(outcome.exit_code(), 1);
        assert!(input.prompted_phases().is_empty());
        assert!(outcome.summary().starts_with("Failed to generate initial story"));
    }

    #[tokio::test]
    async fn test_closed_input_ends_session() {
        let backend = ScriptedBackend::replies(["Intro"]);
        let mut input = ScriptedInput::new(Vec::<String>::new());

        let outcome = play(&backend, &mut input, DEFAULT_MAX_STEPS).await;

        assert!(matches!(outcome.reason, EndReason::InputClosed));
        assert_eq!(backend.call_count(), 1);
        assert_eq!(outcome.exit_code(), 0);
    }

    #[tokio::test]
    async fn test_step_limit_stops_session() {
        let backend = first_successor_backend();
        let mut input = ScriptedInput::new(["a", "b", "c", "d"]);

        let outcome = play(&backend, &mut input, 2).await;

        assert!(matches!(outcome.reason, EndReason::StepLimit));
        assert_eq!(outcome.steps, 2);
        assert_eq!(
            outcome.final_phase.as_ref().map(Phase::as_str),
            Some("Exploiting Vulnerability")
        );
    }

    // =====================================
    // Context accumulation
    // =====================================

    #[tokio::test]
    async fn test_narration_failure_keeps_context_and_continues() {
        let backend = ScriptedBackend::new([
            ScriptStep::reply("Intro."),
            ScriptStep::reply("Phishing"),
            ScriptStep::Timeout,
            ScriptStep::reply("Spear Phishing"),
            ScriptStep::reply("Spear story."),
        ]);
        let mut input = ScriptedInput::new(["email", "target the CFO"]);

        let outcome = play(&backend, &mut input, DEFAULT_MAX_STEPS).await;

        assert!(matches!(outcome.reason, EndReason::InputClosed));
        assert_eq!(path_names(&outcome), vec!["Phishing", "Spear Phishing"]);

        // The selector after the failed narration saw only the intro
        let requests = backend.requests();
        assert!(requests[3].user_prompt().unwrap().starts_with("Intro.\n"));
        // The next narration saw the unchanged context
        assert!(
            requests[4]
                .user_prompt()
                .unwrap()
                .starts_with("Intro.\nYou are in the 'Spear Phishing' phase")
        );
    }

    #[tokio::test]
    async fn test_narratives_are_appended_with_blank_line() {
        let backend = ScriptedBackend::new([
            ScriptStep::reply("Intro."),
            ScriptStep::reply("OSINT"),
            ScriptStep::reply("Recon story."),
            ScriptStep::reply("Exploiting Vulnerability"),
            ScriptStep::reply("Exploit story."),
        ]);
        let mut input = ScriptedInput::new(["search", "exploit"]);

        play(&backend, &mut input, DEFAULT_MAX_STEPS).await;

        let requests = backend.requests();
        assert!(
            requests[4]
                .user_prompt()
                .unwrap()
                .starts_with("Intro.\n\nRecon story.\n")
        );
    }
}
