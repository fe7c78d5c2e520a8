//! Interactive session command — `attack-sim play`.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

use attack_sim::config::CliOverrides;
use attack_sim::input::TerminalInput;
use attack_sim::llm::OpenAiClient;
use attack_sim::phase::load_graph_or_default;
use attack_sim::selector::HaltReason;
use attack_sim::session::{EndReason, Session};
use attack_sim::ui::SessionUi;

/// Run one session and return the process exit code.
///
/// Configuration problems (bad config or graph file, missing API key) are
/// returned as errors and exit with 1.
pub async fn cmd_play(config_path: Option<&Path>, overrides: CliOverrides) -> Result<u8> {
    let config = super::load_config(config_path, overrides)?;
    let ui = SessionUi::new();

    for warning in config.validate() {
        ui.warning(&format!("Config: {}", warning));
    }

    let graph = load_graph_or_default(config.graph_file.as_deref())
        .context("Failed to load attack graph")?;
    let api_key = config.api_key()?;
    let client = OpenAiClient::new(api_key, config.base_url.clone(), config.timeout)?;

    info!(
        model = %config.model.model,
        base_url = client.base_url(),
        phases = graph.phases().len(),
        "Starting session"
    );

    let session_config = config.session_config();
    let mut input = TerminalInput::new();
    let outcome = Session::new(&graph, &client, &session_config, &ui)
        .run(&mut input)
        .await?;

    match &outcome.reason {
        EndReason::SetupFailed(err) => ui.failure(err.category(), &outcome.summary()),
        EndReason::Halted(HaltReason::Collaborator(err)) => {
            ui.failure(err.category(), &outcome.summary())
        }
        EndReason::Halted(HaltReason::Rejected(_)) => {
            ui.finished(false, "End of the attack chain or invalid next phase.");
            ui.warning(&outcome.summary());
        }
        _ => ui.finished(outcome.is_completed(), &outcome.summary()),
    }

    Ok(outcome.exit_code())
}
