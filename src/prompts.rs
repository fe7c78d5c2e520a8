//! Prompt text sent to the chat-completion service.
//!
//! Every prompt embeds the full phase graph so the model can describe the
//! options that follow the current phase. The transition prompt additionally
//! enumerates the exact successor set; the selector rejects any answer
//! outside it.

use crate::graph::PhaseGraph;
use crate::phase::Phase;

/// System prompt for the opening story.
pub const INTRO_SYSTEM_PROMPT: &str = "This is a cybersecurity training simulation.";

/// System prompt for the transition selector.
pub const MASTER_SYSTEM_PROMPT: &str =
    "You are the master controller for a cybersecurity simulation game.";

/// System prompt for per-phase narration.
pub const STORY_SYSTEM_PROMPT: &str =
    "You are responsible for generating story narratives in a cybersecurity simulation game.";

/// Marker that precedes the comma-separated successor list in the transition prompt.
pub const OPTIONS_MARKER: &str = "Available techniques for the next phase: ";

/// Render the graph as one `"Phase": ["Successor", ...]` line per entry.
pub fn render_graph(graph: &PhaseGraph) -> String {
    graph
        .entries()
        .iter()
        .map(|entry| {
            let successors = entry
                .successors
                .iter()
                .map(|s| format!("\"{}\"", s))
                .collect::<Vec<_>>()
                .join(", ");
            format!("\"{}\": [{}]", entry.name, successors)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Comma-separated successor names, in configured order.
pub fn render_options(successors: &[Phase]) -> String {
    successors
        .iter()
        .map(Phase::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// User prompt for the opening story of a session.
pub fn intro_prompt(graph: &PhaseGraph) -> String {
    format!(
        "Write a detailed introductory story for this simulation. Describe a fictional target \
         organization, the attacker's objectives, the organization's critical systems, and the \
         reconnaissance techniques available at the start of the attack. Structure the story as \
         the opening of a cybersecurity attack simulation game.\n\
         You must present the options that follow the '{root}' phase: {options}.\n\
         Here is the graph of MITRE ATT&CK techniques:\n{graph}",
        root = graph.root(),
        options = render_options(graph.successors(graph.root().as_str())),
        graph = render_graph(graph),
    )
}

/// User prompt asking the model to pick exactly one successor of `phase`.
pub fn transition_prompt(
    graph: &PhaseGraph,
    phase: &Phase,
    context: &str,
    player_input: &str,
) -> String {
    format!(
        "{context}\n\
         You are currently in the '{phase}' phase.\n\
         Player input: {player_input}\n\
         {marker}{options}.\n\
         Analyze the player's response and choose the next technique to advance the attack \
         sequence. It must be exactly one of the available techniques listed above. \
         Reply with only the exact phase name and no other text.\n\
         Here is the entire graph:\n{graph}",
        marker = OPTIONS_MARKER,
        options = render_options(graph.successors(phase.as_str())),
        graph = render_graph(graph),
    )
}

/// User prompt for the narrative of a newly entered phase.
pub fn narration_prompt(graph: &PhaseGraph, phase: &Phase, context: &str) -> String {
    let successors = graph.successors(phase.as_str());
    let follow_up = if successors.is_empty() {
        format!(
            "The '{phase}' phase ends the attack chain; close the story with its outcome."
        )
    } else {
        format!(
            "You must present the options that follow the '{phase}' phase: {}.",
            render_options(successors)
        )
    };

    format!(
        "{context}\n\
         You are in the '{phase}' phase of the attack.\n\
         Based on the player's previous actions and the game context, write a descriptive \
         narrative for this phase. Describe the player's actions, their outcomes, and any \
         important discoveries, and suggest logical follow-up actions for the next phase.\n\
         {follow_up}\n\
         Here is the graph of MITRE ATT&CK techniques:\n{graph}",
        graph = render_graph(graph),
    )
}

/// Parse the successor list back out of a transition prompt.
///
/// Scripted backends use this to answer like a well-behaved model.
#[cfg(test)]
pub fn parse_options(prompt: &str) -> Vec<&str> {
    prompt
        .lines()
        .find_map(|line| line.strip_prefix(OPTIONS_MARKER))
        .map(|rest| rest.trim_end_matches('.'))
        .filter(|rest| !rest.is_empty())
        .map(|rest| rest.split(", ").collect())
        .unwrap_or_default()
}
