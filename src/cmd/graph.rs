//! Graph inspection commands — `attack-sim graph`.

use anyhow::{Context, Result};
use console::style;
use std::path::Path;

use super::super::GraphCommands;
use attack_sim::graph::PhaseGraph;
use attack_sim::phase::{GraphFile, load_graph_or_default};
use attack_sim::ui::icons::CHECK;

pub fn cmd_graph(
    config_path: Option<&Path>,
    graph_path: Option<&Path>,
    command: GraphCommands,
) -> Result<()> {
    let config = super::load_config_with_graph(config_path, graph_path)?;
    let source = config
        .graph_file
        .as_ref()
        .map_or_else(|| "built-in".to_string(), |p| p.display().to_string());
    let graph = load_graph_or_default(config.graph_file.as_deref())
        .with_context(|| format!("Invalid attack graph ({})", source))?;

    match command {
        GraphCommands::Show => show_graph(&graph, &source),
        GraphCommands::Validate => {
            println!(
                "{}Graph is valid ({}): {} phases, {} terminal, longest path {} phases",
                CHECK,
                source,
                graph.phases().len(),
                graph.terminal_phases().len(),
                graph.longest_path_from_root()
            );
        }
        GraphCommands::Export { output } => {
            GraphFile::from_graph(&graph).save(&output)?;
            println!("Wrote graph to {}", output.display());
        }
    }

    Ok(())
}

fn show_graph(graph: &PhaseGraph, source: &str) {
    let unreachable = graph.unreachable_phases();

    println!();
    println!("Attack graph ({})", source);
    println!("Root: {}", style(graph.root()).yellow().bold());
    println!();

    let width = graph
        .phases()
        .iter()
        .map(|p| p.as_str().len())
        .max()
        .unwrap_or(0);

    for phase in graph.phases() {
        let successors = graph.successors(phase.as_str());
        let targets = if successors.is_empty() {
            style("(terminal)").green().to_string()
        } else {
            successors
                .iter()
                .map(|s| s.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        };
        let marker = if unreachable.contains(&phase) {
            style(" [unreachable]").dim().to_string()
        } else {
            String::new()
        };
        println!("  {:<width$} -> {}{}", phase.as_str(), targets, marker, width = width);
    }
    println!();
}
