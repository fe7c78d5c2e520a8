//! Configuration view and validation commands — `attack-sim config`.

use anyhow::{Context, Result};
use std::path::Path;

use super::super::ConfigCommands;
use attack_sim::config::{CONFIG_FILE, SimToml};

pub fn cmd_config(
    config_path: Option<&Path>,
    graph_path: Option<&Path>,
    command: Option<ConfigCommands>,
) -> Result<()> {
    match command {
        None | Some(ConfigCommands::Show) => {
            let config = super::load_config_with_graph(config_path, graph_path)?;

            println!();
            println!("attack-sim Configuration");
            println!("========================");
            println!();
            match &config.source {
                Some(path) => println!("Config file: {}", path.display()),
                None => println!("No {} found, using defaults", CONFIG_FILE),
            }
            println!();
            println!("Effective values (with env/CLI overrides):");
            println!("[llm]");
            println!("  model = \"{}\"", config.model.model);
            println!("  temperature = {}", config.model.temperature);
            println!("  base_url = \"{}\"", config.base_url);
            println!("  timeout_secs = {}", config.timeout.as_secs());
            println!("  api_key = {}", config.masked_api_key());
            println!();
            println!("[session]");
            println!("  max_steps = {}", config.max_steps);
            match &config.graph_file {
                Some(path) => println!("  graph_file = \"{}\"", path.display()),
                None => println!("  graph_file = (built-in)"),
            }
            println!();
        }
        Some(ConfigCommands::Validate) => {
            let config = super::load_config_with_graph(config_path, graph_path)?;

            println!();
            println!("Validating configuration...");
            println!();

            let warnings = config.validate();
            if warnings.is_empty() {
                println!("Configuration is valid.");
            } else {
                println!("Configuration warnings:");
                for warning in warnings {
                    println!("  - {}", warning);
                }
            }
            if config.api_key().is_err() {
                println!("  - no API key set; 'play' needs OPENAI_API_KEY");
            }
            println!();
        }
        Some(ConfigCommands::Init) => {
            let path = match config_path {
                Some(path) => path.to_path_buf(),
                None => std::env::current_dir()
                    .context("Failed to get current directory")?
                    .join(CONFIG_FILE),
            };

            if path.exists() {
                println!("{} already exists at {}", CONFIG_FILE, path.display());
                println!("Delete it first if you want to recreate it.");
                return Ok(());
            }

            SimToml::default().save(&path)?;

            println!("Created {} at {}", CONFIG_FILE, path.display());
            println!();
            println!("You can now customize:");
            println!("  - [llm] model, temperature, base_url, timeout_secs");
            println!("  - [session] max_steps, graph_file");
            println!("Keep the API key in OPENAI_API_KEY or a .env file.");
            println!();
        }
    }

    Ok(())
}
