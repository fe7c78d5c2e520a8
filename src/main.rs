use clap::{ArgAction, Parser, Subcommand};
use console::style;
use std::path::PathBuf;
use std::process::ExitCode;

use attack_sim::logging::{self, LogFormat};

mod cmd;

#[derive(Parser)]
#[command(name = "attack-sim")]
#[command(version, about = "Interactive attack-chain simulation narrated by a language model")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Log output format on stderr
    #[arg(long, value_enum, default_value_t = LogFormat::Human, global = true)]
    pub log_format: LogFormat,

    /// Path to the config file. Defaults to ./attack-sim.toml when present
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// JSON graph file to use instead of the built-in attack graph
    #[arg(long, global = true)]
    pub graph: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Play a session through the attack graph
    Play {
        /// Model name sent to the chat completions API
        #[arg(long)]
        model: Option<String>,

        /// Sampling temperature (0.0-2.0)
        #[arg(long)]
        temperature: Option<f64>,

        /// Maximum number of phase transitions before the session stops
        #[arg(long)]
        max_steps: Option<usize>,

        /// Per-request timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,
    },
    /// Inspect the attack graph
    Graph {
        #[command(subcommand)]
        command: GraphCommands,
    },
    /// View, validate or create configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
pub enum GraphCommands {
    /// Print every phase with its successors
    Show,
    /// Check the graph for structural errors
    Validate,
    /// Write the active graph as a JSON graph file
    Export { output: PathBuf },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Validate configuration and show any warnings
    Validate,
    /// Initialize a default attack-sim.toml file
    Init,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    logging::init_logging(cli.log_format, cli.verbose);

    let result = match &cli.command {
        Commands::Play {
            model,
            temperature,
            max_steps,
            timeout,
        } => {
            let overrides = attack_sim::config::CliOverrides {
                model: model.clone(),
                temperature: *temperature,
                max_steps: *max_steps,
                timeout_secs: *timeout,
                graph_file: cli.graph.clone(),
            };
            cmd::cmd_play(cli.config.as_deref(), overrides).await
        }
        Commands::Graph { command } => {
            cmd::cmd_graph(cli.config.as_deref(), cli.graph.as_deref(), command.clone())
                .map(|()| 0)
        }
        Commands::Config { command } => {
            cmd::cmd_config(cli.config.as_deref(), cli.graph.as_deref(), command.clone())
                .map(|()| 0)
        }
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("{} {:#}", style("Error:").red().bold(), e);
            ExitCode::from(1)
        }
    }
}
