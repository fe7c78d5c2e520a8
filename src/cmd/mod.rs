//! CLI command implementations.
//!
//! Each submodule owns one `Commands` variant:
//!
//! | Module   | Commands handled |
//! |----------|------------------|
//! | `play`   | `Play`           |
//! | `graph`  | `Graph`          |
//! | `config` | `Config`         |

pub mod config;
pub mod graph;
pub mod play;

pub use config::cmd_config;
pub use graph::cmd_graph;
pub use play::cmd_play;

use anyhow::{Context, Result};
use std::path::Path;

use attack_sim::config::{CliOverrides, SimConfig, SimToml};

/// Resolve configuration for the current working directory.
pub(crate) fn load_config(config_path: Option<&Path>, overrides: CliOverrides) -> Result<SimConfig> {
    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    let (toml, source) = SimToml::load_or_default(config_path, &cwd)?;
    Ok(SimConfig::from_env(toml, source, overrides))
}

/// Configuration with only the `--graph` override applied.
pub(crate) fn load_config_with_graph(
    config_path: Option<&Path>,
    graph: Option<&Path>,
) -> Result<SimConfig> {
    load_config(
        config_path,
        CliOverrides {
            graph_file: graph.map(Path::to_path_buf),
            ..CliOverrides::default()
        },
    )
}
