//! Layered configuration for attack-sim.
//!
//! Settings are read from `attack-sim.toml` in the working directory (or
//! `--config PATH`), then overridden by environment variables, then by CLI
//! flags.
//!
//! # Configuration File Format
//!
//! ```toml
//! [llm]
//! model = "gpt-3.5-turbo"
//! temperature = 0.7
//! base_url = "https://api.openai.com/v1"
//! timeout_secs = 60
//! # api_key = "sk-..."   # prefer OPENAI_API_KEY
//!
//! [session]
//! max_steps = 32
//! # graph_file = "graph.json"
//! ```
//!
//! | Setting          | Environment         | CLI             |
//! |------------------|---------------------|-----------------|
//! | `llm.model`      | `ATTACK_SIM_MODEL`  | `--model`       |
//! | `llm.temperature`|                     | `--temperature` |
//! | `llm.base_url`   | `OPENAI_BASE_URL`   |                 |
//! | `llm.timeout_secs`|                    | `--timeout`     |
//! | `llm.api_key`    | `OPENAI_API_KEY`    |                 |
//! | `session.max_steps` |                  | `--max-steps`   |
//! | `session.graph_file` |                 | `--graph`       |

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::ConfigError;
use crate::llm::{DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_TEMPERATURE, ModelSettings};
use crate::session::{DEFAULT_MAX_STEPS, SessionConfig};

/// Config file looked up in the working directory.
pub const CONFIG_FILE: &str = "attack-sim.toml";

pub const ENV_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_BASE_URL: &str = "OPENAI_BASE_URL";
pub const ENV_MODEL: &str = "ATTACK_SIM_MODEL";

/// Language model settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmSection {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Upper bound on a single request, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_temperature() -> f64 {
    DEFAULT_TEMPERATURE
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            model: default_model(),
            temperature: default_temperature(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            api_key: None,
        }
    }
}

/// Session loop settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSection {
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
    /// JSON graph file; the built-in graph is used when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graph_file: Option<PathBuf>,
}

fn default_max_steps() -> usize {
    DEFAULT_MAX_STEPS
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            max_steps: default_max_steps(),
            graph_file: None,
        }
    }
}

/// The complete attack-sim.toml structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimToml {
    #[serde(default)]
    pub llm: LlmSection,
    #[serde(default)]
    pub session: SessionSection,
}

impl SimToml {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse attack-sim.toml")
    }

    /// Load `explicit` if given (it must exist), else `attack-sim.toml` in `dir`
    /// if present, else defaults. Returns the path that was read, if any.
    pub fn load_or_default(explicit: Option<&Path>, dir: &Path) -> Result<(Self, Option<PathBuf>)> {
        if let Some(path) = explicit {
            return Ok((Self::load(path)?, Some(path.to_path_buf())));
        }
        let path = dir.join(CONFIG_FILE);
        if path.exists() {
            Ok((Self::load(&path)?, Some(path)))
        } else {
            Ok((Self::default(), None))
        }
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            toml::to_string_pretty(self).context("Failed to serialize attack-sim.toml")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }
}

/// Values given on the command line. `None` leaves the lower layer in place.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub model: Option<String>,
    pub temperature: Option<f64>,
    pub max_steps: Option<usize>,
    pub timeout_secs: Option<u64>,
    pub graph_file: Option<PathBuf>,
}

/// Fully resolved settings.
///
/// It merges settings from:
/// 1. attack-sim.toml
/// 2. Environment variables
/// 3. CLI arguments
#[derive(Clone)]
pub struct SimConfig {
    /// Config file that was read, if any
    pub source: Option<PathBuf>,
    pub model: ModelSettings,
    pub base_url: String,
    pub timeout: Duration,
    pub max_steps: usize,
    pub graph_file: Option<PathBuf>,
    api_key: Option<String>,
}

impl std::fmt::Debug for SimConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimConfig")
            .field("source", &self.source)
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("max_steps", &self.max_steps)
            .field("graph_file", &self.graph_file)
            .field("api_key", &self.masked_api_key())
            .finish()
    }
}

impl SimConfig {
    /// Resolve against the process environment.
    pub fn from_env(toml: SimToml, source: Option<PathBuf>, cli: CliOverrides) -> Self {
        Self::resolve(toml, source, cli, |key| std::env::var(key).ok())
    }

    /// Resolve file → env → CLI, reading the environment through `env`.
    pub fn resolve(
        toml: SimToml,
        source: Option<PathBuf>,
        cli: CliOverrides,
        env: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let env = |key: &str| env(key).filter(|v| !v.trim().is_empty());
        let SimToml { llm, session } = toml;

        let model = cli
            .model
            .or_else(|| env(ENV_MODEL))
            .unwrap_or(llm.model);
        let temperature = cli.temperature.unwrap_or(llm.temperature);
        let base_url = env(ENV_BASE_URL).unwrap_or(llm.base_url);
        let timeout_secs = cli.timeout_secs.unwrap_or(llm.timeout_secs);
        let api_key = env(ENV_API_KEY).or(llm.api_key.filter(|k| !k.trim().is_empty()));

        // A relative graph path in the config file is relative to that file
        let graph_file = cli.graph_file.or_else(|| {
            session.graph_file.map(|path| match source.as_deref().and_then(Path::parent) {
                Some(dir) if path.is_relative() => dir.join(path),
                _ => path,
            })
        });

        Self {
            source,
            model: ModelSettings { model, temperature },
            base_url,
            timeout: Duration::from_secs(timeout_secs),
            max_steps: cli.max_steps.unwrap_or(session.max_steps),
            graph_file,
            api_key,
        }
    }

    /// The credential for the chat completions API.
    pub fn api_key(&self) -> Result<&str, ConfigError> {
        self.api_key.as_deref().ok_or(ConfigError::MissingApiKey)
    }

    /// API key with all but the last four characters hidden.
    pub fn masked_api_key(&self) -> String {
        match &self.api_key {
            None => "(not set)".to_string(),
            Some(key) => {
                let chars: Vec<char> = key.chars().collect();
                if chars.len() <= 4 {
                    "****".to_string()
                } else {
                    let tail: String = chars[chars.len() - 4..].iter().collect();
                    format!("****{}", tail)
                }
            }
        }
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            model: self.model.clone(),
            max_steps: self.max_steps,
        }
    }

    /// Validate the resolved configuration and return any warnings.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if !(0.0..=2.0).contains(&self.model.temperature) {
            warnings.push(format!(
                "temperature {} is outside the supported range 0.0..=2.0",
                self.model.temperature
            ));
        }
        if self.model.model.trim().is_empty() {
            warnings.push("model is empty".to_string());
        }
        if self.max_steps == 0 {
            warnings.push("max_steps is 0: sessions will end before the first action".to_string());
        }
        if self.timeout.is_zero() {
            warnings.push("timeout_secs is 0: every request will time out".to_string());
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            warnings.push(format!("base_url '{}' is not an http(s) URL", self.base_url));
        }

        warnings
    }
}
