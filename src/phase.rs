//! Phase definitions and JSON loading for the attack graph.
//!
//! This module provides:
//! - `Phase`, the identifier of a single attack-lifecycle step
//! - `PhaseEntry` / `GraphFile`, the on-disk graph format
//! - The built-in MITRE ATT&CK style graph used when no file is given

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::path::Path;

use crate::errors::ConfigError;
use crate::graph::{GraphBuilder, PhaseGraph};

/// Name of the phase every built-in session starts from.
pub const ROOT_PHASE: &str = "Start";

/// A single step in the simulated attack lifecycle.
///
/// Phases carry no attributes beyond their name; two phases are the same
/// phase exactly when their names are byte-for-byte equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Phase(String);

impl Phase {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// A name is well formed when it is non-empty and carries no
    /// surrounding whitespace (a trimmed answer could never match it).
    pub fn is_well_formed(&self) -> bool {
        !self.0.is_empty() && self.0.trim() == self.0
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for Phase {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Phase {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Phase {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl PartialEq<str> for Phase {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Phase {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// One phase and its ordered list of allowed successors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseEntry {
    pub name: Phase,
    #[serde(default)]
    pub successors: Vec<Phase>,
}

impl PhaseEntry {
    pub fn new(name: &str, successors: &[&str]) -> Self {
        Self {
            name: Phase::from(name),
            successors: successors.iter().map(|s| Phase::from(*s)).collect(),
        }
    }
}

/// Represents a graph file on disk.
///
/// ```json
/// {
///   "root": "Start",
///   "phases": [
///     { "name": "Start", "successors": ["OSINT", "Phishing"] },
///     { "name": "OSINT", "successors": ["Exploiting Vulnerability"] }
///   ]
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphFile {
    /// Phase the session starts from
    pub root: Phase,
    /// Entries in display order
    pub phases: Vec<PhaseEntry>,
}

impl GraphFile {
    /// Load a graph file from JSON.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Save the graph file as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        use anyhow::Context;

        let content =
            serde_json::to_string_pretty(self).context("Failed to serialize graph to JSON")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write graph file: {}", path.display()))?;
        Ok(())
    }

    /// Snapshot of a built graph, suitable for saving.
    pub fn from_graph(graph: &PhaseGraph) -> Self {
        Self {
            root: graph.root().clone(),
            phases: graph.entries().to_vec(),
        }
    }

    /// Validate and freeze into a `PhaseGraph`.
    pub fn into_graph(self) -> Result<PhaseGraph, ConfigError> {
        GraphBuilder::new(self.root, self.phases).build()
    }
}

/// The built-in attack graph.
pub fn default_entries() -> Vec<PhaseEntry> {
    vec![
        PhaseEntry::new(
            "Start",
            &["OSINT", "Phishing", "Network Scanning", "Social Engineering"],
        ),
        PhaseEntry::new("OSINT", &["Exploiting Vulnerability"]),
        PhaseEntry::new("Phishing", &["Spear Phishing"]),
        PhaseEntry::new("Network Scanning", &["Exploiting Vulnerability"]),
        PhaseEntry::new("Social Engineering", &["Spear Phishing"]),
        PhaseEntry::new("Spear Phishing", &["Malware Execution"]),
        PhaseEntry::new("Malware Execution", &["Credential Dumping"]),
        PhaseEntry::new(
            "Credential Dumping",
            &["Data Exfiltration via C2", "Privilege Escalation"],
        ),
        PhaseEntry::new("Exploiting Vulnerability", &["Backdoor Installation"]),
        PhaseEntry::new("Backdoor Installation", &["Credential Manipulation"]),
        PhaseEntry::new(
            "Data Exfiltration via C2",
            &["Data Corruption", "Service Disruption"],
        ),
        PhaseEntry::new("DNS Tunneling", &["Ransomware"]),
    ]
}

/// The built-in graph in file form.
pub fn default_graph_file() -> GraphFile {
    GraphFile {
        root: Phase::from(ROOT_PHASE),
        phases: default_entries(),
    }
}

/// Build the built-in graph.
pub fn default_graph() -> Result<PhaseGraph, ConfigError> {
    default_graph_file().into_graph()
}

/// Load the graph from `path` when given, otherwise use the built-in graph.
///
/// Unlike a missing optional file, an explicitly named file that cannot be
/// read is an error.
pub fn load_graph_or_default(path: Option<&Path>) -> Result<PhaseGraph, ConfigError> {
    match path {
        Some(path) => GraphFile::load(path)?.into_graph(),
        None => default_graph(),
    }
}
