//! Typed error hierarchy for the attack simulator.
//!
//! Three kinds cover every failure the session can meet:
//! - `ConfigError`: malformed graph or settings, fatal before the loop starts
//! - `CollaboratorError`: the language model service failed to answer
//! - `InvalidTransition`: the service answered with a phase that is not a legal successor

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors raised while building the phase graph or resolving settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Phase name at entry {index} is empty or padded with whitespace: {name:?}")]
    MalformedPhase { index: usize, name: String },

    #[error("Successor {successor:?} of phase '{phase}' is empty or padded with whitespace")]
    MalformedSuccessor { phase: String, successor: String },

    #[error("Duplicate phase entry: {0}")]
    DuplicatePhase(String),

    #[error("Phase '{phase}' lists successor '{successor}' more than once")]
    DuplicateSuccessor { phase: String, successor: String },

    #[error("Root phase '{0}' does not appear in the graph")]
    UnknownRoot(String),

    #[error("Cycle detected in phase graph. Involved phases: {0:?}")]
    Cycle(Vec<String>),

    #[error("No API key found. Set OPENAI_API_KEY or llm.api_key in the config file")]
    MissingApiKey,

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

/// Failures of the external chat-completion service.
#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("Request timed out after {:?}", .0)]
    Timeout(Duration),

    #[error("HTTP error: {0}")]
    Http(#[source] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Rate limited by the API")]
    RateLimited,

    #[error("Response contained no completion")]
    EmptyCompletion,

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),
}

impl CollaboratorError {
    /// Short category name used in diagnostics.
    pub fn category(&self) -> &'static str {
        match self {
            CollaboratorError::Timeout(_) => "timeout",
            CollaboratorError::Http(_) => "network",
            CollaboratorError::Api { .. } => "api",
            CollaboratorError::RateLimited => "quota",
            CollaboratorError::EmptyCompletion | CollaboratorError::Malformed(_) => {
                "malformed response"
            }
            CollaboratorError::Unavailable(_) => "unavailable",
        }
    }
}

/// The collaborator named a phase outside the legal successor set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{answer}' is not a successor of '{phase}' (allowed: {})", .allowed.join(", "))]
pub struct InvalidTransition {
    pub phase: String,
    pub answer: String,
    pub allowed: Vec<String>,
}
