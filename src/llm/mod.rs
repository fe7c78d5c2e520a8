//! Chat-completion collaborator.
//!
//! The narrator and the transition selector never talk to the network
//! directly; they go through the `ChatBackend` trait. Production code uses
//! `OpenAiClient`; tests drive sessions with `ScriptedBackend`.

mod client;
#[cfg(test)]
mod scripted;
mod types;

pub use client::{DEFAULT_BASE_URL, OpenAiClient};
#[cfg(test)]
pub use scripted::{ScriptStep, ScriptedBackend};
pub use types::{ChatMessage, ChatRequest, Role};

use async_trait::async_trait;

use crate::errors::CollaboratorError;

pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_TEMPERATURE: f64 = 0.7;

/// Abstraction over the external text-generation service.
/// Real implementation: `OpenAiClient`. Test double: `ScriptedBackend`.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Send one request and return the raw completion text.
    async fn complete(&self, request: &ChatRequest) -> Result<String, CollaboratorError>;
}

/// Model identifier and sampling temperature attached to every request.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSettings {
    pub model: String,
    pub temperature: f64,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

impl ModelSettings {
    /// Build a two-message request: a role-setting system prompt and the user prompt.
    pub fn request(&self, system: &str, user: String) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
            temperature: self.temperature,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_match_builtin_model() {
        let settings = ModelSettings::default();
        assert_eq!(settings.model, "gpt-3.5-turbo");
        assert!((settings.temperature - 0.7).abs() < f64::EPSILON);
    }

    #[test]
    fn request_carries_settings_and_roles() {
        let settings = ModelSettings {
            model: "gpt-4o-mini".to_string(),
            temperature: 0.2,
        };
        let request = settings.request("system text", "user text".to_string());

        assert_eq!(request.model, "gpt-4o-mini");
        assert!((request.temperature - 0.2).abs() < f64::EPSILON);
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, Role::System);
        assert_eq!(request.messages[1].role, Role::User);
        assert_eq!(request.user_prompt(), Some("user text"));
    }
}
