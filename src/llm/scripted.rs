use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::ChatBackend;
use super::types::ChatRequest;
use crate::errors::CollaboratorError;

/// One canned reaction of a `ScriptedBackend`.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptStep {
    /// Answer with this text
    Reply(String),
    /// Fail as if the request timed out
    Timeout,
    /// Fail with `CollaboratorError::Unavailable`
    Fail(String),
}

impl ScriptStep {
    pub fn reply(text: impl Into<String>) -> Self {
        ScriptStep::Reply(text.into())
    }

    fn into_result(self) -> Result<String, CollaboratorError> {
        match self {
            ScriptStep::Reply(text) => Ok(text),
            ScriptStep::Timeout => Err(CollaboratorError::Timeout(Duration::from_secs(60))),
            ScriptStep::Fail(message) => Err(CollaboratorError::Unavailable(message)),
        }
    }
}

type Responder = Box<dyn Fn(&ChatRequest) -> ScriptStep + Send + Sync>;

/// Deterministic backend that replays a script or computes answers from the request.
///
/// Every request is recorded so tests can assert on what was (or was not) sent.
/// When the script runs dry the backend fails with `Unavailable`.
pub struct ScriptedBackend {
    steps: Mutex<VecDeque<ScriptStep>>,
    responder: Option<Responder>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedBackend {
    pub fn new(steps: impl IntoIterator<Item = ScriptStep>) -> Self {
        Self {
            steps: Mutex::new(steps.into_iter().collect()),
            responder: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Script of plain replies.
    pub fn replies<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(replies.into_iter().map(ScriptStep::reply))
    }

    /// Answer every request by calling `f`.
    pub fn from_fn(f: impl Fn(&ChatRequest) -> ScriptStep + Send + Sync + 'static) -> Self {
        Self {
            steps: Mutex::new(VecDeque::new()),
            responder: Some(Box::new(f)),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Requests received so far, in order.
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }
}

#[async_trait]
impl ChatBackend for ScriptedBackend {
    async fn complete(&self, request: &ChatRequest) -> Result<String, CollaboratorError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        let step = match &self.responder {
            Some(f) => f(request),
            None => self
                .steps
                .lock()
                .ok()
                .and_then(|mut steps| steps.pop_front())
                .unwrap_or_else(|| ScriptStep::Fail("script exhausted".to_string())),
        };

        step.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ModelSettings;

    fn request(user: &str) -> ChatRequest {
        ModelSettings::default().request("system", user.to_string())
    }

    #[tokio::test]
    async fn replays_steps_in_order_then_fails() {
        let backend = ScriptedBackend::new([ScriptStep::reply("one"), ScriptStep::Timeout]);

        assert_eq!(backend.complete(&request("a")).await.unwrap(), "one");
        assert!(matches!(
            backend.complete(&request("b")).await,
            Err(CollaboratorError::Timeout(_))
        ));
        assert!(matches!(
            backend.complete(&request("c")).await,
            Err(CollaboratorError::Unavailable(_))
        ));
        assert_eq!(backend.call_count(), 3);
    }

    #[tokio::test]
    async fn responder_sees_request() {
        let backend = ScriptedBackend::from_fn(|req| {
            ScriptStep::reply(req.user_prompt().unwrap_or_default().to_uppercase())
        });

        assert_eq!(backend.complete(&request("osint")).await.unwrap(), "OSINT");
        assert_eq!(backend.requests()[0].user_prompt(), Some("osint"));
    }
}
