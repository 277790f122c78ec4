use crate::digest::client::{
    Completion, CompletionRequest, CompletionResult, HttpReply, HttpTransport, SendError,
};
use crate::digest::retry::Sleeper;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct SentRequest {
    pub url: String,
    pub bearer: String,
    pub body: String,
    pub timeout: Duration,
}

/// Replays canned transport outcomes in order and records what was sent.
pub struct ScriptedTransport {
    replies: RefCell<VecDeque<Result<HttpReply, SendError>>>,
    pub sent: RefCell<Vec<SentRequest>>,
}

impl ScriptedTransport {
    pub fn new(replies: Vec<Result<HttpReply, SendError>>) -> Self {
        Self {
            replies: RefCell::new(replies.into()),
            sent: RefCell::new(Vec::new()),
        }
    }

    pub fn ok_json(body: serde_json::Value) -> Result<HttpReply, SendError> {
        Ok(HttpReply {
            status: 200,
            body: body.to_string(),
        })
    }

    pub fn ok_content(content: &str) -> Result<HttpReply, SendError> {
        Self::ok_json(serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": content}}]
        }))
    }
}

impl HttpTransport for ScriptedTransport {
    fn post_json(
        &self,
        url: &str,
        bearer: &str,
        body: String,
        timeout: Duration,
    ) -> Result<HttpReply, SendError> {
        self.sent.borrow_mut().push(SentRequest {
            url: url.to_string(),
            bearer: bearer.to_string(),
            body,
            timeout,
        });
        self.replies
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(SendError::Failed("no scripted reply left".to_string())))
    }
}

/// Completion stub driven by a closure over the request; keeps every request.
pub struct FnCompletion<F> {
    respond: F,
    pub requests: RefCell<Vec<CompletionRequest>>,
}

impl<F> FnCompletion<F>
where
    F: Fn(&CompletionRequest) -> CompletionResult,
{
    pub fn new(respond: F) -> Self {
        Self {
            respond,
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.borrow().len()
    }
}

impl<F> Completion for FnCompletion<F>
where
    F: Fn(&CompletionRequest) -> CompletionResult,
{
    fn complete(&self, request: &CompletionRequest) -> CompletionResult {
        self.requests.borrow_mut().push(request.clone());
        (self.respond)(request)
    }
}

#[derive(Default)]
pub struct RecordingSleeper {
    pub waits: RefCell<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn total(&self) -> Duration {
        self.waits.borrow().iter().sum()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.waits.borrow_mut().push(duration);
    }
}
