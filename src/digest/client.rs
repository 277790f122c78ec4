use crate::error::SummarizationError;
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub type CompletionResult = Result<String, SummarizationError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

/// Body of one chat-completions call; built fresh for every request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl CompletionRequest {
    pub fn user_content(&self) -> &str {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .unwrap_or("")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelSettings {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl ModelSettings {
    pub fn request(&self, system: &str, user: String) -> CompletionRequest {
        CompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: Role::System,
                    content: system.to_string(),
                },
                ChatMessage {
                    role: Role::User,
                    content: user,
                },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }
}

pub trait Completion {
    fn complete(&self, request: &CompletionRequest) -> CompletionResult;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendError {
    TimedOut,
    Failed(String),
}

/// One JSON POST with bearer auth, abandoned once `timeout` elapses.
pub trait HttpTransport {
    fn post_json(
        &self,
        url: &str,
        bearer: &str,
        body: String,
        timeout: Duration,
    ) -> Result<HttpReply, SendError>;
}

pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> anyhow::Result<Self> {
        let client = Client::builder().build()?;
        Ok(Self { client })
    }
}

impl HttpTransport for ReqwestTransport {
    fn post_json(
        &self,
        url: &str,
        bearer: &str,
        body: String,
        timeout: Duration,
    ) -> Result<HttpReply, SendError> {
        let classify = |err: reqwest::Error| {
            if err.is_timeout() {
                SendError::TimedOut
            } else {
                SendError::Failed(err.to_string())
            }
        };

        let response = self
            .client
            .post(url)
            .timeout(timeout)
            .bearer_auth(bearer)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .map_err(classify)?;
        let status = response.status().as_u16();
        let body = response.text().map_err(classify)?;
        Ok(HttpReply { status, body })
    }
}

#[derive(Debug, Clone)]
pub struct EndpointConfig {
    pub url: String,
    pub api_key: String,
    pub timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
    reasoning_content: Option<String>,
}

fn non_empty(text: Option<&str>) -> Option<&str> {
    text.map(str::trim).filter(|t| !t.is_empty())
}

/// Pull the reply text out of a chat-completions body. `content` wins; the
/// reasoning channel is used when some models leave `content` empty.
fn extract_reply_text(status: u16, body: &str) -> CompletionResult {
    let parsed: ChatCompletionResponse = serde_json::from_str(body).map_err(|err| {
        SummarizationError::transport(
            Some(status),
            Some(body.to_string()),
            format!("malformed completion body: {err}"),
        )
    })?;
    let message = parsed
        .choices
        .into_iter()
        .find_map(|choice| choice.message)
        .ok_or(SummarizationError::EmptyResponse)?;

    non_empty(message.content.as_deref())
        .or_else(|| non_empty(message.reasoning_content.as_deref()))
        .map(str::to_string)
        .ok_or(SummarizationError::EmptyResponse)
}

/// Issues exactly one completion request per call. Retries live one layer up.
pub struct CompletionClient<T> {
    transport: T,
    endpoint: EndpointConfig,
}

impl<T: HttpTransport> CompletionClient<T> {
    pub fn new(transport: T, endpoint: EndpointConfig) -> Self {
        Self {
            transport,
            endpoint,
        }
    }

    #[cfg(test)]
    pub fn transport(&self) -> &T {
        &self.transport
    }
}

impl<T: HttpTransport> Completion for CompletionClient<T> {
    fn complete(&self, request: &CompletionRequest) -> CompletionResult {
        let body = serde_json::to_string(request).map_err(|err| {
            SummarizationError::transport(None, None, format!("failed to encode request: {err}"))
        })?;
        tracing::debug!(
            model = %request.model,
            body_len = body.len(),
            "sending completion request"
        );

        let reply = match self.transport.post_json(
            &self.endpoint.url,
            &self.endpoint.api_key,
            body,
            self.endpoint.timeout,
        ) {
            Ok(reply) => reply,
            Err(SendError::TimedOut) => return Err(SummarizationError::Timeout(self.endpoint.timeout)),
            Err(SendError::Failed(message)) => {
                return Err(SummarizationError::transport(None, None, message));
            }
        };

        if !(200..300).contains(&reply.status) {
            return Err(SummarizationError::transport(
                Some(reply.status),
                Some(reply.body),
                "completion endpoint rejected request",
            ));
        }
        extract_reply_text(reply.status, &reply.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::test_support::ScriptedTransport;
    use serde_json::{Value, json};

    fn settings() -> ModelSettings {
        ModelSettings {
            model: "glm-4.5-air".to_string(),
            temperature: 0.3,
            max_tokens: 2000,
        }
    }

    fn client(replies: Vec<Result<HttpReply, SendError>>) -> CompletionClient<ScriptedTransport> {
        CompletionClient::new(
            ScriptedTransport::new(replies),
            EndpointConfig {
                url: "https://llm.example/v4/chat/completions".to_string(),
                api_key: "secret".to_string(),
                timeout: Duration::from_secs(7),
            },
        )
    }

    #[test]
    fn request_body_follows_chat_completions_contract() {
        let client = client(vec![ScriptedTransport::ok_json(json!({
            "choices": [{"message": {"content": "done"}}]
        }))]);
        let got = client.complete(&settings().request("sys", "hello".to_string()));
        assert_eq!(got.expect("completion should succeed"), "done");

        let sent = client.transport().sent.borrow();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].bearer, "secret");
        assert_eq!(sent[0].timeout, Duration::from_secs(7));
        let body: Value = serde_json::from_str(&sent[0].body).expect("json body");
        assert_eq!(body["model"], "glm-4.5-air");
        assert_eq!(body["max_tokens"], 2000);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["messages"][1]["content"], "hello");
        assert!(body["temperature"].as_f64().is_some());
    }

    #[test]
    fn reasoning_channel_is_used_when_content_is_empty() {
        let client = client(vec![ScriptedTransport::ok_json(json!({
            "choices": [{"message": {"content": "  ", "reasoning_content": "thought summary"}}]
        }))]);
        let got = client.complete(&settings().request("sys", "x".to_string()));
        assert_eq!(got.expect("fallback text"), "thought summary");
    }

    #[test]
    fn blank_or_missing_text_is_empty_response() {
        let client = client(vec![
            ScriptedTransport::ok_json(json!({"choices": [{"message": {"content": "\n"}}]})),
            ScriptedTransport::ok_json(json!({"choices": []})),
            ScriptedTransport::ok_json(json!({"choices": [{"message": {}}]})),
        ]);
        for _ in 0..3 {
            let err = client
                .complete(&settings().request("sys", "x".to_string()))
                .expect_err("empty reply must fail");
            assert!(matches!(err, SummarizationError::EmptyResponse), "{err}");
        }
    }

    #[test]
    fn non_success_status_is_transport_error_with_body() {
        let client = client(vec![Ok(HttpReply {
            status: 429,
            body: "{\"error\":\"rate limited\"}".to_string(),
        })]);
        let err = client
            .complete(&settings().request("sys", "x".to_string()))
            .expect_err("429 must fail");
        assert!(err.is_rate_limited());
        match err {
            SummarizationError::Transport { status, body, .. } => {
                assert_eq!(status, Some(429));
                assert!(body.unwrap_or_default().contains("rate limited"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn malformed_body_is_transport_error() {
        let client = client(vec![Ok(HttpReply {
            status: 200,
            body: "<html>gateway</html>".to_string(),
        })]);
        let err = client
            .complete(&settings().request("sys", "x".to_string()))
            .expect_err("html must fail");
        assert!(matches!(err, SummarizationError::Transport { status: Some(200), .. }));
    }

    #[test]
    fn transport_timeout_maps_to_timeout_kind() {
        let client = client(vec![Err(SendError::TimedOut)]);
        let err = client
            .complete(&settings().request("sys", "x".to_string()))
            .expect_err("timeout must fail");
        assert!(matches!(err, SummarizationError::Timeout(d) if d == Duration::from_secs(7)));
    }

    #[test]
    fn connection_failure_has_no_status() {
        let client = client(vec![Err(SendError::Failed("connection refused".to_string()))]);
        let err = client
            .complete(&settings().request("sys", "x".to_string()))
            .expect_err("connection failure must fail");
        assert!(matches!(err, SummarizationError::Transport { status: None, .. }));
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn user_content_returns_last_user_message() {
        let request = settings().request("sys", "payload".to_string());
        assert_eq!(request.user_content(), "payload");
    }
}
