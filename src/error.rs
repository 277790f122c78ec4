use std::time::Duration;
use thiserror::Error;

const MAX_BODY_PREVIEW_CHARS: usize = 300;

fn describe_status(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" (status {code})"),
        None => String::new(),
    }
}

fn describe_body(body: &Option<String>) -> String {
    match body.as_deref().map(str::trim) {
        Some(text) if !text.is_empty() => format!(
            " body={}",
            crate::digest::util::truncate_with_ellipsis(text, MAX_BODY_PREVIEW_CHARS)
        ),
        _ => String::new(),
    }
}

/// Failure kinds of the summarization pipeline.
#[derive(Debug, Error)]
pub enum SummarizationError {
    #[error("completion request timed out after {}s", .0.as_secs())]
    Timeout(Duration),
    #[error("completion endpoint returned an empty response")]
    EmptyResponse,
    #[error("transport error{}: {message}{}", describe_status(.status), describe_body(.body))]
    Transport {
        status: Option<u16>,
        body: Option<String>,
        message: String,
    },
    #[error("rate limit exceeded after {attempts} attempts")]
    RateLimitExceeded { attempts: u32 },
    #[error("all {chunks} chunk(s) failed to summarize; last error: {last_error}")]
    AllChunksFailed { chunks: usize, last_error: String },
    #[error("merging partial summaries failed: {0}")]
    MergeFailed(#[source] Box<SummarizationError>),
}

impl SummarizationError {
    pub fn transport(status: Option<u16>, body: Option<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            status,
            body,
            message: message.into(),
        }
    }

    /// HTTP 429 from the endpoint; the only condition the retry layer absorbs.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::Transport { status: Some(429), .. })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Timeout(_) => "timeout",
            Self::EmptyResponse => "empty_response",
            Self::Transport { .. } => "transport_error",
            Self::RateLimitExceeded { .. } => "rate_limit_exceeded",
            Self::AllChunksFailed { .. } => "all_chunks_failed",
            Self::MergeFailed(_) => "merge_failed",
        }
    }
}
