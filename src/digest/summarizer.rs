use crate::digest::client::{Completion, ModelSettings};
use crate::digest::normalize::normalize_response;
use crate::digest::prompts::{SYSTEM_PROMPT, build_chunk_prompt};
use crate::digest::retry::Sleeper;
use crate::error::SummarizationError;
use std::time::Duration;

#[derive(Debug)]
pub struct ChunkFailure {
    /// Zero-based position of the chunk in dispatch order.
    pub index: usize,
    pub error: SummarizationError,
}

#[derive(Debug, Default)]
pub struct ChunkRun {
    pub partials: Vec<String>,
    pub failures: Vec<ChunkFailure>,
}

impl ChunkRun {
    pub fn last_error(&self) -> Option<&SummarizationError> {
        self.failures.last().map(|f| &f.error)
    }
}

/// Sends chunks one at a time, pausing `pacing` between requests.
pub struct SequentialSummarizer<'a> {
    client: &'a dyn Completion,
    sleeper: &'a dyn Sleeper,
    settings: &'a ModelSettings,
    pacing: Duration,
}

impl<'a> SequentialSummarizer<'a> {
    pub fn new(
        client: &'a dyn Completion,
        sleeper: &'a dyn Sleeper,
        settings: &'a ModelSettings,
        pacing: Duration,
    ) -> Self {
        Self {
            client,
            sleeper,
            settings,
            pacing,
        }
    }

    pub fn run(&self, chunks: &[&str]) -> ChunkRun {
        let mut run = ChunkRun::default();
        let total = chunks.len();

        for (index, chunk) in chunks.iter().enumerate() {
            if index > 0 {
                self.sleeper.sleep(self.pacing);
            }
            tracing::debug!(
                chunk = index + 1,
                total,
                chars = chunk.chars().count(),
                "summarizing chunk"
            );

            let request = self
                .settings
                .request(SYSTEM_PROMPT, build_chunk_prompt(chunk));
            let outcome = self.client.complete(&request).and_then(|reply| {
                let partial = normalize_response(&reply);
                if partial.is_empty() {
                    Err(SummarizationError::EmptyResponse)
                } else {
                    Ok(partial)
                }
            });

            match outcome {
                Ok(partial) => run.partials.push(partial),
                Err(error) => {
                    tracing::warn!(
                        chunk = index + 1,
                        total,
                        kind = error.kind(),
                        error = %error,
                        "chunk summary failed; continuing"
                    );
                    run.failures.push(ChunkFailure { index, error });
                }
            }
        }
        run
    }
}
