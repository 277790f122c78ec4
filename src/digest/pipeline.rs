use crate::digest::chunk::split_chunks;
use crate::digest::client::{Completion, ModelSettings};
use crate::digest::compress::compress_with_stats;
use crate::digest::merge::SummaryMerger;
use crate::digest::retry::{RetryPolicy, RetryingClient, Sleeper};
use crate::digest::summarizer::SequentialSummarizer;
use crate::error::SummarizationError;
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOptions {
    pub chunk_chars: usize,
    pub pacing: Duration,
    pub retry: RetryPolicy,
    pub model: ModelSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub original_chars: usize,
    pub compressed_chars: usize,
    pub chunk_count: usize,
    /// One-based chunk numbers that produced no partial summary.
    pub failed_chunks: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalSummary {
    pub text: String,
    pub stats: RunStats,
}

/// The whole transcript-to-Markdown pipeline over one completion backend.
pub struct Summarizer<'a> {
    client: &'a dyn Completion,
    sleeper: &'a dyn Sleeper,
    options: PipelineOptions,
}

impl<'a> Summarizer<'a> {
    pub fn new(client: &'a dyn Completion, sleeper: &'a dyn Sleeper, options: PipelineOptions) -> Self {
        Self {
            client,
            sleeper,
            options,
        }
    }

    pub fn summarize(&self, transcript: &str) -> Result<FinalSummary, SummarizationError> {
        let (compressed, compression) = compress_with_stats(transcript);
        tracing::info!(
            original_chars = compression.original_chars,
            compressed_chars = compression.compressed_chars,
            reduction_percent = compression.reduction_percent(),
            "compressed transcript"
        );

        let chunks = split_chunks(&compressed, self.options.chunk_chars);
        tracing::info!(chunks = chunks.len(), "dispatching chunks");

        let retrying = RetryingClient::new(self.client, self.sleeper, self.options.retry);
        let run = SequentialSummarizer::new(
            &retrying,
            self.sleeper,
            &self.options.model,
            self.options.pacing,
        )
        .run(&chunks);

        let stats = RunStats {
            original_chars: compression.original_chars,
            compressed_chars: compression.compressed_chars,
            chunk_count: chunks.len(),
            failed_chunks: run.failures.iter().map(|f| f.index + 1).collect(),
        };

        let text = match run.partials.len() {
            0 => {
                return Err(SummarizationError::AllChunksFailed {
                    chunks: chunks.len(),
                    last_error: run
                        .last_error()
                        .map(ToString::to_string)
                        .unwrap_or_else(|| "no chunks produced".to_string()),
                });
            }
            1 => run.partials.into_iter().next().unwrap_or_default(),
            _ => SummaryMerger::new(&retrying, &self.options.model).merge(&run.partials)?,
        };

        if !stats.failed_chunks.is_empty() {
            tracing::warn!(
                failed = ?stats.failed_chunks,
                total = stats.chunk_count,
                "summary produced with missing chunks"
            );
        }
        tracing::info!(summary_chars = text.chars().count(), "summary ready");
        Ok(FinalSummary { text, stats })
    }
}
