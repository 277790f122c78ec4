use crate::digest::pipeline::{RunStats, Summarizer};
use crate::digest::store::{SummarySink, TranscriptSource};
use crate::digest::util::content_chars_without_headings;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy)]
pub struct DailyRequest {
    pub log_date: NaiveDate,
    /// Triggered without a user asking; skips days that already have a summary.
    pub auto: bool,
    pub min_content_chars: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DailyOutcome {
    Written { note_path: PathBuf, stats: RunStats },
    AlreadySummarized,
    MissingTranscript,
    InsufficientContent { chars: usize, required: usize },
}

impl DailyOutcome {
    pub fn status(&self) -> &'static str {
        match self {
            Self::Written { .. } => "written",
            Self::AlreadySummarized => "already_summarized",
            Self::MissingTranscript => "missing_transcript",
            Self::InsufficientContent { .. } => "insufficient_content",
        }
    }
}

pub fn run_daily(
    source: &dyn TranscriptSource,
    sink: &dyn SummarySink,
    summarizer: &Summarizer<'_>,
    request: DailyRequest,
) -> Result<DailyOutcome> {
    let log_date = request.log_date;
    if request.auto && sink.has_summary(log_date)? {
        tracing::info!(%log_date, "summary already present; skipping");
        return Ok(DailyOutcome::AlreadySummarized);
    }

    let Some(transcript) = source.read(log_date)? else {
        tracing::info!(%log_date, "no transcript for date");
        return Ok(DailyOutcome::MissingTranscript);
    };

    let chars = content_chars_without_headings(&transcript);
    if chars < request.min_content_chars {
        tracing::info!(%log_date, chars, "transcript too short to summarize");
        return Ok(DailyOutcome::InsufficientContent {
            chars,
            required: request.min_content_chars,
        });
    }

    let summary = summarizer
        .summarize(&transcript)
        .with_context(|| format!("failed to summarize log for {log_date}"))?;
    let note_path = sink.insert_summary(log_date, &summary.text)?;
    tracing::info!(%log_date, note = %note_path.display(), "summary written");

    Ok(DailyOutcome::Written {
        note_path,
        stats: summary.stats,
    })
}
