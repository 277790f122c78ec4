pub mod auto;
pub mod compress;
pub mod note_created;
pub mod status;
pub mod summarize;

use anyhow::{Result, anyhow};
use chrono::{Days, Local, NaiveDate};
use serde::Serialize;

use crate::digest::audit;
use crate::digest::client::{CompletionClient, ReqwestTransport};
use crate::digest::config::WorklogConfig;
use crate::digest::daily::{DailyOutcome, DailyRequest, run_daily};
use crate::digest::paths::WorklogPaths;
use crate::digest::pipeline::Summarizer;
use crate::digest::retry::ThreadSleeper;
use crate::digest::state;
use crate::digest::store::{FsNoteStore, FsTranscriptSource, SummarySink};

#[derive(Debug, Clone, Serialize)]
pub struct CommandReport {
    pub command: String,
    pub ok: bool,
    pub details: Vec<String>,
    pub issues: Vec<String>,
}

impl CommandReport {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ok: true,
            details: Vec::new(),
            issues: Vec::new(),
        }
    }

    pub fn detail(&mut self, text: impl Into<String>) {
        self.details.push(text.into());
    }

    pub fn issue(&mut self, text: impl Into<String>) {
        self.ok = false;
        self.issues.push(text.into());
    }
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn day_before(date: NaiveDate) -> Result<NaiveDate> {
    date.checked_sub_days(Days::new(1))
        .ok_or_else(|| anyhow!("no calendar day precedes {date}"))
}

pub fn transcript_source(paths: &WorklogPaths, cfg: &WorklogConfig) -> FsTranscriptSource {
    FsTranscriptSource {
        dir: paths.transcripts_dir.clone(),
        file_format: cfg.notes.transcript_file_format.clone(),
    }
}

pub fn note_store(paths: &WorklogPaths, cfg: &WorklogConfig) -> FsNoteStore {
    FsNoteStore {
        dir: paths.notes_dir.clone(),
        file_format: cfg.notes.note_file_format.clone(),
        target_heading: cfg.notes.target_heading.clone(),
    }
}

fn audit_or_report(
    paths: &WorklogPaths,
    report: &mut CommandReport,
    status: &str,
    message: &str,
) {
    if let Err(err) = audit::append_event(paths, &report.command, status, message) {
        report.issue(format!("audit log write failed: {err:#}"));
    }
}

/// Runs the daily flow for `log_date` against the real endpoint and file
/// store, recording the result in `report`, the audit log and the state file.
pub fn summarize_day(
    paths: &WorklogPaths,
    cfg: &WorklogConfig,
    log_date: NaiveDate,
    auto: bool,
    report: &mut CommandReport,
) -> Result<Option<DailyOutcome>> {
    report.detail(format!("log_date={log_date}"));
    report.detail(format!("mode={}", if auto { "auto" } else { "manual" }));

    let source = transcript_source(paths, cfg);
    let store = note_store(paths, cfg);

    // Auto skips never need the endpoint or its key.
    if auto {
        match store.has_summary(log_date) {
            Ok(true) => {
                let outcome = DailyOutcome::AlreadySummarized;
                record_outcome(paths, report, &source, log_date, auto, &outcome)?;
                return Ok(Some(outcome));
            }
            Ok(false) => {}
            Err(err) => {
                fail_run(paths, report, log_date, &err);
                return Ok(None);
            }
        }
    }

    let endpoint = match cfg.endpoint_config() {
        Ok(endpoint) => endpoint,
        Err(err) => {
            report.issue(format!("{err:#}"));
            return Ok(None);
        }
    };
    let client = CompletionClient::new(ReqwestTransport::new()?, endpoint);
    let sleeper = ThreadSleeper;
    let summarizer = Summarizer::new(&client, &sleeper, cfg.pipeline_options());

    let request = DailyRequest {
        log_date,
        auto,
        min_content_chars: cfg.pipeline.min_content_chars,
    };
    let outcome = match run_daily(&source, &store, &summarizer, request) {
        Ok(outcome) => outcome,
        Err(err) => {
            fail_run(paths, report, log_date, &err);
            return Ok(None);
        }
    };
    record_outcome(paths, report, &source, log_date, auto, &outcome)?;
    Ok(Some(outcome))
}

fn fail_run(
    paths: &WorklogPaths,
    report: &mut CommandReport,
    log_date: NaiveDate,
    err: &anyhow::Error,
) {
    let text = format!("{err:#}");
    tracing::error!(%log_date, error = %text, "daily summary failed");
    report.issue(text.clone());
    audit_or_report(paths, report, "failed", &text);
}

fn record_outcome(
    paths: &WorklogPaths,
    report: &mut CommandReport,
    source: &FsTranscriptSource,
    log_date: NaiveDate,
    auto: bool,
    outcome: &DailyOutcome,
) -> Result<()> {
    report.detail(format!("outcome={}", outcome.status()));
    let mut state = state::load(paths)?;
    match outcome {
        DailyOutcome::Written { note_path, stats } => {
            report.detail(format!("note_path={}", note_path.display()));
            report.detail(format!("original_chars={}", stats.original_chars));
            report.detail(format!("compressed_chars={}", stats.compressed_chars));
            report.detail(format!("chunks={}", stats.chunk_count));
            if !stats.failed_chunks.is_empty() {
                let failed = stats
                    .failed_chunks
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(",");
                report.detail(format!("failed_chunks={failed}"));
            }
            state.last_run_date = Some(today());
            state.last_log_date = Some(log_date);
            state.last_note_path = Some(note_path.display().to_string());
            state::save(paths, &state)?;
            audit_or_report(
                paths,
                report,
                "ok",
                &format!("{log_date} -> {}", note_path.display()),
            );
        }
        DailyOutcome::AlreadySummarized => {
            state.last_run_date = Some(today());
            state::save(paths, &state)?;
            audit_or_report(paths, report, "skipped", &format!("{log_date} already summarized"));
        }
        DailyOutcome::MissingTranscript => {
            let path = source.path_for(log_date)?;
            let text = format!("no transcript for {log_date} at {}", path.display());
            if auto {
                report.detail(text.clone());
            } else {
                report.issue(text.clone());
            }
            audit_or_report(paths, report, "skipped", &text);
        }
        DailyOutcome::InsufficientContent { chars, required } => {
            let text = format!(
                "transcript for {log_date} has too little content ({chars} chars, need {required})"
            );
            if auto {
                report.detail(text.clone());
            } else {
                report.issue(text.clone());
            }
            audit_or_report(paths, report, "skipped", &text);
        }
    }
    Ok(())
}
