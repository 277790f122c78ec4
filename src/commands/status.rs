use anyhow::Result;
use std::env;

use crate::commands::CommandReport;
use crate::digest::config::{load_config, resolve_config_path};
use crate::digest::paths::resolve_paths;
use crate::digest::state;

include!(concat!(env!("OUT_DIR"), "/worklog_env_allowlist.rs"));

const SECRET_KEYS: &[&str] = &["WORKLOG_API_KEY", "GLM_API_KEY"];

fn set_env_keys() -> Vec<String> {
    GENERATED_WORKLOG_ENV_ALLOWLIST
        .iter()
        .chain(["GLM_API_KEY"].iter())
        .filter(|key| env::var_os(key).is_some())
        .map(|key| {
            if SECRET_KEYS.contains(key) {
                format!("{key}=<redacted>")
            } else {
                (*key).to_string()
            }
        })
        .collect()
}

pub fn run() -> Result<CommandReport> {
    let paths = resolve_paths()?;
    let mut report = CommandReport::new("status");

    report.detail(format!("build_id={}", env!("WORKLOG_BUILD_ID")));
    report.detail(format!("worklog_home={}", paths.worklog_home.display()));
    report.detail(format!("transcripts_dir={}", paths.transcripts_dir.display()));
    report.detail(format!("notes_dir={}", paths.notes_dir.display()));
    report.detail(format!("state_file={}", state::state_file_path(&paths).display()));
    report.detail(format!("audit_log={}", paths.logs_dir.join("audit.log").display()));

    let config_path = resolve_config_path(&paths.worklog_home);
    report.detail(format!(
        "config_path={} (present={})",
        config_path.display(),
        config_path.exists()
    ));

    match load_config(&paths.worklog_home) {
        Ok(cfg) => {
            report.detail(format!("endpoint={}", cfg.endpoint.url));
            report.detail(format!("model={}", cfg.endpoint.model));
            report.detail(format!("temperature={}", cfg.endpoint.temperature));
            report.detail(format!("max_tokens={}", cfg.endpoint.max_tokens));
            report.detail(format!("timeout_secs={}", cfg.endpoint.timeout_secs));
            report.detail(format!("chunk_chars={}", cfg.pipeline.chunk_chars));
            report.detail(format!("min_content_chars={}", cfg.pipeline.min_content_chars));
            report.detail(format!("pacing_ms={}", cfg.pipeline.pacing_ms));
            report.detail(format!("max_attempts={}", cfg.pipeline.max_attempts));
            report.detail(format!("backoff_base_secs={}", cfg.pipeline.backoff_base_secs));
            report.detail(format!("target_heading={}", cfg.notes.target_heading));
            report.detail(format!(
                "api_key={}",
                if cfg.api_key.is_some() { "set" } else { "missing" }
            ));
            if cfg.api_key.is_none() {
                report.issue("API key missing: set WORKLOG_API_KEY (or GLM_API_KEY)");
            }
        }
        Err(err) => report.issue(format!("config invalid: {err:#}")),
    }

    if !paths.transcripts_dir.is_dir() {
        report.issue(format!(
            "transcripts dir missing: {}",
            paths.transcripts_dir.display()
        ));
    }

    report.detail(format!(
        "env_keys={}",
        GENERATED_WORKLOG_ENV_ALLOWLIST.join(",")
    ));
    let keys = set_env_keys();
    report.detail(format!(
        "env_set={}",
        if keys.is_empty() { "none".to_string() } else { keys.join(",") }
    ));

    match state::load(&paths) {
        Ok(current) => {
            let show = |d: Option<chrono::NaiveDate>| {
                d.map(|d| d.to_string()).unwrap_or_else(|| "never".to_string())
            };
            report.detail(format!("last_run_date={}", show(current.last_run_date)));
            report.detail(format!("last_log_date={}", show(current.last_log_date)));
            if let Some(note) = current.last_note_path {
                report.detail(format!("last_note_path={note}"));
            }
        }
        Err(err) => report.issue(format!("state unreadable: {err:#}")),
    }

    Ok(report)
}
