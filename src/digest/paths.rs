use anyhow::Result;
use serde::Serialize;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize)]
pub struct WorklogPaths {
    pub worklog_home: PathBuf,
    pub vault_dir: PathBuf,
    pub transcripts_dir: PathBuf,
    pub notes_dir: PathBuf,
    pub state_dir: PathBuf,
    pub logs_dir: PathBuf,
}

fn required_home_dir() -> Result<PathBuf> {
    if let Some(home) = dirs::home_dir() {
        return Ok(home);
    }
    Err(anyhow::anyhow!("HOME directory could not be resolved"))
}

fn env_or_default_path(var: &str, fallback: PathBuf) -> PathBuf {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => PathBuf::from(v.trim()),
        _ => fallback,
    }
}

pub fn resolve_paths() -> Result<WorklogPaths> {
    let home = required_home_dir()?;
    let worklog_home = env_or_default_path("WORKLOG_HOME", home.join(".worklog"));
    let vault_dir = env_or_default_path("WORKLOG_VAULT_DIR", home.join("vault"));

    let transcripts_dir = env_or_default_path(
        "WORKLOG_TRANSCRIPTS_DIR",
        vault_dir.join("AI-Output/_CLAUDE/Talklog"),
    );
    let notes_dir = env_or_default_path("WORKLOG_NOTES_DIR", vault_dir.join("Daily"));
    let state_dir = worklog_home.join("state");
    let logs_dir = worklog_home.join("logs");

    Ok(WorklogPaths {
        worklog_home,
        vault_dir,
        transcripts_dir,
        notes_dir,
        state_dir,
        logs_dir,
    })
}
