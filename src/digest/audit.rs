use crate::digest::paths::WorklogPaths;
use crate::digest::util::now_epoch_secs;
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::io::Write;

#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    pub at_epoch_secs: u64,
    pub phase: String,
    pub status: String,
    pub message: String,
}

pub fn append_event(paths: &WorklogPaths, phase: &str, status: &str, message: &str) -> Result<()> {
    fs::create_dir_all(&paths.logs_dir)
        .with_context(|| format!("failed to create {}", paths.logs_dir.display()))?;
    let event = AuditEvent {
        at_epoch_secs: now_epoch_secs()?,
        phase: phase.to_string(),
        status: status.to_string(),
        message: message.to_string(),
    };

    let line = format!("{}\n", serde_json::to_string(&event)?);
    let path = paths.logs_dir.join("audit.log");
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    file.write_all(line.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_append_as_json_lines() {
        let dir = tempfile::tempdir().expect("tempdir");
        let paths = WorklogPaths {
            worklog_home: dir.path().to_path_buf(),
            vault_dir: dir.path().join("vault"),
            transcripts_dir: dir.path().join("talk"),
            notes_dir: dir.path().join("notes"),
            state_dir: dir.path().join("state"),
            logs_dir: dir.path().join("logs"),
        };
        append_event(&paths, "summarize", "ok", "wrote note").expect("first");
        append_event(&paths, "auto", "skipped", "already ran").expect("second");

        let raw = fs::read_to_string(paths.logs_dir.join("audit.log")).expect("read log");
        let lines: Vec<&str> = raw.lines().collect();
        assert_eq!(lines.len(), 2);
        let second: serde_json::Value = serde_json::from_str(lines[1]).expect("json line");
        assert_eq!(second["phase"], "auto");
        assert_eq!(second["status"], "skipped");
    }
}
