use crate::digest::paths::WorklogPaths;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WorklogState {
    pub schema_version: u32,
    /// Calendar day of the last startup check, skipped or not.
    pub last_run_date: Option<NaiveDate>,
    pub last_log_date: Option<NaiveDate>,
    pub last_note_path: Option<String>,
}

impl Default for WorklogState {
    fn default() -> Self {
        Self {
            schema_version: 1,
            last_run_date: None,
            last_log_date: None,
            last_note_path: None,
        }
    }
}

pub fn state_file_path(paths: &WorklogPaths) -> PathBuf {
    paths.state_dir.join("worklog_state.json")
}

pub fn load(paths: &WorklogPaths) -> Result<WorklogState> {
    let file = state_file_path(paths);
    if !file.exists() {
        return Ok(WorklogState::default());
    }

    let raw =
        fs::read_to_string(&file).with_context(|| format!("failed to read {}", file.display()))?;
    let parsed: WorklogState = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse {}", file.display()))?;
    Ok(parsed)
}

pub fn save(paths: &WorklogPaths, state: &WorklogState) -> Result<PathBuf> {
    let file = state_file_path(paths);
    if let Some(parent) = file.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let data = serde_json::to_string_pretty(state)?;
    fs::write(&file, format!("{data}\n"))
        .with_context(|| format!("failed to write {}", file.display()))?;
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn paths_under(root: &Path) -> WorklogPaths {
        WorklogPaths {
            worklog_home: root.to_path_buf(),
            vault_dir: root.join("vault"),
            transcripts_dir: root.join("vault/talk"),
            notes_dir: root.join("vault/Daily"),
            state_dir: root.join("state"),
            logs_dir: root.join("logs"),
        }
    }

    #[test]
    fn missing_file_loads_default() {
        let dir = tempfile::tempdir().expect("tempdir");
        let state = load(&paths_under(dir.path())).expect("load");
        assert_eq!(state, WorklogState::default());
    }

    #[test]
    fn saved_state_loads_back() {
        let dir = tempfile::tempdir().expect("tempdir");
        let paths = paths_under(dir.path());
        let state = WorklogState {
            last_run_date: NaiveDate::from_ymd_opt(2025, 3, 2),
            last_log_date: NaiveDate::from_ymd_opt(2025, 3, 1),
            last_note_path: Some("Daily/2025-03-02.md".to_string()),
            ..WorklogState::default()
        };
        let file = save(&paths, &state).expect("save");
        assert!(file.ends_with("state/worklog_state.json"));
        let raw = fs::read_to_string(&file).expect("read");
        assert!(raw.contains("\"last_run_date\": \"2025-03-02\""));
        assert_eq!(load(&paths).expect("load"), state);
    }
}
