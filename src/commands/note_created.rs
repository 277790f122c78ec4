use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::commands::{CommandReport, day_before, note_store, summarize_day};
use crate::digest::config::load_config;
use crate::digest::paths::resolve_paths;

#[derive(Debug, Clone)]
pub struct NoteCreatedOptions {
    pub path: PathBuf,
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    Ok(std::env::current_dir()?.join(path))
}

/// Hook for a freshly created daily note: summarizes the day before the note's date.
pub fn run(opts: &NoteCreatedOptions) -> Result<CommandReport> {
    let paths = resolve_paths()?;
    let cfg = load_config(&paths.worklog_home)?;
    let mut report = CommandReport::new("note-created");

    let mut store = note_store(&paths, &cfg);
    store.dir = absolute(&store.dir)?;
    let candidate = absolute(&opts.path)?;
    let Some(note_date) = store.note_date_from_path(&candidate) else {
        report.detail(format!(
            "ignored: {} is not a daily note under {}",
            opts.path.display(),
            store.dir.display()
        ));
        return Ok(report);
    };

    report.detail(format!("note_date={note_date}"));
    summarize_day(&paths, &cfg, day_before(note_date)?, true, &mut report)?;
    Ok(report)
}
