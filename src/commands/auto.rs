use anyhow::Result;

use crate::commands::{CommandReport, day_before, summarize_day, today};
use crate::digest::config::load_config;
use crate::digest::paths::resolve_paths;
use crate::digest::state;

/// Startup check: at most one automatic run per calendar day, always for yesterday.
pub fn run() -> Result<CommandReport> {
    let paths = resolve_paths()?;
    let cfg = load_config(&paths.worklog_home)?;
    let mut report = CommandReport::new("auto");

    let today = today();
    let current = state::load(&paths)?;
    if current.last_run_date == Some(today) {
        report.detail(format!("skipped: already ran on {today}"));
        return Ok(report);
    }

    summarize_day(&paths, &cfg, day_before(today)?, true, &mut report)?;
    Ok(report)
}
