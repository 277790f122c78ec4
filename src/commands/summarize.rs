use anyhow::{Context, Result};
use chrono::NaiveDate;

use crate::commands::{CommandReport, day_before, summarize_day, today};
use crate::digest::config::load_config;
use crate::digest::paths::resolve_paths;

#[derive(Debug, Clone, Default)]
pub struct SummarizeOptions {
    /// `YYYY-MM-DD`; yesterday when absent.
    pub date: Option<String>,
}

pub fn parse_log_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .with_context(|| format!("invalid date `{raw}`; expected YYYY-MM-DD"))
}

pub fn run(opts: &SummarizeOptions) -> Result<CommandReport> {
    let paths = resolve_paths()?;
    let cfg = load_config(&paths.worklog_home)?;
    let mut report = CommandReport::new("summarize");

    let log_date = match opts.date.as_deref() {
        Some(raw) => parse_log_date(raw)?,
        None => day_before(today())?,
    };
    summarize_day(&paths, &cfg, log_date, false, &mut report)?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::parse_log_date;

    #[test]
    fn log_date_accepts_iso_days_only() {
        assert_eq!(
            parse_log_date(" 2025-03-01 ").expect("valid").to_string(),
            "2025-03-01"
        );
        assert!(parse_log_date("2025/03/01").is_err());
        assert!(parse_log_date("2025-02-30").is_err());
    }
}
