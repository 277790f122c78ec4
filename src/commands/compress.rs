use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

use crate::commands::CommandReport;
use crate::digest::chunk::split_chunks;
use crate::digest::compress::compress_with_stats;
use crate::digest::config::load_config;
use crate::digest::paths::resolve_paths;

#[derive(Debug, Clone)]
pub struct CompressOptions {
    pub file: PathBuf,
    pub stats_only: bool,
}

/// Compressed text plus the report; the caller prints the text to stdout.
pub fn run(opts: &CompressOptions) -> Result<(CommandReport, Option<String>)> {
    let paths = resolve_paths()?;
    let cfg = load_config(&paths.worklog_home)?;
    let mut report = CommandReport::new("compress");

    let raw = fs::read_to_string(&opts.file)
        .with_context(|| format!("failed to read {}", opts.file.display()))?;
    let (compressed, stats) = compress_with_stats(&raw);
    let chunks = split_chunks(&compressed, cfg.pipeline.chunk_chars).len();

    report.detail(format!("file={}", opts.file.display()));
    report.detail(format!("original_chars={}", stats.original_chars));
    report.detail(format!("compressed_chars={}", stats.compressed_chars));
    report.detail(format!("reduction_percent={:.1}", stats.reduction_percent()));
    report.detail(format!("chunks={chunks}"));

    if opts.stats_only {
        return Ok((report, None));
    }
    Ok((report, Some(compressed)))
}
