use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::commands::{self, CommandReport};
use crate::commands::compress::CompressOptions;
use crate::commands::note_created::NoteCreatedOptions;
use crate::commands::summarize::SummarizeOptions;

#[derive(Parser)]
#[command(
    name = "worklog",
    version,
    about = "Summarize daily AI pair-programming transcripts into a Markdown work report"
)]
struct Cli {
    /// Print the command report as JSON
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Summarize one day's transcript into the next day's note
    Summarize {
        /// Log date (YYYY-MM-DD), defaults to yesterday
        #[arg(long)]
        date: Option<String>,
    },
    /// Startup check: summarize yesterday once per day
    Auto,
    /// Daily-note creation hook: summarize the day before the note
    NoteCreated {
        path: PathBuf,
    },
    /// Print a transcript after rule-based compression
    Compress {
        file: PathBuf,
        /// Only report sizes
        #[arg(long)]
        stats: bool,
    },
    /// Show paths, effective config and last run
    Status,
}

fn print_report(report: &CommandReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    println!("{}: {}", report.command, if report.ok { "ok" } else { "failed" });
    for detail in &report.details {
        println!("  {detail}");
    }
    for issue in &report.issues {
        println!("  issue: {issue}");
    }
    Ok(())
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let report = match cli.command {
        Command::Summarize { date } => commands::summarize::run(&SummarizeOptions { date })?,
        Command::Auto => commands::auto::run()?,
        Command::NoteCreated { path } => {
            commands::note_created::run(&NoteCreatedOptions { path })?
        }
        Command::Compress { file, stats } => {
            let (report, text) = commands::compress::run(&CompressOptions {
                file,
                stats_only: stats,
            })?;
            match text {
                Some(text) if !cli.json => {
                    println!("{text}");
                    return Ok(());
                }
                _ => report,
            }
        }
        Command::Status => commands::status::run()?,
    };

    print_report(&report, cli.json)?;
    if !report.ok {
        bail!("{} reported {} issue(s)", report.command, report.issues.len());
    }
    Ok(())
}
