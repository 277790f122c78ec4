use anyhow::{Context, Result, anyhow};
use chrono::{Days, NaiveDate};
use std::fmt::Write as _;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Reads the raw transcript recorded for one calendar day.
pub trait TranscriptSource {
    fn read(&self, date: NaiveDate) -> Result<Option<String>>;
}

/// Writes dated summaries into the daily note for the following day.
pub trait SummarySink {
    fn has_summary(&self, log_date: NaiveDate) -> Result<bool>;
    /// Returns where the summary landed.
    fn insert_summary(&self, log_date: NaiveDate, summary: &str) -> Result<PathBuf>;
}

pub fn summary_heading(log_date: NaiveDate) -> String {
    format!("### {} 作業サマリー", log_date.format("%Y-%m-%d"))
}

pub fn note_date_for(log_date: NaiveDate) -> Result<NaiveDate> {
    log_date
        .checked_add_days(Days::new(1))
        .ok_or_else(|| anyhow!("no calendar day follows {log_date}"))
}

fn format_file_name(date: NaiveDate, format: &str) -> Result<String> {
    let mut out = String::new();
    write!(out, "{}", date.format(format))
        .map_err(|_| anyhow!("invalid date format `{format}`"))?;
    Ok(out)
}

fn read_optional(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err).with_context(|| format!("failed to read {}", path.display())),
    }
}

/// Places `section` right after the first line equal to `heading`, or appends
/// the heading and section when the note has no such line.
pub fn insert_under_heading(content: &str, heading: &str, section: &str) -> String {
    let mut offset = 0usize;
    for line in content.split_inclusive('\n') {
        let bare = line.strip_suffix('\n').unwrap_or(line);
        let (bare, crlf) = match bare.strip_suffix('\r') {
            Some(stripped) => (stripped, true),
            None => (bare, false),
        };
        if bare == heading {
            let at = offset + bare.len();
            let section = if crlf {
                section.replace('\n', "\r\n")
            } else {
                section.to_string()
            };
            return format!("{}{section}{}", &content[..at], &content[at..]);
        }
        offset += line.len();
    }

    if content.trim().is_empty() {
        format!("{heading}{section}")
    } else {
        format!("{content}\n\n{heading}{section}")
    }
}

#[derive(Debug, Clone)]
pub struct FsTranscriptSource {
    pub dir: PathBuf,
    pub file_format: String,
}

impl FsTranscriptSource {
    pub fn path_for(&self, date: NaiveDate) -> Result<PathBuf> {
        Ok(self.dir.join(format_file_name(date, &self.file_format)?))
    }
}

impl TranscriptSource for FsTranscriptSource {
    fn read(&self, date: NaiveDate) -> Result<Option<String>> {
        read_optional(&self.path_for(date)?)
    }
}

#[derive(Debug, Clone)]
pub struct FsNoteStore {
    pub dir: PathBuf,
    pub file_format: String,
    pub target_heading: String,
}

impl FsNoteStore {
    pub fn note_path(&self, log_date: NaiveDate) -> Result<PathBuf> {
        let note_date = note_date_for(log_date)?;
        Ok(self.dir.join(format_file_name(note_date, &self.file_format)?))
    }

    /// Parses `<notes dir>/YYYY-MM-DD.md` back into the note's own date.
    pub fn note_date_from_path(&self, path: &Path) -> Option<NaiveDate> {
        if path.parent()? != self.dir.as_path() {
            return None;
        }
        let name = path.file_name()?.to_str()?;
        let stem = name.strip_suffix(".md")?;
        let shape_ok = stem.len() == 10
            && stem.char_indices().all(|(i, c)| match i {
                4 | 7 => c == '-',
                _ => c.is_ascii_digit(),
            });
        if !shape_ok {
            return None;
        }
        NaiveDate::parse_from_str(stem, "%Y-%m-%d").ok()
    }
}

impl SummarySink for FsNoteStore {
    fn has_summary(&self, log_date: NaiveDate) -> Result<bool> {
        let path = self.note_path(log_date)?;
        Ok(read_optional(&path)?
            .is_some_and(|content| content.contains(&summary_heading(log_date))))
    }

    fn insert_summary(&self, log_date: NaiveDate, summary: &str) -> Result<PathBuf> {
        let path = self.note_path(log_date)?;
        let content = read_optional(&path)?.unwrap_or_default();
        let section = format!("\n{}\n\n{summary}\n", summary_heading(log_date));
        let updated = insert_under_heading(&content, &self.target_heading, &section);

        fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create {}", self.dir.display()))?;
        fs::write(&path, updated)
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(path)
    }
}
