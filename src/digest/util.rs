use anyhow::Result;
use std::time::{SystemTime, UNIX_EPOCH};

/// Return the current Unix epoch in seconds.
pub fn now_epoch_secs() -> Result<u64> {
    Ok(SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs())
}

/// Truncate `input` to at most `max_chars` Unicode characters, stripping
/// control characters and appending `…` when truncated.
pub fn truncate_with_ellipsis(input: &str, max_chars: usize) -> String {
    let clean: String = input.chars().filter(|c| !c.is_control()).collect();
    if clean.chars().count() > max_chars {
        let mut s: String = clean.chars().take(max_chars).collect();
        s.push('…');
        s
    } else {
        clean
    }
}

/// Character count of the transcript once Markdown heading lines are removed.
/// Used to decide whether a day has anything worth summarizing.
pub fn content_chars_without_headings(text: &str) -> usize {
    text.lines()
        .filter(|line| !line.starts_with('#'))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .chars()
        .count()
}

#[cfg(test)]
mod tests {
    use super::{content_chars_without_headings, truncate_with_ellipsis};

    #[test]
    fn truncate_appends_ellipsis_and_drops_control_chars() {
        assert_eq!(truncate_with_ellipsis("abc\u{7}def", 3), "abc…");
        assert_eq!(truncate_with_ellipsis("short", 10), "short");
    }

    #[test]
    fn heading_only_transcripts_have_no_content() {
        assert_eq!(content_chars_without_headings("# 2026-01-22\n## /dev app\n\n"), 0);
        assert_eq!(content_chars_without_headings("## /dev app\nhello"), 5);
    }
}
