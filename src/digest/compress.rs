use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

pub const CODE_PLACEHOLDER: &str = "[code omitted]";
pub const BLOCK_PLACEHOLDER: &str = "[block omitted]";
pub const LONG_OUTPUT_PLACEHOLDER: &str = "[long output omitted]";

/// Tool and harness payloads that never carry work content worth summarizing.
const KNOWN_BLOCKS: [&str; 7] = [
    "tool_use",
    "tool_result",
    "function_calls",
    "function_results",
    "system-reminder",
    "command-output",
    "local-command-stdout",
];
const ASSISTANT_MARKERS: [&str; 2] = ["**Claude**:", "**Assistant**:"];
const USER_MARKERS: [&str; 2] = ["**ユーザー**:", "**User**:"];
const TURN_KEEP_LINES: usize = 3;
const TURN_MAX_LINES: usize = 5;
const REPEAT_MIN_RUN: usize = 3;
const REPEAT_MAX_LINE_CHARS: usize = 100;
const INDENTED_MAX_CHARS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionStats {
    pub original_chars: usize,
    pub compressed_chars: usize,
}

impl CompressionStats {
    pub fn reduction_percent(&self) -> f64 {
        if self.original_chars == 0 {
            return 0.0;
        }
        (1.0 - self.compressed_chars as f64 / self.original_chars as f64) * 100.0
    }
}

fn fenced_code_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)```[^\n`]*\n.*?```").expect("fenced code pattern is valid"))
}

fn known_block_res() -> &'static [Regex] {
    static RES: OnceLock<Vec<Regex>> = OnceLock::new();
    RES.get_or_init(|| {
        KNOWN_BLOCKS
            .iter()
            .map(|name| {
                let name = regex::escape(name);
                Regex::new(&format!(r"(?s)<{name}(?:\s[^>]*)?>.*?</{name}>"))
                    .expect("known block pattern is valid")
            })
            .collect()
    })
}

fn open_tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"<([A-Za-z][A-Za-z0-9_:-]*)(?:\s[^<>]*)?>").expect("open tag pattern is valid")
    })
}

fn blank_run_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n(?:[ \t]*\n){3,}").expect("blank run pattern is valid"))
}

fn strip_code_blocks(text: &str) -> String {
    fenced_code_re().replace_all(text, CODE_PLACEHOLDER).into_owned()
}

// The regex crate has no backreferences, so generic `<name>...</name>` pairs
// are matched by locating the opening tag and searching for its closer.
fn strip_generic_blocks(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0usize;
    // Next known closer per tag name; `None` once a name has no closer left.
    let mut closers: HashMap<String, Option<usize>> = HashMap::new();
    while let Some(caps) = open_tag_re().captures_at(text, cursor) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            break;
        };
        let closer = format!("</{}>", name.as_str());
        let found = match closers.get(name.as_str()) {
            Some(None) => None,
            Some(Some(pos)) if *pos >= whole.end() => Some(*pos),
            _ => {
                let pos = text[whole.end()..]
                    .find(&closer)
                    .map(|offset| whole.end() + offset);
                closers.insert(name.as_str().to_string(), pos);
                pos
            }
        };
        match found {
            Some(pos) => {
                out.push_str(&text[cursor..whole.start()]);
                out.push_str(BLOCK_PLACEHOLDER);
                cursor = pos + closer.len();
            }
            None => {
                out.push_str(&text[cursor..whole.end()]);
                cursor = whole.end();
            }
        }
    }
    out.push_str(&text[cursor..]);
    out
}

fn strip_markup_blocks(text: &str) -> String {
    let mut current = text.to_string();
    for re in known_block_res() {
        current = re.replace_all(&current, BLOCK_PLACEHOLDER).into_owned();
    }
    strip_generic_blocks(&current)
}

fn is_assistant_marker(line: &str) -> bool {
    ASSISTANT_MARKERS.iter().any(|m| line.starts_with(m))
}

fn ends_turn(line: &str) -> bool {
    USER_MARKERS.iter().any(|m| line.starts_with(m)) || line.starts_with("## ")
}

fn flush_turn<'a>(turn: &mut Vec<&'a str>, out: &mut Vec<String>) {
    if turn.is_empty() {
        return;
    }
    let mut trailing_blank = 0usize;
    while turn.len() > trailing_blank && turn[turn.len() - 1 - trailing_blank].trim().is_empty() {
        trailing_blank += 1;
    }
    let body_len = turn.len() - trailing_blank;

    if body_len > TURN_MAX_LINES {
        out.extend(turn[..TURN_KEEP_LINES].iter().map(|l| l.to_string()));
        out.push(format!("[... {} lines omitted]", body_len - TURN_KEEP_LINES));
    } else {
        out.extend(turn[..body_len].iter().map(|l| l.to_string()));
    }
    out.extend(turn[body_len..].iter().map(|l| l.to_string()));
    turn.clear();
}

fn compress_assistant_turns(text: &str) -> String {
    let mut out = Vec::new();
    let mut turn: Vec<&str> = Vec::new();
    let mut in_turn = false;

    for line in text.split('\n') {
        if is_assistant_marker(line) {
            flush_turn(&mut turn, &mut out);
            turn.push(line);
            in_turn = true;
        } else if in_turn && ends_turn(line) {
            flush_turn(&mut turn, &mut out);
            in_turn = false;
            out.push(line.to_string());
        } else if in_turn {
            turn.push(line);
        } else {
            out.push(line.to_string());
        }
    }
    flush_turn(&mut turn, &mut out);
    out.join("\n")
}

fn collapse_blank_runs(text: &str) -> String {
    blank_run_re().replace_all(text, "\n\n").into_owned()
}

fn is_horizontal_rule(line: &str) -> bool {
    let compact: Vec<char> = line.chars().filter(|c| !c.is_whitespace()).collect();
    let Some(&first) = compact.first() else {
        return false;
    };
    compact.len() >= 3 && matches!(first, '-' | '*' | '_') && compact.iter().all(|c| *c == first)
}

fn collapse_horizontal_rules(text: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    for line in text.split('\n') {
        if !is_horizontal_rule(line) {
            out.push(line);
            continue;
        }
        let mut blanks = 0usize;
        while out.len() > blanks && out[out.len() - 1 - blanks].trim().is_empty() {
            blanks += 1;
        }
        let previous = out.len().checked_sub(blanks + 1).map(|idx| out[idx]);
        if previous.is_some_and(is_horizontal_rule) {
            out.truncate(out.len() - blanks);
        } else {
            out.push(line);
        }
    }
    out.join("\n")
}

fn collapse_repeated_lines(text: &str) -> String {
    let lines: Vec<&str> = text.split('\n').collect();
    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    let mut idx = 0usize;
    while idx < lines.len() {
        let line = lines[idx];
        let mut run = 1usize;
        while idx + run < lines.len() && lines[idx + run] == line {
            run += 1;
        }
        let collapsible = run >= REPEAT_MIN_RUN
            && !line.trim().is_empty()
            && line.chars().count() < REPEAT_MAX_LINE_CHARS;
        if collapsible {
            out.push(line.to_string());
            out.push(line.to_string());
            out.push(format!("[... repeated {} more times]", run - 2));
        } else {
            out.extend(std::iter::repeat_n(line.to_string(), run));
        }
        idx += run;
    }
    out.join("\n")
}

fn is_indented(line: &str) -> bool {
    line.starts_with("    ") || line.starts_with('\t')
}

fn truncate_indented_lines(text: &str) -> String {
    text.split('\n')
        .map(|line| {
            if is_indented(line) && line.chars().count() > INDENTED_MAX_CHARS {
                let head: String = line.chars().take(INDENTED_MAX_CHARS).collect();
                format!("{head} {LONG_OUTPUT_PLACEHOLDER}")
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Shrink a raw transcript with fixed pattern rules. Rule order is significant:
/// later rules see the output of earlier ones.
pub fn compress(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }
    let text = strip_code_blocks(raw);
    let text = strip_markup_blocks(&text);
    let text = compress_assistant_turns(&text);
    let text = collapse_blank_runs(&text);
    let text = collapse_horizontal_rules(&text);
    let text = collapse_repeated_lines(&text);
    let text = truncate_indented_lines(&text);
    text.trim().to_string()
}

pub fn compress_with_stats(raw: &str) -> (String, CompressionStats) {
    let compressed = compress(raw);
    let stats = CompressionStats {
        original_chars: raw.chars().count(),
        compressed_chars: compressed.chars().count(),
    };
    (compressed, stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_yields_empty_output() {
        assert_eq!(compress(""), "");
    }

    #[test]
    fn fenced_code_blocks_become_placeholder() {
        let raw = "before\n```rust\nfn main() {}\nlet x = 1;\n```\nafter";
        assert_eq!(compress(raw), format!("before\n{CODE_PLACEHOLDER}\nafter"));
    }

    #[test]
    fn known_and_generic_blocks_are_omitted() {
        let raw = "start\n<tool_result id=\"7\">\nhuge payload\n</tool_result>\nmid\n<custom>\nstuff\n</custom>\nend";
        let got = compress(raw);
        assert_eq!(
            got,
            format!("start\n{BLOCK_PLACEHOLDER}\nmid\n{BLOCK_PLACEHOLDER}\nend")
        );
    }

    #[test]
    fn unclosed_tags_are_left_alone() {
        let raw = "compare a <b and c> d";
        assert_eq!(compress(raw), raw);
    }

    #[test]
    fn unmatched_generics_do_not_hide_later_blocks() {
        let raw = "Option<String> then <note>kept</note> and Vec<String> again";
        assert_eq!(
            compress(raw),
            format!("Option<String> then {BLOCK_PLACEHOLDER} and Vec<String> again")
        );
    }

    #[test]
    fn many_unclosed_generics_compress_in_linear_time() {
        let line = "Vec<u8> and Option<String>";
        let raw = vec![line; 20_000].join("\n");
        let started = std::time::Instant::now();
        let got = compress(&raw);
        assert!(started.elapsed() < std::time::Duration::from_secs(10));
        assert_eq!(got, format!("{line}\n{line}\n[... repeated 19998 more times]"));
    }

    #[test]
    fn long_assistant_turns_keep_first_three_lines() {
        let raw = "**ユーザー**: fix it\n**Claude**: sure\nline 2\nline 3\nline 4\nline 5\nline 6\n**ユーザー**: thanks";
        let got = compress(raw);
        assert_eq!(
            got,
            "**ユーザー**: fix it\n**Claude**: sure\nline 2\nline 3\n[... 3 lines omitted]\n**ユーザー**: thanks"
        );
    }

    #[test]
    fn short_assistant_turns_are_untouched() {
        let raw = "**Claude**: one\ntwo\nthree\n\n\n## /dev next";
        assert_eq!(compress(raw), "**Claude**: one\ntwo\nthree\n\n\n## /dev next");
    }

    #[test]
    fn assistant_turn_ends_at_section_heading() {
        let raw = "**Claude**: a\nb\nc\nd\ne\nf\n## /dev other\nkept";
        let got = compress(raw);
        assert!(got.contains("[... 3 lines omitted]\n## /dev other\nkept"));
    }

    #[test]
    fn blank_runs_collapse_to_one_blank_line() {
        assert_eq!(collapse_blank_runs("a\n\n\n\nb"), "a\n\nb");
        assert_eq!(collapse_blank_runs("a\n\n \n\t\n\nb"), "a\n\nb");
        assert_eq!(collapse_blank_runs("a\n\n\nb"), "a\n\n\nb");
    }

    #[test]
    fn consecutive_horizontal_rules_collapse() {
        assert_eq!(collapse_horizontal_rules("a\n---\n---\nb"), "a\n---\nb");
        assert_eq!(collapse_horizontal_rules("a\n---\n\n***\nb"), "a\n---\nb");
        assert_eq!(collapse_horizontal_rules("a\n---\nb\n---\nc"), "a\n---\nb\n---\nc");
    }

    #[test]
    fn repeated_short_lines_keep_first_two() {
        let raw = "error: timeout\nerror: timeout\nerror: timeout\nerror: timeout\nok";
        assert_eq!(
            collapse_repeated_lines(raw),
            "error: timeout\nerror: timeout\n[... repeated 2 more times]\nok"
        );
    }

    #[test]
    fn repeated_long_lines_are_kept() {
        let long = "x".repeat(120);
        let raw = format!("{long}\n{long}\n{long}");
        assert_eq!(collapse_repeated_lines(&raw), raw);
    }

    #[test]
    fn long_indented_lines_are_truncated_with_indent() {
        let line = format!("    {}", "y".repeat(400));
        let got = truncate_indented_lines(&line);
        assert!(got.starts_with("    yyy"));
        assert!(got.ends_with(LONG_OUTPUT_PLACEHOLDER));
        assert_eq!(got.chars().count(), INDENTED_MAX_CHARS + 1 + LONG_OUTPUT_PLACEHOLDER.chars().count());
        assert_eq!(truncate_indented_lines(&got), got);
    }

    #[test]
    fn unindented_long_lines_are_untouched() {
        let line = "z".repeat(400);
        assert_eq!(truncate_indented_lines(&line), line);
    }

    #[test]
    fn collapse_rules_are_idempotent() {
        let raw = "a\n\n\n\n\n---\n---\nb\nspam\nspam\nspam\nspam\n\n\n\n\nc";
        let once = collapse_repeated_lines(&collapse_horizontal_rules(&collapse_blank_runs(raw)));
        let twice =
            collapse_repeated_lines(&collapse_horizontal_rules(&collapse_blank_runs(&once)));
        assert_eq!(once, twice);
    }

    #[test]
    fn compress_is_stable_on_its_own_output() {
        let raw = "## /dev app\n**Claude**: x\n1\n2\n3\n4\n5\n```sh\nls\n```\n\n\n\n\nspam\nspam\nspam\n<tool_use>\nx\n</tool_use>";
        let once = compress(raw);
        assert_eq!(compress(&once), once);
    }

    #[test]
    fn stats_report_reduction() {
        let raw = format!("```\n{}\n```", "code line\n".repeat(100));
        let (out, stats) = compress_with_stats(&raw);
        assert_eq!(out, CODE_PLACEHOLDER);
        assert!(stats.compressed_chars < stats.original_chars);
        assert!(stats.reduction_percent() > 90.0);
    }

    #[test]
    fn multibyte_text_survives_truncation() {
        let line = format!("\t{}", "日本語".repeat(100));
        let got = compress(&line);
        assert!(got.ends_with(LONG_OUTPUT_PLACEHOLDER));
    }
}
