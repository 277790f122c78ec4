use regex::{Captures, Regex};
use std::sync::OnceLock;

/// Known reply tags and the Markdown heading each becomes. An empty heading
/// inlines the tag's content. Evaluated top to bottom.
const TAG_HEADINGS: [(&str, &str); 23] = [
    ("type", ""),
    ("request", "#### リクエスト"),
    ("title", "#### タイトル"),
    ("change", "#### 変更種別"),
    ("description", ""),
    ("summary", ""),
    ("investigated", "**🔍 調査内容**"),
    ("learned", "**📚 学んだこと**"),
    ("completed", "**🔧 完了した作業**"),
    ("next_steps", "**⏳ 残タスク**"),
    ("notes", "**📝 備考**"),
    ("analysis", "**📊 分析**"),
    ("metrics", "**📈 メトリクス**"),
    ("files_modified", "**📁 変更ファイル**"),
    ("files_updated", "**📁 更新ファイル**"),
    ("files", "**📁 関連ファイル**"),
    ("tags", "**🏷️ タグ**"),
    ("added", "**🆕 追加した機能**"),
    ("fixed", "**🔧 修正・改善**"),
    ("removed", "**🗑️ 削除**"),
    ("changed", "**✏️ 変更**"),
    ("details", "**📋 詳細**"),
    ("impact", "**💥 影響**"),
];

struct Patterns {
    xml_fence: Regex,
    any_fence: Regex,
    summary_wrapper: Regex,
    tags: Vec<(Regex, &'static str)>,
    leftover_tag: Regex,
    blank_run: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        xml_fence: Regex::new(r"(?i)```xml\s*").expect("xml fence pattern is valid"),
        any_fence: Regex::new(r"```\s*").expect("fence pattern is valid"),
        summary_wrapper: Regex::new(r"(?s)<summary>(.*?)</summary>")
            .expect("summary pattern is valid"),
        tags: TAG_HEADINGS
            .iter()
            .map(|(tag, heading)| {
                let tag = regex::escape(tag);
                let re = Regex::new(&format!(r"(?s)<{tag}>(.*?)</{tag}>"))
                    .expect("tag pattern is valid");
                (re, *heading)
            })
            .collect(),
        leftover_tag: Regex::new(r"<[^>]+>").expect("leftover tag pattern is valid"),
        blank_run: Regex::new(r"\n(?:[ \t]*\n){2,}").expect("blank run pattern is valid"),
    })
}

fn bulletize(inner: &str) -> String {
    inner
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            if line.starts_with('-') {
                line.to_string()
            } else {
                format!("- {line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_tag(inner: &str, heading: &str) -> String {
    let trimmed = inner.trim();
    if heading.is_empty() {
        return trimmed.to_string();
    }
    format!("{heading}\n{}", bulletize(trimmed))
}

/// Turn a raw model reply into canonical Markdown: fences and markup removed,
/// known tags rewritten as headed bullet lists, blank runs collapsed.
/// Idempotent: the output contains no tags, so a second pass changes nothing.
pub fn normalize_response(raw: &str) -> String {
    let p = patterns();

    let text = p.xml_fence.replace_all(raw, "");
    let mut text = p.any_fence.replace_all(&text, "").into_owned();

    if let Some(inner) = p.summary_wrapper.captures(&text).and_then(|c| c.get(1)) {
        text = inner.as_str().to_string();
    }

    for (re, heading) in &p.tags {
        text = re
            .replace_all(&text, |caps: &Captures| {
                render_tag(caps.get(1).map_or("", |m| m.as_str()), heading)
            })
            .into_owned();
    }

    // Removing a tag can join backticks into a new fence and vice versa.
    loop {
        let stripped = p.leftover_tag.replace_all(&text, "");
        let stripped = p.any_fence.replace_all(&stripped, "").into_owned();
        if stripped == text {
            break;
        }
        text = stripped;
    }
    let text = p.blank_run.replace_all(&text, "\n\n");
    text.trim().to_string()
}
