pub const SYSTEM_PROMPT: &str = "技術作業の記録を専門とするアシスタントです。
AIアシスタントとの対話ログから、プロジェクト別・カテゴリ別に作業内容を整理して抽出してください。

ログの見出し「## /dev プロジェクト名」からプロジェクトを識別できます。
出力はMarkdownのみとし、XMLタグやコードフェンスは使用しないでください。";

const USER_TEMPLATE: &str = "以下の対話ログから、作業内容をプロジェクト別にまとめてください。

## 出力フォーマット（厳守）

#### プロジェクト名

**🆕 追加した機能**
- 新規に実装した機能や追加したファイル

**🔧 修正・改善**
- バグ修正、リファクタリング、パフォーマンス改善

**📝 その他の作業**
- 調査、設定変更、ドキュメント更新など

**⏳ 残タスク**
- 未完了のタスク、次にやるべきこと

## ルール
- プロジェクトが複数ある場合は、プロジェクトごとにセクションを分ける
- 各カテゴリに該当する内容がなければそのカテゴリは省略
- 雑談や軽微なやり取りは除外
- 各項目は簡潔に（1行程度）
- 技術的な内容を優先
- 「次やること」「TODO」「残タスク」などの言及があれば「残タスク」に記載

対話ログ:
{log}

作業サマリー:";

const MERGE_HEADER: &str = "以下は同じ日の作業ログを複数パートに分けて要約したものです。
これらを統合して、1つの作業日報にまとめてください。

## ルール
- 重複を排除して簡潔にまとめる
- プロジェクトごとにセクション分け
- 同じ作業は1つにまとめる
- 日本語のみ、Markdown形式";

pub fn build_chunk_prompt(log_chunk: &str) -> String {
    USER_TEMPLATE.replacen("{log}", log_chunk, 1)
}

pub fn build_merge_prompt(partials: &[String]) -> String {
    let parts = partials
        .iter()
        .enumerate()
        .map(|(idx, summary)| format!("=== Part {} ===\n{}", idx + 1, summary))
        .collect::<Vec<_>>()
        .join("\n\n");
    format!("{MERGE_HEADER}\n\n{parts}\n\n統合した作業日報:")
}
