/// Split `text` into consecutive slices of at most `max_chars` characters.
///
/// Slicing is purely size-based and counts Unicode scalar values, so a
/// multi-byte character is never cut in half. Text at or below the limit comes
/// back as a single chunk equal to the input.
pub fn split_chunks(text: &str, max_chars: usize) -> Vec<&str> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut start = 0usize;
    let mut count = 0usize;

    for (idx, _) in text.char_indices() {
        if count == max_chars {
            chunks.push(&text[start..idx]);
            start = idx;
            count = 0;
        }
        count += 1;
    }

    if start < text.len() || chunks.is_empty() {
        chunks.push(&text[start..]);
    }
    chunks
}
