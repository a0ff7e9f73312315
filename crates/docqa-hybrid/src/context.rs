use docqa_core::types::Chunk;

/// Numbered source block handed to the answer generator:
/// `[i] text` followed by a `Source: path Page: n` line, blocks separated by
/// a blank line.
pub fn format_context(chunks: &[Chunk]) -> String {
    chunks
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let page = c.metadata.page_number.map(|p| p.to_string()).unwrap_or_default();
            format!("[{}] {}\nSource: {} Page: {}", i + 1, c.text, c.metadata.source_path, page)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
