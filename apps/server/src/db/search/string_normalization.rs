use unicode_normalization::UnicodeNormalization;

/// Canonicalize a free-text search term before it reaches a store:
/// - NFC composition, so decomposed accents match the stored composed form
/// - leading/trailing whitespace removed, inner runs collapsed to one space
///
/// Case is preserved; stores compare case-insensitively.
pub fn normalize_search_text(input: &str) -> String {
    let composed: String = input.nfc().collect();
    composed.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Lowercased form used for in-process substring comparison.
pub fn casefold(input: &str) -> String {
    input.nfc().flat_map(|c| c.to_lowercase()).collect()
}

/// Escape SQL LIKE meta-characters so user input is treated literally.
pub fn escape_like_pattern(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' | '%' | '_' => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}
