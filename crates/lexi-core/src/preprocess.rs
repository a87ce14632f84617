use unicode_normalization::UnicodeNormalization;

/// Characters stripped from both ends of a captured word
const EDGE_PUNCTUATION: &[char] = &[
    '.', ',', ';', ':', '!', '?', '"', '\'', '`', '(', ')', '[', ']', '{', '}', '<', '>', '/',
    '\\', '|', '*', '_', '~', '-', '–', '—', '…', '«', '»', '‹', '›', '“', '”', '‘', '’', '„',
    '‚', '¡', '¿', '。', '、', '，', '．', '！', '？', '：', '；', '「', '」', '『', '』', '（',
    '）', '【', '】', '〈', '〉', '《', '》', '〔', '〕', '・', '·', '～',
];

/// Canonical lookup key: trimmed, NFC-composed, lowercased.
///
/// Every key stored in the dictionary or fed to the Bloom filter goes through
/// this function.
pub fn normalize_word(text: &str) -> String {
    text.trim().nfc().collect::<String>().to_lowercase()
}

/// Strip surrounding punctuation and whitespace from a word captured out of
/// running text. Apostrophes and hyphens inside the word survive.
pub fn clean_word(raw: &str) -> String {
    raw.trim_matches(|c: char| c.is_whitespace() || EDGE_PUNCTUATION.contains(&c))
        .to_string()
}

/// True if `text` contains a CJK ideograph
pub fn contains_cjk(text: &str) -> bool {
    text.chars().any(|c| {
        matches!(c,
            '\u{3400}'..='\u{4DBF}'
            | '\u{4E00}'..='\u{9FFF}'
            | '\u{F900}'..='\u{FAFF}'
            | '\u{20000}'..='\u{2A6DF}'
            | '\u{2A700}'..='\u{2EBEF}'
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_lowercases_and_trims() {
        assert_eq!(normalize_word("  CAT\t"), "cat");
        assert_eq!(normalize_word("Äpfel"), "äpfel");
        // decomposed e + combining acute
        assert_eq!(normalize_word("Cafe\u{301}"), "café");
    }

    #[test]
    fn clean_strips_edges_only() {
        assert_eq!(clean_word("\"don't!\""), "don't");
        assert_eq!(clean_word("(well-known),"), "well-known");
        assert_eq!(clean_word("「猫」。"), "猫");
        assert_eq!(clean_word("«¿qué?»"), "qué");
        assert_eq!(clean_word("...  "), "");
    }

    #[test]
    fn detects_cjk() {
        assert!(contains_cjk("學校"));
        assert!(contains_cjk("a猫"));
        assert!(!contains_cjk("학교"));
        assert!(!contains_cjk("school"));
    }
}
