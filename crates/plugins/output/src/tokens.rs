//! Cheap token count estimation.
//!
//! This is a word-length heuristic, not a tokenizer. It is only used for
//! observability, so the bucket boundaries matter more than accuracy.

/// Estimate how many LLM tokens `text` will take.
///
/// Each whitespace-separated word counts 1 token up to 4 characters,
/// 2 tokens up to 8 characters, and one token per 4 characters beyond that.
pub fn estimate_tokens(text: &str) -> usize {
    text.split_whitespace().map(word_tokens).sum()
}

fn word_tokens(word: &str) -> usize {
    match word.chars().count() {
        0..=4 => 1,
        5..=8 => 2,
        len => len.div_ceil(4),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_tokens() {
        let cases = [
            ("", 0),
            ("test", 1),
            ("this is a test", 4),
            ("medium length", 4),
            ("internationalization standardization", 9),
            ("this is a complicated test with internationalization", 13),
            ("this   is  a   test", 4),
            ("  \t\n ", 0),
        ];

        for (input, expected) in cases {
            assert_eq!(estimate_tokens(input), expected, "input: {:?}", input);
        }
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        // 4 characters, 8 bytes
        assert_eq!(estimate_tokens("éééé"), 1);
        // 9 characters
        assert_eq!(estimate_tokens("ééééééééé"), 3);
    }

    #[test]
    fn test_monotonic_when_adding_words() {
        let mut text = String::new();
        let mut previous = 0;
        for word in ["a", "medium", "internationalization", "x", "standardization"] {
            if !text.is_empty() {
                text.push(' ');
            }
            text.push_str(word);
            let current = estimate_tokens(&text);
            assert!(current >= previous);
            previous = current;
        }
    }
}
