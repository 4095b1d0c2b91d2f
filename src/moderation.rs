//! Profanity masking for user-submitted text.
//!
//! Matching is case-insensitive and whole-word: a flagged word embedded inside
//! a longer word is left alone. Masked words keep their first and last
//! character with asterisks in between, so readers can still tell something
//! was there. Masking is applied to post and comment content before it is
//! persisted; the masked form is what every reader sees.

use regex::Regex;
use std::sync::OnceLock;

/// Words that get masked wherever they appear as whole words.
const BADWORDS: [&str; 13] = [
    "anjing", "bangsat", "kontol", "memek", "babi", "tolol", "goblok", "fuck", "shit", "bitch",
    "asshole", "dick", "bastard",
];

static BADWORD_PATTERN: OnceLock<Regex> = OnceLock::new();

fn badword_pattern() -> &'static Regex {
    BADWORD_PATTERN.get_or_init(|| {
        let pattern = format!(r"(?i)\b({})\b", BADWORDS.join("|"));
        Regex::new(&pattern).expect("badword pattern is valid")
    })
}

/// Masks a single word, preserving its first and last character.
///
/// Words of two characters or fewer are replaced entirely with asterisks.
fn mask_word(word: &str) -> String {
    let chars: Vec<char> = word.chars().collect();
    if chars.len() <= 2 {
        return "*".repeat(chars.len());
    }

    let mut masked = String::with_capacity(word.len());
    masked.push(chars[0]);
    for _ in 1..chars.len() - 1 {
        masked.push('*');
    }
    masked.push(chars[chars.len() - 1]);
    masked
}

/// Replaces every whole-word profanity match in `text` with its masked form.
///
/// Text without matches is returned unchanged. The operation is idempotent:
/// masked output contains no flagged words, so masking it again is a no-op.
pub fn mask_profanity(text: &str) -> String {
    badword_pattern()
        .replace_all(text, |caps: &regex::Captures| mask_word(&caps[0]))
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text_unchanged() {
        let text = "hari ini aku senang sekali";
        assert_eq!(mask_profanity(text), text);
    }

    #[test]
    fn test_single_word_masked() {
        assert_eq!(mask_profanity("anjing"), "a****g");
    }

    #[test]
    fn test_word_in_sentence_masked() {
        assert_eq!(mask_profanity("dasar anjing kamu"), "dasar a****g kamu");
    }

    #[test]
    fn test_case_insensitive_preserves_original_chars() {
        assert_eq!(mask_profanity("ANJING"), "A****G");
        assert_eq!(mask_profanity("AnJiNg"), "A****g");
    }

    #[test]
    fn test_substring_not_masked() {
        // No word boundary inside a longer token.
        assert_eq!(mask_profanity("anjinganjing"), "anjinganjing");
        assert_eq!(mask_profanity("berbabi-buta"), "berbabi-buta");
    }

    #[test]
    fn test_punctuation_counts_as_boundary() {
        assert_eq!(mask_profanity("anjing!"), "a****g!");
        assert_eq!(mask_profanity("(bangsat)"), "(b*****t)");
        assert_eq!(mask_profanity("babi,tolol"), "b**i,t***l");
    }

    #[test]
    fn test_multiple_matches() {
        assert_eq!(
            mask_profanity("goblok dan tolol sekaligus"),
            "g****k dan t***l sekaligus"
        );
    }

    #[test]
    fn test_english_words_masked() {
        assert_eq!(mask_profanity("what the fuck"), "what the f**k");
        assert_eq!(mask_profanity("holy shit"), "holy s**t");
    }

    #[test]
    fn test_idempotent() {
        let once = mask_profanity("dasar anjing bangsat");
        let twice = mask_profanity(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_mask_word_short_forms() {
        assert_eq!(mask_word("ab"), "**");
        assert_eq!(mask_word("a"), "*");
        assert_eq!(mask_word(""), "");
        assert_eq!(mask_word("abc"), "a*c");
    }
}
