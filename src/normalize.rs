//! Text canonicalization shared by every stage of the engine.
//!
//! Labels, profile values and option captions are all compared through
//! [`normalize`], so the rules here decide what "the same text" means for
//! the classifier and the option matcher alike.

use std::collections::HashSet;

use lazy_static::lazy_static;

lazy_static! {
    /// Words that carry no signal about which profile attribute a label asks for.
    static ref STOP_WORDS: HashSet<&'static str> = [
        "a", "an", "the", "of", "in", "your", "you", "are", "is", "for", "to",
        "please", "enter", "provide", "and", "or", "do", "what", "which", "my",
        "if", "any", "on", "at", "with", "as", "be", "this", "by",
    ]
    .into_iter()
    .collect();
}

/// Characters that separate words instead of being stripped outright.
fn is_separator(ch: char) -> bool {
    ch.is_whitespace() || matches!(ch, '/' | '_' | '|' | ',' | ';' | '&' | '+')
}

/// Canonicalizes text for comparison.
///
/// Lowercases the input, keeps only `[a-z0-9]`, turns word separators into
/// single spaces and trims the result. Punctuation inside a word is dropped,
/// so `"E-mail"` and `"email"` normalize identically while `"Mobile/WhatsApp"`
/// stays two words.
///
/// The function is idempotent: its output contains only `[a-z0-9 ]` with
/// single interior spaces, which it maps to itself.
///
/// # Example
/// ```
/// use formfill::normalize;
///
/// assert_eq!(normalize("  Father's Name* "), "fathers name");
/// assert_eq!(normalize(&normalize("D.O.B")), normalize("D.O.B"));
/// ```
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;

    for ch in text.chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.push(ch);
        } else if is_separator(ch) {
            pending_space = true;
        }
    }

    out
}

/// Same as [`normalize`] but accepts a missing value, which maps to `""`.
pub fn normalize_opt(text: Option<&str>) -> String {
    text.map(normalize).unwrap_or_default()
}

/// Splits text into normalized words, dropping stop words.
///
/// This is the tokenizer used by the classifier for both training labels and
/// queries.
pub fn tokenize(text: &str) -> Vec<String> {
    normalize(text)
        .split(' ')
        .filter(|w| !w.is_empty() && !STOP_WORDS.contains(w))
        .map(str::to_string)
        .collect()
}

/// Normalized words of at least `min_len` characters, without stop words.
pub fn significant_words(text: &str, min_len: usize) -> Vec<String> {
    let mut words: Vec<String> = Vec::new();
    for word in tokenize(text) {
        if word.len() >= min_len && !words.contains(&word) {
            words.push(word);
        }
    }
    words
}

/// Returns true when `needle` occurs in `haystack` on word boundaries.
///
/// Both arguments are expected to be normalized already.
pub fn contains_words(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() || haystack.is_empty() {
        return false;
    }
    format!(" {} ", haystack).contains(&format!(" {} ", needle))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_basic() {
        assert_eq!(normalize("Hello, World!"), "hello world");
        assert_eq!(normalize("Father's Name"), "fathers name");
        assert_eq!(normalize("D.O.B"), "dob");
        assert_eq!(normalize("Mobile/WhatsApp  No."), "mobile whatsapp no");
        assert_eq!(normalize("E-mail ID *"), "email id");
    }

    #[test]
    fn test_normalize_empty_and_missing() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   "), "");
        assert_eq!(normalize("***"), "");
        assert_eq!(normalize_opt(None), "");
        assert_eq!(normalize_opt(Some("  A b ")), "a b");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let samples = [
            "",
            "   ",
            "Mobile Number - 10 digits only (Do NOT write +91 or 0)*",
            "Ünïcode Name",
            "a/b_c|d,e;f&g+h",
            "ALREADY normal",
            "\t\nTabs\tand\nnewlines ",
        ];
        for s in samples {
            let once = normalize(s);
            assert_eq!(normalize(&once), once, "not idempotent for {:?}", s);
        }
    }

    #[test]
    fn test_non_ascii_letters_are_dropped() {
        assert_eq!(normalize("Ünïcode Name"), "ncode name");
    }

    #[test]
    fn test_tokenize_drops_stop_words() {
        assert_eq!(tokenize("Name of the Student"), vec!["name", "student"]);
        assert_eq!(tokenize("Which year are you in"), vec!["year"]);
        assert!(tokenize("of the").is_empty());
    }

    #[test]
    fn test_significant_words() {
        assert_eq!(
            significant_words("Indian Institute of Technology, Delhi", 3),
            vec!["indian", "institute", "technology", "delhi"]
        );
        assert_eq!(significant_words("IT and EE", 3), Vec::<String>::new());
    }

    #[test]
    fn test_contains_words() {
        assert!(contains_words("computer science and engineering", "computer science"));
        assert!(!contains_words("mtech", "m"));
        assert!(!contains_words("", "m"));
    }
}
