//! Label cleanup ahead of classification.
//!
//! Form authors wrap the actual question in instructions ("10 digits only",
//! "mention NA if not applicable", required-field asterisks). The classifier
//! only wants the semantic core, so the preprocessor strips these with a
//! maintained list of patterns and records whether the field accepts a
//! literal `NA`.

use lazy_static::lazy_static;
use regex::Regex;

/// Result of preprocessing a raw label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreprocessedLabel {
    /// The label with instructions and markers removed
    pub cleaned: String,
    /// True when the label tells the user to write `NA` if nothing applies
    pub has_na_instruction: bool,
}

/// A named pattern from one of the maintained tables.
struct LabelPattern {
    name: &'static str,
    regex: Regex,
}

impl LabelPattern {
    fn new(name: &'static str, pattern: &str) -> Self {
        // Patterns are compile-time literals covered by the tests below.
        let regex = Regex::new(pattern)
            .unwrap_or_else(|e| panic!("invalid label pattern '{}': {}", name, e));
        Self { name, regex }
    }
}

const NA_VERB: &str = r"(?:mention|write|put|enter|type|fill)";

lazy_static! {
    /// Phrasings that mark a field as accepting `NA`.
    static ref NA_PATTERNS: Vec<LabelPattern> = vec![
        // "if no GitHub then mention NA"
        LabelPattern::new(
            "if-no-then-na",
            &format!(r#"(?i)\bif\s+(?:no|not|none|nil)\b.*\b{}\s+["']?n/?a\b"#, NA_VERB),
        ),
        // "mention NA if not applicable"
        LabelPattern::new(
            "na-if",
            &format!(r#"(?i)\b{}\s+(?:in\s+)?["']?n/?a["']?\s+(?:if|in\s+case|when)\b"#, NA_VERB),
        ),
        // "or write NA"
        LabelPattern::new(
            "or-na",
            &format!(r#"(?i)\bor\s+(?:else\s+)?{}\s+["']?n/?a\b"#, NA_VERB),
        ),
        // "(NA if none)"
        LabelPattern::new("parenthetical-na", r"(?i)\([^)]*\bn/?a\b[^)]*\)"),
        LabelPattern::new("na-if-not-applicable", r"(?i)\bn/?a\s+if\s+not\s+applicable\b"),
    ];

    /// Removal rules, applied in order. Each match is replaced by a space.
    static ref CLEANUP_PATTERNS: Vec<LabelPattern> = vec![
        LabelPattern::new("parenthetical", r"\([^)]*(?:\)|$)"),
        LabelPattern::new("bracketed", r"\[[^\]]*(?:\]|$)"),
        LabelPattern::new("if-no-clause", r"(?i)[,;.]?\s*\bif\s+(?:no|not|none|nil)\b.*$"),
        LabelPattern::new(
            "or-na-clause",
            &format!(r#"(?i)\s+or\s+(?:else\s+)?{}\s+["']?n/?a\b.*$"#, NA_VERB),
        ),
        LabelPattern::new(
            "na-clause",
            &format!(r#"(?i)[,;.]?\s*\b(?:please\s+)?{}\s+(?:in\s+)?["']?n/?a\b.*$"#, NA_VERB),
        ),
        LabelPattern::new("asterisks", r"\*+"),
        LabelPattern::new("required-suffix", r"(?i)\brequired\s*$"),
        LabelPattern::new("optional-suffix", r"(?i)\boptional\s*$"),
        LabelPattern::new("dash-qualifier", r"\s[-–—|]\s.*$"),
    ];
}

const TRIM_CHARS: &[char] = &[' ', ':', '.', ',', ';', '?', '!', '-', '–', '—'];

/// Strips instructional noise from a label and detects NA instructions.
///
/// Never fails. When nothing matches, `cleaned` is the trimmed raw label; when
/// cleanup would leave nothing behind, the trimmed raw label is kept as well.
///
/// # Example
/// ```
/// use formfill::preprocess;
///
/// let label = preprocess("Mobile Number - 10 digits only (Do NOT write +91 or 0)*");
/// assert_eq!(label.cleaned, "Mobile Number");
/// assert!(!label.has_na_instruction);
/// ```
pub fn preprocess(raw_label: &str) -> PreprocessedLabel {
    let has_na_instruction = NA_PATTERNS.iter().any(|p| {
        let hit = p.regex.is_match(raw_label);
        if hit {
            log::trace!("NA pattern '{}' matched label {:?}", p.name, raw_label);
        }
        hit
    });

    let mut text = raw_label.to_string();
    for pattern in CLEANUP_PATTERNS.iter() {
        text = pattern.regex.replace_all(&text, " ").into_owned();
    }

    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let cleaned = collapsed.trim_matches(TRIM_CHARS).trim().to_string();

    PreprocessedLabel {
        cleaned: if cleaned.is_empty() {
            raw_label.trim().to_string()
        } else {
            cleaned
        },
        has_na_instruction,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn case(raw: &str, cleaned: &str, na: bool) {
        let result = preprocess(raw);
        assert_eq!(result.cleaned, cleaned, "cleaned mismatch for {:?}", raw);
        assert_eq!(result.has_na_instruction, na, "NA flag mismatch for {:?}", raw);
    }

    #[test]
    fn test_dash_qualifier_and_parenthetical() {
        case("Mobile Number - 10 digits only (Do NOT write +91 or 0)*", "Mobile Number", false);
    }

    #[test]
    fn test_parenthetical_na() {
        case("LinkedIn Profile (mention NA if not applicable)", "LinkedIn Profile", true);
        case("Backlogs (NA if none)", "Backlogs", true);
    }

    #[test]
    fn test_if_no_then_na() {
        case("GitHub URL, if no GitHub then mention NA", "GitHub URL", true);
    }

    #[test]
    fn test_or_write_na() {
        case("Portfolio link or write NA", "Portfolio link", true);
    }

    #[test]
    fn test_na_clause_after_colon() {
        case("Company Name: write NA if not applicable *", "Company Name", true);
    }

    #[test]
    fn test_required_markers() {
        case("Email*", "Email", false);
        case("E-mail ID *", "E-mail ID", false);
        case("Percentage - Required", "Percentage", false);
        case("Date of Birth (DD/MM/YYYY) *", "Date of Birth", false);
    }

    #[test]
    fn test_bracketed_note() {
        case("Full Name [as per Aadhaar]", "Full Name", false);
    }

    #[test]
    fn test_no_match_keeps_trimmed_label() {
        case("  Roll Number  ", "Roll Number", false);
        case("Year of graduation", "Year of graduation", false);
    }

    #[test]
    fn test_cleanup_never_empties_label() {
        case("Required", "Required", false);
        case("", "", false);
    }

    #[test]
    fn test_tables_compile() {
        assert!(!NA_PATTERNS.is_empty());
        assert!(!CLEANUP_PATTERNS.is_empty());
    }
}
