//! The embedded training corpus and its line format.
//!
//! The corpus is a versioned data file (`corpus.tsv`) kept next to this
//! module. Each non-comment line is `<fieldId><TAB><label>`. Every field id
//! it names must also be known to the profile field table.

use super::builder::TrainingExample;
use super::error::ClassifierError;

/// The built-in corpus, compiled into the crate.
pub const BUILTIN_CORPUS: &str = include_str!("corpus.tsv");

/// Parses a tab-separated corpus.
///
/// Blank lines and lines starting with `#` are ignored. A line without a tab
/// is rejected; a line with an empty field id is passed through so the
/// builder can skip it.
pub fn parse_corpus(text: &str) -> Result<Vec<TrainingExample>, ClassifierError> {
    let mut examples = Vec::new();
    for (i, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let (target, label) = line.split_once('\t').ok_or_else(|| ClassifierError::CorpusParse {
            line: i + 1,
            reason: format!("expected '<fieldId>\\t<label>', got {:?}", line),
        })?;
        examples.push(TrainingExample::new(label.trim(), target.trim()));
    }
    Ok(examples)
}

/// Parses the built-in corpus.
pub fn builtin_examples() -> Result<Vec<TrainingExample>, ClassifierError> {
    parse_corpus(BUILTIN_CORPUS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_skips_comments_and_blanks() {
        let examples = parse_corpus("# header\n\nphone\tMobile Number\nemail\tEmail\n").unwrap();
        assert_eq!(
            examples,
            vec![
                TrainingExample::new("Mobile Number", "phone"),
                TrainingExample::new("Email", "email"),
            ]
        );
    }

    #[test]
    fn test_parse_reports_line_number() {
        let err = parse_corpus("phone\tMobile\nno tab here\n").unwrap_err();
        assert!(matches!(err, ClassifierError::CorpusParse { line: 2, .. }));
    }

    #[test]
    fn test_builtin_corpus_is_well_formed() {
        let examples = builtin_examples().unwrap();
        assert!(examples.iter().all(|e| !e.label.is_empty() && !e.target.is_empty()));
    }
}
