use thiserror::Error;

/// Errors raised while building a classifier from a training corpus.
///
/// Prediction itself never fails: a label with no recognized words is a
/// regular "no match" result, not an error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClassifierError {
    /// The corpus contained no usable training examples
    #[error("Training corpus is empty: at least one labeled example is required")]
    EmptyCorpus,
    /// A corpus line could not be parsed
    #[error("Corpus parse error on line {line}: {reason}")]
    CorpusParse { line: usize, reason: String },
    /// Error occurred during the build phase
    #[error("Build error: {0}")]
    BuildError(String),
}
