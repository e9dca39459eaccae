mod builder;
#[allow(clippy::module_inception)]
mod classifier;
pub mod corpus;
mod error;
mod utils;

pub use builder::{ClassifierBuilder, TrainingExample};
pub use classifier::{ClassificationResult, Classifier};
pub use error::ClassifierError;

use crate::FieldId;

/// Information about a trained classifier
#[derive(Debug, Clone)]
pub struct ClassifierInfo {
    /// Number of distinct field ids the classifier can predict
    pub num_classes: usize,
    /// Number of distinct tokens seen across all training labels
    pub vocabulary_size: usize,
    /// Number of training examples used
    pub num_examples: usize,
    /// Field ids in training corpus order
    pub class_labels: Vec<FieldId>,
    /// SHA-256 of the training examples, hex encoded
    pub corpus_fingerprint: String,
}
