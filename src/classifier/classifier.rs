use std::collections::HashMap;
use std::sync::Arc;

use lazy_static::lazy_static;
use ndarray::{Array1, Array2};

use super::builder::{ClassifierBuilder, TrainingExample};
use super::error::ClassifierError;
use super::utils::{argmax_first, margin_confidence, runner_up, softmax};
use super::ClassifierInfo;
use crate::normalize::tokenize;
use crate::preprocess::preprocess;
use crate::FieldId;

lazy_static! {
    static ref BUILTIN: Result<Arc<Classifier>, ClassifierError> = ClassifierBuilder::new()
        .with_builtin_corpus()
        .and_then(ClassifierBuilder::build)
        .map(Arc::new);
}

/// Outcome of classifying one label.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationResult {
    /// The most likely profile field, or `None` when the label has no known words
    pub predicted_field: Option<FieldId>,
    /// Relative certainty in `[0, 1]`; comparable across calls, not calibrated
    pub confidence: f32,
}

impl ClassificationResult {
    pub fn no_match() -> Self {
        Self {
            predicted_field: None,
            confidence: 0.0,
        }
    }
}

/// A thread-safe bag-of-words label classifier.
///
/// Multinomial naive Bayes over normalized label words with Laplace smoothing.
/// The trained tables are immutable and shared through `Arc`, so cloning is
/// cheap and concurrent predictions need no locking.
///
/// Multi-thread usage:
/// ```rust
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use formfill::Classifier;
/// use std::thread;
///
/// let classifier = Classifier::builtin()?;
///
/// let shared = classifier.clone();
/// thread::spawn(move || {
///     shared.predict("Email Address");
/// }).join().unwrap();
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Classifier {
    pub(crate) classes: Arc<Vec<FieldId>>,
    pub(crate) vocabulary: Arc<HashMap<String, usize>>,
    /// log P(class), one entry per class
    pub(crate) log_priors: Arc<Array1<f64>>,
    /// log P(token | class), shape [classes, vocabulary]
    pub(crate) log_likelihoods: Arc<Array2<f64>>,
    pub(crate) num_examples: usize,
    pub(crate) corpus_fingerprint: String,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<Classifier>();
    }
};

impl Classifier {
    /// Creates a new ClassifierBuilder for fluent construction
    pub fn builder() -> ClassifierBuilder {
        ClassifierBuilder::new()
    }

    /// The process-wide classifier trained on the embedded corpus.
    ///
    /// Built on first use and shared afterwards.
    pub fn builtin() -> Result<Arc<Classifier>, ClassifierError> {
        BUILTIN.clone()
    }

    /// Returns information about the trained model
    pub fn info(&self) -> ClassifierInfo {
        ClassifierInfo {
            num_classes: self.classes.len(),
            vocabulary_size: self.vocabulary.len(),
            num_examples: self.num_examples,
            class_labels: self.classes.as_ref().clone(),
            corpus_fingerprint: self.corpus_fingerprint.clone(),
        }
    }

    /// Log-space class scores for a label, or `None` if no word is in the vocabulary.
    fn scores(&self, label: &str) -> Option<Array1<f64>> {
        let indices: Vec<usize> = tokenize(label)
            .iter()
            .filter_map(|t| self.vocabulary.get(t).copied())
            .collect();
        if indices.is_empty() {
            return None;
        }

        let mut scores = self.log_priors.as_ref().clone();
        for ti in indices {
            scores += &self.log_likelihoods.column(ti);
        }
        Some(scores)
    }

    /// Predicts the profile field a cleaned label refers to.
    ///
    /// The confidence is the two-way softmax weight of the winning class
    /// against the runner-up, so it grows with the score margin. When two
    /// classes score exactly the same, the one that appeared first in the
    /// training corpus wins.
    ///
    /// # Example
    /// ```rust
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// use formfill::Classifier;
    ///
    /// let classifier = Classifier::builtin()?;
    /// let result = classifier.predict("Year of graduation");
    /// assert_eq!(result.predicted_field.as_deref(), Some("yearOfGraduation"));
    /// # Ok(())
    /// # }
    /// ```
    pub fn predict(&self, cleaned_label: &str) -> ClassificationResult {
        let Some(scores) = self.scores(cleaned_label) else {
            return ClassificationResult::no_match();
        };
        let Some(best) = argmax_first(&scores) else {
            return ClassificationResult::no_match();
        };

        ClassificationResult {
            predicted_field: Some(self.classes[best].clone()),
            confidence: margin_confidence(scores[best], runner_up(&scores, best)),
        }
    }

    /// Every class with its softmax weight, highest first.
    ///
    /// Returns an empty list when the label has no known words.
    pub fn predict_scores(&self, cleaned_label: &str) -> Vec<(FieldId, f32)> {
        let Some(scores) = self.scores(cleaned_label) else {
            return Vec::new();
        };
        let weights = softmax(&scores);
        let mut ranked: Vec<(FieldId, f32)> = self
            .classes
            .iter()
            .cloned()
            .zip(weights.iter().map(|&w| w as f32))
            .collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        ranked
    }

    /// Fraction of examples whose preprocessed label is classified as its own target.
    pub fn self_consistency(&self, examples: &[TrainingExample]) -> f32 {
        if examples.is_empty() {
            return 0.0;
        }
        let hits = examples
            .iter()
            .filter(|e| {
                let cleaned = preprocess(&e.label).cleaned;
                self.predict(&cleaned).predicted_field.as_deref() == Some(e.target.as_str())
            })
            .count();
        hits as f32 / examples.len() as f32
    }
}
