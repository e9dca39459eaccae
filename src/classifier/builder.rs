use std::collections::HashMap;
use std::sync::Arc;

use log::{info, warn};
use ndarray::{Array1, Array2};
use sha2::{Digest, Sha256};

use super::classifier::Classifier;
use super::corpus::{parse_corpus, BUILTIN_CORPUS};
use super::error::ClassifierError;
use crate::normalize::tokenize;
use crate::FieldId;

/// One labeled training example: a form label and the profile field it means.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainingExample {
    /// The human-written label as it appears on a form
    pub label: String,
    /// The profile field the label refers to
    pub target: FieldId,
}

impl TrainingExample {
    /// Creates a new training example
    ///
    /// # Example
    /// ```
    /// use formfill::TrainingExample;
    ///
    /// let example = TrainingExample::new("Mobile Number", "phone");
    /// assert_eq!(example.target, "phone");
    /// ```
    pub fn new(label: impl Into<String>, target: impl Into<FieldId>) -> Self {
        Self {
            label: label.into(),
            target: target.into(),
        }
    }
}

/// A builder for constructing a [`Classifier`] with a fluent interface.
///
/// Examples are kept in insertion order. The first time a field id appears
/// fixes its class position, which is also the tie-break order at prediction
/// time.
#[derive(Default, Debug, Clone)]
pub struct ClassifierBuilder {
    examples: Vec<TrainingExample>,
}

impl ClassifierBuilder {
    /// Creates a new empty ClassifierBuilder
    pub fn new() -> Self {
        Self {
            examples: Vec::new(),
        }
    }

    /// Adds a single labeled example
    pub fn add_example(mut self, label: impl Into<String>, target: impl Into<FieldId>) -> Self {
        self.examples.push(TrainingExample::new(label, target));
        self
    }

    /// Adds a batch of labeled examples
    pub fn add_examples(mut self, examples: impl IntoIterator<Item = TrainingExample>) -> Self {
        self.examples.extend(examples);
        self
    }

    /// Adds every example from a tab-separated corpus (`fieldId<TAB>label`).
    ///
    /// # Returns
    /// * `Result<Self, ClassifierError>` - The builder instance, or a
    ///   `CorpusParse` error naming the first malformed line
    pub fn with_corpus_str(self, corpus: &str) -> Result<Self, ClassifierError> {
        let examples = parse_corpus(corpus)?;
        Ok(self.add_examples(examples))
    }

    /// Adds the corpus embedded in the crate
    pub fn with_builtin_corpus(self) -> Result<Self, ClassifierError> {
        self.with_corpus_str(BUILTIN_CORPUS)
    }

    /// Number of examples collected so far
    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    /// Trains the model and returns the final Classifier
    ///
    /// Examples with an empty label or target are skipped with a warning.
    /// Duplicates are kept and reinforce their class.
    ///
    /// # Returns
    /// * `Result<Classifier, ClassifierError>` - The trained classifier, or
    ///   `EmptyCorpus` when no usable example remains
    ///
    /// # Example
    /// ```
    /// use formfill::Classifier;
    ///
    /// let classifier = Classifier::builder()
    ///     .add_example("Email Address", "email")
    ///     .add_example("Phone Number", "phone")
    ///     .build()
    ///     .unwrap();
    /// let result = classifier.predict("Email");
    /// assert_eq!(result.predicted_field.as_deref(), Some("email"));
    /// ```
    pub fn build(self) -> Result<Classifier, ClassifierError> {
        let examples: Vec<TrainingExample> = self
            .examples
            .into_iter()
            .filter(|e| {
                let usable = !e.label.trim().is_empty() && !e.target.trim().is_empty();
                if !usable {
                    warn!("Skipping training example with empty label or target: {:?}", e);
                }
                usable
            })
            .collect();

        if examples.is_empty() {
            return Err(ClassifierError::EmptyCorpus);
        }

        let mut classes: Vec<FieldId> = Vec::new();
        let mut class_index: HashMap<FieldId, usize> = HashMap::new();
        let mut vocabulary: HashMap<String, usize> = HashMap::new();
        let mut tokenized: Vec<(usize, Vec<String>)> = Vec::with_capacity(examples.len());

        for example in &examples {
            let class = *class_index.entry(example.target.clone()).or_insert_with(|| {
                classes.push(example.target.clone());
                classes.len() - 1
            });
            let tokens = tokenize(&example.label);
            for token in &tokens {
                let next = vocabulary.len();
                vocabulary.entry(token.clone()).or_insert(next);
            }
            tokenized.push((class, tokens));
        }

        if vocabulary.is_empty() {
            return Err(ClassifierError::BuildError(
                "Training labels produced no tokens".to_string(),
            ));
        }

        let num_classes = classes.len();
        let vocab_size = vocabulary.len();
        let mut token_counts = Array2::<f64>::zeros((num_classes, vocab_size));
        let mut doc_counts = Array1::<f64>::zeros(num_classes);

        for (class, tokens) in &tokenized {
            doc_counts[*class] += 1.0;
            for token in tokens {
                if let Some(&ti) = vocabulary.get(token) {
                    token_counts[[*class, ti]] += 1.0;
                }
            }
        }

        // Laplace smoothing over the vocabulary.
        let mut log_likelihoods = Array2::<f64>::zeros((num_classes, vocab_size));
        for c in 0..num_classes {
            let total: f64 = token_counts.row(c).sum();
            let denom = total + vocab_size as f64;
            for ti in 0..vocab_size {
                log_likelihoods[[c, ti]] = ((token_counts[[c, ti]] + 1.0) / denom).ln();
            }
        }

        let num_examples = examples.len();
        let log_priors = doc_counts.mapv(|d| (d / num_examples as f64).ln());

        info!(
            "Trained label classifier: {} classes, {} examples, vocabulary of {} tokens",
            num_classes, num_examples, vocab_size
        );

        Ok(Classifier {
            classes: Arc::new(classes),
            vocabulary: Arc::new(vocabulary),
            log_priors: Arc::new(log_priors),
            log_likelihoods: Arc::new(log_likelihoods),
            num_examples,
            corpus_fingerprint: fingerprint(&examples),
        })
    }
}

/// SHA-256 over the usable examples, in order.
fn fingerprint(examples: &[TrainingExample]) -> String {
    let mut hasher = Sha256::new();
    for example in examples {
        hasher.update(example.target.as_bytes());
        hasher.update(b"\t");
        hasher.update(example.label.as_bytes());
        hasher.update(b"\n");
    }
    format!("{:x}", hasher.finalize())
}
