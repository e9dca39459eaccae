//! A field matching engine that maps human-written form labels to profile values.
//!
//! Labels are cleaned of instructions, classified into a profile field id by a
//! bag-of-words naive Bayes model, resolved against the user's profile, and
//! narrowed to one of the form's existing options when the field is a closed
//! choice.
//!
//! # Basic Usage
//!
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use formfill::{preprocess, Classifier};
//!
//! let classifier = Classifier::builtin()?;
//!
//! let label = preprocess("Mobile Number - 10 digits only (Do NOT write +91 or 0)*");
//! assert_eq!(label.cleaned, "Mobile Number");
//!
//! let result = classifier.predict(&label.cleaned);
//! println!("Predicted field: {:?} ({:.2})", result.predicted_field, result.confidence);
//! # Ok(())
//! # }
//! ```
//!
//! # Filling a form
//!
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use formfill::{CustomFields, DetectedField, EngineConfig, FieldKind, FormFiller, OptionCandidate};
//! use serde_json::json;
//!
//! let filler = FormFiller::builtin(EngineConfig::default())?;
//! let profile = json!({"personal": {"firstName": "John", "lastName": "Doe", "gender": "Male"}});
//!
//! let fields = vec![
//!     DetectedField::new("Full Name *", FieldKind::Text),
//!     DetectedField::new(
//!         "Gender",
//!         FieldKind::Radio(vec![
//!             OptionCandidate::new("M", "Male", ()),
//!             OptionCandidate::new("F", "Female", ()),
//!         ]),
//!     ),
//! ];
//!
//! for mapping in filler.fill_without_cache(&fields, &profile, &CustomFields::new()) {
//!     println!("{} -> {:?}", mapping.field, mapping.value);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Thread Safety
//!
//! The trained classifier is immutable and shared through `Arc`; every stage
//! except the mapping cache is a pure function and can be called from any
//! number of threads at once.

pub mod cache;
pub mod classifier;
pub mod config;
pub mod engine;
pub mod matcher;
pub mod normalize;
pub mod preprocess;
pub mod profile;

/// Identifier of a profile attribute, such as `phone` or `collegeName`.
pub type FieldId = String;

pub use cache::{CacheEntry, FileStore, KeyValueStore, MappingCache, MemoryStore};
pub use classifier::{
    ClassificationResult, Classifier, ClassifierBuilder, ClassifierError, ClassifierInfo, TrainingExample,
};
pub use config::{ConfigError, EngineConfig};
pub use engine::{DetectedField, FieldKind, FillMapping, FillValue, FormFiller};
pub use matcher::{FieldContext, MatchOutcome, MatchTier, OptionCandidate, OptionMatcher};
pub use normalize::normalize;
pub use preprocess::{preprocess, PreprocessedLabel};
pub use profile::{resolve, CustomFields, ProfileSnapshot, ResolveHints};

pub fn init_logger() {
    env_logger::init();
}
