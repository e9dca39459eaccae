//! The fill pipeline: detected fields in, fill mappings out.
//!
//! Each field is handled on its own: the label is cleaned and classified, the
//! predicted field is resolved against the profile, and closed-choice fields
//! narrow the value to one of their options. Fields that produce no value are
//! left out of the result.

use std::sync::Arc;

use log::{debug, info};
use serde::Serialize;

use crate::cache::{CacheEntry, MappingCache};
use crate::classifier::{ClassificationResult, Classifier, ClassifierError};
use crate::config::EngineConfig;
use crate::matcher::{FieldContext, MatchOutcome, OptionCandidate, OptionMatcher};
use crate::normalize::normalize;
use crate::preprocess::{preprocess, PreprocessedLabel};
use crate::profile::{self, CustomFields, ProfileSnapshot, ResolveHints, NA_VALUE};
use crate::FieldId;

/// The kind of form control, with the options closed-choice kinds carry.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind<H = ()> {
    Text,
    Textarea,
    Date,
    Radio(Vec<OptionCandidate<H>>),
    Checkbox(Vec<OptionCandidate<H>>),
    Select(Vec<OptionCandidate<H>>),
}

impl<H> FieldKind<H> {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Textarea => "textarea",
            Self::Date => "date",
            Self::Radio(_) => "radio",
            Self::Checkbox(_) => "checkbox",
            Self::Select(_) => "select",
        }
    }

    /// Builds a kind from its name; free-text kinds ignore `options`.
    pub fn from_name(name: &str, options: Vec<OptionCandidate<H>>) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "text" => Some(Self::Text),
            "textarea" => Some(Self::Textarea),
            "date" => Some(Self::Date),
            "radio" => Some(Self::Radio(options)),
            "checkbox" => Some(Self::Checkbox(options)),
            "select" => Some(Self::Select(options)),
            _ => None,
        }
    }

    pub fn options(&self) -> Option<&[OptionCandidate<H>]> {
        match self {
            Self::Radio(options) | Self::Checkbox(options) | Self::Select(options) => Some(options),
            Self::Text | Self::Textarea | Self::Date => None,
        }
    }
}

/// A form field found by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedField<H = ()> {
    pub label: String,
    pub kind: FieldKind<H>,
}

impl<H> DetectedField<H> {
    pub fn new(label: impl Into<String>, kind: FieldKind<H>) -> Self {
        Self {
            label: label.into(),
            kind,
        }
    }
}

/// The value to write into a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FillValue {
    Single(String),
    Multiple(Vec<String>),
}

impl FillValue {
    pub fn as_single(&self) -> Option<&str> {
        match self {
            Self::Single(v) => Some(v),
            Self::Multiple(_) => None,
        }
    }
}

/// One fill decision handed to the form-filling collaborator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FillMapping<H = ()> {
    pub field: FieldId,
    pub label: String,
    pub value: FillValue,
    pub confidence: f32,
    /// Handles of the chosen options, for closed-choice fields
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub selected: Vec<H>,
}

/// Where a fill's field id came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    /// The classifier, possibly biased by the cache
    Prediction,
    /// A custom field whose key matches the label
    CustomField,
}

/// Maps detected form fields to profile values.
///
/// The classifier is shared and immutable; the optional mapping cache is the
/// only state, and only the async [`fill`](Self::fill) path touches it.
pub struct FormFiller {
    classifier: Arc<Classifier>,
    matcher: OptionMatcher,
    cache: Option<Arc<MappingCache>>,
    config: EngineConfig,
}

impl FormFiller {
    pub fn new(classifier: Arc<Classifier>, config: EngineConfig) -> Self {
        Self {
            classifier,
            matcher: OptionMatcher::from_config(&config),
            cache: None,
            config,
        }
    }

    /// A filler using the built-in classifier.
    pub fn builtin(config: EngineConfig) -> Result<Self, ClassifierError> {
        Ok(Self::new(Classifier::builtin()?, config))
    }

    pub fn with_cache(mut self, cache: Arc<MappingCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn matcher(&self) -> &OptionMatcher {
        &self.matcher
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Fills every field, consulting and updating the mapping cache if one is set.
    pub async fn fill<H: Clone>(
        &self,
        fields: &[DetectedField<H>],
        profile: &ProfileSnapshot,
        custom: &CustomFields,
    ) -> Vec<FillMapping<H>> {
        let mut mappings = Vec::new();
        for field in fields {
            let cached = match &self.cache {
                Some(cache) => cache.get(&field.label).await,
                None => None,
            };
            if let Some((mapping, source)) = self.decide(field, profile, custom, cached.as_ref()) {
                // Only classifier fills are cached.
                if let (Some(cache), Source::Prediction) = (&self.cache, source) {
                    cache.store(&field.label, &mapping.field, mapping.confidence).await;
                }
                mappings.push(mapping);
            }
        }
        info!("Filled {} of {} fields", mappings.len(), fields.len());
        mappings
    }

    /// Fills every field from the classifier alone, without the cache.
    pub fn fill_without_cache<H: Clone>(
        &self,
        fields: &[DetectedField<H>],
        profile: &ProfileSnapshot,
        custom: &CustomFields,
    ) -> Vec<FillMapping<H>> {
        let mappings: Vec<FillMapping<H>> = fields
            .iter()
            .filter_map(|field| self.fill_field(field, profile, custom, None))
            .collect();
        info!("Filled {} of {} fields", mappings.len(), fields.len());
        mappings
    }

    /// Decides the fill for a single field, or `None` to leave it alone.
    ///
    /// `cached` is a previous mapping for the same label; it replaces the
    /// classifier's prediction when the classifier has none or is no more
    /// confident than the cached entry.
    pub fn fill_field<H: Clone>(
        &self,
        field: &DetectedField<H>,
        profile: &ProfileSnapshot,
        custom: &CustomFields,
        cached: Option<&CacheEntry>,
    ) -> Option<FillMapping<H>> {
        self.decide(field, profile, custom, cached).map(|(mapping, _)| mapping)
    }

    fn decide<H: Clone>(
        &self,
        field: &DetectedField<H>,
        profile: &ProfileSnapshot,
        custom: &CustomFields,
        cached: Option<&CacheEntry>,
    ) -> Option<(FillMapping<H>, Source)> {
        let label = preprocess(&field.label);
        let prediction = self.predict(&label, cached);

        // NA is applied below, after the custom-field fallback.
        let hints = ResolveHints {
            has_na_instruction: false,
            date_control: matches!(field.kind, FieldKind::Date),
        };
        let resolved = prediction
            .predicted_field
            .as_deref()
            .and_then(|id| {
                profile::resolve(id, profile, custom, hints)
                    .map(|v| (id.to_string(), v, prediction.confidence, Source::Prediction))
            })
            .or_else(|| {
                custom_by_label(&label.cleaned, custom).map(|(id, v)| (id, v, 1.0, Source::CustomField))
            })
            .or_else(|| {
                let id = prediction.predicted_field.clone()?;
                label
                    .has_na_instruction
                    .then(|| (id, NA_VALUE.to_string(), prediction.confidence, Source::Prediction))
            });

        let Some((field_id, value, confidence, source)) = resolved else {
            debug!(
                "No value for {:?} (predicted {:?})",
                field.label, prediction.predicted_field
            );
            return None;
        };

        let (value, selected) = match &field.kind {
            FieldKind::Text | FieldKind::Textarea | FieldKind::Date => (FillValue::Single(value), Vec::new()),
            FieldKind::Radio(options) | FieldKind::Select(options) => {
                let index = self.choose(options, &value, &field.label, &field_id, confidence)?;
                (FillValue::Single(option_text(&options[index])), vec![options[index].handle.clone()])
            }
            FieldKind::Checkbox(options) => {
                let indices = self.choose_many(options, &value, &field.label, &field_id, confidence);
                if indices.is_empty() {
                    return None;
                }
                (
                    FillValue::Multiple(indices.iter().map(|&i| option_text(&options[i])).collect()),
                    indices.iter().map(|&i| options[i].handle.clone()).collect(),
                )
            }
        };

        debug!(
            "{} field {:?} -> {} ({:.2})",
            field.kind.name(),
            field.label,
            field_id,
            confidence
        );
        Some((
            FillMapping {
                field: field_id,
                label: field.label.clone(),
                value,
                confidence,
                selected,
            },
            source,
        ))
    }

    fn predict(&self, label: &PreprocessedLabel, cached: Option<&CacheEntry>) -> ClassificationResult {
        let mut result = self.classifier.predict(&label.cleaned);
        if result.predicted_field.is_some() && result.confidence < self.config.min_classifier_confidence {
            debug!(
                "Discarding low-confidence prediction {:?} ({:.2}) for {:?}",
                result.predicted_field, result.confidence, label.cleaned
            );
            result = ClassificationResult::no_match();
        }

        match cached {
            Some(entry) if result.predicted_field.is_none() || entry.confidence >= result.confidence => {
                if result.predicted_field.as_deref() != Some(entry.field.as_str()) {
                    debug!(
                        "Cache overrides prediction {:?} with {} for {:?}",
                        result.predicted_field, entry.field, label.cleaned
                    );
                }
                ClassificationResult {
                    predicted_field: Some(entry.field.clone()),
                    confidence: entry.confidence,
                }
            }
            _ => result,
        }
    }

    /// Picks one option, applying the trust threshold to fuzzy tiers.
    fn choose<H>(
        &self,
        options: &[OptionCandidate<H>],
        value: &str,
        label: &str,
        field_id: &str,
        confidence: f32,
    ) -> Option<usize> {
        let context = FieldContext::new(label, Some(field_id));
        match self.matcher.match_outcome(options, value, context) {
            MatchOutcome::Matched { index, tier } => {
                if confidence < self.config.option_trust_threshold && !tier.is_exact() {
                    debug!(
                        "Declining {} match for {:?}: confidence {:.2} below {:.2}",
                        tier, label, confidence, self.config.option_trust_threshold
                    );
                    return None;
                }
                Some(index)
            }
            MatchOutcome::NoMatch | MatchOutcome::GuardrailRejected { .. } => None,
        }
    }

    /// Picks options for a multi-value field, one per comma- or
    /// semicolon-separated part of the value.
    fn choose_many<H>(
        &self,
        options: &[OptionCandidate<H>],
        value: &str,
        label: &str,
        field_id: &str,
        confidence: f32,
    ) -> Vec<usize> {
        let parts: Vec<&str> = value
            .split([',', ';'])
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();
        if parts.len() <= 1 {
            return self
                .choose(options, value, label, field_id, confidence)
                .into_iter()
                .collect();
        }

        let mut indices: Vec<usize> = Vec::new();
        for part in parts {
            if let Some(index) = self.choose(options, part, label, field_id, confidence) {
                if !indices.contains(&index) {
                    indices.push(index);
                }
            }
        }
        indices
    }
}

/// A custom field whose key normalizes to the same text as the label.
fn custom_by_label(cleaned_label: &str, custom: &CustomFields) -> Option<(FieldId, String)> {
    let wanted = normalize(cleaned_label);
    if wanted.is_empty() {
        return None;
    }
    let mut keys: Vec<&String> = custom.keys().filter(|k| normalize(k) == wanted).collect();
    keys.sort();
    keys.into_iter().find_map(|key| {
        let value = custom[key].trim();
        (!value.is_empty()).then(|| (key.clone(), value.to_string()))
    })
}

fn option_text<H>(option: &OptionCandidate<H>) -> String {
    if option.value.trim().is_empty() {
        option.label.trim().to_string()
    } else {
        option.value.clone()
    }
}
