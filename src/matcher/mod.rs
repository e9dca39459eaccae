//! Chooses which pre-existing option of a closed-choice field satisfies a value.
//!
//! Matching runs domain pre-transforms first (institution names, categories,
//! year of study), then a numeric guardrail, then a fixed cascade of generic
//! tiers. The first tier that finds a candidate wins; later tiers are never
//! consulted once an earlier one matched.

pub mod tables;
mod transforms;

use std::fmt;

use chrono::Datelike;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::normalize::{normalize, significant_words};
use tables::{canonical_keys, category_table, ordinal_forms};
pub use transforms::graduation_year_window;

/// Fields whose values are institution names.
const INSTITUTION_FIELDS: &[&str] = &["collegeName", "universityName"];

/// Fields whose value may be a year of study that needs converting.
const GRADUATION_FIELDS: &[&str] = &["yearOfGraduation"];

/// Shorter normalized strings never take part in containment matching.
const MIN_CONTAINMENT_LEN: usize = 3;

/// Digit runs of this length or more are treated as identifiers, not choices.
const GUARDRAIL_MIN_DIGITS: usize = 6;

/// Length of a phone number without its country prefix.
const NATIONAL_NUMBER_DIGITS: usize = 10;

/// One selectable option of a radio group, checkbox group or select.
///
/// `handle` belongs to the caller (for example a reference to the DOM node)
/// and is handed back untouched with the chosen candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionCandidate<H = ()> {
    pub value: String,
    pub label: String,
    #[serde(default)]
    pub handle: H,
}

impl<H> OptionCandidate<H> {
    pub fn new(value: impl Into<String>, label: impl Into<String>, handle: H) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
            handle,
        }
    }

    /// Value and label as one string, without repeating identical text.
    pub fn search_text(&self) -> String {
        let value = self.value.trim();
        let label = self.label.trim();
        if label.is_empty() || label == value {
            value.to_string()
        } else if value.is_empty() {
            label.to_string()
        } else {
            format!("{} {}", value, label)
        }
    }
}

/// What the matcher knows about the field being filled.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldContext<'a> {
    /// The raw label of the field
    pub label: &'a str,
    /// The field id predicted for the label, if any
    pub predicted_field: Option<&'a str>,
}

impl<'a> FieldContext<'a> {
    pub fn new(label: &'a str, predicted_field: Option<&'a str>) -> Self {
        Self { label, predicted_field }
    }
}

/// The strategy that produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchTier {
    Institution,
    Category,
    GraduationYear,
    Literal,
    Normalized,
    Containment,
    Synonym,
    WordOverlap,
}

impl MatchTier {
    /// True for tiers that compare text exactly or use a curated domain table.
    pub fn is_exact(&self) -> bool {
        !matches!(self, Self::Containment | Self::Synonym | Self::WordOverlap)
    }
}

impl fmt::Display for MatchTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Institution => "institution",
            Self::Category => "category",
            Self::GraduationYear => "graduation-year",
            Self::Literal => "literal",
            Self::Normalized => "normalized",
            Self::Containment => "containment",
            Self::Synonym => "synonym",
            Self::WordOverlap => "word-overlap",
        };
        f.write_str(name)
    }
}

/// Detailed result of an option match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    /// A candidate was selected
    Matched { index: usize, tier: MatchTier },
    /// No tier found a candidate
    NoMatch,
    /// The value looked like an identifier absent from every candidate, so the
    /// matcher declined to guess
    GuardrailRejected { numeral: String },
}

impl MatchOutcome {
    pub fn index(&self) -> Option<usize> {
        match self {
            Self::Matched { index, .. } => Some(*index),
            _ => None,
        }
    }

    pub fn tier(&self) -> Option<MatchTier> {
        match self {
            Self::Matched { tier, .. } => Some(*tier),
            _ => None,
        }
    }
}

/// Matches resolved values against closed sets of options.
#[derive(Debug, Clone)]
pub struct OptionMatcher {
    min_token_len: usize,
    significant_token_len: usize,
    program_length_years: u32,
    current_year: Option<i32>,
}

impl Default for OptionMatcher {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl OptionMatcher {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            min_token_len: config.min_token_len,
            significant_token_len: config.significant_token_len,
            program_length_years: config.program_length_years,
            current_year: config.current_year,
        }
    }

    /// Pins the year used by the graduation-year transform.
    pub fn with_current_year(mut self, year: i32) -> Self {
        self.current_year = Some(year);
        self
    }

    fn current_year(&self) -> i32 {
        self.current_year
            .unwrap_or_else(|| chrono::Local::now().year())
    }

    /// Returns the best candidate for `value`, or `None` if nothing qualifies.
    ///
    /// # Example
    /// ```
    /// use formfill::matcher::{FieldContext, OptionCandidate, OptionMatcher};
    ///
    /// let options = vec![
    ///     OptionCandidate::new("Male", "Male", ()),
    ///     OptionCandidate::new("Female", "Female", ()),
    /// ];
    /// let matcher = OptionMatcher::default();
    /// let chosen = matcher.match_option(&options, "M", FieldContext::new("Gender", Some("gender")));
    /// assert_eq!(chosen.map(|c| c.value.as_str()), Some("Male"));
    /// ```
    pub fn match_option<'c, H>(
        &self,
        candidates: &'c [OptionCandidate<H>],
        value: &str,
        context: FieldContext<'_>,
    ) -> Option<&'c OptionCandidate<H>> {
        self.match_outcome(candidates, value, context)
            .index()
            .map(|i| &candidates[i])
    }

    /// Runs the full matching procedure and reports how it ended.
    pub fn match_outcome<H>(
        &self,
        candidates: &[OptionCandidate<H>],
        value: &str,
        context: FieldContext<'_>,
    ) -> MatchOutcome {
        let outcome = self.run(candidates, value, context);
        match &outcome {
            MatchOutcome::Matched { index, tier } => debug!(
                "Option matched for {:?} via {} tier: {:?}",
                context.label,
                tier,
                candidates[*index].search_text()
            ),
            MatchOutcome::NoMatch => debug!(
                "No option matched for {:?} (value {:?}, candidates {:?})",
                context.label,
                value,
                candidates.iter().map(|c| c.search_text()).collect::<Vec<_>>()
            ),
            MatchOutcome::GuardrailRejected { numeral } => warn!(
                "Numeric guardrail declined {:?} for {:?}: no candidate contains {}",
                value, context.label, numeral
            ),
        }
        outcome
    }

    fn run<H>(
        &self,
        candidates: &[OptionCandidate<H>],
        value: &str,
        context: FieldContext<'_>,
    ) -> MatchOutcome {
        if candidates.is_empty() || value.trim().is_empty() {
            return MatchOutcome::NoMatch;
        }

        if let Some(field) = context.predicted_field {
            if let Some(outcome) = self.pre_transform(candidates, value, field) {
                return outcome;
            }
        }

        if let Some(numeral) = long_numeral(value) {
            let present = candidates
                .iter()
                .any(|c| numeral_present(&digits_only(&c.search_text()), &numeral));
            if !present {
                return MatchOutcome::GuardrailRejected { numeral };
            }
        }

        let tiered = |tier: MatchTier| move |index: usize| MatchOutcome::Matched { index, tier };
        literal_match(candidates, value)
            .map(tiered(MatchTier::Literal))
            .or_else(|| normalized_match(candidates, value).map(tiered(MatchTier::Normalized)))
            .or_else(|| containment_match(candidates, value).map(tiered(MatchTier::Containment)))
            .or_else(|| synonym_match(candidates, value).map(tiered(MatchTier::Synonym)))
            .or_else(|| {
                self.word_overlap_match(candidates, value)
                    .map(tiered(MatchTier::WordOverlap))
            })
            .unwrap_or(MatchOutcome::NoMatch)
    }

    fn pre_transform<H>(
        &self,
        candidates: &[OptionCandidate<H>],
        value: &str,
        field: &str,
    ) -> Option<MatchOutcome> {
        let (index, tier) = if INSTITUTION_FIELDS.contains(&field) {
            (
                transforms::match_institution(candidates, value, self.min_token_len)?,
                MatchTier::Institution,
            )
        } else if let Some(table) = category_table(field) {
            (transforms::match_category(candidates, value, table)?, MatchTier::Category)
        } else if GRADUATION_FIELDS.contains(&field) {
            (
                transforms::match_graduation_year(
                    candidates,
                    value,
                    self.current_year(),
                    self.program_length_years,
                )?,
                MatchTier::GraduationYear,
            )
        } else {
            return None;
        };
        Some(MatchOutcome::Matched { index, tier })
    }

    /// Scores candidates by the summed length of words shared with the value.
    fn word_overlap_match<H>(&self, candidates: &[OptionCandidate<H>], value: &str) -> Option<usize> {
        let value_words = significant_words(value, self.min_token_len);
        if value_words.is_empty() {
            return None;
        }

        let mut best: Option<(usize, usize)> = None;
        for (i, candidate) in candidates.iter().enumerate() {
            let words = significant_words(&candidate.search_text(), self.min_token_len);
            let shared: Vec<&String> = value_words.iter().filter(|w| words.contains(*w)).collect();
            let score: usize = shared.iter().map(|w| w.len()).sum();
            let significant = shared.iter().any(|w| w.len() >= self.significant_token_len);

            if significant
                && score >= self.significant_token_len
                && best.map_or(true, |(_, s)| score > s)
            {
                best = Some((i, score));
            }
        }
        best.map(|(i, _)| i)
    }
}

/// Exact equality on trimmed text, plus ordinal spellings for small numbers.
fn literal_match<H>(candidates: &[OptionCandidate<H>], value: &str) -> Option<usize> {
    let value = value.trim();
    if let Some(i) = candidates
        .iter()
        .position(|c| c.value.trim() == value || c.label.trim() == value)
    {
        return Some(i);
    }

    if value.is_empty() || !value.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let forms = ordinal_forms(value.parse().ok()?)?;
    candidates.iter().position(|c| {
        normalize(&c.search_text())
            .split(' ')
            .any(|word| forms.iter().any(|f| f == word))
    })
}

fn normalized_match<H>(candidates: &[OptionCandidate<H>], value: &str) -> Option<usize> {
    let value = normalize(value);
    if value.is_empty() {
        return None;
    }
    candidates
        .iter()
        .position(|c| normalize(&c.value) == value || normalize(&c.label) == value)
}

fn containment_match<H>(candidates: &[OptionCandidate<H>], value: &str) -> Option<usize> {
    let value = normalize(value);
    let contains = |outer: &str, inner: &str| inner.len() >= MIN_CONTAINMENT_LEN && outer.contains(inner);
    candidates.iter().position(|c| {
        [normalize(&c.value), normalize(&c.label)]
            .iter()
            .any(|text| contains(text, &value) || contains(&value, text))
    })
}

fn synonym_match<H>(candidates: &[OptionCandidate<H>], value: &str) -> Option<usize> {
    let keys = canonical_keys(value);
    if keys.is_empty() {
        return None;
    }
    candidates.iter().position(|c| {
        canonical_keys(&c.value)
            .into_iter()
            .chain(canonical_keys(&c.label))
            .any(|k| keys.contains(&k))
    })
}

/// The identifier-like numeral in a value, if it has one.
///
/// A value that is all digits once separators are dropped counts when it has
/// ten or more digits; otherwise any single run of six or more digits counts.
fn long_numeral(value: &str) -> Option<String> {
    let compact: String = value
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '+' | '(' | ')' | '.'))
        .collect();
    if compact.len() >= 10 && compact.chars().all(|c| c.is_ascii_digit()) {
        return Some(compact);
    }
    value
        .split(|c: char| !c.is_ascii_digit())
        .find(|run| run.len() >= GUARDRAIL_MIN_DIGITS)
        .map(str::to_string)
}

fn digits_only(text: &str) -> String {
    text.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Whether a candidate's digits carry the numeral, allowing the value to add a
/// country or trunk prefix to a ten-digit number.
fn numeral_present(candidate_digits: &str, numeral: &str) -> bool {
    if candidate_digits.contains(numeral) {
        return true;
    }
    numeral.len() > NATIONAL_NUMBER_DIGITS
        && candidate_digits.contains(&numeral[numeral.len() - NATIONAL_NUMBER_DIGITS..])
}
