//! Domain-specific pre-transforms run before the generic cascade.
//!
//! Each transform either picks a candidate index or returns `None`, in which
//! case the matcher falls through to the generic tiers.

use crate::normalize::{normalize, significant_words};

use super::tables::{institutions_named_in, Institution, SynonymTable};
use super::OptionCandidate;

/// Picks the candidate naming the same institution as `value`.
///
/// A candidate scores the length of every keyword it shares with an
/// institution named by the value, plus the length of every word it shares
/// with that institution's full name. Candidates that name a different known
/// institution are ruled out.
pub(crate) fn match_institution<H>(
    candidates: &[OptionCandidate<H>],
    value: &str,
    min_token_len: usize,
) -> Option<usize> {
    let named: Vec<&Institution> = institutions_named_in(&normalize(value));
    if named.is_empty() {
        return None;
    }

    let mut best: Option<(usize, usize)> = None;
    for (i, candidate) in candidates.iter().enumerate() {
        let text = normalize(&candidate.search_text());
        let own = institutions_named_in(&text);
        if !own.is_empty() && !own.iter().any(|o| named.iter().any(|n| n.key == o.key)) {
            continue;
        }

        let words = significant_words(&text, min_token_len);
        let score: usize = named
            .iter()
            .map(|inst| {
                let keyword_score: usize = inst.keyword_hits(&text).map(str::len).sum();
                let overlap_score: usize = significant_words(inst.full_name, min_token_len)
                    .iter()
                    .filter(|w| words.contains(*w))
                    .map(|w| w.len())
                    .sum();
                keyword_score + overlap_score
            })
            .sum();

        if score > 0 && best.map_or(true, |(_, s)| score > s) {
            best = Some((i, score));
        }
    }
    best.map(|(i, _)| i)
}

/// Picks the first candidate whose canonical category equals the value's.
pub(crate) fn match_category<H>(
    candidates: &[OptionCandidate<H>],
    value: &str,
    table: &SynonymTable,
) -> Option<usize> {
    let key = table.canonical(value)?;
    candidates.iter().position(|c| {
        table.canonical(&c.value) == Some(key) || table.canonical(&c.label) == Some(key)
    })
}

/// The three graduation years a study year maps to, ascending.
///
/// For a program of `program_length` years, a student in year `n` graduates
/// around `current_year + (program_length + 1 - n)`; one year either side is
/// accepted to absorb academic-year boundaries.
pub fn graduation_year_window(study_year: u32, current_year: i32, program_length: u32) -> [i32; 3] {
    let base = current_year + (program_length as i32 + 1 - study_year as i32);
    [base - 1, base, base + 1]
}

/// Maps a year-of-study digit onto a list of graduation-year options.
///
/// Applies only when the value is a single digit within the program length and
/// every candidate is a four-digit year.
pub(crate) fn match_graduation_year<H>(
    candidates: &[OptionCandidate<H>],
    value: &str,
    current_year: i32,
    program_length: u32,
) -> Option<usize> {
    let value = value.trim();
    if value.len() != 1 {
        return None;
    }
    let study_year: u32 = value.parse().ok()?;
    if study_year < 1 || study_year > program_length {
        return None;
    }
    if candidates.is_empty() || !candidates.iter().all(is_year_option) {
        return None;
    }

    graduation_year_window(study_year, current_year, program_length)
        .iter()
        .find_map(|year| {
            let year = year.to_string();
            candidates
                .iter()
                .position(|c| c.value.trim() == year || c.search_text().contains(&year))
        })
}

fn is_year_option<H>(candidate: &OptionCandidate<H>) -> bool {
    let text = if candidate.value.trim().is_empty() {
        &candidate.label
    } else {
        &candidate.value
    };
    normalize(text)
        .split(' ')
        .next()
        .map_or(false, |t| t.len() == 4 && t.chars().all(|c| c.is_ascii_digit()))
}
