//! Alternate spellings of a person's name for hyphenated and accented names.

use crate::core::models::NameVariant;
use std::collections::HashSet;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Strips diacritics: canonical decomposition, then drop combining marks ("María" -> "Maria").
fn fold_accents(value: &str) -> String {
    value.nfd().filter(|c| !is_combining_mark(*c)).collect()
}

/// Generates the name variants to expand into address patterns.
///
/// Order is significant (first generated wins on duplicates):
/// 1. the name as given
/// 2. hyphens removed from the first name ("Jean-Pierre" -> "JeanPierre")
/// 3. only the first hyphen segment of the first name ("Jean-Pierre" -> "Jean")
/// 4. both names accent-folded, only when either contains non-ASCII characters
///
/// No case normalization happens here.
pub(crate) fn generate_name_variants(first: &str, last: &str) -> Vec<NameVariant> {
    let mut candidates = vec![
        NameVariant::new(first, last),
        NameVariant::new(first.replace('-', ""), last),
        NameVariant::new(first.split('-').next().unwrap_or(first), last),
    ];

    if !first.is_ascii() || !last.is_ascii() {
        candidates.push(NameVariant::new(fold_accents(first), fold_accents(last)));
    }

    let mut seen = HashSet::new();
    candidates.retain(|variant| seen.insert(variant.clone()));

    tracing::trace!(target: "search_task", "Name variants for '{} {}': {:?}", first, last, candidates);
    candidates
}
