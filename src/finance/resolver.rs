//! Fuzzy category resolution
//!
//! Typed category names are matched against the user's declared categories of
//! the same kind. Similarity is the normalized Levenshtein ratio of the
//! lowercased strings; the best candidate at or above the cutoff wins.

use rusqlite::Connection;

use crate::core::config;
use crate::core::error::AppResult;
use crate::core::types::TxKind;
use crate::storage::categories;

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Category found; `corrected` is true when the stored name differs from the input
    Matched { category: String, corrected: bool },
    /// No confident match; `options` are the user's categories of that kind
    Unresolved { options: Vec<String> },
}

/// Similarity in `0.0..=1.0`, case-insensitive
pub fn similarity(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(&a.to_lowercase(), &b.to_lowercase())
}

/// Best candidate with similarity >= `cutoff`. Earlier candidates win ties.
pub fn best_match<'a>(input: &str, candidates: &'a [String], cutoff: f64) -> Option<&'a str> {
    let mut best: Option<(&'a str, f64)> = None;
    for candidate in candidates {
        let score = similarity(input, candidate);
        if score < cutoff {
            continue;
        }
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((candidate.as_str(), score));
        }
    }
    best.map(|(name, _)| name)
}

/// Resolves `input` among the user's categories of `kind`.
pub fn resolve_category(conn: &Connection, user_id: i64, input: &str, kind: TxKind) -> AppResult<Resolution> {
    let options = categories::category_names(conn, user_id, Some(kind))?;

    match best_match(input, &options, config::matching::FUZZY_CUTOFF) {
        Some(found) => {
            let corrected = found.to_lowercase() != input.to_lowercase();
            log::debug!("Category '{}' resolved to '{}' for user {}", input, found, user_id);
            Ok(Resolution::Matched {
                category: found.to_string(),
                corrected,
            })
        }
        None => Ok(Resolution::Unresolved { options }),
    }
}
