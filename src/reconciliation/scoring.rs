//! Pure match scoring for suggestion ranking
//!
//! Scoring is deterministic, CPU-only, and side-effect free: an exact
//! amount gate followed by weighted date-proximity and
//! description-similarity contributions.

use crate::traits::SimilarityScorer;
use crate::types::{BankFeedTransaction, Transaction};

/// Inclusive day window, either side of the bank feed date, used to select
/// candidate ledger transactions
pub const DATE_WINDOW_DAYS: i64 = 7;

/// Number of suggestions returned when the caller does not specify a limit
pub const DEFAULT_SUGGESTION_LIMIT: usize = 5;

/// Upper bound transport layers should enforce on caller-supplied limits
pub const MAX_SUGGESTION_LIMIT: usize = 20;

const AMOUNT_SCORE: f64 = 0.40;
const CLOSE_DATE_SCORE: f64 = 0.40;
const NEAR_DATE_SCORE: f64 = 0.20;
const NEAR_IDENTICAL_DESCRIPTION_SCORE: f64 = 0.20;
const SIMILAR_DESCRIPTION_SCORE: f64 = 0.15;

const CLOSE_DATE_DAYS: i64 = 3;
const NEAR_IDENTICAL_SIMILARITY: f64 = 0.90;
const SIMILAR_SIMILARITY: f64 = 0.70;

/// Score of a surviving candidate: total confidence plus the reasons that
/// contributed, in amount, date, description order
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateScore {
    pub confidence: f64,
    pub reasons: Vec<String>,
}

/// Normalize a description before similarity comparison
///
/// Lowercases, replaces non-alphanumeric characters with spaces, collapses
/// runs of whitespace, and trims.
pub fn normalize_description(description: &str) -> String {
    let stripped: String = description
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Score one candidate ledger transaction against a bank feed transaction
///
/// Returns `None` when the amounts differ: amount equality is a hard gate,
/// not a weighted signal, and a non-matching candidate is discarded
/// outright. Confidence is the sum of the amount, date, and description
/// contributions, capped at 1.0 and rounded half-up to two decimals.
pub fn score_candidate(
    bank_feed_transaction: &BankFeedTransaction,
    candidate: &Transaction,
    scorer: &dyn SimilarityScorer,
) -> Option<CandidateScore> {
    // Exact integer-cents equality; amounts are never floats
    if bank_feed_transaction.amount_cents != candidate.amount_cents {
        return None;
    }

    let mut confidence = AMOUNT_SCORE;
    let mut reasons = vec!["Exact amount match".to_string()];

    let day_difference = (bank_feed_transaction.date - candidate.date).num_days().abs();
    if day_difference == 0 {
        confidence += CLOSE_DATE_SCORE;
        reasons.push("Same date".to_string());
    } else if day_difference <= CLOSE_DATE_DAYS {
        confidence += CLOSE_DATE_SCORE;
        reasons.push(within_days(day_difference));
    } else if day_difference <= DATE_WINDOW_DAYS {
        confidence += NEAR_DATE_SCORE;
        reasons.push(within_days(day_difference));
    }
    // Beyond the window there is no date contribution; the candidate query
    // should never produce such rows but the scorer tolerates them

    let similarity = scorer.similarity(
        &normalize_description(&bank_feed_transaction.description),
        &normalize_description(&candidate.description),
    );
    if similarity >= NEAR_IDENTICAL_SIMILARITY {
        confidence += NEAR_IDENTICAL_DESCRIPTION_SCORE;
        reasons.push("Description near-identical".to_string());
    } else if similarity >= SIMILAR_SIMILARITY {
        confidence += SIMILAR_DESCRIPTION_SCORE;
        reasons.push("Description similar".to_string());
    }

    Some(CandidateScore {
        confidence: round_confidence(confidence.min(1.0)),
        reasons,
    })
}

fn within_days(days: i64) -> String {
    if days == 1 {
        "Within 1 day".to_string()
    } else {
        format!("Within {} days", days)
    }
}

/// Round half-up on the hundredths digit
fn round_confidence(confidence: f64) -> f64 {
    (confidence * 100.0).round() / 100.0
}
