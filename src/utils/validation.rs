//! Validation utilities for transport boundaries
//!
//! The engine itself does not enforce these; HTTP or RPC layers call them
//! before handing input to the core.

use crate::reconciliation::scoring::MAX_SUGGESTION_LIMIT;
use crate::types::{ReconcileError, ReconcileResult};

/// Validate a caller-supplied suggestion limit
pub fn validate_suggestion_limit(limit: usize) -> ReconcileResult<()> {
    if limit < 1 || limit > MAX_SUGGESTION_LIMIT {
        return Err(ReconcileError::Validation(format!(
            "Suggestion limit must be between 1 and {}",
            MAX_SUGGESTION_LIMIT
        )));
    }
    Ok(())
}

/// Validate a transaction description
pub fn validate_description(description: &str) -> ReconcileResult<()> {
    if description.trim().is_empty() {
        return Err(ReconcileError::Validation(
            "Description cannot be empty".to_string(),
        ));
    }

    if description.len() > 500 {
        return Err(ReconcileError::Validation(
            "Description cannot exceed 500 characters".to_string(),
        ));
    }

    Ok(())
}

/// Validate an ISO 4217 currency code
pub fn validate_currency_code(code: &str) -> ReconcileResult<()> {
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_uppercase()) {
        return Err(ReconcileError::Validation(format!(
            "Currency code must be three uppercase letters, got '{}'",
            code
        )));
    }
    Ok(())
}
