//! Traits for storage abstraction and pluggable similarity scoring

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::types::*;

/// Tenant-scoped storage abstraction for the reconciliation engine
///
/// This trait allows the engine to work with any storage backend
/// (PostgreSQL, MySQL, SQLite, in-memory, etc.) by implementing these
/// methods. Every method statically requires the caller's tenant id, so an
/// unscoped query cannot be expressed. Implementations resolve tenancy
/// transitively (account → entity → tenant), exclude soft-deleted rows,
/// and return `None` for rows outside the caller's tenant; the engine
/// turns all three cases into the same `NotFound`.
#[async_trait]
pub trait ReconciliationStore: Send + Sync {
    /// Get an account by ID
    async fn get_account(
        &self,
        tenant_id: Uuid,
        account_id: Uuid,
    ) -> ReconcileResult<Option<Account>>;

    /// Get a ledger transaction by ID
    async fn get_transaction(
        &self,
        tenant_id: Uuid,
        transaction_id: Uuid,
    ) -> ReconcileResult<Option<Transaction>>;

    /// Get a bank feed transaction by ID
    async fn get_bank_feed_transaction(
        &self,
        tenant_id: Uuid,
        bank_feed_transaction_id: Uuid,
    ) -> ReconcileResult<Option<BankFeedTransaction>>;

    /// Get a match record by ID
    async fn get_match(
        &self,
        tenant_id: Uuid,
        match_id: Uuid,
    ) -> ReconcileResult<Option<TransactionMatch>>;

    /// Find the match with the given status for a bank feed transaction
    async fn get_match_for_bank_feed_transaction(
        &self,
        tenant_id: Uuid,
        bank_feed_transaction_id: Uuid,
        status: MatchStatus,
    ) -> ReconcileResult<Option<TransactionMatch>>;

    /// Find the match with the given status for a ledger transaction
    async fn get_match_for_transaction(
        &self,
        tenant_id: Uuid,
        transaction_id: Uuid,
        status: MatchStatus,
    ) -> ReconcileResult<Option<TransactionMatch>>;

    /// List candidate ledger transactions for matching: same account, not
    /// soft-deleted, dated within the inclusive `[from, to]` window,
    /// ordered by date then creation time
    async fn list_candidate_transactions(
        &self,
        tenant_id: Uuid,
        account_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> ReconcileResult<Vec<Transaction>>;

    /// List ids of ledger transactions already consumed by a `Matched`
    /// record, across all of the tenant's accounts
    async fn list_matched_transaction_ids(&self, tenant_id: Uuid) -> ReconcileResult<Vec<Uuid>>;

    /// Count non-deleted bank feed transactions on an account, optionally
    /// restricted to one status
    async fn count_bank_feed_transactions(
        &self,
        tenant_id: Uuid,
        account_id: Uuid,
        status: Option<BankFeedStatus>,
    ) -> ReconcileResult<u64>;

    /// Count outstanding `Suggested` match rows attached to an account's
    /// bank feed transactions
    async fn count_suggested_matches(
        &self,
        tenant_id: Uuid,
        account_id: Uuid,
    ) -> ReconcileResult<u64>;

    /// Atomically insert a match record, set its bank feed transaction to
    /// `Posted`, and persist the audit record
    ///
    /// All three writes commit together or not at all. Implementations
    /// must fail with [`ReconcileError::Conflict`] when a `Matched` record
    /// already exists for either side of the pairing; SQL backends are
    /// expected to enforce this with partial unique indexes on
    /// `(bank_feed_transaction_id)` and `(transaction_id)` where the
    /// status is `Matched`.
    async fn create_match(
        &self,
        tenant_id: Uuid,
        record: &TransactionMatch,
        audit: &AuditRecord,
    ) -> ReconcileResult<()>;

    /// Atomically hard-delete a match record, reset its bank feed
    /// transaction to `Pending`, and persist the audit record
    async fn delete_match(
        &self,
        tenant_id: Uuid,
        match_id: Uuid,
        audit: &AuditRecord,
    ) -> ReconcileResult<()>;
}

/// Normalized string similarity used by the suggestion scorer
///
/// Implementations must be pure and symmetric and return a score in
/// [0, 1]. Inputs arrive already normalized (lowercased, punctuation
/// stripped, whitespace collapsed).
pub trait SimilarityScorer: Send + Sync {
    /// Similarity of two strings in [0, 1]
    fn similarity(&self, a: &str, b: &str) -> f64;
}

/// Default similarity scorer: Sørensen–Dice coefficient over character
/// bigrams
pub struct DiceSimilarity;

impl SimilarityScorer for DiceSimilarity {
    fn similarity(&self, a: &str, b: &str) -> f64 {
        if a == b {
            return 1.0;
        }

        let a_bigrams = bigram_counts(a);
        let b_bigrams = bigram_counts(b);
        if a_bigrams.is_empty() || b_bigrams.is_empty() {
            return 0.0;
        }

        let total: usize = a_bigrams.values().sum::<usize>() + b_bigrams.values().sum::<usize>();
        let overlap: usize = a_bigrams
            .iter()
            .filter_map(|(bigram, count)| b_bigrams.get(bigram).map(|other| (*count).min(*other)))
            .sum();

        (2.0 * overlap as f64) / total as f64
    }
}

fn bigram_counts(s: &str) -> HashMap<(char, char), usize> {
    let chars: Vec<char> = s.chars().collect();
    let mut counts = HashMap::new();
    for window in chars.windows(2) {
        *counts.entry((window[0], window[1])).or_insert(0) += 1;
    }
    counts
}
