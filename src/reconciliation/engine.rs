//! Reconciliation engine coordinating suggestion scoring, match creation,
//! unmatching, and status aggregation

use std::collections::HashSet;

use chrono::Duration;
use uuid::Uuid;

use crate::reconciliation::scoring::{self, DATE_WINDOW_DAYS, DEFAULT_SUGGESTION_LIMIT};
use crate::traits::*;
use crate::types::*;

const MATCH_MODEL: &str = "TransactionMatch";

/// Bank feed reconciliation engine
///
/// Owns suggestion scoring, manual match creation, unmatching, and status
/// aggregation over a tenant-scoped storage backend. The engine is
/// stateless between calls; concurrency safety is delegated to the store's
/// transactional guarantees.
pub struct ReconciliationEngine<S: ReconciliationStore> {
    store: S,
    scorer: Box<dyn SimilarityScorer>,
}

impl<S: ReconciliationStore> ReconciliationEngine<S> {
    /// Create a new engine with the default similarity scorer
    pub fn new(store: S) -> Self {
        Self {
            store,
            scorer: Box::new(DiceSimilarity),
        }
    }

    /// Create a new engine with a custom similarity scorer
    pub fn with_scorer(store: S, scorer: Box<dyn SimilarityScorer>) -> Self {
        Self { store, scorer }
    }

    /// Suggest ledger transactions likely to correspond to a bank feed
    /// transaction
    ///
    /// Candidates share the bank feed transaction's account and fall within
    /// a ±7 day window of its date; transactions already consumed by a
    /// `Matched` record are excluded. Surviving candidates are ranked by
    /// confidence, descending, and truncated to `limit` (default 5). An
    /// empty result is a successful outcome, not an error.
    pub async fn suggest_matches(
        &self,
        ctx: &TenantContext,
        bank_feed_transaction_id: Uuid,
        limit: Option<usize>,
    ) -> ReconcileResult<Vec<MatchSuggestion>> {
        let limit = limit.unwrap_or(DEFAULT_SUGGESTION_LIMIT);

        let bank_feed_transaction = self
            .store
            .get_bank_feed_transaction(ctx.tenant_id, bank_feed_transaction_id)
            .await?
            .ok_or_else(|| {
                ReconcileError::NotFound("Bank feed transaction not found".to_string())
            })?;

        if self
            .store
            .get_match_for_bank_feed_transaction(
                ctx.tenant_id,
                bank_feed_transaction_id,
                MatchStatus::Matched,
            )
            .await?
            .is_some()
        {
            return Err(ReconcileError::Conflict(
                "Bank feed transaction is already matched".to_string(),
            ));
        }

        let account = self
            .store
            .get_account(ctx.tenant_id, bank_feed_transaction.account_id)
            .await?
            .ok_or_else(|| ReconcileError::NotFound("Account not found".to_string()))?;

        let window = Duration::days(DATE_WINDOW_DAYS);
        let candidates = self
            .store
            .list_candidate_transactions(
                ctx.tenant_id,
                bank_feed_transaction.account_id,
                bank_feed_transaction.date - window,
                bank_feed_transaction.date + window,
            )
            .await?;

        // Exclusion set is a separate lookup, not a join, so the predicate
        // stays explicit and testable
        let matched_ids: HashSet<Uuid> = self
            .store
            .list_matched_transaction_ids(ctx.tenant_id)
            .await?
            .into_iter()
            .collect();

        let mut suggestions: Vec<MatchSuggestion> = candidates
            .iter()
            .filter(|candidate| !matched_ids.contains(&candidate.id))
            .filter_map(|candidate| {
                scoring::score_candidate(&bank_feed_transaction, candidate, self.scorer.as_ref())
                    .map(|score| MatchSuggestion {
                        transaction_id: candidate.id,
                        confidence: score.confidence,
                        reasons: score.reasons,
                        transaction: candidate.summary(&account.name),
                    })
            })
            .collect();

        // Stable sort keeps candidate-query order for equal confidences
        suggestions.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        suggestions.truncate(limit);

        tracing::debug!(
            "{} suggestion(s) for bank feed transaction {}",
            suggestions.len(),
            bank_feed_transaction_id
        );

        Ok(suggestions)
    }

    /// Manually match a bank feed transaction to a ledger transaction
    ///
    /// Inserts a full-confidence `Matched` record, marks the bank feed
    /// transaction `Posted`, and writes the audit trail, all in one atomic
    /// unit. Manual matches are always confidence 1.0 regardless of any
    /// previously displayed suggestion score.
    pub async fn create_match(
        &self,
        ctx: &TenantContext,
        bank_feed_transaction_id: Uuid,
        transaction_id: Uuid,
    ) -> ReconcileResult<MatchView> {
        let bank_feed_transaction = self
            .store
            .get_bank_feed_transaction(ctx.tenant_id, bank_feed_transaction_id)
            .await?
            .ok_or_else(|| {
                ReconcileError::NotFound("Bank feed transaction not found".to_string())
            })?;

        let transaction = self
            .store
            .get_transaction(ctx.tenant_id, transaction_id)
            .await?
            .ok_or_else(|| ReconcileError::NotFound("Transaction not found".to_string()))?;

        if self
            .store
            .get_match_for_bank_feed_transaction(
                ctx.tenant_id,
                bank_feed_transaction_id,
                MatchStatus::Matched,
            )
            .await?
            .is_some()
        {
            return Err(ReconcileError::Conflict(
                "Bank feed transaction is already matched".to_string(),
            ));
        }

        if self
            .store
            .get_match_for_transaction(ctx.tenant_id, transaction_id, MatchStatus::Matched)
            .await?
            .is_some()
        {
            return Err(ReconcileError::Conflict(
                "Transaction is already matched".to_string(),
            ));
        }

        let account = self
            .store
            .get_account(ctx.tenant_id, bank_feed_transaction.account_id)
            .await?
            .ok_or_else(|| ReconcileError::NotFound("Account not found".to_string()))?;

        let record = TransactionMatch::matched(bank_feed_transaction_id, transaction_id);
        let audit = AuditRecord::create(
            ctx,
            account.entity_id,
            MATCH_MODEL,
            record.id,
            serde_json::to_value(&record)
                .map_err(|e| ReconcileError::Storage(e.to_string()))?,
        );

        self.store.create_match(ctx.tenant_id, &record, &audit).await?;

        tracing::info!(
            "Matched bank feed transaction {} to transaction {}",
            bank_feed_transaction_id,
            transaction_id
        );

        let mut posted = bank_feed_transaction;
        posted.status = BankFeedStatus::Posted;

        Ok(MatchView {
            bank_feed_transaction: posted.summary(),
            transaction: transaction.summary(&account.name),
            record,
        })
    }

    /// Remove a confirmed match and return its bank feed transaction to the
    /// pending pool
    ///
    /// The match row is hard-deleted, the status reset and the audit record
    /// are committed atomically with it. No re-scoring happens here; callers
    /// re-invoke suggestion on demand.
    pub async fn unmatch(&self, ctx: &TenantContext, match_id: Uuid) -> ReconcileResult<()> {
        let record = self
            .store
            .get_match(ctx.tenant_id, match_id)
            .await?
            .ok_or_else(|| ReconcileError::NotFound("Match not found".to_string()))?;

        let bank_feed_transaction = self
            .store
            .get_bank_feed_transaction(ctx.tenant_id, record.bank_feed_transaction_id)
            .await?
            .ok_or_else(|| {
                ReconcileError::NotFound("Bank feed transaction not found".to_string())
            })?;

        let account = self
            .store
            .get_account(ctx.tenant_id, bank_feed_transaction.account_id)
            .await?
            .ok_or_else(|| ReconcileError::NotFound("Account not found".to_string()))?;

        let audit = AuditRecord::delete(
            ctx,
            account.entity_id,
            MATCH_MODEL,
            record.id,
            serde_json::to_value(&record)
                .map_err(|e| ReconcileError::Storage(e.to_string()))?,
        );

        self.store.delete_match(ctx.tenant_id, match_id, &audit).await?;

        tracing::info!(
            "Unmatched bank feed transaction {}",
            record.bank_feed_transaction_id
        );

        Ok(())
    }

    /// Aggregate reconciliation counts for an account
    ///
    /// An account with zero bank feed transactions reports 100 percent
    /// reconciled: an empty set is vacuously complete. The suggested count
    /// reads persisted `Suggested` rows, which an external suggestion
    /// pipeline may write; this engine never stores suggestions itself.
    pub async fn reconciliation_status(
        &self,
        ctx: &TenantContext,
        account_id: Uuid,
    ) -> ReconcileResult<ReconciliationStatus> {
        self.store
            .get_account(ctx.tenant_id, account_id)
            .await?
            .ok_or_else(|| ReconcileError::NotFound("Account not found".to_string()))?;

        let total = self
            .store
            .count_bank_feed_transactions(ctx.tenant_id, account_id, None)
            .await?;
        let matched = self
            .store
            .count_bank_feed_transactions(ctx.tenant_id, account_id, Some(BankFeedStatus::Posted))
            .await?;
        let suggested = self
            .store
            .count_suggested_matches(ctx.tenant_id, account_id)
            .await?;

        let reconciliation_percent = if total > 0 {
            ((matched as f64 / total as f64) * 100.0).round() as u32
        } else {
            100
        };

        Ok(ReconciliationStatus {
            total_bank_feed: total,
            matched,
            unmatched: total - matched,
            suggested,
            reconciliation_percent,
        })
    }
}
