//! In-memory storage implementation for testing

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::traits::ReconciliationStore;
use crate::types::*;

#[derive(Debug, Default)]
struct State {
    entities: HashMap<Uuid, LedgerEntity>,
    accounts: HashMap<Uuid, Account>,
    transactions: HashMap<Uuid, Transaction>,
    bank_feed_transactions: HashMap<Uuid, BankFeedTransaction>,
    matches: HashMap<Uuid, TransactionMatch>,
    audit_log: Vec<AuditRecord>,
}

impl State {
    /// Resolve an account to its tenant through the owning entity
    fn account_in_tenant(&self, account_id: Uuid, tenant_id: Uuid) -> Option<&Account> {
        let account = self.accounts.get(&account_id)?;
        if account.deleted_at.is_some() {
            return None;
        }
        let entity = self.entities.get(&account.entity_id)?;
        (entity.tenant_id == tenant_id).then_some(account)
    }

    fn transaction_in_tenant(&self, transaction_id: Uuid, tenant_id: Uuid) -> Option<&Transaction> {
        let transaction = self.transactions.get(&transaction_id)?;
        if transaction.deleted_at.is_some() {
            return None;
        }
        self.account_in_tenant(transaction.account_id, tenant_id)?;
        Some(transaction)
    }

    fn bank_feed_in_tenant(
        &self,
        bank_feed_transaction_id: Uuid,
        tenant_id: Uuid,
    ) -> Option<&BankFeedTransaction> {
        let transaction = self.bank_feed_transactions.get(&bank_feed_transaction_id)?;
        if transaction.deleted_at.is_some() {
            return None;
        }
        self.account_in_tenant(transaction.account_id, tenant_id)?;
        Some(transaction)
    }

    /// Matches resolve tenancy through their bank feed transaction
    fn match_in_tenant(&self, match_id: Uuid, tenant_id: Uuid) -> Option<&TransactionMatch> {
        let record = self.matches.get(&match_id)?;
        self.bank_feed_in_tenant(record.bank_feed_transaction_id, tenant_id)?;
        Some(record)
    }

    fn has_matched_record_for_bank_feed(&self, bank_feed_transaction_id: Uuid) -> bool {
        self.matches.values().any(|m| {
            m.bank_feed_transaction_id == bank_feed_transaction_id
                && m.status == MatchStatus::Matched
        })
    }

    fn has_matched_record_for_transaction(&self, transaction_id: Uuid) -> bool {
        self.matches
            .values()
            .any(|m| m.transaction_id == transaction_id && m.status == MatchStatus::Matched)
    }
}

/// In-memory storage implementation for testing and development
///
/// A single lock guards the whole state, so the composite write operations
/// hold it for their full extent and are genuinely all-or-nothing, the same
/// contract a SQL backend provides with a transaction.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    state: Arc<RwLock<State>>,
}

impl MemoryStorage {
    /// Create a new memory storage instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all data (useful for testing)
    pub fn clear(&self) {
        *self.state.write().unwrap() = State::default();
    }

    /// Seed an entity
    pub fn insert_entity(&self, entity: LedgerEntity) {
        self.state.write().unwrap().entities.insert(entity.id, entity);
    }

    /// Seed an account
    pub fn insert_account(&self, account: Account) {
        self.state.write().unwrap().accounts.insert(account.id, account);
    }

    /// Seed a ledger transaction
    pub fn insert_transaction(&self, transaction: Transaction) {
        self.state
            .write()
            .unwrap()
            .transactions
            .insert(transaction.id, transaction);
    }

    /// Seed a bank feed transaction
    pub fn insert_bank_feed_transaction(&self, transaction: BankFeedTransaction) {
        self.state
            .write()
            .unwrap()
            .bank_feed_transactions
            .insert(transaction.id, transaction);
    }

    /// Seed a match record directly, bypassing the engine
    pub fn insert_match(&self, record: TransactionMatch) {
        self.state.write().unwrap().matches.insert(record.id, record);
    }

    /// Snapshot of the audit log, oldest first
    pub fn audit_records(&self) -> Vec<AuditRecord> {
        self.state.read().unwrap().audit_log.clone()
    }
}

#[async_trait]
impl ReconciliationStore for MemoryStorage {
    async fn get_account(
        &self,
        tenant_id: Uuid,
        account_id: Uuid,
    ) -> ReconcileResult<Option<Account>> {
        let state = self.state.read().unwrap();
        Ok(state.account_in_tenant(account_id, tenant_id).cloned())
    }

    async fn get_transaction(
        &self,
        tenant_id: Uuid,
        transaction_id: Uuid,
    ) -> ReconcileResult<Option<Transaction>> {
        let state = self.state.read().unwrap();
        Ok(state.transaction_in_tenant(transaction_id, tenant_id).cloned())
    }

    async fn get_bank_feed_transaction(
        &self,
        tenant_id: Uuid,
        bank_feed_transaction_id: Uuid,
    ) -> ReconcileResult<Option<BankFeedTransaction>> {
        let state = self.state.read().unwrap();
        Ok(state
            .bank_feed_in_tenant(bank_feed_transaction_id, tenant_id)
            .cloned())
    }

    async fn get_match(
        &self,
        tenant_id: Uuid,
        match_id: Uuid,
    ) -> ReconcileResult<Option<TransactionMatch>> {
        let state = self.state.read().unwrap();
        Ok(state.match_in_tenant(match_id, tenant_id).cloned())
    }

    async fn get_match_for_bank_feed_transaction(
        &self,
        tenant_id: Uuid,
        bank_feed_transaction_id: Uuid,
        status: MatchStatus,
    ) -> ReconcileResult<Option<TransactionMatch>> {
        let state = self.state.read().unwrap();
        if state
            .bank_feed_in_tenant(bank_feed_transaction_id, tenant_id)
            .is_none()
        {
            return Ok(None);
        }
        Ok(state
            .matches
            .values()
            .find(|m| {
                m.bank_feed_transaction_id == bank_feed_transaction_id && m.status == status
            })
            .cloned())
    }

    async fn get_match_for_transaction(
        &self,
        tenant_id: Uuid,
        transaction_id: Uuid,
        status: MatchStatus,
    ) -> ReconcileResult<Option<TransactionMatch>> {
        let state = self.state.read().unwrap();
        if state.transaction_in_tenant(transaction_id, tenant_id).is_none() {
            return Ok(None);
        }
        Ok(state
            .matches
            .values()
            .find(|m| m.transaction_id == transaction_id && m.status == status)
            .cloned())
    }

    async fn list_candidate_transactions(
        &self,
        tenant_id: Uuid,
        account_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> ReconcileResult<Vec<Transaction>> {
        let state = self.state.read().unwrap();
        if state.account_in_tenant(account_id, tenant_id).is_none() {
            return Ok(Vec::new());
        }
        let mut candidates: Vec<Transaction> = state
            .transactions
            .values()
            .filter(|t| {
                t.account_id == account_id
                    && t.deleted_at.is_none()
                    && t.date >= from
                    && t.date <= to
            })
            .cloned()
            .collect();
        candidates.sort_by(|a, b| (a.date, a.created_at).cmp(&(b.date, b.created_at)));
        Ok(candidates)
    }

    async fn list_matched_transaction_ids(&self, tenant_id: Uuid) -> ReconcileResult<Vec<Uuid>> {
        let state = self.state.read().unwrap();
        Ok(state
            .matches
            .values()
            .filter(|m| {
                m.status == MatchStatus::Matched
                    && state
                        .bank_feed_in_tenant(m.bank_feed_transaction_id, tenant_id)
                        .is_some()
            })
            .map(|m| m.transaction_id)
            .collect())
    }

    async fn count_bank_feed_transactions(
        &self,
        tenant_id: Uuid,
        account_id: Uuid,
        status: Option<BankFeedStatus>,
    ) -> ReconcileResult<u64> {
        let state = self.state.read().unwrap();
        if state.account_in_tenant(account_id, tenant_id).is_none() {
            return Ok(0);
        }
        Ok(state
            .bank_feed_transactions
            .values()
            .filter(|t| {
                t.account_id == account_id
                    && t.deleted_at.is_none()
                    && status.is_none_or(|s| t.status == s)
            })
            .count() as u64)
    }

    async fn count_suggested_matches(
        &self,
        tenant_id: Uuid,
        account_id: Uuid,
    ) -> ReconcileResult<u64> {
        let state = self.state.read().unwrap();
        if state.account_in_tenant(account_id, tenant_id).is_none() {
            return Ok(0);
        }
        Ok(state
            .matches
            .values()
            .filter(|m| {
                m.status == MatchStatus::Suggested
                    && state
                        .bank_feed_transactions
                        .get(&m.bank_feed_transaction_id)
                        .is_some_and(|t| t.account_id == account_id && t.deleted_at.is_none())
            })
            .count() as u64)
    }

    async fn create_match(
        &self,
        tenant_id: Uuid,
        record: &TransactionMatch,
        audit: &AuditRecord,
    ) -> ReconcileResult<()> {
        let mut state = self.state.write().unwrap();

        let bank_feed = state
            .bank_feed_in_tenant(record.bank_feed_transaction_id, tenant_id)
            .cloned()
            .ok_or_else(|| {
                ReconcileError::NotFound("Bank feed transaction not found".to_string())
            })?;
        if state
            .transaction_in_tenant(record.transaction_id, tenant_id)
            .is_none()
        {
            return Err(ReconcileError::NotFound("Transaction not found".to_string()));
        }

        // Uniqueness is enforced under the write lock, closing the
        // read-then-write race between concurrent callers
        if state.has_matched_record_for_bank_feed(record.bank_feed_transaction_id) {
            return Err(ReconcileError::Conflict(
                "Bank feed transaction is already matched".to_string(),
            ));
        }
        if state.has_matched_record_for_transaction(record.transaction_id) {
            return Err(ReconcileError::Conflict(
                "Transaction is already matched".to_string(),
            ));
        }

        let mut posted = bank_feed;
        posted.status = BankFeedStatus::Posted;
        posted.updated_at = chrono::Utc::now().naive_utc();

        state.matches.insert(record.id, record.clone());
        state.bank_feed_transactions.insert(posted.id, posted);
        state.audit_log.push(audit.clone());
        Ok(())
    }

    async fn delete_match(
        &self,
        tenant_id: Uuid,
        match_id: Uuid,
        audit: &AuditRecord,
    ) -> ReconcileResult<()> {
        let mut state = self.state.write().unwrap();

        let record = state
            .match_in_tenant(match_id, tenant_id)
            .cloned()
            .ok_or_else(|| ReconcileError::NotFound("Match not found".to_string()))?;

        let mut pending = state
            .bank_feed_transactions
            .get(&record.bank_feed_transaction_id)
            .cloned()
            .ok_or_else(|| {
                ReconcileError::NotFound("Bank feed transaction not found".to_string())
            })?;
        pending.status = BankFeedStatus::Pending;
        pending.updated_at = chrono::Utc::now().naive_utc();

        state.matches.remove(&match_id);
        state.bank_feed_transactions.insert(pending.id, pending);
        state.audit_log.push(audit.clone());
        Ok(())
    }
}
