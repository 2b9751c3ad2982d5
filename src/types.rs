//! Core types and data structures for bank feed reconciliation

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of an imported bank feed transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BankFeedStatus {
    /// Awaiting reconciliation against the ledger
    Pending,
    /// Confirmed against a ledger transaction through a match
    Posted,
}

/// Status of a transaction match record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchStatus {
    /// A persisted candidate pairing awaiting confirmation
    Suggested,
    /// A confirmed pairing
    Matched,
}

/// Caller identity resolved by the authentication layer
///
/// Every engine operation requires one; the tenant id scopes all storage
/// access and the user id is recorded on audit entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantContext {
    pub tenant_id: Uuid,
    pub user_id: Uuid,
}

impl TenantContext {
    /// Create a new tenant context
    pub fn new(tenant_id: Uuid, user_id: Uuid) -> Self {
        Self { tenant_id, user_id }
    }
}

/// Legal entity owning a set of accounts
///
/// The middle link of the account → entity → tenant isolation chain.
/// Storage implementations resolve tenancy through this chain instead of
/// denormalizing a tenant id onto every row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntity {
    /// Unique identifier for the entity
    pub id: Uuid,
    /// Tenant that owns the entity
    pub tenant_id: Uuid,
    /// Human-readable entity name
    pub name: String,
    /// When the entity was created
    pub created_at: NaiveDateTime,
}

impl LedgerEntity {
    /// Create a new entity under a tenant
    pub fn new(tenant_id: Uuid, name: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            tenant_id,
            name,
            created_at: chrono::Utc::now().naive_utc(),
        }
    }
}

/// A financial account holding ledger and bank feed transactions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier for the account
    pub id: Uuid,
    /// Entity that owns the account
    pub entity_id: Uuid,
    /// Human-readable account name
    pub name: String,
    /// ISO 4217 currency code
    pub currency: String,
    /// Soft-delete marker; a set value excludes the row from every finder
    pub deleted_at: Option<NaiveDateTime>,
    /// When the account was created
    pub created_at: NaiveDateTime,
    /// When the account was last updated
    pub updated_at: NaiveDateTime,
}

impl Account {
    /// Create a new account under an entity
    pub fn new(entity_id: Uuid, name: String, currency: String) -> Self {
        let now = chrono::Utc::now().naive_utc();
        Self {
            id: Uuid::new_v4(),
            entity_id,
            name,
            currency,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// An internally recorded ledger-side transaction
///
/// Amounts are signed integers in minor currency units (cents); the crate
/// never represents money as floating point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique identifier for the transaction
    pub id: Uuid,
    /// Account the transaction belongs to
    pub account_id: Uuid,
    /// Date when the transaction occurred
    pub date: NaiveDate,
    /// Description of the transaction
    pub description: String,
    /// Signed amount in minor currency units
    pub amount_cents: i64,
    /// ISO 4217 currency code
    pub currency: String,
    /// Soft-delete marker
    pub deleted_at: Option<NaiveDateTime>,
    /// When the transaction was created
    pub created_at: NaiveDateTime,
    /// When the transaction was last updated
    pub updated_at: NaiveDateTime,
}

impl Transaction {
    /// Create a new ledger transaction
    pub fn new(
        account_id: Uuid,
        date: NaiveDate,
        description: String,
        amount_cents: i64,
        currency: String,
    ) -> Self {
        let now = chrono::Utc::now().naive_utc();
        Self {
            id: Uuid::new_v4(),
            account_id,
            date,
            description,
            amount_cents,
            currency,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Denormalized display snapshot of this transaction
    pub fn summary(&self, account_name: &str) -> TransactionSummary {
        TransactionSummary {
            id: self.id,
            date: self.date,
            description: self.description.clone(),
            amount_cents: self.amount_cents,
            currency: self.currency.clone(),
            account_id: self.account_id,
            account_name: account_name.to_string(),
        }
    }
}

/// An externally imported bank movement awaiting reconciliation
///
/// Immutable once imported apart from its status; never hard-deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankFeedTransaction {
    /// Unique identifier for the bank feed transaction
    pub id: Uuid,
    /// Account the movement was imported into
    pub account_id: Uuid,
    /// Identifier assigned by the external bank feed
    pub external_id: String,
    /// Calendar day the movement occurred
    pub date: NaiveDate,
    /// Free-text description from the bank
    pub description: String,
    /// Signed amount in minor currency units
    pub amount_cents: i64,
    /// ISO 4217 currency code
    pub currency: String,
    /// Reconciliation status
    pub status: BankFeedStatus,
    /// Soft-delete marker
    pub deleted_at: Option<NaiveDateTime>,
    /// When the row was imported
    pub created_at: NaiveDateTime,
    /// When the row was last updated
    pub updated_at: NaiveDateTime,
}

impl BankFeedTransaction {
    /// Create a new pending bank feed transaction
    pub fn new(
        account_id: Uuid,
        external_id: String,
        date: NaiveDate,
        description: String,
        amount_cents: i64,
        currency: String,
    ) -> Self {
        let now = chrono::Utc::now().naive_utc();
        Self {
            id: Uuid::new_v4(),
            account_id,
            external_id,
            date,
            description,
            amount_cents,
            currency,
            status: BankFeedStatus::Pending,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Denormalized display snapshot of this bank feed transaction
    pub fn summary(&self) -> BankFeedSummary {
        BankFeedSummary {
            id: self.id,
            external_id: self.external_id.clone(),
            date: self.date,
            description: self.description.clone(),
            amount_cents: self.amount_cents,
            currency: self.currency.clone(),
            status: self.status,
        }
    }
}

/// Link record pairing one bank feed transaction to one ledger transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionMatch {
    /// Unique identifier for the match
    pub id: Uuid,
    /// Bank feed transaction side of the pairing
    pub bank_feed_transaction_id: Uuid,
    /// Ledger transaction side of the pairing
    pub transaction_id: Uuid,
    /// Suggested or confirmed
    pub status: MatchStatus,
    /// Confidence in [0, 1]; manual matches are always 1.0
    pub confidence: f64,
    /// When the match was created
    pub created_at: NaiveDateTime,
    /// When the match was last updated
    pub updated_at: NaiveDateTime,
}

impl TransactionMatch {
    /// Create a confirmed, full-confidence match
    pub fn matched(bank_feed_transaction_id: Uuid, transaction_id: Uuid) -> Self {
        let now = chrono::Utc::now().naive_utc();
        Self {
            id: Uuid::new_v4(),
            bank_feed_transaction_id,
            transaction_id,
            status: MatchStatus::Matched,
            confidence: 1.0,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Action recorded on an audit entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditAction {
    Create,
    Delete,
}

/// Structured before/after record persisted alongside a mutating write
///
/// The record is handed to the storage layer together with the writes it
/// describes and committed in the same transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub tenant_id: Uuid,
    pub user_id: Uuid,
    /// Entity owning the affected rows
    pub entity_id: Uuid,
    /// Model name of the affected record
    pub model: String,
    /// Identifier of the affected record
    pub record_id: Uuid,
    pub action: AuditAction,
    /// Snapshot before the write, absent on creation
    pub before: Option<serde_json::Value>,
    /// Snapshot after the write, absent on deletion
    pub after: Option<serde_json::Value>,
    pub created_at: NaiveDateTime,
}

impl AuditRecord {
    /// Audit entry for a record creation
    pub fn create(
        ctx: &TenantContext,
        entity_id: Uuid,
        model: &str,
        record_id: Uuid,
        after: serde_json::Value,
    ) -> Self {
        Self {
            tenant_id: ctx.tenant_id,
            user_id: ctx.user_id,
            entity_id,
            model: model.to_string(),
            record_id,
            action: AuditAction::Create,
            before: None,
            after: Some(after),
            created_at: chrono::Utc::now().naive_utc(),
        }
    }

    /// Audit entry for a record deletion
    pub fn delete(
        ctx: &TenantContext,
        entity_id: Uuid,
        model: &str,
        record_id: Uuid,
        before: serde_json::Value,
    ) -> Self {
        Self {
            tenant_id: ctx.tenant_id,
            user_id: ctx.user_id,
            entity_id,
            model: model.to_string(),
            record_id,
            action: AuditAction::Delete,
            before: Some(before),
            after: None,
            created_at: chrono::Utc::now().naive_utc(),
        }
    }
}

/// Display snapshot of a ledger transaction, denormalized so callers can
/// render suggestions without a second fetch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionSummary {
    pub id: Uuid,
    pub date: NaiveDate,
    pub description: String,
    pub amount_cents: i64,
    pub currency: String,
    pub account_id: Uuid,
    pub account_name: String,
}

/// Display snapshot of a bank feed transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankFeedSummary {
    pub id: Uuid,
    pub external_id: String,
    pub date: NaiveDate,
    pub description: String,
    pub amount_cents: i64,
    pub currency: String,
    pub status: BankFeedStatus,
}

/// A scored suggestion produced for one candidate ledger transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchSuggestion {
    /// Candidate ledger transaction
    pub transaction_id: Uuid,
    /// Confidence in [0, 1], rounded to two decimals
    pub confidence: f64,
    /// Human-readable contributions, in amount, date, description order
    pub reasons: Vec<String>,
    /// Snapshot of the candidate for display
    pub transaction: TransactionSummary,
}

/// A created match together with both sides of the pairing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchView {
    pub record: TransactionMatch,
    pub bank_feed_transaction: BankFeedSummary,
    pub transaction: TransactionSummary,
}

/// Aggregate reconciliation counts for one account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationStatus {
    /// Non-deleted bank feed transactions on the account
    pub total_bank_feed: u64,
    /// Bank feed transactions that reached `Posted`
    pub matched: u64,
    /// Bank feed transactions still `Pending`
    pub unmatched: u64,
    /// Outstanding persisted `Suggested` match rows
    pub suggested: u64,
    /// Share of matched bank feed transactions; 100 for an empty account
    pub reconciliation_percent: u32,
}

/// Errors that can occur in the reconciliation engine
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error("Storage error: {0}")]
    Storage(String),
    /// Referenced record absent, soft-deleted, or outside the caller's
    /// tenant; the three causes are indistinguishable to callers
    #[error("{0}")]
    NotFound(String),
    /// The operation would violate the one-`Matched`-record-per-side rule
    #[error("{0}")]
    Conflict(String),
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type for reconciliation operations
pub type ReconcileResult<T> = Result<T, ReconcileError>;
