//! Integration tests for reconciliation-core

use chrono::NaiveDate;
use reconciliation_core::utils::MemoryStorage;
use reconciliation_core::{
    Account, BankFeedStatus, BankFeedTransaction, LedgerEntity, MatchStatus, ReconcileError,
    ReconciliationEngine, ReconciliationStore, SimilarityScorer, TenantContext, Transaction,
};
use uuid::Uuid;

/// Similarity collaborator returning a fixed score
struct StubSimilarity(f64);

impl SimilarityScorer for StubSimilarity {
    fn similarity(&self, _a: &str, _b: &str) -> f64 {
        self.0
    }
}

struct Tenant {
    ctx: TenantContext,
    account: Account,
}

fn seed_tenant(storage: &MemoryStorage, account_name: &str) -> Tenant {
    let ctx = TenantContext::new(Uuid::new_v4(), Uuid::new_v4());
    let entity = LedgerEntity::new(ctx.tenant_id, format!("{} Holdings", account_name));
    let account = Account::new(entity.id, account_name.to_string(), "USD".to_string());
    storage.insert_entity(entity);
    storage.insert_account(account.clone());
    Tenant { ctx, account }
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
}

fn seed_bank_feed(
    storage: &MemoryStorage,
    account_id: Uuid,
    amount_cents: i64,
    date: NaiveDate,
    description: &str,
) -> BankFeedTransaction {
    let txn = BankFeedTransaction::new(
        account_id,
        format!("ext-{}", Uuid::new_v4()),
        date,
        description.to_string(),
        amount_cents,
        "USD".to_string(),
    );
    storage.insert_bank_feed_transaction(txn.clone());
    txn
}

fn seed_transaction(
    storage: &MemoryStorage,
    account_id: Uuid,
    amount_cents: i64,
    date: NaiveDate,
    description: &str,
) -> Transaction {
    let txn = Transaction::new(
        account_id,
        date,
        description.to_string(),
        amount_cents,
        "USD".to_string(),
    );
    storage.insert_transaction(txn.clone());
    txn
}

#[tokio::test]
async fn test_complete_reconciliation_workflow() {
    let storage = MemoryStorage::new();
    let tenant = seed_tenant(&storage, "Business Checking");
    let engine =
        ReconciliationEngine::with_scorer(storage.clone(), Box::new(StubSimilarity(0.95)));

    // An imported coffee purchase and two ledger-side candidates
    let bank = seed_bank_feed(&storage, tenant.account.id, 550, day(15), "STARBUCKS #1234");
    let exact = seed_transaction(
        &storage,
        tenant.account.id,
        550,
        day(15),
        "Coffee shop purchase",
    );
    seed_transaction(&storage, tenant.account.id, 550, day(20), "Another coffee");

    // Suggestion pass ranks the same-day candidate first at full confidence
    let suggestions = engine
        .suggest_matches(&tenant.ctx, bank.id, None)
        .await
        .unwrap();
    assert_eq!(suggestions.len(), 2);
    assert_eq!(suggestions[0].transaction_id, exact.id);
    assert_eq!(suggestions[0].confidence, 1.0);
    assert_eq!(
        suggestions[0].reasons,
        vec!["Exact amount match", "Same date", "Description near-identical"]
    );
    assert_eq!(suggestions[1].confidence, 0.80);

    // Confirm the top suggestion manually
    let view = engine
        .create_match(&tenant.ctx, bank.id, exact.id)
        .await
        .unwrap();
    assert_eq!(view.record.status, MatchStatus::Matched);
    assert_eq!(view.record.confidence, 1.0);
    assert_eq!(view.bank_feed_transaction.status, BankFeedStatus::Posted);

    // Status reflects the confirmed match
    let status = engine
        .reconciliation_status(&tenant.ctx, tenant.account.id)
        .await
        .unwrap();
    assert_eq!(status.total_bank_feed, 1);
    assert_eq!(status.matched, 1);
    assert_eq!(status.unmatched, 0);
    assert_eq!(status.reconciliation_percent, 100);

    // Unmatch returns the bank feed transaction to the pending pool
    engine.unmatch(&tenant.ctx, view.record.id).await.unwrap();

    let status = engine
        .reconciliation_status(&tenant.ctx, tenant.account.id)
        .await
        .unwrap();
    assert_eq!(status.matched, 0);
    assert_eq!(status.unmatched, 1);
    assert_eq!(status.reconciliation_percent, 0);

    // The full cycle produced a create and a delete audit entry
    let audit = storage.audit_records();
    assert_eq!(audit.len(), 2);
}

#[tokio::test]
async fn test_match_and_status_stay_consistent() {
    let storage = MemoryStorage::new();
    let tenant = seed_tenant(&storage, "Checking");
    let engine = ReconciliationEngine::new(storage.clone());

    let bank = seed_bank_feed(&storage, tenant.account.id, 1200, day(3), "Rent");
    let ledger = seed_transaction(&storage, tenant.account.id, 1200, day(3), "Rent");

    let view = engine
        .create_match(&tenant.ctx, bank.id, ledger.id)
        .await
        .unwrap();

    // The match row and the Posted status are visible together
    let refetched = storage
        .get_bank_feed_transaction(tenant.ctx.tenant_id, bank.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(refetched.status, BankFeedStatus::Posted);
    assert!(storage
        .get_match(tenant.ctx.tenant_id, view.record.id)
        .await
        .unwrap()
        .is_some());

    // And disappear together after unmatch
    engine.unmatch(&tenant.ctx, view.record.id).await.unwrap();
    let refetched = storage
        .get_bank_feed_transaction(tenant.ctx.tenant_id, bank.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(refetched.status, BankFeedStatus::Pending);
    assert!(storage
        .get_match(tenant.ctx.tenant_id, view.record.id)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_tenant_isolation() {
    let storage = MemoryStorage::new();
    let alpha = seed_tenant(&storage, "Alpha Checking");
    let beta = seed_tenant(&storage, "Beta Checking");
    let engine = ReconciliationEngine::new(storage.clone());

    let alpha_bank = seed_bank_feed(&storage, alpha.account.id, 500, day(10), "Supplies");
    let alpha_txn = seed_transaction(&storage, alpha.account.id, 500, day(10), "Supplies");

    // Beta cannot see alpha's bank feed transaction, account, or match
    let err = engine
        .suggest_matches(&beta.ctx, alpha_bank.id, None)
        .await
        .unwrap_err();
    assert!(matches!(err, ReconcileError::NotFound(_)));

    let err = engine
        .reconciliation_status(&beta.ctx, alpha.account.id)
        .await
        .unwrap_err();
    assert!(matches!(err, ReconcileError::NotFound(_)));

    let view = engine
        .create_match(&alpha.ctx, alpha_bank.id, alpha_txn.id)
        .await
        .unwrap();
    let err = engine.unmatch(&beta.ctx, view.record.id).await.unwrap_err();
    assert_eq!(err.to_string(), "Match not found");

    // Alpha's view is unaffected by the failed foreign-tenant calls
    let status = engine
        .reconciliation_status(&alpha.ctx, alpha.account.id)
        .await
        .unwrap();
    assert_eq!(status.matched, 1);
}

#[tokio::test]
async fn test_soft_deleted_rows_are_invisible() {
    let storage = MemoryStorage::new();
    let tenant = seed_tenant(&storage, "Checking");
    let engine = ReconciliationEngine::new(storage.clone());

    let bank = seed_bank_feed(&storage, tenant.account.id, 700, day(12), "Fuel");
    let mut deleted = Transaction::new(
        tenant.account.id,
        day(12),
        "Fuel".to_string(),
        700,
        "USD".to_string(),
    );
    deleted.deleted_at = Some(chrono::Utc::now().naive_utc());
    storage.insert_transaction(deleted.clone());

    // The deleted candidate neither appears in suggestions nor matches
    let suggestions = engine
        .suggest_matches(&tenant.ctx, bank.id, None)
        .await
        .unwrap();
    assert!(suggestions.is_empty());

    let err = engine
        .create_match(&tenant.ctx, bank.id, deleted.id)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Transaction not found");

    // A soft-deleted bank feed transaction is invisible too
    let mut gone = seed_bank_feed(&storage, tenant.account.id, 100, day(1), "Old");
    gone.deleted_at = Some(chrono::Utc::now().naive_utc());
    storage.insert_bank_feed_transaction(gone.clone());

    let err = engine
        .suggest_matches(&tenant.ctx, gone.id, None)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Bank feed transaction not found");

    let status = engine
        .reconciliation_status(&tenant.ctx, tenant.account.id)
        .await
        .unwrap();
    assert_eq!(status.total_bank_feed, 1);
}

#[tokio::test]
async fn test_matched_transaction_never_suggested_again() {
    let storage = MemoryStorage::new();
    let tenant = seed_tenant(&storage, "Checking");
    let engine = ReconciliationEngine::new(storage.clone());

    let first_bank = seed_bank_feed(&storage, tenant.account.id, 550, day(15), "Coffee");
    let second_bank = seed_bank_feed(&storage, tenant.account.id, 550, day(16), "Coffee");
    let ledger = seed_transaction(&storage, tenant.account.id, 550, day(15), "Coffee");

    engine
        .create_match(&tenant.ctx, first_bank.id, ledger.id)
        .await
        .unwrap();

    let suggestions = engine
        .suggest_matches(&tenant.ctx, second_bank.id, None)
        .await
        .unwrap();
    assert!(suggestions.is_empty());
}

#[tokio::test]
async fn test_store_rejects_double_match_under_lock() {
    let storage = MemoryStorage::new();
    let tenant = seed_tenant(&storage, "Checking");
    let engine = ReconciliationEngine::new(storage.clone());

    let bank = seed_bank_feed(&storage, tenant.account.id, 550, day(15), "Coffee");
    let ledger = seed_transaction(&storage, tenant.account.id, 550, day(15), "Coffee");
    engine
        .create_match(&tenant.ctx, bank.id, ledger.id)
        .await
        .unwrap();

    // Drive the store directly, as a racing writer that passed the engine's
    // pre-checks would; the composite write itself must refuse
    let racing = reconciliation_core::TransactionMatch::matched(bank.id, ledger.id);
    let audit = reconciliation_core::AuditRecord::create(
        &tenant.ctx,
        tenant.account.entity_id,
        "TransactionMatch",
        racing.id,
        serde_json::json!({}),
    );
    let err = storage
        .create_match(tenant.ctx.tenant_id, &racing, &audit)
        .await
        .unwrap_err();
    assert!(matches!(err, ReconcileError::Conflict(_)));

    // The refused write left no partial state behind
    assert!(storage
        .get_match(tenant.ctx.tenant_id, racing.id)
        .await
        .unwrap()
        .is_none());
    assert_eq!(storage.audit_records().len(), 1);
}

#[tokio::test]
async fn test_empty_account_is_vacuously_reconciled() {
    let storage = MemoryStorage::new();
    let tenant = seed_tenant(&storage, "Fresh Account");
    let engine = ReconciliationEngine::new(storage.clone());

    let status = engine
        .reconciliation_status(&tenant.ctx, tenant.account.id)
        .await
        .unwrap();
    assert_eq!(status.total_bank_feed, 0);
    assert_eq!(status.reconciliation_percent, 100);
}
