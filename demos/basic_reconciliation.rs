//! Basic bank feed reconciliation example

use chrono::NaiveDate;
use reconciliation_core::utils::MemoryStorage;
use reconciliation_core::{
    Account, BankFeedTransaction, LedgerEntity, ReconciliationEngine, TenantContext, Transaction,
};
use uuid::Uuid;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("🏦 Reconciliation Core - Basic Example\n");

    // Create an engine backed by in-memory storage
    let storage = MemoryStorage::new();
    let engine = ReconciliationEngine::new(storage.clone());

    // 1. Seed a tenant with one business account
    println!("🏢 Setting up tenant and account...");
    let ctx = TenantContext::new(Uuid::new_v4(), Uuid::new_v4());
    let entity = LedgerEntity::new(ctx.tenant_id, "Acme Pty Ltd".to_string());
    let account = Account::new(entity.id, "Business Checking".to_string(), "USD".to_string());
    storage.insert_entity(entity);
    storage.insert_account(account.clone());
    println!("  ✓ Created account: {}\n", account.name);

    // 2. Import bank feed transactions and record ledger transactions
    println!("📥 Importing bank feed transactions...\n");

    let coffee_feed = BankFeedTransaction::new(
        account.id,
        "bank-txn-001".to_string(),
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
        "STARBUCKS #1234".to_string(),
        -550,
        "USD".to_string(),
    );
    storage.insert_bank_feed_transaction(coffee_feed.clone());
    println!("  ✓ Imported: STARBUCKS #1234, -$5.50");

    let rent_feed = BankFeedTransaction::new(
        account.id,
        "bank-txn-002".to_string(),
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        "TRANSFER TO LANDLORD CO".to_string(),
        -120_000,
        "USD".to_string(),
    );
    storage.insert_bank_feed_transaction(rent_feed.clone());
    println!("  ✓ Imported: TRANSFER TO LANDLORD CO, -$1,200.00");

    let coffee_ledger = Transaction::new(
        account.id,
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
        "Starbucks 1234 coffee".to_string(),
        -550,
        "USD".to_string(),
    );
    storage.insert_transaction(coffee_ledger.clone());

    let rent_ledger = Transaction::new(
        account.id,
        NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
        "January office rent".to_string(),
        -120_000,
        "USD".to_string(),
    );
    storage.insert_transaction(rent_ledger.clone());
    println!("  ✓ Recorded 2 ledger transactions\n");

    // 3. Ask for suggestions on the coffee purchase
    println!("🔍 Suggesting matches for STARBUCKS #1234...");
    let suggestions = engine.suggest_matches(&ctx, coffee_feed.id, None).await?;
    for suggestion in &suggestions {
        println!(
            "  {} ({:.2}) — {}",
            suggestion.transaction.description,
            suggestion.confidence,
            suggestion.reasons.join(", ")
        );
    }
    println!();

    // 4. Confirm the top suggestion
    println!("🔗 Confirming the top suggestion...");
    let top = &suggestions[0];
    let view = engine.create_match(&ctx, coffee_feed.id, top.transaction_id).await?;
    println!(
        "  ✓ Matched {} → {} (status now {:?})\n",
        view.bank_feed_transaction.description,
        view.transaction.description,
        view.bank_feed_transaction.status
    );

    // Match the rent transfer manually
    let view = engine.create_match(&ctx, rent_feed.id, rent_ledger.id).await?;
    println!(
        "  ✓ Matched {} → {}\n",
        view.bank_feed_transaction.description, view.transaction.description
    );

    // 5. Check reconciliation status
    println!("📊 Reconciliation status:");
    let status = engine.reconciliation_status(&ctx, account.id).await?;
    println!("  Bank feed transactions: {}", status.total_bank_feed);
    println!("  Matched:                {}", status.matched);
    println!("  Unmatched:              {}", status.unmatched);
    println!("  Reconciled:             {}%\n", status.reconciliation_percent);

    // 6. Undo one match and look again
    println!("↩️  Unmatching the rent transfer...");
    engine.unmatch(&ctx, view.record.id).await?;
    let status = engine.reconciliation_status(&ctx, account.id).await?;
    println!("  Reconciled after unmatch: {}%", status.reconciliation_percent);

    println!("\n🎉 Example completed successfully!");
    Ok(())
}
