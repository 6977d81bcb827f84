//! MongoDB-backed store tests. Run with `TEST_MONGODB_URI` set and
//! `cargo test -- --ignored`.

use debt_ledger_service::config::SummaryStrategy;
use debt_ledger_service::ledger::{CustomerKey, EntryKind, LedgerEntry};
use debt_ledger_service::models::{Customer, TransactionRecord};
use debt_ledger_service::services::{LedgerStore, MongoLedgerStore};
use mongodb::bson::{oid::ObjectId, Bson};
use rust_decimal::Decimal;
use service_core::observability::init_test_tracing;

async fn connect(summary: SummaryStrategy, database: &str) -> MongoLedgerStore {
    init_test_tracing("info,debt_ledger_service=debug");
    let uri = std::env::var("TEST_MONGODB_URI")
        .expect("TEST_MONGODB_URI must be set to run MongoDB tests");
    let store = MongoLedgerStore::connect(&uri, database, summary)
        .await
        .expect("Failed to connect to MongoDB");
    store
        .initialize_indexes()
        .await
        .expect("Failed to create indexes");
    store
}

fn unique_database() -> String {
    format!("debt_ledger_test_{}", ObjectId::new().to_hex())
}

fn legacy(customer_id: Bson, kind: Option<&str>, amount: Bson) -> TransactionRecord {
    TransactionRecord {
        id: ObjectId::new(),
        customer_id: Some(customer_id),
        kind: kind.map(|k| Bson::String(k.to_string())),
        amount: Some(amount),
        note: String::new(),
        invoice_image_url: None,
        invoice_url: None,
        date: None,
        created_at: Some(chrono::Utc::now()),
    }
}

#[tokio::test]
#[ignore = "Requires MongoDB (TEST_MONGODB_URI)"]
async fn fetch_matches_every_id_spelling() {
    let store = connect(SummaryStrategy::Scan, &unique_database()).await;
    let customer = Customer::new("Ada".into(), String::new(), String::new());
    store.insert_customer(&customer).await.unwrap();

    store
        .insert_transaction(&legacy(Bson::ObjectId(customer.id), Some("DEBT"), Bson::Int32(100)))
        .await
        .unwrap();
    store
        .insert_transaction(&legacy(
            Bson::String(customer.id.to_hex()),
            Some("payment"),
            Bson::Double(40.0),
        ))
        .await
        .unwrap();

    store
        .insert_transaction(&legacy(
            Bson::String(customer.id.to_hex().to_uppercase()),
            Some("debit"),
            Bson::Int32(7),
        ))
        .await
        .unwrap();
    store
        .insert_transaction(&legacy(
            Bson::String(format!("  {} ", customer.id.to_hex())),
            Some("credit"),
            Bson::Int32(2),
        ))
        .await
        .unwrap();
    store
        .insert_transaction(&legacy(
            Bson::String(ObjectId::new().to_hex()),
            Some("debit"),
            Bson::Int32(1),
        ))
        .await
        .unwrap();

    let rows = store
        .transactions_for(&CustomerKey::from_object_id(&customer.id))
        .await
        .unwrap();
    assert_eq!(rows.len(), 4);
    assert!(rows.iter().any(|r| r.type_tag() == Some("DEBT")));

    // Every row the summary groups under this customer is returned by the fetch
    let grouped = debt_ledger_service::ledger::stats_by_customer(
        &store.list_transactions().await.unwrap(),
    );
    let stats = grouped[&CustomerKey::from_object_id(&customer.id)];
    assert_eq!(stats, debt_ledger_service::ledger::aggregate(&rows));
}

#[tokio::test]
#[ignore = "Requires MongoDB (TEST_MONGODB_URI)"]
async fn pipeline_summary_matches_scan() {
    let database = unique_database();
    let scan = connect(SummaryStrategy::Scan, &database).await;
    let pipeline = connect(SummaryStrategy::Pipeline, &database).await;

    let ada = Customer::new("Ada".into(), String::new(), String::new());
    let bob = Customer::new("Bob".into(), String::new(), String::new());
    scan.insert_customer(&ada).await.unwrap();
    scan.insert_customer(&bob).await.unwrap();

    let rows = vec![
        legacy(Bson::ObjectId(ada.id), Some("DEBT"), Bson::Int32(100)),
        legacy(Bson::String(ada.id.to_hex()), Some("payment"), Bson::Double(40.0)),
        legacy(Bson::String(bob.id.to_hex().to_uppercase()), None, Bson::Int32(-15)),
        legacy(Bson::String(bob.id.to_hex()), Some("refund"), Bson::Double(5.5)),
        legacy(Bson::String("orphan".into()), Some("debit"), Bson::String("abc".into())),
        legacy(Bson::Null, Some("debit"), Bson::Int64(7)),
        legacy(Bson::String("nan".into()), None, Bson::Double(f64::NAN)),
    ];
    for row in &rows {
        scan.insert_transaction(row).await.unwrap();
    }
    let key = CustomerKey::from_object_id(&ada.id);
    let written = TransactionRecord::new(&key, EntryKind::Debit, Decimal::from(3), String::new(), None)
        .unwrap();
    scan.insert_transaction(&written).await.unwrap();

    let by_scan = scan.system_summary().await.unwrap();
    let by_pipeline = pipeline.system_summary().await.unwrap();

    assert_eq!(by_scan, by_pipeline);
    assert_eq!(by_scan.total_customers, 2);
    assert_eq!(by_scan.total_debtors, 2);
}

#[tokio::test]
#[ignore = "Requires MongoDB (TEST_MONGODB_URI)"]
async fn delete_customer_cascades_every_id_spelling() {
    let store = connect(SummaryStrategy::Scan, &unique_database()).await;
    let customer = Customer::new("Ada".into(), String::new(), String::new());
    store.insert_customer(&customer).await.unwrap();
    store
        .insert_transaction(&legacy(Bson::ObjectId(customer.id), Some("debit"), Bson::Int32(1)))
        .await
        .unwrap();
    store
        .insert_transaction(&legacy(
            Bson::String(customer.id.to_hex()),
            Some("credit"),
            Bson::Int32(1),
        ))
        .await
        .unwrap();

    store
        .insert_transaction(&legacy(
            Bson::String(customer.id.to_hex().to_uppercase()),
            Some("debit"),
            Bson::Int32(9),
        ))
        .await
        .unwrap();

    assert_eq!(store.delete_customer(&customer.id).await.unwrap(), Some(3));
    assert!(store.list_transactions().await.unwrap().is_empty());
    assert_eq!(store.system_summary().await.unwrap().total_debtors, 0);
    assert!(store.find_customer(&customer.id).await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "Requires MongoDB (TEST_MONGODB_URI)"]
async fn health_check_pings() {
    let store = connect(SummaryStrategy::Scan, &unique_database()).await;
    store.health_check().await.unwrap();
}
