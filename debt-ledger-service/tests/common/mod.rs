//! Common test utilities for debt-ledger-service integration tests.
#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use debt_ledger_service::models::TransactionRecord;
use debt_ledger_service::services::{InMemoryLedgerStore, LedgerStore};
use debt_ledger_service::startup::{build_router, AppState};
use mongodb::bson::{oid::ObjectId, Bson};
use serde_json::{json, Value};
use service_core::observability::init_test_tracing;
use std::sync::Arc;
use tower::util::ServiceExt;

/// Router over a fresh in-memory store, plus direct access to that store for
/// seeding rows the HTTP API would never write.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemoryLedgerStore>,
}

pub fn spawn_app() -> TestApp {
    init_test_tracing("info,debt_ledger_service=debug");

    let store = Arc::new(InMemoryLedgerStore::new());
    let state = AppState::new("debt-ledger-service-test", store.clone());

    TestApp {
        router: build_router(state),
        store,
    }
}

impl TestApp {
    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        self.send(request).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    pub async fn post_raw(&self, uri: &str, body: &'static str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    /// Create a customer through the API and return its id.
    pub async fn add_customer(&self, name: &str) -> String {
        let (status, body) = self
            .post("/api/addCustomer", json!({ "name": name, "phone": "555-0100" }))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["customerId"].as_str().unwrap().to_string()
    }

    pub async fn add_debt(&self, customer_id: &str, amount: f64) -> String {
        let (status, body) = self
            .post(
                "/api/addDebt",
                json!({ "customerId": customer_id, "amount": amount, "note": "goods" }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["transactionId"].as_str().unwrap().to_string()
    }

    pub async fn add_payment(&self, customer_id: &str, amount: f64) -> String {
        let (status, body) = self
            .post(
                "/api/addPayment",
                json!({ "customerId": customer_id, "amount": amount }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["transactionId"].as_str().unwrap().to_string()
    }

    pub async fn customer(&self, customer_id: &str) -> Value {
        let (status, body) = self
            .get(&format!("/api/getCustomer?id={customer_id}"))
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body
    }

    /// Store a row exactly as given, bypassing the write path.
    pub async fn seed(&self, customer_id: Bson, kind: Option<&str>, amount: Bson) -> ObjectId {
        let record = TransactionRecord {
            id: ObjectId::new(),
            customer_id: Some(customer_id),
            kind: kind.map(|k| Bson::String(k.to_string())),
            amount: Some(amount),
            note: String::new(),
            invoice_image_url: None,
            invoice_url: None,
            date: None,
            created_at: Some(chrono::Utc::now()),
        };
        self.store.insert_transaction(&record).await.unwrap();
        record.id
    }
}

pub fn money(value: &Value) -> f64 {
    value
        .as_f64()
        .unwrap_or_else(|| panic!("expected a number, got {value}"))
}
