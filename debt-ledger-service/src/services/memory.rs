use super::store::LedgerStore;
use crate::ledger::{CustomerKey, LedgerEntry};
use crate::models::{Customer, CustomerChanges, TransactionRecord};
use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use service_core::error::AppError;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct State {
    customers: Vec<Customer>,
    transactions: Vec<TransactionRecord>,
}

/// Process-local store. Rows keep insertion order and are matched by
/// canonical customer key, so legacy shapes behave as they do in Mongo.
#[derive(Debug, Default)]
pub struct InMemoryLedgerStore {
    state: RwLock<State>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn references(record: &TransactionRecord, key: &CustomerKey) -> bool {
    record.customer_key().as_ref() == Some(key)
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn health_check(&self) -> Result<(), AppError> {
        Ok(())
    }

    async fn list_customers(&self) -> Result<Vec<Customer>, AppError> {
        Ok(self.state.read().await.customers.clone())
    }

    async fn count_customers(&self) -> Result<u64, AppError> {
        Ok(self.state.read().await.customers.len() as u64)
    }

    async fn find_customer(&self, id: &ObjectId) -> Result<Option<Customer>, AppError> {
        let state = self.state.read().await;
        Ok(state.customers.iter().find(|c| &c.id == id).cloned())
    }

    async fn insert_customer(&self, customer: &Customer) -> Result<(), AppError> {
        let mut state = self.state.write().await;
        if state.customers.iter().any(|c| c.id == customer.id) {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "Customer {} already exists",
                customer.id
            )));
        }
        state.customers.push(customer.clone());
        Ok(())
    }

    async fn update_customer(
        &self,
        id: &ObjectId,
        changes: &CustomerChanges,
    ) -> Result<bool, AppError> {
        let mut state = self.state.write().await;
        match state.customers.iter_mut().find(|c| &c.id == id) {
            Some(customer) => {
                customer.name = changes.name.clone();
                customer.phone = changes.phone.clone();
                customer.note = changes.note.clone();
                customer.updated_at = Some(changes.updated_at);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn remove_customer(&self, id: &ObjectId) -> Result<bool, AppError> {
        let mut state = self.state.write().await;
        let before = state.customers.len();
        state.customers.retain(|c| &c.id != id);
        Ok(state.customers.len() != before)
    }

    async fn delete_customer_transactions(&self, key: &CustomerKey) -> Result<u64, AppError> {
        let mut state = self.state.write().await;
        let before = state.transactions.len();
        state.transactions.retain(|t| !references(t, key));
        Ok((before - state.transactions.len()) as u64)
    }

    async fn list_transactions(&self) -> Result<Vec<TransactionRecord>, AppError> {
        Ok(self.state.read().await.transactions.clone())
    }

    async fn transactions_for(
        &self,
        key: &CustomerKey,
    ) -> Result<Vec<TransactionRecord>, AppError> {
        let state = self.state.read().await;
        Ok(state
            .transactions
            .iter()
            .filter(|t| references(t, key))
            .cloned()
            .collect())
    }

    async fn find_transaction(
        &self,
        id: &ObjectId,
    ) -> Result<Option<TransactionRecord>, AppError> {
        let state = self.state.read().await;
        Ok(state.transactions.iter().find(|t| &t.id == id).cloned())
    }

    async fn insert_transaction(&self, record: &TransactionRecord) -> Result<(), AppError> {
        let mut state = self.state.write().await;
        if state.transactions.iter().any(|t| t.id == record.id) {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "Transaction {} already exists",
                record.id
            )));
        }
        state.transactions.push(record.clone());
        Ok(())
    }

    async fn delete_transaction(&self, id: &ObjectId) -> Result<bool, AppError> {
        let mut state = self.state.write().await;
        let before = state.transactions.len();
        state.transactions.retain(|t| &t.id != id);
        Ok(state.transactions.len() != before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::EntryKind;
    use mongodb::bson::Bson;

    fn legacy(customer: Bson, tag: &str, amount: i32) -> TransactionRecord {
        TransactionRecord {
            id: ObjectId::new(),
            customer_id: Some(customer),
            kind: Some(Bson::String(tag.to_string())),
            amount: Some(Bson::Int32(amount)),
            note: String::new(),
            invoice_image_url: None,
            invoice_url: None,
            date: None,
            created_at: None,
        }
    }

    #[tokio::test]
    async fn matches_every_id_spelling() {
        let store = InMemoryLedgerStore::new();
        let customer = Customer::new("Ada".into(), String::new(), String::new());
        store.insert_customer(&customer).await.unwrap();

        store
            .insert_transaction(&legacy(Bson::ObjectId(customer.id), "DEBT", 10))
            .await
            .unwrap();
        store
            .insert_transaction(&legacy(Bson::String(customer.id.to_hex()), "payment", 4))
            .await
            .unwrap();
        store
            .insert_transaction(&legacy(Bson::String("someone-else".into()), "debit", 1))
            .await
            .unwrap();

        store
            .insert_transaction(&legacy(
                Bson::String(format!(" {} ", customer.id.to_hex().to_uppercase())),
                "debit",
                2,
            ))
            .await
            .unwrap();

        let key = CustomerKey::from_object_id(&customer.id);
        assert_eq!(store.transactions_for(&key).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn deleting_a_customer_cascades() {
        let store = InMemoryLedgerStore::new();
        let customer = Customer::new("Ada".into(), String::new(), String::new());
        store.insert_customer(&customer).await.unwrap();
        let key = CustomerKey::from_object_id(&customer.id);

        let record = TransactionRecord::new(
            &key,
            EntryKind::Debit,
            rust_decimal::Decimal::from(5),
            String::new(),
            None,
        )
        .unwrap();
        store.insert_transaction(&record).await.unwrap();
        store
            .insert_transaction(&legacy(Bson::ObjectId(customer.id), "debt", 3))
            .await
            .unwrap();

        assert_eq!(store.delete_customer(&customer.id).await.unwrap(), Some(2));
        assert!(store.list_transactions().await.unwrap().is_empty());
        assert_eq!(store.delete_customer(&customer.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn delete_transaction_reports_missing_rows() {
        let store = InMemoryLedgerStore::new();
        assert!(!store.delete_transaction(&ObjectId::new()).await.unwrap());
    }
}
