use crate::ledger::{summarize, CustomerKey, SystemSummary};
use crate::models::{Customer, CustomerChanges, TransactionRecord};
use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use service_core::error::AppError;

/// Persistence for customers and their transactions.
///
/// Implementations store rows as given and return them untouched; all
/// interpretation happens in [`crate::ledger`] on read.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Short backend label for logs and health output.
    fn backend(&self) -> &'static str;

    async fn health_check(&self) -> Result<(), AppError>;

    async fn list_customers(&self) -> Result<Vec<Customer>, AppError>;

    async fn count_customers(&self) -> Result<u64, AppError>;

    async fn find_customer(&self, id: &ObjectId) -> Result<Option<Customer>, AppError>;

    async fn insert_customer(&self, customer: &Customer) -> Result<(), AppError>;

    /// Returns `false` when no such customer exists.
    async fn update_customer(
        &self,
        id: &ObjectId,
        changes: &CustomerChanges,
    ) -> Result<bool, AppError>;

    /// Remove the customer document only. Returns `false` when it was not
    /// there.
    async fn remove_customer(&self, id: &ObjectId) -> Result<bool, AppError>;

    /// Remove every transaction that references `key` in any stored form.
    async fn delete_customer_transactions(&self, key: &CustomerKey) -> Result<u64, AppError>;

    /// Delete the customer and every transaction referencing it. Returns the
    /// number of transactions removed, or `None` when the customer does not
    /// exist.
    ///
    /// Transactions go first, so a partial failure never leaves rows without
    /// their customer.
    async fn delete_customer(&self, id: &ObjectId) -> Result<Option<u64>, AppError> {
        if self.find_customer(id).await?.is_none() {
            return Ok(None);
        }

        let removed = self
            .delete_customer_transactions(&CustomerKey::from_object_id(id))
            .await?;
        if !self.remove_customer(id).await? {
            tracing::warn!(customer_id = %id, "Customer removed concurrently during delete");
        }
        tracing::debug!(
            customer_id = %id,
            transactions_removed = removed,
            "Customer cascade complete"
        );
        Ok(Some(removed))
    }

    async fn list_transactions(&self) -> Result<Vec<TransactionRecord>, AppError>;

    /// Every transaction whose `customerId` canonicalizes to `key`.
    async fn transactions_for(&self, key: &CustomerKey)
        -> Result<Vec<TransactionRecord>, AppError>;

    async fn find_transaction(&self, id: &ObjectId)
        -> Result<Option<TransactionRecord>, AppError>;

    async fn insert_transaction(&self, record: &TransactionRecord) -> Result<(), AppError>;

    /// Returns `false` when no such transaction exists.
    async fn delete_transaction(&self, id: &ObjectId) -> Result<bool, AppError>;

    /// System totals over every stored row.
    async fn system_summary(&self) -> Result<SystemSummary, AppError> {
        let customers = self.count_customers().await?;
        let transactions = self.list_transactions().await?;
        Ok(summarize(customers, &transactions))
    }
}
