use super::metrics::record_store_call;
use super::store::LedgerStore;
use crate::config::SummaryStrategy;
use crate::ledger::{amount_from_bson, CustomerKey, CustomerStats, SystemSummary};
use crate::models::{Customer, CustomerChanges, TransactionRecord};
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, oid::ObjectId, Bson, Document},
    options::{FindOptions, IndexOptions},
    Client as MongoClient, Collection, Database, IndexModel,
};
use rust_decimal::Decimal;
use service_core::error::AppError;
use std::time::Instant;
use tracing::instrument;

const CUSTOMERS: &str = "customers";
const TRANSACTIONS: &str = "transactions";

fn db_error(context: &str, e: mongodb::error::Error) -> AppError {
    tracing::error!(error = %e, "{}", context);
    AppError::DatabaseError(anyhow::anyhow!("{}: {}", context, e))
}

#[derive(Clone)]
pub struct MongoLedgerStore {
    client: MongoClient,
    db: Database,
    summary: SummaryStrategy,
}

impl MongoLedgerStore {
    pub async fn connect(
        uri: &str,
        database: &str,
        summary: SummaryStrategy,
    ) -> Result<Self, AppError> {
        tracing::info!("Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri)
            .await
            .map_err(|e| db_error("Failed to connect to MongoDB", e))?;
        let db = client.database(database);
        tracing::info!(database = %database, summary = ?summary, "Connected to MongoDB database");
        Ok(Self {
            client,
            db,
            summary,
        })
    }

    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        tracing::info!("Creating MongoDB indexes for debt-ledger-service");

        let customer_index = IndexModel::builder()
            .keys(doc! { "customerId": 1 })
            .options(
                IndexOptions::builder()
                    .name("customer_id_idx".to_string())
                    .build(),
            )
            .build();

        self.transactions()
            .create_index(customer_index, None)
            .await
            .map_err(|e| db_error("Failed to create customerId index", e))?;

        // Newest-first listing
        let date_index = IndexModel::builder()
            .keys(doc! { "date": -1, "createdAt": -1 })
            .options(
                IndexOptions::builder()
                    .name("date_created_at_idx".to_string())
                    .build(),
            )
            .build();

        self.transactions()
            .create_index(date_index, None)
            .await
            .map_err(|e| db_error("Failed to create date index", e))?;

        tracing::info!("MongoDB indexes created");
        Ok(())
    }

    fn customers(&self) -> Collection<Customer> {
        self.db.collection(CUSTOMERS)
    }

    fn transactions(&self) -> Collection<TransactionRecord> {
        self.db.collection(TRANSACTIONS)
    }

    /// Every `customerId` that canonicalizes to `key`: the native ObjectId,
    /// the hex string, and non-canonical spellings of that string.
    fn reference_filter(key: &CustomerKey) -> Document {
        let exact = doc! { "customerId": { "$in": key.stored_forms() } };
        match key.loose_string_pattern() {
            Some(pattern) => doc! { "$or": [
                exact,
                { "customerId": { "$regex": pattern, "$options": "i" } },
            ] },
            None => exact,
        }
    }

    /// Summary computed inside MongoDB. Each stage mirrors a rule in
    /// [`crate::ledger`]: key canonicalization, the alias table, the sign
    /// fallback for missing or unknown tags, and magnitudes of usable
    /// numeric amounts only.
    #[instrument(skip(self))]
    async fn pipeline_summary(&self) -> Result<SystemSummary, AppError> {
        let started = Instant::now();
        let customers = self.count_customers().await?;

        let mut cursor = self
            .db
            .collection::<Document>(TRANSACTIONS)
            .aggregate(summary_pipeline(), None)
            .await
            .map_err(|e| db_error("Failed to run summary pipeline", e))?;

        let mut overall = CustomerStats::default();
        let mut groups = Vec::new();
        while let Some(group) = cursor
            .try_next()
            .await
            .map_err(|e| db_error("Failed to read summary group", e))?
        {
            let stats = stats_from_group(&group);
            overall.merge(&stats);
            // The null group holds rows without a usable customer reference
            if !matches!(group.get("_id"), None | Some(Bson::Null)) {
                groups.push(stats);
            }
        }

        record_store_call("pipeline_summary", started);
        Ok(SystemSummary::from_parts(customers, &overall, groups))
    }
}

fn summary_pipeline() -> Vec<Document> {
    let debit_tags = vec!["debit", "debt"];
    let credit_tags = vec!["credit", "payment"];

    vec![
        doc! { "$project": {
            "key": { "$switch": {
                "branches": [
                    { "case": { "$eq": [{ "$type": "$customerId" }, "objectId"] },
                      "then": { "$toString": "$customerId" } },
                    { "case": { "$eq": [{ "$type": "$customerId" }, "string"] },
                      "then": { "$let": {
                          "vars": { "trimmed": { "$trim": { "input": "$customerId" } } },
                          "in": { "$switch": {
                              "branches": [
                                  { "case": { "$eq": ["$$trimmed", ""] }, "then": null },
                                  { "case": { "$regexMatch": {
                                        "input": "$$trimmed",
                                        "regex": "^[0-9a-fA-F]{24}$" } },
                                    "then": { "$toLower": "$$trimmed" } },
                              ],
                              "default": "$$trimmed",
                          } },
                      } } },
                ],
                "default": null,
            } },
            "tag": { "$cond": [
                { "$eq": [{ "$type": "$type" }, "string"] },
                { "$toLower": { "$trim": { "input": "$type" } } },
                "",
            ] },
            "amount": { "$cond": [
                { "$and": [
                    { "$in": [{ "$type": "$amount" }, ["double", "int", "long"]] },
                    { "$gt": ["$amount", f64::NEG_INFINITY] },
                    { "$lt": ["$amount", f64::INFINITY] },
                ] },
                "$amount",
                0,
            ] },
        } },
        doc! { "$project": {
            "key": 1,
            "magnitude": { "$abs": "$amount" },
            "isDebit": { "$switch": {
                "branches": [
                    { "case": { "$in": ["$tag", debit_tags] }, "then": true },
                    { "case": { "$in": ["$tag", credit_tags] }, "then": false },
                ],
                "default": { "$lt": ["$amount", 0] },
            } },
        } },
        doc! { "$group": {
            "_id": "$key",
            "totalDebt": { "$sum": { "$cond": ["$isDebit", "$magnitude", 0] } },
            "totalPaid": { "$sum": { "$cond": ["$isDebit", 0, "$magnitude"] } },
            "receipts": { "$sum": { "$cond": ["$isDebit", 1, 0] } },
        } },
    ]
}

fn stats_from_group(group: &Document) -> CustomerStats {
    let sum = |field: &str| match group.get(field) {
        None => Decimal::ZERO,
        Some(value) => amount_from_bson(value).unwrap_or_else(|| {
            tracing::warn!(
                field,
                value = %value,
                group = ?group.get("_id"),
                "Summary group sum out of range; counted as zero"
            );
            Decimal::ZERO
        }),
    };
    let receipts = match group.get("receipts") {
        Some(Bson::Int32(n)) => u64::try_from(*n).unwrap_or(0),
        Some(Bson::Int64(n)) => u64::try_from(*n).unwrap_or(0),
        _ => 0,
    };

    CustomerStats {
        total_debt: sum("totalDebt"),
        total_paid: sum("totalPaid"),
        receipts,
    }
}

#[async_trait]
impl LedgerStore for MongoLedgerStore {
    fn backend(&self) -> &'static str {
        "mongo"
    }

    async fn health_check(&self) -> Result<(), AppError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "MongoDB ping failed");
                AppError::ServiceUnavailable
            })?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_customers(&self) -> Result<Vec<Customer>, AppError> {
        let started = Instant::now();
        let options = FindOptions::builder()
            .sort(doc! { "createdAt": 1, "_id": 1 })
            .build();
        let customers: Vec<Customer> = self
            .customers()
            .find(None, options)
            .await
            .map_err(|e| db_error("Failed to query customers", e))?
            .try_collect()
            .await
            .map_err(|e| db_error("Failed to read customers", e))?;
        record_store_call("list_customers", started);
        Ok(customers)
    }

    #[instrument(skip(self))]
    async fn count_customers(&self) -> Result<u64, AppError> {
        let started = Instant::now();
        let count = self
            .customers()
            .count_documents(None, None)
            .await
            .map_err(|e| db_error("Failed to count customers", e))?;
        record_store_call("count_customers", started);
        Ok(count)
    }

    #[instrument(skip(self))]
    async fn find_customer(&self, id: &ObjectId) -> Result<Option<Customer>, AppError> {
        let started = Instant::now();
        let customer = self
            .customers()
            .find_one(doc! { "_id": *id }, None)
            .await
            .map_err(|e| db_error("Failed to find customer", e))?;
        record_store_call("find_customer", started);
        Ok(customer)
    }

    #[instrument(skip(self, customer), fields(customer_id = %customer.id))]
    async fn insert_customer(&self, customer: &Customer) -> Result<(), AppError> {
        let started = Instant::now();
        self.customers()
            .insert_one(customer, None)
            .await
            .map_err(|e| db_error("Failed to insert customer", e))?;
        record_store_call("insert_customer", started);
        Ok(())
    }

    #[instrument(skip(self, changes))]
    async fn update_customer(
        &self,
        id: &ObjectId,
        changes: &CustomerChanges,
    ) -> Result<bool, AppError> {
        let started = Instant::now();
        let update = doc! { "$set": {
            "name": changes.name.clone(),
            "phone": changes.phone.clone(),
            "note": changes.note.clone(),
            "updatedAt": mongodb::bson::DateTime::from_chrono(changes.updated_at),
        } };
        let result = self
            .customers()
            .update_one(doc! { "_id": *id }, update, None)
            .await
            .map_err(|e| db_error("Failed to update customer", e))?;
        record_store_call("update_customer", started);
        Ok(result.matched_count > 0)
    }

    #[instrument(skip(self))]
    async fn remove_customer(&self, id: &ObjectId) -> Result<bool, AppError> {
        let started = Instant::now();
        let deleted = self
            .customers()
            .delete_one(doc! { "_id": *id }, None)
            .await
            .map_err(|e| db_error("Failed to delete customer", e))?;
        record_store_call("remove_customer", started);
        Ok(deleted.deleted_count > 0)
    }

    #[instrument(skip(self), fields(customer = %key))]
    async fn delete_customer_transactions(&self, key: &CustomerKey) -> Result<u64, AppError> {
        let started = Instant::now();
        let removed = self
            .transactions()
            .delete_many(Self::reference_filter(key), None)
            .await
            .map_err(|e| db_error("Failed to delete customer transactions", e))?;
        record_store_call("delete_customer_transactions", started);
        Ok(removed.deleted_count)
    }

    #[instrument(skip(self))]
    async fn list_transactions(&self) -> Result<Vec<TransactionRecord>, AppError> {
        let started = Instant::now();
        let records: Vec<TransactionRecord> = self
            .transactions()
            .find(None, None)
            .await
            .map_err(|e| db_error("Failed to query transactions", e))?
            .try_collect()
            .await
            .map_err(|e| db_error("Failed to read transactions", e))?;
        record_store_call("list_transactions", started);
        Ok(records)
    }

    #[instrument(skip(self), fields(customer = %key))]
    async fn transactions_for(
        &self,
        key: &CustomerKey,
    ) -> Result<Vec<TransactionRecord>, AppError> {
        let started = Instant::now();
        let records: Vec<TransactionRecord> = self
            .transactions()
            .find(Self::reference_filter(key), None)
            .await
            .map_err(|e| db_error("Failed to query customer transactions", e))?
            .try_collect()
            .await
            .map_err(|e| db_error("Failed to read customer transactions", e))?;
        record_store_call("transactions_for", started);
        Ok(records)
    }

    #[instrument(skip(self))]
    async fn find_transaction(
        &self,
        id: &ObjectId,
    ) -> Result<Option<TransactionRecord>, AppError> {
        let started = Instant::now();
        let record = self
            .transactions()
            .find_one(doc! { "_id": *id }, None)
            .await
            .map_err(|e| db_error("Failed to find transaction", e))?;
        record_store_call("find_transaction", started);
        Ok(record)
    }

    #[instrument(skip(self, record), fields(transaction_id = %record.id))]
    async fn insert_transaction(&self, record: &TransactionRecord) -> Result<(), AppError> {
        let started = Instant::now();
        self.transactions()
            .insert_one(record, None)
            .await
            .map_err(|e| db_error("Failed to insert transaction", e))?;
        record_store_call("insert_transaction", started);
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_transaction(&self, id: &ObjectId) -> Result<bool, AppError> {
        let started = Instant::now();
        let result = self
            .transactions()
            .delete_one(doc! { "_id": *id }, None)
            .await
            .map_err(|e| db_error("Failed to delete transaction", e))?;
        record_store_call("delete_transaction", started);
        Ok(result.deleted_count > 0)
    }

    async fn system_summary(&self) -> Result<SystemSummary, AppError> {
        match self.summary {
            SummaryStrategy::Pipeline => self.pipeline_summary().await,
            SummaryStrategy::Scan => {
                let customers = self.count_customers().await?;
                let transactions = self.list_transactions().await?;
                Ok(crate::ledger::summarize(customers, &transactions))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_documents_become_stats() {
        let stats = stats_from_group(&doc! {
            "_id": "65a1f0c2e4b0a1b2c3d4e5f6",
            "totalDebt": 50.5,
            "totalPaid": 20_i32,
            "receipts": 2_i32,
        });
        assert_eq!(stats.total_debt, "50.5".parse::<Decimal>().unwrap());
        assert_eq!(stats.total_paid, Decimal::from(20));
        assert_eq!(stats.receipts, 2);
        assert!(stats.is_debtor());
    }

    #[test]
    fn out_of_range_group_sums_count_as_zero() {
        let stats = stats_from_group(&doc! {
            "_id": "65a1f0c2e4b0a1b2c3d4e5f6",
            "totalDebt": 1e30,
            "totalPaid": 20_i32,
            "receipts": 3_i32,
        });
        assert_eq!(stats.total_debt, Decimal::ZERO);
        assert_eq!(stats.total_paid, Decimal::from(20));
        assert_eq!(stats.receipts, 3);
    }

    #[test]
    fn pipeline_groups_by_key() {
        let pipeline = summary_pipeline();
        assert_eq!(pipeline.len(), 3);
        assert!(pipeline[2].get_document("$group").is_ok());
    }

    #[test]
    fn reference_filter_matches_every_spelling_of_an_object_id() {
        let key = CustomerKey::parse("65a1f0c2e4b0a1b2c3d4e5f6").unwrap();
        let filter = MongoLedgerStore::reference_filter(&key);
        let branches = filter.get_array("$or").unwrap();
        assert_eq!(branches.len(), 2);

        let exact = branches[0].as_document().unwrap();
        let forms = exact
            .get_document("customerId")
            .unwrap()
            .get_array("$in")
            .unwrap();
        assert_eq!(forms.len(), 2);

        let loose = branches[1]
            .as_document()
            .unwrap()
            .get_document("customerId")
            .unwrap();
        assert_eq!(loose.get_str("$options").unwrap(), "i");
        assert_eq!(
            loose.get_str("$regex").unwrap(),
            r"^\s*65a1f0c2e4b0a1b2c3d4e5f6\s*$"
        );
    }

    #[test]
    fn reference_filter_for_plain_string_keys_is_exact() {
        let key = CustomerKey::parse("walk-in").unwrap();
        let filter = MongoLedgerStore::reference_filter(&key);
        assert!(filter.get("$or").is_none());
        assert!(filter.get_document("customerId").is_ok());
    }
}
