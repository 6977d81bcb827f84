pub mod customer;
pub mod transaction;
pub mod validation;

pub use customer::{
    AddCustomerRequest, CustomerDetailResponse, CustomerQuery, CustomerSummaryResponse,
    DeleteCustomerRequest, UpdateCustomerRequest,
};
pub use transaction::{
    AddDebtRequest, AddPaymentRequest, DeleteTransactionRequest, TransactionView,
};

use serde::Serialize;

/// Acknowledgement for every write.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteResponse {
    pub success: bool,
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transactions_removed: Option<u64>,
}

impl WriteResponse {
    pub fn ok(message: &'static str) -> Self {
        Self {
            success: true,
            message,
            customer_id: None,
            transaction_id: None,
            transactions_removed: None,
        }
    }

    pub fn with_customer(mut self, id: String) -> Self {
        self.customer_id = Some(id);
        self
    }

    pub fn with_transaction(mut self, id: String) -> Self {
        self.transaction_id = Some(id);
        self
    }

    pub fn with_removed(mut self, count: u64) -> Self {
        self.transactions_removed = Some(count);
        self
    }
}
