pub mod customer;
pub mod lenient;
pub mod transaction;

pub use customer::{Customer, CustomerChanges};
pub use transaction::{NewTransactionError, TransactionRecord};
