pub mod database;
pub mod memory;
pub mod metrics;
pub mod store;

pub use database::MongoLedgerStore;
pub use memory::InMemoryLedgerStore;
pub use store::LedgerStore;
