pub mod models;
pub mod services;

pub use models::{NewTransaction, Transaction, TransactionStatus};
pub use services::{PgTransactionStore, TransactionStore};
