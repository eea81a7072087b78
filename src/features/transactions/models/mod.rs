mod transaction;

pub use transaction::{NewTransaction, Transaction, TransactionRow, TransactionStatus};
