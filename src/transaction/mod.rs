//! Transactions: the spending events that users record.
//!
//! This module contains:
//! - The `Transaction` model and `TransactionBuilder` for creating transactions
//! - Database functions for storing and querying transactions
//! - The route handlers for creating and listing transactions

mod core;
mod create_endpoint;
mod list_endpoint;
mod query;

pub use core::{
    CategoryRef, Description, Transaction, TransactionBuilder, count_transactions,
    create_transaction, create_transaction_table, get_transaction, map_transaction_row,
};
pub use create_endpoint::create_transaction_endpoint;
pub use list_endpoint::{UserDateRangeQuery, list_transactions_endpoint};
pub use query::{DateRange, list_transactions};
