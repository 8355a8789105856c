//! Core domain types and the application state built on them

pub mod analytics;
pub mod config;
pub mod currency;
pub mod ledger;
pub mod log;
pub mod notifications;
pub mod profile;
pub mod state;
pub mod transactions;

// Re-export main types for cleaner imports
pub use currency::{Currency, RateBook, RateProvider};
pub use ledger::{LendRecord, LendStatus, Ledger, NewLoan, NewRepayment, Repayment};
pub use state::AppState;
pub use transactions::{NewTransaction, Transaction, TransactionType};
