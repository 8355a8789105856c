pub mod lend;
pub mod rates;
pub mod settings;
pub mod setup;
pub mod summary;
pub mod transactions;
pub mod ui;
