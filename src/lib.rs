//! Personal budgeting ledger: accounts with monthly reporting periods,
//! transactions, and recurring templates applied at most once per period.

pub mod actualizer;
pub mod api;
pub mod balance;
pub mod db;
pub mod error;
pub mod fmt;
pub mod ledger;
pub mod logging;
pub mod models;
pub mod period_manager;
pub mod settings;
pub mod store;

pub use api::{Api, ApiResult, SimpleResult};
pub use error::{LedgerError, Result};
pub use ledger::Ledger;
