//! Typed CRUD over the ledger tables. Functions here enforce no lifecycle
//! rules; callers in `period_manager`, `actualizer` and `ledger` do.

pub mod accounts;
pub mod actualized;
pub mod categories;
pub mod periods;
pub mod recurrings;
pub mod transactions;
