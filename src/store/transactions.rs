use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{LedgerError, Result, StoreContext};
use crate::models::{to_millis, Transaction, TransactionQuery};

const COLUMNS: &str = "id, account_id, period_id, category_id, actualized_recurring_id, \
                       name, amount, date, can_delete, created_at";

const DEFAULT_PAGE: u32 = 100;

/// Row values for a transaction that has not been stored yet.
#[derive(Debug, Clone)]
pub struct TransactionDraft {
    pub account_id: i64,
    pub period_id: i64,
    pub category_id: Option<i64>,
    pub actualized_recurring_id: Option<i64>,
    pub name: String,
    pub amount: i64,
    pub date: DateTime<Utc>,
    pub can_delete: bool,
}

pub fn insert(conn: &Connection, draft: &TransactionDraft, now: DateTime<Utc>) -> Result<Transaction> {
    conn.execute(
        "INSERT INTO transactions \
         (account_id, period_id, category_id, actualized_recurring_id, name, amount, date, can_delete, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            draft.account_id,
            draft.period_id,
            draft.category_id,
            draft.actualized_recurring_id,
            draft.name,
            draft.amount,
            to_millis(draft.date),
            draft.can_delete,
            to_millis(now),
        ],
    )
    .context(format!("insert transaction '{}'", draft.name))?;
    get(conn, conn.last_insert_rowid())
}

pub fn get(conn: &Connection, id: i64) -> Result<Transaction> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM transactions WHERE id = ?1"),
        [id],
        Transaction::from_row,
    )
    .optional()
    .context(format!("load transaction {id}"))?
    .ok_or_else(|| LedgerError::not_found("transaction", id))
}

/// Newest first, optionally restricted to one period.
pub fn list(conn: &Connection, account_id: i64, query: &TransactionQuery) -> Result<Vec<Transaction>> {
    let limit = query.limit.unwrap_or(DEFAULT_PAGE);
    let offset = query.offset.unwrap_or(0);
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {COLUMNS} FROM transactions \
             WHERE account_id = ?1 AND (?2 IS NULL OR period_id = ?2) \
             ORDER BY date DESC, created_at DESC, id DESC \
             LIMIT ?3 OFFSET ?4"
        ))
        .context("list transactions")?;
    let rows = stmt
        .query_map(params![account_id, query.period_id, limit, offset], Transaction::from_row)
        .context(format!("list transactions of account {account_id}"))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .context("scan transactions")?;
    Ok(rows)
}

/// Persist the mutable fields: name, amount and category.
pub fn update(conn: &Connection, txn: &Transaction) -> Result<Transaction> {
    let changed = conn
        .execute(
            "UPDATE transactions SET name = ?1, amount = ?2, category_id = ?3 WHERE id = ?4",
            params![txn.name, txn.amount, txn.category_id, txn.id],
        )
        .context(format!("update transaction {}", txn.id))?;
    if changed == 0 {
        return Err(LedgerError::not_found("transaction", txn.id));
    }
    get(conn, txn.id)
}

pub fn delete(conn: &Connection, id: i64) -> Result<()> {
    conn.execute("DELETE FROM transactions WHERE id = ?1", [id])
        .context(format!("delete transaction {id}"))?;
    Ok(())
}

pub fn count(conn: &Connection) -> Result<i64> {
    let n = conn
        .query_row("SELECT count(*) FROM transactions", [], |row| row.get(0))
        .context("count transactions")?;
    Ok(n)
}
