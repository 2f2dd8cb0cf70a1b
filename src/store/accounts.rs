use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{LedgerError, Result, StoreContext};
use crate::models::{to_millis, Account};

const COLUMNS: &str = "id, name, period_start_day, can_delete, created_at";

pub fn insert(
    conn: &Connection,
    name: &str,
    period_start_day: u32,
    can_delete: bool,
    now: DateTime<Utc>,
) -> Result<Account> {
    conn.execute(
        "INSERT INTO accounts (name, period_start_day, can_delete, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![name, period_start_day, can_delete, to_millis(now)],
    )
    .context("insert account")?;
    get(conn, conn.last_insert_rowid())
}

pub fn get(conn: &Connection, id: i64) -> Result<Account> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM accounts WHERE id = ?1"),
        [id],
        Account::from_row,
    )
    .optional()
    .context(format!("load account {id}"))?
    .ok_or_else(|| LedgerError::not_found("account", id))
}

pub fn list(conn: &Connection) -> Result<Vec<Account>> {
    let mut stmt = conn
        .prepare(&format!("SELECT {COLUMNS} FROM accounts ORDER BY id"))
        .context("list accounts")?;
    let rows = stmt
        .query_map([], Account::from_row)
        .context("list accounts")?
        .collect::<std::result::Result<Vec<_>, _>>()
        .context("scan accounts")?;
    Ok(rows)
}

/// Lowest account id, i.e. the account created at first run.
pub fn first_id(conn: &Connection) -> Result<Option<i64>> {
    let id = conn
        .query_row("SELECT min(id) FROM accounts", [], |row| row.get(0))
        .context("find default account")?;
    Ok(id)
}

pub fn update(conn: &Connection, account: &Account) -> Result<Account> {
    let changed = conn
        .execute(
            "UPDATE accounts SET name = ?1, period_start_day = ?2, can_delete = ?3 WHERE id = ?4",
            params![account.name, account.period_start_day, account.can_delete, account.id],
        )
        .context(format!("update account {}", account.id))?;
    if changed == 0 {
        return Err(LedgerError::not_found("account", account.id));
    }
    get(conn, account.id)
}

/// Remove an account and everything that hangs off it. Transactions go
/// first so the release trigger drops their snapshots.
pub fn delete(conn: &Connection, id: i64) -> Result<()> {
    let steps = [
        ("delete transactions", "DELETE FROM transactions WHERE account_id = ?1"),
        ("delete snapshots", "DELETE FROM actualized_recurrings WHERE account_id = ?1"),
        ("delete recurrings", "DELETE FROM recurrings WHERE account_id = ?1"),
        ("delete categories", "DELETE FROM categories WHERE account_id = ?1"),
        ("delete periods", "DELETE FROM periods WHERE account_id = ?1"),
        ("delete account", "DELETE FROM accounts WHERE id = ?1"),
    ];
    for (what, sql) in steps {
        conn.execute(sql, [id]).context(format!("{what} of account {id}"))?;
    }
    Ok(())
}
