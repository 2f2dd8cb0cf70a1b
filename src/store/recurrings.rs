use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{LedgerError, Result, StoreContext};
use crate::models::{to_millis, Recurring, RecurringInput};

const COLUMNS: &str = "id, account_id, category_id, name, amount, occurrence_day, created_at";

pub fn insert(
    conn: &Connection,
    account_id: i64,
    input: &RecurringInput,
    now: DateTime<Utc>,
) -> Result<Recurring> {
    conn.execute(
        "INSERT INTO recurrings (account_id, category_id, name, amount, occurrence_day, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            account_id,
            input.category_id,
            input.name,
            input.amount,
            input.occurrence_day,
            to_millis(now)
        ],
    )
    .context(format!("insert recurring '{}'", input.name))?;
    get(conn, conn.last_insert_rowid())
}

pub fn get(conn: &Connection, id: i64) -> Result<Recurring> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM recurrings WHERE id = ?1"),
        [id],
        Recurring::from_row,
    )
    .optional()
    .context(format!("load recurring {id}"))?
    .ok_or_else(|| LedgerError::not_found("recurring", id))
}

/// Templates of an account ordered by the day they fall due.
pub fn list(conn: &Connection, account_id: i64) -> Result<Vec<Recurring>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {COLUMNS} FROM recurrings WHERE account_id = ?1 \
             ORDER BY occurrence_day, created_at DESC, id"
        ))
        .context("list recurrings")?;
    let rows = stmt
        .query_map([account_id], Recurring::from_row)
        .context(format!("list recurrings of account {account_id}"))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .context("scan recurrings")?;
    Ok(rows)
}

pub fn update(conn: &Connection, recurring: &Recurring) -> Result<Recurring> {
    let changed = conn
        .execute(
            "UPDATE recurrings SET name = ?1, amount = ?2, occurrence_day = ?3, category_id = ?4 WHERE id = ?5",
            params![
                recurring.name,
                recurring.amount,
                recurring.occurrence_day,
                recurring.category_id,
                recurring.id
            ],
        )
        .context(format!("update recurring {}", recurring.id))?;
    if changed == 0 {
        return Err(LedgerError::not_found("recurring", recurring.id));
    }
    get(conn, recurring.id)
}

/// Snapshots keep their values; their `based_on_id` is nulled by the
/// foreign key.
pub fn delete(conn: &Connection, id: i64) -> Result<()> {
    conn.execute("DELETE FROM recurrings WHERE id = ?1", [id])
        .context(format!("delete recurring {id}"))?;
    Ok(())
}
