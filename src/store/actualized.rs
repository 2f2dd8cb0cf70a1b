use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{LedgerError, Result, StoreContext};
use crate::models::{to_millis, ActualizedRecurring, Recurring};

const COLUMNS: &str =
    "id, based_on_id, account_id, period_id, category_id, name, amount, occurrence_day, created_at";

/// Copy the template's current values into a snapshot row for `period_id`.
/// The raw rusqlite error is returned so callers can tell a duplicate
/// (constraint violation) apart from other failures.
pub fn insert_snapshot(
    conn: &Connection,
    template: &Recurring,
    period_id: i64,
    now: DateTime<Utc>,
) -> std::result::Result<i64, rusqlite::Error> {
    conn.execute(
        "INSERT INTO actualized_recurrings \
         (based_on_id, account_id, period_id, category_id, name, amount, occurrence_day, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            template.id,
            template.account_id,
            period_id,
            template.category_id,
            template.name,
            template.amount,
            template.occurrence_day,
            to_millis(now)
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get(conn: &Connection, id: i64) -> Result<ActualizedRecurring> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM actualized_recurrings WHERE id = ?1"),
        [id],
        ActualizedRecurring::from_row,
    )
    .optional()
    .context(format!("load snapshot {id}"))?
    .ok_or_else(|| LedgerError::not_found("actualized recurring", id))
}

pub fn exists_for(conn: &Connection, template_id: i64, period_id: i64) -> Result<bool> {
    let found: bool = conn
        .query_row(
            "SELECT EXISTS (SELECT 1 FROM actualized_recurrings WHERE based_on_id = ?1 AND period_id = ?2)",
            [template_id, period_id],
            |row| row.get(0),
        )
        .context(format!("check recurring {template_id} in period {period_id}"))?;
    Ok(found)
}

pub fn list_for_period(conn: &Connection, period_id: i64) -> Result<Vec<ActualizedRecurring>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {COLUMNS} FROM actualized_recurrings WHERE period_id = ?1 ORDER BY occurrence_day, id"
        ))
        .context("list snapshots")?;
    let rows = stmt
        .query_map([period_id], ActualizedRecurring::from_row)
        .context(format!("list snapshots of period {period_id}"))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .context("scan snapshots")?;
    Ok(rows)
}

pub fn count_for(conn: &Connection, template_id: i64, period_id: i64) -> Result<i64> {
    let n = conn
        .query_row(
            "SELECT count(*) FROM actualized_recurrings WHERE based_on_id = ?1 AND period_id = ?2",
            [template_id, period_id],
            |row| row.get(0),
        )
        .context("count snapshots")?;
    Ok(n)
}
