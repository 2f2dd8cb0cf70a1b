use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{LedgerError, Result, StoreContext};
use crate::models::{to_millis, Period};

const COLUMNS: &str = "id, account_id, reporting_start, reporting_end, opened_on, closed_on";

pub fn insert(
    conn: &Connection,
    account_id: i64,
    reporting_start: DateTime<Utc>,
    reporting_end: DateTime<Utc>,
    opened_on: DateTime<Utc>,
) -> Result<Period> {
    conn.execute(
        "INSERT INTO periods (account_id, reporting_start, reporting_end, opened_on) VALUES (?1, ?2, ?3, ?4)",
        params![
            account_id,
            to_millis(reporting_start),
            to_millis(reporting_end),
            to_millis(opened_on)
        ],
    )
    .context(format!("insert period for account {account_id}"))?;
    get(conn, conn.last_insert_rowid())
}

pub fn get(conn: &Connection, id: i64) -> Result<Period> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM periods WHERE id = ?1"),
        [id],
        Period::from_row,
    )
    .optional()
    .context(format!("load period {id}"))?
    .ok_or_else(|| LedgerError::not_found("period", id))
}

/// Every period of the account with `closed_on` unset. More than one entry
/// means the ledger is inconsistent.
pub fn open_for_account(conn: &Connection, account_id: i64) -> Result<Vec<Period>> {
    query(
        conn,
        &format!("SELECT {COLUMNS} FROM periods WHERE account_id = ?1 AND closed_on IS NULL ORDER BY id"),
        account_id,
    )
}

/// All periods of the account, newest first.
pub fn list(conn: &Connection, account_id: i64) -> Result<Vec<Period>> {
    query(
        conn,
        &format!("SELECT {COLUMNS} FROM periods WHERE account_id = ?1 ORDER BY reporting_start DESC, id DESC"),
        account_id,
    )
}

fn query(conn: &Connection, sql: &str, account_id: i64) -> Result<Vec<Period>> {
    let mut stmt = conn.prepare(sql).context("list periods")?;
    let rows = stmt
        .query_map([account_id], Period::from_row)
        .context(format!("list periods of account {account_id}"))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .context("scan periods")?;
    Ok(rows)
}

/// Stamp `closed_on` on a still-open period. Returns false when the period
/// was already closed (or does not exist).
pub fn mark_closed(conn: &Connection, id: i64, closed_on: DateTime<Utc>) -> Result<bool> {
    let changed = conn
        .execute(
            "UPDATE periods SET closed_on = ?1 WHERE id = ?2 AND closed_on IS NULL",
            params![to_millis(closed_on), id],
        )
        .context(format!("close period {id}"))?;
    Ok(changed == 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::tests::test_db;
    use crate::store::accounts;
    use chrono::TimeZone;

    #[test]
    fn test_insert_roundtrips_timestamps() {
        let (_dir, conn) = test_db();
        let acct = accounts::insert(&conn, "Test", 7, true, Utc::now()).unwrap();
        let start = Utc.with_ymd_and_hms(2025, 1, 7, 12, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2025, 2, 6, 12, 0, 0).unwrap();
        let p = insert(&conn, acct.id, start, end, start).unwrap();
        assert_eq!(p.reporting_start, start);
        assert_eq!(p.reporting_end, end);
        assert!(p.is_open());
        assert_eq!(open_for_account(&conn, acct.id).unwrap().len(), 1);
    }

    #[test]
    fn test_mark_closed_only_once() {
        let (_dir, conn) = test_db();
        let acct = accounts::insert(&conn, "Test", 7, true, Utc::now()).unwrap();
        let now = Utc.with_ymd_and_hms(2025, 1, 7, 12, 0, 0).unwrap();
        let p = insert(&conn, acct.id, now, now, now).unwrap();
        assert!(mark_closed(&conn, p.id, now).unwrap());
        assert!(!mark_closed(&conn, p.id, now).unwrap());
        assert_eq!(get(&conn, p.id).unwrap().closed_on, Some(now));
        assert!(open_for_account(&conn, acct.id).unwrap().is_empty());
    }
}
