use std::path::Path;
use std::time::Duration;

use rusqlite::Connection;
use tracing::{debug, warn};

use crate::error::{Result, StoreContext};

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS accounts (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    period_start_day INTEGER NOT NULL,
    can_delete INTEGER NOT NULL DEFAULT 1,
    created_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS periods (
    id INTEGER PRIMARY KEY,
    account_id INTEGER NOT NULL,
    reporting_start INTEGER NOT NULL,
    reporting_end INTEGER NOT NULL,
    opened_on INTEGER NOT NULL,
    closed_on INTEGER,
    FOREIGN KEY (account_id) REFERENCES accounts(id)
);

-- at most one open period per account
CREATE UNIQUE INDEX IF NOT EXISTS idx_periods_open
    ON periods(account_id) WHERE closed_on IS NULL;

CREATE TABLE IF NOT EXISTS categories (
    id INTEGER PRIMARY KEY,
    account_id INTEGER NOT NULL,
    name TEXT NOT NULL,
    color TEXT,
    FOREIGN KEY (account_id) REFERENCES accounts(id)
);

CREATE TABLE IF NOT EXISTS recurrings (
    id INTEGER PRIMARY KEY,
    account_id INTEGER NOT NULL,
    category_id INTEGER,
    name TEXT NOT NULL,
    amount INTEGER NOT NULL,
    occurrence_day INTEGER NOT NULL,
    created_at INTEGER NOT NULL,
    FOREIGN KEY (account_id) REFERENCES accounts(id),
    FOREIGN KEY (category_id) REFERENCES categories(id)
);

CREATE TABLE IF NOT EXISTS actualized_recurrings (
    id INTEGER PRIMARY KEY,
    based_on_id INTEGER,
    account_id INTEGER NOT NULL,
    period_id INTEGER NOT NULL,
    category_id INTEGER,
    name TEXT NOT NULL,
    amount INTEGER NOT NULL,
    occurrence_day INTEGER NOT NULL,
    created_at INTEGER NOT NULL,
    FOREIGN KEY (based_on_id) REFERENCES recurrings(id) ON DELETE SET NULL,
    FOREIGN KEY (account_id) REFERENCES accounts(id),
    FOREIGN KEY (period_id) REFERENCES periods(id),
    FOREIGN KEY (category_id) REFERENCES categories(id) ON DELETE SET NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_actualized_once
    ON actualized_recurrings(based_on_id, period_id);

CREATE TABLE IF NOT EXISTS transactions (
    id INTEGER PRIMARY KEY,
    account_id INTEGER NOT NULL,
    period_id INTEGER NOT NULL,
    category_id INTEGER,
    actualized_recurring_id INTEGER,
    name TEXT NOT NULL,
    amount INTEGER NOT NULL,
    date INTEGER NOT NULL,
    can_delete INTEGER NOT NULL DEFAULT 1,
    created_at INTEGER NOT NULL,
    FOREIGN KEY (account_id) REFERENCES accounts(id),
    FOREIGN KEY (period_id) REFERENCES periods(id),
    FOREIGN KEY (category_id) REFERENCES categories(id),
    FOREIGN KEY (actualized_recurring_id) REFERENCES actualized_recurrings(id)
);

CREATE INDEX IF NOT EXISTS idx_transactions_period
    ON transactions(account_id, period_id);

CREATE TRIGGER IF NOT EXISTS trg_transactions_release_actualized
AFTER DELETE ON transactions
WHEN OLD.actualized_recurring_id IS NOT NULL
BEGIN
    DELETE FROM actualized_recurrings WHERE id = OLD.actualized_recurring_id;
END;
";

pub fn get_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path).context(format!("open {}", db_path.display()))?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
        .context("configure connection")?;
    conn.busy_timeout(Duration::from_secs(5))
        .context("configure connection")?;
    Ok(conn)
}

pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory().context("open in-memory database")?;
    conn.execute_batch("PRAGMA foreign_keys=ON;")
        .context("configure connection")?;
    Ok(conn)
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA).context("create schema")?;
    Ok(())
}

pub fn has_accounts(conn: &Connection) -> Result<bool> {
    let count: i64 = conn
        .query_row("SELECT count(*) FROM accounts", [], |row| row.get(0))
        .context("count accounts")?;
    Ok(count > 0)
}

/// Run `work` inside one SQLite transaction: commit when it returns `Ok`,
/// roll back every write when it returns `Err`.
pub fn unit_of_work<T>(
    conn: &mut Connection,
    label: &str,
    work: impl FnOnce(&Connection) -> Result<T>,
) -> Result<T> {
    let tx = conn.transaction().context(format!("begin {label}"))?;
    match work(&tx) {
        Ok(value) => {
            tx.commit().context(format!("commit {label}"))?;
            debug!(label, "unit of work committed");
            Ok(value)
        }
        Err(err) => {
            // the work's error is what the caller needs; a failed rollback is only logged
            match tx.rollback() {
                Ok(()) => debug!(label, error = %err, "unit of work rolled back"),
                Err(rollback_err) => warn!(
                    label,
                    error = %err,
                    rollback_error = %rollback_err,
                    "unit of work rollback failed"
                ),
            }
            Err(err)
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::LedgerError;

    pub(crate) fn test_db() -> (tempfile::TempDir, Connection) {
        let dir = tempfile::tempdir().unwrap();
        let conn = get_connection(&dir.path().join("test.db")).unwrap();
        init_db(&conn).unwrap();
        (dir, conn)
    }

    #[test]
    fn test_init_db_creates_tables() {
        let (_dir, conn) = test_db();
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();
        for expected in &[
            "accounts",
            "periods",
            "categories",
            "transactions",
            "recurrings",
            "actualized_recurrings",
        ] {
            assert!(tables.contains(&expected.to_string()), "missing table: {expected}");
        }
    }

    #[test]
    fn test_init_db_is_idempotent() {
        let (_dir, conn) = test_db();
        init_db(&conn).unwrap();
        assert!(!has_accounts(&conn).unwrap());
    }

    #[test]
    fn test_second_open_period_rejected_by_index() {
        let (_dir, conn) = test_db();
        conn.execute(
            "INSERT INTO accounts (name, period_start_day, created_at) VALUES ('Test', 1, 0)", [],
        ).unwrap();
        let acct = conn.last_insert_rowid();
        let insert = "INSERT INTO periods (account_id, reporting_start, reporting_end, opened_on) \
                      VALUES (?1, 0, 0, 0)";
        conn.execute(insert, [acct]).unwrap();
        let err = conn.execute(insert, [acct]).unwrap_err();
        assert!(crate::error::is_constraint_violation(&err));
    }

    #[test]
    fn test_unit_of_work_commits() {
        let (_dir, mut conn) = test_db();
        unit_of_work(&mut conn, "seed", |c| {
            c.execute(
                "INSERT INTO accounts (name, period_start_day, created_at) VALUES ('A', 1, 0)", [],
            )?;
            Ok(())
        })
        .unwrap();
        assert!(has_accounts(&conn).unwrap());
    }

    #[test]
    fn test_unit_of_work_rolls_back_on_error() {
        let (_dir, mut conn) = test_db();
        let err = unit_of_work(&mut conn, "seed", |c| {
            c.execute(
                "INSERT INTO accounts (name, period_start_day, created_at) VALUES ('A', 1, 0)", [],
            )?;
            Err::<(), _>(LedgerError::Invalid("boom".into()))
        })
        .unwrap_err();
        assert_eq!(err.code(), "INVALID");
        assert!(!has_accounts(&conn).unwrap());
    }

    #[test]
    fn test_failed_rollback_keeps_original_error() {
        let (_dir, mut conn) = test_db();
        let err = unit_of_work(&mut conn, "seed", |c| {
            c.execute(
                "INSERT INTO accounts (name, period_start_day, created_at) VALUES ('A', 1, 0)", [],
            )?;
            // end the transaction early so the rollback has nothing to undo
            c.execute_batch("ROLLBACK")?;
            Err::<(), _>(LedgerError::Invalid("boom".into()))
        })
        .unwrap_err();
        assert!(matches!(err, LedgerError::Invalid(ref msg) if msg == "boom"), "got {err:?}");
        assert!(!has_accounts(&conn).unwrap());
    }
}
