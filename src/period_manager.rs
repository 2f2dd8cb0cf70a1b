//! Reporting-period lifecycle: one open period per account, closed periods
//! are terminal, and a rollover carries the closing balance into the next
//! period as a non-deletable "Opening Balance" transaction.
//!
//! None of these functions open a storage transaction themselves; the
//! `Ledger` runs each public operation inside `db::unit_of_work`.

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use rusqlite::Connection;
use tracing::info;

use crate::balance::balance;
use crate::error::{LedgerError, Result};
use crate::models::Period;
use crate::store::transactions::{self, TransactionDraft};
use crate::store::{accounts, periods};

pub const OPENING_BALANCE: &str = "Opening Balance";

pub fn validate_start_day(start_day: u32) -> Result<()> {
    if (1..=31).contains(&start_day) {
        Ok(())
    } else {
        Err(LedgerError::Invalid(format!(
            "period start day must be between 1 and 31, got {start_day}"
        )))
    }
}

fn last_day_of_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .map(|d| d.day())
        .unwrap_or(28)
}

/// `day` of the given month at 12:00 UTC, clamped to the month's last day.
fn noon_on(year: i32, month: u32, day: u32) -> Result<DateTime<Utc>> {
    let day = day.min(last_day_of_month(year, month));
    Utc.with_ymd_and_hms(year, month, day, 12, 0, 0)
        .single()
        .ok_or_else(|| LedgerError::Invalid(format!("no such date {year:04}-{month:02}-{day:02}")))
}

/// Start of the very first period: `start_day` of the current month at noon.
pub fn first_reporting_start(today: DateTime<Utc>, start_day: u32) -> Result<DateTime<Utc>> {
    noon_on(today.year(), today.month(), start_day)
}

/// One calendar month after `previous_start`, on `start_day` (clamped).
pub fn next_reporting_start(previous_start: DateTime<Utc>, start_day: u32) -> Result<DateTime<Utc>> {
    let (year, month) = if previous_start.month() == 12 {
        (previous_start.year() + 1, 1)
    } else {
        (previous_start.year(), previous_start.month() + 1)
    };
    noon_on(year, month, start_day)
}

/// Last day of the window, the day before the next period would start.
pub fn reporting_end(start: DateTime<Utc>, start_day: u32) -> Result<DateTime<Utc>> {
    Ok(next_reporting_start(start, start_day)? - Duration::days(1))
}

/// The account's open period. `NotFound` if there is none, `Inconsistent`
/// if there is more than one.
pub fn get_active_period(conn: &Connection, account_id: i64) -> Result<Period> {
    accounts::get(conn, account_id)?;
    let mut open = periods::open_for_account(conn, account_id)?;
    match open.len() {
        0 => Err(LedgerError::not_found("active period for account", account_id)),
        1 => Ok(open.remove(0)),
        n => Err(LedgerError::Inconsistent(format!(
            "account {account_id} has {n} open periods"
        ))),
    }
}

pub fn get_period(conn: &Connection, period_id: i64) -> Result<Period> {
    periods::get(conn, period_id)
}

pub fn list_periods(conn: &Connection, account_id: i64) -> Result<Vec<Period>> {
    accounts::get(conn, account_id)?;
    periods::list(conn, account_id)
}

pub fn close_period(conn: &Connection, period_id: i64, now: DateTime<Utc>) -> Result<()> {
    let period = periods::get(conn, period_id)?;
    if !period.is_open() || !periods::mark_closed(conn, period_id, now)? {
        return Err(LedgerError::PeriodClosed(period_id));
    }
    info!(period_id, account_id = period.account_id, "period closed");
    Ok(())
}

/// Open a new period for the account.
///
/// Without `previous` this is the account's first period ever: it starts on
/// `start_day` of the current month and opens with a zero balance. An
/// account with any period history is `Inconsistent` here. With `previous`
/// (which must be the account's open period) the new window starts one
/// month after the previous one, the previous period is closed, and its
/// balance is carried into the new period.
pub fn start_period(
    conn: &Connection,
    account_id: i64,
    start_day: u32,
    previous: Option<&Period>,
    now: DateTime<Utc>,
) -> Result<Period> {
    validate_start_day(start_day)?;
    accounts::get(conn, account_id)?;

    match previous {
        None => {
            if let Some(existing) = periods::list(conn, account_id)?.first() {
                return Err(LedgerError::Inconsistent(format!(
                    "account {account_id} already has period {}, roll over instead",
                    existing.id
                )));
            }
            let start = first_reporting_start(now, start_day)?;
            open_period(conn, account_id, start_day, start, start, 0, now)
        }
        Some(prev) => {
            if prev.account_id != account_id {
                return Err(LedgerError::Invalid(format!(
                    "period {} belongs to account {}, not {account_id}",
                    prev.id, prev.account_id
                )));
            }
            // reload: the caller's copy may be stale
            let current = periods::get(conn, prev.id)?;
            if !current.is_open() {
                return Err(LedgerError::PeriodClosed(current.id));
            }
            let start = next_reporting_start(current.reporting_start, start_day)?;
            let ending_balance = balance(conn, account_id, Some(current.id))?;
            close_period(conn, current.id, now)?;
            open_period(conn, account_id, start_day, start, now, ending_balance, now)
        }
    }
}

/// Insert the period row and its non-deletable opening balance transaction.
fn open_period(
    conn: &Connection,
    account_id: i64,
    start_day: u32,
    reporting_start: DateTime<Utc>,
    opened_on: DateTime<Utc>,
    opening_balance: i64,
    now: DateTime<Utc>,
) -> Result<Period> {
    let end = reporting_end(reporting_start, start_day)?;
    let period = periods::insert(conn, account_id, reporting_start, end, opened_on)?;

    transactions::insert(
        conn,
        &TransactionDraft {
            account_id,
            period_id: period.id,
            category_id: None,
            actualized_recurring_id: None,
            name: OPENING_BALANCE.to_string(),
            amount: opening_balance,
            date: now,
            can_delete: false,
        },
        now,
    )?;

    info!(
        account_id,
        period_id = period.id,
        reporting_start = %period.reporting_start.date_naive(),
        reporting_end = %period.reporting_end.date_naive(),
        opening_balance,
        "period opened"
    );
    Ok(period)
}

/// Close the account's open period and open the next one.
///
/// An account left without an open period (its latest period closed on its
/// own) is resumed from that latest period: the next window follows it and
/// opens with its balance.
pub fn rollover(conn: &Connection, account_id: i64, now: DateTime<Utc>) -> Result<Period> {
    let account = accounts::get(conn, account_id)?;
    let mut open = periods::open_for_account(conn, account_id)?;
    match open.len() {
        1 => {
            let active = open.remove(0);
            start_period(conn, account_id, account.period_start_day, Some(&active), now)
        }
        0 => {
            let latest = periods::list(conn, account_id)?
                .into_iter()
                .next()
                .ok_or_else(|| LedgerError::not_found("active period for account", account_id))?;
            let start = next_reporting_start(latest.reporting_start, account.period_start_day)?;
            let carried = balance(conn, account_id, Some(latest.id))?;
            info!(account_id, period_id = latest.id, "resuming after closed period");
            open_period(conn, account_id, account.period_start_day, start, now, carried, now)
        }
        n => Err(LedgerError::Inconsistent(format!(
            "account {account_id} has {n} open periods"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::tests::test_db;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn add_txn(conn: &Connection, period: &Period, amount: i64) {
        let draft = TransactionDraft {
            account_id: period.account_id,
            period_id: period.id,
            category_id: None,
            actualized_recurring_id: None,
            name: "Item".to_string(),
            amount,
            date: period.reporting_start,
            can_delete: true,
        };
        transactions::insert(conn, &draft, Utc::now()).unwrap();
    }

    fn opening_row(conn: &Connection, period_id: i64) -> (i64, bool) {
        conn.query_row(
            "SELECT amount, can_delete FROM transactions WHERE period_id = ?1 AND name = ?2",
            rusqlite::params![period_id, OPENING_BALANCE],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .unwrap()
    }

    #[test]
    fn test_first_reporting_start_uses_current_month() {
        assert_eq!(first_reporting_start(at(2025, 3, 15, 23), 7).unwrap(), at(2025, 3, 7, 12));
        assert_eq!(first_reporting_start(at(2025, 3, 2, 1), 7).unwrap(), at(2025, 3, 7, 12));
    }

    #[test]
    fn test_start_day_clamped_to_month_length() {
        assert_eq!(first_reporting_start(at(2025, 2, 10, 0), 31).unwrap(), at(2025, 2, 28, 12));
        assert_eq!(first_reporting_start(at(2024, 2, 10, 0), 30).unwrap(), at(2024, 2, 29, 12));
        assert_eq!(next_reporting_start(at(2025, 1, 31, 12), 31).unwrap(), at(2025, 2, 28, 12));
        // the configured day comes back after a short month
        assert_eq!(next_reporting_start(at(2025, 2, 28, 12), 31).unwrap(), at(2025, 3, 31, 12));
    }

    #[test]
    fn test_next_reporting_start_wraps_year() {
        assert_eq!(next_reporting_start(at(2024, 12, 7, 12), 7).unwrap(), at(2025, 1, 7, 12));
    }

    #[test]
    fn test_reporting_end() {
        assert_eq!(reporting_end(at(2025, 1, 7, 12), 7).unwrap(), at(2025, 2, 6, 12));
        assert_eq!(reporting_end(at(2025, 1, 1, 12), 1).unwrap(), at(2025, 1, 31, 12));
        assert_eq!(reporting_end(at(2025, 1, 31, 12), 31).unwrap(), at(2025, 2, 27, 12));
    }

    #[test]
    fn test_validate_start_day() {
        assert!(validate_start_day(1).is_ok());
        assert!(validate_start_day(31).is_ok());
        assert!(matches!(validate_start_day(0), Err(LedgerError::Invalid(_))));
        assert!(matches!(validate_start_day(32), Err(LedgerError::Invalid(_))));
    }

    #[test]
    fn test_first_period_opens_on_start_day() {
        let (_dir, conn) = test_db();
        let now = at(2025, 3, 15, 9);
        let acct = accounts::insert(&conn, "Checking", 7, false, now).unwrap();
        let period = start_period(&conn, acct.id, 7, None, now).unwrap();
        assert_eq!(period.reporting_start, at(2025, 3, 7, 12));
        assert_eq!(period.opened_on, at(2025, 3, 7, 12));
        assert_eq!(period.reporting_end, at(2025, 4, 6, 12));
        assert!(period.is_open());
        assert_eq!(balance(&conn, acct.id, Some(period.id)).unwrap(), 0);
        assert_eq!(get_active_period(&conn, acct.id).unwrap(), period);
    }

    #[test]
    fn test_rollover_carries_balance() {
        let (_dir, conn) = test_db();
        let now = at(2025, 3, 15, 9);
        let acct = accounts::insert(&conn, "Checking", 7, false, now).unwrap();
        let p1 = start_period(&conn, acct.id, 7, None, now).unwrap();
        add_txn(&conn, &p1, 20000);
        add_txn(&conn, &p1, -5000);
        let closing = balance(&conn, acct.id, Some(p1.id)).unwrap();
        assert_eq!(closing, 15000);

        let later = at(2025, 4, 8, 10);
        let p2 = rollover(&conn, acct.id, later).unwrap();

        assert_eq!(p2.reporting_start, at(2025, 4, 7, 12));
        assert_eq!(p2.opened_on, later);
        assert_eq!(balance(&conn, acct.id, Some(p2.id)).unwrap(), closing);
        assert_eq!(opening_row(&conn, p2.id), (15000, false));

        let closed = periods::get(&conn, p1.id).unwrap();
        assert_eq!(closed.closed_on, Some(later));
        assert_eq!(get_active_period(&conn, acct.id).unwrap().id, p2.id);
    }

    #[test]
    fn test_repeated_rollovers_do_not_double_count() {
        let (_dir, conn) = test_db();
        let now = at(2025, 1, 2, 9);
        let acct = accounts::insert(&conn, "Checking", 1, false, now).unwrap();
        let p1 = start_period(&conn, acct.id, 1, None, now).unwrap();
        add_txn(&conn, &p1, 15000);
        let p2 = rollover(&conn, acct.id, at(2025, 2, 1, 13)).unwrap();
        add_txn(&conn, &p2, -5000);
        let p3 = rollover(&conn, acct.id, at(2025, 3, 1, 13)).unwrap();
        assert_eq!(opening_row(&conn, p3.id).0, 10000);
        assert_eq!(balance(&conn, acct.id, Some(p3.id)).unwrap(), 10000);
        assert_eq!(p3.reporting_start, at(2025, 3, 1, 12));
        assert_eq!(list_periods(&conn, acct.id).unwrap().len(), 3);
    }

    #[test]
    fn test_second_first_period_is_inconsistent() {
        let (_dir, conn) = test_db();
        let now = at(2025, 1, 2, 9);
        let acct = accounts::insert(&conn, "Checking", 1, false, now).unwrap();
        start_period(&conn, acct.id, 1, None, now).unwrap();
        let err = start_period(&conn, acct.id, 1, None, now).unwrap_err();
        assert!(matches!(err, LedgerError::Inconsistent(_)), "got {err:?}");
    }

    #[test]
    fn test_start_from_closed_previous_fails() {
        let (_dir, conn) = test_db();
        let now = at(2025, 1, 2, 9);
        let acct = accounts::insert(&conn, "Checking", 1, false, now).unwrap();
        let p1 = start_period(&conn, acct.id, 1, None, now).unwrap();
        rollover(&conn, acct.id, at(2025, 2, 1, 13)).unwrap();
        let err = start_period(&conn, acct.id, 1, Some(&p1), now).unwrap_err();
        assert!(matches!(err, LedgerError::PeriodClosed(id) if id == p1.id));
    }

    #[test]
    fn test_previous_from_other_account_is_invalid() {
        let (_dir, conn) = test_db();
        let now = at(2025, 1, 2, 9);
        let a = accounts::insert(&conn, "A", 1, true, now).unwrap();
        let b = accounts::insert(&conn, "B", 1, true, now).unwrap();
        let pa = start_period(&conn, a.id, 1, None, now).unwrap();
        start_period(&conn, b.id, 1, None, now).unwrap();
        let err = start_period(&conn, b.id, 1, Some(&pa), now).unwrap_err();
        assert!(matches!(err, LedgerError::Invalid(_)));
    }

    #[test]
    fn test_close_period_is_terminal() {
        let (_dir, conn) = test_db();
        let now = at(2025, 1, 2, 9);
        let acct = accounts::insert(&conn, "Checking", 1, false, now).unwrap();
        let p1 = start_period(&conn, acct.id, 1, None, now).unwrap();
        close_period(&conn, p1.id, now).unwrap();
        assert!(matches!(close_period(&conn, p1.id, now), Err(LedgerError::PeriodClosed(_))));
        assert!(matches!(close_period(&conn, 999, now), Err(LedgerError::NotFound { .. })));
        assert!(matches!(
            get_active_period(&conn, acct.id),
            Err(LedgerError::NotFound { .. })
        ));
    }

    #[test]
    fn test_no_period_is_not_found() {
        let (_dir, conn) = test_db();
        let acct = accounts::insert(&conn, "Checking", 1, false, Utc::now()).unwrap();
        let err = get_active_period(&conn, acct.id).unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");
        assert!(matches!(
            get_active_period(&conn, 404),
            Err(LedgerError::NotFound { entity: "account", id: 404 })
        ));
    }

    #[test]
    fn test_multiple_open_periods_surface_as_inconsistent() {
        let (_dir, conn) = test_db();
        conn.execute_batch("DROP INDEX idx_periods_open").unwrap();
        let now = Utc::now();
        let acct = accounts::insert(&conn, "Checking", 1, false, now).unwrap();
        periods::insert(&conn, acct.id, now, now, now).unwrap();
        periods::insert(&conn, acct.id, now, now, now).unwrap();
        let err = get_active_period(&conn, acct.id).unwrap_err();
        assert!(matches!(err, LedgerError::Inconsistent(_)));
        // nothing was repaired
        assert_eq!(periods::open_for_account(&conn, acct.id).unwrap().len(), 2);
    }

    #[test]
    fn test_unknown_account_is_not_found() {
        let (_dir, conn) = test_db();
        let err = start_period(&conn, 77, 1, None, Utc::now()).unwrap_err();
        assert!(matches!(err, LedgerError::NotFound { entity: "account", .. }));
    }

    #[test]
    fn test_first_period_rejected_once_history_exists() {
        let (_dir, conn) = test_db();
        let now = at(2025, 1, 2, 9);
        let acct = accounts::insert(&conn, "Checking", 1, false, now).unwrap();
        let p1 = start_period(&conn, acct.id, 1, None, now).unwrap();
        close_period(&conn, p1.id, now).unwrap();

        let err = start_period(&conn, acct.id, 1, None, now).unwrap_err();
        assert!(matches!(err, LedgerError::Inconsistent(_)), "got {err:?}");
        assert_eq!(list_periods(&conn, acct.id).unwrap().len(), 1);
    }

    #[test]
    fn test_rollover_resumes_after_lone_close() {
        let (_dir, conn) = test_db();
        let now = at(2025, 3, 15, 9);
        let acct = accounts::insert(&conn, "Checking", 7, false, now).unwrap();
        let p1 = start_period(&conn, acct.id, 7, None, now).unwrap();
        add_txn(&conn, &p1, 15000);
        close_period(&conn, p1.id, now).unwrap();

        let later = at(2025, 4, 8, 10);
        let p2 = rollover(&conn, acct.id, later).unwrap();

        assert_eq!(p2.reporting_start, at(2025, 4, 7, 12));
        assert_ne!(p2.reporting_start, p1.reporting_start);
        assert_eq!(opening_row(&conn, p2.id), (15000, false));
        assert_eq!(balance(&conn, acct.id, Some(p2.id)).unwrap(), 15000);
        assert_eq!(get_active_period(&conn, acct.id).unwrap().id, p2.id);
        // the closed period keeps its original close time
        assert_eq!(periods::get(&conn, p1.id).unwrap().closed_on, Some(now));
    }

    #[test]
    fn test_rollover_without_any_period_is_not_found() {
        let (_dir, conn) = test_db();
        let acct = accounts::insert(&conn, "Checking", 1, false, Utc::now()).unwrap();
        let err = rollover(&conn, acct.id, Utc::now()).unwrap_err();
        assert!(matches!(err, LedgerError::NotFound { .. }));
    }
}
