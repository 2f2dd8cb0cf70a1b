//! Balances are derived on every read from the stored transactions; there is
//! no cached running total. Scoping is by the transaction's `period_id`, not
//! by its date, and all sums stay in integer cents.

use rusqlite::Connection;

use crate::error::{Result, StoreContext};
use crate::models::PeriodBalance;
use crate::store::periods;

/// Sum of transaction amounts for the account, restricted to `period_id`
/// when given. An account or period without transactions has balance 0.
pub fn balance(conn: &Connection, account_id: i64, period_id: Option<i64>) -> Result<i64> {
    let total: i64 = match period_id {
        Some(period_id) => conn
            .query_row(
                "SELECT COALESCE(SUM(amount), 0) FROM transactions WHERE account_id = ?1 AND period_id = ?2",
                [account_id, period_id],
                |row| row.get(0),
            )
            .context(format!("balance of account {account_id} in period {period_id}"))?,
        None => conn
            .query_row(
                "SELECT COALESCE(SUM(amount), 0) FROM transactions WHERE account_id = ?1",
                [account_id],
                |row| row.get(0),
            )
            .context(format!("balance of account {account_id}"))?,
    };
    Ok(total)
}

/// Every period of the account (newest first) with its scoped balance.
pub fn period_balances(conn: &Connection, account_id: i64) -> Result<Vec<PeriodBalance>> {
    let mut stmt = conn
        .prepare(
            "SELECT COALESCE(SUM(amount), 0), count(*) FROM transactions \
             WHERE account_id = ?1 AND period_id = ?2",
        )
        .context("prepare period balances")?;

    let mut out = Vec::new();
    for period in periods::list(conn, account_id)? {
        let (balance, transaction_count): (i64, i64) = stmt
            .query_row([account_id, period.id], |row| Ok((row.get(0)?, row.get(1)?)))
            .context(format!("balance of period {}", period.id))?;
        out.push(PeriodBalance {
            period,
            balance,
            transaction_count,
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::tests::test_db;
    use crate::store::accounts;
    use crate::store::transactions::{self, TransactionDraft};
    use chrono::{TimeZone, Utc};

    fn add(conn: &Connection, account_id: i64, period_id: i64, amount: i64, day: u32) {
        let draft = TransactionDraft {
            account_id,
            period_id,
            category_id: None,
            actualized_recurring_id: None,
            name: "Item".to_string(),
            amount,
            date: Utc.with_ymd_and_hms(2025, 1, day, 12, 0, 0).unwrap(),
            can_delete: true,
        };
        transactions::insert(conn, &draft, Utc::now()).unwrap();
    }

    #[test]
    fn test_empty_balance_is_zero() {
        let (_dir, conn) = test_db();
        let acct = accounts::insert(&conn, "Test", 7, true, Utc::now()).unwrap();
        assert_eq!(balance(&conn, acct.id, None).unwrap(), 0);
        assert_eq!(balance(&conn, acct.id, Some(99)).unwrap(), 0);
    }

    #[test]
    fn test_scoped_by_period_not_by_date() {
        let (_dir, conn) = test_db();
        let acct = accounts::insert(&conn, "Test", 7, true, Utc::now()).unwrap();
        let jan_start = Utc.with_ymd_and_hms(2025, 1, 7, 12, 0, 0).unwrap();
        let jan_end = Utc.with_ymd_and_hms(2025, 2, 6, 12, 0, 0).unwrap();
        let p1 = periods::insert(&conn, acct.id, jan_start, jan_end, jan_start).unwrap();
        periods::mark_closed(&conn, p1.id, jan_end).unwrap();
        let p2 = periods::insert(&conn, acct.id, jan_end, jan_end, jan_end).unwrap();

        add(&conn, acct.id, p1.id, 10000, 10);
        add(&conn, acct.id, p1.id, -2500, 12);
        // dated inside p1's window but scoped to p2
        add(&conn, acct.id, p2.id, -700, 15);

        assert_eq!(balance(&conn, acct.id, Some(p1.id)).unwrap(), 7500);
        assert_eq!(balance(&conn, acct.id, Some(p2.id)).unwrap(), -700);
        assert_eq!(balance(&conn, acct.id, None).unwrap(), 6800);
    }

    #[test]
    fn test_other_accounts_excluded() {
        let (_dir, conn) = test_db();
        let a = accounts::insert(&conn, "A", 1, true, Utc::now()).unwrap();
        let b = accounts::insert(&conn, "B", 1, true, Utc::now()).unwrap();
        let now = Utc::now();
        let pa = periods::insert(&conn, a.id, now, now, now).unwrap();
        let pb = periods::insert(&conn, b.id, now, now, now).unwrap();
        add(&conn, a.id, pa.id, 500, 1);
        add(&conn, b.id, pb.id, 900, 1);
        assert_eq!(balance(&conn, a.id, None).unwrap(), 500);
        assert_eq!(balance(&conn, b.id, Some(pb.id)).unwrap(), 900);
    }

    #[test]
    fn test_period_balances() {
        let (_dir, conn) = test_db();
        let acct = accounts::insert(&conn, "Test", 1, true, Utc::now()).unwrap();
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();
        let p1 = periods::insert(&conn, acct.id, now, now, now).unwrap();
        add(&conn, acct.id, p1.id, 300, 2);
        add(&conn, acct.id, p1.id, 200, 3);
        let rows = period_balances(&conn, acct.id).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].balance, 500);
        assert_eq!(rows[0].transaction_count, 2);
    }
}
