use comfy_table::{Cell, Table};

use tally::error::Result;
use tally::fmt::{date, money};

use super::{open_ledger, resolve_account, signed};

pub fn list(account: Option<i64>) -> Result<()> {
    let ledger = open_ledger()?;
    let account_id = resolve_account(&ledger, account)?;

    let mut table = Table::new();
    table.set_header(vec!["ID", "Start", "End", "Status", "Transactions", "Balance"]);
    for row in ledger.period_balances(account_id)? {
        let status = match row.period.closed_on {
            Some(closed) => format!("closed {}", date(closed)),
            None => "open".to_string(),
        };
        table.add_row(vec![
            Cell::new(row.period.id),
            Cell::new(date(row.period.reporting_start)),
            Cell::new(date(row.period.reporting_end)),
            Cell::new(status),
            Cell::new(row.transaction_count),
            Cell::new(signed(row.balance)),
        ]);
    }
    println!("Periods\n{table}");
    Ok(())
}

pub fn rollover(account: Option<i64>) -> Result<()> {
    let mut ledger = open_ledger()?;
    let account_id = resolve_account(&ledger, account)?;
    let period = ledger.rollover(account_id)?;
    let opening = ledger.balance(account_id, Some(period.id))?;
    println!(
        "Opened period {} ({} to {}) with opening balance {}",
        period.id,
        date(period.reporting_start),
        date(period.reporting_end),
        money(opening)
    );
    Ok(())
}
