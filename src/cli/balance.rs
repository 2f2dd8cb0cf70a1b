use tally::error::Result;
use tally::fmt::date;

use super::{open_ledger, resolve_account, signed};

pub fn run(account: Option<i64>, period: Option<i64>, all: bool) -> Result<()> {
    let ledger = open_ledger()?;
    let account_id = resolve_account(&ledger, account)?;
    let name = ledger.account(account_id)?.account.name;

    if all {
        let total = ledger.balance(account_id, None)?;
        println!("{name}, all periods: {}", signed(total));
        return Ok(());
    }

    let period = match period {
        Some(id) => ledger.account_period(account_id, id)?,
        None => ledger.active_period(account_id)?,
    };
    let total = ledger.balance(account_id, Some(period.id))?;
    println!(
        "{name}, period {} ({} to {}): {}",
        period.id,
        date(period.reporting_start),
        date(period.reporting_end),
        signed(total)
    );
    Ok(())
}
