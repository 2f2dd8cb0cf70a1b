use comfy_table::{Cell, Table};

use tally::error::Result;
use tally::fmt::date;
use tally::models::AccountUpdate;

use super::{open_ledger, signed};

pub fn add(name: &str, start_day: u32) -> Result<()> {
    let mut ledger = open_ledger()?;
    let overview = ledger.add_account(name, start_day)?;
    println!(
        "Added account {}: {} (period {} to {})",
        overview.account.id,
        overview.account.name,
        date(overview.period.reporting_start),
        date(overview.period.reporting_end)
    );
    Ok(())
}

pub fn list() -> Result<()> {
    let ledger = open_ledger()?;
    let mut table = Table::new();
    table.set_header(vec!["ID", "Name", "Start Day", "Active Period", "Balance", "Deletable"]);
    for overview in ledger.list_accounts()? {
        table.add_row(vec![
            Cell::new(overview.account.id),
            Cell::new(&overview.account.name),
            Cell::new(overview.account.period_start_day),
            Cell::new(format!(
                "{} to {}",
                date(overview.period.reporting_start),
                date(overview.period.reporting_end)
            )),
            Cell::new(signed(overview.balance)),
            Cell::new(if overview.account.can_delete { "yes" } else { "no" }),
        ]);
    }
    println!("Accounts\n{table}");
    Ok(())
}

pub fn update(id: i64, name: Option<String>, start_day: Option<u32>) -> Result<()> {
    let mut ledger = open_ledger()?;
    let account = ledger.update_account(
        id,
        AccountUpdate {
            name,
            period_start_day: start_day,
        },
    )?;
    println!(
        "Updated account {}: {} (start day {})",
        account.id, account.name, account.period_start_day
    );
    Ok(())
}

pub fn delete(id: i64) -> Result<()> {
    let mut ledger = open_ledger()?;
    ledger.delete_account(id)?;
    println!("Deleted account {id}");
    Ok(())
}
