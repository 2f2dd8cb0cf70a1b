use colored::Colorize;
use comfy_table::{Cell, Table};

use tally::error::Result;
use tally::fmt::{money, parse_money};
use tally::models::RecurringInput;

use super::{open_ledger, resolve_account, signed};

pub fn add(name: &str, amount: &str, day: u32, category: Option<i64>, account: Option<i64>) -> Result<()> {
    let input = RecurringInput {
        name: name.to_string(),
        amount: parse_money(amount)?,
        occurrence_day: day,
        category_id: category,
    };
    let mut ledger = open_ledger()?;
    let account_id = resolve_account(&ledger, account)?;
    let recurring = ledger.add_recurring(account_id, input)?;
    println!(
        "Added recurring {}: {} {} on day {}",
        recurring.id,
        recurring.name,
        money(recurring.amount),
        recurring.occurrence_day
    );
    Ok(())
}

pub fn list(account: Option<i64>, period: Option<i64>) -> Result<()> {
    let ledger = open_ledger()?;
    let account_id = resolve_account(&ledger, account)?;

    let mut table = Table::new();
    table.set_header(vec!["ID", "Day", "Name", "Amount", "Category", "Accounted For"]);
    for status in ledger.recurrings(account_id, period)? {
        let r = &status.recurring;
        let accounted = if status.accounted_for {
            "yes".green().to_string()
        } else {
            "no".yellow().to_string()
        };
        table.add_row(vec![
            Cell::new(r.id),
            Cell::new(r.occurrence_day),
            Cell::new(&r.name),
            Cell::new(signed(r.amount)),
            Cell::new(r.category_id.map(|id| id.to_string()).unwrap_or_default()),
            Cell::new(accounted),
        ]);
    }
    println!("Recurring\n{table}");
    Ok(())
}

pub fn update(id: i64, name: &str, amount: &str, day: u32, category: Option<i64>) -> Result<()> {
    let input = RecurringInput {
        name: name.to_string(),
        amount: parse_money(amount)?,
        occurrence_day: day,
        category_id: category,
    };
    let mut ledger = open_ledger()?;
    let recurring = ledger.update_recurring(id, input)?;
    println!("Updated recurring {}: {} {}", recurring.id, recurring.name, money(recurring.amount));
    Ok(())
}

pub fn delete(id: i64) -> Result<()> {
    let mut ledger = open_ledger()?;
    ledger.delete_recurring(id)?;
    println!("Deleted recurring {id}");
    Ok(())
}

pub fn apply(id: i64, period: Option<i64>) -> Result<()> {
    let mut ledger = open_ledger()?;
    let period_id = match period {
        Some(id) => id,
        None => {
            let account_id = ledger.recurring(id)?.account_id;
            ledger.active_period(account_id)?.id
        }
    };
    let applied = ledger.apply_recurring(id, period_id)?;
    println!(
        "Applied '{}' to period {}: transaction {} for {}",
        applied.actualized.name,
        period_id,
        applied.transaction.id,
        money(applied.transaction.amount)
    );
    Ok(())
}
