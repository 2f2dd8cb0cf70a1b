use comfy_table::{Cell, Table};

use tally::error::Result;
use tally::fmt::{date, money, parse_date, parse_money};
use tally::models::{NewTransaction, TransactionQuery, TransactionUpdate};

use super::{open_ledger, resolve_account, signed};

pub fn add(
    name: &str,
    amount: &str,
    account: Option<i64>,
    on: Option<&str>,
    category: Option<i64>,
) -> Result<()> {
    let amount = parse_money(amount)?;
    let date = on.map(parse_date).transpose()?;
    let mut ledger = open_ledger()?;
    let account_id = resolve_account(&ledger, account)?;
    let txn = ledger.add_transaction(
        account_id,
        NewTransaction {
            name: name.to_string(),
            amount,
            date,
            category_id: category,
        },
    )?;
    println!("Added transaction {}: {} {}", txn.id, txn.name, money(txn.amount));
    Ok(())
}

pub fn list(account: Option<i64>, period: Option<i64>, limit: Option<u32>) -> Result<()> {
    let ledger = open_ledger()?;
    let account_id = resolve_account(&ledger, account)?;
    let query = TransactionQuery {
        period_id: period,
        limit,
        offset: None,
    };

    let mut table = Table::new();
    table.set_header(vec!["ID", "Date", "Name", "Amount", "Period", "Category", "Recurring"]);
    for txn in ledger.transactions(account_id, &query)? {
        table.add_row(vec![
            Cell::new(txn.id),
            Cell::new(date(txn.date)),
            Cell::new(&txn.name),
            Cell::new(signed(txn.amount)),
            Cell::new(txn.period_id),
            Cell::new(txn.category_id.map(|id| id.to_string()).unwrap_or_default()),
            Cell::new(if txn.actualized_recurring_id.is_some() { "yes" } else { "" }),
        ]);
    }
    println!("Transactions\n{table}");
    Ok(())
}

pub fn edit(id: i64, name: Option<String>, amount: Option<&str>, category: Option<i64>) -> Result<()> {
    let amount = amount.map(parse_money).transpose()?;
    let category_id = category.map(|id| if id == 0 { None } else { Some(id) });
    let mut ledger = open_ledger()?;
    let txn = ledger.update_transaction(
        id,
        TransactionUpdate {
            name,
            amount,
            category_id,
        },
    )?;
    println!("Updated transaction {}: {} {}", txn.id, txn.name, money(txn.amount));
    Ok(())
}

pub fn delete(id: i64) -> Result<()> {
    let mut ledger = open_ledger()?;
    ledger.delete_transaction(id)?;
    println!("Deleted transaction {id}");
    Ok(())
}
