use comfy_table::{Cell, Table};

use tally::error::Result;
use tally::models::CategoryInput;

use super::{open_ledger, resolve_account};

pub fn add(name: &str, color: Option<String>, account: Option<i64>) -> Result<()> {
    let mut ledger = open_ledger()?;
    let account_id = resolve_account(&ledger, account)?;
    let category = ledger.add_category(
        account_id,
        CategoryInput {
            name: name.to_string(),
            color,
        },
    )?;
    println!("Added category {}: {}", category.id, category.name);
    Ok(())
}

pub fn list(account: Option<i64>) -> Result<()> {
    let ledger = open_ledger()?;
    let account_id = resolve_account(&ledger, account)?;
    let mut table = Table::new();
    table.set_header(vec!["ID", "Name", "Color"]);
    for category in ledger.categories(account_id)? {
        table.add_row(vec![
            Cell::new(category.id),
            Cell::new(category.name),
            Cell::new(category.color.unwrap_or_default()),
        ]);
    }
    println!("Categories\n{table}");
    Ok(())
}

pub fn update(id: i64, name: &str, color: Option<String>) -> Result<()> {
    let mut ledger = open_ledger()?;
    let account_id = ledger.category(id)?.account_id;
    let category = ledger.update_category(
        account_id,
        id,
        CategoryInput {
            name: name.to_string(),
            color,
        },
    )?;
    println!("Updated category {}: {}", category.id, category.name);
    Ok(())
}

pub fn delete(id: i64) -> Result<()> {
    let mut ledger = open_ledger()?;
    ledger.delete_category(id)?;
    println!("Deleted category {id}");
    Ok(())
}
