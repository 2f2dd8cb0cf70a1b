use std::io::Write;
use std::path::PathBuf;

use tally::error::Result;
use tally::fmt::{date, decimal};
use tally::models::{Transaction, TransactionQuery};
use tally::settings::get_data_dir;

use super::{open_ledger, resolve_account};

const HEADER: [&str; 7] = ["id", "date", "name", "amount", "category_id", "recurring", "can_delete"];

pub fn run(account: Option<i64>, period: Option<i64>, output: Option<String>) -> Result<()> {
    let ledger = open_ledger()?;
    let account_id = resolve_account(&ledger, account)?;
    let period_id = match period {
        Some(id) => ledger.account_period(account_id, id)?.id,
        None => ledger.active_period(account_id)?.id,
    };
    let query = TransactionQuery {
        period_id: Some(period_id),
        limit: Some(u32::MAX),
        offset: None,
    };
    let mut rows = ledger.transactions(account_id, &query)?;
    rows.reverse();

    let path = output.map(PathBuf::from).unwrap_or_else(|| {
        get_data_dir()
            .join("exports")
            .join(format!("tally-{account_id}-{period_id}.csv"))
    });
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(&path)?;
    write_register(&rows, file)?;
    println!("Wrote {} transactions to {}", rows.len(), path.display());
    Ok(())
}

/// Oldest first, amounts as plain decimals.
pub fn write_register(rows: &[Transaction], writer: impl Write) -> Result<()> {
    let mut csv = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);
    csv.write_record(HEADER)?;
    for txn in rows {
        csv.write_record([
            txn.id.to_string(),
            date(txn.date),
            txn.name.clone(),
            decimal(txn.amount),
            txn.category_id.map(|id| id.to_string()).unwrap_or_default(),
            txn.actualized_recurring_id.is_some().to_string(),
            txn.can_delete.to_string(),
        ])?;
    }
    csv.flush()?;
    Ok(())
}
