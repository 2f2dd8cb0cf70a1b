use tally::error::{Result, StoreContext};
use tally::fmt::format_bytes;
use tally::settings::load_settings;

use super::open_ledger_with;

pub fn run() -> Result<()> {
    let settings = load_settings();
    let db_path = settings.db_path();

    println!("Data dir:   {}", settings.data_dir);
    println!("Database:   {}", db_path.display());

    if db_path.exists() {
        let size = std::fs::metadata(&db_path)?.len();
        println!("DB size:    {}", format_bytes(size));

        let ledger = open_ledger_with(&settings)?;
        let conn = ledger.connection();
        let count = |sql: &str| -> Result<i64> {
            conn.query_row(sql, [], |r| r.get(0)).context(sql.to_string())
        };

        println!();
        println!("Accounts:      {}", count("SELECT count(*) FROM accounts")?);
        println!("Open periods:  {}", count("SELECT count(*) FROM periods WHERE closed_on IS NULL")?);
        println!("Transactions:  {}", count("SELECT count(*) FROM transactions")?);
        println!("Recurring:     {}", count("SELECT count(*) FROM recurrings")?);
        println!("Categories:    {}", count("SELECT count(*) FROM categories")?);
    } else {
        println!();
        println!("Database not found. Run `tally init` to set up.");
    }

    Ok(())
}
