use std::path::PathBuf;

use tally::error::Result;
use tally::settings::{load_settings, save_settings, shellexpand_path};
use tally::Ledger;

pub fn run(data_dir: Option<String>) -> Result<()> {
    let mut settings = load_settings();
    if let Some(dir) = data_dir {
        settings.data_dir = shellexpand_path(&dir);
    }
    let dir = PathBuf::from(&settings.data_dir);
    std::fs::create_dir_all(&dir)?;
    save_settings(&settings)?;

    let mut ledger = Ledger::open(&settings.db_path())?;
    match ledger.ensure_default_account(&settings.default_account_name, settings.default_period_start_day)? {
        Some(created) => println!(
            "Created account '{}' (period starts on day {})",
            created.account.name, created.account.period_start_day
        ),
        None => println!("Database already has accounts, nothing to create."),
    }
    println!("Data directory: {}", dir.display());
    Ok(())
}
