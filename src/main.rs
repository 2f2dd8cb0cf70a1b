mod cli;

use clap::Parser;

use cli::{
    AccountsCommands, CategoriesCommands, Cli, Commands, PeriodsCommands, RecurringCommands, TxCommands,
};
use tally::logging;
use tally::settings::load_settings;

fn main() {
    let cli = Cli::parse();
    logging::init(&load_settings().log_level);

    let result = match cli.command {
        Commands::Init { data_dir } => cli::init::run(data_dir),
        Commands::Accounts { command } => match command {
            AccountsCommands::Add { name, start_day } => cli::accounts::add(&name, start_day),
            AccountsCommands::List => cli::accounts::list(),
            AccountsCommands::Update { id, name, start_day } => cli::accounts::update(id, name, start_day),
            AccountsCommands::Delete { id } => cli::accounts::delete(id),
        },
        Commands::Periods { command } => match command {
            PeriodsCommands::List { account } => cli::periods::list(account),
            PeriodsCommands::Rollover { account } => cli::periods::rollover(account),
        },
        Commands::Tx { command } => match command {
            TxCommands::Add {
                name,
                amount,
                account,
                date,
                category,
            } => cli::transactions::add(&name, &amount, account, date.as_deref(), category),
            TxCommands::List { account, period, limit } => cli::transactions::list(account, period, limit),
            TxCommands::Edit {
                id,
                name,
                amount,
                category,
            } => cli::transactions::edit(id, name, amount.as_deref(), category),
            TxCommands::Delete { id } => cli::transactions::delete(id),
        },
        Commands::Recurring { command } => match command {
            RecurringCommands::Add {
                name,
                amount,
                day,
                category,
                account,
            } => cli::recurring::add(&name, &amount, day, category, account),
            RecurringCommands::List { account, period } => cli::recurring::list(account, period),
            RecurringCommands::Update {
                id,
                name,
                amount,
                day,
                category,
            } => cli::recurring::update(id, &name, &amount, day, category),
            RecurringCommands::Delete { id } => cli::recurring::delete(id),
            RecurringCommands::Apply { id, period } => cli::recurring::apply(id, period),
        },
        Commands::Categories { command } => match command {
            CategoriesCommands::Add { name, color, account } => cli::categories::add(&name, color, account),
            CategoriesCommands::List { account } => cli::categories::list(account),
            CategoriesCommands::Update { id, name, color } => cli::categories::update(id, &name, color),
            CategoriesCommands::Delete { id } => cli::categories::delete(id),
        },
        Commands::Balance { account, period, all } => cli::balance::run(account, period, all),
        Commands::Export {
            account,
            period,
            output,
        } => cli::export::run(account, period, output),
        Commands::Backup { output } => cli::backup::run(output),
        Commands::Status => cli::status::run(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
