//! Orchestration over the store and the period/recurring engine. Every
//! mutating operation runs in a single unit of work, so a failure part-way
//! through a rollover, an actualization or an account deletion leaves the
//! store untouched.

use std::path::Path;

use chrono::Utc;
use rusqlite::Connection;
use tracing::info;

use crate::actualizer;
use crate::balance;
use crate::db::{self, unit_of_work};
use crate::error::{LedgerError, Result};
use crate::models::{
    Account, AccountOverview, AccountUpdate, Actualization, Category, CategoryInput, NewTransaction,
    Period, PeriodBalance, Recurring, RecurringInput, RecurringStatus, Transaction, TransactionQuery,
    TransactionUpdate,
};
use crate::period_manager;
use crate::store::transactions::TransactionDraft;
use crate::store::{accounts, categories, recurrings, transactions};

pub struct Ledger {
    conn: Connection,
}

impl Ledger {
    pub fn open(db_path: &Path) -> Result<Self> {
        Self::from_connection(db::get_connection(db_path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(db::open_in_memory()?)
    }

    pub fn from_connection(conn: Connection) -> Result<Self> {
        db::init_db(&conn)?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// First-run bootstrap: when the store holds no accounts, create the
    /// non-deletable default account and open its first period.
    pub fn ensure_default_account(&mut self, name: &str, start_day: u32) -> Result<Option<AccountOverview>> {
        if db::has_accounts(&self.conn)? {
            return Ok(None);
        }
        let account = self.create_account(name, start_day, false)?;
        info!(account_id = account.id, account = name, "default account created");
        self.account(account.id).map(Some)
    }

    // -----------------------------------------------------------------------
    // Accounts
    // -----------------------------------------------------------------------

    pub fn add_account(&mut self, name: &str, start_day: u32) -> Result<AccountOverview> {
        let account = self.create_account(name, start_day, true)?;
        self.account(account.id)
    }

    fn create_account(&mut self, name: &str, start_day: u32, can_delete: bool) -> Result<Account> {
        let name = non_empty(name, "account name")?;
        period_manager::validate_start_day(start_day)?;
        let now = Utc::now();
        unit_of_work(&mut self.conn, "add account", |conn| {
            let account = accounts::insert(conn, name, start_day, can_delete, now)?;
            period_manager::start_period(conn, account.id, start_day, None, now)?;
            info!(account_id = account.id, account = name, start_day, "account added");
            Ok(account)
        })
    }

    pub fn account(&self, account_id: i64) -> Result<AccountOverview> {
        overview(&self.conn, accounts::get(&self.conn, account_id)?)
    }

    pub fn list_accounts(&self) -> Result<Vec<AccountOverview>> {
        accounts::list(&self.conn)?
            .into_iter()
            .map(|account| overview(&self.conn, account))
            .collect()
    }

    /// Id of the account created at first run, if any.
    pub fn default_account_id(&self) -> Result<Option<i64>> {
        accounts::first_id(&self.conn)
    }

    /// A new start day applies from the next rollover on.
    pub fn update_account(&mut self, account_id: i64, update: AccountUpdate) -> Result<Account> {
        unit_of_work(&mut self.conn, "update account", |conn| {
            let mut account = accounts::get(conn, account_id)?;
            if let Some(name) = update.name.as_deref() {
                account.name = non_empty(name, "account name")?.to_string();
            }
            if let Some(day) = update.period_start_day {
                period_manager::validate_start_day(day)?;
                account.period_start_day = day;
            }
            accounts::update(conn, &account)
        })
    }

    pub fn delete_account(&mut self, account_id: i64) -> Result<()> {
        unit_of_work(&mut self.conn, "delete account", |conn| {
            let account = accounts::get(conn, account_id)?;
            if !account.can_delete {
                return Err(LedgerError::Forbidden(format!(
                    "account '{}' cannot be deleted",
                    account.name
                )));
            }
            accounts::delete(conn, account_id)?;
            info!(account_id, "account deleted");
            Ok(())
        })
    }

    // -----------------------------------------------------------------------
    // Periods and balances
    // -----------------------------------------------------------------------

    pub fn active_period(&self, account_id: i64) -> Result<Period> {
        period_manager::get_active_period(&self.conn, account_id)
    }

    pub fn period(&self, period_id: i64) -> Result<Period> {
        period_manager::get_period(&self.conn, period_id)
    }

    pub fn periods(&self, account_id: i64) -> Result<Vec<Period>> {
        period_manager::list_periods(&self.conn, account_id)
    }

    pub fn period_balances(&self, account_id: i64) -> Result<Vec<PeriodBalance>> {
        accounts::get(&self.conn, account_id)?;
        balance::period_balances(&self.conn, account_id)
    }

    pub fn start_period(
        &mut self,
        account_id: i64,
        start_day: u32,
        previous: Option<&Period>,
    ) -> Result<Period> {
        let now = Utc::now();
        unit_of_work(&mut self.conn, "start period", |conn| {
            period_manager::start_period(conn, account_id, start_day, previous, now)
        })
    }

    /// Close the open period and open the next one, carrying the balance.
    pub fn rollover(&mut self, account_id: i64) -> Result<Period> {
        let now = Utc::now();
        unit_of_work(&mut self.conn, "rollover", |conn| {
            period_manager::rollover(conn, account_id, now)
        })
    }

    /// Close an open period. Its successor is opened in the same unit of
    /// work with the carried balance, so the account always keeps exactly one
    /// open period. Returns the successor.
    pub fn close_period(&mut self, period_id: i64) -> Result<Period> {
        let now = Utc::now();
        unit_of_work(&mut self.conn, "close period", |conn| {
            let period = period_manager::get_period(conn, period_id)?;
            let account = accounts::get(conn, period.account_id)?;
            period_manager::start_period(conn, account.id, account.period_start_day, Some(&period), now)
        })
    }

    /// A period of `account_id`; `Invalid` when it belongs to another account.
    pub fn account_period(&self, account_id: i64, period_id: i64) -> Result<Period> {
        accounts::get(&self.conn, account_id)?;
        period_of(&self.conn, account_id, period_id)
    }

    pub fn balance(&self, account_id: i64, period_id: Option<i64>) -> Result<i64> {
        accounts::get(&self.conn, account_id)?;
        if let Some(id) = period_id {
            period_of(&self.conn, account_id, id)?;
        }
        balance::balance(&self.conn, account_id, period_id)
    }

    // -----------------------------------------------------------------------
    // Transactions
    // -----------------------------------------------------------------------

    /// Record a transaction in the account's active period.
    pub fn add_transaction(&mut self, account_id: i64, input: NewTransaction) -> Result<Transaction> {
        let name = non_empty(&input.name, "transaction name")?.to_string();
        let now = Utc::now();
        unit_of_work(&mut self.conn, "add transaction", |conn| {
            let period = period_manager::get_active_period(conn, account_id)?;
            if let Some(category_id) = input.category_id {
                check_category(conn, account_id, category_id)?;
            }
            transactions::insert(
                conn,
                &TransactionDraft {
                    account_id,
                    period_id: period.id,
                    category_id: input.category_id,
                    actualized_recurring_id: None,
                    name,
                    amount: input.amount,
                    date: input.date.unwrap_or(now),
                    can_delete: true,
                },
                now,
            )
        })
    }

    pub fn transaction(&self, transaction_id: i64) -> Result<Transaction> {
        transactions::get(&self.conn, transaction_id)
    }

    pub fn transactions(&self, account_id: i64, query: &TransactionQuery) -> Result<Vec<Transaction>> {
        accounts::get(&self.conn, account_id)?;
        if let Some(id) = query.period_id {
            period_of(&self.conn, account_id, id)?;
        }
        transactions::list(&self.conn, account_id, query)
    }

    pub fn update_transaction(&mut self, transaction_id: i64, update: TransactionUpdate) -> Result<Transaction> {
        unit_of_work(&mut self.conn, "update transaction", |conn| {
            let mut txn = transactions::get(conn, transaction_id)?;
            ensure_period_open(conn, txn.period_id)?;
            if let Some(name) = update.name.as_deref() {
                txn.name = non_empty(name, "transaction name")?.to_string();
            }
            if let Some(amount) = update.amount {
                txn.amount = amount;
            }
            if let Some(category_id) = update.category_id {
                if let Some(id) = category_id {
                    check_category(conn, txn.account_id, id)?;
                }
                txn.category_id = category_id;
            }
            transactions::update(conn, &txn)
        })
    }

    /// Deleting a transaction generated by an actualization also removes its
    /// snapshot, making the template eligible again for that period.
    pub fn delete_transaction(&mut self, transaction_id: i64) -> Result<()> {
        unit_of_work(&mut self.conn, "delete transaction", |conn| {
            let txn = transactions::get(conn, transaction_id)?;
            if !txn.can_delete {
                return Err(LedgerError::Forbidden(format!(
                    "transaction '{}' is system generated and cannot be deleted",
                    txn.name
                )));
            }
            ensure_period_open(conn, txn.period_id)?;
            transactions::delete(conn, transaction_id)
        })
    }

    // -----------------------------------------------------------------------
    // Recurring templates
    // -----------------------------------------------------------------------

    pub fn add_recurring(&mut self, account_id: i64, input: RecurringInput) -> Result<Recurring> {
        validate_recurring(&input)?;
        let now = Utc::now();
        unit_of_work(&mut self.conn, "add recurring", |conn| {
            accounts::get(conn, account_id)?;
            if let Some(category_id) = input.category_id {
                check_category(conn, account_id, category_id)?;
            }
            recurrings::insert(conn, account_id, &input, now)
        })
    }

    pub fn recurring(&self, recurring_id: i64) -> Result<Recurring> {
        recurrings::get(&self.conn, recurring_id)
    }

    /// Templates with their "accounted for" flag in `period_id`, or in the
    /// active period when none is given.
    pub fn recurrings(&self, account_id: i64, period_id: Option<i64>) -> Result<Vec<RecurringStatus>> {
        let period_id = match period_id {
            Some(id) => self.account_period(account_id, id)?.id,
            None => self.active_period(account_id)?.id,
        };
        actualizer::list_with_status(&self.conn, account_id, period_id)
    }

    /// Edits never reach snapshots already taken.
    pub fn update_recurring(&mut self, recurring_id: i64, input: RecurringInput) -> Result<Recurring> {
        validate_recurring(&input)?;
        unit_of_work(&mut self.conn, "update recurring", |conn| {
            let mut recurring = recurrings::get(conn, recurring_id)?;
            if let Some(category_id) = input.category_id {
                check_category(conn, recurring.account_id, category_id)?;
            }
            recurring.name = input.name.trim().to_string();
            recurring.amount = input.amount;
            recurring.occurrence_day = input.occurrence_day;
            recurring.category_id = input.category_id;
            recurrings::update(conn, &recurring)
        })
    }

    pub fn delete_recurring(&mut self, recurring_id: i64) -> Result<()> {
        unit_of_work(&mut self.conn, "delete recurring", |conn| {
            recurrings::get(conn, recurring_id)?;
            recurrings::delete(conn, recurring_id)
        })
    }

    pub fn is_actualized(&self, recurring_id: i64, period_id: i64) -> Result<bool> {
        actualizer::is_actualized(&self.conn, recurring_id, period_id)
    }

    pub fn apply_recurring(&mut self, recurring_id: i64, period_id: i64) -> Result<Actualization> {
        let now = Utc::now();
        unit_of_work(&mut self.conn, "apply recurring", |conn| {
            actualizer::actualize(conn, recurring_id, period_id, now)
        })
    }

    // -----------------------------------------------------------------------
    // Categories
    // -----------------------------------------------------------------------

    pub fn add_category(&mut self, account_id: i64, input: CategoryInput) -> Result<Category> {
        non_empty(&input.name, "category name")?;
        unit_of_work(&mut self.conn, "add category", |conn| {
            accounts::get(conn, account_id)?;
            categories::insert(conn, account_id, &input)
        })
    }

    pub fn category(&self, category_id: i64) -> Result<Category> {
        categories::get(&self.conn, category_id)
    }

    pub fn categories(&self, account_id: i64) -> Result<Vec<Category>> {
        accounts::get(&self.conn, account_id)?;
        categories::list(&self.conn, account_id)
    }

    pub fn update_category(&mut self, account_id: i64, category_id: i64, input: CategoryInput) -> Result<Category> {
        let name = non_empty(&input.name, "category name")?.to_string();
        unit_of_work(&mut self.conn, "update category", |conn| {
            let mut category = check_category(conn, account_id, category_id)?;
            category.name = name;
            category.color = input.color;
            categories::update(conn, &category)
        })
    }

    pub fn delete_category(&mut self, category_id: i64) -> Result<()> {
        unit_of_work(&mut self.conn, "delete category", |conn| {
            categories::get(conn, category_id)?;
            categories::delete(conn, category_id)
        })
    }
}

fn overview(conn: &Connection, account: Account) -> Result<AccountOverview> {
    let period = period_manager::get_active_period(conn, account.id)?;
    let balance = balance::balance(conn, account.id, Some(period.id))?;
    Ok(AccountOverview {
        account,
        period,
        balance,
    })
}

fn non_empty<'a>(value: &'a str, what: &str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(LedgerError::Invalid(format!("{what} must not be empty")));
    }
    Ok(trimmed)
}

fn validate_recurring(input: &RecurringInput) -> Result<()> {
    non_empty(&input.name, "recurring name")?;
    if !(1..=31).contains(&input.occurrence_day) {
        return Err(LedgerError::Invalid(format!(
            "occurrence day must be between 1 and 31, got {}",
            input.occurrence_day
        )));
    }
    Ok(())
}

fn check_category(conn: &Connection, account_id: i64, category_id: i64) -> Result<Category> {
    let category = categories::get(conn, category_id)?;
    if category.account_id != account_id {
        return Err(LedgerError::Invalid(format!(
            "category {category_id} does not belong to account {account_id}"
        )));
    }
    Ok(category)
}

fn period_of(conn: &Connection, account_id: i64, period_id: i64) -> Result<Period> {
    let period = period_manager::get_period(conn, period_id)?;
    if period.account_id != account_id {
        return Err(LedgerError::Invalid(format!(
            "period {period_id} does not belong to account {account_id}"
        )));
    }
    Ok(period)
}

fn ensure_period_open(conn: &Connection, period_id: i64) -> Result<()> {
    if period_manager::get_period(conn, period_id)?.is_open() {
        Ok(())
    } else {
        Err(LedgerError::PeriodClosed(period_id))
    }
}
