//! Data-in/data-out surface for front ends. Every call returns a result
//! envelope; failures become `success = false` with a message and an error
//! code instead of propagating.

use serde::Serialize;
use tracing::warn;

use crate::error::{LedgerError, Result};
use crate::ledger::Ledger;
use crate::models::{
    AccountOverview, AccountUpdate, Actualization, Category, CategoryInput, NewTransaction, Period,
    PeriodBalance, Recurring, RecurringInput, RecurringStatus, Transaction, TransactionQuery,
    TransactionUpdate,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiResult<T> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimpleResult {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
}

impl<T> ApiResult<T> {
    fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            code: None,
            data: Some(data),
        }
    }

    fn failed(op: &str, err: &LedgerError) -> Self {
        warn!(op, code = err.code(), error = %err, "operation failed");
        Self {
            success: false,
            message: err.to_string(),
            code: Some(err.code()),
            data: None,
        }
    }
}

impl SimpleResult {
    fn failed(op: &str, err: &LedgerError) -> Self {
        warn!(op, code = err.code(), error = %err, "operation failed");
        Self {
            success: false,
            message: err.to_string(),
            code: Some(err.code()),
        }
    }
}

fn respond<T>(op: &str, message: &str, result: Result<T>) -> ApiResult<T> {
    match result {
        Ok(data) => ApiResult::ok(message, data),
        Err(err) => ApiResult::failed(op, &err),
    }
}

fn respond_simple(op: &str, message: &str, result: Result<()>) -> SimpleResult {
    match result {
        Ok(()) => SimpleResult {
            success: true,
            message: message.to_string(),
            code: None,
        },
        Err(err) => SimpleResult::failed(op, &err),
    }
}

pub struct Api {
    ledger: Ledger,
}

impl Api {
    pub fn new(ledger: Ledger) -> Self {
        Self { ledger }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    // Accounts

    pub fn add_account(&mut self, name: &str, start_day: u32) -> ApiResult<AccountOverview> {
        respond("add_account", "account added", self.ledger.add_account(name, start_day))
    }

    pub fn get_account(&self, account_id: i64) -> ApiResult<AccountOverview> {
        respond("get_account", "account loaded", self.ledger.account(account_id))
    }

    pub fn list_accounts(&self) -> ApiResult<Vec<AccountOverview>> {
        respond("list_accounts", "accounts loaded", self.ledger.list_accounts())
    }

    pub fn update_account(&mut self, account_id: i64, update: AccountUpdate) -> ApiResult<AccountOverview> {
        let result = self
            .ledger
            .update_account(account_id, update)
            .and_then(|account| self.ledger.account(account.id));
        respond("update_account", "account updated", result)
    }

    pub fn delete_account(&mut self, account_id: i64) -> SimpleResult {
        respond_simple("delete_account", "account deleted", self.ledger.delete_account(account_id))
    }

    // Periods

    pub fn get_active_period(&self, account_id: i64) -> ApiResult<Period> {
        respond("get_active_period", "active period loaded", self.ledger.active_period(account_id))
    }

    pub fn list_periods(&self, account_id: i64) -> ApiResult<Vec<PeriodBalance>> {
        respond("list_periods", "periods loaded", self.ledger.period_balances(account_id))
    }

    pub fn start_period(
        &mut self,
        account_id: i64,
        start_day: u32,
        previous_period_id: Option<i64>,
    ) -> ApiResult<Period> {
        let result = match previous_period_id {
            Some(id) => self
                .ledger
                .period(id)
                .and_then(|previous| self.ledger.start_period(account_id, start_day, Some(&previous))),
            None => self.ledger.start_period(account_id, start_day, None),
        };
        respond("start_period", "period started", result)
    }

    pub fn close_period(&mut self, period_id: i64) -> SimpleResult {
        let result = self.ledger.close_period(period_id).map(|_| ());
        respond_simple("close_period", "period closed", result)
    }

    pub fn rollover(&mut self, account_id: i64) -> ApiResult<Period> {
        respond("rollover", "period rolled over", self.ledger.rollover(account_id))
    }

    pub fn balance(&self, account_id: i64, period_id: Option<i64>) -> ApiResult<i64> {
        respond("balance", "balance computed", self.ledger.balance(account_id, period_id))
    }

    // Transactions

    pub fn add_transaction(&mut self, account_id: i64, input: NewTransaction) -> ApiResult<Transaction> {
        respond(
            "add_transaction",
            "transaction added",
            self.ledger.add_transaction(account_id, input),
        )
    }

    pub fn list_transactions(&self, account_id: i64, query: &TransactionQuery) -> ApiResult<Vec<Transaction>> {
        respond(
            "list_transactions",
            "transactions loaded",
            self.ledger.transactions(account_id, query),
        )
    }

    pub fn update_transaction(&mut self, transaction_id: i64, update: TransactionUpdate) -> ApiResult<Transaction> {
        respond(
            "update_transaction",
            "transaction updated",
            self.ledger.update_transaction(transaction_id, update),
        )
    }

    pub fn delete_transaction(&mut self, transaction_id: i64) -> SimpleResult {
        respond_simple(
            "delete_transaction",
            "transaction deleted",
            self.ledger.delete_transaction(transaction_id),
        )
    }

    // Recurring templates

    pub fn add_recurring(&mut self, account_id: i64, input: RecurringInput) -> ApiResult<Recurring> {
        respond("add_recurring", "recurring added", self.ledger.add_recurring(account_id, input))
    }

    pub fn list_recurrings(&self, account_id: i64, period_id: Option<i64>) -> ApiResult<Vec<RecurringStatus>> {
        respond(
            "list_recurrings",
            "recurrings loaded",
            self.ledger.recurrings(account_id, period_id),
        )
    }

    pub fn update_recurring(&mut self, recurring_id: i64, input: RecurringInput) -> ApiResult<Recurring> {
        respond(
            "update_recurring",
            "recurring updated",
            self.ledger.update_recurring(recurring_id, input),
        )
    }

    pub fn delete_recurring(&mut self, recurring_id: i64) -> SimpleResult {
        respond_simple(
            "delete_recurring",
            "recurring deleted",
            self.ledger.delete_recurring(recurring_id),
        )
    }

    pub fn actualize_recurring(&mut self, recurring_id: i64, period_id: i64) -> ApiResult<Actualization> {
        respond(
            "actualize_recurring",
            "recurring applied",
            self.ledger.apply_recurring(recurring_id, period_id),
        )
    }

    // Categories

    pub fn add_category(&mut self, account_id: i64, input: CategoryInput) -> ApiResult<Category> {
        respond("add_category", "category added", self.ledger.add_category(account_id, input))
    }

    pub fn list_categories(&self, account_id: i64) -> ApiResult<Vec<Category>> {
        respond("list_categories", "categories loaded", self.ledger.categories(account_id))
    }

    pub fn update_category(&mut self, account_id: i64, category_id: i64, input: CategoryInput) -> ApiResult<Category> {
        respond(
            "update_category",
            "category updated",
            self.ledger.update_category(account_id, category_id, input),
        )
    }

    pub fn delete_category(&mut self, category_id: i64) -> SimpleResult {
        respond_simple(
            "delete_category",
            "category deleted",
            self.ledger.delete_category(category_id),
        )
    }
}
