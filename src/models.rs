use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::Row;
use serde::{Deserialize, Serialize};

pub fn to_millis(ts: DateTime<Utc>) -> i64 {
    ts.timestamp_millis()
}

fn millis_at(row: &Row, column: &str) -> rusqlite::Result<DateTime<Utc>> {
    let raw: i64 = row.get(column)?;
    from_millis(raw, column)
}

fn opt_millis_at(row: &Row, column: &str) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let raw: Option<i64> = row.get(column)?;
    raw.map(|ms| from_millis(ms, column)).transpose()
}

fn from_millis(ms: i64, column: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            Type::Integer,
            format!("{column}: timestamp {ms} out of range").into(),
        )
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub name: String,
    pub period_start_day: u32,
    pub can_delete: bool,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            period_start_day: row.get("period_start_day")?,
            can_delete: row.get("can_delete")?,
            created_at: millis_at(row, "created_at")?,
        })
    }
}

/// An account together with its open period and that period's balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountOverview {
    pub account: Account,
    pub period: Period,
    pub balance: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub id: i64,
    pub account_id: i64,
    pub reporting_start: DateTime<Utc>,
    pub reporting_end: DateTime<Utc>,
    pub opened_on: DateTime<Utc>,
    pub closed_on: Option<DateTime<Utc>>,
}

impl Period {
    pub fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            account_id: row.get("account_id")?,
            reporting_start: millis_at(row, "reporting_start")?,
            reporting_end: millis_at(row, "reporting_end")?,
            opened_on: millis_at(row, "opened_on")?,
            closed_on: opt_millis_at(row, "closed_on")?,
        })
    }

    pub fn is_open(&self) -> bool {
        self.closed_on.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub account_id: i64,
    pub name: String,
    pub color: Option<String>,
}

impl Category {
    pub fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            account_id: row.get("account_id")?,
            name: row.get("name")?,
            color: row.get("color")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub account_id: i64,
    pub period_id: i64,
    pub category_id: Option<i64>,
    pub actualized_recurring_id: Option<i64>,
    pub name: String,
    /// Minor currency units (cents).
    pub amount: i64,
    pub date: DateTime<Utc>,
    pub can_delete: bool,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    pub fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            account_id: row.get("account_id")?,
            period_id: row.get("period_id")?,
            category_id: row.get("category_id")?,
            actualized_recurring_id: row.get("actualized_recurring_id")?,
            name: row.get("name")?,
            amount: row.get("amount")?,
            date: millis_at(row, "date")?,
            can_delete: row.get("can_delete")?,
            created_at: millis_at(row, "created_at")?,
        })
    }
}

/// A recurring charge template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recurring {
    pub id: i64,
    pub account_id: i64,
    pub category_id: Option<i64>,
    pub name: String,
    pub amount: i64,
    pub occurrence_day: u32,
    pub created_at: DateTime<Utc>,
}

impl Recurring {
    pub fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            account_id: row.get("account_id")?,
            category_id: row.get("category_id")?,
            name: row.get("name")?,
            amount: row.get("amount")?,
            occurrence_day: row.get("occurrence_day")?,
            created_at: millis_at(row, "created_at")?,
        })
    }
}

/// Immutable snapshot of a template applied to one period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActualizedRecurring {
    pub id: i64,
    pub based_on_id: Option<i64>,
    pub account_id: i64,
    pub period_id: i64,
    pub category_id: Option<i64>,
    pub name: String,
    pub amount: i64,
    pub occurrence_day: u32,
    pub created_at: DateTime<Utc>,
}

impl ActualizedRecurring {
    pub fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            based_on_id: row.get("based_on_id")?,
            account_id: row.get("account_id")?,
            period_id: row.get("period_id")?,
            category_id: row.get("category_id")?,
            name: row.get("name")?,
            amount: row.get("amount")?,
            occurrence_day: row.get("occurrence_day")?,
            created_at: millis_at(row, "created_at")?,
        })
    }
}

/// A template plus whether it has been actualized in a given period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecurringStatus {
    pub recurring: Recurring,
    pub accounted_for: bool,
}

/// Result of applying a template to a period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Actualization {
    pub actualized: ActualizedRecurring,
    pub transaction: Transaction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeriodBalance {
    pub period: Period,
    pub balance: i64,
    pub transaction_count: i64,
}

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountUpdate {
    pub name: Option<String>,
    pub period_start_day: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewTransaction {
    pub name: String,
    pub amount: i64,
    pub date: Option<DateTime<Utc>>,
    pub category_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionUpdate {
    pub name: Option<String>,
    pub amount: Option<i64>,
    /// `Some(None)` detaches the category.
    pub category_id: Option<Option<i64>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionQuery {
    pub period_id: Option<i64>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecurringInput {
    pub name: String,
    pub amount: i64,
    pub occurrence_day: u32,
    pub category_id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryInput {
    pub name: String,
    pub color: Option<String>,
}
