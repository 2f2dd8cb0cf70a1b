//! Applies a recurring template to a period: an immutable snapshot row plus
//! the transaction generated from it, at most once per (template, period).
//! Deleting the generated transaction releases the snapshot through the
//! `trg_transactions_release_actualized` trigger.

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use tracing::info;

use crate::error::{is_constraint_violation, LedgerError, Result};
use crate::models::{Actualization, RecurringStatus};
use crate::store::transactions::{self, TransactionDraft};
use crate::store::{actualized, periods, recurrings};

/// Whether `template_id` has already been accounted for in `period_id`.
pub fn is_actualized(conn: &Connection, template_id: i64, period_id: i64) -> Result<bool> {
    actualized::exists_for(conn, template_id, period_id)
}

/// The account's templates with their "accounted for" flag in `period_id`.
pub fn list_with_status(conn: &Connection, account_id: i64, period_id: i64) -> Result<Vec<RecurringStatus>> {
    recurrings::list(conn, account_id)?
        .into_iter()
        .map(|recurring| {
            let accounted_for = is_actualized(conn, recurring.id, period_id)?;
            Ok(RecurringStatus {
                recurring,
                accounted_for,
            })
        })
        .collect()
}

pub fn actualize(
    conn: &Connection,
    template_id: i64,
    period_id: i64,
    now: DateTime<Utc>,
) -> Result<Actualization> {
    let template = recurrings::get(conn, template_id)?;
    let period = periods::get(conn, period_id)?;
    if period.account_id != template.account_id {
        return Err(LedgerError::Invalid(format!(
            "recurring {template_id} and period {period_id} belong to different accounts"
        )));
    }
    if !period.is_open() {
        return Err(LedgerError::PeriodClosed(period_id));
    }
    if is_actualized(conn, template_id, period_id)? {
        return Err(LedgerError::AlreadyActualized {
            template_id,
            period_id,
        });
    }

    let snapshot_id = actualized::insert_snapshot(conn, &template, period_id, now).map_err(|err| {
        if is_constraint_violation(&err) {
            LedgerError::AlreadyActualized {
                template_id,
                period_id,
            }
        } else {
            LedgerError::Persistence {
                context: format!("snapshot recurring {template_id}"),
                source: err,
            }
        }
    })?;
    let snapshot = actualized::get(conn, snapshot_id)?;

    // built from the snapshot, not the live template
    let transaction = transactions::insert(
        conn,
        &TransactionDraft {
            account_id: snapshot.account_id,
            period_id,
            category_id: snapshot.category_id,
            actualized_recurring_id: Some(snapshot.id),
            name: snapshot.name.clone(),
            amount: snapshot.amount,
            date: now,
            can_delete: true,
        },
        now,
    )?;

    info!(
        template_id,
        period_id,
        snapshot_id = snapshot.id,
        transaction_id = transaction.id,
        amount = snapshot.amount,
        "recurring actualized"
    );
    Ok(Actualization {
        actualized: snapshot,
        transaction,
    })
}
