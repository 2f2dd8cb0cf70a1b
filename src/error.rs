use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Recurring {template_id} is already accounted for in period {period_id}")]
    AlreadyActualized { template_id: i64, period_id: i64 },

    #[error("Database error ({context}): {source}")]
    Persistence {
        context: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Inconsistent ledger: {0}")]
    Inconsistent(String),

    #[error("Period {0} is closed")]
    PeriodClosed(i64),

    #[error("Invalid input: {0}")]
    Invalid(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Settings error: {0}")]
    Settings(String),
}

impl LedgerError {
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        LedgerError::NotFound { entity, id }
    }

    /// Machine-readable kind, used by the API layer.
    pub fn code(&self) -> &'static str {
        match self {
            LedgerError::NotFound { .. } => "NOT_FOUND",
            LedgerError::Forbidden(_) => "FORBIDDEN",
            LedgerError::AlreadyActualized { .. } => "ALREADY_ACTUALIZED",
            LedgerError::Persistence { .. } => "PERSISTENCE",
            LedgerError::Inconsistent(_) => "INCONSISTENT",
            LedgerError::PeriodClosed(_) => "PERIOD_CLOSED",
            LedgerError::Invalid(_) => "INVALID",
            LedgerError::Io(_) => "IO",
            LedgerError::Csv(_) => "CSV",
            LedgerError::Settings(_) => "SETTINGS",
        }
    }
}

impl From<rusqlite::Error> for LedgerError {
    fn from(source: rusqlite::Error) -> Self {
        LedgerError::Persistence {
            context: "database".to_string(),
            source,
        }
    }
}

/// Attach operation context to a raw store error.
pub trait StoreContext<T> {
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> StoreContext<T> for std::result::Result<T, rusqlite::Error> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|source| LedgerError::Persistence {
            context: context.into(),
            source,
        })
    }
}

/// True when a store error is a UNIQUE/CHECK/FOREIGN KEY violation.
pub fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

pub type Result<T> = std::result::Result<T, LedgerError>;
