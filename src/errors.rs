//! Unified error types for the payroll engine.
//!
//! Every fallible operation in the crate returns [`Result`]. Variants carry
//! the offending values so callers can build precise user-facing messages.
//! All failures abort the enclosing database transaction; the engine never
//! retries on its own.

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors produced by the payroll engine.
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or invalid payroll configuration, including a zero working-day
    /// denominator. Fatal to the calculation; nothing is persisted.
    #[error("configuration error: {message}")]
    Configuration {
        /// What is missing or out of range
        message: String,
    },

    /// A pay slip already exists for this employee and period. Duplicate
    /// payroll is a business error, not a transient one; do not retry.
    #[error("a pay slip already exists for employee {employee_id} in {month:02}/{year}")]
    DuplicateSlip {
        /// Employee the duplicate was attempted for
        employee_id: i64,
        /// Period month (1-12)
        month: i32,
        /// Period year
        year: i32,
    },

    /// A lifecycle operation was attempted out of sequence. State is
    /// unchanged.
    #[error("cannot {attempted} {entity} in state '{from}'")]
    InvalidTransition {
        /// Which kind of record was touched ("slip", "advance")
        entity: &'static str,
        /// The state the record is currently in
        from: String,
        /// The operation that was refused
        attempted: &'static str,
    },

    /// Referenced employee does not exist.
    #[error("employee {id} not found")]
    EmployeeNotFound {
        /// Primary key that was looked up
        id: i64,
    },

    /// Referenced pay slip does not exist.
    #[error("pay slip {id} not found")]
    SlipNotFound {
        /// Primary key that was looked up
        id: i64,
    },

    /// Referenced salary advance does not exist.
    #[error("advance {id} not found")]
    AdvanceNotFound {
        /// Primary key that was looked up
        id: i64,
    },

    /// Referenced contribution rule does not exist.
    #[error("contribution rule '{code}' not found")]
    RuleNotFound {
        /// Rule code that was looked up
        code: String,
    },

    /// A monetary or quantity input was negative or otherwise unusable.
    #[error("invalid amount: {amount}")]
    InvalidAmount {
        /// The rejected value
        amount: Decimal,
    },

    /// Underlying database error.
    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// I/O error, typically while reading a seed file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
