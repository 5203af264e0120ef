use thiserror::Error;

use crate::domain::{DecodeError, Paise};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Expense not found: {0}")]
    ExpenseNotFound(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(Paise),

    #[error("Invalid expense date '{0}' (expected YYYY-MM-DD)")]
    InvalidDate(String),

    #[error("Expense description must not be empty")]
    EmptyDescription,

    #[error(transparent)]
    InvalidDocument(#[from] DecodeError),

    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),
}
