use thiserror::Error;

/// Field-level rule violations raised by the `validate_*` helpers.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("validation error: {0}")]
    Validation(String),
}
