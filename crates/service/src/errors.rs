use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

use models::errors::ModelError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("database error: {0}")]
    Db(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn not_found(entity: &str) -> Self { Self::NotFound(format!("{} not found", entity)) }

    pub fn conflict(what: impl Into<String>) -> Self { Self::Conflict(what.into()) }

    /// Stable numeric code for external mapping/logging
    pub fn code(&self) -> u16 {
        match self {
            ServiceError::Validation(_) => 1001,
            ServiceError::Conflict(_) => 1002,
            ServiceError::NotFound(_) => 1003,
            ServiceError::Unauthorized(_) => 1004,
            ServiceError::Forbidden(_) => 1005,
            ServiceError::Internal(_) => 1100,
            ServiceError::Db(_) => 1200,
        }
    }
}

impl From<ModelError> for ServiceError {
    fn from(e: ModelError) -> Self {
        let ModelError::Validation(msg) = e;
        ServiceError::Validation(msg)
    }
}

/// Constraint violations raised by the store become typed outcomes; the unique indexes
/// are the final arbiter for username, email and entry number.
impl From<DbErr> for ServiceError {
    fn from(e: DbErr) -> Self {
        match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(msg)) => ServiceError::Conflict(msg),
            Some(SqlErr::ForeignKeyConstraintViolation(msg)) => ServiceError::NotFound(msg),
            _ => ServiceError::Db(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_validation_stays_validation() {
        let e: ServiceError = ModelError::Validation("name required".into()).into();
        assert!(matches!(e, ServiceError::Validation(_)));
        assert_eq!(e.code(), 1001);
    }

    #[test]
    fn plain_db_errors_are_db() {
        let e: ServiceError = DbErr::Custom("boom".into()).into();
        assert!(matches!(e, ServiceError::Db(_)));
    }

    #[test]
    fn codes_are_distinct() {
        let all = [
            ServiceError::Validation(String::new()),
            ServiceError::NotFound(String::new()),
            ServiceError::Conflict(String::new()),
            ServiceError::Unauthorized(String::new()),
            ServiceError::Forbidden(String::new()),
            ServiceError::Db(String::new()),
            ServiceError::Internal(String::new()),
        ];
        let mut codes: Vec<u16> = all.iter().map(ServiceError::code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), all.len());
    }
}
