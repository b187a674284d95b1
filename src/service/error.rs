// service/error.rs
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("User {0} is not an authorized party for this action")]
    Forbidden(Uuid),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Insufficient funds: debit of {required} cents was refused")]
    InsufficientFunds { required: i64 },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Notification error: {0}")]
    Notification(String),
}

impl ServiceError {
    pub fn not_found(entity: &'static str, id: Uuid) -> Self {
        ServiceError::NotFound { entity, id }
    }

    /// Whether retrying the same call could ever succeed. Business
    /// rejections are final; only transport-level faults are retryable,
    /// and then only behind an idempotency fence.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ServiceError::Database(sqlx::Error::Io(_))
                | ServiceError::Database(sqlx::Error::PoolTimedOut)
        )
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ServiceError::Validation(errors.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_funds_is_not_retryable() {
        assert!(!ServiceError::InsufficientFunds { required: 70000 }.is_retryable());
        assert!(!ServiceError::Validation("bad amount".into()).is_retryable());
        assert!(!ServiceError::Forbidden(Uuid::new_v4()).is_retryable());
        assert!(!ServiceError::InvalidState("escrow not active".into()).is_retryable());
    }

    #[test]
    fn test_transport_faults_are_retryable() {
        assert!(ServiceError::Database(sqlx::Error::PoolTimedOut).is_retryable());
        assert!(!ServiceError::Database(sqlx::Error::RowNotFound).is_retryable());
    }
}
