use sea_orm::error::DbErr;

/// Message raised by the stock guard triggers on `Bestellpositionen`.
pub const STOCK_GUARD_MESSAGE: &str = "insufficient stock";

/// Message raised by the triggers when a line quantity is not positive.
pub const QUANTITY_GUARD_MESSAGE: &str = "invalid quantity";

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] DbErr),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Insufficient stock: {0}")]
    InsufficientStock(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Invalid database file: {0}")]
    InvalidDatabase(String),

    #[error("Backup error: {0}")]
    BackupError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(errors.to_string())
    }
}

impl ServiceError {
    /// Maps an aborted write on `Bestellpositionen` to the matching domain
    /// error. Anything that was not raised by one of the guard triggers is
    /// kept as a database error.
    pub fn from_line_item_write(err: DbErr, context: impl Into<String>) -> Self {
        let message = err.to_string();
        if message.contains(STOCK_GUARD_MESSAGE) {
            ServiceError::InsufficientStock(context.into())
        } else if message.contains(QUANTITY_GUARD_MESSAGE) {
            ServiceError::ValidationError(format!(
                "{}: quantity must be greater than zero",
                context.into()
            ))
        } else {
            ServiceError::DatabaseError(err)
        }
    }

    /// True for failures caused by user input rather than the system.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            ServiceError::NotFound(_)
                | ServiceError::ValidationError(_)
                | ServiceError::InsufficientStock(_)
                | ServiceError::InvalidOperation(_)
        )
    }

    /// True when the console input stream has been closed.
    pub fn is_end_of_input(&self) -> bool {
        matches!(self, ServiceError::Io(e) if e.kind() == std::io::ErrorKind::UnexpectedEof)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::RuntimeErr;

    #[test]
    fn trigger_abort_maps_to_insufficient_stock() {
        let err = DbErr::Exec(RuntimeErr::Internal(
            "error returned from database: (code: 1811) insufficient stock".to_string(),
        ));
        let mapped = ServiceError::from_line_item_write(err, "product 3");
        assert!(matches!(mapped, ServiceError::InsufficientStock(ref m) if m == "product 3"));
        assert!(mapped.is_user_error());
    }

    #[test]
    fn unrelated_database_errors_are_kept() {
        let err = DbErr::Exec(RuntimeErr::Internal("disk I/O error".to_string()));
        let mapped = ServiceError::from_line_item_write(err, "product 3");
        assert!(matches!(mapped, ServiceError::DatabaseError(_)));
        assert!(!mapped.is_user_error());
    }

    #[test]
    fn eof_is_detected() {
        let err = ServiceError::Io(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "input closed",
        ));
        assert!(err.is_end_of_input());
    }
}
