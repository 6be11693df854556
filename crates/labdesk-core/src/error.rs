use thiserror::Error;

/// Core error types for LabDesk domain operations
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid order status: {0}")]
    InvalidStatus(String),

    #[error("Invalid search field: {0}")]
    InvalidSearchField(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),
}

impl CoreError {
    /// Create a new InvalidStatus error
    pub fn invalid_status(status: impl Into<String>) -> Self {
        Self::InvalidStatus(status.into())
    }

    /// Create a new InvalidSearchField error
    pub fn invalid_search_field(field: impl Into<String>) -> Self {
        Self::InvalidSearchField(field.into())
    }

    /// Create a new InvalidDate error
    pub fn invalid_date(value: impl Into<String>) -> Self {
        Self::InvalidDate(value.into())
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CoreError::invalid_status("PENDING");
        assert_eq!(err.to_string(), "Invalid order status: PENDING");

        let err = CoreError::invalid_search_field("address");
        assert_eq!(err.to_string(), "Invalid search field: address");
    }
}
