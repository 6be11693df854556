// Opaque identifiers for patients, lab tests, orders and order items.
use thiserror::Error;

const MAX_ID_LEN: usize = 64;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdError {
    #[error("ID must not be empty")]
    Empty,
    #[error("ID must be at most 64 characters")]
    TooLong,
    #[error("ID may only contain letters, digits, '-' and '_'")]
    InvalidCharacter,
}

pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Checks that a client-supplied identifier could have been issued by us.
///
/// Identifiers are opaque, so this only rejects values that can never match
/// a stored record.
pub fn validate_id(id: &str) -> Result<(), IdError> {
    if id.is_empty() {
        return Err(IdError::Empty);
    }
    if id.len() > MAX_ID_LEN {
        return Err(IdError::TooLong);
    }
    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(IdError::InvalidCharacter);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_valid_and_unique() {
        let a = generate_id();
        let b = generate_id();
        assert_ne!(a, b);
        assert_eq!(validate_id(&a), Ok(()));
    }

    #[test]
    fn rejects_malformed_ids() {
        assert_eq!(validate_id(""), Err(IdError::Empty));
        assert_eq!(validate_id(&"a".repeat(65)), Err(IdError::TooLong));
        assert_eq!(validate_id("../etc"), Err(IdError::InvalidCharacter));
        assert_eq!(validate_id("patient-123"), Ok(()));
    }
}
