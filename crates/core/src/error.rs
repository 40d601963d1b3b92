//! Input errors raised before a request reaches storage.

use thiserror::Error;

pub type DomainResult<T> = Result<T, DomainError>;

/// Rejected client input.
///
/// Missing records, relationship conflicts and access decisions are
/// [`Outcome`](crate::Outcome) tags, not errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("validation failed: {0}")]
    Validation(String),

    /// Path or body id that is not a positive integer.
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_the_reason() {
        assert_eq!(
            DomainError::validation("name must not be blank").to_string(),
            "validation failed: name must not be blank"
        );
        assert_eq!(
            DomainError::invalid_id("abc").to_string(),
            "invalid identifier: abc"
        );
    }
}
