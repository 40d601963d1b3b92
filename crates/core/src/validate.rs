//! Input validation contract.
//!
//! Validation runs at the boundary, before any orchestration call; the CRUD
//! core trusts the inputs it receives.

use crate::error::{DomainError, DomainResult};

pub trait Validate {
    fn validate(&self) -> DomainResult<()>;
}

pub fn require_non_blank(field: &str, value: &str) -> DomainResult<()> {
    if value.trim().is_empty() {
        return Err(DomainError::validation(format!("{field} must not be empty")));
    }
    Ok(())
}

pub fn require_max_len(field: &str, value: &str, max: usize) -> DomainResult<()> {
    if value.chars().count() > max {
        return Err(DomainError::validation(format!("{field} must be at most {max} characters")));
    }
    Ok(())
}

pub fn require_positive(field: &str, value: i64) -> DomainResult<()> {
    if value <= 0 {
        return Err(DomainError::validation(format!("{field} must be positive")));
    }
    Ok(())
}

/// Minimal structural check: one `@`, non-empty local part, dotted domain.
pub fn require_email(field: &str, value: &str) -> DomainResult<()> {
    let value = value.trim();
    let valid = match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    };
    if !valid {
        return Err(DomainError::validation(format!("{field} must be a valid email address")));
    }
    Ok(())
}
