//! Tagged result of an orchestration operation.

/// Every CRUD operation resolves to exactly one of these.
///
/// Storage failures are not an outcome; they travel separately as fatal errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    Success(T),
    NotFound,
    /// Rejected because of a relationship to another record.
    Conflict(String),
    Unauthorized,
}

impl<T> Outcome<T> {
    pub fn success(self) -> Option<T> {
        match self {
            Outcome::Success(v) => Some(v),
            _ => None,
        }
    }

    /// Short label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Success(_) => "success",
            Outcome::NotFound => "not_found",
            Outcome::Conflict(_) => "conflict",
            Outcome::Unauthorized => "unauthorized",
        }
    }
}

impl<T> From<Option<T>> for Outcome<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Outcome::Success(v),
            None => Outcome::NotFound,
        }
    }
}
