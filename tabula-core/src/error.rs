//! Domain error taxonomy.
//!
//! Every failure leaving the core is a [`DomainError`] with a stable
//! [`ErrorKind`]. Transport layers map kinds to status codes through
//! [`ErrorKind::status_code`] and nothing else.

use serde::Serialize;
use std::fmt;
use tabula_access::AccessError;
use tabula_store::StoreError;
use tracing::error;

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    NotAuthenticated,
    Forbidden,
    NotFound,
    BadRequest,
    Conflict,
    /// Storage or invariant failure. The message is never the raw cause.
    Internal,
}

impl ErrorKind {
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotAuthenticated => 401,
            Self::Forbidden => 403,
            Self::NotFound => 404,
            Self::BadRequest => 400,
            Self::Conflict => 409,
            Self::Internal => 500,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotAuthenticated => "NOT_AUTHENTICATED",
            Self::Forbidden => "FORBIDDEN",
            Self::NotFound => "NOT_FOUND",
            Self::BadRequest => "BAD_REQUEST",
            Self::Conflict => "CONFLICT",
            Self::Internal => "INTERNAL",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct DomainError {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl DomainError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn not_authenticated() -> Self {
        Self::new(ErrorKind::NotAuthenticated, "authentication required")
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Forbidden, message)
    }

    pub fn not_found(what: &str) -> Self {
        Self::new(ErrorKind::NotFound, format!("{what} not found"))
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadRequest, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    /// The target or one of its ancestors is trashed.
    pub fn in_trash(what: &str) -> Self {
        Self::conflict(format!("{what} is in trash, restore it first"))
    }

    pub fn internal() -> Self {
        Self::new(ErrorKind::Internal, "internal error")
    }

    pub fn status_code(&self) -> u16 {
        self.kind.status_code()
    }
}

impl From<StoreError> for DomainError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UniqueViolation { constraint } => {
                Self::conflict("name already in use").with_details(serde_json::json!({
                    "constraint": constraint,
                }))
            }
            StoreError::ForeignKeyViolation => Self::not_found("referenced entity"),
            other => {
                error!("storage failure: {other}");
                Self::internal()
            }
        }
    }
}

impl From<AccessError> for DomainError {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::NotAuthenticated => Self::not_authenticated(),
            AccessError::NotFound => Self::not_found("base"),
            AccessError::Lookup(cause) => {
                error!("permission lookup failed: {cause}");
                Self::internal()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes() {
        assert_eq!(ErrorKind::NotAuthenticated.status_code(), 401);
        assert_eq!(ErrorKind::Forbidden.status_code(), 403);
        assert_eq!(ErrorKind::NotFound.status_code(), 404);
        assert_eq!(ErrorKind::BadRequest.status_code(), 400);
        assert_eq!(ErrorKind::Conflict.status_code(), 409);
        assert_eq!(ErrorKind::Internal.status_code(), 500);
    }

    #[test]
    fn unique_violation_becomes_conflict() {
        let err = DomainError::from(StoreError::UniqueViolation {
            constraint: "table_defs.base_id, table_defs.name".into(),
        });
        assert_eq!(err.kind, ErrorKind::Conflict);
        assert!(err.details.is_some());
    }

    #[test]
    fn internal_errors_hide_cause() {
        let err = DomainError::from(StoreError::InvalidData("secret path".into()));
        assert_eq!(err.kind, ErrorKind::Internal);
        assert!(!err.message.contains("secret"));
    }
}
