//! Error types for access control parsing

/// Errors raised while parsing roles and permissions from strings
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessError {
    #[error("Unknown role: {0}")]
    UnknownRole(String),

    #[error("Unknown permission: {0}")]
    UnknownPermission(String),
}

/// Result type alias for access operations
pub type AccessResult<T> = Result<T, AccessError>;
