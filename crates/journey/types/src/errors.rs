//! Error types for the journey workflow

use crate::{FieldKind, FieldRole, JourneyId, MediaRequirement, StepId};
use access_types::Role;
use serde::{Deserialize, Serialize};

/// Coarse error classes, used to decide how a failure is surfaced
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Fails closed; usually surfaced by hiding the control
    PermissionDenied,
    /// The journey API could not be reached or refused the request
    NetworkFailure,
    /// A field or media check failed; shown inline, transition blocked
    ValidationFailure,
    /// A transition was attempted out of order
    SequenceViolation,
    /// Another action is still in flight
    Busy,
}

/// Errors that can occur in journey workflow operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum JourneyError {
    #[error("Permission denied: {role} may not {action} step '{step}'")]
    PermissionDenied {
        role: Role,
        action: &'static str,
        step: StepId,
    },

    #[error("Step '{0}' was completed by a manager and cannot be self-approved")]
    SelfApproval(StepId),

    #[error("Sequence violation on step '{step}': {reason}")]
    SequenceViolation { step: StepId, reason: String },

    #[error("Step '{step}' is locked for {role}")]
    StepLocked { step: StepId, role: FieldRole },

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Network failure: {0}")]
    Network(String),

    #[error("An action is already in flight for journey {0}")]
    Busy(JourneyId),

    #[error("Invalid progress payload: {0}")]
    InvalidProgress(String),
}

impl JourneyError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::PermissionDenied { .. } | Self::SelfApproval(_) => ErrorCategory::PermissionDenied,
            Self::SequenceViolation { .. } | Self::StepLocked { .. } => {
                ErrorCategory::SequenceViolation
            }
            Self::Validation(_) | Self::InvalidProgress(_) => ErrorCategory::ValidationFailure,
            Self::Network(_) => ErrorCategory::NetworkFailure,
            Self::Busy(_) => ErrorCategory::Busy,
        }
    }

    pub fn sequence(step: StepId, reason: impl Into<String>) -> Self {
        Self::SequenceViolation {
            step,
            reason: reason.into(),
        }
    }
}

/// Field and media validation failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Field '{field}' is not part of the {role} sub-form for step '{step}'")]
    UnknownField {
        step: StepId,
        role: FieldRole,
        field: String,
    },

    #[error("Field '{field}' expects a {expected} value, got {found}")]
    KindMismatch {
        field: String,
        expected: FieldKind,
        found: FieldKind,
    },

    #[error("Rating for '{field}' must be between 1 and 5, got {value}")]
    RatingOutOfRange { field: String, value: u8 },

    #[error("Field '{field}' must be a non-negative number")]
    InvalidNumber { field: String },

    #[error("Required fields missing: {}", .fields.join(", "))]
    MissingRequiredFields { fields: Vec<String> },

    #[error("Step '{step}' requires {requirement} from {role}")]
    MissingMedia {
        step: StepId,
        role: FieldRole,
        requirement: MediaRequirement,
    },

    #[error("Media reference must not be empty")]
    EmptyMediaReference,
}

/// Result type alias for journey operations
pub type JourneyResult<T> = Result<T, JourneyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        let denied = JourneyError::PermissionDenied {
            role: Role::Mover,
            action: "approve",
            step: StepId::PointsA,
        };
        assert_eq!(denied.category(), ErrorCategory::PermissionDenied);
        assert_eq!(
            JourneyError::SelfApproval(StepId::PointsA).category(),
            ErrorCategory::PermissionDenied
        );
        assert_eq!(
            JourneyError::sequence(StepId::PointsA, "not started").category(),
            ErrorCategory::SequenceViolation
        );
        assert_eq!(
            JourneyError::from(ValidationError::EmptyMediaReference).category(),
            ErrorCategory::ValidationFailure
        );
        assert_eq!(
            JourneyError::Network("timeout".into()).category(),
            ErrorCategory::NetworkFailure
        );
        assert_eq!(
            JourneyError::Busy(JourneyId::new("J-1")).category(),
            ErrorCategory::Busy
        );
    }

    #[test]
    fn test_messages() {
        let err = JourneyError::PermissionDenied {
            role: Role::Mover,
            action: "approve",
            step: StepId::PointsA,
        };
        assert_eq!(
            err.to_string(),
            "Permission denied: MOVER may not approve step 'points_a'"
        );

        let missing = ValidationError::MissingRequiredFields {
            fields: vec!["fuelLevel".into(), "truckInspection".into()],
        };
        assert_eq!(
            missing.to_string(),
            "Required fields missing: fuelLevel, truckInspection"
        );
    }
}
