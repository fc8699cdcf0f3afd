//! Actions dispatched against a journey workflow

use access_types::Role;
use journey_types::{FieldValue, MediaKind, RequestId, StepId};
use serde::{Deserialize, Serialize};

/// The user performing an action
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub role: Role,
    /// Backend user id, when the session carries one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl Actor {
    pub fn new(role: Role) -> Self {
        Self { role, user_id: None }
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }
}

impl std::fmt::Display for Actor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.user_id {
            Some(id) => write!(f, "{} ({})", id, self.role),
            None => write!(f, "{}", self.role),
        }
    }
}

/// One user action on a step
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkflowAction {
    Start {
        step: StepId,
    },
    RecordField {
        step: StepId,
        field: String,
        value: FieldValue,
    },
    Complete {
        step: StepId,
    },
    Approve {
        step: StepId,
    },
    AddMedia {
        step: StepId,
        kind: MediaKind,
        reference: String,
    },
}

impl WorkflowAction {
    pub fn step(&self) -> StepId {
        match self {
            Self::Start { step }
            | Self::RecordField { step, .. }
            | Self::Complete { step }
            | Self::Approve { step }
            | Self::AddMedia { step, .. } => *step,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Start { .. } => "start",
            Self::RecordField { .. } => "record_field",
            Self::Complete { .. } => "complete",
            Self::Approve { .. } => "approve",
            Self::AddMedia { .. } => "add_media",
        }
    }
}

/// An action together with its actor and idempotency key
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActionRequest {
    pub request_id: RequestId,
    pub actor: Actor,
    pub action: WorkflowAction,
}

impl ActionRequest {
    /// A request with a freshly generated id
    pub fn new(actor: Actor, action: WorkflowAction) -> Self {
        Self {
            request_id: RequestId::generate(),
            actor,
            action,
        }
    }

    /// Reuse an id, e.g. when the UI re-sends the same click
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = request_id;
        self
    }
}
