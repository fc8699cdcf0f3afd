//! Step progress records
//!
//! A StepRecord keeps the facts of one step: when it started, what each
//! role submitted, when it completed and whether a manager approved it.
//! The step status is computed from those facts so that a record can
//! never claim a status its data does not support.

use crate::{FieldRole, FieldValue, MediaKind, MediaReference, StepDefinition, StepId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ── Status ───────────────────────────────────────────────────────────

/// Status of one step. Ordered: pending < in_progress < completed < approved.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Approved,
}

impl StepStatus {
    /// Completed or approved
    pub fn is_finished(self) -> bool {
        matches!(self, Self::Completed | Self::Approved)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Approved => "approved",
        }
    }
}

impl std::fmt::Display for StepStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// When a step counts as completed
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CompletionPolicy {
    /// The first role to submit its sub-form completes the step for everyone
    #[default]
    SingleRole,
    /// Every role acting in the step must submit its sub-form
    AllSubForms,
}

// ── Sub-form and Approval ────────────────────────────────────────────

/// What one role has recorded within a step
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SubFormRecord {
    pub values: BTreeMap<String, FieldValue>,
    pub submitted_at: Option<DateTime<Utc>>,
}

impl SubFormRecord {
    pub fn is_submitted(&self) -> bool {
        self.submitted_at.is_some()
    }

    pub fn value(&self, key: &str) -> Option<&FieldValue> {
        self.values.get(key)
    }
}

/// A manager's approval of a completed step
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Approval {
    pub approved_at: DateTime<Utc>,
    /// User id of the approving manager, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<String>,
}

// ── Step Record ──────────────────────────────────────────────────────

/// Runtime progress of one step
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    pub step: StepId,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Role whose submission completed the step
    pub completed_by: Option<FieldRole>,
    pub approval: Option<Approval>,
    pub sub_forms: BTreeMap<FieldRole, SubFormRecord>,
    pub media: Vec<MediaReference>,
}

impl StepRecord {
    /// A pending record with nothing recorded
    pub fn new(step: StepId) -> Self {
        Self {
            step,
            started_at: None,
            completed_at: None,
            completed_by: None,
            approval: None,
            sub_forms: BTreeMap::new(),
            media: Vec::new(),
        }
    }

    /// Derived status
    pub fn status(&self) -> StepStatus {
        if self.approval.is_some() {
            StepStatus::Approved
        } else if self.completed_at.is_some() {
            StepStatus::Completed
        } else if self.started_at.is_some() {
            StepStatus::InProgress
        } else {
            StepStatus::Pending
        }
    }

    pub fn definition(&self) -> &'static StepDefinition {
        self.step.definition()
    }

    pub fn sub_form(&self, role: FieldRole) -> Option<&SubFormRecord> {
        self.sub_forms.get(&role)
    }

    /// The role's sub-form, created empty on first use
    pub fn sub_form_mut(&mut self, role: FieldRole) -> &mut SubFormRecord {
        self.sub_forms.entry(role).or_default()
    }

    pub fn is_submitted_by(&self, role: FieldRole) -> bool {
        self.sub_form(role).map(SubFormRecord::is_submitted).unwrap_or(false)
    }

    /// Roles that have submitted their sub-form
    pub fn submitted_roles(&self) -> Vec<FieldRole> {
        self.sub_forms
            .iter()
            .filter(|(_, s)| s.is_submitted())
            .map(|(r, _)| *r)
            .collect()
    }

    /// Roles acting in this step that have not submitted yet
    pub fn outstanding_roles(&self) -> Vec<FieldRole> {
        self.definition()
            .roles()
            .filter(|r| !self.is_submitted_by(*r))
            .collect()
    }

    /// Media captured by `role`
    pub fn media_by(&self, role: FieldRole) -> impl Iterator<Item = &MediaReference> {
        self.media.iter().filter(move |m| m.captured_by == role)
    }

    /// Kinds of media captured by `role`
    pub fn media_kinds_by(&self, role: FieldRole) -> Vec<MediaKind> {
        self.media_by(role).map(|m| m.kind).collect()
    }

    /// Whether the completion policy is met by the submissions so far
    pub fn completion_satisfied(&self, policy: CompletionPolicy) -> bool {
        match policy {
            CompletionPolicy::SingleRole => !self.submitted_roles().is_empty(),
            CompletionPolicy::AllSubForms => self.outstanding_roles().is_empty(),
        }
    }
}
