//! Wire format exchanged with the journey API
//!
//! `GET /journey-workflow/{journeyId}/progress` returns a
//! [`JourneyProgress`]; phase updates send a [`PhaseUpdate`]. Field names
//! are camelCase on the wire.

use crate::{
    Approval, CompletionPolicy, FieldRole, FieldValue, JourneyError, JourneyId,
    JourneyResult, JourneyWorkflowInstance, MediaReference, StepId, StepRecord, StepStatus,
    SubFormRecord, STEP_COUNT,
};
use access_types::Role;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Client-generated identifier making a dispatched action idempotent
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub uuid::Uuid);

impl RequestId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ordered step timeline of one journey
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JourneyProgress {
    pub journey_id: String,
    /// Absent on journeys the backend created before policies existed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_policy: Option<CompletionPolicy>,
    /// Informational; recomputed from the timeline on load
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_step: Option<u8>,
    pub timeline: Vec<PhaseProgress>,
}

/// Progress of one phase (step) on the wire
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseProgress {
    pub phase_id: StepId,
    pub ordinal: u8,
    #[serde(default)]
    pub label: String,
    pub status: StepStatus,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_by: Option<FieldRole>,
    #[serde(default)]
    pub approval: Option<Approval>,
    #[serde(default)]
    pub sub_forms: Vec<SubFormProgress>,
    #[serde(default)]
    pub media: Vec<MediaReference>,
}

/// One role's sub-form on the wire
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubFormProgress {
    pub role: FieldRole,
    #[serde(default)]
    pub values: BTreeMap<String, FieldValue>,
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
}

/// Body of every phase mutation request
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseUpdate {
    pub request_id: RequestId,
    pub actor_role: Role,
    pub phase: PhaseProgress,
}

impl PhaseProgress {
    pub fn from_record(record: &StepRecord) -> Self {
        Self {
            phase_id: record.step,
            ordinal: record.step.ordinal(),
            label: record.definition().label.to_string(),
            status: record.status(),
            started_at: record.started_at,
            completed_at: record.completed_at,
            completed_by: record.completed_by,
            approval: record.approval.clone(),
            sub_forms: record
                .sub_forms
                .iter()
                .map(|(role, sub)| SubFormProgress {
                    role: *role,
                    values: sub.values.clone(),
                    submitted_at: sub.submitted_at,
                })
                .collect(),
            media: record.media.clone(),
        }
    }

    /// Rebuild a record. The wire status is authoritative: timestamps it
    /// implies but the payload omits are set to `loaded_at`, and
    /// timestamps beyond it are dropped.
    pub fn into_record(self, loaded_at: DateTime<Utc>) -> JourneyResult<StepRecord> {
        if self.ordinal != self.phase_id.ordinal() {
            return Err(JourneyError::InvalidProgress(format!(
                "phase '{}' has ordinal {}, expected {}",
                self.phase_id,
                self.ordinal,
                self.phase_id.ordinal()
            )));
        }

        let definition = self.phase_id.definition();
        let mut sub_forms = BTreeMap::new();
        for sub in self.sub_forms {
            if !definition.permits(sub.role) {
                return Err(JourneyError::InvalidProgress(format!(
                    "{} has no sub-form in phase '{}'",
                    sub.role, self.phase_id
                )));
            }
            sub_forms.insert(
                sub.role,
                SubFormRecord {
                    values: sub.values,
                    submitted_at: sub.submitted_at,
                },
            );
        }

        let status = self.status;
        let started_at = (status >= StepStatus::InProgress)
            .then(|| self.started_at.or(self.completed_at).unwrap_or(loaded_at));
        let completed_at =
            (status >= StepStatus::Completed).then(|| self.completed_at.unwrap_or(loaded_at));
        let approval = (status == StepStatus::Approved).then(|| {
            self.approval.unwrap_or(Approval {
                approved_at: loaded_at,
                approved_by: None,
            })
        });

        Ok(StepRecord {
            step: self.phase_id,
            started_at,
            completed_at,
            completed_by: completed_at.and(self.completed_by),
            approval,
            sub_forms,
            media: self.media,
        })
    }
}

impl JourneyWorkflowInstance {
    /// Serialize to the wire format
    pub fn to_progress(&self) -> JourneyProgress {
        JourneyProgress {
            journey_id: self.journey_id.0.clone(),
            completion_policy: Some(self.completion_policy),
            current_step: Some(self.current_ordinal()),
            timeline: self.steps.iter().map(PhaseProgress::from_record).collect(),
        }
    }

    /// Rebuild an instance from the wire format.
    ///
    /// The timeline must hold each of the four phases exactly once (in any
    /// order) and must respect step sequencing.
    pub fn from_progress(progress: JourneyProgress) -> JourneyResult<Self> {
        let loaded_at = Utc::now();

        if progress.timeline.len() != STEP_COUNT {
            return Err(JourneyError::InvalidProgress(format!(
                "expected {} phases, got {}",
                STEP_COUNT,
                progress.timeline.len()
            )));
        }

        let mut instance = JourneyWorkflowInstance::new(JourneyId::new(progress.journey_id))
            .with_policy(progress.completion_policy.unwrap_or_default());
        let mut seen = [false; STEP_COUNT];

        for phase in progress.timeline {
            let step = phase.phase_id;
            if std::mem::replace(&mut seen[step.index()], true) {
                return Err(JourneyError::InvalidProgress(format!(
                    "phase '{}' appears twice",
                    step
                )));
            }
            *instance.step_mut(step) = phase.into_record(loaded_at)?;
        }

        instance.check_sequencing()?;
        instance.created_at = loaded_at;
        instance.updated_at = loaded_at;
        Ok(instance)
    }
}
