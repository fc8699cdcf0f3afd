//! Audit trail: records every action dispatched against a journey
//!
//! Entries are appended in dispatch order and never rewritten. Sequence
//! numbers start at 1 and increase by one per entry.

use crate::action::ActionRequest;
use crate::state_machine::Transition;
use access_types::Role;
use chrono::{DateTime, Utc};
use journey_types::{JourneyId, RequestId, StepId};
use serde::{Deserialize, Serialize};

/// Ordered record of the actions dispatched for one journey
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuditTrail {
    journey_id: JourneyId,
    records: Vec<AuditRecord>,
}

impl AuditTrail {
    pub fn new(journey_id: JourneyId) -> Self {
        Self {
            journey_id,
            records: Vec::new(),
        }
    }

    pub fn journey_id(&self) -> &JourneyId {
        &self.journey_id
    }

    /// Append a record for `request`
    pub fn record(&mut self, request: &ActionRequest, outcome: AuditOutcome) -> &AuditRecord {
        let sequence = self.records.len() as u64 + 1;
        tracing::trace!(
            journey = %self.journey_id,
            sequence,
            action = request.action.name(),
            "Audit recorded"
        );
        self.records.push(AuditRecord {
            sequence,
            request_id: request.request_id,
            role: request.actor.role,
            user_id: request.actor.user_id.clone(),
            action: request.action.name().to_string(),
            step: request.action.step(),
            outcome,
            timestamp: Utc::now(),
        });
        &self.records[self.records.len() - 1]
    }

    // ── Query methods ────────────────────────────────────────────────

    pub fn records(&self) -> &[AuditRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records touching `step`
    pub fn for_step(&self, step: StepId) -> Vec<&AuditRecord> {
        self.records.iter().filter(|r| r.step == step).collect()
    }

    /// Records of one request id; a duplicate shows up twice
    pub fn for_request(&self, request_id: RequestId) -> Vec<&AuditRecord> {
        self.records
            .iter()
            .filter(|r| r.request_id == request_id)
            .collect()
    }
}

/// One dispatched action
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    pub sequence: u64,
    pub request_id: RequestId,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub action: String,
    pub step: StepId,
    pub outcome: AuditOutcome,
    pub timestamp: DateTime<Utc>,
}

/// How a dispatched action ended
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum AuditOutcome {
    /// Applied locally and accepted by the journey API
    Persisted { transition: Transition },
    /// Applied locally, the journey API call failed
    PersistFailed { error: String, rolled_back: bool },
    /// Refused before any state changed
    Rejected { error: String },
    /// The request id was already processed
    Duplicate,
}

impl AuditOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Persisted { .. } => "persisted",
            Self::PersistFailed {
                rolled_back: true, ..
            } => "rolled back",
            Self::PersistFailed { .. } => "persist failed",
            Self::Rejected { .. } => "rejected",
            Self::Duplicate => "duplicate",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{Actor, WorkflowAction};

    fn request(step: StepId) -> ActionRequest {
        ActionRequest::new(Actor::new(Role::Driver), WorkflowAction::Start { step })
    }

    #[test]
    fn test_sequence_is_monotonic() {
        let mut trail = AuditTrail::new(JourneyId::new("J-1"));
        let first = request(StepId::ReadyToGo);
        trail.record(
            &first,
            AuditOutcome::Persisted {
                transition: Transition::Started {
                    step: StepId::ReadyToGo,
                },
            },
        );
        trail.record(&first, AuditOutcome::Duplicate);
        trail.record(
            &request(StepId::PointsA),
            AuditOutcome::Rejected {
                error: "out of order".into(),
            },
        );

        let seqs: Vec<u64> = trail.records().iter().map(|r| r.sequence).collect();
        assert_eq!(seqs, vec![1, 2, 3]);
        assert_eq!(trail.for_request(first.request_id).len(), 2);
        assert_eq!(trail.for_step(StepId::PointsA).len(), 1);
        assert_eq!(trail.records()[2].outcome.label(), "rejected");
    }

    #[test]
    fn test_record_serializes_camel_case() {
        let mut trail = AuditTrail::new(JourneyId::new("J-1"));
        let record = trail
            .record(&request(StepId::ReadyToGo), AuditOutcome::Duplicate)
            .clone();
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["requestId"], record.request_id.to_string());
        assert_eq!(json["outcome"]["result"], "duplicate");
        assert_eq!(json["role"], "DRIVER");
    }
}
