//! Journey workflow instances
//!
//! One instance tracks one journey through the four field steps. It is
//! created when a field user opens the journey and is never deleted; the
//! backend archives it along with the journey.

use crate::{
    CompletionPolicy, JourneyError, JourneyResult, StepId, StepRecord, StepStatus, STEP_COUNT,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Journey Identifier ───────────────────────────────────────────────

/// Identifier of a journey, owned by the backend
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JourneyId(pub String);

impl JourneyId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for JourneyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Workflow Instance ────────────────────────────────────────────────

/// Live progress of one journey through the field steps
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JourneyWorkflowInstance {
    pub journey_id: JourneyId,
    pub completion_policy: CompletionPolicy,
    /// One record per step, in ordinal order
    pub steps: [StepRecord; STEP_COUNT],
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JourneyWorkflowInstance {
    /// A fresh instance with every step pending
    pub fn new(journey_id: JourneyId) -> Self {
        let now = Utc::now();
        Self {
            journey_id,
            completion_policy: CompletionPolicy::default(),
            steps: StepId::ALL.map(StepRecord::new),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_policy(mut self, policy: CompletionPolicy) -> Self {
        self.completion_policy = policy;
        self
    }

    pub fn step(&self, step: StepId) -> &StepRecord {
        &self.steps[step.index()]
    }

    pub fn step_mut(&mut self, step: StepId) -> &mut StepRecord {
        &mut self.steps[step.index()]
    }

    pub fn status(&self, step: StepId) -> StepStatus {
        self.step(step).status()
    }

    /// Status of every step, in ordinal order
    pub fn statuses(&self) -> [StepStatus; STEP_COUNT] {
        StepId::ALL.map(|s| self.status(s))
    }

    /// Ordinal of the first step not yet finished, or `STEP_COUNT + 1`
    /// once every step is completed or approved.
    pub fn current_ordinal(&self) -> u8 {
        self.steps
            .iter()
            .find(|r| !r.status().is_finished())
            .map(|r| r.step.ordinal())
            .unwrap_or(STEP_COUNT as u8 + 1)
    }

    /// The step currently being worked, if the workflow is not finished
    pub fn current_step(&self) -> Option<StepId> {
        StepId::from_ordinal(self.current_ordinal())
    }

    /// Whether every step has been completed
    pub fn is_finished(&self) -> bool {
        self.current_step().is_none()
    }

    /// Mark the instance as modified
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Check the ordering invariant: no step has left `pending` while a
    /// lower-ordinal step is still pending, and no step past an unfinished
    /// step has finished.
    pub fn check_sequencing(&self) -> JourneyResult<()> {
        let mut seen_pending = false;
        let mut seen_unfinished = false;
        for record in &self.steps {
            let status = record.status();
            if seen_pending && status != StepStatus::Pending {
                return Err(JourneyError::sequence(
                    record.step,
                    "step has started while an earlier step is pending",
                ));
            }
            if seen_unfinished && status.is_finished() {
                return Err(JourneyError::sequence(
                    record.step,
                    "step has finished while an earlier step is unfinished",
                ));
            }
            seen_pending |= status == StepStatus::Pending;
            seen_unfinished |= !status.is_finished();
        }
        Ok(())
    }
}
