//! In-memory journey API for tests and offline use.
//!
//! Stores progress per journey the way the backend would, records every
//! call, and can be switched offline or paused mid-call.

use crate::api::{ApiError, ApiResult, JourneyApi};
use async_trait::async_trait;
use journey_types::{
    JourneyId, JourneyProgress, JourneyWorkflowInstance, PhaseUpdate, RequestId, StepId,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Which endpoint a call hit
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApiCallKind {
    Fetch,
    Start,
    Complete,
    Approve,
    Save,
}

/// One recorded call
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiCall {
    pub kind: ApiCallKind,
    pub journey: JourneyId,
    pub phase: Option<StepId>,
    pub request_id: Option<RequestId>,
}

#[derive(Default)]
struct MockState {
    journeys: HashMap<JourneyId, JourneyProgress>,
    calls: Vec<ApiCall>,
    offline: bool,
    gate: Option<Arc<Semaphore>>,
}

/// Mock journey API backed by a map
#[derive(Default)]
pub struct MemoryJourneyApi {
    state: Mutex<MockState>,
}

impl MemoryJourneyApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store progress for a journey
    pub fn seed(&self, progress: JourneyProgress) {
        let id = JourneyId::new(progress.journey_id.clone());
        self.state.lock().journeys.insert(id, progress);
    }

    /// Stored progress for a journey
    pub fn stored(&self, journey: &JourneyId) -> Option<JourneyProgress> {
        self.state.lock().journeys.get(journey).cloned()
    }

    /// Make every call fail as if the network were down
    pub fn set_offline(&self, offline: bool) {
        self.state.lock().offline = offline;
    }

    /// Hold every subsequent call until a permit is added to the returned
    /// semaphore. One permit releases one call.
    pub fn pause(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        self.state.lock().gate = Some(gate.clone());
        gate
    }

    /// Stop holding calls made from now on
    pub fn resume(&self) {
        self.state.lock().gate = None;
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.state.lock().calls.clone()
    }

    pub fn calls_of(&self, kind: ApiCallKind) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|c| c.kind == kind)
            .count()
    }

    /// Record the call and wait at the gate, if any
    async fn enter(&self, call: ApiCall) -> ApiResult<()> {
        let gate = {
            let mut state = self.state.lock();
            state.calls.push(call);
            state.gate.clone()
        };
        if let Some(gate) = gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }
        if self.state.lock().offline {
            return Err(ApiError::Unavailable("network unreachable".into()));
        }
        Ok(())
    }

    async fn write_phase(
        &self,
        kind: ApiCallKind,
        journey: &JourneyId,
        update: &PhaseUpdate,
    ) -> ApiResult<()> {
        self.enter(ApiCall {
            kind,
            journey: journey.clone(),
            phase: Some(update.phase.phase_id),
            request_id: Some(update.request_id),
        })
        .await?;

        let mut state = self.state.lock();
        let progress = state
            .journeys
            .entry(journey.clone())
            .or_insert_with(|| JourneyWorkflowInstance::new(journey.clone()).to_progress());
        match progress
            .timeline
            .iter_mut()
            .find(|p| p.phase_id == update.phase.phase_id)
        {
            Some(phase) => *phase = update.phase.clone(),
            None => progress.timeline.push(update.phase.clone()),
        }
        Ok(())
    }
}

#[async_trait]
impl JourneyApi for MemoryJourneyApi {
    async fn fetch_progress(&self, journey: &JourneyId) -> ApiResult<JourneyProgress> {
        self.enter(ApiCall {
            kind: ApiCallKind::Fetch,
            journey: journey.clone(),
            phase: None,
            request_id: None,
        })
        .await?;

        self.stored(journey)
            .ok_or_else(|| ApiError::NotFound(format!("journey {}", journey)))
    }

    async fn start_phase(&self, journey: &JourneyId, update: &PhaseUpdate) -> ApiResult<()> {
        self.write_phase(ApiCallKind::Start, journey, update).await
    }

    async fn complete_phase(&self, journey: &JourneyId, update: &PhaseUpdate) -> ApiResult<()> {
        self.write_phase(ApiCallKind::Complete, journey, update).await
    }

    async fn approve_phase(&self, journey: &JourneyId, update: &PhaseUpdate) -> ApiResult<()> {
        self.write_phase(ApiCallKind::Approve, journey, update).await
    }

    async fn save_phase(&self, journey: &JourneyId, update: &PhaseUpdate) -> ApiResult<()> {
        self.write_phase(ApiCallKind::Save, journey, update).await
    }
}
