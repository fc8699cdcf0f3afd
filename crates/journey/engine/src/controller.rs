//! Journey workflow controller
//!
//! Owns one journey's workflow instance. Actions are applied locally
//! first, then persisted through the [`JourneyApi`]; every outcome is
//! reported once through the [`Notifier`] and appended to the audit trail.
//!
//! At most one call to the journey API is in flight per controller, a
//! load or an action. Request ids make dispatch idempotent: a request id
//! that was already applied is a no-op.

use crate::action::{ActionRequest, Actor, WorkflowAction};
use crate::api::{ApiResult, JourneyApi};
use crate::audit::{AuditOutcome, AuditTrail};
use crate::config::WorkflowConfig;
use crate::notifier::{Notification, Notifier};
use crate::role_view::{JourneyContext, RenderedView, RoleView, StepView};
use crate::state_machine::{Transition, WorkflowStateMachine};
use access_types::Role;
use journey_types::*;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// What to do with the local state when persisting an action fails
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PersistFailurePolicy {
    /// Keep the optimistic local change; the user re-triggers manually
    #[default]
    RetainOptimistic,
    /// Restore the instance as it was before the action
    Rollback,
}

/// Result of a dispatched action
#[derive(Clone, Debug, PartialEq)]
pub enum DispatchOutcome {
    /// Applied locally and accepted by the journey API
    Persisted { transition: Transition },
    /// Applied locally but the journey API call failed
    PersistFailed {
        transition: Transition,
        error: JourneyError,
        rolled_back: bool,
    },
    /// The request id was already applied; nothing happened
    Duplicate { request_id: RequestId },
}

impl DispatchOutcome {
    pub fn is_persisted(&self) -> bool {
        matches!(self, Self::Persisted { .. })
    }

    pub fn transition(&self) -> Option<&Transition> {
        match self {
            Self::Persisted { transition } | Self::PersistFailed { transition, .. } => {
                Some(transition)
            }
            Self::Duplicate { .. } => None,
        }
    }
}

/// The call currently waiting on the journey API
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum InFlight {
    Load,
    Dispatch(RequestId),
}

struct ControllerState {
    instance: JourneyWorkflowInstance,
    processed: HashSet<RequestId>,
    in_flight: Option<InFlight>,
    audit: AuditTrail,
}

impl ControllerState {
    fn fresh(instance: JourneyWorkflowInstance) -> Self {
        Self {
            audit: AuditTrail::new(instance.journey_id.clone()),
            instance,
            processed: HashSet::new(),
            in_flight: None,
        }
    }
}

/// Clears the in-flight marker when a load or dispatch finishes or is
/// dropped
struct InFlightGuard<'a> {
    state: &'a Mutex<ControllerState>,
    call: InFlight,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        if state.in_flight == Some(self.call) {
            state.in_flight = None;
        }
    }
}

/// Drives one journey's workflow
pub struct JourneyWorkflowController<A, N> {
    api: A,
    notifier: N,
    machine: WorkflowStateMachine,
    config: WorkflowConfig,
    state: Mutex<ControllerState>,
}

impl<A: JourneyApi, N: Notifier> JourneyWorkflowController<A, N> {
    /// A controller holding a fresh instance for `journey_id`
    pub fn new(journey_id: JourneyId, api: A, notifier: N) -> Self {
        Self {
            api,
            notifier,
            machine: WorkflowStateMachine::new(),
            config: WorkflowConfig::default(),
            state: Mutex::new(ControllerState::fresh(JourneyWorkflowInstance::new(
                journey_id,
            ))),
        }
    }

    pub fn with_config(mut self, config: WorkflowConfig) -> Self {
        self.state.get_mut().instance.completion_policy = config.completion_policy;
        self.config = config;
        self
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    pub fn journey_id(&self) -> JourneyId {
        self.state.lock().instance.journey_id.clone()
    }

    /// Whether a load or an action is waiting on the journey API
    pub fn is_busy(&self) -> bool {
        self.state.lock().in_flight.is_some()
    }

    // ── Loading ──────────────────────────────────────────────────────

    /// Load `journey_id` from the journey API and make it the controlled
    /// instance.
    ///
    /// When the progress cannot be fetched or is invalid, a fresh pending
    /// instance is used instead and a warning is notified, unless
    /// `fallback_on_load_failure` is off. Actions dispatched while the
    /// fetch is outstanding are rejected as busy.
    pub async fn load_instance(
        &self,
        journey_id: &JourneyId,
    ) -> JourneyResult<JourneyWorkflowInstance> {
        let _in_flight = self.claim(InFlight::Load)?;

        let loaded = match self.api.fetch_progress(journey_id).await {
            Ok(progress) => self.instance_from_progress(journey_id, progress),
            Err(err) => Err(err.into()),
        };

        let instance = match loaded {
            Ok(instance) => {
                tracing::info!(
                    journey = %journey_id,
                    current = instance.current_ordinal(),
                    "Journey progress loaded"
                );
                instance
            }
            Err(err) if self.config.fallback_on_load_failure => {
                tracing::warn!(journey = %journey_id, error = %err, "Falling back to a fresh workflow");
                self.notifier.notify(
                    Notification::warning(format!(
                        "Could not load journey progress, starting from step 1: {}",
                        err
                    ))
                    .with_category(err.category()),
                );
                JourneyWorkflowInstance::new(journey_id.clone())
                    .with_policy(self.config.completion_policy)
            }
            Err(err) => return Err(self.fail(err)),
        };

        let mut state = self.state.lock();
        if state.instance.journey_id == *journey_id {
            state.instance = instance.clone();
        } else {
            *state = ControllerState::fresh(instance.clone());
        }
        Ok(instance)
    }

    fn instance_from_progress(
        &self,
        journey_id: &JourneyId,
        mut progress: JourneyProgress,
    ) -> JourneyResult<JourneyWorkflowInstance> {
        if progress.journey_id != journey_id.as_str() {
            return Err(JourneyError::InvalidProgress(format!(
                "requested journey {} but received {}",
                journey_id, progress.journey_id
            )));
        }
        progress
            .completion_policy
            .get_or_insert(self.config.completion_policy);
        JourneyWorkflowInstance::from_progress(progress)
    }

    // ── Dispatch ─────────────────────────────────────────────────────

    /// Apply an action locally, then persist it.
    ///
    /// Local rejections are returned as errors. A failed persist is not
    /// an error: the outcome reports it, and the configured
    /// [`PersistFailurePolicy`] decides whether the local change stays.
    pub async fn dispatch(&self, request: ActionRequest) -> JourneyResult<DispatchOutcome> {
        let request_id = request.request_id;

        let (transition, snapshot, update) = {
            let mut state = self.state.lock();

            if state.processed.contains(&request_id) {
                state.audit.record(&request, AuditOutcome::Duplicate);
                tracing::debug!(request_id = %request_id, "Duplicate request ignored");
                return Ok(DispatchOutcome::Duplicate { request_id });
            }

            if state.in_flight.is_some() {
                let busy = JourneyError::Busy(state.instance.journey_id.clone());
                state.audit.record(
                    &request,
                    AuditOutcome::Rejected {
                        error: busy.to_string(),
                    },
                );
                drop(state);
                return Err(self.fail(busy));
            }

            let snapshot = state.instance.clone();
            match self
                .machine
                .apply(&mut state.instance, &request.actor, &request.action)
            {
                Ok(transition) => {
                    state.in_flight = Some(InFlight::Dispatch(request_id));
                    state.processed.insert(request_id);
                    let update = PhaseUpdate {
                        request_id,
                        actor_role: request.actor.role,
                        phase: PhaseProgress::from_record(state.instance.step(transition.step())),
                    };
                    (transition, snapshot, update)
                }
                Err(err) => {
                    state.audit.record(
                        &request,
                        AuditOutcome::Rejected {
                            error: err.to_string(),
                        },
                    );
                    drop(state);
                    return Err(self.fail(err));
                }
            }
        };

        let _in_flight = InFlightGuard {
            state: &self.state,
            call: InFlight::Dispatch(request_id),
        };
        let result = self
            .persist(&snapshot.journey_id, &transition, &update)
            .await;

        let mut state = self.state.lock();
        match result {
            Ok(()) => {
                state.audit.record(
                    &request,
                    AuditOutcome::Persisted {
                        transition: transition.clone(),
                    },
                );
                drop(state);
                self.notifier
                    .notify(Notification::success(transition.describe()));
                Ok(DispatchOutcome::Persisted { transition })
            }
            Err(api_err) => {
                let error = JourneyError::from(api_err);
                let rolled_back = self.config.persist_failure == PersistFailurePolicy::Rollback;
                if rolled_back {
                    state.instance = snapshot;
                    state.processed.remove(&request_id);
                }
                state.audit.record(
                    &request,
                    AuditOutcome::PersistFailed {
                        error: error.to_string(),
                        rolled_back,
                    },
                );
                drop(state);

                tracing::warn!(
                    request_id = %request_id,
                    action = request.action.name(),
                    rolled_back,
                    error = %error,
                    "Persisting action failed"
                );
                self.notifier.notify(Notification::failure(&error));
                Ok(DispatchOutcome::PersistFailed {
                    transition,
                    error,
                    rolled_back,
                })
            }
        }
    }

    /// Attach a media reference to a step
    pub async fn add_media(
        &self,
        actor: Actor,
        step: StepId,
        kind: MediaKind,
        reference: impl Into<String>,
    ) -> JourneyResult<DispatchOutcome> {
        self.dispatch(ActionRequest::new(
            actor,
            WorkflowAction::AddMedia {
                step,
                kind,
                reference: reference.into(),
            },
        ))
        .await
    }

    async fn persist(
        &self,
        journey: &JourneyId,
        transition: &Transition,
        update: &PhaseUpdate,
    ) -> ApiResult<()> {
        match transition {
            Transition::Started { .. } => self.api.start_phase(journey, update).await,
            Transition::Completed { .. } => self.api.complete_phase(journey, update).await,
            Transition::Approved { .. } => self.api.approve_phase(journey, update).await,
            Transition::FieldRecorded { .. }
            | Transition::SubFormSubmitted { .. }
            | Transition::MediaAdded { .. } => self.api.save_phase(journey, update).await,
        }
    }

    /// Mark `call` as in flight, or fail with `Busy` if another call is
    fn claim(&self, call: InFlight) -> JourneyResult<InFlightGuard<'_>> {
        let mut state = self.state.lock();
        if state.in_flight.is_some() {
            let busy = JourneyError::Busy(state.instance.journey_id.clone());
            drop(state);
            return Err(self.fail(busy));
        }
        state.in_flight = Some(call);
        Ok(InFlightGuard {
            state: &self.state,
            call,
        })
    }

    /// Log and notify a failure, handing the error back
    fn fail(&self, err: JourneyError) -> JourneyError {
        tracing::warn!(category = ?err.category(), error = %err, "Action rejected");
        self.notifier.notify(Notification::failure(&err));
        err
    }

    // ── Views ────────────────────────────────────────────────────────

    /// Snapshot of the controlled instance
    pub fn instance(&self) -> JourneyWorkflowInstance {
        self.state.lock().instance.clone()
    }

    /// The instance in wire form
    pub fn progress(&self) -> JourneyProgress {
        self.state.lock().instance.to_progress()
    }

    pub fn audit_trail(&self) -> AuditTrail {
        self.state.lock().audit.clone()
    }

    /// `role`'s sub-form view of `step`
    pub fn step_view(&self, step: StepId, role: Role) -> JourneyResult<StepView> {
        let state = self.state.lock();
        StepView::build(&state.instance, &self.machine, role, step)
    }

    /// Render the journey for `role`
    pub fn view(&self, role: Role) -> RenderedView {
        let state = self.state.lock();
        let ctx = JourneyContext {
            instance: &state.instance,
            audit: &state.audit,
            machine: &self.machine,
        };
        RoleView::for_role(role).render(&ctx)
    }
}
