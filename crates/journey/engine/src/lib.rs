//! Journey Workflow Runtime for C&C CRM
//!
//! Drives journeys through the four field steps. The engine applies user
//! actions to a local instance, persists them to the journey API and
//! renders what each role sees.
//!
//! # Architecture
//!
//! The [`JourneyWorkflowController`] composes specialized components:
//!
//! - [`WorkflowStateMachine`]: checks and applies start, record, complete,
//!   approve and media actions
//! - [`JourneyApi`]: the backend boundary, with [`HttpJourneyApi`] for
//!   production and [`mocks::MemoryJourneyApi`] for tests
//! - [`Notifier`]: transient success and failure messages
//! - [`AuditTrail`]: every dispatched action, in order
//! - [`RoleView`]: one view per role over the current instance
//!
//! # Example
//!
//! ```rust
//! use journey_engine::*;
//! use journey_engine::mocks::MemoryJourneyApi;
//! use access_types::Role;
//! use journey_types::{JourneyId, StepId, StepStatus};
//!
//! let rt = tokio::runtime::Runtime::new().unwrap();
//! rt.block_on(async {
//!     let controller = JourneyWorkflowController::new(
//!         JourneyId::new("J-1"),
//!         MemoryJourneyApi::new(),
//!         MemoryNotifier::new(),
//!     );
//!
//!     let start = ActionRequest::new(
//!         Actor::new(Role::Driver),
//!         WorkflowAction::Start { step: StepId::ReadyToGo },
//!     );
//!     let outcome = controller.dispatch(start).await.unwrap();
//!
//!     assert!(outcome.is_persisted());
//!     assert_eq!(controller.instance().status(StepId::ReadyToGo), StepStatus::InProgress);
//! });
//! ```

#![deny(unsafe_code)]

pub mod action;
pub mod api;
pub mod audit;
pub mod config;
pub mod controller;
pub mod http;
pub mod mocks;
pub mod notifier;
pub mod role_view;
pub mod state_machine;
pub mod telemetry;

// Re-export main types
pub use action::{ActionRequest, Actor, WorkflowAction};
pub use api::{ApiError, ApiResult, JourneyApi};
pub use audit::{AuditOutcome, AuditRecord, AuditTrail};
pub use config::{ApiConfig, ConfigError, EngineConfig, LoggingConfig, WorkflowConfig};
pub use controller::{DispatchOutcome, JourneyWorkflowController, PersistFailurePolicy};
pub use http::HttpJourneyApi;
pub use notifier::{MemoryNotifier, Notification, NotificationLevel, Notifier};
pub use role_view::{FieldPanel, OfficePanel, RenderedView, RoleView, StepView, TimelineEntry};
pub use state_machine::{AvailableAction, Transition, WorkflowStateMachine};
