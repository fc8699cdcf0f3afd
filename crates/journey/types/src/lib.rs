//! Journey Field Workflow Types for C&C CRM
//!
//! A journey (one truck trip) moves through four fixed field steps:
//! Ready to Go, Points A, New Location and Back to Dispatcher. Within each
//! step the driver, the movers and the manager each fill their own
//! sub-form and capture media.
//!
//! # Key Concepts
//!
//! - **StepDefinition**: the static description of a step. The four
//!   definitions live in [`WORKFLOW_STEPS`] and are checked at compile time.
//! - **StepRecord**: the runtime progress of one step. Its status is
//!   derived from the record's timestamps and approval; it is never stored
//!   as a separate value.
//! - **JourneyWorkflowInstance**: the four step records of one journey.
//!   The current step is derived, not stored.
//! - **JourneyProgress**: the wire form exchanged with the journey API.
//!
//! # Invariants
//!
//! 1. Exactly four step records per instance, in ordinal order.
//! 2. No step is in progress or later while a lower step is pending.
//! 3. A completed step's record is immutable.

#![deny(unsafe_code)]

mod errors;
mod instance;
mod record;
mod step;
mod value;
mod wire;

pub use errors::*;
pub use instance::*;
pub use record::*;
pub use step::*;
pub use value::*;
pub use wire::*;
