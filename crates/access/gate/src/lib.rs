//! Permission Gate for C&C CRM
//!
//! A gate guards one surface (a page, a panel, a button). Given the
//! current user's role it decides whether the guarded content renders,
//! disappears, is replaced by fallback content, or sends the user
//! elsewhere.
//!
//! The gate fails closed: a missing role holds no permissions. Denials
//! are silent by default so that hidden controls do not leak structure.
//!
//! # Example
//!
//! ```rust
//! use access_gate::{GateDecision, GateFallback, PermissionGate, PermissionRequirement};
//! use access_types::{Permission, Role};
//!
//! let gate = PermissionGate::new(PermissionRequirement::Permission(Permission::AuditRead))
//!     .with_fallback(GateFallback::Redirect("/dashboard".into()));
//!
//! assert_eq!(gate.decide(Some(Role::Auditor)), GateDecision::Render);
//! assert_eq!(
//!     gate.decide(Some(Role::Mover)),
//!     GateDecision::Redirect("/dashboard".into())
//! );
//! ```

#![deny(unsafe_code)]

pub mod gate;
pub mod navigator;

pub use gate::{GateDecision, GateFallback, PermissionGate, PermissionRequirement};
pub use navigator::{Navigator, RecordingNavigator};
