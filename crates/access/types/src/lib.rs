//! Access control types for C&C CRM
//!
//! Every surface of the CRM is gated by the role a user holds. Roles are
//! issued by the authentication service; this crate only knows how to map
//! them to capabilities.
//!
//! # Key Concepts
//!
//! - **Role**: the closed set of user roles, ranked by a unique hierarchy level.
//! - **Permission**: a `<resource>:<action>` capability from a closed set.
//! - **Capability table**: a compile-time constant mapping every role to its
//!   permissions. It is never mutated at runtime; changing it is a code change.
//!
//! All queries are pure functions. String entry points fail closed: an
//! unknown role or permission is treated as holding nothing.

#![deny(unsafe_code)]

mod capability;
mod errors;
mod permission;
mod role;

pub use capability::*;
pub use errors::*;
pub use permission::*;
pub use role::*;
