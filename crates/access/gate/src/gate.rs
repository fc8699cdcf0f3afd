//! Gate requirements and decisions

use crate::Navigator;
use access_types::{has_all_permissions, has_any_permission, has_permission, Permission, Role};
use serde::{Deserialize, Serialize};

/// What a role must hold to pass a gate
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum PermissionRequirement {
    /// A single permission
    Permission(Permission),
    /// At least one of the listed permissions (an empty list never passes)
    Any(Vec<Permission>),
    /// Every listed permission (an empty list always passes)
    All(Vec<Permission>),
    /// A role at or above this role's hierarchy level
    MinimumRole(Role),
}

impl PermissionRequirement {
    /// Whether `role` satisfies this requirement
    pub fn is_satisfied_by(&self, role: Role) -> bool {
        match self {
            Self::Permission(p) => has_permission(role, *p),
            Self::Any(ps) => has_any_permission(role, ps),
            Self::All(ps) => has_all_permissions(role, ps),
            Self::MinimumRole(min) => role.level() >= min.level(),
        }
    }
}

/// What happens when the requirement is not met
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "path", rename_all = "snake_case")]
pub enum GateFallback {
    /// Render nothing
    #[default]
    Hide,
    /// Render the gate's fallback content
    Fallback,
    /// Navigate to a configured path
    Redirect(String),
}

/// Outcome of evaluating a gate
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", content = "path", rename_all = "snake_case")]
pub enum GateDecision {
    Render,
    Hide,
    Fallback,
    Redirect(String),
}

impl GateDecision {
    /// Whether the guarded content is shown
    pub fn renders(&self) -> bool {
        matches!(self, Self::Render)
    }
}

/// Guards one surface behind a permission requirement
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionGate {
    pub requirement: PermissionRequirement,
    #[serde(default)]
    pub fallback: GateFallback,
}

impl PermissionGate {
    pub fn new(requirement: PermissionRequirement) -> Self {
        Self {
            requirement,
            fallback: GateFallback::Hide,
        }
    }

    pub fn permission(permission: Permission) -> Self {
        Self::new(PermissionRequirement::Permission(permission))
    }

    pub fn any(permissions: impl IntoIterator<Item = Permission>) -> Self {
        Self::new(PermissionRequirement::Any(permissions.into_iter().collect()))
    }

    pub fn all(permissions: impl IntoIterator<Item = Permission>) -> Self {
        Self::new(PermissionRequirement::All(permissions.into_iter().collect()))
    }

    pub fn minimum_role(role: Role) -> Self {
        Self::new(PermissionRequirement::MinimumRole(role))
    }

    pub fn with_fallback(mut self, fallback: GateFallback) -> Self {
        self.fallback = fallback;
        self
    }

    /// Decide what to show for the current user's role.
    ///
    /// A missing role is treated as holding no permissions.
    pub fn decide(&self, role: Option<Role>) -> GateDecision {
        let allowed = role
            .map(|r| self.requirement.is_satisfied_by(r))
            .unwrap_or(false);

        if allowed {
            return GateDecision::Render;
        }

        tracing::debug!(
            role = role.map(Role::as_str).unwrap_or("<none>"),
            requirement = ?self.requirement,
            "Permission gate denied"
        );

        match &self.fallback {
            GateFallback::Hide => GateDecision::Hide,
            GateFallback::Fallback => GateDecision::Fallback,
            GateFallback::Redirect(path) => GateDecision::Redirect(path.clone()),
        }
    }

    /// Decide from a raw role string; an unknown string is a missing role
    pub fn decide_str(&self, role: Option<&str>) -> GateDecision {
        self.decide(role.and_then(Role::parse))
    }

    /// Decide and perform the redirect if there is one.
    ///
    /// Returns whether the guarded content renders. Navigation is the
    /// only side effect.
    pub fn enforce(&self, role: Option<Role>, navigator: &mut dyn Navigator) -> bool {
        match self.decide(role) {
            GateDecision::Render => true,
            GateDecision::Redirect(path) => {
                navigator.navigate(&path);
                false
            }
            GateDecision::Hide | GateDecision::Fallback => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RecordingNavigator;

    #[test]
    fn test_single_permission() {
        let gate = PermissionGate::permission(Permission::JourneyApprove);
        assert_eq!(gate.decide(Some(Role::Manager)), GateDecision::Render);
        assert_eq!(gate.decide(Some(Role::Dispatcher)), GateDecision::Hide);
    }

    #[test]
    fn test_any_and_all() {
        let any = PermissionGate::any([Permission::StorageWrite, Permission::AuditRead]);
        assert!(any.decide(Some(Role::Auditor)).renders());
        assert!(any.decide(Some(Role::StorageManager)).renders());
        assert!(!any.decide(Some(Role::Driver)).renders());

        let all = PermissionGate::all([Permission::StorageWrite, Permission::AuditRead]);
        assert!(!all.decide(Some(Role::Auditor)).renders());
        assert!(!all.decide(Some(Role::StorageManager)).renders());
        assert!(all.decide(Some(Role::Admin)).renders());
    }

    #[test]
    fn test_empty_combinators() {
        assert!(!PermissionGate::any([]).decide(Some(Role::SuperAdmin)).renders());
        assert!(PermissionGate::all([]).decide(Some(Role::Mover)).renders());
    }

    #[test]
    fn test_minimum_role() {
        let gate = PermissionGate::minimum_role(Role::Dispatcher);
        assert!(gate.decide(Some(Role::Dispatcher)).renders());
        assert!(gate.decide(Some(Role::Admin)).renders());
        assert!(!gate.decide(Some(Role::Auditor)).renders());
    }

    #[test]
    fn test_missing_role_fails_closed() {
        let gate = PermissionGate::all([]).with_fallback(GateFallback::Fallback);
        assert_eq!(gate.decide(None), GateDecision::Fallback);
        assert_eq!(gate.decide_str(Some("NOT_A_ROLE")), GateDecision::Fallback);
        assert_eq!(gate.decide_str(Some("mover")), GateDecision::Render);
    }

    #[test]
    fn test_enforce_redirects_once() {
        let gate = PermissionGate::permission(Permission::CompanyWrite)
            .with_fallback(GateFallback::Redirect("/unauthorized".into()));
        let mut nav = RecordingNavigator::new();

        assert!(!gate.enforce(Some(Role::Admin), &mut nav));
        assert_eq!(nav.last(), Some("/unauthorized"));

        assert!(gate.enforce(Some(Role::SuperAdmin), &mut nav));
        assert_eq!(nav.visited().len(), 1);
    }

    #[test]
    fn test_hide_does_not_navigate() {
        let gate = PermissionGate::permission(Permission::CompanyWrite);
        let mut nav = RecordingNavigator::new();
        assert!(!gate.enforce(None, &mut nav));
        assert!(nav.visited().is_empty());
    }

    #[test]
    fn test_gate_serde() {
        let gate = PermissionGate::any([Permission::JourneyRead])
            .with_fallback(GateFallback::Redirect("/login".into()));
        let json = serde_json::to_value(&gate).unwrap();
        assert_eq!(json["requirement"]["type"], "any");
        assert_eq!(json["requirement"]["value"][0], "journey:read");
        assert_eq!(json["fallback"]["path"], "/login");
        let back: PermissionGate = serde_json::from_value(json).unwrap();
        assert_eq!(back, gate);
    }
}
