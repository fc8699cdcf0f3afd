//! The role capability table
//!
//! A compile-time constant: each role maps to a static slice of
//! permissions. Queries never allocate and never fail; the string entry
//! points deny anything they cannot parse.

use crate::{Permission, Role};
use Permission::*;

const SUPER_ADMIN: &[Permission] = &Permission::ALL;

const ADMIN: &[Permission] = &[
    UserRead,
    UserWrite,
    UserDelete,
    CompanyRead,
    LocationRead,
    LocationWrite,
    JourneyRead,
    JourneyWrite,
    JourneyDelete,
    JourneyApprove,
    CrewRead,
    CrewAssign,
    CustomerRead,
    CustomerWrite,
    LeadRead,
    LeadWrite,
    QuoteRead,
    QuoteWrite,
    QuoteApprove,
    MediaUpload,
    AuditRead,
    StorageRead,
    StorageWrite,
    ReportRead,
    SettingsWrite,
];

const MANAGER: &[Permission] = &[
    UserRead,
    LocationRead,
    JourneyRead,
    JourneyWrite,
    JourneyApprove,
    CrewRead,
    CrewAssign,
    CustomerRead,
    CustomerWrite,
    LeadRead,
    LeadWrite,
    QuoteRead,
    QuoteWrite,
    QuoteApprove,
    MediaUpload,
    AuditRead,
    StorageRead,
    ReportRead,
];

const DISPATCHER: &[Permission] = &[
    LocationRead,
    JourneyRead,
    JourneyWrite,
    CrewRead,
    CrewAssign,
    CustomerRead,
    StorageRead,
];

const AUDITOR: &[Permission] = &[
    UserRead,
    JourneyRead,
    CustomerRead,
    QuoteRead,
    AuditRead,
    ReportRead,
];

const STORAGE_MANAGER: &[Permission] = &[
    LocationRead,
    JourneyRead,
    CustomerRead,
    StorageRead,
    StorageWrite,
    ReportRead,
];

const DRIVER: &[Permission] = &[JourneyRead, CustomerRead, MediaUpload];

const MOVER: &[Permission] = &[JourneyRead, MediaUpload];

/// Permissions granted to a role
pub const fn role_permissions(role: Role) -> &'static [Permission] {
    match role {
        Role::SuperAdmin => SUPER_ADMIN,
        Role::Admin => ADMIN,
        Role::Manager => MANAGER,
        Role::Dispatcher => DISPATCHER,
        Role::Auditor => AUDITOR,
        Role::StorageManager => STORAGE_MANAGER,
        Role::Driver => DRIVER,
        Role::Mover => MOVER,
    }
}

/// Whether `role` holds `permission`
pub fn has_permission(role: Role, permission: Permission) -> bool {
    role_permissions(role).contains(&permission)
}

/// Whether `role` holds at least one of `permissions`. False when empty.
pub fn has_any_permission(role: Role, permissions: &[Permission]) -> bool {
    permissions.iter().any(|p| has_permission(role, *p))
}

/// Whether `role` holds every one of `permissions`. True when empty.
pub fn has_all_permissions(role: Role, permissions: &[Permission]) -> bool {
    permissions.iter().all(|p| has_permission(role, *p))
}

/// Whether `manager` ranks strictly above `target` in the hierarchy
pub fn can_manage_role(manager: Role, target: Role) -> bool {
    manager.level() > target.level()
}

/// String form of [`has_permission`]; unknown values are denied
pub fn has_permission_str(role: &str, permission: &str) -> bool {
    match (role.parse::<Role>(), permission.parse::<Permission>()) {
        (Ok(role), Ok(permission)) => has_permission(role, permission),
        _ => false,
    }
}

/// String form of [`role_permissions`]; an unknown role holds nothing
pub fn role_permissions_str(role: &str) -> &'static [Permission] {
    match role.parse::<Role>() {
        Ok(role) => role_permissions(role),
        Err(_) => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_super_admin_holds_everything() {
        for p in Permission::ALL {
            assert!(has_permission(Role::SuperAdmin, p), "missing {}", p);
        }
    }

    #[test]
    fn test_admin_cannot_write_companies() {
        assert!(!has_permission(Role::Admin, CompanyWrite));
        assert!(has_permission(Role::Admin, CompanyRead));
        assert_eq!(role_permissions(Role::Admin).len(), Permission::ALL.len() - 1);
    }

    #[test]
    fn test_no_duplicate_grants() {
        for role in Role::ALL {
            let mut perms = role_permissions(role).to_vec();
            perms.sort();
            perms.dedup();
            assert_eq!(perms.len(), role_permissions(role).len(), "{}", role);
        }
    }

    #[test]
    fn test_any_all_edge_cases() {
        assert!(!has_any_permission(Role::SuperAdmin, &[]));
        assert!(has_all_permissions(Role::Mover, &[]));
        assert!(has_any_permission(Role::Mover, &[AuditRead, MediaUpload]));
        assert!(!has_all_permissions(Role::Mover, &[AuditRead, MediaUpload]));
    }

    #[test]
    fn test_string_entry_points_fail_closed() {
        assert!(has_permission_str("DRIVER", "media:upload"));
        assert!(!has_permission_str("GHOST", "media:upload"));
        assert!(!has_permission_str("DRIVER", "media:delete"));
        assert!(role_permissions_str("GHOST").is_empty());
        assert_eq!(role_permissions_str("mover"), MOVER);
    }
}
