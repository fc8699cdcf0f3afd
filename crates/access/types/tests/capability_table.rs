//! Table-driven checks of the role capability table and hierarchy.

use access_types::*;

/// The expected grants, written out by wire name so the table is checked
/// against an independent statement of it.
fn expected(role: Role) -> &'static [&'static str] {
    match role {
        Role::SuperAdmin => &[
            "user:read", "user:write", "user:delete", "company:read", "company:write",
            "location:read", "location:write", "journey:read", "journey:write",
            "journey:delete", "journey:approve", "crew:read", "crew:assign",
            "customer:read", "customer:write", "lead:read", "lead:write", "quote:read",
            "quote:write", "quote:approve", "media:upload", "audit:read", "storage:read",
            "storage:write", "report:read", "settings:write",
        ],
        Role::Admin => &[
            "user:read", "user:write", "user:delete", "company:read", "location:read",
            "location:write", "journey:read", "journey:write", "journey:delete",
            "journey:approve", "crew:read", "crew:assign", "customer:read",
            "customer:write", "lead:read", "lead:write", "quote:read", "quote:write",
            "quote:approve", "media:upload", "audit:read", "storage:read",
            "storage:write", "report:read", "settings:write",
        ],
        Role::Manager => &[
            "user:read", "location:read", "journey:read", "journey:write",
            "journey:approve", "crew:read", "crew:assign", "customer:read",
            "customer:write", "lead:read", "lead:write", "quote:read", "quote:write",
            "quote:approve", "media:upload", "audit:read", "storage:read", "report:read",
        ],
        Role::Dispatcher => &[
            "location:read", "journey:read", "journey:write", "crew:read", "crew:assign",
            "customer:read", "storage:read",
        ],
        Role::Auditor => &[
            "user:read", "journey:read", "customer:read", "quote:read", "audit:read",
            "report:read",
        ],
        Role::StorageManager => &[
            "location:read", "journey:read", "customer:read", "storage:read",
            "storage:write", "report:read",
        ],
        Role::Driver => &["journey:read", "customer:read", "media:upload"],
        Role::Mover => &["journey:read", "media:upload"],
    }
}

#[test]
fn every_role_permission_pair_matches_the_table() {
    for role in Role::ALL {
        let grants = expected(role);
        for permission in Permission::ALL {
            let want = grants.contains(&permission.as_str());
            assert_eq!(
                has_permission(role, permission),
                want,
                "{} / {}",
                role,
                permission
            );
            assert_eq!(
                has_permission_str(role.as_str(), permission.as_str()),
                want,
                "string form {} / {}",
                role,
                permission
            );
        }
        assert_eq!(role_permissions(role).len(), grants.len(), "{}", role);
    }
}

#[test]
fn can_manage_is_strictly_by_level() {
    for a in Role::ALL {
        for b in Role::ALL {
            assert_eq!(can_manage_role(a, b), a.level() > b.level(), "{} vs {}", a, b);
        }
    }
}

#[test]
fn can_manage_is_irreflexive_and_antisymmetric() {
    for a in Role::ALL {
        assert!(!can_manage_role(a, a), "{} manages itself", a);
        for b in Role::ALL {
            if can_manage_role(a, b) {
                assert!(!can_manage_role(b, a), "{} and {} manage each other", a, b);
            }
        }
    }
}

#[test]
fn hierarchy_ends() {
    for role in Role::ALL {
        if role != Role::SuperAdmin {
            assert!(can_manage_role(Role::SuperAdmin, role));
        }
        if role != Role::Mover {
            assert!(!can_manage_role(Role::Mover, role));
        }
    }
}
