//! User roles and their hierarchy

use crate::AccessError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A CRM user role, as issued by the authentication service
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Operates the multi-company console
    SuperAdmin,
    /// Company administrator
    Admin,
    /// Location manager; the only role that approves field steps
    Manager,
    /// Schedules journeys and assigns crews
    Dispatcher,
    /// Truck driver
    Driver,
    /// Crew member
    Mover,
    /// Read-only compliance access
    Auditor,
    /// Runs storage units
    StorageManager,
}

impl Role {
    /// Every role, highest hierarchy level first
    pub const ALL: [Role; 8] = [
        Role::SuperAdmin,
        Role::Admin,
        Role::Manager,
        Role::Dispatcher,
        Role::Auditor,
        Role::StorageManager,
        Role::Driver,
        Role::Mover,
    ];

    /// Hierarchy level. Levels are unique, so no two roles tie.
    pub const fn level(self) -> u8 {
        match self {
            Role::SuperAdmin => 8,
            Role::Admin => 7,
            Role::Manager => 6,
            Role::Dispatcher => 5,
            Role::Auditor => 4,
            Role::StorageManager => 3,
            Role::Driver => 2,
            Role::Mover => 1,
        }
    }

    /// Wire name, as exchanged with the backend
    pub const fn as_str(self) -> &'static str {
        match self {
            Role::SuperAdmin => "SUPER_ADMIN",
            Role::Admin => "ADMIN",
            Role::Manager => "MANAGER",
            Role::Dispatcher => "DISPATCHER",
            Role::Driver => "DRIVER",
            Role::Mover => "MOVER",
            Role::Auditor => "AUDITOR",
            Role::StorageManager => "STORAGE_MANAGER",
        }
    }

    /// Human-readable label
    pub const fn label(self) -> &'static str {
        match self {
            Role::SuperAdmin => "Super Admin",
            Role::Admin => "Admin",
            Role::Manager => "Manager",
            Role::Dispatcher => "Dispatcher",
            Role::Driver => "Driver",
            Role::Mover => "Mover",
            Role::Auditor => "Auditor",
            Role::StorageManager => "Storage Manager",
        }
    }

    /// Parse a role leniently; `None` for anything outside the closed set
    pub fn parse(s: &str) -> Option<Role> {
        s.parse().ok()
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Role {
    type Err = AccessError;

    /// Case-insensitive; `-` and spaces are accepted in place of `_`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace(|c: char| c == '-' || c == ' ', "_");
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == normalized)
            .ok_or_else(|| AccessError::UnknownRole(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels_are_unique() {
        let mut levels: Vec<u8> = Role::ALL.iter().map(|r| r.level()).collect();
        levels.sort_unstable();
        levels.dedup();
        assert_eq!(levels.len(), Role::ALL.len());
        assert_eq!(Role::SuperAdmin.level(), 8);
        assert_eq!(Role::Mover.level(), 1);
    }

    #[test]
    fn test_all_is_ordered_by_level() {
        for pair in Role::ALL.windows(2) {
            assert!(pair[0].level() > pair[1].level());
        }
    }

    #[test]
    fn test_parse_variants() {
        assert_eq!("DRIVER".parse::<Role>().unwrap(), Role::Driver);
        assert_eq!("storage_manager".parse::<Role>().unwrap(), Role::StorageManager);
        assert_eq!("super-admin".parse::<Role>().unwrap(), Role::SuperAdmin);
        assert_eq!(Role::parse(" Mover "), Some(Role::Mover));
        assert_eq!(Role::parse("janitor"), None);
        assert!(matches!(
            "".parse::<Role>(),
            Err(AccessError::UnknownRole(_))
        ));
    }

    #[test]
    fn test_serde_wire_name() {
        let json = serde_json::to_string(&Role::StorageManager).unwrap();
        assert_eq!(json, "\"STORAGE_MANAGER\"");
        let back: Role = serde_json::from_str("\"SUPER_ADMIN\"").unwrap();
        assert_eq!(back, Role::SuperAdmin);
    }

    #[test]
    fn test_display_matches_wire() {
        for role in Role::ALL {
            assert_eq!(role.to_string(), role.as_str());
        }
    }
}
