//! Permissions: `<resource>:<action>` capabilities from a closed set

use crate::AccessError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;

/// A single capability. The wire form is `<resource>:<action>`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Permission {
    UserRead,
    UserWrite,
    UserDelete,
    CompanyRead,
    CompanyWrite,
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
}

impl Permission {
    /// Every permission, in declaration order
    pub const ALL: [Permission; 26] = [
        Permission::UserRead,
        Permission::UserWrite,
        Permission::UserDelete,
        Permission::CompanyRead,
        Permission::CompanyWrite,
        Permission::LocationRead,
        Permission::LocationWrite,
        Permission::JourneyRead,
        Permission::JourneyWrite,
        Permission::JourneyDelete,
        Permission::JourneyApprove,
        Permission::CrewRead,
        Permission::CrewAssign,
        Permission::CustomerRead,
        Permission::CustomerWrite,
        Permission::LeadRead,
        Permission::LeadWrite,
        Permission::QuoteRead,
        Permission::QuoteWrite,
        Permission::QuoteApprove,
        Permission::MediaUpload,
        Permission::AuditRead,
        Permission::StorageRead,
        Permission::StorageWrite,
        Permission::ReportRead,
        Permission::SettingsWrite,
    ];

    /// Wire form
    pub const fn as_str(self) -> &'static str {
        match self {
            Permission::UserRead => "user:read",
            Permission::UserWrite => "user:write",
            Permission::UserDelete => "user:delete",
            Permission::CompanyRead => "company:read",
            Permission::CompanyWrite => "company:write",
            Permission::LocationRead => "location:read",
            Permission::LocationWrite => "location:write",
            Permission::JourneyRead => "journey:read",
            Permission::JourneyWrite => "journey:write",
            Permission::JourneyDelete => "journey:delete",
            Permission::JourneyApprove => "journey:approve",
            Permission::CrewRead => "crew:read",
            Permission::CrewAssign => "crew:assign",
            Permission::CustomerRead => "customer:read",
            Permission::CustomerWrite => "customer:write",
            Permission::LeadRead => "lead:read",
            Permission::LeadWrite => "lead:write",
            Permission::QuoteRead => "quote:read",
            Permission::QuoteWrite => "quote:write",
            Permission::QuoteApprove => "quote:approve",
            Permission::MediaUpload => "media:upload",
            Permission::AuditRead => "audit:read",
            Permission::StorageRead => "storage:read",
            Permission::StorageWrite => "storage:write",
            Permission::ReportRead => "report:read",
            Permission::SettingsWrite => "settings:write",
        }
    }

    /// The resource half of the wire form
    pub fn resource(self) -> &'static str {
        self.split().0
    }

    /// The action half of the wire form
    pub fn action(self) -> &'static str {
        self.split().1
    }

    fn split(self) -> (&'static str, &'static str) {
        let s = self.as_str();
        match s.split_once(':') {
            Some(parts) => parts,
            None => (s, ""),
        }
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Permission {
    type Err = AccessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Permission::ALL
            .into_iter()
            .find(|p| p.as_str() == normalized)
            .ok_or_else(|| AccessError::UnknownPermission(s.to_string()))
    }
}

impl Serialize for Permission {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Permission {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
