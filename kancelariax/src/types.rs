//! Common type definitions shared by the server and the client.
//!
//! - Type aliases for entity IDs ([`LawFirmId`], [`UserId`], ...)
//! - [`ResourceType`]: the closed set of JSON:API resource types
//! - [`abbrev_uuid`]: abbreviate UUIDs to the first 8 chars for logging

use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;

// Type aliases for IDs
pub type LawFirmId = Uuid;
pub type LawyerId = Uuid;
pub type SpecializationId = Uuid;
pub type UserId = Uuid;

/// Abbreviate a UUID to its first 8 characters for more readable logs and traces
/// Example: "550e8400-e29b-41d4-a716-446655440000" -> "550e8400"
pub fn abbrev_uuid(uuid: &Uuid) -> String {
    uuid.to_string().chars().take(8).collect()
}

/// JSON:API resource types known to the service.
///
/// Both the serializer and the client deserializer use this enum, so a relationship can only ever
/// point at a type that actually exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceType {
    LawFirms,
    Lawyers,
    Specializations,
    Users,
}

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::LawFirms => "law-firms",
            ResourceType::Lawyers => "lawyers",
            ResourceType::Specializations => "specializations",
            ResourceType::Users => "users",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_type_wire_names() {
        assert_eq!(serde_json::to_value(ResourceType::LawFirms).unwrap(), "law-firms");
        assert_eq!(serde_json::to_value(ResourceType::Specializations).unwrap(), "specializations");

        let parsed: ResourceType = serde_json::from_value("lawyers".into()).unwrap();
        assert_eq!(parsed, ResourceType::Lawyers);
        assert_eq!(parsed.to_string(), "lawyers");
    }

    #[test]
    fn test_unknown_resource_type_is_rejected() {
        assert!(serde_json::from_value::<ResourceType>("law_firms".into()).is_err());
        assert!(serde_json::from_value::<ResourceType>("lawyer".into()).is_err());
    }

    #[test]
    fn test_abbrev_uuid() {
        let id = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap();
        assert_eq!(abbrev_uuid(&id), "550e8400");
    }
}
