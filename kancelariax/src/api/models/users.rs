//! API request/response models for portal users.

use super::validation::{FieldErrors, is_email, is_phone};
use crate::errors::FieldError;
use crate::jsonapi::{JsonApiResource, RelationshipSpec};
use crate::search::{Searchable, SortValue};
use crate::types::{LawFirmId, ResourceType, UserId};
use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Client,
    Operator,
    Lawyer,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Client => "client",
            Role::Operator => "operator",
            Role::Lawyer => "lawyer",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "client" => Ok(Role::Client),
            "operator" => Ok(Role::Operator),
            "lawyer" => Ok(Role::Lawyer),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct User {
    #[schema(value_type = String, format = "uuid")]
    pub id: UserId,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub role: Role,
    pub is_active: bool,
    #[serde(default)]
    #[schema(value_type = Option<String>, format = "uuid")]
    pub law_firm_id: Option<LawFirmId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JsonApiResource for User {
    const TYPE: ResourceType = ResourceType::Users;
    const RELATIONSHIPS: &'static [RelationshipSpec] =
        &[RelationshipSpec::foreign_key("law_firm", ResourceType::LawFirms, "law_firm_id")];
}

impl Searchable for User {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.email.as_str()];
        if let Some(full_name) = &self.full_name {
            fields.push(full_name);
        }
        fields
    }

    fn filter_values(&self, field: &str) -> Vec<Cow<'_, str>> {
        match field {
            "role" => vec![Cow::Borrowed(self.role.as_str())],
            "status" => vec![Cow::Borrowed(if self.is_active { "active" } else { "inactive" })],
            _ => Vec::new(),
        }
    }

    fn sort_value(&self, field: &str) -> SortValue<'_> {
        match field {
            "created_at" => SortValue::Time(self.created_at),
            "email" => SortValue::Text(&self.email),
            _ => SortValue::Missing,
        }
    }
}

/// Role and activity counts across every user, regardless of list filters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total: u64,
    pub active: u64,
    pub clients: u64,
    pub lawyers: u64,
    pub admins: u64,
    pub operators: u64,
    pub new_this_month: u64,
}

impl UserStats {
    pub fn collect(users: &[User], now: DateTime<Utc>) -> Self {
        let mut stats = UserStats {
            total: users.len() as u64,
            ..Default::default()
        };
        for user in users {
            if user.is_active {
                stats.active += 1;
            }
            match user.role {
                Role::Client => stats.clients += 1,
                Role::Lawyer => stats.lawyers += 1,
                Role::Admin => stats.admins += 1,
                Role::Operator => stats.operators += 1,
            }
            if user.created_at.year() == now.year() && user.created_at.month() == now.month() {
                stats.new_this_month += 1;
            }
        }
        stats
    }
}

// User request models
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UserCreate {
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
    /// Lawyers linked to a firm also get a lawyer record on that firm
    #[schema(value_type = Option<String>, format = "uuid")]
    pub law_firm_id: Option<LawFirmId>,
}

impl UserCreate {
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = FieldErrors::new();
        if let Some(email) = self.email.as_deref().filter(|e| !e.is_empty()) {
            errors.check(is_email(email), "email", "email must be a valid email address");
        }
        if let Some(phone) = &self.phone {
            errors.check(is_phone(phone), "phone", "phone must be a valid phone number");
        }
        errors.into_result()
    }

    /// Split `full_name` into first and last name for the linked lawyer record.
    pub fn lawyer_names(&self) -> (String, String) {
        let mut parts = self.full_name.as_deref().unwrap_or_default().split(' ');
        let first = parts.next().unwrap_or_default().to_string();
        let last = parts.collect::<Vec<_>>().join(" ");
        (first, last)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UserUpdate {
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

impl UserUpdate {
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = FieldErrors::new();
        if let Some(email) = &self.email {
            errors.check(is_email(email), "email", "email must be a valid email address");
        }
        if let Some(phone) = &self.phone {
            errors.check(is_phone(phone), "phone", "phone must be a valid phone number");
        }
        errors.into_result()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserStatusUpdate {
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeleteResponse {
    pub success: bool,
}
