//! API request/response models for law firms, lawyers and specializations.

use super::validation::{
    FieldErrors, char_len_between, is_country_code, is_digits, is_email, is_http_url, is_phone, is_postal_code,
};
use crate::errors::FieldError;
use crate::jsonapi::{JsonApiResource, RelationshipSpec, ResourceObject};
use crate::search::{MatchMode, Searchable, SortValue};
use crate::types::{LawFirmId, LawyerId, ResourceType, SpecializationId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Cow;
use std::collections::HashMap;
use utoipa::ToSchema;

fn default_country() -> String {
    "PL".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub postal_code: String,
    #[serde(default = "default_country")]
    pub country: String,
}

impl Address {
    fn validate_into(&self, prefix: &str, errors: &mut FieldErrors) {
        errors.check(
            char_len_between(&self.street, 1, 255),
            &format!("{prefix}.street"),
            "street must be between 1 and 255 characters",
        );
        errors.check(
            char_len_between(&self.city, 1, 100),
            &format!("{prefix}.city"),
            "city must be between 1 and 100 characters",
        );
        errors.check(
            is_postal_code(&self.postal_code),
            &format!("{prefix}.postal_code"),
            "postal_code must match NN-NNN",
        );
        errors.check(
            is_country_code(&self.country),
            &format!("{prefix}.country"),
            "country must be a 2-letter code",
        );
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Contact {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

impl Contact {
    fn validate_into(&self, prefix: &str, errors: &mut FieldErrors) {
        if let Some(phone) = &self.phone {
            errors.check(is_phone(phone), &format!("{prefix}.phone"), "phone must be a valid phone number");
        }
        if let Some(email) = &self.email {
            errors.check(is_email(email), &format!("{prefix}.email"), "email must be a valid email address");
        }
        if let Some(website) = &self.website {
            errors.check(is_http_url(website), &format!("{prefix}.website"), "website must be a valid URL");
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Lawyer {
    #[schema(value_type = String, format = "uuid")]
    pub id: LawyerId,
    pub first_name: String,
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bar_number: Option<String>,
}

impl JsonApiResource for Lawyer {
    const TYPE: ResourceType = ResourceType::Lawyers;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LawyerCreate {
    pub first_name: String,
    pub last_name: String,
    pub title: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub bar_number: Option<String>,
}

impl LawyerCreate {
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = FieldErrors::new();
        errors.check(!self.first_name.trim().is_empty(), "first_name", "first_name is required");
        errors.check(!self.last_name.trim().is_empty(), "last_name", "last_name is required");
        if let Some(email) = &self.email {
            errors.check(is_email(email), "email", "email must be a valid email address");
        }
        errors.into_result()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Specialization {
    #[schema(value_type = String, format = "uuid")]
    pub id: SpecializationId,
    pub name: String,
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl JsonApiResource for Specialization {
    const TYPE: ResourceType = ResourceType::Specializations;
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct SpecializationCreate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LawFirm {
    #[schema(value_type = String, format = "uuid")]
    pub id: LawFirmId,
    pub name: String,
    pub tax_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub krs_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub founded_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub address: Address,
    pub contact: Contact,
    /// Free-form opening hours, keyed by weekday
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub business_hours: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_active: bool,
    #[serde(default)]
    pub lawyers: Vec<Lawyer>,
    #[serde(default)]
    pub specializations: Vec<Specialization>,
}

impl JsonApiResource for LawFirm {
    const TYPE: ResourceType = ResourceType::LawFirms;
    const RELATIONSHIPS: &'static [RelationshipSpec] = &[
        RelationshipSpec::new("lawyers", ResourceType::Lawyers),
        RelationshipSpec::new("specializations", ResourceType::Specializations),
    ];
}

impl LawFirm {
    /// Rebuild a firm from a `law-firms` resource, resolving its relationships against `included`.
    ///
    /// Related resources missing from `included` are skipped.
    pub fn from_resource(resource: &ResourceObject, included: &[ResourceObject]) -> Result<Self, serde_json::Error> {
        let mut firm: LawFirm = resource.to_record(ResourceType::LawFirms)?;

        let index: HashMap<(ResourceType, &str), &ResourceObject> = included
            .iter()
            .map(|r| ((r.resource_type, r.id.as_str()), r))
            .collect();

        let mut lawyers = Vec::new();
        for ident in resource.related("lawyers") {
            if let Some(related) = index.get(&(ident.resource_type, ident.id.as_str())) {
                lawyers.push(related.to_record::<Lawyer>(ResourceType::Lawyers)?);
            }
        }
        let mut specializations = Vec::new();
        for ident in resource.related("specializations") {
            if let Some(related) = index.get(&(ident.resource_type, ident.id.as_str())) {
                specializations.push(related.to_record::<Specialization>(ResourceType::Specializations)?);
            }
        }

        if !lawyers.is_empty() {
            firm.lawyers = lawyers;
        }
        if !specializations.is_empty() {
            firm.specializations = specializations;
        }
        Ok(firm)
    }
}

impl Searchable for LawFirm {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.name.as_str()];
        if let Some(description) = &self.description {
            fields.push(description);
        }
        fields
    }

    fn filter_values(&self, field: &str) -> Vec<Cow<'_, str>> {
        match field {
            "city" => vec![Cow::Borrowed(self.address.city.as_str())],
            "specializations" => self
                .specializations
                .iter()
                .map(|s| Cow::Borrowed(s.code.as_str()))
                .collect(),
            _ => Vec::new(),
        }
    }

    fn match_mode(field: &str) -> MatchMode {
        match field {
            "city" => MatchMode::IgnoreCase,
            _ => MatchMode::Exact,
        }
    }

    fn sort_value(&self, field: &str) -> SortValue<'_> {
        match field {
            "name" => SortValue::Text(&self.name),
            "city" => SortValue::Text(&self.address.city),
            "tax_number" => SortValue::Text(&self.tax_number),
            "founded_date" => self.founded_date.map(SortValue::Time).unwrap_or(SortValue::Missing),
            "created_at" => SortValue::Time(self.created_at),
            "updated_at" => SortValue::Time(self.updated_at),
            _ => SortValue::Missing,
        }
    }
}

// Law firm request models
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LawFirmCreate {
    pub name: String,
    pub tax_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub krs_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub founded_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub address: Address,
    #[serde(default)]
    pub contact: Contact,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub business_hours: Option<Value>,
    #[serde(default)]
    #[schema(value_type = Vec<String>)]
    pub specialization_ids: Vec<SpecializationId>,
}

impl LawFirmCreate {
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = FieldErrors::new();
        errors.check(
            char_len_between(&self.name, 1, 255),
            "name",
            "name must be between 1 and 255 characters",
        );
        errors.check(
            is_digits(&self.tax_number, 10),
            "tax_number",
            "tax_number must be exactly 10 digits",
        );
        if let Some(krs) = &self.krs_number {
            errors.check(is_digits(krs, 10), "krs_number", "krs_number must be exactly 10 digits");
        }
        if let Some(hours) = &self.business_hours {
            errors.check(hours.is_object(), "business_hours", "business_hours must be an object");
        }
        self.address.validate_into("address", &mut errors);
        self.contact.validate_into("contact", &mut errors);
        errors.into_result()
    }
}

/// The tax number is fixed at creation; naming it, or any other unknown field, is a 400.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct LawFirmUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<Contact>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Vec<String>>)]
    pub specialization_ids: Option<Vec<SpecializationId>>,
}

impl LawFirmUpdate {
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = FieldErrors::new();
        if let Some(name) = &self.name {
            errors.check(char_len_between(name, 1, 255), "name", "name must be between 1 and 255 characters");
        }
        if let Some(address) = &self.address {
            address.validate_into("address", &mut errors);
        }
        if let Some(contact) = &self.contact {
            contact.validate_into("contact", &mut errors);
        }
        errors.into_result()
    }
}
