//! Database models for law firms and their lawyers.

use crate::api::models::law_firms::{Address, Contact, LawFirmCreate, LawFirmUpdate, LawyerCreate};
use crate::types::{LawFirmId, SpecializationId, UserId};
use bon::Builder;
use chrono::{DateTime, Utc};
use serde_json::Value;

/// Database request for creating a new law firm
#[derive(Debug, Clone, Builder)]
pub struct LawFirmCreateDBRequest {
    pub name: String,
    pub tax_number: String,
    pub krs_number: Option<String>,
    pub founded_date: Option<DateTime<Utc>>,
    pub description: Option<String>,
    pub address: Address,
    #[builder(default)]
    pub contact: Contact,
    pub business_hours: Option<Value>,
    #[builder(default)]
    pub specialization_ids: Vec<SpecializationId>,
}

impl From<LawFirmCreate> for LawFirmCreateDBRequest {
    fn from(api: LawFirmCreate) -> Self {
        Self::builder()
            .name(api.name)
            .tax_number(api.tax_number)
            .maybe_krs_number(api.krs_number)
            .maybe_founded_date(api.founded_date)
            .maybe_description(api.description)
            .address(api.address)
            .contact(api.contact)
            .maybe_business_hours(api.business_hours)
            .specialization_ids(api.specialization_ids)
            .build()
    }
}

/// Database request for updating a law firm; `None` leaves the column untouched
#[derive(Debug, Clone, Default)]
pub struct LawFirmUpdateDBRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub address: Option<Address>,
    pub contact: Option<Contact>,
    /// Replaces the whole set when present
    pub specialization_ids: Option<Vec<SpecializationId>>,
}

impl From<LawFirmUpdate> for LawFirmUpdateDBRequest {
    fn from(api: LawFirmUpdate) -> Self {
        Self {
            name: api.name,
            description: api.description,
            address: api.address,
            contact: api.contact,
            specialization_ids: api.specialization_ids,
        }
    }
}

/// Database request for attaching a lawyer to a firm
#[derive(Debug, Clone, Builder)]
pub struct LawyerCreateDBRequest {
    pub law_firm_id: LawFirmId,
    pub user_id: Option<UserId>,
    pub first_name: String,
    pub last_name: String,
    pub title: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub bar_number: Option<String>,
}

impl LawyerCreateDBRequest {
    pub fn new(law_firm_id: LawFirmId, api: LawyerCreate) -> Self {
        Self::builder()
            .law_firm_id(law_firm_id)
            .first_name(api.first_name)
            .last_name(api.last_name)
            .maybe_title(api.title)
            .maybe_email(api.email)
            .maybe_phone(api.phone)
            .maybe_bar_number(api.bar_number)
            .build()
    }
}
