//! In-memory repository implementation.
//!
//! Stores every table in a single lock-guarded struct. Suitable for tests, demos and
//! single-process deployments; data is lost on restart. The lock is only held for the duration
//! of one synchronous read or write, so each request works on its own snapshot.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::RwLock;
use serde_json::json;
use tracing::instrument;
use uuid::Uuid;

use super::repository::{LawFirmRepository, SpecializationRepository, UserRepository};
use crate::api::models::law_firms::{Address, Contact, LawFirm, Lawyer, Specialization};
use crate::api::models::users::{Role, User};
use crate::db::errors::{DbError, Result};
use crate::db::models::{
    law_firms::{LawFirmCreateDBRequest, LawFirmUpdateDBRequest, LawyerCreateDBRequest},
    specializations::SpecializationCreateDBRequest,
    users::{UserCreateDBRequest, UserUpdateDBRequest},
};
use crate::search::collation::locale_cmp;
use crate::types::{LawFirmId, SpecializationId, UserId, abbrev_uuid};

#[derive(Debug, Default)]
struct Tables {
    firms: Vec<LawFirm>,
    specializations: Vec<Specialization>,
    users: Vec<User>,
}

impl Tables {
    fn firm_mut(&mut self, id: LawFirmId) -> Option<&mut LawFirm> {
        self.firms.iter_mut().find(|f| f.id == id)
    }

    fn active_firm_mut(&mut self, id: LawFirmId) -> Option<&mut LawFirm> {
        self.firm_mut(id).filter(|f| f.is_active)
    }

    fn resolve_specializations(&self, ids: &[SpecializationId]) -> Result<Vec<Specialization>> {
        ids.iter()
            .map(|id| {
                self.specializations
                    .iter()
                    .find(|s| s.id == *id)
                    .cloned()
                    .ok_or_else(|| DbError::ForeignKeyViolation {
                        constraint: Some("law_firm_specializations_specialization_id_fkey".to_string()),
                        table: Some("law_firm_specializations".to_string()),
                        message: format!("specialization {id} does not exist"),
                    })
            })
            .collect()
    }
}

/// In-memory implementation of the repository traits.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-populated with two law firms, three specializations and two users.
    pub fn seeded() -> Self {
        let store = Self::new();
        {
            let mut tables = store.tables.write();
            seed(&mut tables);
        }
        store
    }
}

fn date(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .unwrap_or_default()
}

fn seed(tables: &mut Tables) {
    let commercial = Specialization {
        id: Uuid::from_u128(0x550e8400_e29b_41d4_a716_446655440010),
        name: "Prawo Gospodarcze".to_string(),
        code: "COMMERCIAL".to_string(),
        description: Some("Obsługa prawna przedsiębiorstw".to_string()),
        is_active: true,
        created_at: date(2010, 1, 1),
    };
    let civil = Specialization {
        id: Uuid::from_u128(0x550e8400_e29b_41d4_a716_446655440011),
        name: "Prawo Cywilne".to_string(),
        code: "CIVIL".to_string(),
        description: Some("Sprawy cywilne i rodzinne".to_string()),
        is_active: true,
        created_at: date(2010, 1, 1),
    };
    let criminal = Specialization {
        id: Uuid::from_u128(0x550e8400_e29b_41d4_a716_446655440012),
        name: "Prawo Karne".to_string(),
        code: "CRIMINAL".to_string(),
        description: Some("Obrona w sprawach karnych".to_string()),
        is_active: true,
        created_at: date(2010, 1, 1),
    };

    let kowalski = LawFirm {
        id: Uuid::from_u128(0x550e8400_e29b_41d4_a716_446655440000),
        name: "Kancelaria Kowalski & Associates".to_string(),
        tax_number: "1234567890".to_string(),
        krs_number: Some("0000123456".to_string()),
        founded_date: Some(date(2010, 1, 15)),
        description: Some(
            "Profesjonalna kancelaria prawna specjalizująca się w prawie gospodarczym i cywilnym.".to_string(),
        ),
        address: Address {
            street: "ul. Długa 15/3".to_string(),
            city: "Gdańsk".to_string(),
            postal_code: "80-831".to_string(),
            country: "PL".to_string(),
        },
        contact: Contact {
            phone: Some("+48123456789".to_string()),
            email: Some("kontakt@kowalski-law.pl".to_string()),
            website: Some("https://kowalski-law.pl".to_string()),
        },
        business_hours: Some(json!({
            "monday": "9:00-17:00",
            "tuesday": "9:00-17:00",
            "wednesday": "9:00-17:00",
            "thursday": "9:00-17:00",
            "friday": "9:00-17:00",
        })),
        created_at: date(2010, 1, 15),
        updated_at: date(2024, 1, 15),
        is_active: true,
        lawyers: vec![Lawyer {
            id: Uuid::from_u128(0x550e8400_e29b_41d4_a716_446655440001),
            first_name: "Jan".to_string(),
            last_name: "Kowalski".to_string(),
            title: Some("adw.".to_string()),
            email: Some("j.kowalski@kowalski-law.pl".to_string()),
            phone: Some("+48123456789".to_string()),
            bar_number: Some("ADW12345".to_string()),
        }],
        specializations: vec![commercial.clone(), civil.clone()],
    };

    let nowak = LawFirm {
        id: Uuid::from_u128(0x550e8400_e29b_41d4_a716_446655440002),
        name: "Kancelaria Nowak Legal".to_string(),
        tax_number: "9876543210".to_string(),
        krs_number: None,
        founded_date: None,
        description: Some("Specjalizujemy się w prawie karnym i administracyjnym.".to_string()),
        address: Address {
            street: "ul. Świętojańska 22".to_string(),
            city: "Gdańsk".to_string(),
            postal_code: "80-840".to_string(),
            country: "PL".to_string(),
        },
        contact: Contact {
            phone: Some("+48987654321".to_string()),
            email: Some("biuro@nowak-legal.pl".to_string()),
            website: None,
        },
        business_hours: None,
        created_at: date(2015, 3, 20),
        updated_at: date(2024, 1, 15),
        is_active: true,
        lawyers: Vec::new(),
        specializations: vec![criminal.clone()],
    };

    let admin = User {
        id: Uuid::from_u128(0x550e8400_e29b_41d4_a716_446655440100),
        email: "admin@kancelariax.pl".to_string(),
        full_name: Some("Administrator Systemu".to_string()),
        phone: None,
        role: Role::Admin,
        is_active: true,
        law_firm_id: None,
        created_at: date(2023, 6, 1),
        updated_at: date(2023, 6, 1),
    };
    let lawyer = User {
        id: Uuid::from_u128(0x550e8400_e29b_41d4_a716_446655440101),
        email: "j.kowalski@kowalski-law.pl".to_string(),
        full_name: Some("Jan Kowalski".to_string()),
        phone: Some("+48123456789".to_string()),
        role: Role::Lawyer,
        is_active: true,
        law_firm_id: Some(kowalski.id),
        created_at: date(2024, 1, 15),
        updated_at: date(2024, 1, 15),
    };

    tables.specializations = vec![commercial, civil, criminal];
    tables.firms = vec![kowalski, nowak];
    tables.users = vec![admin, lawyer];
}

#[async_trait::async_trait]
impl LawFirmRepository for InMemoryStore {
    #[instrument(skip(self), fields(law_firm_id = %abbrev_uuid(&id)))]
    async fn find(&self, id: LawFirmId) -> Result<Option<LawFirm>> {
        Ok(self.tables.read().firms.iter().find(|f| f.id == id).cloned())
    }

    #[instrument(skip(self))]
    async fn list_active(&self) -> Result<Vec<LawFirm>> {
        Ok(self.tables.read().firms.iter().filter(|f| f.is_active).cloned().collect())
    }

    #[instrument(skip(self))]
    async fn list_all(&self) -> Result<Vec<LawFirm>> {
        Ok(self.tables.read().firms.clone())
    }

    #[instrument(skip(self, request), fields(tax_number = %request.tax_number), err)]
    async fn insert(&self, request: &LawFirmCreateDBRequest) -> Result<LawFirm> {
        let mut tables = self.tables.write();
        if tables.firms.iter().any(|f| f.tax_number == request.tax_number) {
            return Err(DbError::unique(
                "law_firms",
                "law_firms_tax_number_unique",
                format!("duplicate tax_number {}", request.tax_number),
            ));
        }
        let specializations = tables.resolve_specializations(&request.specialization_ids)?;

        let now = Utc::now();
        let firm = LawFirm {
            id: Uuid::new_v4(),
            name: request.name.clone(),
            tax_number: request.tax_number.clone(),
            krs_number: request.krs_number.clone(),
            founded_date: request.founded_date,
            description: request.description.clone(),
            address: request.address.clone(),
            contact: request.contact.clone(),
            business_hours: request.business_hours.clone(),
            created_at: now,
            updated_at: now,
            is_active: true,
            lawyers: Vec::new(),
            specializations,
        };
        tables.firms.push(firm.clone());
        Ok(firm)
    }

    #[instrument(skip(self, request), fields(law_firm_id = %abbrev_uuid(&id)), err)]
    async fn update(&self, id: LawFirmId, request: &LawFirmUpdateDBRequest) -> Result<LawFirm> {
        let mut tables = self.tables.write();
        let specializations = request
            .specialization_ids
            .as_deref()
            .map(|ids| tables.resolve_specializations(ids))
            .transpose()?;

        let firm = tables.active_firm_mut(id).ok_or(DbError::NotFound)?;
        if let Some(name) = &request.name {
            firm.name = name.clone();
        }
        if let Some(description) = &request.description {
            firm.description = Some(description.clone());
        }
        if let Some(address) = &request.address {
            firm.address = address.clone();
        }
        if let Some(contact) = &request.contact {
            firm.contact = contact.clone();
        }
        if let Some(specializations) = specializations {
            firm.specializations = specializations;
        }
        firm.updated_at = Utc::now();
        Ok(firm.clone())
    }

    #[instrument(skip(self), fields(law_firm_id = %abbrev_uuid(&id)))]
    async fn soft_delete(&self, id: LawFirmId) -> Result<bool> {
        let mut tables = self.tables.write();
        match tables.active_firm_mut(id) {
            Some(firm) => {
                firm.is_active = false;
                firm.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    #[instrument(skip(self, request), fields(law_firm_id = %abbrev_uuid(&request.law_firm_id)), err)]
    async fn add_lawyer(&self, request: &LawyerCreateDBRequest) -> Result<Lawyer> {
        let mut tables = self.tables.write();
        let firm = tables.firm_mut(request.law_firm_id).ok_or_else(|| DbError::ForeignKeyViolation {
            constraint: Some("lawyers_law_firm_id_fkey".to_string()),
            table: Some("lawyers".to_string()),
            message: format!("law firm {} does not exist", request.law_firm_id),
        })?;
        let lawyer = Lawyer {
            id: Uuid::new_v4(),
            first_name: request.first_name.clone(),
            last_name: request.last_name.clone(),
            title: request.title.clone(),
            email: request.email.clone(),
            phone: request.phone.clone(),
            bar_number: request.bar_number.clone(),
        };
        firm.lawyers.push(lawyer.clone());
        Ok(lawyer)
    }

    #[instrument(skip(self), fields(law_firm_id = %abbrev_uuid(&law_firm_id)))]
    async fn list_lawyers(&self, law_firm_id: LawFirmId) -> Result<Vec<Lawyer>> {
        Ok(self
            .tables
            .read()
            .firms
            .iter()
            .find(|f| f.id == law_firm_id)
            .map(|f| f.lawyers.clone())
            .unwrap_or_default())
    }
}

#[async_trait::async_trait]
impl SpecializationRepository for InMemoryStore {
    #[instrument(skip(self))]
    async fn list_active(&self) -> Result<Vec<Specialization>> {
        let mut active: Vec<Specialization> = self
            .tables
            .read()
            .specializations
            .iter()
            .filter(|s| s.is_active)
            .cloned()
            .collect();
        active.sort_by(|a, b| locale_cmp(&a.name, &b.name));
        Ok(active)
    }

    #[instrument(skip(self, ids), fields(count = ids.len()))]
    async fn get_bulk(&self, ids: &[SpecializationId]) -> Result<HashMap<SpecializationId, Specialization>> {
        Ok(self
            .tables
            .read()
            .specializations
            .iter()
            .filter(|s| ids.contains(&s.id))
            .map(|s| (s.id, s.clone()))
            .collect())
    }

    #[instrument(skip(self, request), fields(code = %request.code), err)]
    async fn insert(&self, request: &SpecializationCreateDBRequest) -> Result<Specialization> {
        let mut tables = self.tables.write();
        if tables.specializations.iter().any(|s| s.code == request.code) {
            return Err(DbError::unique(
                "specializations",
                "specializations_code_unique",
                format!("duplicate code {}", request.code),
            ));
        }
        let specialization = Specialization {
            id: Uuid::new_v4(),
            name: request.name.clone(),
            code: request.code.clone(),
            description: request.description.clone(),
            is_active: true,
            created_at: Utc::now(),
        };
        tables.specializations.push(specialization.clone());
        Ok(specialization)
    }
}

#[async_trait::async_trait]
impl UserRepository for InMemoryStore {
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&id)))]
    async fn find(&self, id: UserId) -> Result<Option<User>> {
        Ok(self.tables.read().users.iter().find(|u| u.id == id).cloned())
    }

    #[instrument(skip(self))]
    async fn list(&self) -> Result<Vec<User>> {
        Ok(self.tables.read().users.clone())
    }

    #[instrument(skip(self, request), fields(role = %request.role), err)]
    async fn insert(&self, request: &UserCreateDBRequest) -> Result<User> {
        let mut tables = self.tables.write();
        if tables.users.iter().any(|u| u.email == request.email) {
            return Err(DbError::unique("users", "users_email_unique", "duplicate email"));
        }
        if let Some(law_firm_id) = request.law_firm_id {
            if tables.firm_mut(law_firm_id).is_none() {
                return Err(DbError::ForeignKeyViolation {
                    constraint: Some("users_law_firm_id_fkey".to_string()),
                    table: Some("users".to_string()),
                    message: format!("law firm {law_firm_id} does not exist"),
                });
            }
        }
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: request.email.clone(),
            full_name: request.full_name.clone(),
            phone: request.phone.clone(),
            role: request.role,
            is_active: request.is_active,
            law_firm_id: request.law_firm_id,
            created_at: now,
            updated_at: now,
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    #[instrument(skip(self, request), fields(user_id = %abbrev_uuid(&id)), err)]
    async fn update(&self, id: UserId, request: &UserUpdateDBRequest) -> Result<User> {
        let mut tables = self.tables.write();
        if let Some(email) = &request.email {
            if tables.users.iter().any(|u| u.id != id && &u.email == email) {
                return Err(DbError::unique("users", "users_email_unique", "duplicate email"));
            }
        }
        let user = tables.users.iter_mut().find(|u| u.id == id).ok_or(DbError::NotFound)?;
        if let Some(email) = &request.email {
            user.email = email.clone();
        }
        if let Some(full_name) = &request.full_name {
            user.full_name = Some(full_name.clone());
        }
        if let Some(phone) = &request.phone {
            user.phone = Some(phone.clone());
        }
        if let Some(role) = request.role {
            user.role = role;
        }
        if let Some(is_active) = request.is_active {
            user.is_active = is_active;
        }
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&id)), err)]
    async fn set_active(&self, id: UserId, is_active: bool) -> Result<User> {
        let mut tables = self.tables.write();
        let user = tables.users.iter_mut().find(|u| u.id == id).ok_or(DbError::NotFound)?;
        user.is_active = is_active;
        user.updated_at = Utc::now();
        Ok(user.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_request, specialization_id};

    #[tokio::test]
    async fn test_seed_data() {
        let store = InMemoryStore::seeded();
        let firms = LawFirmRepository::list_active(&store).await.unwrap();
        assert_eq!(firms.len(), 2);
        assert_eq!(firms[0].lawyers.len(), 1);
        assert_eq!(SpecializationRepository::list_active(&store).await.unwrap().len(), 3);
        assert_eq!(UserRepository::list(&store).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_tax_number_is_unique_violation() {
        let store = InMemoryStore::seeded();
        let mut request = create_request("Duplikat");
        request.tax_number = "1234567890".to_string();
        let err = LawFirmRepository::insert(&store, &request).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { ref table, .. } if table.as_deref() == Some("law_firms")));
    }

    #[tokio::test]
    async fn test_unknown_specialization_is_foreign_key_violation() {
        let store = InMemoryStore::seeded();
        let mut request = create_request("Nowa");
        request.specialization_ids = vec![Uuid::new_v4()];
        let err = LawFirmRepository::insert(&store, &request).await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }

    #[tokio::test]
    async fn test_insert_resolves_specializations() {
        let store = InMemoryStore::seeded();
        let mut request = create_request("Nowa");
        request.specialization_ids = vec![specialization_id("CRIMINAL")];
        let firm = LawFirmRepository::insert(&store, &request).await.unwrap();
        assert_eq!(firm.specializations[0].code, "CRIMINAL");
        assert!(firm.is_active);
        assert_eq!(LawFirmRepository::list_active(&store).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_soft_delete_only_once() {
        let store = InMemoryStore::seeded();
        let firm = LawFirmRepository::insert(&store, &create_request("Do usunięcia")).await.unwrap();

        assert!(store.soft_delete(firm.id).await.unwrap());
        assert!(!store.soft_delete(firm.id).await.unwrap());

        let stored = LawFirmRepository::find(&store, firm.id).await.unwrap().unwrap();
        assert!(!stored.is_active);
        assert_eq!(LawFirmRepository::list_active(&store).await.unwrap().len(), 2);
        assert_eq!(LawFirmRepository::list_all(&store).await.unwrap().len(), 3);
        let err = LawFirmRepository::update(&store, firm.id, &LawFirmUpdateDBRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound));
    }

    #[tokio::test]
    async fn test_update_replaces_specializations() {
        let store = InMemoryStore::seeded();
        let firm = LawFirmRepository::insert(&store, &create_request("Zmiana")).await.unwrap();
        let update = LawFirmUpdateDBRequest {
            description: Some("Nowy opis".to_string()),
            specialization_ids: Some(vec![specialization_id("CIVIL"), specialization_id("COMMERCIAL")]),
            ..Default::default()
        };
        let updated = LawFirmRepository::update(&store, firm.id, &update).await.unwrap();
        assert_eq!(updated.description.as_deref(), Some("Nowy opis"));
        assert_eq!(updated.specializations.len(), 2);
        assert!(updated.updated_at >= firm.updated_at);
    }

    #[tokio::test]
    async fn test_duplicate_specialization_code() {
        let store = InMemoryStore::seeded();
        let request = SpecializationCreateDBRequest::new("Karne bis", "criminal", None);
        let err = SpecializationRepository::insert(&store, &request).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_user_email_unique_and_status() {
        let store = InMemoryStore::seeded();
        let request = UserCreateDBRequest {
            email: "admin@kancelariax.pl".to_string(),
            full_name: None,
            phone: None,
            role: Role::Client,
            is_active: true,
            law_firm_id: None,
        };
        assert!(matches!(
            UserRepository::insert(&store, &request).await,
            Err(DbError::UniqueViolation { .. })
        ));

        let users = UserRepository::list(&store).await.unwrap();
        let user = store.set_active(users[0].id, false).await.unwrap();
        assert!(!user.is_active);
        assert!(matches!(store.set_active(Uuid::new_v4(), true).await, Err(DbError::NotFound)));
    }
}
