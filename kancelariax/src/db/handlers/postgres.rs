//! PostgreSQL repository implementation.
//!
//! Nested address/contact objects live in JSONB columns; lawyers and specializations are loaded
//! with one extra query each per batch of firms and attached in memory.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
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
use crate::types::{LawFirmId, SpecializationId, UserId, abbrev_uuid};

const LAW_FIRM_COLUMNS: &str = "id, name, tax_number, krs_number, founded_date, description, address, contact, \
     business_hours, created_at, updated_at, is_active";
const LAWYER_COLUMNS: &str = "id, law_firm_id, first_name, last_name, title, email, phone, bar_number";
const SPECIALIZATION_COLUMNS: &str = "id, name, code, description, is_active, created_at";
const USER_COLUMNS: &str = "id, email, full_name, phone, role, is_active, law_firm_id, created_at, updated_at";

// Database entity models
#[derive(Debug, FromRow)]
struct LawFirmRow {
    id: LawFirmId,
    name: String,
    tax_number: String,
    krs_number: Option<String>,
    founded_date: Option<DateTime<Utc>>,
    description: Option<String>,
    address: Json<Address>,
    contact: Json<Contact>,
    business_hours: Option<Value>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    is_active: bool,
}

impl LawFirmRow {
    fn into_law_firm(self, lawyers: Vec<Lawyer>, specializations: Vec<Specialization>) -> LawFirm {
        LawFirm {
            id: self.id,
            name: self.name,
            tax_number: self.tax_number,
            krs_number: self.krs_number,
            founded_date: self.founded_date,
            description: self.description,
            address: self.address.0,
            contact: self.contact.0,
            business_hours: self.business_hours,
            created_at: self.created_at,
            updated_at: self.updated_at,
            is_active: self.is_active,
            lawyers,
            specializations,
        }
    }
}

#[derive(Debug, FromRow)]
struct LawyerRow {
    id: Uuid,
    law_firm_id: LawFirmId,
    first_name: String,
    last_name: String,
    title: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    bar_number: Option<String>,
}

impl From<LawyerRow> for Lawyer {
    fn from(row: LawyerRow) -> Self {
        Self {
            id: row.id,
            first_name: row.first_name,
            last_name: row.last_name,
            title: row.title,
            email: row.email,
            phone: row.phone,
            bar_number: row.bar_number,
        }
    }
}

#[derive(Debug, FromRow)]
struct SpecializationRow {
    id: SpecializationId,
    name: String,
    code: String,
    description: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl From<SpecializationRow> for Specialization {
    fn from(row: SpecializationRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            code: row.code,
            description: row.description,
            is_active: row.is_active,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct FirmSpecializationRow {
    law_firm_id: LawFirmId,
    #[sqlx(flatten)]
    specialization: SpecializationRow,
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: UserId,
    email: String,
    full_name: Option<String>,
    phone: Option<String>,
    role: Role,
    is_active: bool,
    law_firm_id: Option<LawFirmId>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            full_name: row.full_name,
            phone: row.phone,
            role: row.role,
            is_active: row.is_active,
            law_firm_id: row.law_firm_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// PostgreSQL implementation of the repository traits.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Attach lawyers and specializations to a batch of firm rows, preserving row order.
    async fn hydrate(&self, rows: Vec<LawFirmRow>) -> Result<Vec<LawFirm>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<LawFirmId> = rows.iter().map(|r| r.id).collect();

        let lawyer_rows: Vec<LawyerRow> = sqlx::query_as(&format!(
            "SELECT {LAWYER_COLUMNS} FROM lawyers WHERE law_firm_id = ANY($1) ORDER BY created_at, id"
        ))
        .bind(ids.as_slice())
        .fetch_all(&self.pool)
        .await?;

        let specialization_rows: Vec<FirmSpecializationRow> = sqlx::query_as(
            "SELECT lfs.law_firm_id, s.id, s.name, s.code, s.description, s.is_active, s.created_at \
             FROM law_firm_specializations lfs \
             JOIN specializations s ON s.id = lfs.specialization_id \
             WHERE lfs.law_firm_id = ANY($1) \
             ORDER BY s.name",
        )
        .bind(ids.as_slice())
        .fetch_all(&self.pool)
        .await?;

        let mut lawyers: HashMap<LawFirmId, Vec<Lawyer>> = HashMap::new();
        for row in lawyer_rows {
            lawyers.entry(row.law_firm_id).or_default().push(row.into());
        }
        let mut specializations: HashMap<LawFirmId, Vec<Specialization>> = HashMap::new();
        for row in specialization_rows {
            specializations
                .entry(row.law_firm_id)
                .or_default()
                .push(row.specialization.into());
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let id = row.id;
                row.into_law_firm(
                    lawyers.remove(&id).unwrap_or_default(),
                    specializations.remove(&id).unwrap_or_default(),
                )
            })
            .collect())
    }

    async fn load_law_firm(&self, id: LawFirmId) -> Result<Option<LawFirm>> {
        let row: Option<LawFirmRow> = sqlx::query_as(&format!("SELECT {LAW_FIRM_COLUMNS} FROM law_firms WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => Ok(self.hydrate(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }
}

#[async_trait::async_trait]
impl LawFirmRepository for PgStore {
    #[instrument(skip(self), fields(law_firm_id = %abbrev_uuid(&id)), err)]
    async fn find(&self, id: LawFirmId) -> Result<Option<LawFirm>> {
        self.load_law_firm(id).await
    }

    #[instrument(skip(self), err)]
    async fn list_active(&self) -> Result<Vec<LawFirm>> {
        let rows: Vec<LawFirmRow> = sqlx::query_as(&format!(
            "SELECT {LAW_FIRM_COLUMNS} FROM law_firms WHERE is_active ORDER BY created_at, id"
        ))
        .fetch_all(&self.pool)
        .await?;
        self.hydrate(rows).await
    }

    #[instrument(skip(self), err)]
    async fn list_all(&self) -> Result<Vec<LawFirm>> {
        let rows: Vec<LawFirmRow> =
            sqlx::query_as(&format!("SELECT {LAW_FIRM_COLUMNS} FROM law_firms ORDER BY created_at, id"))
                .fetch_all(&self.pool)
                .await?;
        self.hydrate(rows).await
    }

    #[instrument(skip(self, request), fields(tax_number = %request.tax_number), err)]
    async fn insert(&self, request: &LawFirmCreateDBRequest) -> Result<LawFirm> {
        let id = Uuid::new_v4();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO law_firms \
             (id, name, tax_number, krs_number, founded_date, description, address, contact, business_hours) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(id)
        .bind(&request.name)
        .bind(&request.tax_number)
        .bind(&request.krs_number)
        .bind(request.founded_date)
        .bind(&request.description)
        .bind(Json(&request.address))
        .bind(Json(&request.contact))
        .bind(&request.business_hours)
        .execute(&mut *tx)
        .await?;

        for specialization_id in &request.specialization_ids {
            sqlx::query(
                "INSERT INTO law_firm_specializations (law_firm_id, specialization_id) VALUES ($1, $2) \
                 ON CONFLICT DO NOTHING",
            )
            .bind(id)
            .bind(specialization_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        self.load_law_firm(id).await?.ok_or(DbError::NotFound)
    }

    #[instrument(skip(self, request), fields(law_firm_id = %abbrev_uuid(&id)), err)]
    async fn update(&self, id: LawFirmId, request: &LawFirmUpdateDBRequest) -> Result<LawFirm> {
        let mut tx = self.pool.begin().await?;

        let updated: Option<(LawFirmId,)> = sqlx::query_as(
            "UPDATE law_firms SET \
                name = COALESCE($2, name), \
                description = COALESCE($3, description), \
                address = COALESCE($4, address), \
                contact = COALESCE($5, contact), \
                updated_at = NOW() \
             WHERE id = $1 AND is_active \
             RETURNING id",
        )
        .bind(id)
        .bind(&request.name)
        .bind(&request.description)
        .bind(request.address.as_ref().map(Json))
        .bind(request.contact.as_ref().map(Json))
        .fetch_optional(&mut *tx)
        .await?;

        if updated.is_none() {
            return Err(DbError::NotFound);
        }

        if let Some(specialization_ids) = &request.specialization_ids {
            sqlx::query("DELETE FROM law_firm_specializations WHERE law_firm_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            for specialization_id in specialization_ids {
                sqlx::query(
                    "INSERT INTO law_firm_specializations (law_firm_id, specialization_id) VALUES ($1, $2) \
                     ON CONFLICT DO NOTHING",
                )
                .bind(id)
                .bind(specialization_id)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;
        self.load_law_firm(id).await?.ok_or(DbError::NotFound)
    }

    #[instrument(skip(self), fields(law_firm_id = %abbrev_uuid(&id)), err)]
    async fn soft_delete(&self, id: LawFirmId) -> Result<bool> {
        let result = sqlx::query("UPDATE law_firms SET is_active = FALSE, updated_at = NOW() WHERE id = $1 AND is_active")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(law_firm_id = %abbrev_uuid(&request.law_firm_id)), err)]
    async fn add_lawyer(&self, request: &LawyerCreateDBRequest) -> Result<Lawyer> {
        let row: LawyerRow = sqlx::query_as(&format!(
            "INSERT INTO lawyers (id, law_firm_id, user_id, first_name, last_name, title, email, phone, bar_number) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {LAWYER_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(request.law_firm_id)
        .bind(request.user_id)
        .bind(&request.first_name)
        .bind(&request.last_name)
        .bind(&request.title)
        .bind(&request.email)
        .bind(&request.phone)
        .bind(&request.bar_number)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    #[instrument(skip(self), fields(law_firm_id = %abbrev_uuid(&law_firm_id)), err)]
    async fn list_lawyers(&self, law_firm_id: LawFirmId) -> Result<Vec<Lawyer>> {
        let rows: Vec<LawyerRow> = sqlx::query_as(&format!(
            "SELECT {LAWYER_COLUMNS} FROM lawyers WHERE law_firm_id = $1 ORDER BY created_at, id"
        ))
        .bind(law_firm_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}

#[async_trait::async_trait]
impl SpecializationRepository for PgStore {
    #[instrument(skip(self), err)]
    async fn list_active(&self) -> Result<Vec<Specialization>> {
        let rows: Vec<SpecializationRow> = sqlx::query_as(&format!(
            "SELECT {SPECIALIZATION_COLUMNS} FROM specializations WHERE is_active ORDER BY name"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    async fn get_bulk(&self, ids: &[SpecializationId]) -> Result<HashMap<SpecializationId, Specialization>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows: Vec<SpecializationRow> = sqlx::query_as(&format!(
            "SELECT {SPECIALIZATION_COLUMNS} FROM specializations WHERE id = ANY($1)"
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|row| (row.id, row.into())).collect())
    }

    #[instrument(skip(self, request), fields(code = %request.code), err)]
    async fn insert(&self, request: &SpecializationCreateDBRequest) -> Result<Specialization> {
        let row: SpecializationRow = sqlx::query_as(&format!(
            "INSERT INTO specializations (id, name, code, description) VALUES ($1, $2, $3, $4) \
             RETURNING {SPECIALIZATION_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&request.name)
        .bind(&request.code)
        .bind(&request.description)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }
}

#[async_trait::async_trait]
impl UserRepository for PgStore {
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&id)), err)]
    async fn find(&self, id: UserId) -> Result<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    #[instrument(skip(self), err)]
    async fn list(&self) -> Result<Vec<User>> {
        let rows: Vec<UserRow> = sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC, id"))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self, request), fields(role = %request.role), err)]
    async fn insert(&self, request: &UserCreateDBRequest) -> Result<User> {
        let row: UserRow = sqlx::query_as(&format!(
            "INSERT INTO users (id, email, full_name, phone, role, is_active, law_firm_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&request.email)
        .bind(&request.full_name)
        .bind(&request.phone)
        .bind(request.role)
        .bind(request.is_active)
        .bind(request.law_firm_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    #[instrument(skip(self, request), fields(user_id = %abbrev_uuid(&id)), err)]
    async fn update(&self, id: UserId, request: &UserUpdateDBRequest) -> Result<User> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "UPDATE users SET \
                email = COALESCE($2, email), \
                full_name = COALESCE($3, full_name), \
                phone = COALESCE($4, phone), \
                role = COALESCE($5, role), \
                is_active = COALESCE($6, is_active), \
                updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(&request.email)
        .bind(&request.full_name)
        .bind(&request.phone)
        .bind(request.role)
        .bind(request.is_active)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Into::into).ok_or(DbError::NotFound)
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&id)), err)]
    async fn set_active(&self, id: UserId, is_active: bool) -> Result<User> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "UPDATE users SET is_active = $2, updated_at = NOW() WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(is_active)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Into::into).ok_or(DbError::NotFound)
    }
}
