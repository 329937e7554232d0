//! Repository traits for the directory's data.
//!
//! Handlers only see these traits (as `Arc<dyn ...>` in the application state), so the same
//! router runs against [`super::InMemoryStore`] in tests and [`super::PgStore`] in production.
//! Implementations take `&self` and manage their own connections or locks.

use crate::api::models::law_firms::{LawFirm, Lawyer, Specialization};
use crate::api::models::users::User;
use crate::db::errors::Result;
use crate::db::models::{
    law_firms::{LawFirmCreateDBRequest, LawFirmUpdateDBRequest, LawyerCreateDBRequest},
    specializations::SpecializationCreateDBRequest,
    users::{UserCreateDBRequest, UserUpdateDBRequest},
};
use crate::types::{LawFirmId, SpecializationId, UserId};
use std::collections::HashMap;

#[async_trait::async_trait]
pub trait LawFirmRepository: Send + Sync {
    /// Get a firm by ID, active or not, with its lawyers and specializations
    async fn find(&self, id: LawFirmId) -> Result<Option<LawFirm>>;

    /// Every active firm, in insertion order
    async fn list_active(&self) -> Result<Vec<LawFirm>>;

    /// Every firm, active or not
    async fn list_all(&self) -> Result<Vec<LawFirm>>;

    /// Fails with a unique violation on a duplicate tax number and a foreign key violation on
    /// an unknown specialization
    async fn insert(&self, request: &LawFirmCreateDBRequest) -> Result<LawFirm>;

    /// Fails with [`crate::db::errors::DbError::NotFound`] if the firm is missing or inactive
    async fn update(&self, id: LawFirmId, request: &LawFirmUpdateDBRequest) -> Result<LawFirm>;

    /// Mark an active firm inactive. Returns false if there was no active firm to deactivate.
    async fn soft_delete(&self, id: LawFirmId) -> Result<bool>;

    async fn add_lawyer(&self, request: &LawyerCreateDBRequest) -> Result<Lawyer>;

    async fn list_lawyers(&self, law_firm_id: LawFirmId) -> Result<Vec<Lawyer>>;
}

#[async_trait::async_trait]
pub trait SpecializationRepository: Send + Sync {
    /// Active specializations ordered by name
    async fn list_active(&self) -> Result<Vec<Specialization>>;

    /// Get lots of specializations by their IDs, keyed by ID
    async fn get_bulk(&self, ids: &[SpecializationId]) -> Result<HashMap<SpecializationId, Specialization>>;

    /// Fails with a unique violation on a duplicate code
    async fn insert(&self, request: &SpecializationCreateDBRequest) -> Result<Specialization>;
}

#[async_trait::async_trait]
pub trait UserRepository: Send + Sync {
    async fn find(&self, id: UserId) -> Result<Option<User>>;

    /// Every user, active or not
    async fn list(&self) -> Result<Vec<User>>;

    /// Fails with a unique violation on a duplicate email
    async fn insert(&self, request: &UserCreateDBRequest) -> Result<User>;

    async fn update(&self, id: UserId, request: &UserUpdateDBRequest) -> Result<User>;

    async fn set_active(&self, id: UserId, is_active: bool) -> Result<User>;
}
