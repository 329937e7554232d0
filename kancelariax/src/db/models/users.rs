//! Database models for users.

use crate::api::models::users::{Role, UserUpdate};
use crate::types::LawFirmId;

/// Database request for creating a new user
#[derive(Debug, Clone)]
pub struct UserCreateDBRequest {
    pub email: String,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub role: Role,
    pub is_active: bool,
    pub law_firm_id: Option<LawFirmId>,
}

/// Database request for updating a user; `None` leaves the column untouched
#[derive(Debug, Clone, Default)]
pub struct UserUpdateDBRequest {
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

impl From<UserUpdate> for UserUpdateDBRequest {
    fn from(api: UserUpdate) -> Self {
        Self {
            email: api.email,
            full_name: api.full_name,
            phone: api.phone,
            role: api.role,
            is_active: api.is_active,
        }
    }
}
