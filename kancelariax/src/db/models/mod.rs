//! Database request models.
//!
//! Repositories accept these requests and return the API record types from
//! [`crate::api::models`], which already carry their embedded relations.

pub mod law_firms;
pub mod specializations;
pub mod users;
