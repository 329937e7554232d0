//! API request and response models.
//!
//! - [`law_firms`]: law firms, their lawyers and the specialization catalogue
//! - [`users`]: portal users and their statistics
//! - [`dashboard`]: admin dashboard counts
//! - [`search`]: query string parsing and validation for list endpoints
//! - [`pagination`]: derived pagination metadata
//! - [`validation`]: field checks shared by the request models

pub mod dashboard;
pub mod law_firms;
pub mod pagination;
pub mod search;
pub mod users;
pub mod validation;
