//! OpenAPI documentation for the directory API.
//!
//! The generated document is served at `/api-docs/openapi.json`; its server URL is set to the
//! configured API base path when the router is built.

use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

use crate::api::handlers::{dashboard, law_firms, specializations, users};
use crate::api::models::{
    dashboard::{DashboardStats, LawFirmStats},
    law_firms::{
        Address, Contact, LawFirm, LawFirmCreate, LawFirmUpdate, Lawyer, LawyerCreate, Specialization,
        SpecializationCreate,
    },
    pagination::PaginationMeta,
    search::SortOrder,
    users::{DeleteResponse, Role, User, UserCreate, UserStats, UserStatusUpdate, UserUpdate},
};
use crate::errors::{ErrorBody, FieldError};
use crate::jsonapi::{Document, Links, PrimaryData, Relationship, RelationshipData, ResourceIdentifier, ResourceObject};
use crate::types::ResourceType;

/// Bearer token accepted by the bundled client.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.security_schemes.insert(
                "BearerAuth".to_string(),
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .description(Some("Optional API token: `Authorization: Bearer YOUR_TOKEN`"))
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    servers(
        (url = "/api/v1", description = "Directory API")
    ),
    modifiers(&SecurityAddon),
    paths(
        law_firms::search_law_firms,
        law_firms::get_law_firm,
        law_firms::create_law_firm,
        law_firms::update_law_firm,
        law_firms::delete_law_firm,
        law_firms::list_lawyers,
        law_firms::create_lawyer,
        specializations::list_specializations,
        specializations::create_specialization,
        users::list_users,
        users::create_user,
        users::get_user,
        users::update_user,
        users::update_user_status,
        users::delete_user,
        dashboard::dashboard_stats,
    ),
    components(
        schemas(
            // JSON:API envelope
            Document,
            PrimaryData,
            ResourceObject,
            ResourceIdentifier,
            Relationship,
            RelationshipData,
            Links,
            ResourceType,
            PaginationMeta,
            SortOrder,
            // Records and requests
            LawFirm,
            LawFirmCreate,
            LawFirmUpdate,
            Address,
            Contact,
            Lawyer,
            LawyerCreate,
            Specialization,
            SpecializationCreate,
            User,
            UserCreate,
            UserUpdate,
            UserStatusUpdate,
            UserStats,
            Role,
            DeleteResponse,
            DashboardStats,
            LawFirmStats,
            // Errors
            ErrorBody,
            FieldError,
        )
    ),
    tags(
        (name = "law-firms", description = "Law firm directory: search, profiles and lawyers."),
        (name = "specializations", description = "Catalogue of legal specializations."),
        (name = "admin", description = "User administration and dashboard statistics."),
    ),
    info(
        title = "KancelariaX API",
        version = "1.0.0",
        description = "Law firm directory with JSON:API responses.",
    )
)]
pub struct ApiDoc;
