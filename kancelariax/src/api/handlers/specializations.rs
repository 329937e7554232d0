use crate::api::extract::ApiJson;
use crate::api::models::law_firms::SpecializationCreate;
use crate::db::errors::DbError;
use crate::db::models::specializations::SpecializationCreateDBRequest;
use crate::errors::{Error, ErrorBody, Result};
use crate::jsonapi::{self, Document};
use crate::AppState;
use axum::{Json, extract::State, http::StatusCode};

#[utoipa::path(
    get,
    path = "/specializations",
    tag = "specializations",
    summary = "List specializations",
    responses(
        (status = 200, description = "Active specializations ordered by name", body = Document),
        (status = 500, description = "Internal server error", body = ErrorBody),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_specializations(State(state): State<AppState>) -> Result<Json<Document>> {
    let specializations = state.specializations.list_active().await?;
    let total = specializations.len();
    Ok(Json(jsonapi::collection(&specializations)?.with_meta("total", total)?))
}

#[utoipa::path(
    post,
    path = "/specializations",
    tag = "specializations",
    summary = "Create specialization",
    request_body = SpecializationCreate,
    responses(
        (status = 201, description = "Specialization created", body = Document),
        (status = 400, description = "Name or code missing", body = ErrorBody),
        (status = 409, description = "Code already in use", body = ErrorBody),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn create_specialization(
    State(state): State<AppState>,
    ApiJson(create): ApiJson<SpecializationCreate>,
) -> Result<(StatusCode, Json<Document>)> {
    let name = create.name.as_deref().map(str::trim).filter(|n| !n.is_empty());
    let code = create.code.as_deref().map(str::trim).filter(|c| !c.is_empty());
    let (Some(name), Some(code)) = (name, code) else {
        return Err(Error::BadRequest {
            message: "Name and code are required".to_string(),
        });
    };

    let request = SpecializationCreateDBRequest::new(name, code, create.description.clone());
    let specialization = state.specializations.insert(&request).await.map_err(|e| match e {
        DbError::UniqueViolation { .. } => Error::Conflict {
            message: "Specialization with this code already exists".to_string(),
        },
        other => Error::Database(other),
    })?;
    tracing::info!(code = %specialization.code, "created specialization");

    Ok((StatusCode::CREATED, Json(jsonapi::single(&specialization)?)))
}
