use super::parse_id;
use crate::api::extract::ApiJson;
use crate::api::models::law_firms::{LawFirm, LawFirmCreate, LawFirmUpdate, LawyerCreate};
use crate::api::models::search::{LAW_FIRM_SEARCH, LawFirmSearchQuery, QueryParams};
use crate::db::errors::DbError;
use crate::db::models::law_firms::{LawFirmCreateDBRequest, LawFirmUpdateDBRequest, LawyerCreateDBRequest};
use crate::errors::{Error, ErrorBody, FieldError, Result};
use crate::jsonapi::{self, Document};
use crate::search;
use crate::types::{LawFirmId, SpecializationId, abbrev_uuid};
use crate::AppState;
use axum::{
    Json,
    extract::{Path, RawQuery, State},
    http::StatusCode,
};

fn law_firm_id(raw: &str) -> Result<LawFirmId> {
    parse_id(raw, "Invalid law firm ID format")
}

fn not_found(id: &str) -> Error {
    Error::NotFound {
        resource: "Law firm".to_string(),
        id: id.to_string(),
    }
}

/// Load an active firm; inactive firms are reported exactly like missing ones.
async fn find_active(state: &AppState, raw_id: &str) -> Result<LawFirm> {
    let id = law_firm_id(raw_id)?;
    state
        .law_firms
        .find(id)
        .await?
        .filter(|firm| firm.is_active)
        .ok_or_else(|| not_found(raw_id))
}

/// Every referenced specialization must exist, otherwise the request is rejected with one detail
/// per unknown ID.
async fn check_specializations(state: &AppState, ids: &[SpecializationId]) -> Result<()> {
    if ids.is_empty() {
        return Ok(());
    }
    let known = state.specializations.get_bulk(ids).await?;
    let details: Vec<FieldError> = ids
        .iter()
        .filter(|id| !known.contains_key(id))
        .map(|id| FieldError::new("specialization_ids", format!("specialization {id} does not exist")))
        .collect();
    if details.is_empty() {
        Ok(())
    } else {
        Err(Error::validation("Validation failed", details))
    }
}

#[utoipa::path(
    get,
    path = "/law-firms",
    tag = "law-firms",
    summary = "Search law firms",
    description = "Free-text search, filters, sorting and pagination over active law firms.",
    params(LawFirmSearchQuery),
    responses(
        (status = 200, description = "Page of matching law firms", body = Document),
        (status = 400, description = "Invalid search parameters", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn search_law_firms(State(state): State<AppState>, RawQuery(query): RawQuery) -> Result<Json<Document>> {
    let raw = QueryParams::parse(query.as_deref());
    let params = LAW_FIRM_SEARCH
        .parse(&raw)
        .map_err(|details| Error::validation("Invalid search parameters", details))?;

    let firms = state.law_firms.list_active().await?;
    let outcome = search::run(firms, &params);
    tracing::debug!(total = outcome.meta.total, page = params.page(), "law firm search");

    let template = params.link_template(&LAW_FIRM_SEARCH, state.config.api.path("/law-firms"));
    let document = jsonapi::collection(&outcome.items)?.with_pagination(&outcome.meta, &template)?;
    Ok(Json(document))
}

#[utoipa::path(
    get,
    path = "/law-firms/{id}",
    tag = "law-firms",
    summary = "Get law firm",
    params(("id" = String, Path, description = "Law firm ID")),
    responses(
        (status = 200, description = "Law firm with its lawyers and specializations", body = Document),
        (status = 400, description = "Malformed ID", body = ErrorBody),
        (status = 404, description = "Law firm not found or inactive", body = ErrorBody),
    )
)]
#[tracing::instrument(skip_all, fields(law_firm_id = %id))]
pub async fn get_law_firm(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Document>> {
    let firm = find_active(&state, &id).await?;
    Ok(Json(jsonapi::single(&firm)?))
}

#[utoipa::path(
    post,
    path = "/law-firms",
    tag = "law-firms",
    summary = "Create law firm",
    request_body = LawFirmCreate,
    responses(
        (status = 201, description = "Law firm created", body = Document),
        (status = 400, description = "Invalid payload", body = ErrorBody),
        (status = 409, description = "Tax number already registered", body = ErrorBody),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn create_law_firm(
    State(state): State<AppState>,
    ApiJson(create): ApiJson<LawFirmCreate>,
) -> Result<(StatusCode, Json<Document>)> {
    create
        .validate()
        .map_err(|details| Error::validation("Validation failed", details))?;
    check_specializations(&state, &create.specialization_ids).await?;

    let tax_number = create.tax_number.clone();
    let request = LawFirmCreateDBRequest::from(create);
    let firm = state.law_firms.insert(&request).await.map_err(|e| match e {
        DbError::UniqueViolation { .. } => Error::Conflict {
            message: format!("Law firm with tax number {tax_number} already exists"),
        },
        other => Error::Database(other),
    })?;
    tracing::info!(law_firm_id = %abbrev_uuid(&firm.id), "created law firm");

    let document = jsonapi::single(&firm)?.with_meta("created_at", firm.created_at)?;
    Ok((StatusCode::CREATED, Json(document)))
}

#[utoipa::path(
    put,
    path = "/law-firms/{id}",
    tag = "law-firms",
    summary = "Update law firm",
    params(("id" = String, Path, description = "Law firm ID")),
    request_body = LawFirmUpdate,
    responses(
        (status = 200, description = "Law firm updated", body = Document),
        (status = 400, description = "Invalid payload or malformed ID", body = ErrorBody),
        (status = 404, description = "Law firm not found or inactive", body = ErrorBody),
    )
)]
#[tracing::instrument(skip_all, fields(law_firm_id = %id))]
pub async fn update_law_firm(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(update): ApiJson<LawFirmUpdate>,
) -> Result<Json<Document>> {
    let law_firm_id = law_firm_id(&id)?;
    update
        .validate()
        .map_err(|details| Error::validation("Validation failed", details))?;
    if let Some(ids) = &update.specialization_ids {
        check_specializations(&state, ids).await?;
    }

    let request = LawFirmUpdateDBRequest::from(update);
    let firm = state
        .law_firms
        .update(law_firm_id, &request)
        .await
        .map_err(|e| match e {
            DbError::NotFound => not_found(&id),
            other => Error::Database(other),
        })?;

    let document = jsonapi::single(&firm)?.with_meta("updated_at", firm.updated_at)?;
    Ok(Json(document))
}

#[utoipa::path(
    delete,
    path = "/law-firms/{id}",
    tag = "law-firms",
    summary = "Deactivate law firm",
    params(("id" = String, Path, description = "Law firm ID")),
    responses(
        (status = 204, description = "Law firm deactivated"),
        (status = 400, description = "Malformed ID", body = ErrorBody),
        (status = 404, description = "Law firm not found or already inactive", body = ErrorBody),
    )
)]
#[tracing::instrument(skip_all, fields(law_firm_id = %id))]
pub async fn delete_law_firm(State(state): State<AppState>, Path(id): Path<String>) -> Result<StatusCode> {
    let law_firm_id = law_firm_id(&id)?;
    if !state.law_firms.soft_delete(law_firm_id).await? {
        return Err(not_found(&id));
    }
    tracing::info!(law_firm_id = %abbrev_uuid(&law_firm_id), "deactivated law firm");
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/law-firms/{id}/lawyers",
    tag = "law-firms",
    summary = "List lawyers of a law firm",
    params(("id" = String, Path, description = "Law firm ID")),
    responses(
        (status = 200, description = "Lawyers of the firm", body = Document),
        (status = 404, description = "Law firm not found or inactive", body = ErrorBody),
    )
)]
#[tracing::instrument(skip_all, fields(law_firm_id = %id))]
pub async fn list_lawyers(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Document>> {
    let firm = find_active(&state, &id).await?;
    let lawyers = state.law_firms.list_lawyers(firm.id).await?;
    let total = lawyers.len();
    Ok(Json(jsonapi::collection(&lawyers)?.with_meta("total", total)?))
}

#[utoipa::path(
    post,
    path = "/law-firms/{id}/lawyers",
    tag = "law-firms",
    summary = "Add a lawyer to a law firm",
    params(("id" = String, Path, description = "Law firm ID")),
    request_body = LawyerCreate,
    responses(
        (status = 201, description = "Lawyer added", body = Document),
        (status = 400, description = "Invalid payload", body = ErrorBody),
        (status = 404, description = "Law firm not found or inactive", body = ErrorBody),
    )
)]
#[tracing::instrument(skip_all, fields(law_firm_id = %id))]
pub async fn create_lawyer(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(create): ApiJson<LawyerCreate>,
) -> Result<(StatusCode, Json<Document>)> {
    let firm = find_active(&state, &id).await?;
    create
        .validate()
        .map_err(|details| Error::validation("Validation failed", details))?;

    let lawyer = state
        .law_firms
        .add_lawyer(&LawyerCreateDBRequest::new(firm.id, create))
        .await?;
    Ok((StatusCode::CREATED, Json(jsonapi::single(&lawyer)?)))
}

#[cfg(test)]
mod tests {
    use crate::test_utils::{create_test_server, law_firm_payload};
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    const KOWALSKI: &str = "550e8400-e29b-41d4-a716-446655440000";

    #[tokio::test]
    #[test_log::test]
    async fn test_search_returns_envelope_with_links() {
        let server = create_test_server();
        let response = server.get("/api/v1/law-firms?per_page=1").await;
        response.assert_status_ok();

        let body: Value = response.json();
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
        assert_eq!(body["data"][0]["type"], "law-firms");
        assert_eq!(body["meta"]["total"], 2);
        assert_eq!(body["meta"]["pages"], 2);
        assert_eq!(body["meta"]["has_next"], true);
        assert_eq!(body["links"]["next"], "/api/v1/law-firms?page=2&per_page=1");
        assert!(body["links"].get("prev").is_none());
        assert!(body["data"][0]["attributes"].get("lawyers").is_none());
    }

    #[tokio::test]
    async fn test_search_by_text_and_specialization() {
        let server = create_test_server();

        let body: Value = server.get("/api/v1/law-firms?q=kowalski").await.json();
        assert_eq!(body["meta"]["total"], 1);
        assert_eq!(body["data"][0]["attributes"]["name"], "Kancelaria Kowalski & Associates");

        let body: Value = server
            .get("/api/v1/law-firms?specializations=CRIMINAL")
            .await
            .json();
        assert_eq!(body["meta"]["total"], 1);
        assert_eq!(body["data"][0]["attributes"]["name"], "Kancelaria Nowak Legal");
        assert_eq!(body["included"][0]["attributes"]["code"], "CRIMINAL");
    }

    #[tokio::test]
    async fn test_search_rejects_invalid_parameters() {
        let server = create_test_server();
        let response = server.get("/api/v1/law-firms?per_page=500&page=0&sort=nip").await;
        response.assert_status(StatusCode::BAD_REQUEST);

        let body: Value = response.json();
        assert_eq!(body["error"], "Invalid search parameters");
        let fields: Vec<&str> = body["details"]
            .as_array()
            .unwrap()
            .iter()
            .map(|d| d["field"].as_str().unwrap())
            .collect();
        assert_eq!(fields, vec!["page", "per_page", "sort"]);
    }

    #[tokio::test]
    async fn test_get_law_firm_includes_related_records() {
        let server = create_test_server();
        let response = server.get(&format!("/api/v1/law-firms/{KOWALSKI}")).await;
        response.assert_status_ok();

        let body: Value = response.json();
        assert_eq!(body["data"]["id"], KOWALSKI);
        assert_eq!(body["data"]["relationships"]["lawyers"]["data"][0]["type"], "lawyers");
        assert_eq!(body["data"]["relationships"]["specializations"]["data"].as_array().unwrap().len(), 2);
        assert_eq!(body["included"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_get_law_firm_errors() {
        let server = create_test_server();

        let response = server.get("/api/v1/law-firms/not-a-uuid").await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["error"], "Invalid law firm ID format");

        let missing = uuid::Uuid::new_v4();
        let response = server.get(&format!("/api/v1/law-firms/{missing}")).await;
        response.assert_status(StatusCode::NOT_FOUND);
        assert_eq!(
            response.json::<Value>()["error"],
            format!("Law firm with ID {missing} not found")
        );
    }

    #[tokio::test]
    async fn test_create_law_firm() {
        let server = create_test_server();
        let response = server
            .post("/api/v1/law-firms")
            .json(&law_firm_payload("Kancelaria Nowa", "5556667778"))
            .await;
        response.assert_status(StatusCode::CREATED);

        let body: Value = response.json();
        assert_eq!(body["data"]["attributes"]["name"], "Kancelaria Nowa");
        assert_eq!(body["data"]["attributes"]["address"]["country"], "PL");
        assert_eq!(body["data"]["attributes"]["is_active"], true);
        assert!(body["meta"]["created_at"].is_string());
        assert_eq!(body["included"][0]["attributes"]["code"], "CIVIL");

        let body: Value = server.get("/api/v1/law-firms").await.json();
        assert_eq!(body["meta"]["total"], 3);
    }

    #[tokio::test]
    async fn test_create_duplicate_tax_number_conflicts() {
        let server = create_test_server();
        let response = server
            .post("/api/v1/law-firms")
            .json(&law_firm_payload("Kopia", "1234567890"))
            .await;
        response.assert_status(StatusCode::CONFLICT);
        assert_eq!(
            response.json::<Value>()["error"],
            "Law firm with tax number 1234567890 already exists"
        );
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_payloads() {
        let server = create_test_server();

        let mut payload = law_firm_payload("", "12");
        payload["address"]["postal_code"] = json!("80831");
        let response = server.post("/api/v1/law-firms").json(&payload).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["error"], "Validation failed");
        assert_eq!(body["details"].as_array().unwrap().len(), 3);

        let mut payload = law_firm_payload("Kancelaria", "1112223334");
        payload["specialization_ids"] = json!([uuid::Uuid::new_v4()]);
        let response = server.post("/api/v1/law-firms").json(&payload).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["details"][0]["field"], "specialization_ids");

        let response = server.post("/api/v1/law-firms").text("{not json").await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["details"][0]["field"], "body");
    }

    #[tokio::test]
    async fn test_update_law_firm() {
        let server = create_test_server();
        let response = server
            .put(&format!("/api/v1/law-firms/{KOWALSKI}"))
            .json(&json!({ "description": "Nowy opis" }))
            .await;
        response.assert_status_ok();

        let body: Value = response.json();
        assert_eq!(body["data"]["attributes"]["description"], "Nowy opis");
        assert_eq!(body["data"]["attributes"]["name"], "Kancelaria Kowalski & Associates");
        assert!(body["meta"]["updated_at"].is_string());

        let response = server
            .put(&format!("/api/v1/law-firms/{KOWALSKI}"))
            .json(&json!({ "tax_number": "0000000000" }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);

        let response = server
            .put(&format!("/api/v1/law-firms/{}", uuid::Uuid::new_v4()))
            .json(&json!({ "name": "Nikt" }))
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete_twice_is_not_found() {
        let server = create_test_server();
        let path = format!("/api/v1/law-firms/{KOWALSKI}");

        let response = server.delete(&path).await;
        response.assert_status(StatusCode::NO_CONTENT);
        assert!(response.as_bytes().is_empty());

        server.delete(&path).await.assert_status(StatusCode::NOT_FOUND);
        server.get(&path).await.assert_status(StatusCode::NOT_FOUND);

        let body: Value = server.get("/api/v1/law-firms").await.json();
        assert_eq!(body["meta"]["total"], 1);
    }

    #[tokio::test]
    async fn test_lawyers_of_a_firm() {
        let server = create_test_server();
        let path = format!("/api/v1/law-firms/{KOWALSKI}/lawyers");

        let response = server
            .post(&path)
            .json(&json!({ "first_name": "Anna", "last_name": "Nowak", "title": "r.pr." }))
            .await;
        response.assert_status(StatusCode::CREATED);
        assert_eq!(response.json::<Value>()["data"]["type"], "lawyers");

        let body: Value = server.get(&path).await.json();
        assert_eq!(body["meta"]["total"], 2);
        assert_eq!(body["data"][1]["attributes"]["last_name"], "Nowak");

        let response = server.post(&path).json(&json!({ "first_name": "", "last_name": "X" })).await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }
}
