use super::parse_id;
use crate::api::extract::ApiJson;
use crate::api::models::search::{QueryParams, USER_SEARCH, UserListQuery};
use crate::api::models::users::{DeleteResponse, Role, UserCreate, UserStats, UserStatusUpdate, UserUpdate};
use crate::db::errors::DbError;
use crate::db::models::law_firms::LawyerCreateDBRequest;
use crate::db::models::users::{UserCreateDBRequest, UserUpdateDBRequest};
use crate::errors::{Error, ErrorBody, Result};
use crate::jsonapi::{self, Document};
use crate::search;
use crate::types::{UserId, abbrev_uuid};
use crate::AppState;
use axum::{
    Json,
    extract::{Path, RawQuery, State},
    http::StatusCode,
};
use chrono::Utc;

fn user_id(raw: &str) -> Result<UserId> {
    parse_id(raw, "Invalid user ID format")
}

/// Missing rows become a 404 for this user; duplicate emails become a conflict.
fn map_user_error(id: &str) -> impl FnOnce(DbError) -> Error + '_ {
    move |e| match e {
        DbError::NotFound => Error::NotFound {
            resource: "User".to_string(),
            id: id.to_string(),
        },
        DbError::UniqueViolation { .. } => Error::Conflict {
            message: "User with this email already exists".to_string(),
        },
        other => Error::Database(other),
    }
}

#[utoipa::path(
    get,
    path = "/admin/users",
    tag = "admin",
    summary = "List users",
    description = "Newest users first. `meta.stats` counts every user regardless of the filters.",
    params(UserListQuery),
    responses(
        (status = 200, description = "Page of users with statistics", body = Document),
        (status = 500, description = "Internal server error", body = ErrorBody),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_users(State(state): State<AppState>, RawQuery(query): RawQuery) -> Result<Json<Document>> {
    let raw = QueryParams::parse(query.as_deref());
    let params = USER_SEARCH
        .parse(&raw)
        .map_err(|details| Error::validation("Invalid search parameters", details))?;

    let users = state.users.list().await?;
    let stats = UserStats::collect(&users, Utc::now());
    let outcome = search::run(users, &params);

    let template = params.link_template(&USER_SEARCH, state.config.api.path("/admin/users"));
    let document = jsonapi::collection(&outcome.items)?
        .with_pagination(&outcome.meta, &template)?
        .with_meta("stats", stats)?;
    Ok(Json(document))
}

#[utoipa::path(
    post,
    path = "/admin/users",
    tag = "admin",
    summary = "Create user",
    description = "A user created with role `lawyer` and a `law_firm_id` also gets a lawyer record on that firm.",
    request_body = UserCreate,
    responses(
        (status = 201, description = "User created", body = Document),
        (status = 400, description = "Email or role missing, or invalid payload", body = ErrorBody),
        (status = 409, description = "Email already registered", body = ErrorBody),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn create_user(
    State(state): State<AppState>,
    ApiJson(create): ApiJson<UserCreate>,
) -> Result<(StatusCode, Json<Document>)> {
    let email = create.email.as_deref().map(str::trim).filter(|e| !e.is_empty());
    let (Some(email), Some(role)) = (email, create.role) else {
        return Err(Error::BadRequest {
            message: "Email and role are required".to_string(),
        });
    };
    create
        .validate()
        .map_err(|details| Error::validation("Validation failed", details))?;

    let request = UserCreateDBRequest {
        email: email.to_string(),
        full_name: create.full_name.clone(),
        phone: create.phone.clone(),
        role,
        is_active: create.is_active.unwrap_or(true),
        law_firm_id: create.law_firm_id,
    };
    let user = state.users.insert(&request).await.map_err(map_user_error(email))?;
    tracing::info!(user_id = %abbrev_uuid(&user.id), role = %user.role, "created user");

    if let (Role::Lawyer, Some(law_firm_id)) = (role, create.law_firm_id) {
        let (first_name, last_name) = create.lawyer_names();
        let lawyer = LawyerCreateDBRequest::builder()
            .law_firm_id(law_firm_id)
            .user_id(user.id)
            .first_name(first_name)
            .last_name(last_name)
            .email(user.email.clone())
            .maybe_phone(user.phone.clone())
            .build();
        state.law_firms.add_lawyer(&lawyer).await?;
    }

    Ok((StatusCode::CREATED, Json(jsonapi::single(&user)?)))
}

#[utoipa::path(
    get,
    path = "/admin/users/{id}",
    tag = "admin",
    summary = "Get user",
    params(("id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "User", body = Document),
        (status = 400, description = "Malformed ID", body = ErrorBody),
        (status = 404, description = "User not found", body = ErrorBody),
    )
)]
#[tracing::instrument(skip_all, fields(user_id = %id))]
pub async fn get_user(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Document>> {
    let user = state
        .users
        .find(user_id(&id)?)
        .await?
        .ok_or_else(|| map_user_error(&id)(DbError::NotFound))?;
    Ok(Json(jsonapi::single(&user)?))
}

#[utoipa::path(
    put,
    path = "/admin/users/{id}",
    tag = "admin",
    summary = "Update user",
    params(("id" = String, Path, description = "User ID")),
    request_body = UserUpdate,
    responses(
        (status = 200, description = "User updated", body = Document),
        (status = 400, description = "Invalid payload or malformed ID", body = ErrorBody),
        (status = 404, description = "User not found", body = ErrorBody),
        (status = 409, description = "Email already registered", body = ErrorBody),
    )
)]
#[tracing::instrument(skip_all, fields(user_id = %id))]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(update): ApiJson<UserUpdate>,
) -> Result<Json<Document>> {
    let user_id = user_id(&id)?;
    update
        .validate()
        .map_err(|details| Error::validation("Validation failed", details))?;

    let user = state
        .users
        .update(user_id, &UserUpdateDBRequest::from(update))
        .await
        .map_err(map_user_error(&id))?;
    Ok(Json(jsonapi::single(&user)?))
}

#[utoipa::path(
    patch,
    path = "/admin/users/{id}/status",
    tag = "admin",
    summary = "Activate or deactivate user",
    params(("id" = String, Path, description = "User ID")),
    request_body = UserStatusUpdate,
    responses(
        (status = 200, description = "User updated", body = Document),
        (status = 404, description = "User not found", body = ErrorBody),
    )
)]
#[tracing::instrument(skip_all, fields(user_id = %id))]
pub async fn update_user_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(status): ApiJson<UserStatusUpdate>,
) -> Result<Json<Document>> {
    let user = state
        .users
        .set_active(user_id(&id)?, status.is_active)
        .await
        .map_err(map_user_error(&id))?;
    Ok(Json(jsonapi::single(&user)?))
}

#[utoipa::path(
    delete,
    path = "/admin/users/{id}",
    tag = "admin",
    summary = "Deactivate user",
    params(("id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "User deactivated", body = DeleteResponse),
        (status = 404, description = "User not found", body = ErrorBody),
    )
)]
#[tracing::instrument(skip_all, fields(user_id = %id))]
pub async fn delete_user(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<DeleteResponse>> {
    state
        .users
        .set_active(user_id(&id)?, false)
        .await
        .map_err(map_user_error(&id))?;
    Ok(Json(DeleteResponse { success: true }))
}

#[cfg(test)]
mod tests {
    use crate::test_utils::create_test_server;
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    const ADMIN: &str = "550e8400-e29b-41d4-a716-446655440100";
    const KOWALSKI: &str = "550e8400-e29b-41d4-a716-446655440000";

    fn emails(body: &Value) -> Vec<&str> {
        body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|u| u["attributes"]["email"].as_str().unwrap())
            .collect()
    }

    #[tokio::test]
    #[test_log::test]
    async fn test_list_newest_first_with_stats() {
        let server = create_test_server();
        let response = server.get("/api/v1/admin/users").await;
        response.assert_status_ok();

        let body: Value = response.json();
        assert_eq!(emails(&body), vec!["j.kowalski@kowalski-law.pl", "admin@kancelariax.pl"]);
        assert_eq!(body["meta"]["per_page"], 50);
        assert_eq!(body["meta"]["stats"]["total"], 2);
        assert_eq!(body["meta"]["stats"]["admins"], 1);
        assert_eq!(body["meta"]["stats"]["lawyers"], 1);
        assert_eq!(
            body["data"][0]["relationships"]["law_firm"]["data"],
            json!({ "type": "law-firms", "id": KOWALSKI })
        );
        assert_eq!(body["data"][1]["relationships"]["law_firm"]["data"], Value::Null);
    }

    #[tokio::test]
    async fn test_list_filters_are_lenient() {
        let server = create_test_server();

        let body: Value = server.get("/api/v1/admin/users?role=admin&status=all").await.json();
        assert_eq!(emails(&body), vec!["admin@kancelariax.pl"]);
        // Stats ignore the filters
        assert_eq!(body["meta"]["stats"]["total"], 2);

        let response = server.get("/api/v1/admin/users?limit=1000&page=-3&search=KOWALSKI").await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["meta"]["per_page"], 100);
        assert_eq!(body["meta"]["page"], 1);
        assert_eq!(emails(&body), vec!["j.kowalski@kowalski-law.pl"]);
    }

    #[tokio::test]
    async fn test_create_lawyer_user_adds_lawyer_record() {
        let server = create_test_server();
        let response = server
            .post("/api/v1/admin/users")
            .json(&json!({
                "email": "a.nowak@kowalski-law.pl",
                "full_name": "Anna Nowak",
                "role": "lawyer",
                "law_firm_id": KOWALSKI,
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let body: Value = response.json();
        assert_eq!(body["data"]["type"], "users");
        assert_eq!(body["data"]["attributes"]["is_active"], true);

        let lawyers: Value = server
            .get(&format!("/api/v1/law-firms/{KOWALSKI}/lawyers"))
            .await
            .json();
        assert_eq!(lawyers["meta"]["total"], 2);
        assert_eq!(lawyers["data"][1]["attributes"]["first_name"], "Anna");
        assert_eq!(lawyers["data"][1]["attributes"]["last_name"], "Nowak");
    }

    #[tokio::test]
    async fn test_create_user_errors() {
        let server = create_test_server();

        let response = server.post("/api/v1/admin/users").json(&json!({ "email": "x@y.pl" })).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["error"], "Email and role are required");

        let response = server
            .post("/api/v1/admin/users")
            .json(&json!({ "email": "admin@kancelariax.pl", "role": "client" }))
            .await;
        response.assert_status(StatusCode::CONFLICT);
        assert_eq!(response.json::<Value>()["error"], "User with this email already exists");

        let response = server
            .post("/api/v1/admin/users")
            .json(&json!({ "email": "x@y.pl", "role": "superuser" }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_get_update_and_deactivate() {
        let server = create_test_server();
        let path = format!("/api/v1/admin/users/{ADMIN}");

        let body: Value = server.get(&path).await.json();
        assert_eq!(body["data"]["attributes"]["role"], "admin");

        let body: Value = server
            .put(&path)
            .json(&json!({ "full_name": "Główny Administrator" }))
            .await
            .json();
        assert_eq!(body["data"]["attributes"]["full_name"], "Główny Administrator");

        let body: Value = server
            .patch(&format!("{path}/status"))
            .json(&json!({ "is_active": false }))
            .await
            .json();
        assert_eq!(body["data"]["attributes"]["is_active"], false);

        let response = server.delete(&path).await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>(), json!({ "success": true }));

        let body: Value = server.get("/api/v1/admin/users?status=inactive").await.json();
        assert_eq!(emails(&body), vec!["admin@kancelariax.pl"]);
    }

    #[tokio::test]
    async fn test_unknown_and_malformed_ids() {
        let server = create_test_server();
        let response = server.get("/api/v1/admin/users/123").await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["error"], "Invalid user ID format");

        let missing = uuid::Uuid::new_v4();
        server
            .delete(&format!("/api/v1/admin/users/{missing}"))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}
