use crate::api::models::dashboard::{DashboardStats, LawFirmStats};
use crate::api::models::users::UserStats;
use crate::errors::{ErrorBody, Result};
use crate::AppState;
use axum::{Json, extract::State};
use chrono::Utc;

#[utoipa::path(
    get,
    path = "/admin/dashboard/stats",
    tag = "admin",
    summary = "Dashboard statistics",
    description = "User and firm counts. Firm counts include soft-deleted firms.",
    responses(
        (status = 200, description = "Dashboard statistics", body = DashboardStats),
        (status = 500, description = "Internal server error", body = ErrorBody),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn dashboard_stats(State(state): State<AppState>) -> Result<Json<DashboardStats>> {
    let now = Utc::now();
    let users = state.users.list().await?;
    let firms = state.law_firms.list_all().await?;

    Ok(Json(DashboardStats {
        users: UserStats::collect(&users, now),
        law_firms: LawFirmStats::collect(&firms, now),
    }))
}
