//! # kancelariax: law firm directory service
//!
//! `kancelariax` is the data service behind an online legal-services portal. It exposes a
//! directory of law firms with free-text search, filtering, sorting and pagination, the
//! specialization catalogue, and an admin user list, all as JSON:API documents. A typed HTTP
//! client with stateful "data hooks" for front-end code lives in [`client`].
//!
//! ## Architecture
//!
//! The server is built on [Axum](https://github.com/tokio-rs/axum). Handlers depend only on the
//! repository traits in [`db::handlers`], so the same router runs against the in-memory store
//! (development, tests) or PostgreSQL (production).
//!
//! A list request flows through four stages:
//!
//! 1. [`api::models::search`] validates the raw query string against a per-resource schema
//! 2. the repository returns a snapshot of candidate records
//! 3. [`search`] filters, sorts and paginates that snapshot
//! 4. [`jsonapi`] turns the page into a document with `included`, `meta` and `links`
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use kancelariax::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = kancelariax::config::Args::parse();
//!     let config = Config::load(&args)?;
//!     kancelariax::telemetry::init_telemetry(config.enable_otel_export, config.log_format)?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await
//! }
//! ```
//!
//! ## Configuration
//!
//! See the [`config`] module for configuration options.

pub mod api;
pub mod client;
pub mod config;
pub mod db;
pub mod errors;
pub mod jsonapi;
mod openapi;
pub mod search;
pub mod telemetry;
pub mod types;

#[cfg(test)]
pub mod test_utils;

use crate::api::handlers::{dashboard, law_firms, specializations, users};
use crate::config::{CorsOrigin, DatabaseConfig, PoolSettings};
use crate::db::handlers::{InMemoryStore, LawFirmRepository, PgStore, SpecializationRepository, UserRepository};
use crate::openapi::ApiDoc;
use axum::http::HeaderValue;
use axum::{
    Json, Router, http,
    routing::{get, patch},
};
use bon::Builder;
pub use config::Config;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info, instrument};
use utoipa::OpenApi;

pub use types::{LawFirmId, LawyerId, ResourceType, SpecializationId, UserId};

/// Application state shared across all request handlers.
///
/// ```ignore
/// let state = AppState::builder()
///     .law_firms(store.clone())
///     .specializations(store.clone())
///     .users(store)
///     .config(config)
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub law_firms: Arc<dyn LawFirmRepository>,
    pub specializations: Arc<dyn SpecializationRepository>,
    pub users: Arc<dyn UserRepository>,
    pub config: Config,
}

impl AppState {
    /// State whose repositories are all backed by one store.
    pub fn from_store<S>(store: S, config: Config) -> Self
    where
        S: LawFirmRepository + SpecializationRepository + UserRepository + 'static,
    {
        let store = Arc::new(store);
        Self::builder()
            .law_firms(store.clone())
            .specializations(store.clone())
            .users(store)
            .config(config)
            .build()
    }
}

/// Get the database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

fn pool_options(settings: &PoolSettings) -> PgPoolOptions {
    let seconds = |secs: u64| (secs > 0).then(|| Duration::from_secs(secs));
    PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .acquire_timeout(Duration::from_secs(settings.acquire_timeout_secs))
        .idle_timeout(seconds(settings.idle_timeout_secs))
        .max_lifetime(seconds(settings.max_lifetime_secs))
}

/// Build the repositories described by the configuration.
///
/// For an external database this connects, runs migrations, and returns the pool so it can be
/// closed on shutdown.
#[instrument(skip_all)]
async fn setup_state(config: &Config) -> anyhow::Result<(AppState, Option<PgPool>)> {
    match &config.database {
        DatabaseConfig::Memory { seed } => {
            info!(seed, "Using in-memory store; data will not survive a restart");
            let store = if *seed { InMemoryStore::seeded() } else { InMemoryStore::new() };
            Ok((AppState::from_store(store, config.clone()), None))
        }
        DatabaseConfig::External { url, pool } => {
            info!("Connecting to external database");
            let pool = pool_options(pool).connect(url).await?;
            migrator().run(&pool).await?;
            let state = AppState::from_store(PgStore::new(pool.clone()), config.clone());
            Ok((state, Some(pool)))
        }
    }
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    // A wildcard anywhere in the list allows every origin
    let allow_origin = if config.cors.allowed_origins.contains(&CorsOrigin::Wildcard) {
        AllowOrigin::any()
    } else {
        let mut origins = Vec::new();
        for origin in &config.cors.allowed_origins {
            if let CorsOrigin::Url(url) = origin {
                origins.push(url.as_str().trim_end_matches('/').parse::<HeaderValue>()?);
            }
        }
        AllowOrigin::list(origins)
    };

    let mut cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            http::Method::GET,
            http::Method::POST,
            http::Method::PUT,
            http::Method::PATCH,
            http::Method::DELETE,
        ])
        .allow_headers([http::header::CONTENT_TYPE, http::header::ACCEPT, http::header::AUTHORIZATION])
        .allow_credentials(config.cors.allow_credentials)
        .expose_headers(vec![http::header::LOCATION]);

    if let Some(max_age) = config.cors.max_age {
        cors = cors.max_age(Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Build the application router: API routes under the configured base path, health check,
/// OpenAPI document, CORS and request tracing.
#[instrument(skip_all)]
pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    let api_routes = Router::new()
        // Law firm directory
        .route(
            "/law-firms",
            get(law_firms::search_law_firms).post(law_firms::create_law_firm),
        )
        .route(
            "/law-firms/{id}",
            get(law_firms::get_law_firm)
                .put(law_firms::update_law_firm)
                .delete(law_firms::delete_law_firm),
        )
        .route(
            "/law-firms/{id}/lawyers",
            get(law_firms::list_lawyers).post(law_firms::create_lawyer),
        )
        // Specialization catalogue
        .route(
            "/specializations",
            get(specializations::list_specializations).post(specializations::create_specialization),
        )
        // User administration
        .route("/admin/users", get(users::list_users).post(users::create_user))
        .route(
            "/admin/users/{id}",
            get(users::get_user).put(users::update_user).delete(users::delete_user),
        )
        .route("/admin/users/{id}/status", patch(users::update_user_status))
        .route("/admin/dashboard/stats", get(dashboard::dashboard_stats))
        .with_state(state.clone());

    let base_path = state.config.api.base_path.trim_end_matches('/').to_string();
    let mut api_doc = ApiDoc::openapi();
    api_doc.servers = Some(vec![utoipa::openapi::Server::new(if base_path.is_empty() {
        "/"
    } else {
        base_path.as_str()
    })]);

    let router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .route("/api-docs/openapi.json", get(move || async move { Json(api_doc) }));

    let router = if base_path.is_empty() {
        router.merge(api_routes)
    } else {
        router.nest(&base_path, api_routes)
    };

    let router = router.layer(create_cors_layer(&state.config)?).layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    Ok(router)
}

/// The HTTP server and the resources it owns.
///
/// 1. **Create**: [`Application::new`] builds the repositories (connecting and migrating an
///    external database if configured) and the router
/// 2. **Serve**: [`Application::serve`] binds to a TCP port and handles requests
/// 3. **Shutdown**: when the shutdown future resolves, in-flight requests finish, the pool is
///    closed and pending spans are flushed
pub struct Application {
    router: Router,
    config: Config,
    pool: Option<PgPool>,
}

impl Application {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        debug!("Starting directory service with configuration: {:#?}", config);

        let (state, pool) = setup_state(&config).await?;
        let router = build_router(state)?;

        Ok(Self { router, config, pool })
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "Directory service listening on http://{}, API at {}",
            bind_addr,
            self.config.api.path("/law-firms")
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        if let Some(pool) = self.pool {
            info!("Closing database connections...");
            pool.close().await;
        }

        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::create_test_config;
    use axum::http::StatusCode;
    use serde_json::Value;

    #[tokio::test]
    async fn test_health_and_openapi() {
        let server = Application::new(create_test_config()).await.unwrap().into_test_server();

        let response = server.get("/healthz").await;
        response.assert_status_ok();
        response.assert_text("OK");

        let doc: Value = server.get("/api-docs/openapi.json").await.json();
        assert_eq!(doc["servers"][0]["url"], "/api/v1");
        assert!(doc["paths"]["/law-firms"].is_object());
    }

    #[tokio::test]
    async fn test_custom_base_path() {
        let mut config = create_test_config();
        config.api.base_path = "/v2/".to_string();
        let server = Application::new(config).await.unwrap().into_test_server();

        let body: Value = server.get("/v2/law-firms?per_page=1").await.json();
        assert_eq!(body["links"]["next"], "/v2/law-firms?page=2&per_page=1");
        server.get("/api/v1/law-firms").await.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_cors_preflight() {
        let server = Application::new(create_test_config()).await.unwrap().into_test_server();
        let response = server
            .method(http::Method::OPTIONS, "/api/v1/law-firms")
            .add_header(http::header::ORIGIN, HeaderValue::from_static("https://kancelariax.pl"))
            .add_header(
                http::header::ACCESS_CONTROL_REQUEST_METHOD,
                HeaderValue::from_static("POST"),
            )
            .await;
        response.assert_status_ok();
        assert_eq!(response.header(http::header::ACCESS_CONTROL_ALLOW_ORIGIN), "*");
    }
}
