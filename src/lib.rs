//! Backend for a digital-forensics case management platform: investigation
//! cases, evidence with chain-of-custody tracking, event timelines, dashboard
//! analytics and per-user notifications behind a JWT-protected JSON API.

#![forbid(unsafe_code)]

pub mod analytics;
pub mod auth;
pub mod config;
pub mod errors;
pub mod extract;
pub mod handlers;
pub mod models;
pub mod notifications;
pub mod repository;
pub mod validation;

use std::sync::Arc;
use std::time::Instant;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::auth::{auth_middleware, JwtService};
use crate::notifications::NotificationStore;
use crate::repository::Database;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub jwt: Arc<JwtService>,
    pub notifications: Arc<dyn NotificationStore>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(db: Database, jwt: JwtService, notifications: Arc<dyn NotificationStore>) -> Self {
        Self {
            db,
            jwt: Arc::new(jwt),
            notifications,
            started_at: Instant::now(),
        }
    }
}

/// Builds the full application router. Everything lives under `/api`;
/// registration, login and the health probe are the only unauthenticated
/// routes.
pub fn app(state: AppState) -> Router {
    let protected = Router::new()
        .route("/cases", post(handlers::cases::create).get(handlers::cases::list))
        .route(
            "/cases/:id",
            get(handlers::cases::get)
                .put(handlers::cases::update)
                .delete(handlers::cases::delete),
        )
        .route(
            "/evidence",
            post(handlers::evidence::create).get(handlers::evidence::list),
        )
        .route(
            "/evidence/:id",
            get(handlers::evidence::get).delete(handlers::evidence::delete),
        )
        .route(
            "/timeline",
            post(handlers::timeline::create).get(handlers::timeline::list),
        )
        .route(
            "/timeline/:id",
            get(handlers::timeline::get).delete(handlers::timeline::delete),
        )
        .route("/analytics/dashboard", get(handlers::analytics::dashboard))
        .route("/analytics/time-series", get(handlers::analytics::time_series))
        .route(
            "/analytics/severity-distribution",
            get(handlers::analytics::severity_distribution),
        )
        .route(
            "/analytics/source-distribution",
            get(handlers::analytics::source_distribution),
        )
        .route("/notifications", get(handlers::notifications::list))
        .route("/notifications/read-all", put(handlers::notifications::mark_all_read))
        .route("/notifications/:id/read", put(handlers::notifications::mark_read))
        .route("/notifications/:id", delete(handlers::notifications::delete))
        .route("/users", get(handlers::users::list))
        .route(
            "/users/me",
            get(handlers::users::me).put(handlers::users::update_profile),
        )
        .route("/users/me/password", put(handlers::users::change_password))
        .route_layer(middleware::from_fn_with_state(state.jwt.clone(), auth_middleware));

    let api = Router::new()
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        .route("/health", get(handlers::health::health))
        .merge(protected);

    Router::new()
        .nest("/api", api)
        .layer(middleware::from_fn(errors::error_envelope))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .with_state(state)
}
