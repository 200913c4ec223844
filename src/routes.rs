//! # Router
//!
//! Every request passes the edge gate first. Protected page subtrees carry
//! their own route guard on top of that.

use crate::handlers::{auth, health::health_check, legacy, pages};
use crate::middleware::{gate, guard};
use crate::state::AppState;
use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use std::path::PathBuf;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

/// Wrap a protected subtree in a route guard
fn guarded(state: &AppState, subtree: Router<AppState>) -> Router<AppState> {
    subtree.route_layer(from_fn_with_state(state.clone(), guard::require_principal))
}

pub fn build_router(state: AppState) -> Router {
    let static_dir = PathBuf::from(&state.config.static_dir);

    let dashboard = Router::new().route("/dashboard", get(pages::dashboard));

    let attendances = Router::new()
        .route("/attendances", get(|| async { pages::page("attendances") }))
        .route("/attendances/new", get(|| async { pages::page("attendances/new") }))
        .route("/attendances/bulk", get(pages::bulk_attendance));

    let management = Router::new()
        .route("/management", get(|| async { pages::page("management") }))
        .route("/management/members", get(|| async { pages::page("management/members") }))
        .route("/management/members/new", get(|| async { pages::page("management/members/new") }))
        .route("/management/members/{id}", get(pages::member_detail))
        .route("/management/members/{id}/edit", get(pages::member_edit))
        .route("/management/statistics", get(|| async { pages::page("management/statistics") }));

    let arrangements = Router::new().route("/arrangements", get(|| async { pages::page("arrangements") }));

    Router::new()
        .route("/", get(pages::home))
        .route("/health", get(health_check))
        .route("/login", get(|| async { pages::page("login") }))
        .route("/signup", get(|| async { pages::page("signup") }))
        // Auth flow
        .route("/api/auth/login", post(auth::login))
        .route("/auth/callback", get(auth::callback))
        .route("/api/auth/me", get(auth::me))
        .route("/api/auth/session", get(auth::session_info))
        .route("/api/auth/logout", post(auth::logout))
        // Old URLs
        .route("/members", get(legacy::legacy_redirect))
        .route("/members/{*rest}", get(legacy::legacy_redirect))
        // Guarded subtrees
        .merge(guarded(&state, dashboard))
        .merge(guarded(&state, attendances))
        .merge(guarded(&state, management))
        .merge(guarded(&state, arrangements))
        // Build assets, favicon, and public images
        .nest_service("/_next/static", ServeDir::new(static_dir.join("_next").join("static")))
        .route_service("/favicon.ico", ServeFile::new(static_dir.join("favicon.ico")))
        .fallback_service(ServeDir::new(&static_dir))
        .layer(from_fn_with_state(state.clone(), gate::update_session))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
