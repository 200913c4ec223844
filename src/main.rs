//! # Choir Portal Server
//!
//! Serves the choir attendance portal behind a session-validation gate.
//! Sessions are issued by a Supabase auth project and live in cookies; every
//! page request is checked against the provider before it is rendered.
//!
//! ## Layers
//! - **Edge gate**: validates or refreshes the session on every non-asset
//!   request and redirects by path class
//! - **Route guards**: protected subtrees re-check the session on their own

mod auth;        // Session provider, cookies, session client
mod config;      // Environment configuration
mod error;       // Error types and HTTP mapping
mod handlers;    // Pages, OAuth callback, session endpoints
mod middleware;  // Edge gate, route guard, path rules
mod routes;      // Router assembly
mod state;       // Shared application state

use crate::config::Config;
use crate::state::AppState;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG overrides the default filter
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,choir_portal=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    tracing::info!(supabase_url = %config.supabase_url, "Configuration loaded");

    let app_state = AppState::new(&config)?;
    tracing::info!(
        cookie = %app_state.sessions.cookie_name(),
        "Application state initialized"
    );

    let app = routes::build_router(app_state);

    let bind_addr = config.bind_address();
    tracing::info!("Starting server on {}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
