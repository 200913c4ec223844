//! # Application State
//!
//! Shared, read-only resources handed to every handler and middleware. Nothing
//! in here changes per request; session data is always re-read from the
//! caller's cookies and the provider.

use crate::auth::supabase::SupabaseProvider;
use crate::auth::{CookieOptions, SessionClient, SessionProvider};
use crate::config::Config;
use anyhow::Result;
use std::sync::Arc;

/// Shared application state
///
/// Cloned by axum for each request; both fields are cheap pointer clones.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,

    /// Session validation against the hosted provider
    pub sessions: SessionClient,
}

impl AppState {
    /// Build the production state, talking to the configured Supabase project
    pub fn new(config: &Config) -> Result<Self> {
        let provider = SupabaseProvider::new(
            &config.supabase_url,
            &config.supabase_anon_key,
            config.provider_timeout,
        )?;
        Ok(Self::with_provider(config, Arc::new(provider)))
    }

    /// Build state around any session provider
    pub fn with_provider(config: &Config, provider: Arc<dyn SessionProvider>) -> Self {
        let sessions = SessionClient::new(
            provider,
            config.session_cookie_name(),
            CookieOptions::new(config.cookie_secure),
        );
        AppState {
            config: Arc::new(config.clone()),
            sessions,
        }
    }
}
