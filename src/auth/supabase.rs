//! # Supabase Auth Provider
//!
//! Talks to the GoTrue API of a hosted Supabase project:
//! - `GET  /auth/v1/user` resolves the user behind a bearer token
//! - `POST /auth/v1/token?grant_type=refresh_token` refreshes a session
//! - `POST /auth/v1/token?grant_type=password` signs in with email and password
//! - `POST /auth/v1/token?grant_type=pkce` completes an OAuth login
//! - `POST /auth/v1/logout?scope=local` revokes the current session
//!
//! Every request carries the project's anon key in the `apikey` header.
//! A 5xx or transport failure is `Unavailable`; any other non-2xx is `Rejected`.

use crate::auth::principal::Principal;
use crate::auth::provider::SessionProvider;
use crate::auth::session::SessionToken;
use crate::error::ProviderError;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::time::Duration;

pub struct SupabaseProvider {
    http: reqwest::Client,
    anon_key: String,
    user_url: Url,
    token_url: Url,
    logout_url: Url,
}

impl SupabaseProvider {
    pub fn new(project_url: &Url, anon_key: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client for the auth provider")?;

        let auth_url = project_url
            .join("auth/v1/")
            .context("invalid Supabase project URL")?;

        Ok(Self {
            http,
            anon_key: anon_key.to_string(),
            user_url: auth_url.join("user")?,
            token_url: auth_url.join("token")?,
            logout_url: auth_url.join("logout")?,
        })
    }

    async fn grant(&self, grant_type: &str, body: Value) -> Result<SessionToken, ProviderError> {
        let response = self
            .http
            .post(self.token_url.clone())
            .query(&[("grant_type", grant_type)])
            .header("apikey", &self.anon_key)
            .json(&body)
            .send()
            .await?;
        read_json(response).await
    }
}

#[async_trait]
impl SessionProvider for SupabaseProvider {
    async fn get_user(&self, access_token: &str) -> Result<Principal, ProviderError> {
        let response = self
            .http
            .get(self.user_url.clone())
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;
        read_json(response).await
    }

    async fn refresh_session(&self, refresh_token: &str) -> Result<SessionToken, ProviderError> {
        self.grant("refresh_token", json!({ "refresh_token": refresh_token }))
            .await
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<SessionToken, ProviderError> {
        self.grant("password", json!({ "email": email, "password": password }))
            .await
    }

    async fn exchange_code_for_session(
        &self,
        auth_code: &str,
        code_verifier: &str,
    ) -> Result<SessionToken, ProviderError> {
        self.grant(
            "pkce",
            json!({ "auth_code": auth_code, "code_verifier": code_verifier }),
        )
        .await
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), ProviderError> {
        let response = self
            .http
            .post(self.logout_url.clone())
            .query(&[("scope", "local")])
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        match response.status() {
            // Already gone counts as signed out
            status if status.is_success() => Ok(()),
            StatusCode::UNAUTHORIZED | StatusCode::NOT_FOUND => Ok(()),
            _ => Err(rejection_or_outage(response).await),
        }
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ProviderError> {
    if !response.status().is_success() {
        return Err(rejection_or_outage(response).await);
    }
    let body = response.bytes().await?;
    Ok(serde_json::from_slice(&body)?)
}

async fn rejection_or_outage(response: Response) -> ProviderError {
    let status = response.status();
    if status.is_server_error() {
        return ProviderError::Unavailable(format!("provider answered {}", status));
    }
    let body = response.text().await.unwrap_or_default();
    ProviderError::Rejected {
        status: status.as_u16(),
        message: error_message(&body),
    }
}

/// GoTrue has used `msg`, `error_description`, `message` and `error` for the
/// human-readable part of an error body over time.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            ["msg", "error_description", "message", "error"]
                .iter()
                .find_map(|key| value.get(*key).and_then(Value::as_str).map(str::to_string))
        })
        .unwrap_or_else(|| body.trim().to_string())
}
