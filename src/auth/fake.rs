//! In-memory session provider for tests.

use crate::auth::principal::Principal;
use crate::auth::provider::SessionProvider;
use crate::auth::session::SessionToken;
use crate::error::ProviderError;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

#[derive(Default)]
pub struct FakeProvider {
    users: Mutex<HashMap<String, Principal>>,
    refreshes: Mutex<HashMap<String, SessionToken>>,
    codes: Mutex<HashMap<(String, String), SessionToken>>,
    passwords: Mutex<HashMap<(String, String), SessionToken>>,
    offline: AtomicBool,
    pub get_user_calls: AtomicU64,
    pub refresh_calls: AtomicU64,
    pub exchange_calls: AtomicU64,
    pub sign_in_calls: AtomicU64,
    pub sign_out_calls: AtomicU64,
}

impl FakeProvider {
    pub fn add_user(&self, access_token: &str, principal: Principal) {
        self.users
            .lock()
            .expect("users lock")
            .insert(access_token.to_string(), principal);
    }

    pub fn add_refresh(&self, refresh_token: &str, issued: SessionToken) {
        self.refreshes
            .lock()
            .expect("refresh lock")
            .insert(refresh_token.to_string(), issued);
    }

    pub fn add_code(&self, code: &str, verifier: &str, issued: SessionToken) {
        self.codes
            .lock()
            .expect("codes lock")
            .insert((code.to_string(), verifier.to_string()), issued);
    }

    pub fn add_password(&self, email: &str, password: &str, issued: SessionToken) {
        self.passwords
            .lock()
            .expect("passwords lock")
            .insert((email.to_string(), password.to_string()), issued);
    }

    pub fn go_offline(&self) {
        self.offline.store(true, Ordering::SeqCst);
    }

    /// Total provider calls of any kind
    pub fn calls(&self) -> u64 {
        self.get_user_calls.load(Ordering::SeqCst)
            + self.refresh_calls.load(Ordering::SeqCst)
            + self.exchange_calls.load(Ordering::SeqCst)
            + self.sign_in_calls.load(Ordering::SeqCst)
            + self.sign_out_calls.load(Ordering::SeqCst)
    }

    fn check_online(&self) -> Result<(), ProviderError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(ProviderError::Unavailable("connection refused".to_string()));
        }
        Ok(())
    }
}

fn rejected(status: u16, message: &str) -> ProviderError {
    ProviderError::Rejected {
        status,
        message: message.to_string(),
    }
}

#[async_trait]
impl SessionProvider for FakeProvider {
    async fn get_user(&self, access_token: &str) -> Result<Principal, ProviderError> {
        self.get_user_calls.fetch_add(1, Ordering::SeqCst);
        self.check_online()?;
        self.users
            .lock()
            .expect("users lock")
            .get(access_token)
            .cloned()
            .ok_or_else(|| rejected(401, "invalid JWT"))
    }

    async fn refresh_session(&self, refresh_token: &str) -> Result<SessionToken, ProviderError> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        self.check_online()?;
        self.refreshes
            .lock()
            .expect("refresh lock")
            .get(refresh_token)
            .cloned()
            .ok_or_else(|| rejected(400, "Invalid Refresh Token"))
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<SessionToken, ProviderError> {
        self.sign_in_calls.fetch_add(1, Ordering::SeqCst);
        self.check_online()?;
        if email.contains("unconfirmed") {
            return Err(rejected(400, "Email not confirmed"));
        }
        self.passwords
            .lock()
            .expect("passwords lock")
            .get(&(email.to_string(), password.to_string()))
            .cloned()
            .ok_or_else(|| rejected(400, "Invalid login credentials"))
    }

    async fn exchange_code_for_session(
        &self,
        auth_code: &str,
        code_verifier: &str,
    ) -> Result<SessionToken, ProviderError> {
        self.exchange_calls.fetch_add(1, Ordering::SeqCst);
        self.check_online()?;
        self.codes
            .lock()
            .expect("codes lock")
            .get(&(auth_code.to_string(), code_verifier.to_string()))
            .cloned()
            .ok_or_else(|| rejected(400, "invalid flow state"))
    }

    async fn sign_out(&self, _access_token: &str) -> Result<(), ProviderError> {
        self.sign_out_calls.fetch_add(1, Ordering::SeqCst);
        self.check_online()
    }
}

pub fn principal(n: u128) -> Principal {
    Principal {
        id: Uuid::from_u128(n),
        email: Some(format!("member{}@example.org", n)),
        role: Some("authenticated".to_string()),
        aud: Some("authenticated".to_string()),
    }
}

/// A session whose access token is good for another hour
pub fn live_session(access_token: &str, refresh_token: &str) -> SessionToken {
    stored_session(access_token, refresh_token, Utc::now().timestamp() + 3600)
}

/// A session whose access token lapsed a minute ago
pub fn expired_session(access_token: &str, refresh_token: &str) -> SessionToken {
    stored_session(access_token, refresh_token, Utc::now().timestamp() - 60)
}

/// What the provider hands back from a refresh or code exchange
pub fn issued_session(access_token: &str, refresh_token: &str, user: Option<Principal>) -> SessionToken {
    SessionToken {
        access_token: access_token.to_string(),
        refresh_token: refresh_token.to_string(),
        token_type: Some("bearer".to_string()),
        expires_in: Some(3600),
        expires_at: None,
        user,
    }
}

fn stored_session(access_token: &str, refresh_token: &str, expires_at: i64) -> SessionToken {
    SessionToken {
        access_token: access_token.to_string(),
        refresh_token: refresh_token.to_string(),
        token_type: Some("bearer".to_string()),
        expires_in: Some(3600),
        expires_at: Some(expires_at),
        user: None,
    }
}
