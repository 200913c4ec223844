//! # Session Client
//!
//! Ties the session provider to the cookie jar: reads the session cookie,
//! validates or refreshes it with the provider, and reports which cookies must
//! change on the way out. Nothing here is cached between requests.

use crate::auth::cookies::{self, CookieChange, CookieOptions, RequestCookies};
use crate::auth::principal::Principal;
use crate::auth::provider::SessionProvider;
use crate::auth::session::{self, SessionToken};
use crate::error::{AppError, AppResult, ProviderError};
use chrono::Utc;
use std::sync::Arc;

/// How the session looked after talking to the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// Access token accepted as-is
    Active,
    /// Access token was stale and the provider issued a new session
    Refreshed,
    /// No session cookie, or one we could not decode
    Missing,
    /// The provider refused the token or the refresh
    Rejected,
    /// The provider could not be asked; treated like no session
    ProviderUnavailable,
}

/// Result of validating the caller's session
#[derive(Debug, Clone)]
pub struct SessionOutcome {
    pub status: SessionStatus,
    pub principal: Option<Principal>,
    /// Cookies to write back: a refreshed session, or removals after a
    /// rejected refresh
    pub cookie_changes: Vec<CookieChange>,
}

impl SessionOutcome {
    fn anonymous(status: SessionStatus) -> Self {
        Self {
            status,
            principal: None,
            cookie_changes: Vec::new(),
        }
    }
}

/// A session freshly issued by a password sign-in
#[derive(Debug, Clone)]
pub struct SignedIn {
    pub principal: Principal,
    pub session: SessionToken,
    pub cookie_changes: Vec<CookieChange>,
}

/// What GoTrue says when the email/password pair does not match
const INVALID_CREDENTIALS: &str = "Invalid login credentials";

#[derive(Clone)]
pub struct SessionClient {
    provider: Arc<dyn SessionProvider>,
    cookie_name: String,
    cookie_options: CookieOptions,
}

impl SessionClient {
    pub fn new(
        provider: Arc<dyn SessionProvider>,
        cookie_name: String,
        cookie_options: CookieOptions,
    ) -> Self {
        Self {
            provider,
            cookie_name,
            cookie_options,
        }
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    pub fn cookie_options(&self) -> &CookieOptions {
        &self.cookie_options
    }

    fn code_verifier_cookie(&self) -> String {
        format!("{}-code-verifier", self.cookie_name)
    }

    /// The session stored in the caller's cookies, if any
    pub fn read_session(&self, cookies: &RequestCookies) -> Option<SessionToken> {
        let raw = cookies.get_chunked(&self.cookie_name)?;
        let session = SessionToken::from_cookie_value(&raw);
        if session.is_none() {
            tracing::debug!(cookie = %self.cookie_name, "ignoring undecodable session cookie");
        }
        session
    }

    /// Validate the caller's session, refreshing it when it is about to expire.
    ///
    /// Never fails: every provider problem resolves to an anonymous outcome.
    pub async fn update_session(&self, cookies: &RequestCookies) -> SessionOutcome {
        let Some(session) = self.read_session(cookies) else {
            return SessionOutcome::anonymous(SessionStatus::Missing);
        };

        let now = Utc::now().timestamp();
        if session.needs_refresh(now) {
            return self.refresh(cookies, &session, now).await;
        }

        match self.provider.get_user(&session.access_token).await {
            Ok(principal) => SessionOutcome {
                status: SessionStatus::Active,
                principal: Some(principal),
                cookie_changes: Vec::new(),
            },
            Err(e) if e.is_rejection() => {
                tracing::debug!("access token rejected: {}", e);
                SessionOutcome::anonymous(SessionStatus::Rejected)
            }
            Err(e) => {
                tracing::warn!("could not validate session: {}", e);
                SessionOutcome::anonymous(SessionStatus::ProviderUnavailable)
            }
        }
    }

    /// The principal behind the caller's cookies, re-resolved from scratch
    pub async fn current_principal(&self, cookies: &RequestCookies) -> Option<Principal> {
        self.update_session(cookies).await.principal
    }

    async fn refresh(
        &self,
        cookies: &RequestCookies,
        session: &SessionToken,
        now: i64,
    ) -> SessionOutcome {
        let refreshed = match self.provider.refresh_session(&session.refresh_token).await {
            Ok(refreshed) => refreshed.with_expiry_from(now),
            Err(e) if e.is_rejection() => {
                tracing::debug!("session refresh rejected, clearing session cookies: {}", e);
                return SessionOutcome {
                    status: SessionStatus::Rejected,
                    principal: None,
                    cookie_changes: self.clear_session(cookies),
                };
            }
            Err(e) => {
                tracing::warn!("could not refresh session: {}", e);
                return SessionOutcome::anonymous(SessionStatus::ProviderUnavailable);
            }
        };

        let principal = match refreshed.user.clone() {
            Some(user) => Some(user),
            None => match self.provider.get_user(&refreshed.access_token).await {
                Ok(user) => Some(user),
                Err(e) => {
                    tracing::warn!("refreshed session has no resolvable user: {}", e);
                    None
                }
            },
        };

        let cookie_changes = match self.store_session(cookies, &refreshed) {
            Ok(changes) => changes,
            Err(e) => {
                tracing::warn!("could not encode refreshed session: {}", e);
                Vec::new()
            }
        };

        SessionOutcome {
            status: SessionStatus::Refreshed,
            principal,
            cookie_changes,
        }
    }

    /// Cookie changes that persist `session` for the caller
    pub fn store_session(
        &self,
        cookies: &RequestCookies,
        session: &SessionToken,
    ) -> Result<Vec<CookieChange>, serde_json::Error> {
        let value = session.to_cookie_value()?;
        Ok(cookies::write_chunked(cookies, &self.cookie_name, &value))
    }

    /// Cookie changes that drop the caller's session
    pub fn clear_session(&self, cookies: &RequestCookies) -> Vec<CookieChange> {
        cookies::remove_chunked(cookies, &self.cookie_name)
    }

    /// Sign in with email and password and persist the new session.
    ///
    /// Wrong credentials are `Unauthorized`; any other refusal (unconfirmed
    /// email, locked account) is a `BadRequest` carrying the provider's reason.
    pub async fn sign_in(
        &self,
        cookies: &RequestCookies,
        email: &str,
        password: &str,
    ) -> AppResult<SignedIn> {
        let session = match self.provider.sign_in_with_password(email, password).await {
            Ok(session) => session.with_expiry_from(Utc::now().timestamp()),
            Err(ProviderError::Rejected { message, .. }) if message.contains(INVALID_CREDENTIALS) => {
                return Err(AppError::Unauthorized("invalid email or password".to_string()));
            }
            Err(ProviderError::Rejected { message, .. }) => return Err(AppError::BadRequest(message)),
            Err(e) => return Err(e.into()),
        };

        let principal = match session.user.clone() {
            Some(user) => user,
            None => self.provider.get_user(&session.access_token).await?,
        };
        let cookie_changes = self
            .store_session(cookies, &session)
            .map_err(|e| AppError::Internal(format!("session encoding failed: {}", e)))?;

        Ok(SignedIn {
            principal,
            session,
            cookie_changes,
        })
    }

    /// Finish an OAuth/PKCE login; returns the cookie changes for the new session
    pub async fn exchange_code(
        &self,
        cookies: &RequestCookies,
        auth_code: &str,
    ) -> AppResult<Vec<CookieChange>> {
        let verifier_cookie = self.code_verifier_cookie();
        let verifier = cookies
            .get(&verifier_cookie)
            .and_then(session::decode_string_cookie)
            .ok_or_else(|| AppError::BadRequest("missing PKCE code verifier".to_string()))?;

        let session = self
            .provider
            .exchange_code_for_session(auth_code, &verifier)
            .await?
            .with_expiry_from(Utc::now().timestamp());

        let mut changes = self
            .store_session(cookies, &session)
            .map_err(|e| AppError::Internal(format!("session encoding failed: {}", e)))?;
        changes.push(CookieChange::Remove {
            name: verifier_cookie,
        });
        Ok(changes)
    }

    /// Revoke the session with the provider (best effort) and clear its cookies
    pub async fn sign_out(&self, cookies: &RequestCookies) -> Vec<CookieChange> {
        if let Some(session) = self.read_session(cookies) {
            if let Err(e) = self.provider.sign_out(&session.access_token).await {
                tracing::warn!("provider sign-out failed, clearing cookies anyway: {}", e);
            }
        }
        self.clear_session(cookies)
    }
}
