use crate::auth::principal::Principal;
use crate::auth::session::SessionToken;
use crate::error::ProviderError;
use async_trait::async_trait;

/// The hosted auth service that issues and validates sessions.
///
/// Implementations must not retry; a failure is reported once and the caller
/// decides what it means.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Resolve the user behind an access token
    async fn get_user(&self, access_token: &str) -> Result<Principal, ProviderError>;

    /// Trade a refresh token for a fresh session
    async fn refresh_session(&self, refresh_token: &str) -> Result<SessionToken, ProviderError>;

    /// Start a session from an email and password
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<SessionToken, ProviderError>;

    /// Complete an OAuth/PKCE login
    async fn exchange_code_for_session(
        &self,
        auth_code: &str,
        code_verifier: &str,
    ) -> Result<SessionToken, ProviderError>;

    /// Revoke the session behind an access token
    async fn sign_out(&self, access_token: &str) -> Result<(), ProviderError>;
}
