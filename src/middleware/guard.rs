//! Route guards for protected page subtrees.
//!
//! The guard resolves the principal itself instead of trusting the edge gate,
//! and answers with a redirect before any child handler runs.

use crate::auth::{Principal, RequestCookies, SessionClient};
use crate::middleware::paths::LOGIN_PATH;
use crate::state::AppState;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

/// A guard's refusal: send the visitor to the login page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginRedirect {
    return_to: Option<String>,
}

impl LoginRedirect {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the login page to send the visitor back to `path` afterwards
    pub fn returning_to(mut self, path: &str) -> Self {
        self.return_to = Some(path.to_string());
        self
    }

    pub fn location(&self) -> String {
        match &self.return_to {
            Some(path) => format!("{}?redirect={}", LOGIN_PATH, urlencoding::encode(path)),
            None => LOGIN_PATH.to_string(),
        }
    }
}

impl IntoResponse for LoginRedirect {
    fn into_response(self) -> Response {
        Redirect::temporary(&self.location()).into_response()
    }
}

/// Resolve the caller's principal or produce the redirect
pub async fn check(sessions: &SessionClient, headers: &HeaderMap) -> Result<Principal, LoginRedirect> {
    let cookies = RequestCookies::from_headers(headers);
    sessions
        .current_principal(&cookies)
        .await
        .ok_or_else(LoginRedirect::new)
}

/// Layer for a protected subtree.
///
/// The principal it resolves is stored in the request extensions for the rest
/// of this request only; [`CurrentUser`] picks it up from there instead of
/// asking the provider again.
pub async fn require_principal(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, LoginRedirect> {
    match check(&state.sessions, request.headers()).await {
        Ok(principal) => {
            request.extensions_mut().insert(principal);
            Ok(next.run(request).await)
        }
        Err(redirect) => {
            tracing::debug!(path = %request.uri().path(), "route guard found no principal");
            Err(redirect)
        }
    }
}

/// Extractor for handlers that need the signed-in user.
///
/// Rejection is a [`LoginRedirect`], so the handler body never runs without a
/// principal. Outside a guarded subtree it resolves the session itself.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Principal);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = LoginRedirect;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if let Some(principal) = parts.extensions.get::<Principal>() {
            return Ok(CurrentUser(principal.clone()));
        }
        check(&state.sessions, &parts.headers).await.map(CurrentUser)
    }
}
