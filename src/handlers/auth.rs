//! # Authentication Handlers
//!
//! Endpoints that create, inspect, and end sessions. The session itself always
//! lives in the provider-issued cookie; these handlers only decide which
//! cookie changes go out with the response.
//!
//! ## Routes
//! - `POST /api/auth/login`: email/password sign-in
//! - `GET  /auth/callback`: OAuth/PKCE landing route
//! - `GET  /api/auth/me`: the signed-in user, 401 otherwise
//! - `GET  /api/auth/session`: whether the caller is signed in
//! - `POST /api/auth/logout`: revoke and clear the session

use crate::auth::{CookieChange, RequestCookies};
use crate::error::{AppError, AppResult};
use crate::middleware::paths::{DASHBOARD_PATH, LOGIN_PATH};
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    http::{HeaderMap, HeaderValue},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub next: Option<String>,
}

/// Sign-in form. Both fields are optional here so a missing one is reported
/// as a 400 with our own error body.
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

// Password sign-in

/// Sign in with email and password
///
/// ## Route
/// POST /api/auth/login
///
/// ## Responses
/// - 200 with `{user, session, message}` and the session cookies
/// - 400 when a field is missing or the provider refuses for another reason
/// - 401 when the credentials do not match
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<LoginRequest>,
) -> AppResult<Response> {
    let email = request.email.as_deref().map(str::trim).unwrap_or_default();
    let password = request.password.as_deref().unwrap_or_default();
    if email.is_empty() || password.is_empty() {
        return Err(AppError::BadRequest("email and password are required".to_string()));
    }

    let cookies = RequestCookies::from_headers(&headers);
    let signed_in = state.sessions.sign_in(&cookies, email, password).await?;
    tracing::info!(user_id = %signed_in.principal.id, "password sign-in");

    let mut response = Json(json!({
        "user": signed_in.principal,
        "session": signed_in.session,
        "message": "Logged in successfully"
    }))
    .into_response();
    state
        .sessions
        .cookie_options()
        .append_to(response.headers_mut(), &signed_in.cookie_changes);
    Ok(response)
}

// OAuth callback

/// Landing route after the provider's OAuth login.
///
/// Exchanges the authorization code for a session and sends the visitor on to
/// `next`. Without a code, an existing session is honoured; otherwise the
/// visitor goes back to the login page with a reason.
pub async fn callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
    headers: HeaderMap,
) -> Response {
    let next = safe_next(params.next.as_deref());
    let cookies = RequestCookies::from_headers(&headers);

    if let Some(code) = params.code.as_deref().filter(|c| !c.is_empty()) {
        return match state.sessions.exchange_code(&cookies, code).await {
            Ok(changes) => redirect_with_cookies(&state, &next, &changes),
            Err(e) => {
                tracing::error!("OAuth code exchange failed: {}", e);
                login_with_error("oauth_failed")
            }
        };
    }

    tracing::warn!("OAuth callback without code, checking for an existing session");
    let outcome = state.sessions.update_session(&cookies).await;
    match outcome.principal {
        Some(user) => {
            tracing::info!(user_id = %user.id, "existing session found on callback");
            redirect_with_cookies(&state, &next, &outcome.cookie_changes)
        }
        None => login_with_error("session_required"),
    }
}

/// Only same-site absolute paths that fit in a `Location` header are
/// acceptable redirect targets
fn safe_next(next: Option<&str>) -> String {
    match next {
        Some(path)
            if path.starts_with('/')
                && !path.starts_with("//")
                && !path.contains('\\')
                && HeaderValue::from_str(path).is_ok() =>
        {
            path.to_string()
        }
        _ => DASHBOARD_PATH.to_string(),
    }
}

fn login_with_error(reason: &str) -> Response {
    Redirect::temporary(&format!("{}?error={}", LOGIN_PATH, reason)).into_response()
}

fn redirect_with_cookies(state: &AppState, to: &str, changes: &[CookieChange]) -> Response {
    let mut response = Redirect::temporary(to).into_response();
    state
        .sessions
        .cookie_options()
        .append_to(response.headers_mut(), changes);
    response
}

// Session endpoints

/// GET /api/auth/me
pub async fn me(State(state): State<AppState>, headers: HeaderMap) -> AppResult<Json<Value>> {
    let cookies = RequestCookies::from_headers(&headers);
    let user = state
        .sessions
        .current_principal(&cookies)
        .await
        .ok_or_else(|| AppError::Unauthorized("not signed in".to_string()))?;
    Ok(Json(json!({ "user": user })))
}

pub async fn session_info(State(state): State<AppState>, headers: HeaderMap) -> Json<Value> {
    let cookies = RequestCookies::from_headers(&headers);
    match state.sessions.current_principal(&cookies).await {
        Some(user) => Json(json!({
            "authenticated": true,
            "user_id": user.id,
            "email": user.email,
        })),
        None => Json(json!({
            "authenticated": false
        })),
    }
}

/// End the caller's session
///
/// ## Route
/// POST /api/auth/logout
///
/// Answers 401 when there is no session cookie to end. A provider that cannot
/// be reached does not stop the cookies from being cleared.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> AppResult<Response> {
    let cookies = RequestCookies::from_headers(&headers);
    if state.sessions.read_session(&cookies).is_none() {
        return Err(AppError::Unauthorized("not signed in".to_string()));
    }
    let changes = state.sessions.sign_out(&cookies).await;

    let mut response = Json(json!({
        "success": true,
        "message": "Logged out successfully"
    }))
    .into_response();
    state
        .sessions
        .cookie_options()
        .append_to(response.headers_mut(), &changes);
    Ok(response)
}
