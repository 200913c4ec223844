//! # Edge Gate
//!
//! The first thing every request meets, before routing. It answers one
//! question per request: may this visitor see this path right now?
//!
//! ## Flow
//! 1. Build assets, the favicon, and images pass straight through. No cookie is
//!    read and the provider is never called.
//! 2. Everything else has its session validated by the [`SessionClient`],
//!    which refreshes a token that is about to expire.
//! 3. The path class and the outcome decide: protected paths without a
//!    principal go to `/login`, signed-in visitors on `/login` or `/signup` go
//!    to `/dashboard`, and the rest proceeds.
//!
//! A provider that cannot be reached counts as "no session". The gate never
//! produces an error response of its own.
//!
//! [`SessionClient`]: crate::auth::SessionClient

use crate::auth::RequestCookies;
use crate::middleware::paths::{self, PathClass, DASHBOARD_PATH, LOGIN_PATH};
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

/// What the gate does with a request once the session has been checked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Proceed,
    RedirectToLogin,
    RedirectToDashboard,
}

pub fn decide(class: PathClass, authenticated: bool) -> GateDecision {
    match (class, authenticated) {
        (PathClass::Protected, false) => GateDecision::RedirectToLogin,
        (PathClass::AuthEntry, true) => GateDecision::RedirectToDashboard,
        _ => GateDecision::Proceed,
    }
}

/// Edge gate, runs in front of every route.
///
/// Static assets pass straight through. Everything else has its session
/// validated (and refreshed if stale) before routing; refreshed cookies are
/// written into the request for downstream guards and onto the response for
/// the browser.
pub async fn update_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_owned();
    if paths::is_excluded(&path) {
        return next.run(request).await;
    }

    let mut cookies = RequestCookies::from_headers(request.headers());
    let outcome = state.sessions.update_session(&cookies).await;
    let decision = decide(paths::classify(&path), outcome.principal.is_some());
    tracing::debug!(path = %path, status = ?outcome.status, decision = ?decision, "session gate");

    let mut response = match decision {
        GateDecision::RedirectToLogin => Redirect::temporary(LOGIN_PATH).into_response(),
        GateDecision::RedirectToDashboard => Redirect::temporary(DASHBOARD_PATH).into_response(),
        GateDecision::Proceed => {
            if !outcome.cookie_changes.is_empty() {
                cookies.apply(&outcome.cookie_changes);
                cookies.write_into(request.headers_mut());
            }
            next.run(request).await
        }
    };

    state
        .sessions
        .cookie_options()
        .append_unless_set(response.headers_mut(), &outcome.cookie_changes);
    response
}
