//! # Page Handlers
//!
//! The portal's pages as JSON page descriptors; rendering them into markup is
//! the front end's job. Pages under a guarded subtree only run after the
//! route guard found a principal.

use crate::auth::{Principal, RequestCookies};
use crate::middleware::guard::{self, CurrentUser, LoginRedirect};
use crate::middleware::paths::{DASHBOARD_PATH, LOGIN_PATH};
use crate::state::AppState;
use axum::{
    extract::{Path, Request, State},
    http::HeaderMap,
    response::Redirect,
    Json,
};
use serde_json::{json, Value};

/// Descriptor for a page that needs no per-user data
pub fn page(name: &str) -> Json<Value> {
    Json(json!({ "page": name }))
}

/// GET /
pub async fn home(State(state): State<AppState>, headers: HeaderMap) -> Redirect {
    let cookies = RequestCookies::from_headers(&headers);
    match state.sessions.current_principal(&cookies).await {
        Some(_) => Redirect::temporary(DASHBOARD_PATH),
        None => Redirect::temporary(LOGIN_PATH),
    }
}

/// GET /dashboard
pub async fn dashboard(CurrentUser(user): CurrentUser) -> Json<Value> {
    Json(json!({
        "page": "dashboard",
        "user_id": user.id,
        "email": user.email,
    }))
}

/// GET /attendances/bulk
///
/// Uses the guard's principal when there is one. Otherwise it checks on its
/// own so the login page can send the visitor back here.
pub async fn bulk_attendance(
    State(state): State<AppState>,
    request: Request,
) -> Result<Json<Value>, LoginRedirect> {
    let user = match request.extensions().get::<Principal>() {
        Some(user) => user.clone(),
        None => guard::check(&state.sessions, request.headers())
            .await
            .map_err(|redirect| redirect.returning_to("/attendances/bulk"))?,
    };
    Ok(Json(json!({
        "page": "attendances/bulk",
        "user_id": user.id,
    })))
}

/// GET /management/members/{id}
pub async fn member_detail(Path(member_id): Path<String>) -> Json<Value> {
    Json(json!({
        "page": "management/members/detail",
        "member_id": member_id,
    }))
}

/// GET /management/members/{id}/edit
pub async fn member_edit(Path(member_id): Path<String>) -> Json<Value> {
    Json(json!({
        "page": "management/members/edit",
        "member_id": member_id,
    }))
}
