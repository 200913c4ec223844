//! # Legacy Redirects
//!
//! Old URLs kept alive after pages moved. Each one is a permanent redirect to
//! the canonical path with the remainder of the path and the query string
//! carried over. No auth check happens here; the gate and the destination's
//! guard take care of that.

use crate::error::{AppError, AppResult};
use axum::{http::Uri, response::Redirect};

/// (old prefix, canonical prefix)
pub const LEGACY_PREFIXES: &[(&str, &str)] = &[("/members", "/management/members")];

/// Canonical path for a legacy path, if it is one
pub fn canonical_path(path: &str) -> Option<String> {
    LEGACY_PREFIXES.iter().find_map(|(old, new)| {
        let rest = path.strip_prefix(old)?;
        (rest.is_empty() || rest.starts_with('/')).then(|| format!("{}{}", new, rest))
    })
}

/// GET /members, GET /members/{*rest}
pub async fn legacy_redirect(uri: Uri) -> AppResult<Redirect> {
    let target = canonical_path(uri.path())
        .ok_or_else(|| AppError::NotFound(format!("No page at {}", uri.path())))?;
    let target = match uri.query() {
        Some(query) => format!("{}?{}", target, query),
        None => target,
    };
    Ok(Redirect::permanent(&target))
}
