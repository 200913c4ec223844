//! Path classification for the edge gate.
//!
//! Exclusions are an explicit, ordered rule list. A path that does not look
//! like a plain absolute path is never excluded and is always treated as
//! protected.

/// Where unauthenticated visitors are sent
pub const LOGIN_PATH: &str = "/login";

/// Where authenticated visitors to the login/signup pages are sent
pub const DASHBOARD_PATH: &str = "/dashboard";

/// One exclusion rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathRule {
    /// Path starts with the given text
    Prefix(&'static str),
    /// Path ends with `.<ext>`
    Extension(&'static str),
}

impl PathRule {
    pub fn matches(&self, path: &str) -> bool {
        match *self {
            PathRule::Prefix(prefix) => path.starts_with(prefix),
            PathRule::Extension(ext) => path
                .rsplit_once('.')
                .is_some_and(|(stem, found)| found == ext && !stem.is_empty()),
        }
    }
}

/// Requests matching any of these skip the gate entirely
pub const GATE_EXCLUSIONS: &[PathRule] = &[
    PathRule::Prefix("/_next/static"),
    PathRule::Prefix("/_next/image"),
    PathRule::Prefix("/favicon.ico"),
    PathRule::Extension("svg"),
    PathRule::Extension("png"),
    PathRule::Extension("jpg"),
    PathRule::Extension("jpeg"),
    PathRule::Extension("gif"),
    PathRule::Extension("webp"),
];

/// Pages that require a session
pub const PROTECTED_PREFIXES: &[&str] = &[
    "/dashboard",
    "/members",
    "/attendances",
    "/arrangements",
    "/management",
    "/admin",
    "/statistics",
    "/my-attendance",
    "/mypage",
    "/documents",
    "/service-schedules",
    "/member-link",
];

/// Pages a signed-in visitor has no business on
pub const AUTH_ENTRY_PREFIXES: &[&str] = &["/login", "/signup"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathClass {
    Protected,
    AuthEntry,
    Public,
}

/// A plain absolute path: leading slash, no empty or dot segments, no
/// encoded separators or dots, no backslashes.
pub fn is_well_formed(path: &str) -> bool {
    if !path.starts_with('/') || path.contains("//") || path.contains('\\') {
        return false;
    }
    if path.split('/').any(|segment| segment == "." || segment == "..") {
        return false;
    }
    let lower = path.to_ascii_lowercase();
    !["%2e", "%2f", "%5c"].iter().any(|escape| lower.contains(escape))
}

/// Whether the gate should let this path through untouched
pub fn is_excluded(path: &str) -> bool {
    is_well_formed(path) && GATE_EXCLUSIONS.iter().any(|rule| rule.matches(path))
}

pub fn classify(path: &str) -> PathClass {
    if !is_well_formed(path) || PROTECTED_PREFIXES.iter().any(|p| path.starts_with(p)) {
        PathClass::Protected
    } else if AUTH_ENTRY_PREFIXES.iter().any(|p| path.starts_with(p)) {
        PathClass::AuthEntry
    } else {
        PathClass::Public
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_assets_and_images_are_excluded() {
        for path in [
            "/_next/static/chunk.js",
            "/_next/static/css/app.css",
            "/_next/image?url=x",
            "/_next/image",
            "/favicon.ico",
            "/logo.svg",
            "/images/choir.png",
            "/a/b/photo.jpg",
            "/photo.jpeg",
            "/loading.gif",
            "/hero.webp",
        ] {
            assert!(is_excluded(path), "{} should be excluded", path);
        }
    }

    #[test]
    fn pages_and_other_files_are_not_excluded() {
        for path in [
            "/",
            "/dashboard",
            "/management/members",
            "/_next/data/build.json",
            "/report.pdf",
            "/logo.SVG",
            "/svg",
            "/png",
            "/api/auth/session",
        ] {
            assert!(!is_excluded(path), "{} should go through the gate", path);
        }
    }

    #[test]
    fn traversal_out_of_asset_prefix_is_not_excluded() {
        assert!(!is_excluded("/_next/static/../../dashboard"));
        assert!(!is_excluded("/_next/static/%2e%2e/dashboard"));
        assert!(!is_excluded("/_next/static/%2F..%2Fdashboard"));
        assert!(!is_excluded("//_next/static/chunk.js"));
        assert!(!is_excluded("/dashboard/..\\x.png"));
    }

    #[test]
    fn malformed_paths_fail_closed() {
        assert_eq!(classify("/login/../dashboard"), PathClass::Protected);
        assert_eq!(classify("/./login"), PathClass::Protected);
        assert_eq!(classify("relative"), PathClass::Protected);
        assert_eq!(classify(""), PathClass::Protected);
    }

    #[test]
    fn classification_by_prefix() {
        assert_eq!(classify("/management/members"), PathClass::Protected);
        assert_eq!(classify("/attendances/new"), PathClass::Protected);
        assert_eq!(classify("/members/42"), PathClass::Protected);
        assert_eq!(classify("/login"), PathClass::AuthEntry);
        assert_eq!(classify("/signup"), PathClass::AuthEntry);
        assert_eq!(classify("/"), PathClass::Public);
        assert_eq!(classify("/health"), PathClass::Public);
        assert_eq!(classify("/auth/callback"), PathClass::Public);
    }
}
