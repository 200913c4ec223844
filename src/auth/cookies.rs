//! Request cookie jar and `Set-Cookie` rendering.
//!
//! Session values can outgrow what browsers accept for a single cookie, so a
//! long value is stored across `<name>.0`, `<name>.1`, ... and stitched back
//! together on read.

use axum::http::{header, HeaderMap, HeaderValue};

/// Largest value written into a single cookie before chunking kicks in
pub const MAX_CHUNK_SIZE: usize = 3180;

/// 400 days, the longest lifetime browsers honour
const DEFAULT_MAX_AGE_SECS: i64 = 400 * 24 * 60 * 60;

/// One pending modification of the caller's cookies
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CookieChange {
    Set { name: String, value: String },
    Remove { name: String },
}

impl CookieChange {
    pub fn name(&self) -> &str {
        match self {
            CookieChange::Set { name, .. } | CookieChange::Remove { name } => name,
        }
    }
}

/// Attributes attached to every session cookie we write
#[derive(Debug, Clone)]
pub struct CookieOptions {
    pub secure: bool,
    pub max_age_secs: i64,
}

impl CookieOptions {
    pub fn new(secure: bool) -> Self {
        Self {
            secure,
            max_age_secs: DEFAULT_MAX_AGE_SECS,
        }
    }

    /// Render one change as a `Set-Cookie` header value
    pub fn set_cookie(&self, change: &CookieChange) -> Option<HeaderValue> {
        let (name, value, max_age) = match change {
            CookieChange::Set { name, value } => (name, value.as_str(), self.max_age_secs),
            CookieChange::Remove { name } => (name, "", 0),
        };
        let mut rendered = format!("{}={}; Path=/; Max-Age={}; SameSite=Lax", name, value, max_age);
        if self.secure {
            rendered.push_str("; Secure");
        }
        HeaderValue::from_str(&rendered).ok()
    }

    /// Append `Set-Cookie` headers for every change
    pub fn append_to(&self, headers: &mut HeaderMap, changes: &[CookieChange]) {
        for change in changes {
            match self.set_cookie(change) {
                Some(value) => {
                    headers.append(header::SET_COOKIE, value);
                }
                None => tracing::warn!(cookie = change.name(), "dropping unrenderable cookie"),
            }
        }
    }

    /// Like [`append_to`](Self::append_to), but skips cookies the response
    /// already sets; a handler's own cookie decisions win.
    pub fn append_unless_set(&self, headers: &mut HeaderMap, changes: &[CookieChange]) {
        let already_set: Vec<String> = headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .filter_map(|value| value.split_once('='))
            .map(|(name, _)| name.trim().to_string())
            .collect();
        let pending: Vec<CookieChange> = changes
            .iter()
            .filter(|change| !already_set.iter().any(|name| name == change.name()))
            .cloned()
            .collect();
        self.append_to(headers, &pending);
    }
}

/// Cookies sent by the client, in the order they appeared
#[derive(Debug, Clone, Default)]
pub struct RequestCookies {
    pairs: Vec<(String, String)>,
}

impl RequestCookies {
    /// Parse every `Cookie` header on the request
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let pairs = headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|line| line.split(';'))
            .filter_map(|part| {
                let (name, value) = part.trim().split_once('=')?;
                let name = name.trim();
                if name.is_empty() {
                    return None;
                }
                Some((name.to_string(), value.trim().to_string()))
            })
            .collect();
        Self { pairs }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Read a possibly chunked value.
    ///
    /// An unchunked cookie wins. Otherwise chunks are joined from `.0` upward
    /// and reading stops at the first missing index.
    pub fn get_chunked(&self, name: &str) -> Option<String> {
        if let Some(value) = self.get(name) {
            return Some(value.to_string());
        }

        let mut joined = String::new();
        for index in 0.. {
            match self.get(&chunk_name(name, index)) {
                Some(part) => joined.push_str(part),
                None => break,
            }
        }
        (!joined.is_empty()).then_some(joined)
    }

    /// Names of all cookies that hold `name` or one of its chunks
    pub fn chunk_names(&self, name: &str) -> Vec<String> {
        self.pairs
            .iter()
            .map(|(n, _)| n)
            .filter(|n| *n == name || is_chunk_of(n, name))
            .cloned()
            .collect()
    }

    /// Apply pending changes so later readers of this jar see them
    pub fn apply(&mut self, changes: &[CookieChange]) {
        for change in changes {
            match change {
                CookieChange::Set { name, value } => {
                    match self.pairs.iter_mut().find(|(n, _)| n == name) {
                        Some(pair) => pair.1 = value.clone(),
                        None => self.pairs.push((name.clone(), value.clone())),
                    }
                }
                CookieChange::Remove { name } => self.pairs.retain(|(n, _)| n != name),
            }
        }
    }

    /// Render the jar back into a single `Cookie` request header
    pub fn to_header_value(&self) -> Option<HeaderValue> {
        if self.pairs.is_empty() {
            return None;
        }
        let line = self
            .pairs
            .iter()
            .map(|(n, v)| format!("{}={}", n, v))
            .collect::<Vec<_>>()
            .join("; ");
        HeaderValue::from_str(&line).ok()
    }

    /// Write this jar into `headers`, replacing any `Cookie` headers present
    pub fn write_into(&self, headers: &mut HeaderMap) {
        headers.remove(header::COOKIE);
        if let Some(value) = self.to_header_value() {
            headers.insert(header::COOKIE, value);
        }
    }
}

/// Changes that store `value` under `name`, chunking when needed and removing
/// chunks left over from a previous, longer value.
pub fn write_chunked(existing: &RequestCookies, name: &str, value: &str) -> Vec<CookieChange> {
    let chunks = split_chunks(value, MAX_CHUNK_SIZE);
    let mut changes: Vec<CookieChange> = if chunks.len() == 1 {
        vec![CookieChange::Set {
            name: name.to_string(),
            value: value.to_string(),
        }]
    } else {
        chunks
            .into_iter()
            .enumerate()
            .map(|(index, part)| CookieChange::Set {
                name: chunk_name(name, index),
                value: part.to_string(),
            })
            .collect()
    };

    for stale in existing.chunk_names(name) {
        if !changes.iter().any(|c| c.name() == stale) {
            changes.push(CookieChange::Remove { name: stale });
        }
    }
    changes
}

/// Changes that remove `name` and every chunk of it
pub fn remove_chunked(existing: &RequestCookies, name: &str) -> Vec<CookieChange> {
    existing
        .chunk_names(name)
        .into_iter()
        .map(|name| CookieChange::Remove { name })
        .collect()
}

fn chunk_name(name: &str, index: usize) -> String {
    format!("{}.{}", name, index)
}

fn is_chunk_of(candidate: &str, name: &str) -> bool {
    candidate
        .strip_prefix(name)
        .and_then(|rest| rest.strip_prefix('.'))
        .is_some_and(|index| !index.is_empty() && index.bytes().all(|b| b.is_ascii_digit()))
}

/// Split on char boundaries into pieces of at most `max` bytes
fn split_chunks(value: &str, max: usize) -> Vec<&str> {
    if value.len() <= max {
        return vec![value];
    }
    let mut chunks = Vec::new();
    let mut rest = value;
    while !rest.is_empty() {
        let mut end = max.min(rest.len());
        while !rest.is_char_boundary(end) {
            end -= 1;
        }
        let (head, tail) = rest.split_at(end);
        chunks.push(head);
        rest = tail;
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jar(line: &str) -> RequestCookies {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(line).expect("header"));
        RequestCookies::from_headers(&headers)
    }

    #[test]
    fn parses_pairs_and_ignores_junk() {
        let cookies = jar("a=1; b = two ;junk; =nameless; c=x=y");
        assert_eq!(cookies.get("a"), Some("1"));
        assert_eq!(cookies.get("b"), Some("two"));
        assert_eq!(cookies.get("c"), Some("x=y"));
        assert_eq!(cookies.get("junk"), None);
    }

    #[test]
    fn reads_from_multiple_cookie_headers() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("a=1"));
        headers.append(header::COOKIE, HeaderValue::from_static("b=2"));
        let cookies = RequestCookies::from_headers(&headers);
        assert_eq!(cookies.get("a"), Some("1"));
        assert_eq!(cookies.get("b"), Some("2"));
    }

    #[test]
    fn joins_chunks_in_order_and_stops_at_gap() {
        let cookies = jar("tok.1=bb; tok.0=aa; tok.3=dd");
        assert_eq!(cookies.get_chunked("tok").as_deref(), Some("aabb"));
    }

    #[test]
    fn unchunked_value_takes_precedence() {
        let cookies = jar("tok.0=aa; tok=whole");
        assert_eq!(cookies.get_chunked("tok").as_deref(), Some("whole"));
    }

    #[test]
    fn missing_cookie_reads_as_none() {
        assert_eq!(jar("other=1").get_chunked("tok"), None);
    }

    #[test]
    fn long_values_are_chunked_and_read_back() {
        let value = "x".repeat(MAX_CHUNK_SIZE * 2 + 10);
        let changes = write_chunked(&RequestCookies::default(), "tok", &value);
        assert_eq!(changes.len(), 3);
        assert_eq!(changes[0].name(), "tok.0");

        let mut cookies = RequestCookies::default();
        cookies.apply(&changes);
        assert_eq!(cookies.get_chunked("tok"), Some(value));
    }

    #[test]
    fn shrinking_value_removes_stale_chunks() {
        let existing = jar("tok.0=aa; tok.1=bb; unrelated=1; tok.extra=z");
        let changes = write_chunked(&existing, "tok", "short");
        assert_eq!(
            changes,
            vec![
                CookieChange::Set { name: "tok".into(), value: "short".into() },
                CookieChange::Remove { name: "tok.0".into() },
                CookieChange::Remove { name: "tok.1".into() },
            ]
        );
    }

    #[test]
    fn remove_covers_base_and_chunks_only() {
        let existing = jar("tok=a; tok.0=b; tok-code-verifier=c");
        let names: Vec<_> = remove_chunked(&existing, "tok")
            .into_iter()
            .map(|c| c.name().to_string())
            .collect();
        assert_eq!(names, vec!["tok", "tok.0"]);
    }

    #[test]
    fn set_cookie_renders_attributes() {
        let options = CookieOptions::new(true);
        let set = options
            .set_cookie(&CookieChange::Set { name: "tok".into(), value: "v".into() })
            .expect("value");
        assert_eq!(set, "tok=v; Path=/; Max-Age=34560000; SameSite=Lax; Secure");

        let removal = CookieOptions::new(false)
            .set_cookie(&CookieChange::Remove { name: "tok".into() })
            .expect("value");
        assert_eq!(removal, "tok=; Path=/; Max-Age=0; SameSite=Lax");
    }

    #[test]
    fn cookies_already_set_by_the_response_are_not_overridden() {
        let options = CookieOptions::new(false);
        let mut headers = HeaderMap::new();
        options.append_to(&mut headers, &[CookieChange::Remove { name: "tok".into() }]);
        options.append_unless_set(
            &mut headers,
            &[
                CookieChange::Set { name: "tok".into(), value: "refreshed".into() },
                CookieChange::Set { name: "other".into(), value: "1".into() },
            ],
        );

        let rendered: Vec<_> = headers
            .get_all(header::SET_COOKIE)
            .iter()
            .map(|v| v.to_str().expect("ascii").to_string())
            .collect();
        assert_eq!(rendered.len(), 2);
        assert!(rendered[0].starts_with("tok=; "));
        assert!(rendered[1].starts_with("other=1; "));
    }

    #[test]
    fn applied_changes_are_reflected_in_request_header() {
        let mut cookies = jar("tok=old; keep=1");
        cookies.apply(&[
            CookieChange::Set { name: "tok".into(), value: "new".into() },
            CookieChange::Remove { name: "keep".into() },
        ]);
        let mut headers = HeaderMap::new();
        cookies.write_into(&mut headers);
        assert_eq!(headers.get(header::COOKIE).expect("cookie"), "tok=new");
    }
}
