//! # Session Token
//!
//! The session issued by the provider and the way it is packed into a cookie.
//!
//! ## Cookie encoding
//! The session is serialized to JSON and written as `base64-<base64url(json)>`.
//! Older cookies hold percent-encoded JSON without the prefix; both are read.

use crate::auth::principal::Principal;
use base64::prelude::*;
use serde::{Deserialize, Serialize};

const BASE64_PREFIX: &str = "base64-";

/// Tokens this close to expiry are refreshed rather than used
const EXPIRY_MARGIN_SECS: i64 = 30;

/// A provider-issued session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionToken {
    pub access_token: String,
    pub refresh_token: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,

    /// Lifetime in seconds, as issued
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,

    /// Absolute expiry, unix seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<Principal>,
}

impl SessionToken {
    /// Whether the access token should be refreshed before use at `now`.
    ///
    /// A session without any expiry information is never considered expired;
    /// the provider is the judge of its validity.
    pub fn needs_refresh(&self, now: i64) -> bool {
        match self.expires_at {
            Some(expires_at) => expires_at.saturating_sub(EXPIRY_MARGIN_SECS) <= now,
            None => false,
        }
    }

    /// Fill in `expires_at` from `expires_in` when the provider left it out
    pub fn with_expiry_from(mut self, now: i64) -> Self {
        if self.expires_at.is_none() {
            self.expires_at = self.expires_in.map(|secs| now.saturating_add(secs));
        }
        self
    }

    /// Encode for storage in a cookie
    pub fn to_cookie_value(&self) -> Result<String, serde_json::Error> {
        let json = serde_json::to_vec(self)?;
        Ok(format!("{}{}", BASE64_PREFIX, BASE64_URL_SAFE_NO_PAD.encode(json)))
    }

    /// Decode a cookie value; `None` when it is not a session we understand
    pub fn from_cookie_value(raw: &str) -> Option<Self> {
        let json = match raw.strip_prefix(BASE64_PREFIX) {
            Some(encoded) => decode_base64(encoded)?,
            None => urlencoding::decode(raw).ok()?.into_owned().into_bytes(),
        };
        serde_json::from_slice(&json).ok()
    }
}

/// Decode a `base64-` prefixed or plain string value, such as the PKCE code
/// verifier, which is stored as a JSON string.
pub fn decode_string_cookie(raw: &str) -> Option<String> {
    let text = match raw.strip_prefix(BASE64_PREFIX) {
        Some(encoded) => String::from_utf8(decode_base64(encoded)?).ok()?,
        None => urlencoding::decode(raw).ok()?.into_owned(),
    };
    let value = serde_json::from_str::<String>(&text).unwrap_or(text);
    (!value.is_empty()).then_some(value)
}

fn decode_base64(encoded: &str) -> Option<Vec<u8>> {
    // Writers disagree on padding
    BASE64_URL_SAFE_NO_PAD
        .decode(encoded.trim_end_matches('='))
        .ok()
}
