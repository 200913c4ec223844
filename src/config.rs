//! # Configuration Management
//!
//! Configuration comes from the environment ("12-factor app"), with an optional
//! `.env` file for local development.
//!
//! ## Environment Variables
//! - `HOST`: Server bind address (default: 127.0.0.1)
//! - `PORT`: Server port (default: 8080)
//! - `SUPABASE_URL`: Supabase project URL (required; `NEXT_PUBLIC_SUPABASE_URL` also accepted)
//! - `SUPABASE_ANON_KEY`: Supabase public anon key (required; `NEXT_PUBLIC_SUPABASE_ANON_KEY` also accepted)
//! - `PROVIDER_TIMEOUT_SECS`: Upper bound for one call to the auth provider (default: 10)
//! - `COOKIE_SECURE`: Mark session cookies `Secure` (default: false)
//! - `STATIC_DIR`: Directory holding build assets and the favicon (default: public)

use anyhow::{anyhow, Context, Result};
use reqwest::Url;
use std::env;
use std::time::Duration;

/// Application configuration
///
/// All fields are public so handlers and the session client can read them
/// straight out of the shared state.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host/IP address to bind to
    pub host: String,

    /// Server port number
    pub port: u16,

    /// Base URL of the Supabase project, e.g. `https://abcd1234.supabase.co`
    pub supabase_url: Url,

    /// Public anon key sent as the `apikey` header on every auth call
    pub supabase_anon_key: String,

    /// How long a single provider call may take before it counts as unavailable
    pub provider_timeout: Duration,

    /// Whether session cookies carry the `Secure` attribute
    pub cookie_secure: bool,

    /// Directory served under `/_next/static` and for `/favicon.ico`
    pub static_dir: String,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Optional values fall back to defaults. The Supabase URL and anon key are
    /// required; a missing or unparseable value is an error naming the variable.
    ///
    /// ## Example .env file
    /// ```text
    /// HOST=127.0.0.1
    /// PORT=8080
    /// SUPABASE_URL=https://abcd1234.supabase.co
    /// SUPABASE_ANON_KEY=eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...
    /// COOKIE_SECURE=false
    /// ```
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let supabase_url = required_var(&["SUPABASE_URL", "NEXT_PUBLIC_SUPABASE_URL"])?;
        let supabase_url = Url::parse(&supabase_url)
            .with_context(|| format!("SUPABASE_URL is not a valid URL: {}", supabase_url))?;

        let provider_timeout_secs: u64 = env::var("PROVIDER_TIMEOUT_SECS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .context("PROVIDER_TIMEOUT_SECS must be a whole number of seconds")?;

        Ok(Config {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a valid port number")?,
            supabase_url,
            supabase_anon_key: required_var(&[
                "SUPABASE_ANON_KEY",
                "NEXT_PUBLIC_SUPABASE_ANON_KEY",
            ])?,
            provider_timeout: Duration::from_secs(provider_timeout_secs),
            cookie_secure: parse_flag(env::var("COOKIE_SECURE").ok().as_deref()),
            static_dir: env::var("STATIC_DIR").unwrap_or_else(|_| "public".to_string()),
        })
    }

    /// Get the socket address to bind the server to, e.g. "127.0.0.1:8080"
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Name of the cookie holding the Supabase session.
    ///
    /// Supabase keys the cookie by project ref, the first label of the project
    /// host: `https://abcd1234.supabase.co` gives `sb-abcd1234-auth-token`.
    pub fn session_cookie_name(&self) -> String {
        let project_ref = self
            .supabase_url
            .host_str()
            .and_then(|host| host.split('.').next())
            .unwrap_or("local");
        format!("sb-{}-auth-token", project_ref)
    }
}

/// Read the first non-empty variable among `names`.
fn required_var(names: &[&str]) -> Result<String> {
    names
        .iter()
        .filter_map(|name| env::var(name).ok())
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
        .ok_or_else(|| anyhow!("missing required environment variable {}", names[0]))
}

fn parse_flag(value: Option<&str>) -> bool {
    matches!(
        value.map(|v| v.trim().to_ascii_lowercase()).as_deref(),
        Some("1" | "true" | "yes" | "on")
    )
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        supabase_url: Url::parse("https://choirref.supabase.co").expect("static url"),
        supabase_anon_key: "anon-key".to_string(),
        provider_timeout: Duration::from_secs(2),
        cookie_secure: false,
        static_dir: "public".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookie_name_uses_project_ref() {
        let config = test_config();
        assert_eq!(config.session_cookie_name(), "sb-choirref-auth-token");
    }

    #[test]
    fn cookie_name_for_local_development_host() {
        let mut config = test_config();
        config.supabase_url = Url::parse("http://127.0.0.1:54321").expect("url");
        assert_eq!(config.session_cookie_name(), "sb-127-auth-token");
    }

    #[test]
    fn flags_accept_common_truthy_spellings() {
        assert!(parse_flag(Some("true")));
        assert!(parse_flag(Some(" YES ")));
        assert!(parse_flag(Some("1")));
        assert!(!parse_flag(Some("false")));
        assert!(!parse_flag(Some("")));
        assert!(!parse_flag(None));
    }

    #[test]
    fn bind_address_joins_host_and_port() {
        let mut config = test_config();
        config.port = 8080;
        assert_eq!(config.bind_address(), "127.0.0.1:8080");
    }
}
