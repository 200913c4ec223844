//! # Session Auth
//!
//! Everything needed to answer "who is making this request?" against the
//! hosted session provider.
//!
//! ## Submodules
//! - `principal`: the authenticated user identity
//! - `session`: the provider-issued session and its cookie encoding
//! - `cookies`: request cookie jar, chunking, and `Set-Cookie` rendering
//! - `provider`: the `SessionProvider` seam
//! - `supabase`: the production provider, speaking to Supabase GoTrue
//! - `client`: validation/refresh flow shared by the edge gate and route guards

pub mod client;
pub mod cookies;
pub mod principal;
pub mod provider;
pub mod session;
pub mod supabase;

#[cfg(test)]
pub mod fake;

pub use client::SessionClient;
pub use cookies::{CookieChange, CookieOptions, RequestCookies};
pub use principal::Principal;
pub use provider::SessionProvider;
