//! # HTTP Request Handlers
//!
//! ## Submodules
//! - `health`: Health check endpoint (for monitoring)
//! - `auth`: OAuth callback, session info, logout
//! - `pages`: Page descriptors, public and guarded
//! - `legacy`: Permanent redirects from old URLs

pub mod auth;
pub mod health;
pub mod legacy;
pub mod pages;
