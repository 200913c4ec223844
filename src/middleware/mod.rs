//! # Middleware Module
//!
//! Request interceptors that decide whether a visitor may see a page.
//!
//! - `paths`: which paths are static assets, protected pages, or login pages
//! - `gate`: the edge gate in front of every route; validates and refreshes
//!   the session, redirects anonymous visitors away from protected paths
//! - `guard`: per-subtree route guards and the `CurrentUser` extractor, a
//!   second independent check right before a protected page runs

pub mod gate;
pub mod guard;
pub mod paths;
