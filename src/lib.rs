//! xpboard: progress dashboard for a learning platform.
//!
//! Ledger records come in over GraphQL, get folded into a cumulative XP
//! series and a best-by-category skill list, and are drawn as two charts on
//! any [`render::Surface`].

pub mod aggregate;
pub mod client;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod geometry;
pub mod ledger;
pub mod logging;
pub mod queries;
pub mod render;
pub mod session;
pub mod summary;
