//! Application layer services implementing business logic.
//!
//! # Available Services
//!
//! - [`services::LinkService`] - Short URL creation
//! - [`services::RedirectService`] - Cache-aside code resolution
//! - [`services::StatsService`] - Effective visit counts

pub mod services;
