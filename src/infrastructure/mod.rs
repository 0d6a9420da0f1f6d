//! Infrastructure layer for external integrations.
//!
//! # Modules
//!
//! - [`cache`] - Cache abstraction with Redis, in-memory and no-op backends
//! - [`persistence`] - PostgreSQL and in-memory record stores

pub mod cache;
pub mod persistence;
