//! Core domain entities.
//!
//! - [`UrlRecord`] - A persisted short code → long URL mapping
//! - [`NewUrlRecord`] - Insert payload for a new mapping

pub mod url_record;

pub use url_record::{NewUrlRecord, UrlRecord};
