//! Domain layer containing business entities and logic.
//!
//! Defines the URL record entity, the durable store contract, and the
//! asynchronous visit counting pipeline. Nothing here depends on the HTTP or
//! infrastructure layers beyond the cache trait the visit worker writes to.
//!
//! # Visit Counting Flow
//!
//! 1. A successful redirect enqueues a [`visit_event::VisitEvent`]
//! 2. [`visit_worker::run_visit_worker`] bumps the live counter in the cache
//! 3. Live counters are periodically folded into [`repositories::UrlRepository`]

pub mod entities;
pub mod repositories;
pub mod visit_event;
pub mod visit_worker;
