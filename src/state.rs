//! Shared application state injected into all HTTP handlers.

use std::sync::Arc;

use crate::application::services::{LinkService, LinkSettings, RedirectService, StatsService};
use crate::domain::repositories::UrlRepository;
use crate::domain::visit_event::VisitSender;
use crate::infrastructure::cache::CacheService;

/// Application state shared across all request handlers.
///
/// Cloned cheaply for each request since every field is an `Arc` or a
/// channel handle.
#[derive(Clone)]
pub struct AppState {
    pub link_service: Arc<LinkService<dyn UrlRepository>>,
    pub redirect_service: Arc<RedirectService<dyn UrlRepository>>,
    pub stats_service: Arc<StatsService<dyn UrlRepository>>,
    pub repository: Arc<dyn UrlRepository>,
    pub cache: Arc<dyn CacheService>,
    pub visit_sender: VisitSender,
}

impl AppState {
    /// Wires the services over one record store and one cache.
    ///
    /// The cache TTL used by the resolver is taken from `settings`, so
    /// creation and lookup populate the cache identically.
    pub fn new(
        repository: Arc<dyn UrlRepository>,
        cache: Arc<dyn CacheService>,
        visit_sender: VisitSender,
        settings: LinkSettings,
    ) -> Self {
        let cache_ttl = settings.cache_ttl;

        let link_service = Arc::new(LinkService::new(
            repository.clone(),
            cache.clone(),
            settings,
        ));
        let redirect_service = Arc::new(RedirectService::new(
            repository.clone(),
            cache.clone(),
            visit_sender.clone(),
            cache_ttl,
        ));
        let stats_service = Arc::new(StatsService::new(repository.clone(), cache.clone()));

        Self {
            link_service,
            redirect_service,
            stats_service,
            repository,
            cache,
            visit_sender,
        }
    }
}
