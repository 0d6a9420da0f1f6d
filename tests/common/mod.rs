#![allow(dead_code)]

use axum_test::TestServer;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tinylink::application::services::LinkSettings;
use tinylink::domain::entities::UrlRecord;
use tinylink::domain::visit_event::{VisitEvent, VisitSender};
use tinylink::domain::visit_worker::{VisitWorkerConfig, run_visit_worker};
use tinylink::infrastructure::cache::MemoryCache;
use tinylink::infrastructure::persistence::InMemoryUrlRepository;
use tinylink::routes::router;
use tinylink::state::AppState;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub struct TestApp {
    pub server: TestServer,
    pub repository: Arc<InMemoryUrlRepository>,
    pub cache: Arc<MemoryCache>,
}

/// State over in-memory backends. The caller owns the visit receiver.
pub fn create_test_state() -> (
    AppState,
    Arc<InMemoryUrlRepository>,
    Arc<MemoryCache>,
    mpsc::Receiver<VisitEvent>,
) {
    let repository = Arc::new(InMemoryUrlRepository::new());
    let cache = Arc::new(MemoryCache::new());
    let (sender, rx) = VisitSender::channel(100);

    let state = AppState::new(
        repository.clone(),
        cache.clone(),
        sender,
        LinkSettings::default(),
    );

    (state, repository, cache, rx)
}

/// App without a visit worker; visit events pile up in the returned receiver.
pub fn spawn_app() -> (TestApp, mpsc::Receiver<VisitEvent>) {
    let (state, repository, cache, rx) = create_test_state();
    let server = TestServer::new(router(state)).unwrap();

    (
        TestApp {
            server,
            repository,
            cache,
        },
        rx,
    )
}

/// Runs a visit worker that flushes every 50ms.
pub fn spawn_worker(
    rx: mpsc::Receiver<VisitEvent>,
    repository: Arc<InMemoryUrlRepository>,
    cache: Arc<MemoryCache>,
) -> JoinHandle<()> {
    tokio::spawn(run_visit_worker(
        rx,
        cache,
        repository,
        VisitWorkerConfig {
            flush_interval: Duration::from_millis(50),
            ..VisitWorkerConfig::default()
        },
    ))
}

/// App with a running visit worker.
pub fn spawn_app_with_worker() -> TestApp {
    let (state, repository, cache, rx) = create_test_state();
    spawn_worker(rx, repository.clone(), cache.clone());

    let server = TestServer::new(router(state)).unwrap();

    TestApp {
        server,
        repository,
        cache,
    }
}

pub fn seed_record(
    repository: &InMemoryUrlRepository,
    id: i64,
    code: &str,
    url: &str,
    expires_at: Option<DateTime<Utc>>,
) {
    repository.insert_record(UrlRecord::new(
        id,
        url.to_string(),
        code.to_string(),
        0,
        Utc::now(),
        expires_at,
    ));
}

/// Polls `GET /api/stats/{code}` until `visits` reaches `expected`.
pub async fn wait_for_visits(server: &TestServer, code: &str, expected: i64) -> i64 {
    let mut visits = 0;
    for _ in 0..100 {
        let json = server
            .get(&format!("/api/stats/{code}"))
            .await
            .json::<serde_json::Value>();
        visits = json["visits"].as_i64().unwrap_or(0);
        if visits >= expected {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    visits
}
