//! Background worker that counts visits and folds them into the durable store.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashSet;
use tokio::sync::{Semaphore, mpsc, oneshot};
use tokio::time::MissedTickBehavior;
use tokio_retry::Retry;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{debug, error, info, warn};

use crate::domain::repositories::UrlRepository;
use crate::domain::visit_event::VisitEvent;
use crate::infrastructure::cache::CacheService;

/// Tuning knobs for [`run_visit_worker`].
#[derive(Debug, Clone)]
pub struct VisitWorkerConfig {
    /// Maximum number of visit events processed concurrently.
    pub concurrency: usize,
    /// How often dirty live counters are folded into the durable store.
    pub flush_interval: Duration,
    /// Retries for a failed durable fold before the delta is put back.
    pub flush_retries: usize,
}

impl Default for VisitWorkerConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            flush_interval: Duration::from_secs(30),
            flush_retries: 3,
        }
    }
}

/// Codes whose live counter may hold visits not yet in the durable store.
#[derive(Debug, Default)]
pub struct DirtyCodes {
    codes: DashSet<String>,
}

impl DirtyCodes {
    pub fn mark(&self, code: &str) {
        if !self.codes.contains(code) {
            self.codes.insert(code.to_string());
        }
    }

    /// Removes and returns every marked code.
    ///
    /// A code marked while draining is either returned now or kept for the
    /// next drain.
    pub fn drain(&self) -> Vec<String> {
        let marked: Vec<String> = self.codes.iter().map(|code| code.key().clone()).collect();
        marked
            .into_iter()
            .filter_map(|code| self.codes.remove(&code))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

/// Consumes visit events until the channel closes.
///
/// Each event bumps the live counter in the cache; when the cache cannot
/// take it the visit goes straight to the durable store. A separate task
/// moves live counters of touched codes into the durable baseline every
/// `flush_interval`, so a slow store never stalls the queue. Once the
/// channel closes the flusher is stopped and one final flush runs.
///
/// Visits are best-effort: failures are logged and dropped, never retried
/// on the redirect path.
pub async fn run_visit_worker(
    mut rx: mpsc::Receiver<VisitEvent>,
    cache: Arc<dyn CacheService>,
    repository: Arc<dyn UrlRepository>,
    config: VisitWorkerConfig,
) {
    let concurrency = config.concurrency.max(1);
    let semaphore = Arc::new(Semaphore::new(concurrency));
    let dirty = Arc::new(DirtyCodes::default());

    let (stop_tx, stop_rx) = oneshot::channel();
    let flusher = tokio::spawn(run_periodic_flush(
        cache.clone(),
        repository.clone(),
        dirty.clone(),
        config.clone(),
        stop_rx,
    ));

    while let Some(event) = rx.recv().await {
        let Ok(permit) = semaphore.clone().acquire_owned().await else {
            break;
        };
        let cache = cache.clone();
        let repository = repository.clone();
        let dirty = dirty.clone();

        tokio::spawn(async move {
            count_visit(&event.code, cache.as_ref(), repository.as_ref(), &dirty).await;
            drop(permit);
        });
    }

    // Lets a flush already in progress finish before the final one.
    let _ = stop_tx.send(());
    if let Err(e) = flusher.await {
        error!(error = %e, "Visit flusher panicked");
    }

    // Wait for in-flight increments before the final flush.
    let _all = semaphore.acquire_many(concurrency as u32).await;
    let flushed =
        flush_visits(cache.as_ref(), repository.as_ref(), &dirty, config.flush_retries).await;
    info!(flushed, "Visit worker stopped");
}

/// Flushes dirty counters on every tick until `stop` fires.
async fn run_periodic_flush(
    cache: Arc<dyn CacheService>,
    repository: Arc<dyn UrlRepository>,
    dirty: Arc<DirtyCodes>,
    config: VisitWorkerConfig,
    mut stop: oneshot::Receiver<()>,
) {
    let mut ticker = tokio::time::interval(config.flush_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = &mut stop => break,
            _ = ticker.tick() => {
                flush_visits(cache.as_ref(), repository.as_ref(), &dirty, config.flush_retries).await;
            }
        }
    }
}

/// Records a single visit for `code`.
pub async fn count_visit(
    code: &str,
    cache: &dyn CacheService,
    repository: &dyn UrlRepository,
    dirty: &DirtyCodes,
) {
    match cache.incr_visits(code).await {
        Ok(()) => dirty.mark(code),
        Err(e) => {
            debug!(code, error = %e, "Live counter unavailable, recording visit durably");
            if let Err(e) = repository.add_visits(code, 1).await {
                warn!(code, error = %e, "Failed to record visit, dropping");
                metrics::counter!("tinylink_visits_dropped_total", "reason" => "store_error")
                    .increment(1);
            }
        }
    }
}

/// Moves live counters of all dirty codes into the durable store.
///
/// Returns the number of visits folded. A delta whose durable write keeps
/// failing is added back to the live counter and the code stays dirty.
pub async fn flush_visits(
    cache: &dyn CacheService,
    repository: &dyn UrlRepository,
    dirty: &DirtyCodes,
    retries: usize,
) -> i64 {
    let mut flushed = 0;

    for code in dirty.drain() {
        let delta = match cache.take_visits(&code).await {
            Ok(0) => continue,
            Ok(n) => n,
            Err(e) => {
                warn!(code = %code, error = %e, "Failed to read live counter, retrying next flush");
                dirty.mark(&code);
                continue;
            }
        };

        let strategy = ExponentialBackoff::from_millis(10)
            .max_delay(Duration::from_secs(1))
            .map(jitter)
            .take(retries);

        match Retry::spawn(strategy, || repository.add_visits(&code, delta)).await {
            Ok(()) => {
                debug!(code = %code, delta, "Folded live visits into durable count");
                flushed += delta;
            }
            Err(e) => {
                warn!(code = %code, delta, error = %e, "Failed to fold visits, restoring live counter");
                match cache.restore_visits(&code, delta).await {
                    Ok(()) => dirty.mark(&code),
                    Err(e) => {
                        error!(code = %code, delta, error = %e, "Visits lost");
                        metrics::counter!("tinylink_visits_dropped_total", "reason" => "flush_failed")
                            .increment(delta as u64);
                    }
                }
            }
        }
    }

    flushed
}
