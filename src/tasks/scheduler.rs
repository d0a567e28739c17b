//! Background Scheduler
//!
//! Owns the cache's two timers: a periodic cleanup sweep and a one-shot
//! deferred preload of high-value namespaces. Started and stopped by the
//! host application on foreground/background transitions.

use std::future::Future;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use futures::future::BoxFuture;
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::HybridCache;
use crate::config::CacheConfig;
use crate::request::cached_request;

// == Preload Task ==
/// Boxed producer shared with the preload timer.
pub type PreloadProducer =
    Arc<dyn Fn() -> BoxFuture<'static, anyhow::Result<Value>> + Send + Sync>;

/// One namespace warmed shortly after startup.
#[derive(Clone)]
pub struct PreloadTask {
    namespace: String,
    ttl: Duration,
    producer: PreloadProducer,
}

impl PreloadTask {
    /// Creates a preload task fetching `namespace` with `producer`.
    pub fn new<F, Fut>(namespace: impl Into<String>, ttl: Duration, producer: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
    {
        Self {
            namespace: namespace.into(),
            ttl,
            producer: Arc::new(move || {
                Box::pin(producer()) as BoxFuture<'static, anyhow::Result<Value>>
            }),
        }
    }
}

struct TimerHandles {
    cleanup: JoinHandle<()>,
    preload: JoinHandle<()>,
}

// == Cache Scheduler ==
/// Start/stop lifecycle around the cache's background timers.
///
/// `start` while running is a no-op, as is `stop` while stopped; the host
/// may deliver lifecycle signals in any order without creating duplicate
/// timers or errors.
pub struct CacheScheduler {
    cache: Arc<HybridCache>,
    cleanup_interval: Duration,
    preload_delay: Duration,
    preload_tasks: Vec<PreloadTask>,
    handles: Mutex<Option<TimerHandles>>,
}

impl CacheScheduler {
    // == Constructor ==
    /// Creates a stopped scheduler over `cache`.
    pub fn new(cache: Arc<HybridCache>, config: &CacheConfig, preload_tasks: Vec<PreloadTask>) -> Self {
        Self {
            cache,
            cleanup_interval: config.cleanup_interval,
            preload_delay: config.preload_delay,
            preload_tasks,
            handles: Mutex::new(None),
        }
    }

    // == Start ==
    /// Spawns the cleanup loop and the one-shot preload.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self) {
        let mut handles = self.handles.lock().expect("scheduler lock poisoned");
        if handles.is_some() {
            warn!("scheduler already running, ignoring start");
            return;
        }

        info!(
            cleanup_interval_secs = self.cleanup_interval.as_secs(),
            preload_tasks = self.preload_tasks.len(),
            "starting cache scheduler"
        );

        *handles = Some(TimerHandles {
            cleanup: spawn_cleanup_loop(self.cache.clone(), self.cleanup_interval),
            preload: spawn_preload(
                self.cache.clone(),
                self.preload_delay,
                self.preload_tasks.clone(),
            ),
        });
    }

    // == Stop ==
    /// Cancels both timers. Idempotent: stopping twice, or before `start`,
    /// is a no-op.
    pub fn stop(&self) {
        let mut handles = self.handles.lock().expect("scheduler lock poisoned");
        match handles.take() {
            Some(timers) => {
                timers.cleanup.abort();
                timers.preload.abort();
                info!("cache scheduler stopped");
            }
            None => debug!("scheduler already stopped"),
        }
    }

    /// Whether the timers are currently running.
    pub fn is_running(&self) -> bool {
        self.handles.lock().expect("scheduler lock poisoned").is_some()
    }

    // == Host Lifecycle Hooks ==
    /// Host moved to the foreground.
    pub fn on_foreground(&self) {
        self.start();
    }

    /// Host moved to the background.
    pub fn on_background(&self) {
        self.stop();
    }

    /// Host reported memory pressure: evict the memory tier. The persistent
    /// tier keeps the data, so the next read re-promotes instead of
    /// refetching.
    pub async fn on_memory_pressure(&self) {
        info!("memory pressure, evicting memory tier");
        self.cache.clear_memory().await;
    }
}

impl Drop for CacheScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Periodic cleanup loop: sleeps the interval, then sweeps both tiers.
fn spawn_cleanup_loop(cache: Arc<HybridCache>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(interval).await;

            let removed = cache.cleanup().await;
            if removed > 0 {
                info!(removed, "cleanup sweep removed expired entries");
            } else {
                debug!("cleanup sweep found no expired entries");
            }
        }
    })
}

/// One-shot deferred preload through the request wrapper; per-task failures
/// are logged and do not stop the remaining tasks.
fn spawn_preload(
    cache: Arc<HybridCache>,
    delay: Duration,
    tasks: Vec<PreloadTask>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;

        for task in tasks {
            let producer = task.producer.clone();
            let result: crate::error::Result<Value> =
                cached_request(&cache, &task.namespace, task.ttl, move || (*producer)()).await;

            match result {
                Ok(_) => debug!(namespace = %task.namespace, "preloaded"),
                Err(err) => warn!(namespace = %task.namespace, %err, "preload failed"),
            }
        }
    })
}
