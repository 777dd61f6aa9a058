//! Periodic Sweep Task
//!
//! Background task that removes expired entries from a store on a fixed
//! interval until told to stop.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use crate::cache::{CacheStore, EstimateSize};

// == Sweep Handle ==
/// Owns a running sweep task.
///
/// `stop` ends the task after its current pass. Dropping the handle without
/// stopping aborts the task so it never outlives its owner.
#[derive(Debug)]
pub struct SweepHandle {
    name: &'static str,
    shutdown: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl SweepHandle {
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns true once the task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Signals the task and waits for it to exit.
    pub async fn stop(mut self) {
        let _ = self.shutdown.send(true);
        if let Some(task) = self.task.take() {
            if let Err(err) = task.await {
                error!("Sweep task for {} ended abnormally: {}", self.name, err);
            }
        }
        info!("Sweep task for {} stopped", self.name);
    }
}

impl Drop for SweepHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Spawns a task that sweeps `store` every `interval`.
///
/// A pass that panics is logged and the loop carries on with the next tick.
///
/// # Example
/// ```ignore
/// let store = Arc::new(CacheStore::<String>::new(Duration::from_secs(120), 0, 0));
/// let handle = spawn_sweep_task("query_cache", store.clone(), Duration::from_secs(300));
/// // Later, during shutdown:
/// handle.stop().await;
/// ```
pub fn spawn_sweep_task<V>(
    name: &'static str,
    store: Arc<CacheStore<V>>,
    interval: Duration,
) -> SweepHandle
where
    V: EstimateSize + Send + Sync + 'static,
{
    let (shutdown, mut shutdown_rx) = watch::channel(false);

    let task = tokio::spawn(async move {
        info!(
            "Starting sweep task for {} with interval of {:?}",
            name, interval
        );

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; skip it so the first pass
        // happens one interval after start.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match panic::catch_unwind(AssertUnwindSafe(|| store.sweep())) {
                        Ok(0) => debug!("Sweep of {}: no expired entries found", name),
                        Ok(removed) => info!("Sweep of {}: removed {} expired entries", name, removed),
                        Err(_) => error!("Sweep of {} panicked; continuing", name),
                    }
                }
                changed = shutdown_rx.changed() => {
                    // Either a stop signal or the handle was dropped.
                    if changed.is_err() || *shutdown_rx.borrow() {
                        break;
                    }
                }
            }
        }
    });

    SweepHandle {
        name,
        shutdown,
        task: Some(task),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> Arc<CacheStore<String>> {
        Arc::new(CacheStore::new(Duration::from_secs(300), 100, 0))
    }

    #[tokio::test]
    async fn test_sweep_task_removes_expired_entries() {
        let cache = store();
        let _ = cache.set("expire_soon", "value".to_string(), Duration::from_millis(20));

        let handle = spawn_sweep_task("test", cache.clone(), Duration::from_millis(50));

        tokio::time::sleep(Duration::from_millis(250)).await;

        assert_eq!(cache.stats().total_items, 0, "Expired entry should have been swept");
        assert_eq!(cache.memory_used_bytes(), 0);

        handle.stop().await;
    }

    #[tokio::test]
    async fn test_sweep_task_preserves_valid_entries() {
        let cache = store();
        let _ = cache.set("long_lived", "value".to_string(), Duration::from_secs(3600));

        let handle = spawn_sweep_task("test", cache.clone(), Duration::from_millis(50));

        tokio::time::sleep(Duration::from_millis(200)).await;

        assert_eq!(cache.get("long_lived").as_deref(), Some("value"));

        handle.stop().await;
    }

    #[tokio::test]
    async fn test_sweep_task_stops_on_signal() {
        let handle = spawn_sweep_task("test", store(), Duration::from_secs(3600));
        assert!(!handle.is_finished());
        assert_eq!(handle.name(), "test");

        tokio::time::timeout(Duration::from_secs(1), handle.stop())
            .await
            .expect("stop should not wait for the next tick");
    }

    #[tokio::test]
    async fn test_sweep_task_aborted_on_drop() {
        let cache = store();
        let handle = spawn_sweep_task("test", cache.clone(), Duration::from_millis(10));
        drop(handle);

        tokio::time::sleep(Duration::from_millis(50)).await;

        // The task held the only other reference to the store.
        assert_eq!(Arc::strong_count(&cache), 1);
    }
}
