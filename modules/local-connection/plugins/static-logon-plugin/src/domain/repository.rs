//! In-memory VDB deployment tracking.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use local_connection_sdk::{
    ClientError, CommunicationError, ConnectionError, VdbKey, VdbLifecycleListener, VdbRepository,
};
use parking_lot::RwLock;
use tokio::sync::watch;

/// Tracks which VDBs are deployed and notifies listeners of changes.
pub struct InMemoryVdbRepository {
    listeners: RwLock<Vec<Arc<dyn VdbLifecycleListener>>>,
    /// VDBs that finished deployment.
    ready: watch::Sender<HashSet<VdbKey>>,
}

impl Default for InMemoryVdbRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryVdbRepository {
    #[must_use]
    pub fn new() -> Self {
        let (ready, _) = watch::channel(HashSet::new());
        Self {
            listeners: RwLock::new(Vec::new()),
            ready,
        }
    }

    /// Start deploying `vdb`.
    pub fn deploy(&self, vdb: &VdbKey) {
        tracing::debug!(vdb = %vdb, "vdb added");
        for listener in self.snapshot() {
            listener.added(vdb);
        }
    }

    /// Mark `vdb` as loaded and ready to accept sessions.
    pub fn finish_deployment(&self, vdb: &VdbKey) {
        self.ready.send_modify(|ready| {
            ready.insert(vdb.clone());
        });
        tracing::info!(vdb = %vdb, "vdb finished deployment");
        for listener in self.snapshot() {
            listener.finished_deployment(vdb);
        }
    }

    pub fn undeploy(&self, vdb: &VdbKey) {
        self.ready.send_modify(|ready| {
            ready.remove(vdb);
        });
        tracing::debug!(vdb = %vdb, "vdb removed");
        for listener in self.snapshot() {
            listener.removed(vdb);
        }
    }

    #[must_use]
    pub fn is_ready(&self, vdb: &VdbKey) -> bool {
        self.ready.borrow().contains(vdb)
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }

    /// Wait until `vdb` finished deployment.
    ///
    /// # Errors
    ///
    /// - `Connection` if `vdb` is not ready within `timeout`
    /// - `Communication` if the repository was torn down while waiting
    pub async fn wait_for_finished(&self, vdb: &VdbKey, timeout: Duration) -> Result<(), ClientError> {
        let mut ready = self.ready.subscribe();
        match tokio::time::timeout(timeout, ready.wait_for(|set| set.contains(vdb))).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(CommunicationError::with_source("vdb repository is gone", e).into()),
            Err(_) => Err(ConnectionError::new(format!(
                "VDB {vdb} is not yet deployed or is not active"
            ))
            .into()),
        }
    }

    // Listeners are called outside the lock so they may (un)register.
    fn snapshot(&self) -> Vec<Arc<dyn VdbLifecycleListener>> {
        self.listeners.read().clone()
    }
}

impl VdbRepository for InMemoryVdbRepository {
    fn add_listener(&self, listener: Arc<dyn VdbLifecycleListener>) {
        self.listeners.write().push(listener);
    }

    fn remove_listener(&self, listener: &Arc<dyn VdbLifecycleListener>) {
        self.listeners.write().retain(|l| !Arc::ptr_eq(l, listener));
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[derive(Default)]
    struct CountingListener {
        finished: AtomicUsize,
    }

    impl VdbLifecycleListener for CountingListener {
        fn finished_deployment(&self, _vdb: &VdbKey) {
            self.finished.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn sales() -> VdbKey {
        VdbKey::new("sales", Some("1".to_owned()))
    }

    #[tokio::test]
    async fn wait_returns_once_deployed() {
        let repository = Arc::new(InMemoryVdbRepository::new());

        let waiter = {
            let repository = Arc::clone(&repository);
            tokio::spawn(async move {
                repository
                    .wait_for_finished(&sales(), Duration::from_secs(5))
                    .await
            })
        };
        tokio::task::yield_now().await;
        repository.finish_deployment(&sales());

        waiter.await.unwrap().unwrap();
        assert!(repository.is_ready(&sales()));
    }

    #[tokio::test(start_paused = true)]
    async fn wait_times_out_with_connection_error() {
        let repository = InMemoryVdbRepository::new();

        let err = repository
            .wait_for_finished(&sales(), Duration::from_millis(100))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Connection(_)));
        assert!(err.to_string().contains("sales.1"));
    }

    #[test]
    fn listeners_are_notified_and_removed_by_identity() {
        let repository = InMemoryVdbRepository::new();
        let counting = Arc::new(CountingListener::default());
        let listener: Arc<dyn VdbLifecycleListener> = counting.clone();

        repository.add_listener(Arc::clone(&listener));
        repository.finish_deployment(&sales());
        assert_eq!(counting.finished.load(Ordering::SeqCst), 1);

        repository.remove_listener(&listener);
        assert_eq!(repository.listener_count(), 0);
        repository.finish_deployment(&sales());
        assert_eq!(counting.finished.load(Ordering::SeqCst), 1);
    }
}
