use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use shellq::{
    Client, JobState, MemoryStore, PoolOptions, RuntimeConfig, ShellExecutor, Store, WorkerPool,
};

pub(crate) fn memory_client() -> (Client, Arc<dyn Store>) {
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    (Client::with_store(store.clone()), store)
}

/// A pool tuned for tests: tight polling, zero backoff delay so retries
/// are immediately eligible.
pub(crate) fn fast_pool(store: Arc<dyn Store>) -> WorkerPool {
    let config = RuntimeConfig {
        backoff_base: 0,
        ..Default::default()
    };
    WorkerPool::with_options(
        store,
        Arc::new(ShellExecutor),
        config,
        PoolOptions {
            poll_interval: Duration::from_millis(20),
            shutdown_timeout: Duration::from_secs(5),
        },
    )
}

pub(crate) async fn wait_until<F, Fut>(mut probe: F, timeout: Duration) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if probe().await {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

pub(crate) async fn wait_for_state(client: &Client, id: &str, state: JobState) -> bool {
    wait_until(
        || async {
            client
                .get_job(id)
                .await
                .ok()
                .flatten()
                .map(|j| j.state == state)
                .unwrap_or(false)
        },
        Duration::from_secs(10),
    )
    .await
}

/// Scratch file for commands that need cross-attempt state.
pub(crate) fn scratch_path(name: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("shellq-test-{}-{}", std::process::id(), name));
    let _ = std::fs::remove_file(&path);
    path
}
