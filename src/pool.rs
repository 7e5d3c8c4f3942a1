use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{watch, Mutex};
use tokio::task::{JoinHandle, JoinSet};

use crate::config::RuntimeConfig;
use crate::executor::Executor;
use crate::store::Store;
use crate::worker::{Worker, WorkerContext};
use crate::POOL_STATE_KEY;

/// Pool tunables.
#[derive(Debug, Clone)]
pub struct PoolOptions {
    /// How long an idle worker waits before polling the store again.
    pub poll_interval: Duration,

    /// Upper bound on a graceful drain: workers still busy past this
    /// point are aborted.
    pub shutdown_timeout: Duration,
}

impl Default for PoolOptions {
    fn default() -> Self {
        PoolOptions {
            poll_interval: Duration::from_secs(2),
            shutdown_timeout: Duration::from_secs(30),
        }
    }
}

/// Durable record of the pool's liveness, kept under the store's
/// `pool.state` config key so `status()` works from other processes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolInfo {
    /// Whether the pool reported itself running.
    pub running: bool,

    /// Worker count at the last start.
    pub workers: usize,

    /// When this record was written.
    pub updated_at: DateTime<Utc>,
}

struct PoolHandle {
    stop_tx: watch::Sender<bool>,
    supervisor: JoinHandle<()>,
    workers: usize,
}

/// Owns a fixed-size set of worker loops.
///
/// Workers share nothing mutable but the store; the supervisor replaces
/// any worker that dies outside a graceful stop, keeping the pool at
/// its requested size.
pub struct WorkerPool {
    ctx: Arc<WorkerContext>,
    shutdown_timeout: Duration,
    inner: Mutex<Option<PoolHandle>>,
}

impl WorkerPool {
    pub fn new(store: Arc<dyn Store>, executor: Arc<dyn Executor>, config: RuntimeConfig) -> Self {
        Self::with_options(store, executor, config, PoolOptions::default())
    }

    pub fn with_options(
        store: Arc<dyn Store>,
        executor: Arc<dyn Executor>,
        config: RuntimeConfig,
        options: PoolOptions,
    ) -> Self {
        WorkerPool {
            ctx: Arc::new(WorkerContext {
                store,
                executor,
                config,
                poll_interval: options.poll_interval,
            }),
            shutdown_timeout: options.shutdown_timeout,
            inner: Mutex::new(None),
        }
    }

    /// Start `count` worker loops.
    ///
    /// Returns `false` (and changes nothing) if the pool is already
    /// running.
    pub async fn start(&self, count: usize) -> bool {
        let mut guard = self.inner.lock().await;
        if guard.is_some() {
            tracing::info!("pool already running");
            return false;
        }
        let (stop_tx, stop_rx) = watch::channel(false);
        let mut set = JoinSet::new();
        for id in 0..count {
            set.spawn(Worker::new(id, self.ctx.clone(), stop_rx.clone()).run());
        }
        let supervisor = tokio::spawn(supervise(set, self.ctx.clone(), stop_rx, count));
        *guard = Some(PoolHandle {
            stop_tx,
            supervisor,
            workers: count,
        });
        tracing::info!(workers = count, "pool started");
        self.record_liveness(true, count).await;
        true
    }

    /// Signal every worker to stop and wait for the pool to drain.
    ///
    /// In-flight jobs finish and have their outcomes persisted; workers
    /// still busy once the shutdown timeout elapses are aborted. Stopping
    /// an already-stopped pool is a no-op and returns `false`.
    pub async fn stop(&self) -> bool {
        let mut guard = self.inner.lock().await;
        let Some(handle) = guard.take() else {
            tracing::info!("pool already stopped");
            return false;
        };
        let _ = handle.stop_tx.send(true);
        let abort = handle.supervisor.abort_handle();
        if tokio::time::timeout(self.shutdown_timeout, handle.supervisor)
            .await
            .is_err()
        {
            tracing::warn!("shutdown timeout elapsed, aborting remaining workers");
            abort.abort();
        }
        tracing::info!("pool stopped");
        self.record_liveness(false, handle.workers).await;
        true
    }

    /// Whether the pool currently owns running workers.
    pub async fn is_running(&self) -> bool {
        self.inner.lock().await.is_some()
    }

    /// Worker count of the running pool, 0 when stopped.
    pub async fn worker_count(&self) -> usize {
        self.inner.lock().await.as_ref().map_or(0, |h| h.workers)
    }

    // Liveness is best-effort bookkeeping: the pool keeps working even
    // if the record cannot be written.
    async fn record_liveness(&self, running: bool, workers: usize) {
        let info = PoolInfo {
            running,
            workers,
            updated_at: Utc::now(),
        };
        let raw = match serde_json::to_string(&info) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(error = %e, "could not serialize pool liveness");
                return;
            }
        };
        if let Err(e) = self.ctx.store.set_config(POOL_STATE_KEY, &raw).await {
            tracing::warn!(error = %e, "could not record pool liveness");
        }
    }
}

/// Keep the pool at size: a worker that exits without being told to stop
/// is replaced with a fresh loop. A crashed worker leaves nothing
/// half-updated in the store, so no job state needs repair here.
async fn supervise(
    mut set: JoinSet<usize>,
    ctx: Arc<WorkerContext>,
    stop_rx: watch::Receiver<bool>,
    count: usize,
) {
    let mut next_id = count;
    while let Some(res) = set.join_next().await {
        if *stop_rx.borrow() {
            continue;
        }
        match res {
            Ok(worker_id) => {
                tracing::warn!(worker = worker_id, "worker exited unexpectedly, replacing");
                set.spawn(Worker::new(worker_id, ctx.clone(), stop_rx.clone()).run());
            }
            Err(e) => {
                tracing::warn!(worker = next_id, error = %e, "worker crashed, replacing");
                set.spawn(Worker::new(next_id, ctx.clone(), stop_rx.clone()).run());
                next_id += 1;
            }
        }
    }
}
