use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;

use crate::config::RuntimeConfig;
use crate::executor::{execute, Executor};
use crate::job::Job;
use crate::resolver::resolve;
use crate::store::Store;

/// Shared dependencies for worker loops. Immutable for the lifetime of
/// the pool that created it.
pub(crate) struct WorkerContext {
    pub(crate) store: Arc<dyn Store>,
    pub(crate) executor: Arc<dyn Executor>,
    pub(crate) config: RuntimeConfig,
    pub(crate) poll_interval: Duration,
}

/// One claim→execute→resolve loop.
///
/// The loop is Idle between jobs and Busy while one is claimed. A stop
/// signal is only observed while Idle: an in-flight execution always
/// finishes and has its outcome persisted, so a clean shutdown can never
/// strand a job in `processing`.
pub(crate) struct Worker {
    id: usize,
    ctx: Arc<WorkerContext>,
    stop: watch::Receiver<bool>,
}

impl Worker {
    pub(crate) fn new(id: usize, ctx: Arc<WorkerContext>, stop: watch::Receiver<bool>) -> Self {
        Worker { id, ctx, stop }
    }

    /// Run until stopped. Returns the worker's id so the pool supervisor
    /// can account for it.
    pub(crate) async fn run(mut self) -> usize {
        tracing::info!(worker = self.id, "worker started");
        loop {
            if *self.stop.borrow() {
                break;
            }
            match self.ctx.store.claim_next().await {
                Ok(Some(job)) => self.process(job).await,
                Ok(None) => self.idle().await,
                Err(e) => {
                    // Store unavailable: no claim happened, so there is no
                    // job state to repair. Back off and try again.
                    tracing::warn!(worker = self.id, error = %e, "claim failed, backing off");
                    self.idle().await;
                }
            }
        }
        tracing::info!(worker = self.id, "worker stopped");
        self.id
    }

    async fn idle(&mut self) {
        let poll = self.ctx.poll_interval;
        tokio::select! {
            _ = tokio::time::sleep(poll) => {}
            _ = self.stop.changed() => {}
        }
    }

    async fn process(&mut self, job: Job) {
        tracing::debug!(worker = self.id, job = %job.id, command = %job.command, "executing");
        let result = execute(self.ctx.executor.as_ref(), &job, &self.ctx.config).await;
        let update = resolve(&job, &result, &self.ctx.config, Utc::now());
        match &update.error {
            Some(error) => tracing::info!(
                worker = self.id,
                job = %job.id,
                state = %update.state,
                attempts = update.attempts,
                error = %error,
                "attempt resolved"
            ),
            None => tracing::info!(
                worker = self.id,
                job = %job.id,
                state = %update.state,
                attempts = update.attempts,
                "attempt resolved"
            ),
        }
        // The outcome must land before this worker goes idle again, even
        // through a store outage.
        loop {
            match self.ctx.store.update(&job.id, &update).await {
                Ok(()) => break,
                Err(e) => {
                    tracing::warn!(worker = self.id, job = %job.id, error = %e, "persist failed, retrying");
                    tokio::time::sleep(self.ctx.poll_interval).await;
                }
            }
        }
    }
}
