mod client;
mod config;
mod error;
mod executor;
mod job;
mod pool;
mod resolver;
mod sql;
mod stmt;
mod store;
mod utils;
mod worker;

pub use client::{Client, ClientBuilder, Status};
pub use config::RuntimeConfig;
pub use error::Error;
pub use executor::{ExecOutcome, ExecutionResult, Executor, ExitInfo, ShellExecutor};
pub use job::{Job, JobLog, JobSpec, JobSpecBuilder, JobState, JobUpdate, StateCounts};
pub use pool::{PoolInfo, PoolOptions, WorkerPool};
pub use store::{ConfigUpsert, MemoryStore, Store};

pub(crate) const DEFAULT_SCHEMA: &str = "shellq";

/// Config key under which the worker pool records its liveness.
pub(crate) const POOL_STATE_KEY: &str = "pool.state";
