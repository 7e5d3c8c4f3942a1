use std::sync::Arc;

use serde::Serialize;

use crate::job::StateCounts;
use crate::pool::PoolInfo;
use crate::store::Store;

mod builder;
mod ops;

pub use builder::ClientBuilder;

/// Queue state as seen by monitoring callers: per-state job counts plus
/// the last durable pool liveness record, if any pool ever wrote one.
#[derive(Debug, Clone, Serialize)]
pub struct Status {
    pub counts: StateCounts,
    pub pool: Option<PoolInfo>,
}

/// Handle to the job queue.
///
/// Cheap to clone; all state lives in the store.
#[derive(Clone)]
pub struct Client {
    store: Arc<dyn Store>,
}

impl Client {
    /// Create an instance of [`ClientBuilder`].
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// Build a client over any [`Store`] implementation, e.g. a
    /// [`MemoryStore`](crate::MemoryStore) for tests and embedding.
    pub fn with_store(store: Arc<dyn Store>) -> Self {
        Client { store }
    }

    /// The underlying store, for wiring up a
    /// [`WorkerPool`](crate::WorkerPool).
    pub fn store(&self) -> Arc<dyn Store> {
        self.store.clone()
    }
}
