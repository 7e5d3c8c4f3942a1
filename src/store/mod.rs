use async_trait::async_trait;

use crate::job::{Job, JobState, JobUpdate, StateCounts};
use crate::Error;

pub(crate) mod memory;
pub(crate) mod postgres;

pub use memory::MemoryStore;

/// Whether [`Store::set_config`] created the key or overwrote it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigUpsert {
    Inserted,
    Updated,
}

/// Contract over the durable record store.
///
/// The store is the single synchronization point between workers: all
/// mutual exclusion is delegated to its atomic conditional updates, so
/// an implementation must make [`Store::claim_next`] and
/// [`Store::requeue_dead`] single indivisible operations, never a read
/// followed by a separate write.
#[async_trait]
pub trait Store: Send + Sync {
    /// Atomically pick and claim the next eligible job.
    ///
    /// Among jobs with `state = pending` and `run_at <= now`, selects the
    /// one with the highest `priority`, breaking ties by earliest
    /// `created_at`, transitions it to `processing`, and returns the
    /// post-update record. `Ok(None)` means nothing is eligible right now.
    async fn claim_next(&self) -> Result<Option<Job>, Error>;

    /// Insert a new job, rejecting duplicates.
    ///
    /// Returns [`Error::DuplicateId`] (leaving the existing record
    /// untouched) if a job with this ID already exists.
    async fn insert(&self, job: &Job) -> Result<(), Error>;

    /// Persist a resolved outcome for the job with this ID.
    async fn update(&self, id: &str, update: &JobUpdate) -> Result<(), Error>;

    /// Fetch a single job by ID.
    async fn get(&self, id: &str) -> Result<Option<Job>, Error>;

    /// List jobs, optionally filtered by state, oldest first.
    async fn list(&self, state: Option<JobState>) -> Result<Vec<Job>, Error>;

    /// Number of jobs per state.
    async fn count_by_state(&self) -> Result<StateCounts, Error>;

    /// Atomically move a `dead` job back to `pending`, resetting its
    /// attempts and making it claimable immediately.
    ///
    /// Returns `false` if there is no job with this ID in `dead` state.
    async fn requeue_dead(&self, id: &str) -> Result<bool, Error>;

    /// Read a runtime config value.
    async fn get_config(&self, key: &str) -> Result<Option<String>, Error>;

    /// Write a runtime config value.
    async fn set_config(&self, key: &str, value: &str) -> Result<ConfigUpsert, Error>;
}
