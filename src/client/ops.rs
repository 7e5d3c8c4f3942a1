use chrono::Utc;

use super::{Client, Status};
use crate::job::{Job, JobLog, JobSpec, JobState};
use crate::store::ConfigUpsert;
use crate::{Error, POOL_STATE_KEY};

impl Client {
    /// Enqueue a job.
    ///
    /// Rejects specs with a missing/blank `id` or `command`
    /// ([`Error::InvalidSpec`]) and IDs that already exist
    /// ([`Error::DuplicateId`]); either way the queue is left unchanged.
    pub async fn enqueue(&self, spec: JobSpec) -> Result<String, Error> {
        let id = match spec.id {
            Some(id) if !id.trim().is_empty() => id,
            _ => {
                return Err(Error::InvalidSpec {
                    msg: "job id is required",
                })
            }
        };
        if spec.command.trim().is_empty() {
            return Err(Error::InvalidSpec {
                msg: "command is required",
            });
        }
        let now = Utc::now();
        let job = Job {
            id: id.clone(),
            command: spec.command,
            state: JobState::Pending,
            attempts: 0,
            max_retries: spec.max_retries,
            priority: spec.priority,
            run_at: spec.run_at.unwrap_or(now),
            timeout: spec.timeout,
            output: None,
            error: None,
            created_at: now,
            updated_at: now,
        };
        self.store.insert(&job).await?;
        tracing::debug!(job = %id, "job enqueued");
        Ok(id)
    }

    /// Get a job's current record, if any.
    pub async fn get_job<S>(&self, id: S) -> Result<Option<Job>, Error>
    where
        S: AsRef<str>,
    {
        self.store.get(id.as_ref()).await
    }

    /// List jobs, optionally filtered by state, oldest first.
    pub async fn list_jobs(&self, state: Option<JobState>) -> Result<Vec<Job>, Error> {
        self.store.list(state).await
    }

    /// List the dead letter queue.
    pub async fn dead_letter_jobs(&self) -> Result<Vec<Job>, Error> {
        self.store.list(Some(JobState::Dead)).await
    }

    /// Move a dead job back to `pending`, resetting its attempts and
    /// making it claimable immediately.
    ///
    /// Fails with [`Error::NotFound`] if there is no job with this ID in
    /// `dead` state.
    pub async fn requeue_dead<S>(&self, id: S) -> Result<(), Error>
    where
        S: AsRef<str>,
    {
        let id = id.as_ref();
        if self.store.requeue_dead(id).await? {
            tracing::info!(job = %id, "dead job requeued");
            Ok(())
        } else {
            Err(Error::NotFound { id: id.to_string() })
        }
    }

    /// Last captured output of a job.
    pub async fn job_log<S>(&self, id: S) -> Result<JobLog, Error>
    where
        S: AsRef<str>,
    {
        let id = id.as_ref();
        self.store
            .get(id)
            .await?
            .map(|job| JobLog {
                output: job.output,
                error: job.error,
            })
            .ok_or_else(|| Error::NotFound { id: id.to_string() })
    }

    /// Per-state counts plus the last recorded pool liveness.
    pub async fn status(&self) -> Result<Status, Error> {
        let counts = self.store.count_by_state().await?;
        let pool = match self.store.get_config(POOL_STATE_KEY).await? {
            Some(raw) => match serde_json::from_str(&raw) {
                Ok(info) => Some(info),
                Err(e) => {
                    tracing::warn!(error = %e, "unreadable pool liveness record");
                    None
                }
            },
            None => None,
        };
        Ok(Status { counts, pool })
    }

    /// Read a runtime config value.
    pub async fn get_config<S>(&self, key: S) -> Result<Option<String>, Error>
    where
        S: AsRef<str>,
    {
        self.store.get_config(key.as_ref()).await
    }

    /// Write a runtime config value.
    ///
    /// Workers pick the new value up on their next pool start.
    pub async fn set_config<K, V>(&self, key: K, value: V) -> Result<ConfigUpsert, Error>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.store.set_config(key.as_ref(), value.as_ref()).await
    }
}
