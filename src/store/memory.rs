use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use super::{ConfigUpsert, Store};
use crate::job::{Job, JobState, JobUpdate, StateCounts};
use crate::Error;

/// In-memory [`Store`] implementation.
///
/// Useful for tests and single-process embedding. Every operation runs
/// under one mutex guard, which makes each of them atomic with respect
/// to concurrent workers.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    jobs: HashMap<String, Job>,
    config: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().expect("store mutex poisoned")
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn claim_next(&self) -> Result<Option<Job>, Error> {
        let now = Utc::now();
        let mut inner = self.lock();
        let next = inner
            .jobs
            .values()
            .filter(|j| j.state == JobState::Pending && j.run_at <= now)
            .min_by(|a, b| {
                b.priority
                    .cmp(&a.priority)
                    .then(a.created_at.cmp(&b.created_at))
                    .then(a.id.cmp(&b.id))
            })
            .map(|j| j.id.clone());
        Ok(next.map(|id| {
            let job = inner.jobs.get_mut(&id).expect("job just selected");
            job.state = JobState::Processing;
            job.updated_at = now;
            job.clone()
        }))
    }

    async fn insert(&self, job: &Job) -> Result<(), Error> {
        let mut inner = self.lock();
        if inner.jobs.contains_key(&job.id) {
            return Err(Error::DuplicateId { id: job.id.clone() });
        }
        inner.jobs.insert(job.id.clone(), job.clone());
        Ok(())
    }

    async fn update(&self, id: &str, update: &JobUpdate) -> Result<(), Error> {
        let mut inner = self.lock();
        if let Some(job) = inner.jobs.get_mut(id) {
            job.state = update.state;
            job.attempts = update.attempts;
            if let Some(run_at) = update.run_at {
                job.run_at = run_at;
            }
            job.output = update.output.clone();
            job.error = update.error.clone();
            job.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<Job>, Error> {
        Ok(self.lock().jobs.get(id).cloned())
    }

    async fn list(&self, state: Option<JobState>) -> Result<Vec<Job>, Error> {
        let inner = self.lock();
        let mut jobs: Vec<Job> = inner
            .jobs
            .values()
            .filter(|j| state.map_or(true, |s| j.state == s))
            .cloned()
            .collect();
        jobs.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(jobs)
    }

    async fn count_by_state(&self) -> Result<StateCounts, Error> {
        let inner = self.lock();
        let mut counts = StateCounts::default();
        for job in inner.jobs.values() {
            match job.state {
                JobState::Pending => counts.pending += 1,
                JobState::Processing => counts.processing += 1,
                JobState::Completed => counts.completed += 1,
                JobState::Dead => counts.dead += 1,
            }
        }
        Ok(counts)
    }

    async fn requeue_dead(&self, id: &str) -> Result<bool, Error> {
        let now = Utc::now();
        let mut inner = self.lock();
        match inner.jobs.get_mut(id) {
            Some(job) if job.state == JobState::Dead => {
                job.state = JobState::Pending;
                job.attempts = 0;
                job.run_at = now;
                job.updated_at = now;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn get_config(&self, key: &str) -> Result<Option<String>, Error> {
        Ok(self.lock().config.get(key).cloned())
    }

    async fn set_config(&self, key: &str, value: &str) -> Result<ConfigUpsert, Error> {
        let mut inner = self.lock();
        match inner.config.insert(key.to_string(), value.to_string()) {
            None => Ok(ConfigUpsert::Inserted),
            Some(_) => Ok(ConfigUpsert::Updated),
        }
    }
}
