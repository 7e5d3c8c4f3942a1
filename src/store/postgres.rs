use async_trait::async_trait;
use sqlx::postgres::PgPool;

use super::{ConfigUpsert, Store};
use crate::job::{Job, JobState, JobUpdate, StateCounts};
use crate::stmt::Stmt;
use crate::{sql, Error};

/// PostgreSQL-backed [`Store`].
///
/// All tables live in a dedicated schema; the claim and requeue
/// operations are single statements, so their atomicity is the
/// database's, not ours.
#[derive(Debug, Clone)]
pub(crate) struct PgStore {
    pool: PgPool,
    stmt: Stmt,
}

impl PgStore {
    /// Install the schema (idempotent, advisory-locked) and compile the
    /// statements for it.
    pub(crate) async fn new(pool: PgPool, schema: &str) -> Result<Self, sqlx::Error> {
        let ddl = sql::install_app(schema);
        sqlx::raw_sql(&ddl).execute(&pool).await?;
        Ok(PgStore {
            pool,
            stmt: Stmt::for_schema(schema),
        })
    }
}

#[async_trait]
impl Store for PgStore {
    async fn claim_next(&self) -> Result<Option<Job>, Error> {
        let maybe_job: Option<Job> = sqlx::query_as(&self.stmt.claim_job)
            .fetch_optional(&self.pool)
            .await?;
        Ok(maybe_job)
    }

    async fn insert(&self, job: &Job) -> Result<(), Error> {
        let result = sqlx::query(&self.stmt.insert_job)
            .bind(&job.id)
            .bind(&job.command)
            .bind(job.max_retries)
            .bind(job.priority)
            .bind(job.run_at)
            .bind(job.timeout.map(|t| t.as_millis() as i64))
            .bind(job.created_at)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::DuplicateId { id: job.id.clone() });
        }
        Ok(())
    }

    async fn update(&self, id: &str, update: &JobUpdate) -> Result<(), Error> {
        sqlx::query(&self.stmt.update_job)
            .bind(id)
            .bind(update.state.to_string())
            .bind(update.attempts)
            .bind(update.run_at)
            .bind(&update.output)
            .bind(&update.error)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<Job>, Error> {
        let maybe_job: Option<Job> = sqlx::query_as(&self.stmt.get_job)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(maybe_job)
    }

    async fn list(&self, state: Option<JobState>) -> Result<Vec<Job>, Error> {
        let jobs: Vec<Job> = sqlx::query_as(&self.stmt.list_jobs)
            .bind(state.map(|s| s.to_string()))
            .fetch_all(&self.pool)
            .await?;
        Ok(jobs)
    }

    async fn count_by_state(&self) -> Result<StateCounts, Error> {
        let rows: Vec<(String, i64)> = sqlx::query_as(&self.stmt.count_jobs)
            .fetch_all(&self.pool)
            .await?;
        let mut counts = StateCounts::default();
        for (state, count) in rows {
            let count = count.max(0) as u64;
            match JobState::try_from(state) {
                Ok(JobState::Pending) => counts.pending = count,
                Ok(JobState::Processing) => counts.processing = count,
                Ok(JobState::Completed) => counts.completed = count,
                Ok(JobState::Dead) => counts.dead = count,
                Err(e) => tracing::warn!(error = %e, "unexpected state in counts"),
            }
        }
        Ok(counts)
    }

    async fn requeue_dead(&self, id: &str) -> Result<bool, Error> {
        let result = sqlx::query(&self.stmt.requeue_dead)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn get_config(&self, key: &str) -> Result<Option<String>, Error> {
        let value: Option<String> = sqlx::query_scalar(&self.stmt.get_config)
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(value)
    }

    async fn set_config(&self, key: &str, value: &str) -> Result<ConfigUpsert, Error> {
        let inserted: bool = sqlx::query_scalar(&self.stmt.set_config)
            .bind(key)
            .bind(value)
            .fetch_one(&self.pool)
            .await?;
        Ok(if inserted {
            ConfigUpsert::Inserted
        } else {
            ConfigUpsert::Updated
        })
    }
}
