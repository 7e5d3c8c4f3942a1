use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgRow, FromRow, Row};
use std::time::Duration;

/// State of a job in the queue.
///
/// `pending` and `processing` are the working states; `completed` and
/// `dead` are terminal for the engine and only revisited by manual
/// operations such as [`Client::requeue_dead`](crate::Client::requeue_dead).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    /// Waiting to be claimed once `run_at` has passed.
    Pending,

    /// Claimed by exactly one worker which is executing it.
    Processing,

    /// Finished successfully.
    Completed,

    /// Exhausted its retries; parked in the dead letter queue.
    Dead,
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Dead => "dead",
        };
        write!(f, "{}", s)
    }
}

impl TryFrom<String> for JobState {
    type Error = String;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "dead" => Ok(Self::Dead),
            other => Err(format!("Unsupported job state: {}", other)),
        }
    }
}

/// A job record as persisted in the store.
#[derive(Debug, Clone, Serialize)]
pub struct Job {
    /// Client-supplied unique ID.
    pub id: String,

    /// Shell command handed to the executor, opaque to the engine.
    pub command: String,

    /// Current state.
    pub state: JobState,

    /// Number of execution attempts so far.
    pub attempts: i32,

    /// Per-job retry ceiling; `None` defers to the runtime config.
    pub max_retries: Option<i32>,

    /// Higher numbers are claimed first.
    pub priority: i32,

    /// The job is not eligible for claiming before this time.
    ///
    /// Carries both the initial schedule and the retry backoff delay.
    pub run_at: DateTime<Utc>,

    /// Per-job execution time bound; `None` defers to the runtime config.
    pub timeout: Option<Duration>,

    /// Stdout captured on the last attempt.
    pub output: Option<String>,

    /// Stderr (and failure reason, if any) captured on the last attempt.
    pub error: Option<String>,

    /// Date and time when this job was enqueued. FIFO tie-break.
    pub created_at: DateTime<Utc>,

    /// Date and time when this job was last touched.
    pub updated_at: DateTime<Utc>,
}

impl FromRow<'_, PgRow> for Job {
    fn from_row(row: &PgRow) -> sqlx::Result<Self> {
        let id: String = row.try_get("id")?;
        let command: String = row.try_get("command")?;
        let state: JobState = row.try_get("state").and_then(|v: String| {
            JobState::try_from(v).map_err(|e| sqlx::Error::ColumnDecode {
                index: "state".to_string(),
                source: e.into(),
            })
        })?;
        let attempts: i32 = row.try_get("attempts")?;
        let max_retries: Option<i32> = row.try_get("max_retries")?;
        let priority: i32 = row.try_get("priority")?;
        let run_at: DateTime<Utc> = row.try_get("run_at")?;
        let timeout: Option<Duration> =
            row.try_get("timeout_ms")
                .and_then(|v: Option<i64>| match v {
                    None => Ok(None),
                    Some(v) if v >= 0 => Ok(Some(Duration::from_millis(v as u64))),
                    Some(_) => Err(sqlx::Error::ColumnDecode {
                        index: "timeout_ms".to_string(),
                        source: "'timeout_ms' should be non-negative".into(),
                    }),
                })?;
        let output: Option<String> = row.try_get("output")?;
        let error: Option<String> = row.try_get("error")?;
        let created_at: DateTime<Utc> = row.try_get("created_at")?;
        let updated_at: DateTime<Utc> = row.try_get("updated_at")?;
        Ok(Job {
            id,
            command,
            state,
            attempts,
            max_retries,
            priority,
            run_at,
            timeout,
            output,
            error,
            created_at,
            updated_at,
        })
    }
}

/// A job to be enqueued.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobSpec {
    /// Client-supplied unique ID. Required.
    pub id: Option<String>,

    /// Shell command to run. Required.
    pub command: String,

    /// Higher numbers are claimed first.
    pub priority: i32,

    /// Per-job retry ceiling.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<i32>,

    /// Do not run before this time. Defaults to "now".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_at: Option<DateTime<Utc>>,

    /// Per-job execution time bound.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<Duration>,
}

impl JobSpec {
    /// Create an instance of [`JobSpecBuilder`].
    pub fn builder() -> JobSpecBuilder {
        JobSpecBuilder::default()
    }
}

/// Builder for [`JobSpec`].
#[derive(Debug, Clone, Default)]
pub struct JobSpecBuilder {
    spec: JobSpec,
}

impl JobSpecBuilder {
    /// Job's unique ID.
    pub fn id<S>(mut self, id: S) -> Self
    where
        S: Into<String>,
    {
        self.spec.id = Some(id.into());
        self
    }

    /// Shell command to run.
    pub fn command<S>(mut self, command: S) -> Self
    where
        S: Into<String>,
    {
        self.spec.command = command.into();
        self
    }

    /// Job's priority. Higher numbers are claimed first.
    pub fn priority(mut self, priority: i32) -> Self {
        self.spec.priority = priority;
        self
    }

    /// Number of retry attempts before the job is parked in the DLQ.
    pub fn max_retries(mut self, max_retries: i32) -> Self {
        self.spec.max_retries = Some(max_retries);
        self
    }

    /// Do not run before this time.
    pub fn run_at(mut self, run_at: DateTime<Utc>) -> Self {
        self.spec.run_at = Some(run_at);
        self
    }

    /// Time to wait before the execution is killed.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.spec.timeout = Some(timeout);
        self
    }

    /// Build the [`JobSpec`].
    pub fn build(self) -> JobSpec {
        self.spec
    }
}

/// The next persisted state of a job, computed by the outcome resolver.
///
/// `output` and `error` overwrite the stored values on every attempt;
/// a `run_at` of `None` leaves the stored value as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobUpdate {
    pub state: JobState,
    pub attempts: i32,
    pub run_at: Option<DateTime<Utc>>,
    pub output: Option<String>,
    pub error: Option<String>,
}

/// Last captured output of a job.
#[derive(Debug, Clone, Serialize)]
pub struct JobLog {
    /// Stdout of the last attempt.
    pub output: Option<String>,

    /// Stderr (and failure reason) of the last attempt.
    pub error: Option<String>,
}

/// Number of jobs per state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StateCounts {
    pub pending: u64,
    pub processing: u64,
    pub completed: u64,
    pub dead: u64,
}

impl StateCounts {
    /// Total number of jobs in the system.
    pub fn total(&self) -> u64 {
        self.pending + self.processing + self.completed + self.dead
    }
}
