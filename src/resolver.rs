use chrono::{DateTime, Duration, Utc};

use crate::config::RuntimeConfig;
use crate::executor::ExecutionResult;
use crate::job::{Job, JobState, JobUpdate};

/// Apply the retry/backoff/DLQ state machine to one finished attempt.
///
/// Pure function of (current job, execution result): the caller persists
/// the returned update. `now` is injected so the backoff arithmetic is
/// exactly testable.
///
/// The attempt counter is bumped exactly once here, success or failure.
/// A failed job goes back to `pending` with `run_at` pushed out by
/// `backoff_base ^ attempts` seconds, until the retry ceiling is reached,
/// at which point it is parked in `dead`. The formula has no jitter and
/// no upper cap.
pub(crate) fn resolve(
    job: &Job,
    result: &ExecutionResult,
    config: &RuntimeConfig,
    now: DateTime<Utc>,
) -> JobUpdate {
    let attempts = job.attempts + 1;
    let output = (!result.stdout.is_empty()).then(|| result.stdout.clone());
    let error = compose_error(result);

    if result.is_success() {
        return JobUpdate {
            state: JobState::Completed,
            attempts,
            run_at: None,
            output,
            error,
        };
    }

    let ceiling = job.max_retries.unwrap_or(config.max_retries);
    if attempts < ceiling {
        let delay = (config.backoff_base as i64).saturating_pow(attempts as u32);
        JobUpdate {
            state: JobState::Pending,
            attempts,
            run_at: Some(now + Duration::seconds(delay)),
            output,
            error,
        }
    } else {
        JobUpdate {
            state: JobState::Dead,
            attempts,
            run_at: None,
            output,
            error,
        }
    }
}

/// The persisted `error` field: captured stderr, prefixed with the
/// failure reason when the attempt failed.
fn compose_error(result: &ExecutionResult) -> Option<String> {
    match (&result.failure, result.stderr.is_empty()) {
        (None, true) => None,
        (None, false) => Some(result.stderr.clone()),
        (Some(reason), true) => Some(reason.clone()),
        (Some(reason), false) => Some(format!("{}: {}", reason, result.stderr)),
    }
}
