use std::str::FromStr;
use std::time::Duration;

use crate::store::Store;

/// Process-wide tunables for the worker pool.
///
/// Loaded once at pool startup from the store's config collaborator and
/// passed by value into every worker; there is no hot-reload. Per-job
/// overrides on [`Job`](crate::Job) take precedence over these values.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Retry ceiling for jobs without a per-job override.
    pub max_retries: i32,

    /// Base of the exponential backoff: a failed job becomes eligible
    /// again after `backoff_base ^ attempts` seconds.
    pub backoff_base: u32,

    /// Execution time bound for jobs without a per-job override.
    pub job_timeout: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        RuntimeConfig {
            max_retries: 3,
            backoff_base: 2,
            job_timeout: Duration::from_millis(30_000),
        }
    }
}

impl RuntimeConfig {
    /// Load the config from the store.
    ///
    /// Recognized keys: `max_retries`, `backoff_base`, and `job_timeout`
    /// (milliseconds). A missing key uses the built-in default; an
    /// unreadable or unparsable value also falls back to the default,
    /// with a warning so the fallback is observable.
    pub async fn load(store: &dyn Store) -> Self {
        let defaults = Self::default();
        RuntimeConfig {
            max_retries: lookup(store, "max_retries")
                .await
                .unwrap_or(defaults.max_retries),
            backoff_base: lookup(store, "backoff_base")
                .await
                .unwrap_or(defaults.backoff_base),
            job_timeout: lookup::<u64>(store, "job_timeout")
                .await
                .map(Duration::from_millis)
                .unwrap_or(defaults.job_timeout),
        }
    }
}

async fn lookup<T>(store: &dyn Store, key: &str) -> Option<T>
where
    T: FromStr,
{
    match store.get_config(key).await {
        Ok(Some(raw)) => match raw.parse::<T>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(key, value = %raw, "unparsable config value, using default");
                None
            }
        },
        Ok(None) => None,
        Err(e) => {
            tracing::warn!(key, error = %e, "config lookup failed, using default");
            None
        }
    }
}
