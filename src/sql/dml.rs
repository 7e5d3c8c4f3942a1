use crate::job::JobState;

/// The single indivisible select-and-claim statement.
///
/// Two workers racing on the same eligible job are serialized by the row
/// lock; `SKIP LOCKED` sends the loser to the next candidate instead of
/// blocking, so at most one of them ever sees a given job.
pub(crate) fn claim_job(schema: &str) -> String {
    format!(
        r#"
        WITH next AS (
            SELECT id FROM {schema}.job
            WHERE state = '{0}' AND run_at <= now()
            ORDER BY priority DESC, created_at, id
            LIMIT 1
            FOR UPDATE
            SKIP LOCKED
        )
        UPDATE {schema}.job j SET
            state = '{1}',
            updated_at = now()
        FROM next
        WHERE j.id = next.id
        RETURNING j.id, j.command, j.state::text AS state, j.attempts, j.max_retries,
            j.priority, j.run_at, j.timeout_ms, j.output, j.error, j.created_at, j.updated_at;
        "#,
        JobState::Pending,    // 0
        JobState::Processing, // 1
    )
}

pub(crate) fn insert_job(schema: &str) -> String {
    format!(
        "
        INSERT INTO {schema}.job (id, command, state, attempts, max_retries, priority, run_at, timeout_ms, created_at, updated_at)
        VALUES ($1, $2, '{}', 0, $3, $4, $5, $6, $7, $7)
        ON CONFLICT (id) DO NOTHING;
        ",
        JobState::Pending
    )
}

pub(crate) fn update_job(schema: &str) -> String {
    format!(
        "
        UPDATE {schema}.job SET
            state = $2::{schema}.job_state,
            attempts = $3,
            run_at = COALESCE($4, run_at),
            output = $5,
            error = $6,
            updated_at = now()
        WHERE id = $1;
        "
    )
}

pub(crate) fn get_job(schema: &str) -> String {
    format!(
        "
        SELECT id, command, state::text AS state, attempts, max_retries,
            priority, run_at, timeout_ms, output, error, created_at, updated_at
        FROM {schema}.job
        WHERE id = $1;
        "
    )
}

pub(crate) fn list_jobs(schema: &str) -> String {
    format!(
        "
        SELECT id, command, state::text AS state, attempts, max_retries,
            priority, run_at, timeout_ms, output, error, created_at, updated_at
        FROM {schema}.job
        WHERE $1::text IS NULL OR state::text = $1
        ORDER BY created_at, id;
        "
    )
}

pub(crate) fn count_jobs(schema: &str) -> String {
    format!(
        "
        SELECT state::text AS state, COUNT(*) AS count
        FROM {schema}.job
        GROUP BY state;
        "
    )
}

pub(crate) fn requeue_dead(schema: &str) -> String {
    format!(
        "
        UPDATE {schema}.job SET
            state = '{}',
            attempts = 0,
            run_at = now(),
            updated_at = now()
        WHERE id = $1 AND state = '{}';
        ",
        JobState::Pending,
        JobState::Dead,
    )
}

pub(crate) fn get_config(schema: &str) -> String {
    format!("SELECT value FROM {schema}.config WHERE key = $1;")
}

/// Upsert a config value; `inserted` tells apart a fresh row (xmax = 0)
/// from an overwrite.
pub(crate) fn set_config(schema: &str) -> String {
    format!(
        "
        INSERT INTO {schema}.config (key, value) VALUES ($1, $2)
        ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = now()
        RETURNING (xmax = 0) AS inserted;
        "
    )
}
