use crate::job::JobState;

pub(super) fn create_schema(schema: &str) -> String {
    format!("CREATE SCHEMA IF NOT EXISTS {};", schema)
}

pub(super) fn create_job_state_enum(schema: &str) -> String {
    format!(
        "
        DO $$
        BEGIN
            IF NOT EXISTS (SELECT 1 FROM pg_type typ INNER JOIN pg_namespace nsp on (typ.typnamespace = nsp.oid) where typ.typname = 'job_state' AND nsp.nspname = '{schema}') THEN
                CREATE TYPE {schema}.job_state AS ENUM ('{}', '{}', '{}', '{}');
            END IF;
        END $$;
        ",
        JobState::Pending,
        JobState::Processing,
        JobState::Completed,
        JobState::Dead,
    )
}

pub(super) fn create_job_table(schema: &str) -> String {
    format!(
        "
        CREATE TABLE IF NOT EXISTS {schema}.job (
            id text not null,
            command text not null,
            state {schema}.job_state not null default('{}'),
            attempts integer not null default(0),
            max_retries integer,
            priority integer not null default(0),
            run_at timestamp with time zone not null default now(),
            timeout_ms bigint,
            output text,
            error text,
            created_at timestamp with time zone not null default now(),
            updated_at timestamp with time zone not null default now(),
            PRIMARY KEY (id)
        );
        ",
        JobState::Pending
    )
}

pub(super) fn create_claim_index(schema: &str) -> String {
    format!(
        "
        CREATE INDEX IF NOT EXISTS job_claim_idx ON {schema}.job (run_at)
        INCLUDE (priority, created_at)
        WHERE state = '{}';
        ",
        JobState::Pending
    )
}

pub(super) fn create_config_table(schema: &str) -> String {
    format!(
        "
        CREATE TABLE IF NOT EXISTS {schema}.config (
            key text not null,
            value text not null,
            created_at timestamp with time zone not null default now(),
            updated_at timestamp with time zone not null default now(),
            PRIMARY KEY (key)
        );
        "
    )
}
