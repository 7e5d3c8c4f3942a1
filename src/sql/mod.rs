pub(crate) mod ddl;
pub(crate) mod dml;

fn locked<I>(schema: &str, stmts: I) -> String
where
    I: IntoIterator<Item = String>,
{
    format!(
        "
        BEGIN;
        SET LOCAL lock_timeout = '30s';
        SET LOCAL idle_in_transaction_session_timeout = '30s';
        SELECT pg_advisory_xact_lock(('x' || encode(sha224((current_database() || '.shellq.{schema}')::bytea), 'hex'))::bit(64)::bigint);
        {};
        COMMIT;
        ",
        stmts.into_iter().collect::<Vec<_>>().join("\n"),
    )
}

pub(crate) fn install_app(schema: &str) -> String {
    locked(
        schema,
        [
            ddl::create_schema(schema),
            ddl::create_job_state_enum(schema),
            ddl::create_job_table(schema),
            ddl::create_claim_index(schema),
            ddl::create_config_table(schema),
        ],
    )
}
