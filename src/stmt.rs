use crate::sql::dml;

/// Statements compiled once per schema.
#[derive(Debug, Clone)]
pub(crate) struct Stmt {
    pub(crate) claim_job: String,
    pub(crate) insert_job: String,
    pub(crate) update_job: String,
    pub(crate) get_job: String,
    pub(crate) list_jobs: String,
    pub(crate) count_jobs: String,
    pub(crate) requeue_dead: String,
    pub(crate) get_config: String,
    pub(crate) set_config: String,
}

impl Stmt {
    pub(crate) fn for_schema(schema: &str) -> Self {
        Stmt {
            claim_job: dml::claim_job(schema),
            insert_job: dml::insert_job(schema),
            update_job: dml::update_job(schema),
            get_job: dml::get_job(schema),
            list_jobs: dml::list_jobs(schema),
            count_jobs: dml::count_jobs(schema),
            requeue_dead: dml::requeue_dead(schema),
            get_config: dml::get_config(schema),
            set_config: dml::set_config(schema),
        }
    }
}
