use thiserror::Error;

/// Enumerates all errors that this crate may return.
///
/// Failures of the jobs themselves are never reported through this type:
/// a command that exits non-zero or times out is absorbed into the job's
/// persisted state by the retry machinery.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Sqlx PostgreSQL driver error.
    ///
    /// Worker loops treat this as "store unavailable": they back off and
    /// retry rather than touching any job state.
    #[error("db driver error")]
    Sqlx(#[from] sqlx::Error),

    /// A job with this ID has already been enqueued.
    ///
    /// The existing record is left untouched.
    #[error("job with id '{id}' already exists")]
    DuplicateId {
        /// The rejected job ID.
        id: String,
    },

    /// The job spec is missing a required field.
    #[error("invalid job spec: {msg}")]
    InvalidSpec {
        /// Details on what exactly is missing.
        msg: &'static str,
    },

    /// No job with this ID in the expected state.
    #[error("no such job: '{id}'")]
    NotFound {
        /// The requested job ID.
        id: String,
    },
}
