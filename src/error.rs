use thiserror::Error as ThisError;

/// Failure taxonomy for every repository and aggregator operation: either a
/// referenced record is absent, or the underlying store call failed.
#[derive(Debug, ThisError)]
pub enum Error {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },
    #[error("Store error, cause: {0}")]
    Store(#[from] sqlx::Error),
    #[error("Migration error, cause: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

impl Error {
    pub(crate) fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Error::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}
