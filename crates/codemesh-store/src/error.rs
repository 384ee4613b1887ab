use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("edge references a symbol outside its project: {0}")]
    InvalidEdgeScope(String),
}

impl From<StoreError> for codemesh_core::CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(msg) => codemesh_core::CoreError::NotFound(msg),
            StoreError::InvalidEdgeScope(msg) => codemesh_core::CoreError::Validation(msg),
            other => codemesh_core::CoreError::ExternalDependency(other.to_string()),
        }
    }
}
