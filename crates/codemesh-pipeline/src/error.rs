//! Pipeline-crate error taxonomy: wraps the lower crates' errors so a
//! stage can fail with one enum, regardless of which collaborator
//! raised it. `codemesh-server`/`codemesh-mcp` callers only ever see
//! `CoreError` via the `From` impl below.

use thiserror::Error;

use codemesh_core::CoreError;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("store error: {0}")]
    Store(#[from] codemesh_store::StoreError),

    #[error("ai bridge error: {0}")]
    Ai(#[from] codemesh_ai::AiError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ingestion cancelled")]
    Cancelled,

    #[error("project {0} already has a running index run")]
    AlreadyRunning(codemesh_core::ids::ProjectId),

    #[error("source {0} has no materializer available for its kind")]
    UnsupportedSource(codemesh_core::ids::SourceId),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<PipelineError> for CoreError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Store(e) => e.into(),
            PipelineError::Ai(e) => e.into(),
            PipelineError::Cancelled => CoreError::PreconditionFailed("index run cancelled".to_string()),
            PipelineError::AlreadyRunning(id) => {
                CoreError::PreconditionFailed(format!("project {id} already has a running index run"))
            }
            PipelineError::UnsupportedSource(id) => {
                CoreError::Validation(format!("unsupported source kind for source {id}"))
            }
            PipelineError::Io(e) => CoreError::Internal(anyhow::anyhow!(e)),
            PipelineError::Internal(e) => CoreError::Internal(e),
        }
    }
}
