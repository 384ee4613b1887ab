//! The shared error taxonomy, used by every crate that sits above
//! `codemesh-core`. Kinds, not type names: each crate wraps `CoreError`
//! in its own error enum, but every wire/tool boundary eventually
//! reduces to one of these kinds.

use serde::Serialize;
use thiserror::Error;

/// Closed catalog of wire error codes (`{error:{code,message}}` on the REST/GraphQL surface).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ProjectNotFound,
    SourceNotFound,
    IndexRunNotFound,
    SymbolNotFound,
    InvalidSourceType,
    InvalidSlug,
    UnknownEnumValue,
    NoSources,
    SlugConflict,
    InvalidEdgeScope,
    Unauthorized,
    Forbidden,
    TenantMismatch,
    EmbeddingFailed,
    EmbedderUnavailable,
    GraphMirrorUnavailable,
    LlmUnavailable,
    QueueUnavailable,
    Internal,
}

impl ErrorCode {
    pub fn http_status(&self) -> u16 {
        match self {
            ErrorCode::ProjectNotFound
            | ErrorCode::SourceNotFound
            | ErrorCode::IndexRunNotFound
            | ErrorCode::SymbolNotFound => 404,
            ErrorCode::InvalidSourceType | ErrorCode::InvalidSlug | ErrorCode::UnknownEnumValue => {
                400
            }
            ErrorCode::NoSources | ErrorCode::SlugConflict | ErrorCode::InvalidEdgeScope => 409,
            ErrorCode::Unauthorized => 401,
            ErrorCode::Forbidden | ErrorCode::TenantMismatch => 403,
            ErrorCode::EmbeddingFailed
            | ErrorCode::EmbedderUnavailable
            | ErrorCode::GraphMirrorUnavailable
            | ErrorCode::LlmUnavailable
            | ErrorCode::QueueUnavailable => 502,
            ErrorCode::Internal => 500,
        }
    }
}

/// Core-level error kind. Every higher crate's error enum carries one of
/// these as a variant (or implements `From<CoreError>`), so a single
/// match at the API/MCP boundary is enough to produce the wire shape.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("validation: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("precondition failed: {0}")]
    PreconditionFailed(String),

    #[error("external dependency unavailable: {0}")]
    ExternalDependency(String),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl CoreError {
    pub fn code(&self) -> ErrorCode {
        match self {
            CoreError::Validation(_) => ErrorCode::UnknownEnumValue,
            CoreError::NotFound(_) => ErrorCode::ProjectNotFound,
            CoreError::Unauthorized(_) => ErrorCode::Unauthorized,
            CoreError::Forbidden(_) => ErrorCode::Forbidden,
            CoreError::PreconditionFailed(_) => ErrorCode::SlugConflict,
            CoreError::ExternalDependency(_) => ErrorCode::GraphMirrorUnavailable,
            CoreError::Internal(_) => ErrorCode::Internal,
        }
    }
}

/// Wire shape for every REST/GraphQL error response: `{error:{code,message}}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: ErrorCode,
    pub message: String,
}

impl ErrorBody {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code,
                message: message.into(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_404() {
        let err = CoreError::NotFound("project".to_string());
        assert_eq!(err.code().http_status(), 404);
    }

    #[test]
    fn internal_error_wraps_anyhow() {
        let err = CoreError::from(anyhow::anyhow!("boom"));
        assert_eq!(err.code(), ErrorCode::Internal);
        assert_eq!(err.code().http_status(), 500);
    }
}
