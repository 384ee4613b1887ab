//! `{"error":{"code","message"}}` wire format built from the
//! closed `CoreError`/`ErrorCode` taxonomy via `axum::response::IntoResponse`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tracing::error;

use codemesh_core::{CoreError, ErrorBody};
use codemesh_pipeline::PipelineError;
use codemesh_store::StoreError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let core: CoreError = match self {
            ApiError::Core(e) => e,
            ApiError::Store(e) => e.into(),
            ApiError::Pipeline(e) => e.into(),
        };

        let code = core.code();
        let status = StatusCode::from_u16(code.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(error = %core, "internal error");
            "an internal error occurred".to_string()
        } else {
            core.to_string()
        };

        (status, Json(ErrorBody::new(code, message))).into_response()
    }
}
