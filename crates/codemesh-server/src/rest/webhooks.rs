use std::str::FromStr;

use axum::extract::{Path, State};
use axum::Json;
use uuid::Uuid;

use codemesh_core::enums::SourceKind;
use codemesh_core::error::CoreError;
use codemesh_core::ids::SourceId;
use codemesh_core::model::IndexRun;

use crate::error::ApiError;
use crate::state::AppState;

/// Entry point for source-control/CI push notifications. Unlike the
/// direct `/index-runs` trigger, this submits
/// through the orchestrator's queue when one is configured, so a burst
/// of pushes doesn't pile up synchronous requests on this handler.
pub async fn receive_webhook(
    State(state): State<AppState>,
    Path((source_kind, source_id)): Path<(String, Uuid)>,
) -> Result<Json<IndexRun>, ApiError> {
    let expected_kind = SourceKind::from_str(&source_kind)
        .map_err(|_| ApiError::Core(CoreError::Validation(format!("unknown source kind: {source_kind}"))))?;

    let source = state.store.get_source(SourceId(source_id)).await?;
    if source.kind != expected_kind {
        return Err(ApiError::Core(CoreError::Validation(format!(
            "source {source_id} is of kind {}, not {source_kind}",
            source.kind
        ))));
    }

    let project = state.store.get_project(source.project_id).await?;
    let run = state.orchestrator.submit(&project, &source).await?;
    Ok(Json(run))
}
