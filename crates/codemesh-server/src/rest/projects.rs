use std::str::FromStr;

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use codemesh_core::cancellation::Cancellation;
use codemesh_core::enums::SourceKind;
use codemesh_core::error::CoreError;
use codemesh_core::ids::{IndexRunId, SourceId};
use codemesh_core::model::{IndexRun, Project, Source};

use crate::error::ApiError;
use crate::state::AppState;

pub async fn list_projects(State(state): State<AppState>) -> Result<Json<Vec<Project>>, ApiError> {
    let projects = state.store.list_projects(state.default_tenant).await?;
    Ok(Json(projects))
}

#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    pub slug: String,
    pub name: String,
}

pub async fn create_project(
    State(state): State<AppState>,
    Json(body): Json<CreateProjectRequest>,
) -> Result<Json<Project>, ApiError> {
    if body.slug.is_empty() || !body.slug.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
        return Err(ApiError::Core(CoreError::Validation(format!(
            "invalid slug: {}",
            body.slug
        ))));
    }
    let project = state
        .store
        .create_project(state.default_tenant, &body.slug, &body.name)
        .await?;
    Ok(Json(project))
}

pub async fn get_project(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Project>, ApiError> {
    let project = state.store.get_project_by_slug(state.default_tenant, &slug).await?;
    Ok(Json(project))
}

pub async fn list_sources(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Vec<Source>>, ApiError> {
    let project = state.store.get_project_by_slug(state.default_tenant, &slug).await?;
    let sources = state.store.list_sources(project.id).await?;
    Ok(Json(sources))
}

#[derive(Debug, Deserialize)]
pub struct CreateSourceRequest {
    pub name: String,
    pub kind: String,
    #[serde(default)]
    pub connection_uri: Option<String>,
}

pub async fn create_source(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(body): Json<CreateSourceRequest>,
) -> Result<Json<Source>, ApiError> {
    let project = state.store.get_project_by_slug(state.default_tenant, &slug).await?;
    let kind = SourceKind::from_str(&body.kind)
        .map_err(|_| ApiError::Core(CoreError::Validation(format!("invalid source kind: {}", body.kind))))?;
    let source = state
        .store
        .create_source(project.id, &body.name, kind, body.connection_uri.as_deref())
        .await?;
    Ok(Json(source))
}

pub async fn list_index_runs(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Vec<IndexRun>>, ApiError> {
    let project = state.store.get_project_by_slug(state.default_tenant, &slug).await?;
    let runs = state.store.list_index_runs(project.id).await?;
    Ok(Json(runs))
}

#[derive(Debug, Deserialize, Default)]
pub struct TriggerIndexRunRequest {
    #[serde(default)]
    pub source_id: Option<Uuid>,
}

/// Triggers a new `IndexRun` synchronously against the orchestrator,
/// waiting for it to finish before responding. An external
/// webhook should prefer `/webhooks/...`, which submits through the
/// queue instead. A project with no sources cannot be indexed — that's
/// a `PreconditionFailure` (409).
pub async fn trigger_index_run(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(body): Json<TriggerIndexRunRequest>,
) -> Result<Json<IndexRun>, ApiError> {
    let project = state.store.get_project_by_slug(state.default_tenant, &slug).await?;

    let source = match body.source_id {
        Some(id) => state.store.get_source(SourceId(id)).await?,
        None => {
            let mut sources = state.store.list_sources(project.id).await?;
            sources.pop().ok_or_else(|| {
                ApiError::Core(CoreError::PreconditionFailed(format!(
                    "project {slug} has no sources configured"
                )))
            })?
        }
    };

    let run = state
        .orchestrator
        .run(&project, &source, &Cancellation::new())
        .await?;
    Ok(Json(run))
}

pub async fn get_index_run(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<IndexRun>, ApiError> {
    let run = state.store.get_index_run(IndexRunId(id)).await?;
    Ok(Json(run))
}
