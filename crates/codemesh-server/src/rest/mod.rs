//! REST surface: `/api/v1/projects[/{slug}]`, `/sources`,
//! `/index-runs`, `/symbols/{id}` with its sub-resources, and
//! `/webhooks/{source_kind}/{source_id}`.

mod projects;
mod symbols;
mod webhooks;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/projects", get(projects::list_projects).post(projects::create_project))
        .route("/projects/:slug", get(projects::get_project))
        .route(
            "/projects/:slug/sources",
            get(projects::list_sources).post(projects::create_source),
        )
        .route(
            "/projects/:slug/index-runs",
            get(projects::list_index_runs).post(projects::trigger_index_run),
        )
        .route("/index-runs/:id", get(projects::get_index_run))
        .route("/symbols", get(symbols::search_symbols))
        .route("/symbols/:id", get(symbols::get_symbol))
        .route("/symbols/:id/references", get(symbols::references))
        .route("/symbols/:id/lineage", get(symbols::lineage))
        .route("/symbols/:id/impact", get(symbols::impact))
        .route("/symbols/:id/column-lineage", get(symbols::column_lineage))
        .route(
            "/webhooks/:source_kind/:source_id",
            post(webhooks::receive_webhook),
        )
}
