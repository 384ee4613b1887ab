//! HTTP server: REST, GraphQL, and a mounted MCP endpoint, all
//! sharing one [`state::AppState`].

pub mod auth;
pub mod config;
pub mod error;
pub mod graphql;
pub mod health;
pub mod mcp_mount;
pub mod rest;
pub mod state;

use axum::middleware;
use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use config::Config;
pub use state::AppState;

/// Assembles the full router: health checks unauthenticated, everything
/// else behind `auth::require_auth` when `state.auth` is configured.
pub fn build_router(state: AppState) -> Router {
    let mut api = Router::new()
        .merge(rest::router())
        .merge(graphql::router())
        .nest("/mcp", mcp_mount::router(&state));

    if state.auth.is_some() {
        api = api.layer(middleware::from_fn_with_state(state.clone(), auth::require_auth));
    }

    Router::new()
        .route("/healthz", get(health::healthz))
        .route("/readyz", get(health::readyz))
        .nest("/api/v1", api)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use codemesh_ai::TemplateSummary;
    use codemesh_core::graph::GraphMirrorRegistry;
    use codemesh_core::ids::TenantId;
    use codemesh_pipeline::Orchestrator;
    use codemesh_store::Store;
    use std::sync::Arc;

    #[tokio::test]
    #[ignore = "requires a live Postgres connection"]
    async fn router_builds_with_no_auth_configured() {
        let store = Store::connect("postgres://localhost/codemesh_test").await.unwrap();
        let graphs = Arc::new(GraphMirrorRegistry::new());
        let orchestrator = Arc::new(Orchestrator::new(store.clone(), graphs.clone()));
        let state = AppState {
            store,
            graphs,
            orchestrator,
            embedder: None,
            summarizer: Arc::new(TemplateSummary),
            config: Arc::new(Config::from_env().unwrap()),
            auth: None,
            default_tenant: TenantId::new(),
        };
        let _router = build_router(state);
    }
}
