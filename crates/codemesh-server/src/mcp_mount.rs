//! Mounts `codemesh_mcp::McpServer` as a Streamable-HTTP transport,
//! so agents reach the same index over MCP at `/mcp`. One
//! `McpContext` is built from the shared `AppState` at startup and
//! handed to a fresh `McpServer` per session via `StreamableHttpService`.

use axum::Router;
use rmcp::transport::streamable_http_server::session::local::LocalSessionManager;
use rmcp::transport::streamable_http_server::StreamableHttpService;

use codemesh_mcp::{McpContext, McpServer};

use crate::state::AppState;

pub fn router(state: &AppState) -> Router<AppState> {
    let store = state.store.clone();
    let graphs = state.graphs.clone();
    let embedder = state.embedder.clone();
    let summarizer = state.summarizer.clone();
    let tenant_id = state.default_tenant;

    let service = StreamableHttpService::new(
        move || {
            let mut ctx = McpContext::new(store.clone(), graphs.clone(), tenant_id).with_summarizer(summarizer.clone());
            if let Some(embedder) = embedder.clone() {
                ctx = ctx.with_embedder(embedder);
            }
            Ok(McpServer::new(ctx))
        },
        LocalSessionManager::default().into(),
        Default::default(),
    );

    Router::new().fallback_service(service)
}
