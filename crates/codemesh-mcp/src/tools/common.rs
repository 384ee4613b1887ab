//! Shared parameter/helper plumbing reused by every tool module.

use std::collections::HashSet;
use std::str::FromStr;

use codemesh_core::enums::Verbosity;
use codemesh_core::ids::ProjectId;
use codemesh_core::model::{Project, Symbol};
use codemesh_store::Store;
use rmcp::ErrorData as McpError;

use crate::error::store_err;
use crate::response::{symbol_card, GraphEdgeCard, SymbolCard};
use crate::server::McpContext;

pub const DEFAULT_MAX_RESPONSE_TOKENS: u32 = 4000;

pub async fn resolve_project(ctx: &McpContext, slug: &str) -> Result<Project, McpError> {
    ctx.store
        .get_project_by_slug(ctx.tenant_id, slug)
        .await
        .map_err(store_err)
}

pub fn parse_verbosity(raw: Option<&str>) -> Verbosity {
    raw.and_then(|v| Verbosity::from_str(v).ok())
        .unwrap_or_default()
}

pub fn max_tokens(raw: Option<u32>) -> u32 {
    raw.unwrap_or(DEFAULT_MAX_RESPONSE_TOKENS)
}

/// Graph degree lookup that tolerates a project with no mirror yet
/// (freshly created, never indexed) by returning zero degrees instead
/// of erroring.
pub fn degrees(ctx: &McpContext, project_id: ProjectId, symbol_id: codemesh_core::ids::SymbolId) -> (u32, u32) {
    match ctx.graphs.get(project_id) {
        Some(mirror) => (mirror.in_degree(symbol_id) as u32, mirror.out_degree(symbol_id) as u32),
        None => (0, 0),
    }
}

pub fn response_to_json(response: crate::response::ToolResponse) -> serde_json::Value {
    serde_json::to_value(response).unwrap_or(serde_json::Value::Null)
}

/// Renders a symbol card at the requested verbosity, pulling outgoing
/// edges for `standard`/`full` (dependencies) and degree counts from
/// the project's graph mirror. `source` is always `None` — the store
/// keeps a content hash for change detection, not file contents.
pub async fn build_symbol_card(
    ctx: &McpContext,
    symbol: &Symbol,
    verbosity: Verbosity,
    seen_symbols: &HashSet<String>,
) -> Result<SymbolCard, McpError> {
    let (in_degree, out_degree) = degrees(ctx, symbol.project_id, symbol.id);
    let already_examined = seen_symbols.contains(&symbol.id.to_string());

    let mut dependencies = Vec::new();
    let mut all_edges = Vec::new();

    if !already_examined && matches!(verbosity, Verbosity::Standard | Verbosity::Full) {
        let edges = ctx.store.edges_from(symbol.id).await.map_err(store_err)?;
        for edge in &edges {
            if let Ok(target) = ctx.store.get_symbol(edge.target_symbol_id).await {
                if matches!(verbosity, Verbosity::Full) {
                    all_edges.push(GraphEdgeCard {
                        source: symbol.qualified_name.clone(),
                        target: target.qualified_name.clone(),
                        edge_type: edge.edge_type.as_str().to_string(),
                        confidence: edge.metadata.confidence.unwrap_or(1.0),
                    });
                }
                dependencies.push(target.qualified_name);
            }
        }
    }

    Ok(symbol_card(
        symbol,
        verbosity,
        in_degree,
        out_degree,
        &dependencies,
        &all_edges,
        None,
        already_examined,
    ))
}

pub async fn find_symbol(
    store: &Store,
    project_id: ProjectId,
    id: Option<&str>,
    name: Option<&str>,
) -> Result<codemesh_core::model::Symbol, McpError> {
    if let Some(id) = id {
        let symbol_id = codemesh_core::ids::SymbolId::from_str(id)
            .map_err(|_| McpError::invalid_params(format!("invalid symbol id: {id}"), None))?;
        store.get_symbol(symbol_id).await.map_err(store_err)
    } else if let Some(name) = name {
        store.find_symbol_by_name(project_id, name).await.map_err(store_err)
    } else {
        Err(McpError::invalid_params("either `id` or `name` is required", None))
    }
}
