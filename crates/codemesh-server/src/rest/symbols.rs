use std::collections::HashSet;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use codemesh_core::enums::{ChangeType, Direction, Severity};
use codemesh_core::error::CoreError;
use codemesh_core::ids::SymbolId;
use codemesh_core::impact::{classify_severity, severity_rank};
use codemesh_core::model::{Symbol, SymbolEdge};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub project: Uuid,
    pub q: String,
    #[serde(default)]
    pub limit: Option<i64>,
}

pub async fn search_symbols(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Symbol>>, ApiError> {
    let limit = query.limit.unwrap_or(20).clamp(1, 200);
    let symbols = state
        .store
        .search_symbols(query.project.into(), &query.q, limit)
        .await?;
    Ok(Json(symbols))
}

pub async fn get_symbol(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<Symbol>, ApiError> {
    let symbol = state.store.get_symbol(SymbolId::from(id)).await?;
    Ok(Json(symbol))
}

#[derive(Debug, Serialize)]
pub struct ReferencesResponse {
    pub incoming: Vec<SymbolEdge>,
    pub outgoing: Vec<SymbolEdge>,
}

pub async fn references(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<ReferencesResponse>, ApiError> {
    let symbol_id = SymbolId::from(id);
    let incoming = state.store.edges_to(symbol_id).await?;
    let outgoing = state.store.edges_from(symbol_id).await?;
    Ok(Json(ReferencesResponse { incoming, outgoing }))
}

#[derive(Debug, Deserialize)]
pub struct LineageQuery {
    #[serde(default)]
    pub direction: Option<String>,
    #[serde(default)]
    pub max_depth: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct LineageEdgeRow {
    pub symbol_id: SymbolId,
    pub edge_type: String,
    pub confidence: f32,
    pub depth: u32,
}

/// Walks the in-memory graph mirror upstream, downstream, or both
/// from `id`. Mirrors the MCP `get_lineage` tool's traversal, returning
/// the raw hop list rather than a token-budgeted summary — a REST
/// caller is expected to page or filter client-side.
pub async fn lineage(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<LineageQuery>,
) -> Result<Json<Vec<LineageEdgeRow>>, ApiError> {
    let symbol_id = SymbolId::from(id);
    let symbol = state.store.get_symbol(symbol_id).await?;
    let direction: Direction = query
        .direction
        .as_deref()
        .and_then(|d| d.parse().ok())
        .unwrap_or(Direction::Downstream);
    let max_depth = query.max_depth.unwrap_or(3).min(10);

    let directions = match direction {
        Direction::Both => vec![Direction::Upstream, Direction::Downstream],
        other => vec![other],
    };

    let mut rows = Vec::new();
    if let Some(mirror) = state.graphs.get(symbol.project_id) {
        for dir in directions {
            for path in mirror.lineage(symbol_id, dir, max_depth, &HashSet::new()) {
                let depth = path.path.len() as u32;
                if let Some(&(symbol_id, edge_type, confidence)) = path.path.last() {
                    rows.push(LineageEdgeRow {
                        symbol_id,
                        edge_type: edge_type.as_str().to_string(),
                        confidence,
                        depth,
                    });
                }
            }
        }
    }
    Ok(Json(rows))
}

#[derive(Debug, Deserialize)]
pub struct ImpactQuery {
    pub change_type: String,
    #[serde(default)]
    pub max_depth: Option<u32>,
    #[serde(default)]
    pub severity_threshold: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ImpactRow {
    pub symbol_id: SymbolId,
    pub qualified_name: String,
    pub depth: u32,
    pub severity: String,
    pub edge_type: String,
}

/// Traverses callers/readers (reverse dependency edges) and classifies
/// each affected symbol's severity the same way `analyze_impact` does
/// over MCP, via the shared `codemesh_core::impact` classifier.
pub async fn impact(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<ImpactQuery>,
) -> Result<Json<Vec<ImpactRow>>, ApiError> {
    let symbol_id = SymbolId::from(id);
    let root = state.store.get_symbol(symbol_id).await?;
    let change_type: ChangeType = query
        .change_type
        .parse()
        .map_err(|_| ApiError::Core(CoreError::Validation(format!("unknown change_type: {}", query.change_type))))?;
    let max_depth = query.max_depth.unwrap_or(5).min(10);
    let threshold_rank = query
        .severity_threshold
        .as_deref()
        .and_then(|s| s.parse::<Severity>().ok())
        .map(severity_rank)
        .unwrap_or(severity_rank(Severity::Low));

    let mut rows = Vec::new();
    if let Some(mirror) = state.graphs.get(root.project_id) {
        for path in mirror.lineage(symbol_id, Direction::Upstream, max_depth, &HashSet::new()) {
            let Some(&(affected_id, edge_type, _confidence)) = path.path.last() else {
                continue;
            };
            let depth = path.path.len() as u32;
            let severity = classify_severity(depth, change_type, edge_type);
            if severity_rank(severity) > threshold_rank {
                continue;
            }
            let qualified_name = state
                .store
                .get_symbol(affected_id)
                .await
                .map(|s| s.qualified_name)
                .unwrap_or_else(|_| affected_id.to_string());
            rows.push(ImpactRow {
                symbol_id: affected_id,
                qualified_name,
                depth,
                severity: severity.as_str().to_string(),
                edge_type: edge_type.as_str().to_string(),
            });
        }
    }
    Ok(Json(rows))
}

/// Column-level lineage edges only: those carrying a
/// `derivation_type`, as opposed to the coarser symbol-level edges
/// `/references` returns.
pub async fn column_lineage(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<Vec<SymbolEdge>>, ApiError> {
    let symbol_id = SymbolId::from(id);
    let incoming = state.store.edges_to(symbol_id).await?;
    let outgoing = state.store.edges_from(symbol_id).await?;
    let edges = incoming
        .into_iter()
        .chain(outgoing)
        .filter(|edge| edge.metadata.derivation_type.is_some())
        .collect();
    Ok(Json(edges))
}
