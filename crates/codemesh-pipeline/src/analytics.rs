//! Degree, PageRank, architectural layer, and cross-language bridge
//! analytics computed once per project at the end of a successful
//! `IndexRun`. Degrees and layers are written back onto each
//! `Symbol`'s metadata; PageRank and bridges feed the project-level
//! `ProjectAnalytics` row `get_project_analytics` serves.

use std::collections::HashMap;

use serde_json::json;

use codemesh_ai::{CodebaseFact, SummaryBridge};
use codemesh_core::enums::{AnalyticsScope, EdgeType, Language, Layer, SymbolKind};
use codemesh_core::graph::GraphMirror;
use codemesh_core::ids::{ProjectId, SymbolId};
use codemesh_core::model::{ProjectAnalytics, Symbol, SymbolMetadata};

/// Damping factor, iteration cap, and convergence threshold: conservative
/// defaults, not tuned against a reference implementation.
const DAMPING: f64 = 0.85;
const MAX_ITERATIONS: u32 = 30;
const EPSILON: f64 = 1e-6;

/// Power-iteration PageRank over the full project edge set. Dangling
/// nodes (no outgoing edges) redistribute their mass uniformly across
/// every node each round, the standard fix for an otherwise leaking walk.
pub fn pagerank(mirror: &GraphMirror) -> HashMap<SymbolId, f64> {
    let nodes: Vec<SymbolId> = mirror.symbol_ids().collect();
    let n = nodes.len();
    if n == 0 {
        return HashMap::new();
    }
    let index_of: HashMap<SymbolId, usize> = nodes.iter().enumerate().map(|(i, s)| (*s, i)).collect();

    let mut out_links: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut out_degree = vec![0usize; n];
    for (source, target, _edge) in mirror.all_edges() {
        let (Some(&s), Some(&t)) = (index_of.get(&source), index_of.get(&target)) else {
            continue;
        };
        out_links[s].push(t);
        out_degree[s] += 1;
    }

    let mut rank = vec![1.0 / n as f64; n];
    for _ in 0..MAX_ITERATIONS {
        let dangling_mass: f64 = (0..n).filter(|&i| out_degree[i] == 0).map(|i| rank[i]).sum();
        let base = (1.0 - DAMPING) / n as f64 + DAMPING * dangling_mass / n as f64;
        let mut next = vec![base; n];
        for source in 0..n {
            if out_degree[source] == 0 {
                continue;
            }
            let share = DAMPING * rank[source] / out_degree[source] as f64;
            for &target in &out_links[source] {
                next[target] += share;
            }
        }
        let delta: f64 = next.iter().zip(&rank).map(|(a, b)| (a - b).abs()).sum();
        rank = next;
        if delta < EPSILON {
            break;
        }
    }

    nodes.into_iter().zip(rank).collect()
}

/// Heuristic architectural bucket from kind plus the owning file's path:
/// controllers/endpoints are `api`, repositories/migrations are `data`,
/// shared utility modules are `cross_cutting`.
pub fn classify_layer(kind: SymbolKind, file_path: &str) -> Layer {
    let lower = file_path.to_ascii_lowercase();
    match kind {
        SymbolKind::Table | SymbolKind::View | SymbolKind::Column => Layer::Data,
        SymbolKind::Endpoint => Layer::Api,
        SymbolKind::Module | SymbolKind::Namespace | SymbolKind::Constant | SymbolKind::Type => Layer::CrossCutting,
        SymbolKind::Trigger | SymbolKind::Procedure | SymbolKind::Function => {
            if lower.contains("migration") {
                Layer::Data
            } else {
                Layer::Business
            }
        }
        SymbolKind::Class
        | SymbolKind::Interface
        | SymbolKind::Struct
        | SymbolKind::Enum
        | SymbolKind::Method
        | SymbolKind::Property
        | SymbolKind::Field => {
            if lower.contains("controller") || lower.contains("endpoint") || lower.contains("/api/") {
                Layer::Api
            } else if lower.contains("infra") || lower.contains("config") || lower.contains("middleware") {
                Layer::Infrastructure
            } else if lower.contains("repository") || lower.contains("dao") || lower.contains("/data/") {
                Layer::Data
            } else {
                Layer::Business
            }
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct BridgeSummary {
    pub source_language: String,
    pub target_language: String,
    pub edge_type: String,
    pub count: u64,
}

/// Aggregates edge counts grouped by `(source_language, target_language,
/// edge_type)`, restricted to pairs spanning two different languages —
/// the cross-language bridge rollup `get_project_analytics` renders.
pub fn cross_language_bridges(mirror: &GraphMirror, language_of: &HashMap<SymbolId, Language>) -> Vec<BridgeSummary> {
    let mut counts: HashMap<(Language, Language, EdgeType), u64> = HashMap::new();
    for (source, target, edge) in mirror.all_edges() {
        let (Some(&sl), Some(&tl)) = (language_of.get(&source), language_of.get(&target)) else {
            continue;
        };
        if sl == tl {
            continue;
        }
        *counts.entry((sl, tl, edge.edge_type)).or_insert(0) += 1;
    }

    let mut bridges: Vec<BridgeSummary> = counts
        .into_iter()
        .map(|((sl, tl, et), count)| BridgeSummary {
            source_language: sl.as_str().to_string(),
            target_language: tl.as_str().to_string(),
            edge_type: et.as_str().to_string(),
            count,
        })
        .collect();
    bridges.sort_by(|a, b| b.count.cmp(&a.count));
    bridges
}

/// Per-symbol metadata updates (degree, pagerank, layer) plus the
/// project-level analytics row. `file_path_of` should cover every
/// symbol's owning file; a symbol with no entry falls back to its own
/// qualified name for the layer heuristic.
pub async fn compute_project_analytics(
    project_id: ProjectId,
    mirror: &GraphMirror,
    symbols: &[Symbol],
    file_path_of: &HashMap<SymbolId, String>,
    summarizer: &dyn SummaryBridge,
) -> (HashMap<SymbolId, SymbolMetadata>, ProjectAnalytics) {
    let ranks = pagerank(mirror);
    let language_of: HashMap<SymbolId, Language> = symbols.iter().map(|s| (s.id, s.language)).collect();

    let mut per_symbol = HashMap::with_capacity(symbols.len());
    for symbol in symbols {
        let mut metadata = symbol.metadata.clone();
        metadata.in_degree = Some(mirror.in_degree(symbol.id) as u32);
        metadata.out_degree = Some(mirror.out_degree(symbol.id) as u32);
        metadata.pagerank = ranks.get(&symbol.id).copied();
        let path = file_path_of.get(&symbol.id).map(String::as_str).unwrap_or(&symbol.qualified_name);
        metadata.layer = Some(classify_layer(symbol.kind, path));
        per_symbol.insert(symbol.id, metadata);
    }

    let bridges = cross_language_bridges(mirror, &language_of);

    let mut ranked: Vec<&Symbol> = symbols.iter().collect();
    ranked.sort_by(|a, b| {
        ranks
            .get(&b.id)
            .partial_cmp(&ranks.get(&a.id))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let facts: Vec<CodebaseFact> = ranked
        .into_iter()
        .take(10)
        .map(|s| CodebaseFact {
            description: format!(
                "{} `{}` (pagerank {:.4}, in-degree {}, out-degree {})",
                s.kind.as_str(),
                s.qualified_name,
                ranks.get(&s.id).copied().unwrap_or(0.0),
                mirror.in_degree(s.id),
                mirror.out_degree(s.id)
            ),
        })
        .collect();

    let summary = summarizer
        .answer_question("Summarize the most structurally important symbols in this project.", &facts)
        .await
        .unwrap_or_else(|_| "Analytics computed; no natural-language summary available.".to_string());

    let analytics = ProjectAnalytics {
        project_id,
        scope: AnalyticsScope::Project,
        scope_id: project_id.to_string(),
        analytics: json!({
            "symbol_count": symbols.len(),
            "edge_count": mirror.edge_count(),
            "bridges": bridges,
        }),
        summary,
    };

    (per_symbol, analytics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use codemesh_core::enums::Direction;

    fn chain_mirror() -> (GraphMirror, SymbolId, SymbolId, SymbolId) {
        let mut mirror = GraphMirror::new();
        let a = SymbolId::new();
        let b = SymbolId::new();
        let c = SymbolId::new();
        mirror.add_node(a, SymbolKind::Table);
        mirror.add_node(b, SymbolKind::View);
        mirror.add_node(c, SymbolKind::Column);
        mirror.add_edge(a, b, EdgeType::UsesTable, 0.9);
        mirror.add_edge(b, c, EdgeType::UsesColumn, 0.85);
        (mirror, a, b, c)
    }

    #[test]
    fn pagerank_distributes_positive_mass_to_every_node() {
        let (mirror, a, b, c) = chain_mirror();
        let ranks = pagerank(&mirror);
        assert_eq!(ranks.len(), 3);
        assert!(ranks[&a] > 0.0);
        assert!(ranks[&b] > 0.0);
        assert!(ranks[&c] > 0.0);
        let _ = Direction::Downstream;
    }

    #[test]
    fn pagerank_on_empty_graph_is_empty() {
        let mirror = GraphMirror::new();
        assert!(pagerank(&mirror).is_empty());
    }

    #[test]
    fn classify_layer_recognizes_controllers_as_api() {
        let layer = classify_layer(SymbolKind::Class, "src/Orders/OrdersController.cs");
        assert_eq!(layer, Layer::Api);
    }

    #[test]
    fn classify_layer_recognizes_migrations_as_data() {
        let layer = classify_layer(SymbolKind::Procedure, "migrations/2024_01_add_index.sql");
        assert_eq!(layer, Layer::Data);
    }

    #[test]
    fn cross_language_bridges_ignores_same_language_edges() {
        let (mirror, a, b, _c) = chain_mirror();
        let mut languages = HashMap::new();
        languages.insert(a, Language::CSharp);
        languages.insert(b, Language::TSql);
        let bridges = cross_language_bridges(&mirror, &languages);
        assert_eq!(bridges.len(), 1);
        assert_eq!(bridges[0].source_language, "csharp");
        assert_eq!(bridges[0].target_language, "tsql");
    }
}
