use std::collections::{HashMap, HashSet};

use codemesh_core::enums::{Direction, SymbolKind};
use codemesh_core::ids::SymbolId;
use codemesh_core::model::Symbol;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, Content};
use rmcp::schemars::{self, JsonSchema};
use rmcp::{tool, tool_router, ErrorData as McpError};
use serde::Deserialize;

use crate::error::store_err;
use crate::response::{GraphEdgeCard, ResponseBuilder};
use crate::server::McpServer;

use super::common::{build_symbol_card, find_symbol, max_tokens, parse_verbosity, resolve_project};

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ExtractSubgraphParams {
    pub project: String,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub seed_symbols: Option<Vec<String>>,
    #[serde(default)]
    pub radius: Option<u32>,
    #[serde(default)]
    pub kinds: Option<Vec<String>>,
    #[serde(default)]
    pub verbosity: Option<String>,
    #[serde(default)]
    pub max_response_tokens: Option<u32>,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[tool_router(router = subgraph_tools, vis = "pub(crate)")]
impl McpServer {
    /// Pulls a neighborhood of symbols around a topic or a seed set, for
    /// agents that want an area map rather than a single trace.
    #[tool(
        description = "Extract a subgraph (symbol cards + edges) around a topic search or an explicit seed symbol list, within `radius` hops."
    )]
    pub async fn extract_subgraph(
        &self,
        Parameters(params): Parameters<ExtractSubgraphParams>,
    ) -> Result<CallToolResult, McpError> {
        let project = resolve_project(&self.ctx, &params.project).await?;
        let verbosity = parse_verbosity(params.verbosity.as_deref());
        let radius = params.radius.unwrap_or(2).min(5);

        let mut seeds: Vec<Symbol> = Vec::new();
        if let Some(topic) = &params.topic {
            let matches = self
                .ctx
                .store
                .search_symbols(project.id, topic, 5)
                .await
                .map_err(store_err)?;
            seeds.extend(matches);
        }
        if let Some(names) = &params.seed_symbols {
            for name in names {
                if let Ok(symbol) = find_symbol(&self.ctx.store, project.id, Some(name), None).await {
                    seeds.push(symbol);
                } else if let Ok(symbol) = find_symbol(&self.ctx.store, project.id, None, Some(name)).await {
                    seeds.push(symbol);
                }
            }
        }
        if seeds.is_empty() {
            return Err(McpError::invalid_params(
                "extract_subgraph requires `topic` or `seed_symbols`",
                None,
            ));
        }

        let kind_filter: Option<HashSet<SymbolKind>> = params
            .kinds
            .as_ref()
            .map(|kinds| kinds.iter().filter_map(|k| k.parse().ok()).collect());

        let mut nodes: HashMap<SymbolId, Symbol> = HashMap::new();
        let mut edges: Vec<GraphEdgeCard> = Vec::new();

        if let Some(mirror) = self.ctx.graphs.get(project.id) {
            for seed in &seeds {
                nodes.insert(seed.id, seed.clone());
                for path in mirror.lineage(seed.id, Direction::Both, radius, &HashSet::new()) {
                    let mut from_name = seed.qualified_name.clone();
                    for (symbol_id, edge_type, confidence) in &path.path {
                        let symbol = match self.ctx.store.get_symbol(*symbol_id).await {
                            Ok(symbol) => symbol,
                            Err(_) => continue,
                        };
                        if let Some(wanted) = &kind_filter {
                            if !wanted.contains(&symbol.kind) {
                                from_name = symbol.qualified_name.clone();
                                continue;
                            }
                        }
                        edges.push(GraphEdgeCard {
                            source: from_name.clone(),
                            target: symbol.qualified_name.clone(),
                            edge_type: edge_type.as_str().to_string(),
                            confidence: *confidence,
                        });
                        from_name = symbol.qualified_name.clone();
                        nodes.insert(symbol.id, symbol);
                    }
                }
            }
        }

        let session = params
            .session_id
            .as_deref()
            .map(|id| self.ctx.sessions.get(id))
            .unwrap_or_default();

        let mut cards = Vec::with_capacity(nodes.len());
        for symbol in nodes.values() {
            cards.push(build_symbol_card(&self.ctx, symbol, verbosity, &session.seen_symbols).await?);
        }

        let label = params
            .topic
            .clone()
            .unwrap_or_else(|| "seed symbols".to_string());

        let response = ResponseBuilder::new("extract_subgraph", max_tokens(params.max_response_tokens))
            .header(format!("Subgraph: {label}"), Some(format!("radius {radius}")))
            .symbol_list(cards)
            .graph(edges)
            .hint("Zoom in", "Show me the full detail for the most central symbol here")
            .build();

        Ok(CallToolResult::success(vec![Content::text(
            serde_json::to_string_pretty(&response).unwrap_or_default(),
        )]))
    }
}
