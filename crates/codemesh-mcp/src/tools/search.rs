use std::collections::HashSet;

use codemesh_ai::embed::EmbeddingKind;
use codemesh_core::enums::{Language, SymbolKind};
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, Content};
use rmcp::schemars::{self, JsonSchema};
use rmcp::{tool, tool_router, ErrorData as McpError};
use serde::Deserialize;

use crate::error::store_err;
use crate::ranking::rank_symbols;
use crate::response::ResponseBuilder;
use crate::server::McpServer;

use super::common::{build_symbol_card, max_tokens, parse_verbosity, resolve_project};

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchSymbolsParams {
    pub project: String,
    pub query: String,
    #[serde(default)]
    pub kinds: Option<Vec<String>>,
    #[serde(default)]
    pub languages: Option<Vec<String>>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub verbosity: Option<String>,
    #[serde(default)]
    pub max_response_tokens: Option<u32>,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SemanticSearchParams {
    pub project: String,
    pub query: String,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub max_response_tokens: Option<u32>,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[tool_router(router = search_tools, vis = "pub(crate)")]
impl McpServer {
    /// Rank-ordered symbol search by name.
    #[tool(
        description = "Search symbols by name. Ranks exact > prefix > substring matches, then by importance (PageRank) and kind."
    )]
    pub async fn search_symbols(
        &self,
        Parameters(params): Parameters<SearchSymbolsParams>,
    ) -> Result<CallToolResult, McpError> {
        let project = resolve_project(&self.ctx, &params.project).await?;
        let verbosity = parse_verbosity(params.verbosity.as_deref());
        let limit = params.limit.unwrap_or(20).min(50) as i64;

        let mut symbols = self
            .ctx
            .store
            .search_symbols(project.id, &params.query, limit.max(50))
            .await
            .map_err(store_err)?;

        if let Some(kinds) = &params.kinds {
            let wanted: HashSet<SymbolKind> = kinds.iter().filter_map(|k| k.parse().ok()).collect();
            if !wanted.is_empty() {
                symbols.retain(|s| wanted.contains(&s.kind));
            }
        }
        if let Some(languages) = &params.languages {
            let wanted: HashSet<Language> = languages.iter().filter_map(|l| l.parse().ok()).collect();
            if !wanted.is_empty() {
                symbols.retain(|s| wanted.contains(&s.language));
            }
        }

        let session = params
            .session_id
            .as_deref()
            .map(|id| self.ctx.sessions.get(id))
            .unwrap_or_default();
        let focus_area: HashSet<String> = session.focus_area.iter().cloned().collect();
        let focus_ids: Vec<codemesh_core::ids::SymbolId> = focus_area
            .iter()
            .filter_map(|f| f.parse().ok())
            .collect();
        let mirror = self.ctx.graphs.get(project.id);
        let within_two_hops = |symbol: &codemesh_core::model::Symbol| {
            mirror
                .as_ref()
                .map(|m| focus_ids.iter().any(|&focus_id| m.shortest_path(focus_id, symbol.id, 2).is_some()))
                .unwrap_or(false)
        };
        rank_symbols(&mut symbols, &params.query, &focus_area, &session.seen_symbols, within_two_hops);
        symbols.truncate(limit as usize);

        let mut cards = Vec::with_capacity(symbols.len());
        for symbol in &symbols {
            cards.push(build_symbol_card(&self.ctx, symbol, verbosity, &session.seen_symbols).await?);
        }

        if let Some(session_id) = &params.session_id {
            let mut session = session;
            session.record_query(&params.query);
            session.mark_seen(symbols.iter().map(|s| s.id.to_string()));
            self.ctx.sessions.put(session_id, session);
        }

        let response = ResponseBuilder::new("search_symbols", max_tokens(params.max_response_tokens))
            .header(format!("Symbols matching \"{}\"", params.query), None)
            .symbol_list(cards)
            .hint("See lineage", format!("What does {} depend on?", params.query))
            .build();

        Ok(CallToolResult::success(vec![Content::text(
            serde_json::to_string_pretty(&response).unwrap_or_default(),
        )]))
    }

    /// Vector nearest-neighbor search over symbol embeddings.
    #[tool(
        description = "Find symbols by semantic similarity to a natural-language query. Requires an embedding provider to be configured; fails otherwise."
    )]
    pub async fn semantic_search(
        &self,
        Parameters(params): Parameters<SemanticSearchParams>,
    ) -> Result<CallToolResult, McpError> {
        let project = resolve_project(&self.ctx, &params.project).await?;
        let Some(embedder) = &self.ctx.embedder else {
            return Err(McpError::invalid_request(
                "EMBEDDER_UNAVAILABLE: no embedding provider is configured",
                None,
            ));
        };

        let limit = params.limit.unwrap_or(10).min(50) as usize;
        let vectors = embedder
            .embed_batch(&[params.query.clone()], EmbeddingKind::Query)
            .await
            .map_err(crate::error::ai_err)?;
        let query_vector = vectors
            .into_iter()
            .next()
            .ok_or_else(|| McpError::internal_error("embedder returned no vector", None))?;

        let matches = self
            .ctx
            .store
            .similarity_search(project.id, &query_vector, limit)
            .await
            .map_err(store_err)?;

        let mut rows = Vec::with_capacity(matches.len());
        for (symbol_id, similarity) in &matches {
            if let Ok(symbol) = self.ctx.store.get_symbol(*symbol_id).await {
                rows.push(vec![
                    symbol.qualified_name,
                    format!("{:.4}", similarity),
                    format!("{:.4}", 1.0 - similarity),
                ]);
            }
        }

        let response = ResponseBuilder::new("semantic_search", max_tokens(params.max_response_tokens))
            .header(format!("Semantic matches for \"{}\"", params.query), None)
            .table(
                vec!["symbol".to_string(), "similarity".to_string(), "distance".to_string()],
                rows,
            )
            .counts(matches.len(), matches.len())
            .build();

        Ok(CallToolResult::success(vec![Content::text(
            serde_json::to_string_pretty(&response).unwrap_or_default(),
        )]))
    }
}
