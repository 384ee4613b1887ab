use std::collections::HashSet;

use codemesh_core::enums::Direction;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, Content};
use rmcp::schemars::{self, JsonSchema};
use rmcp::{tool, tool_router, ErrorData as McpError};
use serde::Deserialize;

use crate::response::{GraphEdgeCard, ResponseBuilder};
use crate::server::McpServer;

use super::common::{find_symbol, max_tokens, resolve_project};

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetLineageParams {
    pub project: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub direction: Option<String>,
    #[serde(default)]
    pub max_depth: Option<u32>,
    #[serde(default)]
    pub max_response_tokens: Option<u32>,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[tool_router(router = lineage_tools, vis = "pub(crate)")]
impl McpServer {
    /// Walks the dependency graph upstream, downstream, or both from a root symbol.
    #[tool(
        description = "Trace data/control lineage from a symbol. `direction` is upstream (what feeds it), downstream (what it feeds), or both. `max_depth` caps at 10 hops (default 3)."
    )]
    pub async fn get_lineage(
        &self,
        Parameters(params): Parameters<GetLineageParams>,
    ) -> Result<CallToolResult, McpError> {
        let project = resolve_project(&self.ctx, &params.project).await?;
        let root = find_symbol(
            &self.ctx.store,
            project.id,
            params.id.as_deref(),
            params.name.as_deref(),
        )
        .await?;

        let direction = params
            .direction
            .as_deref()
            .and_then(|d| d.parse().ok())
            .unwrap_or(Direction::Downstream);
        let max_depth = params.max_depth.unwrap_or(3).min(10);

        let directions = match direction {
            Direction::Both => vec![Direction::Upstream, Direction::Downstream],
            other => vec![other],
        };

        let mut edges = Vec::new();
        if let Some(mirror) = self.ctx.graphs.get(project.id) {
            for dir in directions {
                for path in mirror.lineage(root.id, dir, max_depth, &HashSet::new()) {
                    let mut from_name = root.qualified_name.clone();
                    for (symbol_id, edge_type, confidence) in &path.path {
                        let to_name = self
                            .ctx
                            .store
                            .get_symbol(*symbol_id)
                            .await
                            .map(|s| s.qualified_name)
                            .unwrap_or_else(|_| symbol_id.to_string());
                        let (source, target) = match dir {
                            Direction::Upstream => (to_name.clone(), from_name.clone()),
                            _ => (from_name.clone(), to_name.clone()),
                        };
                        edges.push(GraphEdgeCard {
                            source,
                            target,
                            edge_type: edge_type.as_str().to_string(),
                            confidence: *confidence,
                        });
                        from_name = to_name;
                    }
                }
            }
        }

        let response = ResponseBuilder::new("get_lineage", max_tokens(params.max_response_tokens))
            .header(
                format!("{} lineage: {}", direction.as_str(), root.qualified_name),
                Some(format!("max depth {max_depth}")),
            )
            .graph(edges.clone())
            .counts(edges.len(), edges.len())
            .hint(
                "Assess blast radius",
                format!("What breaks if {} changes?", root.name),
            )
            .build();

        Ok(CallToolResult::success(vec![Content::text(
            serde_json::to_string_pretty(&response).unwrap_or_default(),
        )]))
    }
}
