use std::collections::HashSet;

use codemesh_core::enums::{ChangeType, Direction, Severity};
use codemesh_core::impact::{classify_severity, severity_rank};
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, Content};
use rmcp::schemars::{self, JsonSchema};
use rmcp::{tool, tool_router, ErrorData as McpError};
use serde::Deserialize;

use crate::response::ResponseBuilder;
use crate::server::McpServer;

use super::common::{find_symbol, max_tokens, resolve_project};

#[derive(Debug, Deserialize, JsonSchema)]
pub struct AnalyzeImpactParams {
    pub project: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    pub change_type: String,
    #[serde(default)]
    pub max_depth: Option<u32>,
    #[serde(default)]
    pub severity_threshold: Option<String>,
    #[serde(default)]
    pub max_response_tokens: Option<u32>,
}

#[tool_router(router = impact_tools, vis = "pub(crate)")]
impl McpServer {
    /// Classifies the blast radius of modifying, deleting, or renaming a symbol.
    #[tool(
        description = "Analyze the blast radius of changing a symbol. Traverses callers/readers (reverse dependency edges) and classifies each affected symbol's severity by depth and edge type."
    )]
    pub async fn analyze_impact(
        &self,
        Parameters(params): Parameters<AnalyzeImpactParams>,
    ) -> Result<CallToolResult, McpError> {
        let project = resolve_project(&self.ctx, &params.project).await?;
        let root = find_symbol(
            &self.ctx.store,
            project.id,
            params.id.as_deref(),
            params.name.as_deref(),
        )
        .await?;

        let change_type: ChangeType = params
            .change_type
            .parse()
            .map_err(|_| McpError::invalid_params(format!("unknown change_type: {}", params.change_type), None))?;
        let max_depth = params.max_depth.unwrap_or(5).min(10);
        let threshold_rank = params
            .severity_threshold
            .as_deref()
            .and_then(|s| s.parse::<Severity>().ok())
            .map(severity_rank)
            .unwrap_or(severity_rank(Severity::Low));

        let mut direct_rows = Vec::new();
        let mut transitive_rows = Vec::new();

        if let Some(mirror) = self.ctx.graphs.get(project.id) {
            for path in mirror.lineage(root.id, Direction::Upstream, max_depth, &HashSet::new()) {
                let Some(&(symbol_id, edge_type, _confidence)) = path.path.last() else {
                    continue;
                };
                let depth = path.path.len() as u32;
                let severity = classify_severity(depth, change_type, edge_type);
                if severity_rank(severity) > threshold_rank {
                    continue;
                }
                let name = self
                    .ctx
                    .store
                    .get_symbol(symbol_id)
                    .await
                    .map(|s| s.qualified_name)
                    .unwrap_or_else(|_| symbol_id.to_string());
                let row = vec![name, depth.to_string(), severity.as_str().to_string(), edge_type.as_str().to_string()];
                if depth == 1 {
                    direct_rows.push(row);
                } else {
                    transitive_rows.push(row);
                }
            }
        }

        let total_affected = direct_rows.len() + transitive_rows.len();
        let columns = vec![
            "symbol".to_string(),
            "depth".to_string(),
            "severity".to_string(),
            "edge_type".to_string(),
        ];

        let mut rows = direct_rows;
        rows.extend(transitive_rows);

        let response = ResponseBuilder::new("analyze_impact", max_tokens(params.max_response_tokens))
            .header(
                format!("Impact of {} on {}", params.change_type, root.qualified_name),
                Some(format!("{total_affected} affected symbols")),
            )
            .table(columns, rows)
            .counts(total_affected, total_affected)
            .hint(
                "Narrow scope",
                format!("What directly calls {}?", root.name),
            )
            .build();

        Ok(CallToolResult::success(vec![Content::text(
            serde_json::to_string_pretty(&response).unwrap_or_default(),
        )]))
    }
}
