use codemesh_core::enums::AnalyticsScope;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, Content};
use rmcp::schemars::{self, JsonSchema};
use rmcp::{tool, tool_router, ErrorData as McpError};
use serde::Deserialize;

use crate::error::store_err;
use crate::response::ResponseBuilder;
use crate::server::McpServer;

use super::common::{max_tokens, resolve_project};

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetProjectAnalyticsParams {
    pub project: String,
    /// One of project, source, schema, namespace, bridge. Defaults to project.
    #[serde(default)]
    pub scope: Option<String>,
    /// Identifier within `scope`; defaults to the project id for `scope=project`.
    #[serde(default)]
    pub scope_id: Option<String>,
    #[serde(default)]
    pub max_response_tokens: Option<u32>,
}

#[tool_router(router = analytics_tools, vis = "pub(crate)")]
impl McpServer {
    /// Precomputed architectural analytics: PageRank, degree centrality,
    /// layer classification, and cross-language bridge summaries.
    #[tool(
        description = "Get precomputed analytics for a project, source, schema, namespace, or bridge scope: importance ranking, layer classification, and a natural-language summary."
    )]
    pub async fn get_project_analytics(
        &self,
        Parameters(params): Parameters<GetProjectAnalyticsParams>,
    ) -> Result<CallToolResult, McpError> {
        let project = resolve_project(&self.ctx, &params.project).await?;

        let scope: AnalyticsScope = params
            .scope
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or(AnalyticsScope::Project);
        let scope_id = params
            .scope_id
            .unwrap_or_else(|| project.id.to_string());

        let analytics = self
            .ctx
            .store
            .get_analytics(project.id, scope, &scope_id)
            .await
            .map_err(store_err)?;

        let response = ResponseBuilder::new("get_project_analytics", max_tokens(params.max_response_tokens))
            .header(
                format!("Analytics: {} / {}", scope.as_str(), analytics.scope_id),
                None,
            )
            .text(analytics.summary.clone())
            .text(serde_json::to_string_pretty(&analytics.analytics).unwrap_or_default())
            .counts(1, 1)
            .build();

        Ok(CallToolResult::success(vec![Content::text(
            serde_json::to_string_pretty(&response).unwrap_or_default(),
        )]))
    }
}
