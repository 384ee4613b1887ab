use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::CallToolResult;
use rmcp::schemars::{self, JsonSchema};
use rmcp::{tool, tool_router, ErrorData as McpError};
use serde::Deserialize;

use crate::error::store_err;
use crate::response::ResponseBuilder;
use crate::server::McpServer;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListProjectsParams {
    #[serde(default)]
    pub max_response_tokens: Option<u32>,
}

#[tool_router(router = project_tools, vis = "pub(crate)")]
impl McpServer {
    /// List the projects visible to this tenant.
    #[tool(description = "List projects currently indexed for this tenant.")]
    pub async fn list_projects(
        &self,
        Parameters(params): Parameters<ListProjectsParams>,
    ) -> Result<CallToolResult, McpError> {
        let projects = self
            .ctx
            .store
            .list_projects(self.ctx.tenant_id)
            .await
            .map_err(store_err)?;

        let rows: Vec<Vec<String>> = projects
            .iter()
            .map(|p| vec![p.slug.clone(), p.name.clone(), p.id.to_string()])
            .collect();

        let response = ResponseBuilder::new(
            "list_projects",
            super::common::max_tokens(params.max_response_tokens),
        )
        .header("Projects", None)
        .table(
            vec!["slug".to_string(), "name".to_string(), "id".to_string()],
            rows,
        )
        .counts(projects.len(), projects.len())
        .build();

        let text = serde_json::to_string_pretty(&response).unwrap_or_default();
        Ok(CallToolResult::success(vec![rmcp::model::Content::text(text)]))
    }
}
