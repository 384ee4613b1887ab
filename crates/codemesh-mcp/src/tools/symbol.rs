use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, Content};
use rmcp::schemars::{self, JsonSchema};
use rmcp::{tool, tool_router, ErrorData as McpError};
use serde::Deserialize;

use crate::response::ResponseBuilder;
use crate::server::McpServer;

use super::common::{build_symbol_card, find_symbol, max_tokens, parse_verbosity, resolve_project};

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetSymbolDetailsParams {
    pub project: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub verbosity: Option<String>,
    #[serde(default)]
    pub max_response_tokens: Option<u32>,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[tool_router(router = symbol_tools, vis = "pub(crate)")]
impl McpServer {
    /// Full detail card for one symbol, found by id or qualified name.
    #[tool(
        description = "Get the full detail card for one symbol, identified by `id` or `name`. Verbosity controls how much of the card (doc, dependencies, edges) is populated."
    )]
    pub async fn get_symbol_details(
        &self,
        Parameters(params): Parameters<GetSymbolDetailsParams>,
    ) -> Result<CallToolResult, McpError> {
        let project = resolve_project(&self.ctx, &params.project).await?;
        let verbosity = parse_verbosity(params.verbosity.as_deref());

        let symbol = find_symbol(
            &self.ctx.store,
            project.id,
            params.id.as_deref(),
            params.name.as_deref(),
        )
        .await?;

        let session = params
            .session_id
            .as_deref()
            .map(|id| self.ctx.sessions.get(id))
            .unwrap_or_default();

        let card = build_symbol_card(&self.ctx, &symbol, verbosity, &session.seen_symbols).await?;

        if let Some(session_id) = &params.session_id {
            let mut session = session;
            session.mark_seen([symbol.id.to_string()]);
            self.ctx.sessions.put(session_id, session);
        }

        let response = ResponseBuilder::new("get_symbol_details", max_tokens(params.max_response_tokens))
            .header(symbol.qualified_name.clone(), symbol.signature.clone())
            .symbol_list(vec![card])
            .hint("Trace dependencies", format!("What does {} call?", symbol.name))
            .hint(
                "Assess blast radius",
                format!("What breaks if {} changes?", symbol.name),
            )
            .build();

        Ok(CallToolResult::success(vec![Content::text(
            serde_json::to_string_pretty(&response).unwrap_or_default(),
        )]))
    }
}
