use codemesh_ai::summarize::CodebaseFact;
use codemesh_core::enums::Direction;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, Content};
use rmcp::schemars::{self, JsonSchema};
use rmcp::{tool, tool_router, ErrorData as McpError};
use serde::Deserialize;
use std::collections::HashSet;

use crate::error::{ai_err, store_err};
use crate::response::ResponseBuilder;
use crate::server::McpServer;

use super::common::{max_tokens, resolve_project};

#[derive(Debug, Deserialize, JsonSchema)]
pub struct AskCodebaseParams {
    pub project: String,
    pub question: String,
    #[serde(default)]
    pub max_response_tokens: Option<u32>,
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Cheap keyword routing, just enough to pick which facts to gather and
/// to label `meta.tool_selected` with the intent that was actually served.
fn route(question: &str) -> &'static str {
    let q = question.to_lowercase();
    if q.contains("break") || q.contains("affect") || q.contains("impact") || q.contains("delete") {
        "analyze_impact"
    } else if q.contains("depend") || q.contains("call") || q.contains("use") || q.contains("trace") {
        "get_lineage"
    } else if q.contains("project") || q.contains("overview") || q.contains("architecture") {
        "get_project_analytics"
    } else {
        "search_symbols"
    }
}

#[tool_router(router = ask_tools, vis = "pub(crate)")]
impl McpServer {
    /// Free-form question over the indexed codebase. Routes to the tool
    /// whose facts best answer the question, then asks the summary
    /// bridge to phrase the answer (or falls back to a templated one).
    #[tool(
        description = "Ask a free-form question about the codebase. Routes internally to search, lineage, impact, or analytics, then summarizes the result in natural language."
    )]
    pub async fn ask_codebase(
        &self,
        Parameters(params): Parameters<AskCodebaseParams>,
    ) -> Result<CallToolResult, McpError> {
        let project = resolve_project(&self.ctx, &params.project).await?;
        let intent = route(&params.question);

        let matches = self
            .ctx
            .store
            .search_symbols(project.id, &params.question, 5)
            .await
            .map_err(store_err)?;

        let mut facts = Vec::new();
        for symbol in &matches {
            let mut description = format!(
                "{} `{}` ({})",
                symbol.kind.as_str(),
                symbol.qualified_name,
                symbol.language.as_str()
            );
            if let Some(doc) = &symbol.doc {
                description.push_str(&format!(": {doc}"));
            }
            if intent == "analyze_impact" || intent == "get_lineage" {
                if let Some(mirror) = self.ctx.graphs.get(project.id) {
                    let upstream = mirror
                        .lineage(symbol.id, Direction::Upstream, 2, &HashSet::new())
                        .len();
                    description.push_str(&format!(". {upstream} upstream dependent path(s) within 2 hops."));
                }
            }
            facts.push(CodebaseFact { description });
        }

        let answer = self
            .ctx
            .summarizer
            .answer_question(&params.question, &facts)
            .await
            .map_err(ai_err)?;

        if let Some(session_id) = &params.session_id {
            let mut session = self.ctx.sessions.get(session_id);
            session.record_query(&params.question);
            session.mark_seen(matches.iter().map(|s| s.id.to_string()));
            self.ctx.sessions.put(session_id, session);
        }

        let response = ResponseBuilder::new(intent, max_tokens(params.max_response_tokens))
            .header(format!("Answer: {}", params.question), None)
            .text(answer)
            .counts(matches.len(), matches.len())
            .hint("Dig deeper", "Show me get_symbol_details for the top result")
            .build();

        Ok(CallToolResult::success(vec![Content::text(
            serde_json::to_string_pretty(&response).unwrap_or_default(),
        )]))
    }
}
