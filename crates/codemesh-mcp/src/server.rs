//! The MCP server: one `rmcp` `ServerHandler` combining every tool
//! module's router, mounted as a nested Streamable-HTTP route by
//! `codemesh-server`.

use std::sync::Arc;

use codemesh_ai::{Embedder, SummaryBridge, TemplateSummary};
use codemesh_core::graph::GraphMirrorRegistry;
use codemesh_core::ids::TenantId;
use codemesh_store::Store;
use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::ServerHandler;
use rmcp::model::{Implementation, ProtocolVersion, ServerCapabilities, ServerInfo};
use rmcp::tool_handler;

use crate::session::SessionCache;

/// Shared state every tool reads. `embedder` is `None` when no
/// embedding provider is configured — `semantic_search` then fails with
/// `EmbedderUnavailable` rather than the server refusing to
/// start.
pub struct McpContext {
    pub store: Store,
    pub graphs: Arc<GraphMirrorRegistry>,
    pub embedder: Option<Arc<dyn Embedder>>,
    pub summarizer: Arc<dyn SummaryBridge>,
    pub sessions: SessionCache,
    /// Every tool call is scoped to one tenant. Real multi-tenant auth
    /// happens at the HTTP layer in front of this transport; this
    /// server resolves the tenant once at startup (see DESIGN.md).
    pub tenant_id: TenantId,
}

impl McpContext {
    pub fn new(store: Store, graphs: Arc<GraphMirrorRegistry>, tenant_id: TenantId) -> Self {
        let sessions = SessionCache::new();
        sessions.spawn_sweeper();
        Self {
            store,
            graphs,
            embedder: None,
            summarizer: Arc::new(TemplateSummary),
            sessions,
            tenant_id,
        }
    }

    pub fn with_embedder(mut self, embedder: Arc<dyn Embedder>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    pub fn with_summarizer(mut self, summarizer: Arc<dyn SummaryBridge>) -> Self {
        self.summarizer = summarizer;
        self
    }
}

#[derive(Clone)]
pub struct McpServer {
    pub(crate) ctx: Arc<McpContext>,
    tool_router: ToolRouter<McpServer>,
}

impl McpServer {
    pub fn new(ctx: McpContext) -> Self {
        Self {
            ctx: Arc::new(ctx),
            tool_router: Self::tool_router(),
        }
    }

    fn tool_router() -> ToolRouter<Self> {
        Self::project_tools()
            + Self::search_tools()
            + Self::symbol_tools()
            + Self::lineage_tools()
            + Self::impact_tools()
            + Self::analytics_tools()
            + Self::subgraph_tools()
            + Self::ask_tools()
    }
}

#[tool_handler]
impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                r#"codemesh - semantic code index MCP server

Tools for agents exploring a cross-language codebase indexed by codemesh:

1. list_projects - see which projects are indexed
2. search_symbols - find symbols by name
3. semantic_search - find symbols by meaning (requires an embedder)
4. get_symbol_details - inspect one symbol
5. get_lineage - trace upstream/downstream dependencies
6. analyze_impact - assess blast radius of a proposed change
7. get_project_analytics - cached project-level summaries
8. extract_subgraph - pull a neighborhood of symbols around a topic or seed set
9. ask_codebase - free-form question, routed to the best-fitting tool above

Every tool accepts `project` (slug), `verbosity` (summary|standard|full),
`max_response_tokens`, and an optional `session_id` to carry context
across calls in the same conversation."#
                    .to_string(),
            ),
        }
    }
}
