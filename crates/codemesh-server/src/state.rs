//! Shared application state handed to every REST/GraphQL/MCP handler.

use std::sync::Arc;

use codemesh_ai::{Embedder, OpenAiEmbedder, SummaryBridge, TemplateSummary};
use codemesh_core::graph::GraphMirrorRegistry;
use codemesh_core::ids::TenantId;
use codemesh_pipeline::{InMemoryQueue, Orchestrator};
use codemesh_store::Store;

use crate::auth::JwksValidator;
use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub graphs: Arc<GraphMirrorRegistry>,
    pub orchestrator: Arc<Orchestrator>,
    pub embedder: Option<Arc<dyn Embedder>>,
    pub summarizer: Arc<dyn SummaryBridge>,
    pub config: Arc<Config>,
    pub auth: Option<Arc<JwksValidator>>,
    /// Resolved once at startup: this
    /// deployment serves a single tenant, selected by the first row in
    /// `tenants` or created on first boot by the `migrate` CLI path.
    pub default_tenant: TenantId,
}

/// One place to build everything CLI subcommands need: connects the
/// pool, runs a project/tenant bootstrap, wires an embedder only when
/// `EMBEDDING_PROVIDER` is set, and hands back both the `AppState` (for
/// `serve`) and its `Orchestrator` (for `index`/`worker`, which don't
/// need the rest of the HTTP plumbing).
pub async fn bootstrap(config: Config) -> anyhow::Result<AppState> {
    let store = Store::connect(&config.database_url).await?;
    let tenant = store.get_or_create_tenant("default", "default").await?;
    let graphs = Arc::new(GraphMirrorRegistry::new());

    let embedder: Option<Arc<dyn Embedder>> = match config.embedding_provider.as_deref() {
        Some("openai") => {
            let api_key = config
                .embedding_api_key
                .clone()
                .ok_or_else(|| anyhow::anyhow!("EMBEDDING_API_KEY must be set when EMBEDDING_PROVIDER=openai"))?;
            let model = config.embedding_model.clone().unwrap_or_else(|| "text-embedding-3-small".to_string());
            let dimensions = config.embedding_dimensions.unwrap_or(1536) as usize;
            Some(Arc::new(OpenAiEmbedder::new(api_key, model, dimensions)))
        }
        Some(other) => anyhow::bail!("unknown EMBEDDING_PROVIDER: {other}"),
        None => None,
    };

    let mut orchestrator = Orchestrator::new(store.clone(), graphs.clone()).with_queue(Arc::new(InMemoryQueue::new()));
    if let Some(embedder) = &embedder {
        orchestrator = orchestrator.with_embedder(embedder.clone());
    }

    let auth = if config.auth_enabled {
        let issuer = config
            .auth_issuer_url
            .clone()
            .ok_or_else(|| anyhow::anyhow!("AUTH_ISSUER_URL must be set when AUTH_ENABLED=true"))?;
        Some(Arc::new(JwksValidator::new(issuer, config.auth_audience.clone())))
    } else {
        None
    };

    Ok(AppState {
        store,
        graphs,
        orchestrator: Arc::new(orchestrator),
        embedder,
        summarizer: Arc::new(TemplateSummary),
        config: Arc::new(config),
        auth,
        default_tenant: tenant.id,
    })
}
