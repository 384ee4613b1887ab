//! CLI command implementations.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use codemesh_core::cancellation::Cancellation;
use codemesh_core::enums::SourceKind;
use codemesh_server::state::bootstrap;
use codemesh_server::Config;
use codemesh_store::Store;

pub async fn migrate() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    let store = Store::connect(&config.database_url).await?;
    store.migrate().await?;
    tracing::info!("migrations applied");
    Ok(())
}

pub async fn serve() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    let addr = config.mcp_addr.clone();
    let state = bootstrap(config).await?;

    // `InMemoryQueue` is in-process only (see its doc comment), so the
    // server drains its own orchestrator's queue in the background
    // rather than relying on a separate `worker` process to see jobs
    // submitted through the webhook path.
    let drain_orchestrator = state.orchestrator.clone();
    tokio::spawn(async move {
        loop {
            match drain_orchestrator.drain_one("embedded", Duration::from_secs(5)).await {
                Ok(_) => {}
                Err(err) => tracing::warn!(error = %err, "embedded queue drain failed"),
            }
        }
    });

    let router = codemesh_server::build_router(state);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("listening on {addr}");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutting down");
}

pub async fn index(project_slug: String, source_name: Option<String>, path: Option<PathBuf>) -> anyhow::Result<()> {
    let config = Config::from_env()?;
    let state = bootstrap(config).await?;

    let project = match state.store.get_project_by_slug(state.default_tenant, &project_slug).await {
        Ok(project) => project,
        Err(codemesh_store::StoreError::NotFound(_)) => {
            state
                .store
                .create_project(state.default_tenant, &project_slug, &project_slug)
                .await?
        }
        Err(err) => return Err(err.into()),
    };

    let source = match path {
        Some(path) => {
            state
                .store
                .create_source(
                    project.id,
                    source_name.as_deref().unwrap_or("local"),
                    SourceKind::Filesystem,
                    Some(path.to_string_lossy().as_ref()),
                )
                .await?
        }
        None => {
            let sources = state.store.list_sources(project.id).await?;
            match source_name {
                Some(name) => sources
                    .into_iter()
                    .find(|s| s.name == name)
                    .ok_or_else(|| anyhow::anyhow!("no source named {name} on project {project_slug}"))?,
                None => sources
                    .into_iter()
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("project {project_slug} has no sources; pass --path to create one"))?,
            }
        }
    };

    let run = state.orchestrator.run(&project, &source, &Cancellation::new()).await?;
    tracing::info!(
        status = run.status.as_str(),
        files = run.counters.files_processed,
        symbols = run.counters.symbols_found,
        edges = run.counters.edges_found,
        "index run finished"
    );
    Ok(())
}

/// Long-polls the ingestion queue as a "worker" consumer. Against the
/// bundled `InMemoryQueue`, this only sees jobs submitted by a `serve`
/// process sharing the same queue instance — a real deployment swaps
/// in a broker-backed `JobQueue` so this loop can run as its own
/// horizontally-scaled process.
pub async fn worker(group: String) -> anyhow::Result<()> {
    let config = Config::from_env()?;
    let state = bootstrap(config).await?;

    tracing::info!(group, "worker polling for ingestion jobs");
    loop {
        match state.orchestrator.drain_one(&group, Duration::from_secs(10)).await {
            Ok(true) => tracing::info!("processed one ingestion job"),
            Ok(false) => {}
            Err(err) => tracing::warn!(error = %err, "job execution failed"),
        }
    }
}
