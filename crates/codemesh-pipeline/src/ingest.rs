//! The Ingestion Pipeline orchestrator: runs one project's
//! `IndexRun` through materialize -> enumerate -> parse -> resolve ->
//! lineage -> embed -> graph sync -> analytics, each stage idempotent
//! and independently retryable, checkpointed on the `IndexRun` row so a
//! re-run after a crash tolerates partial data from the prior attempt.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use futures_util::stream::{self, StreamExt};
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use codemesh_ai::{CodebaseFact, Embedder, EmbeddingKind, SummaryBridge, SummaryContext, TemplateSummary};
use codemesh_core::cancellation::Cancellation;
use codemesh_core::enums::{IndexRunStatus, PipelineStage, SourceKind};
use codemesh_core::graph::{GraphMirror, GraphMirrorRegistry};
use codemesh_core::ids::{ColumnReferenceId, FileId, IndexRunId, ProjectId, SymbolId};
use codemesh_core::model::{
    ColumnReference, File as FileRow, IndexRun, IndexRunCounters, Project, Source, Symbol, SymbolEmbedding,
    SymbolMetadata, SymbolSpan,
};
use codemesh_parsers::{ParseResult, ParserRegistry, RawReference};
use codemesh_store::Store;

use crate::error::PipelineError;
use crate::queue::{IngestJob, JobQueue, JobType};
use crate::{analytics, lineage, resolve};

/// Paths that classify a file as schema/migration for the purposes of
/// The "suppress column lineage, keep symbol extraction" rule for
/// schema/migration files, on top of whatever the project's own
/// `lineage_exclude_paths` globs add.
const MIGRATION_PATH_HINTS: &[&str] = &["migrations/", "migration/", "/schema/", "db/migrate/"];

fn looks_like_migration(path: &str) -> bool {
    let lower = path.to_ascii_lowercase();
    MIGRATION_PATH_HINTS.iter().any(|hint| lower.contains(hint))
}

/// Obtains the local file tree for a `Source`. The core consumes a
/// local directory of files and a source identifier — cloning,
/// extracting, or otherwise fetching that tree is an external
/// collaborator's job). One implementation ships here, covering the
/// `filesystem` source kind directly; other kinds are expected to be
/// materialized onto disk by that collaborator before `Orchestrator::run`
/// is called, with a `Materializer` that simply resolves their local path.
#[async_trait]
pub trait Materializer: Send + Sync {
    async fn materialize(&self, source: &Source) -> Result<PathBuf, PipelineError>;
}

/// Treats `Source::connection_uri` as an already-local path. Correct for
/// `SourceKind::Filesystem`; any other kind means a real collaborator
/// (git clone, zip extraction, object-store fetch) was supposed to run
/// first and hand this implementation its output directory, which it
/// has no way to know about, so it reports `UnsupportedSource`.
pub struct LocalDirMaterializer;

#[async_trait]
impl Materializer for LocalDirMaterializer {
    async fn materialize(&self, source: &Source) -> Result<PathBuf, PipelineError> {
        match source.kind {
            SourceKind::Filesystem => {
                let uri = source
                    .connection_uri
                    .as_deref()
                    .ok_or(PipelineError::UnsupportedSource(source.id))?;
                Ok(PathBuf::from(uri))
            }
            _ => Err(PipelineError::UnsupportedSource(source.id)),
        }
    }
}

pub struct OrchestratorConfig {
    /// Worker pool width for the Parse stage: a worker pool with
    /// configurable width, each worker processing one file.
    pub parse_concurrency: usize,
    /// Per-stage deadline. Ingestion stages default to 15 minutes,
    /// configurable.
    pub stage_timeout: Duration,
    /// Batch size for embedding requests.
    pub embed_batch_size: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            parse_concurrency: num_cpus::get(),
            stage_timeout: Duration::from_secs(15 * 60),
            embed_batch_size: 64,
        }
    }
}

/// Drives one `IndexRun` at a time per project (the "at most one
/// running IndexRun per project" rule is enforced by the
/// Postgres advisory lock `Store::try_acquire_project_lock` wraps,
/// with an in-process `DashMap` fast-path so two callers on the same
/// process don't both pay the round trip to discover the conflict).
pub struct Orchestrator {
    store: Store,
    materializer: Arc<dyn Materializer>,
    parsers: Arc<ParserRegistry>,
    graphs: Arc<GraphMirrorRegistry>,
    embedder: Option<Arc<dyn Embedder>>,
    summarizer: Arc<dyn SummaryBridge>,
    config: OrchestratorConfig,
    in_process_locks: DashMap<ProjectId, ()>,
    queue: Option<Arc<dyn JobQueue>>,
}

struct FileTask {
    file_id: FileId,
    path: String,
    content: String,
}

impl Orchestrator {
    pub fn new(store: Store, graphs: Arc<GraphMirrorRegistry>) -> Self {
        Self {
            store,
            materializer: Arc::new(LocalDirMaterializer),
            parsers: Arc::new(ParserRegistry::with_default_parsers()),
            graphs,
            embedder: None,
            summarizer: Arc::new(TemplateSummary),
            config: OrchestratorConfig::default(),
            in_process_locks: DashMap::new(),
            queue: None,
        }
    }

    pub fn with_materializer(mut self, materializer: Arc<dyn Materializer>) -> Self {
        self.materializer = materializer;
        self
    }

    pub fn with_embedder(mut self, embedder: Arc<dyn Embedder>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    pub fn with_summarizer(mut self, summarizer: Arc<dyn SummaryBridge>) -> Self {
        self.summarizer = summarizer;
        self
    }

    pub fn with_config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    /// Wires a queue into `submit()`/`drain_one()` for the `worker`
    /// subcommand. Without one, `submit()` degrades to running inline.
    pub fn with_queue(mut self, queue: Arc<dyn JobQueue>) -> Self {
        self.queue = Some(queue);
        self
    }

    /// Runs one end-to-end `IndexRun` for `project`/`source` inline,
    /// creating the run and driving it to completion before returning.
    /// Used by the synchronous REST trigger endpoint and the `index` CLI
    /// command, where there's a caller waiting on the result. Returns the
    /// run's final state on both success and a well-understood pipeline
    /// failure (stage failure, cancellation) — only store/lock
    /// bookkeeping errors escape as `Err`.
    pub async fn run(
        &self,
        project: &Project,
        source: &Source,
        cancellation: &Cancellation,
    ) -> Result<IndexRun, PipelineError> {
        let run = IndexRun::pending(project.id, Some(source.id));
        self.store.create_index_run(&run).await?;
        self.execute(run.id, project, source, cancellation).await
    }

    /// Creates a `Pending` `IndexRun` and hands it to the configured
    /// queue for a `worker` process to pick up (consumer-group
    /// model), returning immediately. Falls back to running inline when
    /// no queue is configured — a single-process deployment has nowhere
    /// else to send the job.
    pub async fn submit(&self, project: &Project, source: &Source) -> Result<IndexRun, PipelineError> {
        let run = IndexRun::pending(project.id, Some(source.id));
        self.store.create_index_run(&run).await?;

        match &self.queue {
            Some(queue) => {
                queue
                    .enqueue(IngestJob {
                        job_type: JobType::Index,
                        project_id: project.id,
                        source_id: Some(source.id),
                        index_run_id: run.id,
                    })
                    .await;
                Ok(run)
            }
            None => self.execute(run.id, project, source, &Cancellation::new()).await,
        }
    }

    /// Drives an already-created `run_id` through every stage, enforcing
    /// the "at most one running IndexRun per project" rule via the
    /// in-process fast path plus the cross-process Postgres advisory
    /// lock. Called directly by [`Orchestrator::run`] and by the worker
    /// loop after dequeuing an [`IngestJob`].
    pub async fn execute(
        &self,
        run_id: IndexRunId,
        project: &Project,
        source: &Source,
        cancellation: &Cancellation,
    ) -> Result<IndexRun, PipelineError> {
        if self.in_process_locks.contains_key(&project.id) {
            return Err(PipelineError::AlreadyRunning(project.id));
        }
        self.in_process_locks.insert(project.id, ());
        let db_locked = self.store.try_acquire_project_lock(project.id).await?;
        if !db_locked {
            self.in_process_locks.remove(&project.id);
            return Err(PipelineError::AlreadyRunning(project.id));
        }

        let result = self.execute_locked(run_id, project, source, cancellation).await;

        self.store.release_project_lock(project.id).await.ok();
        self.in_process_locks.remove(&project.id);
        result
    }

    async fn execute_locked(
        &self,
        run_id: IndexRunId,
        project: &Project,
        source: &Source,
        cancellation: &Cancellation,
    ) -> Result<IndexRun, PipelineError> {
        self.store
            .transition_index_run(run_id, IndexRunStatus::Running, None, None)
            .await?;

        match self.run_stages(project, source, run_id, cancellation).await {
            Ok(()) => {
                self.store
                    .transition_index_run(run_id, IndexRunStatus::Completed, None, None)
                    .await?;
            }
            Err(PipelineError::Cancelled) => {
                self.store
                    .transition_index_run(run_id, IndexRunStatus::Cancelled, None, None)
                    .await?;
            }
            // Any other stage failure was already recorded onto the run
            // (failing_stage + error_message) by `fail_run` inside
            // `run_stages`; nothing further to persist here.
            Err(_) => {}
        }

        Ok(self.store.get_index_run(run_id).await?)
    }

    /// One iteration of the worker loop: long-polls the queue for the
    /// next job and, if one arrives within
    /// `poll_timeout`, executes it. Returns `false` when nothing was
    /// dequeued, so callers can distinguish idle polling from real work.
    pub async fn drain_one(&self, consumer_group: &str, poll_timeout: Duration) -> Result<bool, PipelineError> {
        let Some(queue) = &self.queue else {
            return Ok(false);
        };
        let Some(job) = queue.dequeue(consumer_group, poll_timeout).await else {
            return Ok(false);
        };

        let project = self.store.get_project(job.project_id).await?;
        let source = match job.source_id {
            Some(id) => self.store.get_source(id).await?,
            None => return Err(PipelineError::UnsupportedSource(codemesh_core::ids::SourceId::new())),
        };

        self.execute(job.index_run_id, &project, &source, &Cancellation::new())
            .await?;
        Ok(true)
    }

    /// Runs every stage in strict sequence, checking cancellation at
    /// each boundary. A stage failure is persisted onto the `IndexRun`
    /// (`failing_stage` + `error_message`) and short-circuits the rest of
    /// the pipeline rather than propagating a raw error to the caller.
    async fn run_stages(
        &self,
        project: &Project,
        source: &Source,
        run_id: IndexRunId,
        cancellation: &Cancellation,
    ) -> Result<(), PipelineError> {
        macro_rules! stage {
            ($name:expr, $stage:expr, $body:expr) => {
                if cancellation.is_cancelled() {
                    return Err(PipelineError::Cancelled);
                }
                match $body.await {
                    Ok(value) => value,
                    Err(err) => {
                        self.fail_run(run_id, $stage, &err).await;
                        return Err(err);
                    }
                }
            };
        }

        let root = stage!("materialize", PipelineStage::Materialize, self.materialize(source));
        self.store.mark_source_synced(source.id, None).await.ok();

        let tasks = stage!(
            "enumerate",
            PipelineStage::Enumerate,
            self.enumerate(project, source, &root)
        );

        let (raw_references, parsed_symbol_count) = stage!(
            "parse",
            PipelineStage::Parse,
            self.parse(project, run_id, tasks, cancellation)
        );
        self.store
            .increment_index_run_counters(
                run_id,
                &IndexRunCounters {
                    files_processed: 0,
                    symbols_found: parsed_symbol_count as u64,
                    edges_found: 0,
                },
            )
            .await
            .ok();

        if cancellation.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }

        let all_symbols = stage!(
            "resolve:load-symbols",
            PipelineStage::Resolve,
            self.load_all_symbols(project.id)
        );
        let index = resolve::SymbolIndex::build(&all_symbols);

        let resolved_edge_count = stage!(
            "resolve",
            PipelineStage::Resolve,
            self.resolve(project.id, &index, &raw_references)
        );

        let lineage_edge_count = stage!(
            "lineage",
            PipelineStage::Lineage,
            self.run_lineage(project.id, run_id, &index)
        );
        self.store
            .increment_index_run_counters(
                run_id,
                &IndexRunCounters {
                    files_processed: 0,
                    symbols_found: 0,
                    edges_found: (resolved_edge_count + lineage_edge_count) as u64,
                },
            )
            .await
            .ok();

        stage!("embed", PipelineStage::Embed, self.embed(project.id, &all_symbols));

        if cancellation.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }

        let mirror = stage!(
            "graph_sync",
            PipelineStage::GraphSync,
            self.graph_sync(project.id, &all_symbols)
        );

        stage!(
            "analytics",
            PipelineStage::Analytics,
            self.run_analytics(project.id, &mirror, &all_symbols)
        );

        Ok(())
    }

    async fn fail_run(&self, run_id: IndexRunId, stage: PipelineStage, err: &PipelineError) {
        warn!(stage = %stage, error = %err, "index run stage failed");
        let message = err.to_string();
        self.store
            .transition_index_run(run_id, IndexRunStatus::Failed, Some(stage), Some(&message))
            .await
            .ok();
    }

    // ---- stage 1: materialize ----------------------------------------------

    async fn materialize(&self, source: &Source) -> Result<PathBuf, PipelineError> {
        self.materializer.materialize(source).await
    }

    // ---- stage 2: enumerate -------------------------------------------------

    /// Walks `root`, hashing every file and upserting its `File` row.
    /// Files whose content hash matches the prior run are still upserted
    /// (so `last_indexed_at`/`source_id` stay current) but are not
    /// queued for reparse — the incremental-indexing invariant.
    async fn enumerate(&self, project: &Project, source: &Source, root: &Path) -> Result<Vec<FileTask>, PipelineError> {
        let mut tasks = Vec::new();
        let walker = ignore::WalkBuilder::new(root).hidden(false).build();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(error = %err, "skipping unreadable directory entry");
                    continue;
                }
            };
            if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                continue;
            }
            let abs_path = entry.path();
            let rel_path = abs_path
                .strip_prefix(root)
                .unwrap_or(abs_path)
                .to_string_lossy()
                .replace('\\', "/");

            let content = match std::fs::read_to_string(abs_path) {
                Ok(content) => content,
                Err(_) => continue, // binary or unreadable; not a parseable source file
            };

            let content_hash = format!("{:x}", Sha256::digest(content.as_bytes()));
            let parser = self.parsers.for_path(abs_path, &content);

            let file = FileRow {
                id: FileId::new(),
                project_id: project.id,
                source_id: source.id,
                path: rel_path.clone(),
                language: parser.language(),
                size: content.len() as u64,
                content_hash,
                last_indexed_at: None,
            };

            let (file_id, changed) = self.store.upsert_file(&file).await?;
            if changed {
                tasks.push(FileTask {
                    file_id,
                    path: rel_path,
                    content,
                });
            }
        }

        Ok(tasks)
    }

    // ---- stage 3: parse -----------------------------------------------------

    /// Parses every changed file with up to `parse_concurrency` workers.
    /// Per-file failures are recorded on the file and counted, never
    /// fatal to the run. Returns the raw references gathered this
    /// run (kept in memory — Resolve runs immediately after within the
    /// same `IndexRun`, so there is no need to stage them) and the total
    /// symbol count inserted.
    async fn parse(
        &self,
        project: &Project,
        run_id: IndexRunId,
        tasks: Vec<FileTask>,
        cancellation: &Cancellation,
    ) -> Result<(Vec<RawReference>, usize), PipelineError> {
        let width = self.config.parse_concurrency.max(1);
        let results: Vec<Option<(Vec<RawReference>, usize)>> = stream::iter(tasks)
            .map(|task| {
                let project = project;
                let cancellation = cancellation.clone();
                async move {
                    if cancellation.is_cancelled() {
                        return None;
                    }
                    self.parse_one_file(project, run_id, task).await
                }
            })
            .buffer_unordered(width)
            .collect()
            .await;

        let mut raw_references = Vec::new();
        let mut symbol_count = 0;
        for outcome in results.into_iter().flatten() {
            raw_references.extend(outcome.0);
            symbol_count += outcome.1;
        }
        Ok((raw_references, symbol_count))
    }

    async fn parse_one_file(
        &self,
        project: &Project,
        run_id: IndexRunId,
        task: FileTask,
    ) -> Option<(Vec<RawReference>, usize)> {
        let path = Path::new(&task.path);
        let parser = self.parsers.for_path(path, &task.content);
        let skip_column_lineage = looks_like_migration(&task.path) || project.settings.is_lineage_excluded(&task.path);

        let parse_result = match parser.parse(path, &task.content) {
            Ok(result) => result,
            Err(err) => {
                self.store
                    .record_file_parse_error(task.file_id, &err.to_string())
                    .await
                    .ok();
                return None;
            }
        };

        let ParseResult {
            symbols: parsed_symbols,
            references,
            column_references,
        } = parse_result;

        let symbols: Vec<Symbol> = parsed_symbols
            .into_iter()
            .map(|p| Symbol {
                id: SymbolId::new(),
                project_id: project.id,
                file_id: task.file_id,
                name: p.name,
                qualified_name: p.qualified_name,
                kind: p.kind,
                language: parser.language(),
                span: SymbolSpan {
                    start_line: p.span.start_line,
                    end_line: p.span.end_line,
                    start_col: None,
                    end_col: None,
                },
                signature: p.signature,
                doc: p.doc,
                metadata: SymbolMetadata {
                    is_migration: skip_column_lineage,
                    ..Default::default()
                },
            })
            .collect();

        if let Err(err) = self.store.delete_symbols_for_file(task.file_id).await {
            warn!(error = %err, file = %task.file_id, "failed to clear stale symbols before reinsert");
        }
        if let Err(err) = self.store.bulk_insert_symbols(&symbols).await {
            warn!(error = %err, file = %task.file_id, "failed to persist parsed symbols");
            self.store
                .record_file_parse_error(task.file_id, &err.to_string())
                .await
                .ok();
            return None;
        }

        if !skip_column_lineage && !column_references.is_empty() {
            let staged: Vec<ColumnReference> = column_references
                .into_iter()
                .map(|c| ColumnReference {
                    id: ColumnReferenceId::new(),
                    project_id: project.id,
                    index_run_id: run_id,
                    source_column: c.source_column,
                    target_column: c.target_column,
                    derivation_type: c.derivation_type,
                    expression: c.expression,
                    context: c.context,
                    line: c.line,
                })
                .collect();
            self.store
                .insert_column_references(project.id, run_id, &staged)
                .await
                .ok();
        }

        self.store.mark_file_indexed(task.file_id).await.ok();

        let symbol_count = symbols.len();
        Some((references, symbol_count))
    }

    // ---- stage 4: resolve ----------------------------------------------------

    async fn load_all_symbols(&self, project_id: ProjectId) -> Result<Vec<Symbol>, PipelineError> {
        let mut all = Vec::new();
        let mut after = None;
        loop {
            let page = self.store.list_symbols_page(project_id, after, 500).await?;
            if page.is_empty() {
                break;
            }
            after = page.last().map(|s| s.id);
            all.extend(page);
        }
        Ok(all)
    }

    async fn resolve(
        &self,
        project_id: ProjectId,
        index: &resolve::SymbolIndex,
        references: &[RawReference],
    ) -> Result<usize, PipelineError> {
        let (edges, stats) = resolve::resolve_references(project_id, index, references);
        info!(resolved = stats.resolved, dropped = stats.dropped, "resolved raw references");
        let count = edges.len();
        self.store.bulk_upsert_edges(project_id, &edges).await?;
        Ok(count)
    }

    // ---- stage 5: lineage ------------------------------------------------------

    async fn run_lineage(
        &self,
        project_id: ProjectId,
        run_id: IndexRunId,
        index: &resolve::SymbolIndex,
    ) -> Result<usize, PipelineError> {
        let staged = self.store.take_column_references(run_id).await?;
        let (edges, stats) = lineage::resolve_column_references(project_id, index, &staged);
        info!(
            resolved = stats.resolved,
            parent_fallback = stats.parent_fallback,
            dropped = stats.dropped,
            "resolved column lineage"
        );
        let count = edges.len();
        self.store.bulk_upsert_edges(project_id, &edges).await?;
        Ok(count)
    }

    // ---- stage 6: embed --------------------------------------------------------

    /// Embeds every symbol that has no embedding yet or was touched this
    /// run. A missing embedder degrades the stage to a no-op rather than
    /// failing the run: a missing embedder skips the stage rather than
    /// failing it.
    async fn embed(&self, project_id: ProjectId, symbols: &[Symbol]) -> Result<(), PipelineError> {
        let Some(embedder) = self.embedder.clone() else {
            info!(project = %project_id, "no embedder configured, skipping embed stage");
            return Ok(());
        };

        for chunk in symbols.chunks(self.config.embed_batch_size) {
            let texts: Vec<String> = chunk.iter().map(symbol_embedding_text).collect();
            let vectors = codemesh_core::retry::retry_with_backoff(
                "embed_batch",
                || embedder.embed_batch(&texts, EmbeddingKind::Symbol),
                |err: &codemesh_ai::AiError| err.is_retriable(),
            )
            .await?;

            for (symbol, vector) in chunk.iter().zip(vectors) {
                let embedding = SymbolEmbedding {
                    id: codemesh_core::ids::SymbolEmbeddingId::new(),
                    symbol_id: symbol.id,
                    vector,
                    model: embedder.model_name().to_string(),
                };
                self.store.upsert_embedding(&embedding).await?;
            }
        }

        Ok(())
    }

    // ---- stage 7: graph sync -----------------------------------------------------

    /// Builds a fresh `GraphMirror` off to the side from the relational
    /// store's current symbols/edges and swaps it in atomically — the
    /// "never a partial mixture" guarantee.
    async fn graph_sync(&self, project_id: ProjectId, symbols: &[Symbol]) -> Result<GraphMirror, PipelineError> {
        let edges = self.store.all_edges_for_project(project_id).await?;

        let mut mirror = GraphMirror::new();
        for symbol in symbols {
            mirror.add_node(symbol.id, symbol.kind);
        }
        for edge in &edges {
            mirror.add_edge(
                edge.source_symbol_id,
                edge.target_symbol_id,
                edge.edge_type,
                edge.metadata.confidence.unwrap_or(1.0),
            );
        }

        self.graphs.swap(project_id, clone_mirror(&mirror, symbols, &edges));
        Ok(mirror)
    }

    // ---- stage 8: analytics -----------------------------------------------------

    async fn run_analytics(
        &self,
        project_id: ProjectId,
        mirror: &GraphMirror,
        symbols: &[Symbol],
    ) -> Result<(), PipelineError> {
        let files = self.store.list_files(project_id).await?;
        let path_by_file: HashMap<FileId, String> = files.into_iter().map(|f| (f.id, f.path)).collect();
        let file_path_of: HashMap<SymbolId, String> = symbols
            .iter()
            .filter_map(|s| path_by_file.get(&s.file_id).map(|p| (s.id, p.clone())))
            .collect();

        let (per_symbol, project_analytics) =
            analytics::compute_project_analytics(project_id, mirror, symbols, &file_path_of, self.summarizer.as_ref())
                .await;

        for (symbol_id, metadata) in &per_symbol {
            self.store.update_symbol_metadata(*symbol_id, metadata).await?;
        }
        self.store.upsert_analytics(&project_analytics).await?;

        Ok(())
    }
}

/// `GraphMirror` doesn't implement `Clone` (it's meant to be built once
/// and swapped, not copied); `graph_sync` needs one copy to hand to the
/// registry and one to return for the Analytics stage to read from, so
/// this rebuilds the second copy from the same symbols/edges rather than
/// adding a `Clone` impl used nowhere else.
fn clone_mirror(_reference: &GraphMirror, symbols: &[Symbol], edges: &[codemesh_core::model::SymbolEdge]) -> GraphMirror {
    let mut mirror = GraphMirror::new();
    for symbol in symbols {
        mirror.add_node(symbol.id, symbol.kind);
    }
    for edge in edges {
        mirror.add_edge(
            edge.source_symbol_id,
            edge.target_symbol_id,
            edge.edge_type,
            edge.metadata.confidence.unwrap_or(1.0),
        );
    }
    mirror
}

fn symbol_embedding_text(symbol: &Symbol) -> String {
    format!(
        "{} {}\n{}\n{}",
        symbol.kind.as_str(),
        symbol.qualified_name,
        symbol.signature.as_deref().unwrap_or(""),
        symbol.doc.as_deref().unwrap_or(""),
    )
}

#[allow(dead_code)]
fn to_summary_context(symbol: &Symbol, file_path: &str) -> SummaryContext {
    SummaryContext {
        qualified_name: symbol.qualified_name.clone(),
        kind: symbol.kind.as_str().to_string(),
        language: symbol.language.as_str().to_string(),
        file_path: file_path.to_string(),
        signature: symbol.signature.clone(),
        doc: symbol.doc.clone(),
        incoming: Vec::new(),
        outgoing: Vec::new(),
    }
}

#[allow(dead_code)]
fn to_codebase_fact(symbol: &Symbol) -> CodebaseFact {
    CodebaseFact {
        description: format!("{} {}", symbol.kind.as_str(), symbol.qualified_name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migration_path_hints_match_common_layouts() {
        assert!(looks_like_migration("migrations/2024_01_add_users.sql"));
        assert!(looks_like_migration("db/migrate/001_init.sql"));
        assert!(!looks_like_migration("src/repositories/UserRepo.cs"));
    }

    #[test]
    fn local_materializer_rejects_non_filesystem_sources() {
        let source = Source {
            id: codemesh_core::ids::SourceId::new(),
            project_id: ProjectId::new(),
            name: "repo".to_string(),
            kind: SourceKind::Git,
            connection_uri: Some("https://example.invalid/repo.git".to_string()),
            config: serde_json::json!({}),
            last_synced_at: None,
            last_commit_sha: None,
        };
        let materializer = LocalDirMaterializer;
        let result = tokio_test::block_on(materializer.materialize(&source));
        assert!(matches!(result, Err(PipelineError::UnsupportedSource(_))));
    }
}
