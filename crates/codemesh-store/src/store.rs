//! Single `Store` over one `PgPool`. A per-entity repository split
//! (considered, following the `matric-db` pattern) was rejected here —
//! the operation count per entity is small enough that one struct with
//! grouped methods reads better than a dozen near-empty repository
//! structs. See DESIGN.md.

use std::str::FromStr;

use serde_json::Value as Json;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use sqlx::Row;

use codemesh_core::enums::{
    AnalyticsScope, DerivationType, EdgeType, IndexRunStatus, Language, PipelineStage, SourceKind,
    SymbolKind,
};
use codemesh_core::ids::{
    ColumnReferenceId, FileId, IndexRunId, ProjectId, SourceId, SymbolEdgeId, SymbolEmbeddingId,
    SymbolId, TenantId,
};
use codemesh_core::model::{
    ColumnReference, EdgeMetadata, File, IndexRun, IndexRunCounters, Project, ProjectAnalytics,
    ProjectSettings, Source, Symbol, SymbolEdge, SymbolEmbedding, SymbolMetadata, SymbolSpan,
    Tenant,
};

use crate::error::StoreError;

#[derive(Clone)]
pub struct Store {
    pool: PgPool,
}

impl Store {
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("select 1").execute(&self.pool).await?;
        Ok(())
    }

    // ---- tenants / projects / sources ----------------------------------

    pub async fn create_tenant(&self, name: &str, slug: &str) -> Result<Tenant, StoreError> {
        let row = sqlx::query("insert into tenants (name, slug) values ($1, $2) returning id")
            .bind(name)
            .bind(slug)
            .fetch_one(&self.pool)
            .await?;
        Ok(Tenant {
            id: TenantId(row.get("id")),
            name: name.to_string(),
            slug: slug.to_string(),
        })
    }

    /// Idempotent tenant lookup for single-tenant deployments, resolved
    /// once at startup — the `serve`/`index`
    /// CLI paths call this instead of `create_tenant` so a restart
    /// against an already-bootstrapped database doesn't error on the
    /// `slug` uniqueness constraint.
    pub async fn get_or_create_tenant(&self, name: &str, slug: &str) -> Result<Tenant, StoreError> {
        let row = sqlx::query(
            "insert into tenants (name, slug) values ($1, $2)
             on conflict (slug) do update set slug = excluded.slug
             returning id",
        )
        .bind(name)
        .bind(slug)
        .fetch_one(&self.pool)
        .await?;
        Ok(Tenant {
            id: TenantId(row.get("id")),
            name: name.to_string(),
            slug: slug.to_string(),
        })
    }

    pub async fn create_project(
        &self,
        tenant_id: TenantId,
        slug: &str,
        name: &str,
    ) -> Result<Project, StoreError> {
        let settings = ProjectSettings::default();
        let settings_json = serde_json::to_value(&settings).unwrap_or_else(|_| Json::Object(Default::default()));
        let row = sqlx::query(
            "insert into projects (tenant_id, slug, name, settings) values ($1, $2, $3, $4) returning id",
        )
        .bind(tenant_id.0)
        .bind(slug)
        .bind(name)
        .bind(&settings_json)
        .fetch_one(&self.pool)
        .await?;

        Ok(Project {
            id: ProjectId(row.get("id")),
            tenant_id,
            slug: slug.to_string(),
            name: name.to_string(),
            settings,
        })
    }

    pub async fn get_project(&self, project_id: ProjectId) -> Result<Project, StoreError> {
        let row = sqlx::query("select id, tenant_id, slug, name, settings from projects where id = $1")
            .bind(project_id.0)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("project {project_id}")))?;
        row_to_project(row)
    }

    pub async fn get_project_by_slug(
        &self,
        tenant_id: TenantId,
        slug: &str,
    ) -> Result<Project, StoreError> {
        let row = sqlx::query(
            "select id, tenant_id, slug, name, settings from projects where tenant_id = $1 and slug = $2",
        )
        .bind(tenant_id.0)
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("project {slug}")))?;
        row_to_project(row)
    }

    pub async fn list_projects(&self, tenant_id: TenantId) -> Result<Vec<Project>, StoreError> {
        let rows = sqlx::query(
            "select id, tenant_id, slug, name, settings from projects where tenant_id = $1 order by slug",
        )
        .bind(tenant_id.0)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(row_to_project).collect()
    }

    pub async fn create_source(
        &self,
        project_id: ProjectId,
        name: &str,
        kind: SourceKind,
        connection_uri: Option<&str>,
    ) -> Result<Source, StoreError> {
        let row = sqlx::query(
            "insert into sources (project_id, name, kind, connection_uri) values ($1, $2, $3, $4) returning id",
        )
        .bind(project_id.0)
        .bind(name)
        .bind(kind.as_str())
        .bind(connection_uri)
        .fetch_one(&self.pool)
        .await?;

        Ok(Source {
            id: SourceId(row.get("id")),
            project_id,
            name: name.to_string(),
            kind,
            connection_uri: connection_uri.map(str::to_string),
            config: Json::Object(Default::default()),
            last_synced_at: None,
            last_commit_sha: None,
        })
    }

    pub async fn get_source(&self, source_id: SourceId) -> Result<Source, StoreError> {
        let row = sqlx::query(
            "select id, project_id, name, kind, connection_uri, config, last_synced_at, last_commit_sha
             from sources where id = $1",
        )
        .bind(source_id.0)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("source {source_id}")))?;

        let kind: String = row.get("kind");
        Ok(Source {
            id: SourceId(row.get("id")),
            project_id: ProjectId(row.get("project_id")),
            name: row.get("name"),
            kind: SourceKind::from_str(&kind).map_err(|e| StoreError::NotFound(e.to_string()))?,
            connection_uri: row.get("connection_uri"),
            config: row.get("config"),
            last_synced_at: row.get("last_synced_at"),
            last_commit_sha: row.get("last_commit_sha"),
        })
    }

    pub async fn mark_source_synced(&self, source_id: SourceId, commit_sha: Option<&str>) -> Result<(), StoreError> {
        sqlx::query("update sources set last_synced_at = now(), last_commit_sha = coalesce($1, last_commit_sha) where id = $2")
            .bind(commit_sha)
            .bind(source_id.0)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn list_sources(&self, project_id: ProjectId) -> Result<Vec<Source>, StoreError> {
        let rows = sqlx::query(
            "select id, project_id, name, kind, connection_uri, config, last_synced_at, last_commit_sha
             from sources where project_id = $1",
        )
        .bind(project_id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let kind: String = row.get("kind");
                Ok(Source {
                    id: SourceId(row.get("id")),
                    project_id,
                    name: row.get("name"),
                    kind: SourceKind::from_str(&kind).map_err(|e| StoreError::NotFound(e.to_string()))?,
                    connection_uri: row.get("connection_uri"),
                    config: row.get("config"),
                    last_synced_at: row.get("last_synced_at"),
                    last_commit_sha: row.get("last_commit_sha"),
                })
            })
            .collect()
    }

    // ---- index runs ------------------------------------------------------

    pub async fn create_index_run(&self, run: &IndexRun) -> Result<(), StoreError> {
        sqlx::query(
            "insert into index_runs (id, project_id, source_id, status, files_processed, symbols_found, edges_found)
             values ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(run.id.0)
        .bind(run.project_id.0)
        .bind(run.source_id.map(|s| s.0))
        .bind(run.status.as_str())
        .bind(run.counters.files_processed as i64)
        .bind(run.counters.symbols_found as i64)
        .bind(run.counters.edges_found as i64)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn transition_index_run(
        &self,
        id: IndexRunId,
        status: IndexRunStatus,
        failing_stage: Option<PipelineStage>,
        error_message: Option<&str>,
    ) -> Result<(), StoreError> {
        let completed = matches!(
            status,
            IndexRunStatus::Completed | IndexRunStatus::Failed | IndexRunStatus::Cancelled
        );
        sqlx::query(
            "update index_runs set status = $1, failing_stage = $2, error_message = $3,
             started_at = case when started_at is null and $1 = 'running' then now() else started_at end,
             completed_at = case when $4 then now() else completed_at end
             where id = $5",
        )
        .bind(status.as_str())
        .bind(failing_stage.map(|s| s.as_str()))
        .bind(error_message)
        .bind(completed)
        .bind(id.0)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn increment_index_run_counters(
        &self,
        id: IndexRunId,
        counters: &IndexRunCounters,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "update index_runs set files_processed = files_processed + $1,
             symbols_found = symbols_found + $2, edges_found = edges_found + $3 where id = $4",
        )
        .bind(counters.files_processed as i64)
        .bind(counters.symbols_found as i64)
        .bind(counters.edges_found as i64)
        .bind(id.0)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_index_run(&self, id: IndexRunId) -> Result<IndexRun, StoreError> {
        let row = sqlx::query(
            "select id, project_id, source_id, status, files_processed, symbols_found, edges_found,
                started_at, completed_at, failing_stage, error_message
             from index_runs where id = $1",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("index run {id}")))?;
        row_to_index_run(row)
    }

    pub async fn list_index_runs(&self, project_id: ProjectId) -> Result<Vec<IndexRun>, StoreError> {
        let rows = sqlx::query(
            "select id, project_id, source_id, status, files_processed, symbols_found, edges_found,
                started_at, completed_at, failing_stage, error_message
             from index_runs where project_id = $1 order by started_at desc nulls first",
        )
        .bind(project_id.0)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(row_to_index_run).collect()
    }

    // ---- files -------------------------------------------------------------

    /// Upserts a file by `(project_id, path)`. Returns `true` when the
    /// content hash changed (or the file is new) — the caller uses this
    /// to decide whether the file needs reparsing.
    pub async fn upsert_file(&self, file: &File) -> Result<(FileId, bool), StoreError> {
        let existing_hash: Option<String> = sqlx::query_scalar(
            "select content_hash from files where project_id = $1 and path = $2",
        )
        .bind(file.project_id.0)
        .bind(&file.path)
        .fetch_optional(&self.pool)
        .await?;

        let changed = existing_hash.as_deref() != Some(file.content_hash.as_str());

        let row = sqlx::query(
            "insert into files (id, project_id, source_id, path, language, size, content_hash, last_indexed_at)
             values ($1, $2, $3, $4, $5, $6, $7, case when $8 then null else now() end)
             on conflict (project_id, path) do update set
                source_id = excluded.source_id,
                language = excluded.language,
                size = excluded.size,
                content_hash = excluded.content_hash,
                last_indexed_at = case when $8 then null else files.last_indexed_at end
             returning id",
        )
        .bind(file.id.0)
        .bind(file.project_id.0)
        .bind(file.source_id.0)
        .bind(&file.path)
        .bind(file.language.as_str())
        .bind(file.size as i64)
        .bind(&file.content_hash)
        .bind(changed)
        .fetch_one(&self.pool)
        .await?;

        Ok((FileId(row.get("id")), changed))
    }

    pub async fn get_file(&self, file_id: FileId) -> Result<File, StoreError> {
        let row = sqlx::query(
            "select id, project_id, source_id, path, language, size, content_hash, last_indexed_at
             from files where id = $1",
        )
        .bind(file_id.0)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("file {file_id}")))?;
        row_to_file(row)
    }

    /// Every file currently known for a project. Unpaginated like
    /// [`Store::bulk_insert_symbols`] — a codebase with enough files to
    /// make this expensive needs a different store, not a different API.
    pub async fn list_files(&self, project_id: ProjectId) -> Result<Vec<File>, StoreError> {
        let rows = sqlx::query(
            "select id, project_id, source_id, path, language, size, content_hash, last_indexed_at
             from files where project_id = $1",
        )
        .bind(project_id.0)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(row_to_file).collect()
    }

    pub async fn mark_file_indexed(&self, file_id: FileId) -> Result<(), StoreError> {
        sqlx::query("update files set last_indexed_at = now(), parse_error = null where id = $1")
            .bind(file_id.0)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Records a per-file parse failure without failing the `IndexRun`.
    /// Parse failures are per-file and never fatal to the pipeline.
    pub async fn record_file_parse_error(&self, file_id: FileId, message: &str) -> Result<(), StoreError> {
        sqlx::query("update files set last_indexed_at = now(), parse_error = $1 where id = $2")
            .bind(message)
            .bind(file_id.0)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Advisory lock keyed on the project id, used to enforce at most
    /// one running IndexRun per project across multiple worker
    /// processes sharing one queue. Session-scoped: released by
    /// [`Store::release_project_lock`] or when the connection drops.
    pub async fn try_acquire_project_lock(&self, project_id: ProjectId) -> Result<bool, StoreError> {
        let key = project_lock_key(project_id);
        let acquired: bool = sqlx::query_scalar("select pg_try_advisory_lock($1)")
            .bind(key)
            .fetch_one(&self.pool)
            .await?;
        Ok(acquired)
    }

    pub async fn release_project_lock(&self, project_id: ProjectId) -> Result<(), StoreError> {
        let key = project_lock_key(project_id);
        sqlx::query("select pg_advisory_unlock($1)")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // ---- symbols -------------------------------------------------------------

    pub async fn delete_symbols_for_file(&self, file_id: FileId) -> Result<(), StoreError> {
        sqlx::query("delete from symbols where file_id = $1")
            .bind(file_id.0)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn bulk_insert_symbols(&self, symbols: &[Symbol]) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        for symbol in symbols {
            let metadata = serde_json::to_value(&symbol.metadata).unwrap_or_default();
            sqlx::query(
                "insert into symbols (id, project_id, file_id, name, qualified_name, kind, language,
                    start_line, end_line, start_col, end_col, signature, doc, metadata)
                 values ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14)
                 on conflict (project_id, qualified_name, kind) do update set
                    file_id = excluded.file_id, name = excluded.name,
                    language = excluded.language, start_line = excluded.start_line,
                    end_line = excluded.end_line, start_col = excluded.start_col,
                    end_col = excluded.end_col, signature = excluded.signature,
                    doc = excluded.doc, metadata = excluded.metadata",
            )
            .bind(symbol.id.0)
            .bind(symbol.project_id.0)
            .bind(symbol.file_id.0)
            .bind(&symbol.name)
            .bind(&symbol.qualified_name)
            .bind(symbol.kind.as_str())
            .bind(symbol.language.as_str())
            .bind(symbol.span.start_line as i32)
            .bind(symbol.span.end_line as i32)
            .bind(symbol.span.start_col.map(|c| c as i32))
            .bind(symbol.span.end_col.map(|c| c as i32))
            .bind(&symbol.signature)
            .bind(&symbol.doc)
            .bind(&metadata)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// Keyset-paginated symbol stream for a project, ordered by id.
    pub async fn list_symbols_page(
        &self,
        project_id: ProjectId,
        after: Option<SymbolId>,
        page_size: i64,
    ) -> Result<Vec<Symbol>, StoreError> {
        let rows = sqlx::query(
            "select id, project_id, file_id, name, qualified_name, kind, language,
                start_line, end_line, start_col, end_col, signature, doc, metadata
             from symbols
             where project_id = $1 and ($2::uuid is null or id > $2)
             order by id asc
             limit $3",
        )
        .bind(project_id.0)
        .bind(after.map(|s| s.0))
        .bind(page_size)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_symbol).collect()
    }

    pub async fn search_symbols(
        &self,
        project_id: ProjectId,
        query: &str,
        limit: i64,
    ) -> Result<Vec<Symbol>, StoreError> {
        let rows = sqlx::query(
            "select id, project_id, file_id, name, qualified_name, kind, language,
                start_line, end_line, start_col, end_col, signature, doc, metadata,
                similarity(name, $2) as score
             from symbols
             where project_id = $1 and (name ilike '%' || $2 || '%' or similarity(name, $2) > 0.2)
             order by score desc
             limit $3",
        )
        .bind(project_id.0)
        .bind(query)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_symbol).collect()
    }

    pub async fn get_symbol(&self, symbol_id: SymbolId) -> Result<Symbol, StoreError> {
        let row = sqlx::query(
            "select id, project_id, file_id, name, qualified_name, kind, language,
                start_line, end_line, start_col, end_col, signature, doc, metadata
             from symbols where id = $1",
        )
        .bind(symbol_id.0)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("symbol {symbol_id}")))?;
        row_to_symbol(row)
    }

    /// Exact or suffix match on `qualified_name`, used by MCP tools that
    /// accept a symbol name instead of an id.
    pub async fn find_symbol_by_name(
        &self,
        project_id: ProjectId,
        name: &str,
    ) -> Result<Symbol, StoreError> {
        let row = sqlx::query(
            "select id, project_id, file_id, name, qualified_name, kind, language,
                start_line, end_line, start_col, end_col, signature, doc, metadata
             from symbols
             where project_id = $1 and (qualified_name = $2 or qualified_name like '%.' || $2)
             order by (qualified_name = $2) desc, qualified_name asc
             limit 1",
        )
        .bind(project_id.0)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("symbol {name}")))?;
        row_to_symbol(row)
    }

    pub async fn update_symbol_metadata(
        &self,
        symbol_id: SymbolId,
        metadata: &SymbolMetadata,
    ) -> Result<(), StoreError> {
        let value = serde_json::to_value(metadata).unwrap_or_default();
        sqlx::query("update symbols set metadata = $1 where id = $2")
            .bind(&value)
            .bind(symbol_id.0)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // ---- edges -------------------------------------------------------------

    /// Checks every (source, target) pair belongs to `project_id` before
    /// inserting anything — one batched query rather than N round trips.
    pub async fn bulk_upsert_edges(
        &self,
        project_id: ProjectId,
        edges: &[SymbolEdge],
    ) -> Result<(), StoreError> {
        if edges.is_empty() {
            return Ok(());
        }

        let symbol_ids: Vec<uuid::Uuid> = edges
            .iter()
            .flat_map(|e| [e.source_symbol_id.0, e.target_symbol_id.0])
            .collect();

        let in_scope_count: i64 = sqlx::query_scalar(
            "select count(distinct id) from symbols where id = any($1) and project_id = $2",
        )
        .bind(&symbol_ids)
        .bind(project_id.0)
        .fetch_one(&self.pool)
        .await?;

        let distinct_ids: std::collections::HashSet<_> = symbol_ids.iter().collect();
        if in_scope_count as usize != distinct_ids.len() {
            return Err(StoreError::InvalidEdgeScope(format!(
                "one or more symbols in this edge batch do not belong to project {project_id}"
            )));
        }

        let mut tx = self.pool.begin().await?;
        for edge in edges {
            let metadata = serde_json::to_value(&edge.metadata).unwrap_or_default();
            sqlx::query(
                "insert into symbol_edges (id, project_id, source_symbol_id, target_symbol_id, edge_type, metadata)
                 values ($1,$2,$3,$4,$5,$6)
                 on conflict (source_symbol_id, target_symbol_id, edge_type) do nothing",
            )
            .bind(edge.id.0)
            .bind(project_id.0)
            .bind(edge.source_symbol_id.0)
            .bind(edge.target_symbol_id.0)
            .bind(edge.edge_type.as_str())
            .bind(&metadata)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    pub async fn edges_from(&self, symbol_id: SymbolId) -> Result<Vec<SymbolEdge>, StoreError> {
        let rows = sqlx::query(
            "select id, project_id, source_symbol_id, target_symbol_id, edge_type, metadata
             from symbol_edges where source_symbol_id = $1",
        )
        .bind(symbol_id.0)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(row_to_edge).collect()
    }

    pub async fn edges_to(&self, symbol_id: SymbolId) -> Result<Vec<SymbolEdge>, StoreError> {
        let rows = sqlx::query(
            "select id, project_id, source_symbol_id, target_symbol_id, edge_type, metadata
             from symbol_edges where target_symbol_id = $1",
        )
        .bind(symbol_id.0)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(row_to_edge).collect()
    }

    pub async fn all_edges_for_project(&self, project_id: ProjectId) -> Result<Vec<SymbolEdge>, StoreError> {
        let rows = sqlx::query(
            "select id, project_id, source_symbol_id, target_symbol_id, edge_type, metadata
             from symbol_edges where project_id = $1",
        )
        .bind(project_id.0)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(row_to_edge).collect()
    }

    // ---- column references (lineage staging) --------------------------------

    pub async fn insert_column_references(
        &self,
        project_id: ProjectId,
        index_run_id: IndexRunId,
        refs: &[ColumnReference],
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        for r in refs {
            sqlx::query(
                "insert into column_references (id, project_id, index_run_id, source_column, target_column,
                    derivation_type, expression, context, line)
                 values ($1,$2,$3,$4,$5,$6,$7,$8,$9)",
            )
            .bind(r.id.0)
            .bind(project_id.0)
            .bind(index_run_id.0)
            .bind(&r.source_column)
            .bind(&r.target_column)
            .bind(r.derivation_type.as_str())
            .bind(&r.expression)
            .bind(&r.context)
            .bind(r.line.map(|l| l as i32))
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// Reads and deletes the staged column references for a run — the
    /// Lineage stage consumes this table exactly once per run.
    pub async fn take_column_references(
        &self,
        index_run_id: IndexRunId,
    ) -> Result<Vec<ColumnReference>, StoreError> {
        let rows = sqlx::query(
            "delete from column_references where index_run_id = $1
             returning id, project_id, index_run_id, source_column, target_column, derivation_type,
                expression, context, line",
        )
        .bind(index_run_id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let derivation: String = row.get("derivation_type");
                Ok(ColumnReference {
                    id: ColumnReferenceId(row.get("id")),
                    project_id: ProjectId(row.get("project_id")),
                    index_run_id: IndexRunId(row.get("index_run_id")),
                    source_column: row.get("source_column"),
                    target_column: row.get("target_column"),
                    derivation_type: DerivationType::from_str(&derivation)
                        .map_err(|e| StoreError::NotFound(e.to_string()))?,
                    expression: row.get("expression"),
                    context: row.get("context"),
                    line: row.get::<Option<i32>, _>("line").map(|l| l as u32),
                })
            })
            .collect()
    }

    // ---- embeddings ----------------------------------------------------------

    pub async fn upsert_embedding(&self, embedding: &SymbolEmbedding) -> Result<(), StoreError> {
        sqlx::query(
            "insert into symbol_embeddings (id, symbol_id, vector, model)
             values ($1,$2,$3,$4)
             on conflict (symbol_id, model) do update set vector = excluded.vector",
        )
        .bind(embedding.id.0)
        .bind(embedding.symbol_id.0)
        .bind(&embedding.vector)
        .bind(&embedding.model)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Brute-force cosine similarity search: no vector extension is
    /// assumed, so all embeddings for the project load into memory and
    /// get scored in Rust. Fine at this system's scale; a project with
    /// enough symbols to make this slow would need pgvector, which this
    /// store intentionally does not require.
    pub async fn similarity_search(
        &self,
        project_id: ProjectId,
        query_vector: &[f32],
        limit: usize,
    ) -> Result<Vec<(SymbolId, f32)>, StoreError> {
        let rows = sqlx::query(
            "select se.symbol_id, se.vector from symbol_embeddings se
             join symbols s on s.id = se.symbol_id
             where s.project_id = $1",
        )
        .bind(project_id.0)
        .fetch_all(&self.pool)
        .await?;

        let mut scored: Vec<(SymbolId, f32)> = rows
            .into_iter()
            .map(|row| {
                let vector: Vec<f32> = row.get("vector");
                let symbol_id = SymbolId(row.get("symbol_id"));
                (symbol_id, cosine_similarity(query_vector, &vector))
            })
            .collect();

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit);
        Ok(scored)
    }

    // ---- analytics -------------------------------------------------------------

    pub async fn upsert_analytics(&self, analytics: &ProjectAnalytics) -> Result<(), StoreError> {
        sqlx::query(
            "insert into project_analytics (project_id, scope, scope_id, analytics, summary)
             values ($1,$2,$3,$4,$5)
             on conflict (project_id, scope, scope_id) do update set
                analytics = excluded.analytics, summary = excluded.summary, computed_at = now()",
        )
        .bind(analytics.project_id.0)
        .bind(analytics.scope.as_str())
        .bind(&analytics.scope_id)
        .bind(&analytics.analytics)
        .bind(&analytics.summary)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_analytics(
        &self,
        project_id: ProjectId,
        scope: AnalyticsScope,
        scope_id: &str,
    ) -> Result<ProjectAnalytics, StoreError> {
        let row = sqlx::query(
            "select project_id, scope, scope_id, analytics, summary from project_analytics
             where project_id = $1 and scope = $2 and scope_id = $3",
        )
        .bind(project_id.0)
        .bind(scope.as_str())
        .bind(scope_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("analytics {project_id}/{scope_id}")))?;

        Ok(ProjectAnalytics {
            project_id: ProjectId(row.get("project_id")),
            scope,
            scope_id: row.get("scope_id"),
            analytics: row.get("analytics"),
            summary: row.get("summary"),
        })
    }
}

fn row_to_project(row: sqlx::postgres::PgRow) -> Result<Project, StoreError> {
    let settings: Json = row.get("settings");
    Ok(Project {
        id: ProjectId(row.get("id")),
        tenant_id: TenantId(row.get("tenant_id")),
        slug: row.get("slug"),
        name: row.get("name"),
        settings: serde_json::from_value(settings).unwrap_or_default(),
    })
}

fn row_to_index_run(row: sqlx::postgres::PgRow) -> Result<IndexRun, StoreError> {
    let status: String = row.get("status");
    let failing_stage: Option<String> = row.get("failing_stage");
    Ok(IndexRun {
        id: IndexRunId(row.get("id")),
        project_id: ProjectId(row.get("project_id")),
        source_id: row.get::<Option<uuid::Uuid>, _>("source_id").map(SourceId),
        status: IndexRunStatus::from_str(&status).map_err(|e| StoreError::NotFound(e.to_string()))?,
        counters: IndexRunCounters {
            files_processed: row.get::<i64, _>("files_processed") as u64,
            symbols_found: row.get::<i64, _>("symbols_found") as u64,
            edges_found: row.get::<i64, _>("edges_found") as u64,
        },
        started_at: row.get("started_at"),
        completed_at: row.get("completed_at"),
        failing_stage: failing_stage
            .map(|s| PipelineStage::from_str(&s))
            .transpose()
            .map_err(|e| StoreError::NotFound(e.to_string()))?,
        error_message: row.get("error_message"),
    })
}

fn row_to_file(row: sqlx::postgres::PgRow) -> Result<File, StoreError> {
    let language: String = row.get("language");
    Ok(File {
        id: FileId(row.get("id")),
        project_id: ProjectId(row.get("project_id")),
        source_id: SourceId(row.get("source_id")),
        path: row.get("path"),
        language: Language::from_str(&language).map_err(|e| StoreError::NotFound(e.to_string()))?,
        size: row.get::<i64, _>("size") as u64,
        content_hash: row.get("content_hash"),
        last_indexed_at: row.get("last_indexed_at"),
    })
}

fn row_to_symbol(row: sqlx::postgres::PgRow) -> Result<Symbol, StoreError> {
    let kind: String = row.get("kind");
    let language: String = row.get("language");
    let metadata: Json = row.get("metadata");
    Ok(Symbol {
        id: SymbolId(row.get("id")),
        project_id: ProjectId(row.get("project_id")),
        file_id: FileId(row.get("file_id")),
        name: row.get("name"),
        qualified_name: row.get("qualified_name"),
        kind: SymbolKind::from_str(&kind).map_err(|e| StoreError::NotFound(e.to_string()))?,
        language: Language::from_str(&language).map_err(|e| StoreError::NotFound(e.to_string()))?,
        span: SymbolSpan {
            start_line: row.get::<i32, _>("start_line") as u32,
            end_line: row.get::<i32, _>("end_line") as u32,
            start_col: row.get::<Option<i32>, _>("start_col").map(|c| c as u32),
            end_col: row.get::<Option<i32>, _>("end_col").map(|c| c as u32),
        },
        signature: row.get("signature"),
        doc: row.get("doc"),
        metadata: serde_json::from_value(metadata).unwrap_or_default(),
    })
}

fn row_to_edge(row: sqlx::postgres::PgRow) -> Result<SymbolEdge, StoreError> {
    let edge_type: String = row.get("edge_type");
    let metadata: Json = row.get("metadata");
    Ok(SymbolEdge {
        id: SymbolEdgeId(row.get("id")),
        project_id: ProjectId(row.get("project_id")),
        source_symbol_id: SymbolId(row.get("source_symbol_id")),
        target_symbol_id: SymbolId(row.get("target_symbol_id")),
        edge_type: EdgeType::from_str(&edge_type).map_err(|e| StoreError::NotFound(e.to_string()))?,
        metadata: serde_json::from_value::<EdgeMetadata>(metadata).unwrap_or_default(),
    })
}

/// Folds a project's uuid down to the `bigint` key Postgres advisory
/// locks take. Collisions are harmless here — at worst two projects
/// briefly serialize against each other, never a correctness issue.
fn project_lock_key(project_id: ProjectId) -> i64 {
    let bytes = project_id.0.as_bytes();
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&bytes[0..8]);
    i64::from_le_bytes(buf)
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_similarity_identical_vectors_is_one() {
        let v = vec![1.0, 2.0, 3.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_similarity_orthogonal_vectors_is_zero() {
        let a = vec![1.0, 0.0];
        let b = vec![0.0, 1.0];
        assert!(cosine_similarity(&a, &b).abs() < 1e-6);
    }

    #[test]
    fn cosine_similarity_mismatched_length_is_zero() {
        let a = vec![1.0, 2.0];
        let b = vec![1.0];
        assert_eq!(cosine_similarity(&a, &b), 0.0);
    }
}
