//! Entity structs for the data model. These are the shapes the
//! Symbol Store persists and the Graph Mirror projects from — plain data,
//! no behavior beyond small invariant checks.

use std::collections::HashMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use crate::enums::{
    AnalyticsScope, DerivationType, EdgeType, IndexRunStatus, Language, PipelineStage, SourceKind,
    SymbolKind,
};
use crate::ids::{
    ColumnReferenceId, FileId, IndexRunId, ProjectId, SourceId, SymbolEdgeId, SymbolEmbeddingId,
    SymbolId, TenantId,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    pub id: TenantId,
    pub name: String,
    pub slug: String,
}

/// Per-project settings blob, extended over time — `lineage_exclude_paths`
/// is the one field the pipeline reads directly.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProjectSettings {
    #[serde(default)]
    pub lineage_exclude_paths: Vec<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, Json>,
}

impl ProjectSettings {
    /// Matches `path` (project-relative, forward-slash separated) against
    /// the configured exclude globs.
    pub fn is_lineage_excluded(&self, path: &str) -> bool {
        self.lineage_exclude_paths.iter().any(|pattern| {
            globset::Glob::new(pattern)
                .map(|g| g.compile_matcher().is_match(path))
                .unwrap_or(false)
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub tenant_id: TenantId,
    pub slug: String,
    pub name: String,
    pub settings: ProjectSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    pub id: SourceId,
    pub project_id: ProjectId,
    pub name: String,
    pub kind: SourceKind,
    pub connection_uri: Option<String>,
    pub config: Json,
    pub last_synced_at: Option<DateTime<Utc>>,
    pub last_commit_sha: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct IndexRunCounters {
    pub files_processed: u64,
    pub symbols_found: u64,
    pub edges_found: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexRun {
    pub id: IndexRunId,
    pub project_id: ProjectId,
    pub source_id: Option<SourceId>,
    pub status: IndexRunStatus,
    pub counters: IndexRunCounters,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub failing_stage: Option<PipelineStage>,
    pub error_message: Option<String>,
}

impl IndexRun {
    pub fn pending(project_id: ProjectId, source_id: Option<SourceId>) -> Self {
        Self {
            id: IndexRunId::new(),
            project_id,
            source_id,
            status: IndexRunStatus::Pending,
            counters: IndexRunCounters::default(),
            started_at: None,
            completed_at: None,
            failing_stage: None,
            error_message: None,
        }
    }

    /// Enforces monotonic transitions: once terminal, a run cannot move
    /// again, and `Cancel` is the only transition allowed from a
    /// non-terminal state besides the normal forward one.
    pub fn can_transition_to(&self, next: IndexRunStatus) -> bool {
        use IndexRunStatus::*;
        match (self.status, next) {
            (Pending, Running) | (Pending, Cancelled) => true,
            (Running, Completed) | (Running, Failed) | (Running, Cancelled) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct File {
    pub id: FileId,
    pub project_id: ProjectId,
    pub source_id: SourceId,
    pub path: String,
    pub language: Language,
    pub size: u64,
    pub content_hash: String,
    pub last_indexed_at: Option<DateTime<Utc>>,
}

impl File {
    pub fn as_path(&self) -> PathBuf {
        PathBuf::from(&self.path)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SymbolSpan {
    pub start_line: u32,
    pub end_line: u32,
    pub start_col: Option<u32>,
    pub end_col: Option<u32>,
}

/// Free-form enrichment written by the analytics/embedding stages.
/// Kept as JSON because its shape grows without schema churn (degree,
/// pagerank, layer, embedding-derived summary, is_migration flag).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SymbolMetadata {
    #[serde(default)]
    pub in_degree: Option<u32>,
    #[serde(default)]
    pub out_degree: Option<u32>,
    #[serde(default)]
    pub pagerank: Option<f64>,
    #[serde(default)]
    pub layer: Option<crate::enums::Layer>,
    #[serde(default)]
    pub is_migration: bool,
    #[serde(default)]
    pub summary: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Symbol {
    pub id: SymbolId,
    pub project_id: ProjectId,
    pub file_id: FileId,
    pub name: String,
    pub qualified_name: String,
    pub kind: SymbolKind,
    pub language: Language,
    pub span: SymbolSpan,
    pub signature: Option<String>,
    pub doc: Option<String>,
    pub metadata: SymbolMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EdgeMetadata {
    #[serde(default)]
    pub derivation_type: Option<DerivationType>,
    #[serde(default)]
    pub confidence: Option<f32>,
    #[serde(default)]
    pub expression: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolEdge {
    pub id: SymbolEdgeId,
    pub project_id: ProjectId,
    pub source_symbol_id: SymbolId,
    pub target_symbol_id: SymbolId,
    pub edge_type: EdgeType,
    pub metadata: EdgeMetadata,
}

impl SymbolEdge {
    /// No self-loops.
    pub fn is_valid(&self) -> bool {
        self.source_symbol_id != self.target_symbol_id
    }
}

/// Staging row produced by SQL parsers during Parse, consumed and
/// discarded by the Lineage stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnReference {
    pub id: ColumnReferenceId,
    pub project_id: ProjectId,
    pub index_run_id: IndexRunId,
    pub source_column: String,
    pub target_column: String,
    pub derivation_type: DerivationType,
    pub expression: Option<String>,
    pub context: Option<String>,
    pub line: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolEmbedding {
    pub id: SymbolEmbeddingId,
    pub symbol_id: SymbolId,
    pub vector: Vec<f32>,
    pub model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectAnalytics {
    pub project_id: ProjectId,
    pub scope: AnalyticsScope,
    pub scope_id: String,
    pub analytics: Json,
    pub summary: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::IndexRunStatus;

    #[test]
    fn glob_matches_double_star() {
        let mut settings = ProjectSettings::default();
        settings.lineage_exclude_paths.push("migrations/**".to_string());
        assert!(settings.is_lineage_excluded("migrations/2024/001_init.sql"));
        assert!(!settings.is_lineage_excluded("src/main.rs"));
    }

    #[test]
    fn glob_matches_single_segment() {
        let mut settings = ProjectSettings::default();
        settings
            .lineage_exclude_paths
            .push("*.generated.sql".to_string());
        assert!(settings.is_lineage_excluded("schema.generated.sql"));
        assert!(!settings.is_lineage_excluded("nested/schema.generated.sql"));
    }

    #[test]
    fn index_run_transitions_are_monotonic() {
        let run = IndexRun::pending(ProjectId::new(), None);
        assert!(run.can_transition_to(IndexRunStatus::Running));
        assert!(run.can_transition_to(IndexRunStatus::Cancelled));
        assert!(!run.can_transition_to(IndexRunStatus::Completed));
    }

    #[test]
    fn terminal_index_run_cannot_transition_again() {
        let mut run = IndexRun::pending(ProjectId::new(), None);
        run.status = IndexRunStatus::Completed;
        assert!(!run.can_transition_to(IndexRunStatus::Running));
        assert!(!run.can_transition_to(IndexRunStatus::Failed));
    }

    #[test]
    fn self_loop_edge_is_invalid() {
        let symbol_id = SymbolId::new();
        let edge = SymbolEdge {
            id: SymbolEdgeId::new(),
            project_id: ProjectId::new(),
            source_symbol_id: symbol_id,
            target_symbol_id: symbol_id,
            edge_type: EdgeType::Calls,
            metadata: EdgeMetadata::default(),
        };
        assert!(!edge.is_valid());
    }
}
