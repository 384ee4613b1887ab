//! Resolves staged `ColumnReference`s into `direct_copy`/`transforms_to`/
//! `uses_column` edges. Column qualified names follow the same
//! `schema.table.column` shape symbols do, so this stage reuses the
//! Resolver's exact/suffix lookup rather than inventing a second scheme.

use codemesh_core::enums::SymbolKind;
use codemesh_core::ids::{ProjectId, SymbolEdgeId, SymbolId};
use codemesh_core::model::{ColumnReference, EdgeMetadata, SymbolEdge};

use crate::resolve::SymbolIndex;

const COLUMN_KINDS: &[SymbolKind] = &[SymbolKind::Column];
const PARENT_KINDS: &[SymbolKind] = &[SymbolKind::Table, SymbolKind::View, SymbolKind::Procedure, SymbolKind::Function];

#[derive(Debug, Default, Clone, Copy)]
pub struct LineageStats {
    pub resolved: usize,
    pub parent_fallback: usize,
    pub dropped: usize,
}

/// Resolves one run's staged column references. `refs` is meant to be
/// consumed exactly once, via `Store::take_column_references`.
pub fn resolve_column_references(project_id: ProjectId, index: &SymbolIndex, refs: &[ColumnReference]) -> (Vec<SymbolEdge>, LineageStats) {
    let mut edges = Vec::new();
    let mut stats = LineageStats::default();

    for reference in refs {
        let Some(source_id) = index.find_qualified_or_suffix(&reference.source_column, COLUMN_KINDS) else {
            stats.dropped += 1;
            continue;
        };

        let (target_id, used_parent) = match index.find_qualified_or_suffix(&reference.target_column, COLUMN_KINDS) {
            Some(id) => (id, false),
            None => match resolve_parent(index, &reference.target_column) {
                Some(id) => (id, true),
                None => {
                    stats.dropped += 1;
                    continue;
                }
            },
        };

        if source_id == target_id {
            stats.dropped += 1;
            continue;
        }

        let (edge_type, confidence) = reference.derivation_type.to_edge();
        edges.push(SymbolEdge {
            id: SymbolEdgeId::new(),
            project_id,
            source_symbol_id: source_id,
            target_symbol_id: target_id,
            edge_type,
            metadata: EdgeMetadata {
                derivation_type: Some(reference.derivation_type),
                confidence: Some(confidence),
                expression: reference.expression.clone(),
            },
        });

        if used_parent {
            stats.parent_fallback += 1;
        } else {
            stats.resolved += 1;
        }
    }

    (edges, stats)
}

/// If the target resolves only to a parent symbol (the column's
/// containing table/view/routine is indexed but the column itself is
/// not), falls back to a `uses_column` edge against the parent. A
/// column's parent is named by dropping its last `.segment`.
fn resolve_parent(index: &SymbolIndex, target_column: &str) -> Option<SymbolId> {
    let (parent, _) = target_column.rsplit_once('.')?;
    index.find_qualified_or_suffix(parent, PARENT_KINDS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use codemesh_core::enums::{DerivationType, Language};
    use codemesh_core::ids::{ColumnReferenceId, FileId, IndexRunId};
    use codemesh_core::model::{Symbol, SymbolMetadata, SymbolSpan};

    fn symbol(qualified_name: &str, name: &str, kind: SymbolKind) -> Symbol {
        Symbol {
            id: SymbolId::new(),
            project_id: ProjectId::new(),
            file_id: FileId::new(),
            name: name.to_string(),
            qualified_name: qualified_name.to_string(),
            kind,
            language: Language::TSql,
            span: SymbolSpan::default(),
            signature: None,
            doc: None,
            metadata: SymbolMetadata::default(),
        }
    }

    fn column_ref(source: &str, target: &str, derivation: DerivationType, project_id: ProjectId) -> ColumnReference {
        ColumnReference {
            id: ColumnReferenceId::new(),
            project_id,
            index_run_id: IndexRunId::new(),
            source_column: source.to_string(),
            target_column: target.to_string(),
            derivation_type: derivation,
            expression: None,
            context: None,
            line: None,
        }
    }

    #[test]
    fn resolves_direct_copy_between_columns() {
        let src = symbol("dbo.Source.id", "id", SymbolKind::Column);
        let dst = symbol("dbo.Target.id", "id", SymbolKind::Column);
        let project_id = src.project_id;
        let index = SymbolIndex::build(&[src.clone(), dst.clone()]);

        let refs = vec![column_ref("dbo.Source.id", "dbo.Target.id", DerivationType::DirectCopy, project_id)];
        let (edges, stats) = resolve_column_references(project_id, &index, &refs);
        assert_eq!(stats.resolved, 1);
        assert_eq!(edges[0].source_symbol_id, src.id);
        assert_eq!(edges[0].target_symbol_id, dst.id);
    }

    #[test]
    fn falls_back_to_parent_table_when_column_not_indexed() {
        let src = symbol("dbo.Source.amount", "amount", SymbolKind::Column);
        let table = symbol("dbo.Totals", "Totals", SymbolKind::Table);
        let project_id = src.project_id;
        let index = SymbolIndex::build(&[src.clone(), table.clone()]);

        let refs = vec![column_ref(
            "dbo.Source.amount",
            "dbo.Totals.total_amount",
            DerivationType::Aggregate,
            project_id,
        )];
        let (edges, stats) = resolve_column_references(project_id, &index, &refs);
        assert_eq!(stats.parent_fallback, 1);
        assert_eq!(edges[0].target_symbol_id, table.id);
        assert_eq!(edges[0].edge_type, codemesh_core::enums::EdgeType::TransformsTo);
    }

    #[test]
    fn drops_when_neither_side_resolves() {
        let project_id = ProjectId::new();
        let index = SymbolIndex::build(&[]);
        let refs = vec![column_ref("dbo.A.x", "dbo.B.y", DerivationType::Other, project_id)];
        let (edges, stats) = resolve_column_references(project_id, &index, &refs);
        assert!(edges.is_empty());
        assert_eq!(stats.dropped, 1);
    }
}
