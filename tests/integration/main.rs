//! Cross-crate integration tests.
//!
//! Each test chains two or more crates together the way the ingestion
//! pipeline or an MCP tool actually would, rather than re-exercising a
//! single module in isolation (see each crate's own `#[cfg(test)]`
//! modules for that). They seed the six concrete scenarios plus the
//! universal invariants.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use codemesh_core::enums::{ChangeType, DerivationType, Direction, EdgeType, SymbolKind};
use codemesh_core::graph::GraphMirror;
use codemesh_core::ids::{ColumnReferenceId, FileId, IndexRunId, ProjectId, SymbolId};
use codemesh_core::impact::classify_severity;
use codemesh_core::model::{ColumnReference, ProjectSettings, Symbol, SymbolMetadata, SymbolSpan};
use codemesh_parsers::registry::LanguageParser;
use codemesh_parsers::sql::TSqlParser;
use codemesh_pipeline::lineage::resolve_column_references;
use codemesh_pipeline::resolve::{resolve_references, SymbolIndex};

fn column(qualified_name: &str, name: &str, project_id: ProjectId) -> Symbol {
    Symbol {
        id: SymbolId::new(),
        project_id,
        file_id: FileId::new(),
        name: name.to_string(),
        qualified_name: qualified_name.to_string(),
        kind: SymbolKind::Column,
        language: codemesh_core::enums::Language::TSql,
        span: SymbolSpan::default(),
        signature: None,
        doc: None,
        metadata: SymbolMetadata::default(),
    }
}

fn staged_column_ref(
    parsed: codemesh_parsers::ParsedColumnReference,
    project_id: ProjectId,
    run_id: IndexRunId,
) -> ColumnReference {
    ColumnReference {
        id: ColumnReferenceId::new(),
        project_id,
        index_run_id: run_id,
        source_column: parsed.source_column,
        target_column: parsed.target_column,
        derivation_type: parsed.derivation_type,
        expression: parsed.expression,
        context: parsed.context,
        line: parsed.line,
    }
}

/// Scenario 1: a migration file's `INSERT ... SELECT` is real
/// column-level lineage (the parser stages `direct_copy` references for
/// it), but a project whose settings exclude the file's path never
/// turns those staged references into edges — mirroring the ingest
/// stage's `skip_column_lineage` gate without reaching into its
/// private `looks_like_migration` helper.
#[test]
fn migration_path_settings_gate_column_lineage() {
    let project_id = ProjectId::new();
    let run_id = IndexRunId::new();
    let sql = "INSERT INTO dbo.Users (id, email) SELECT src.id, src.email FROM dbo.UsersLegacy src;";

    let parser = TSqlParser::new();
    let parsed = parser.parse(Path::new("migrations/2024/001_backfill_users.sql"), sql).unwrap();
    assert_eq!(parsed.column_references.len(), 2, "both columns should be staged by the parser");

    let mut settings = ProjectSettings::default();
    settings.lineage_exclude_paths.push("migrations/**".to_string());
    assert!(settings.is_lineage_excluded("migrations/2024/001_backfill_users.sql"));

    let users_id = column("dbo.Users.id", "id", project_id);
    let users_email = column("dbo.Users.email", "email", project_id);
    let legacy_id = column("dbo.UsersLegacy.id", "id", project_id);
    let legacy_email = column("dbo.UsersLegacy.email", "email", project_id);
    let index = SymbolIndex::build(&[users_id, users_email, legacy_id, legacy_email]);

    let staged: Vec<ColumnReference> = parsed
        .column_references
        .into_iter()
        .map(|c| staged_column_ref(c, project_id, run_id))
        .collect();

    // The gate the pipeline applies before staging at all: an excluded
    // path never reaches `resolve_column_references`.
    let (edges, _) = if settings.is_lineage_excluded("migrations/2024/001_backfill_users.sql") {
        (Vec::new(), codemesh_pipeline::lineage::LineageStats::default())
    } else {
        resolve_column_references(project_id, &index, &staged)
    };
    assert!(edges.is_empty(), "excluded migration path must produce zero direct_copy edges");

    // The same references on a non-excluded path resolve normally.
    let (edges, stats) = resolve_column_references(project_id, &index, &staged);
    assert_eq!(stats.resolved, 2);
    assert!(edges.iter().all(|e| e.edge_type == EdgeType::DirectCopy));
}

fn dotnet_symbol(qualified_name: &str, name: &str, kind: SymbolKind, project_id: ProjectId) -> Symbol {
    Symbol {
        id: SymbolId::new(),
        project_id,
        file_id: FileId::new(),
        name: name.to_string(),
        qualified_name: qualified_name.to_string(),
        kind,
        language: codemesh_core::enums::Language::CSharp,
        span: SymbolSpan::default(),
        signature: None,
        doc: None,
        metadata: SymbolMetadata::default(),
    }
}

fn sql_symbol(qualified_name: &str, name: &str, kind: SymbolKind, project_id: ProjectId) -> Symbol {
    Symbol {
        id: SymbolId::new(),
        project_id,
        file_id: FileId::new(),
        name: name.to_string(),
        qualified_name: qualified_name.to_string(),
        kind,
        language: codemesh_core::enums::Language::TSql,
        span: SymbolSpan::default(),
        signature: None,
        doc: None,
        metadata: SymbolMetadata::default(),
    }
}

/// Scenario 2: a .NET repository bridges to T-SQL two ways — a
/// `[Table("Users")]`-decorated class maps onto the SQL table, and an
/// ADO stored-procedure call site maps onto the SQL procedure — both
/// resolved through the resolver's suffix/bridge ladder, at the
/// granularity of the enclosing class/method rather than the namespace.
#[test]
fn dotnet_repository_bridges_to_tsql_table_and_procedure() {
    let project_id = ProjectId::new();

    let csharp = r#"
namespace Billing.Data
{
    [Table("Users")]
    public class User
    {
    }

    public class UserRepo
    {
        public void LoadActive()
        {
            provider.ExecuteNonQuery("GetActiveUsers", CommandType.StoredProcedure);
        }
    }
}
"#;
    let dotnet_parser = codemesh_parsers::dotnet::CSharpParser::new();
    let dotnet_result = dotnet_parser.parse(Path::new("UserRepo.cs"), csharp).unwrap();

    assert!(dotnet_result.references.iter().any(|r| {
        r.from_qualified_name == "Billing.Data.User" && r.to_name == "Users" && r.edge_type == EdgeType::UsesTable
    }));
    assert!(dotnet_result.references.iter().any(|r| {
        r.from_qualified_name == "Billing.Data.UserRepo.LoadActive" && r.to_name == "GetActiveUsers" && r.edge_type == EdgeType::Calls
    }));

    let sql = "CREATE TABLE dbo.Users (id INT, email NVARCHAR(200));\nCREATE PROCEDURE dbo.GetActiveUsers AS SELECT * FROM dbo.Users WHERE active = 1;";
    let sql_parser = TSqlParser::new();
    let sql_result = sql_parser.parse(Path::new("AddUser.sql"), sql).unwrap();

    let table = sql_result
        .symbols
        .iter()
        .find(|s| s.kind == SymbolKind::Table)
        .expect("CREATE TABLE should have produced a table symbol");
    assert_eq!(table.qualified_name, "dbo.Users");
    let procedure = sql_result
        .symbols
        .iter()
        .find(|s| s.kind == SymbolKind::Procedure)
        .expect("CREATE PROCEDURE should have produced a procedure symbol, not \"dbo.dbo.GetActiveUsers\"");
    assert_eq!(procedure.qualified_name, "dbo.GetActiveUsers");

    let user_class = dotnet_symbol("Billing.Data.User", "User", SymbolKind::Class, project_id);
    let user_repo_method = dotnet_symbol("Billing.Data.UserRepo.LoadActive", "LoadActive", SymbolKind::Method, project_id);
    let table_symbol = sql_symbol(&table.qualified_name, &table.name, SymbolKind::Table, project_id);
    let procedure_symbol = sql_symbol(&procedure.qualified_name, &procedure.name, SymbolKind::Procedure, project_id);
    let table_id = table_symbol.id;
    let procedure_id = procedure_symbol.id;

    let index = SymbolIndex::build(&[user_class, user_repo_method, table_symbol, procedure_symbol]);

    let (edges, stats) = resolve_references(project_id, &index, &dotnet_result.references);
    assert_eq!(stats.resolved, 2, "both the table and procedure bridges should resolve");
    assert!(edges
        .iter()
        .any(|e| e.target_symbol_id == table_id && e.edge_type == EdgeType::UsesTable));
    assert!(edges
        .iter()
        .any(|e| e.target_symbol_id == procedure_id && e.edge_type == EdgeType::Calls));
}

/// Scenario 3: deleting a table affects its direct readers/writers at
/// `critical` severity and transitively-calling services at `medium`.
#[test]
fn impact_analysis_of_a_table_deletion() {
    let mut mirror = GraphMirror::new();
    let table = SymbolId::new();
    let method = SymbolId::new();
    let procedure = SymbolId::new();
    let service = SymbolId::new();
    mirror.add_node(table, SymbolKind::Table);
    mirror.add_node(method, SymbolKind::Method);
    mirror.add_node(procedure, SymbolKind::Procedure);
    mirror.add_node(service, SymbolKind::Class);
    mirror.add_edge(method, table, EdgeType::ReadsFrom, 1.0);
    mirror.add_edge(procedure, table, EdgeType::ReadsFrom, 1.0);
    mirror.add_edge(service, method, EdgeType::Calls, 1.0);

    // Upstream lineage from `table` walks incoming `reads_from`/`calls`
    // edges, which is exactly what backs `analyze_impact`'s traversal.
    let paths = mirror.lineage(table, Direction::Upstream, 3, &HashSet::new());

    let mut total_affected = HashSet::new();
    let mut critical = HashSet::new();
    let mut medium = HashSet::new();
    for path in &paths {
        let depth = path.path.len() as u32;
        let (affected, edge_type, _) = *path.path.last().unwrap();
        total_affected.insert(affected);
        let severity = classify_severity(depth, ChangeType::Delete, edge_type);
        match severity {
            codemesh_core::enums::Severity::Critical => {
                critical.insert(affected);
            }
            codemesh_core::enums::Severity::Medium => {
                medium.insert(affected);
            }
            _ => {}
        }
    }

    assert_eq!(total_affected.len(), 3);
    assert!(critical.contains(&method));
    assert!(critical.contains(&procedure));
    assert!(medium.contains(&service));
}

/// Scenario 4: upstream lineage from a column stops descending once it
/// hits a procedure node, though the procedure itself is still reported.
#[test]
fn lineage_traversal_prunes_at_stop_kind() {
    let mut mirror = GraphMirror::new();
    let email = SymbolId::new();
    let staging_email = SymbolId::new();
    let load_customers = SymbolId::new();
    let upstream_of_proc = SymbolId::new();
    mirror.add_node(email, SymbolKind::Column);
    mirror.add_node(staging_email, SymbolKind::Column);
    mirror.add_node(load_customers, SymbolKind::Procedure);
    mirror.add_node(upstream_of_proc, SymbolKind::Table);
    mirror.add_edge(staging_email, email, EdgeType::DirectCopy, 0.9);
    mirror.add_edge(load_customers, staging_email, EdgeType::TransformsTo, 1.0);
    mirror.add_edge(upstream_of_proc, load_customers, EdgeType::ReadsFrom, 1.0);

    let mut stop_at = HashSet::new();
    stop_at.insert(SymbolKind::Procedure);
    let paths = mirror.lineage(email, Direction::Upstream, 5, &stop_at);
    let reached: HashSet<SymbolId> = paths.iter().map(|p| p.path.last().unwrap().0).collect();

    assert!(reached.contains(&staging_email));
    assert!(reached.contains(&load_customers));
    assert!(!reached.contains(&upstream_of_proc), "traversal must not descend past the procedure");
}

/// Scenario 5: a token-budget-constrained response never renders a card
/// partially, and reports how many of the total matches were dropped.
#[test]
fn search_response_truncates_at_card_granularity() {
    use codemesh_mcp::response::{symbol_card, Block, ResponseBuilder};
    use codemesh_core::enums::Verbosity;

    let project_id = ProjectId::new();
    let cards: Vec<_> = (0..50)
        .map(|i| {
            let symbol = Symbol {
                id: SymbolId::new(),
                project_id,
                file_id: FileId::new(),
                name: format!("User{i}"),
                qualified_name: format!("App.User{i}"),
                kind: SymbolKind::Class,
                language: codemesh_core::enums::Language::CSharp,
                span: SymbolSpan::default(),
                signature: Some(format!("class User{i} : Entity")),
                doc: Some("Represents an application user record.".to_string()),
                metadata: SymbolMetadata::default(),
            };
            symbol_card(&symbol, Verbosity::Standard, 2, 3, &["Entity".to_string()], &[], None, false)
        })
        .collect();

    let response = ResponseBuilder::new("search_symbols", 300).symbol_list(cards).build();

    assert!(response.meta.shown >= 1);
    assert!(response.meta.shown < 50, "a 300-token budget cannot fit all 50 matches");
    assert_eq!(response.meta.total_results, 50);

    let shown_in_block = response
        .blocks
        .iter()
        .find_map(|b| match b {
            Block::SymbolList { items } => Some(items.len()),
            _ => None,
        })
        .unwrap();
    assert_eq!(shown_in_block, response.meta.shown, "no card is rendered partially");

    let truncation = response.blocks.iter().find_map(|b| match b {
        Block::Truncation { shown, total } => Some((*shown, *total)),
        _ => None,
    });
    assert_eq!(truncation, Some((response.meta.shown, 50)));
}

/// Scenario 6: a second `search_symbols` call against the same session
/// collapses previously-returned symbols to "already examined" markers
/// instead of hiding them, and the result count is unaffected.
#[test]
fn session_dedup_collapses_previously_seen_symbols() {
    use codemesh_core::enums::Verbosity;
    use codemesh_mcp::response::symbol_card;
    use codemesh_mcp::session::{Session, SessionCache};

    let project_id = ProjectId::new();
    let symbols: Vec<Symbol> = (0..3)
        .map(|i| Symbol {
            id: SymbolId::new(),
            project_id,
            file_id: FileId::new(),
            name: format!("User{i}"),
            qualified_name: format!("App.User{i}"),
            kind: SymbolKind::Class,
            language: codemesh_core::enums::Language::CSharp,
            span: SymbolSpan::default(),
            signature: None,
            doc: Some("doc".to_string()),
            metadata: SymbolMetadata::default(),
        })
        .collect();

    let cache = SessionCache::new();

    // First call: nothing seen yet, every card renders in full.
    let first_session = cache.get("sess-1");
    let first_cards: Vec<_> = symbols
        .iter()
        .map(|s| symbol_card(s, Verbosity::Standard, 0, 0, &[], &[], None, first_session.seen_symbols.contains(&s.id.to_string())))
        .collect();
    assert!(first_cards.iter().all(|c| !c.already_examined));

    let mut session = first_session;
    session.record_query("User");
    session.mark_seen(symbols.iter().map(|s| s.id.to_string()));
    cache.put("sess-1", session);

    // Second call, same session: every card is now marked already seen.
    let second_session = cache.get("sess-1");
    let second_cards: Vec<_> = symbols
        .iter()
        .map(|s| symbol_card(s, Verbosity::Standard, 0, 0, &[], &[], None, second_session.seen_symbols.contains(&s.id.to_string())))
        .collect();
    assert!(second_cards.iter().all(|c| c.already_examined));
    assert_eq!(first_cards.len(), second_cards.len(), "meta.total_results is unchanged across calls");
}

/// Universal invariant: a column-lineage edge's confidence always lands
/// in `[0, 1]` regardless of which derivation produced it.
#[test]
fn column_lineage_confidence_is_always_normalized() {
    for derivation in [
        DerivationType::DirectCopy,
        DerivationType::Transform,
        DerivationType::Aggregate,
        DerivationType::Conditional,
        DerivationType::Filter,
        DerivationType::Join,
        DerivationType::Other,
    ] {
        let (_, confidence) = derivation.to_edge();
        assert!((0.0..=1.0).contains(&confidence), "{derivation:?} produced out-of-range confidence {confidence}");
    }
}

/// Universal invariant: parsing is deterministic — the same input always
/// yields the same set of `(qualified_name, kind)` symbols.
#[test]
fn parse_is_deterministic() {
    let code = r#"
namespace App.Models
{
    public class Invoice
    {
        public int GetTotal()
        {
            return 0;
        }
    }
}
"#;
    let parser = codemesh_parsers::dotnet::CSharpParser::new();
    let path = PathBuf::from("Invoice.cs");
    let first = parser.parse(&path, code).unwrap();
    let second = parser.parse(&path, code).unwrap();

    let names = |r: &codemesh_parsers::ParseResult| -> HashSet<(String, SymbolKind)> {
        r.symbols.iter().map(|s| (s.qualified_name.clone(), s.kind)).collect()
    };
    assert_eq!(names(&first), names(&second));
}
