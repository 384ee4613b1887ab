//! Turns `RawReference`s from the Parse stage into `SymbolEdge`s.
//! Tries, in order: exact qualified-name match, suffix match, globally
//! unique short-name match, a closed set of cross-language bridge
//! rules, then drops the reference. Ties within a strategy are broken
//! by same-language-as-source first, then lexicographically smallest
//! qualified name — the store's in-memory `Symbol` doesn't carry which
//! `Source` it came from, so the "same source" tie-break the design
//! notes mention collapses into "same language" here; see DESIGN.md.

use std::collections::HashMap;

use codemesh_core::enums::{EdgeType, Language, SymbolKind};
use codemesh_core::ids::{ProjectId, SymbolEdgeId, SymbolId};
use codemesh_core::model::{EdgeMetadata, Symbol, SymbolEdge};
use codemesh_parsers::RawReference;

pub struct SymbolIndex {
    by_qualified_name: HashMap<String, Vec<SymbolId>>,
    by_short_name: HashMap<String, Vec<SymbolId>>,
    kind_of: HashMap<SymbolId, SymbolKind>,
    qualified_name_of: HashMap<SymbolId, String>,
    language_of: HashMap<SymbolId, Language>,
}

impl SymbolIndex {
    pub fn build(symbols: &[Symbol]) -> Self {
        let mut by_qualified_name: HashMap<String, Vec<SymbolId>> = HashMap::new();
        let mut by_short_name: HashMap<String, Vec<SymbolId>> = HashMap::new();
        let mut kind_of = HashMap::new();
        let mut qualified_name_of = HashMap::new();
        let mut language_of = HashMap::new();

        for symbol in symbols {
            by_qualified_name
                .entry(symbol.qualified_name.clone())
                .or_default()
                .push(symbol.id);
            by_short_name.entry(symbol.name.clone()).or_default().push(symbol.id);
            kind_of.insert(symbol.id, symbol.kind);
            qualified_name_of.insert(symbol.id, symbol.qualified_name.clone());
            language_of.insert(symbol.id, symbol.language);
        }

        Self {
            by_qualified_name,
            by_short_name,
            kind_of,
            qualified_name_of,
            language_of,
        }
    }

    pub fn language_of(&self, id: SymbolId) -> Option<Language> {
        self.language_of.get(&id).copied()
    }

    fn find_by_suffix(&self, name: &str) -> Vec<SymbolId> {
        let needle = format!(".{name}");
        self.by_qualified_name
            .iter()
            .filter(|(q, _)| q.as_str() == name || q.ends_with(&needle))
            .flat_map(|(_, ids)| ids.iter().copied())
            .collect()
    }

    /// Exact qualified-name match, falling back to suffix match, both
    /// filtered to `wanted_kinds`. Used directly by lineage resolution,
    /// which shares this ladder's first two rungs but skips bridging.
    pub fn find_qualified_or_suffix(&self, name: &str, wanted_kinds: &[SymbolKind]) -> Option<SymbolId> {
        if let Some(ids) = self.by_qualified_name.get(name) {
            let filtered = filter_by_kind(self, ids, wanted_kinds);
            if let Some(id) = tie_break(self, None, &filtered) {
                return Some(id);
            }
        }
        let suffix = self.find_by_suffix(name);
        let filtered = filter_by_kind(self, &suffix, wanted_kinds);
        tie_break(self, None, &filtered)
    }
}

fn filter_by_kind(index: &SymbolIndex, ids: &[SymbolId], wanted_kinds: &[SymbolKind]) -> Vec<SymbolId> {
    ids.iter()
        .copied()
        .filter(|id| {
            index
                .kind_of
                .get(id)
                .map(|k| wanted_kinds.contains(k))
                .unwrap_or(false)
        })
        .collect()
}

/// Deterministic tie-break across a candidate set: prefer a candidate in
/// the same language as the referencing symbol, then the lexicographically
/// smallest qualified name. Returns `None` if `candidates` is empty.
fn tie_break(index: &SymbolIndex, from_language: Option<Language>, candidates: &[SymbolId]) -> Option<SymbolId> {
    if candidates.is_empty() {
        return None;
    }
    let mut sorted = candidates.to_vec();
    sorted.sort_by(|a, b| {
        let a_matches = from_language.is_some() && index.language_of.get(a) == from_language.as_ref();
        let b_matches = from_language.is_some() && index.language_of.get(b) == from_language.as_ref();
        b_matches
            .cmp(&a_matches)
            .then_with(|| index.qualified_name_of[a].cmp(&index.qualified_name_of[b]))
    });
    sorted.into_iter().next()
}

/// The `SymbolKind`s a `to_name` must resolve to for a given edge type
/// to make sense. Keeps the resolver from e.g. matching a `calls`
/// reference onto a same-named table.
fn expected_kinds(edge_type: EdgeType) -> &'static [SymbolKind] {
    use SymbolKind::*;
    match edge_type {
        EdgeType::ReadsFrom | EdgeType::WritesTo | EdgeType::UsesTable | EdgeType::DirectCopy | EdgeType::TransformsTo | EdgeType::Joins => {
            &[Table, View]
        }
        EdgeType::UsesColumn => &[Column],
        EdgeType::Calls => &[Procedure, Function, Method],
        EdgeType::Inherits => &[Class],
        EdgeType::Implements => &[Interface],
        EdgeType::Imports => &[Module, Namespace],
        EdgeType::CallsApi => &[Endpoint],
        EdgeType::References => &[Table, View, Class, Procedure, Function, Interface],
    }
}

/// Transforms a coarse `to_name` into qualified-name candidates a
/// cross-language caller might actually be naming, each with the
/// confidence to attach if the candidate resolves. Downranked further
/// below if more than one symbol ties for the match.
pub trait BridgeRule: Send + Sync {
    fn applies_to(&self, edge_type: EdgeType) -> bool;
    fn candidates(&self, to_name: &str) -> Vec<(String, f32)>;
    #[allow(dead_code)]
    fn name(&self) -> &'static str;
}

/// `[Table("Orders")]` / `DbSet<Order>` / embedded ADO.NET SQL resolving
/// to a `dbo`-schemed table, per `dotnet`'s table-attribute and
/// embedded-SQL bridge scans. Rarely reached in practice, since those
/// scans emit an already schema-qualified SQL symbol name often enough
/// that the suffix-match rung above this one resolves it first.
struct DotNetTableBridge;
impl BridgeRule for DotNetTableBridge {
    fn applies_to(&self, edge_type: EdgeType) -> bool {
        matches!(edge_type, EdgeType::UsesTable | EdgeType::ReadsFrom | EdgeType::WritesTo)
    }
    fn candidates(&self, to_name: &str) -> Vec<(String, f32)> {
        vec![(format!("dbo.{to_name}"), 0.75), (to_name.to_string(), 0.6)]
    }
    fn name(&self) -> &'static str {
        "dotnet_table"
    }
}

/// Classic ASP's raw `Recordset`/ADO SQL against a `dbo` table.
struct AspAdoBridge;
impl BridgeRule for AspAdoBridge {
    fn applies_to(&self, edge_type: EdgeType) -> bool {
        matches!(edge_type, EdgeType::ReadsFrom | EdgeType::WritesTo | EdgeType::UsesTable)
    }
    fn candidates(&self, to_name: &str) -> Vec<(String, f32)> {
        vec![(format!("dbo.{to_name}"), 0.75)]
    }
    fn name(&self) -> &'static str {
        "asp_ado"
    }
}

/// JS/TS ORM table references, where the JS side uses camelCase and the
/// schema side uses snake_case.
struct JsOrmBridge;
impl BridgeRule for JsOrmBridge {
    fn applies_to(&self, edge_type: EdgeType) -> bool {
        matches!(edge_type, EdgeType::UsesTable | EdgeType::ReadsFrom | EdgeType::WritesTo)
    }
    fn candidates(&self, to_name: &str) -> Vec<(String, f32)> {
        let snake = camel_to_snake(to_name);
        vec![(snake.clone(), 0.6), (format!("public.{snake}"), 0.6)]
    }
    fn name(&self) -> &'static str {
        "js_orm"
    }
}

/// A frontend `fetch`/`axios` call to `/api/users/:id` resolving to a
/// backend endpoint whose qualified name mirrors the route shape.
struct FrontendRouteBridge;
impl BridgeRule for FrontendRouteBridge {
    fn applies_to(&self, edge_type: EdgeType) -> bool {
        matches!(edge_type, EdgeType::CallsApi)
    }
    fn candidates(&self, to_name: &str) -> Vec<(String, f32)> {
        let cleaned = to_name
            .trim_start_matches('/')
            .trim_start_matches("api/")
            .replace('/', ".");
        vec![(cleaned, 0.5)]
    }
    fn name(&self) -> &'static str {
        "frontend_route"
    }
}

fn camel_to_snake(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, ch) in name.chars().enumerate() {
        if ch.is_uppercase() {
            if i != 0 {
                out.push('_');
            }
            out.extend(ch.to_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

fn default_bridge_rules() -> Vec<Box<dyn BridgeRule>> {
    vec![
        Box::new(DotNetTableBridge),
        Box::new(AspAdoBridge),
        Box::new(JsOrmBridge),
        Box::new(FrontendRouteBridge),
    ]
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ResolutionStats {
    pub resolved: usize,
    pub dropped: usize,
}

/// Runs every raw reference through the resolution ladder, emitting one
/// `SymbolEdge` per successfully resolved reference. A reference whose
/// `from_qualified_name` matches no symbol is dropped silently — parsers
/// are expected to emit `from_qualified_name` at the granularity of the
/// enclosing symbol (method, or class when there is no enclosing
/// method), so this should only fire for a parser bug.
pub fn resolve_references(project_id: ProjectId, index: &SymbolIndex, references: &[RawReference]) -> (Vec<SymbolEdge>, ResolutionStats) {
    let bridge_rules = default_bridge_rules();
    let mut edges = Vec::new();
    let mut stats = ResolutionStats::default();

    for raw in references {
        let Some(source_ids) = index.by_qualified_name.get(&raw.from_qualified_name) else {
            stats.dropped += 1;
            continue;
        };
        let Some(&source_id) = source_ids.first() else {
            stats.dropped += 1;
            continue;
        };

        let wanted_kinds = expected_kinds(raw.edge_type);
        match resolve_one(index, raw, wanted_kinds, &bridge_rules, source_id) {
            Some((target_id, confidence)) if target_id != source_id => {
                edges.push(SymbolEdge {
                    id: SymbolEdgeId::new(),
                    project_id,
                    source_symbol_id: source_id,
                    target_symbol_id: target_id,
                    edge_type: raw.edge_type,
                    metadata: EdgeMetadata {
                        derivation_type: None,
                        confidence: Some(confidence),
                        expression: None,
                    },
                });
                stats.resolved += 1;
            }
            _ => stats.dropped += 1,
        }
    }

    (edges, stats)
}

fn resolve_one(
    index: &SymbolIndex,
    raw: &RawReference,
    wanted_kinds: &[SymbolKind],
    bridge_rules: &[Box<dyn BridgeRule>],
    source_id: SymbolId,
) -> Option<(SymbolId, f32)> {
    let from_language = index.language_of(source_id);

    if let Some(ids) = index.by_qualified_name.get(&raw.to_name) {
        let filtered = filter_by_kind(index, ids, wanted_kinds);
        if let Some(id) = tie_break(index, from_language, &filtered) {
            return Some((id, 1.0));
        }
    }

    let suffix_matches = index.find_by_suffix(&raw.to_name);
    let filtered = filter_by_kind(index, &suffix_matches, wanted_kinds);
    if let Some(id) = tie_break(index, from_language, &filtered) {
        return Some((id, 0.95));
    }

    if let Some(ids) = index.by_short_name.get(&raw.to_name) {
        let filtered = filter_by_kind(index, ids, wanted_kinds);
        if filtered.len() == 1 {
            return Some((filtered[0], 0.85));
        }
    }

    for rule in bridge_rules {
        if !rule.applies_to(raw.edge_type) {
            continue;
        }
        for (candidate_name, confidence) in rule.candidates(&raw.to_name) {
            let mut combined = index.by_qualified_name.get(&candidate_name).cloned().unwrap_or_default();
            combined.extend(index.find_by_suffix(&candidate_name));
            combined.sort();
            combined.dedup();
            let filtered = filter_by_kind(index, &combined, wanted_kinds);
            if filtered.is_empty() {
                continue;
            }
            let downranked = if filtered.len() > 1 { confidence * 0.7 } else { confidence };
            if let Some(id) = tie_break(index, from_language, &filtered) {
                return Some((id, downranked));
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use codemesh_core::enums::SymbolKind;
    use codemesh_core::ids::FileId;
    use codemesh_core::model::{SymbolMetadata, SymbolSpan};

    fn symbol(qualified_name: &str, name: &str, kind: SymbolKind, language: Language) -> Symbol {
        Symbol {
            id: SymbolId::new(),
            project_id: ProjectId::new(),
            file_id: FileId::new(),
            name: name.to_string(),
            qualified_name: qualified_name.to_string(),
            kind,
            language,
            span: SymbolSpan::default(),
            signature: None,
            doc: None,
            metadata: SymbolMetadata::default(),
        }
    }

    #[test]
    fn resolves_exact_qualified_match() {
        let from = symbol("dbo.GetOrders", "GetOrders", SymbolKind::Procedure, Language::TSql);
        let to = symbol("dbo.Orders", "Orders", SymbolKind::Table, Language::TSql);
        let project_id = from.project_id;
        let symbols = vec![from.clone(), to.clone()];
        let index = SymbolIndex::build(&symbols);

        let raw = RawReference {
            from_qualified_name: from.qualified_name.clone(),
            to_name: "dbo.Orders".to_string(),
            edge_type: EdgeType::ReadsFrom,
            line: Some(4),
        };
        let (edges, stats) = resolve_references(project_id, &index, &[raw]);
        assert_eq!(stats.resolved, 1);
        assert_eq!(edges[0].target_symbol_id, to.id);
        assert_eq!(edges[0].metadata.confidence, Some(1.0));
    }

    #[test]
    fn resolves_suffix_match_across_schema() {
        let from = symbol("app.Controller.List", "List", SymbolKind::Method, Language::CSharp);
        let to = symbol("dbo.Invoices", "Invoices", SymbolKind::Table, Language::TSql);
        let project_id = from.project_id;
        let symbols = vec![from.clone(), to.clone()];
        let index = SymbolIndex::build(&symbols);

        let raw = RawReference {
            from_qualified_name: from.qualified_name.clone(),
            to_name: "Invoices".to_string(),
            edge_type: EdgeType::UsesTable,
            line: None,
        };
        let (edges, stats) = resolve_references(project_id, &index, &[raw]);
        assert_eq!(stats.resolved, 1);
        assert_eq!(edges[0].target_symbol_id, to.id);
    }

    #[test]
    fn drops_reference_when_from_symbol_is_unknown() {
        let to = symbol("dbo.Orders", "Orders", SymbolKind::Table, Language::TSql);
        let project_id = to.project_id;
        let index = SymbolIndex::build(&[to]);

        let raw = RawReference {
            from_qualified_name: "App.SomeNamespace".to_string(),
            to_name: "Orders".to_string(),
            edge_type: EdgeType::ReadsFrom,
            line: None,
        };
        let (edges, stats) = resolve_references(project_id, &index, &[raw]);
        assert!(edges.is_empty());
        assert_eq!(stats.dropped, 1);
    }

    #[test]
    fn bridge_rule_resolves_dotnet_table_to_dbo_schema() {
        let from = symbol("App.Data.OrderRepository", "OrderRepository", SymbolKind::Class, Language::CSharp);
        let to = symbol("dbo.Orders", "Orders", SymbolKind::Table, Language::TSql);
        let project_id = from.project_id;
        let symbols = vec![from.clone(), to.clone()];
        let index = SymbolIndex::build(&symbols);

        let raw = RawReference {
            from_qualified_name: from.qualified_name.clone(),
            to_name: "Orders".to_string(),
            edge_type: EdgeType::UsesTable,
            line: None,
        };
        let (edges, stats) = resolve_references(project_id, &index, &[raw]);
        assert_eq!(stats.resolved, 1);
        assert_eq!(edges[0].target_symbol_id, to.id);
    }

    #[test]
    fn self_reference_is_dropped() {
        let sym = symbol("dbo.Orders", "Orders", SymbolKind::Table, Language::TSql);
        let project_id = sym.project_id;
        let id = sym.id;
        let index = SymbolIndex::build(&[sym]);

        let raw = RawReference {
            from_qualified_name: "dbo.Orders".to_string(),
            to_name: "dbo.Orders".to_string(),
            edge_type: EdgeType::References,
            line: None,
        };
        let (edges, stats) = resolve_references(project_id, &index, &[raw]);
        assert!(edges.is_empty());
        assert_eq!(stats.dropped, 1);
        let _ = id;
    }
}
