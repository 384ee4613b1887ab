//! Ranking signals for `search_symbols`/`extract_subgraph`: name
//! match quality first, then PageRank, then kind priority; session
//! awareness boosts focus-area neighbors and demotes already-seen
//! symbols without hiding them.

use std::collections::HashSet;

use codemesh_core::model::Symbol;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct RankKey {
    /// Lower is better for every field here (reverse order at the call
    /// site turns this into a descending sort).
    name_match: u8,
    kind_priority: u8,
    seen_penalty: u8,
    /// Stored as negated, rounded pagerank so integer ordering sorts
    /// higher pagerank first without pulling in float `Ord`.
    neg_pagerank_millis: i64,
}

fn name_match_rank(query: &str, symbol: &Symbol) -> u8 {
    let query_lower = query.to_lowercase();
    let name_lower = symbol.name.to_lowercase();
    if name_lower == query_lower {
        0
    } else if name_lower.starts_with(&query_lower) {
        1
    } else if name_lower.contains(&query_lower) {
        2
    } else {
        3
    }
}

/// Sorts `symbols` in place by the ranking rule, returning the final
/// order. `focus_area`/`seen_symbols` are the session's state (empty
/// sets when there is no session).
pub fn rank_symbols(
    symbols: &mut Vec<Symbol>,
    query: &str,
    focus_area: &HashSet<String>,
    seen_symbols: &HashSet<String>,
    within_two_hops_of_focus: impl Fn(&Symbol) -> bool,
) {
    symbols.sort_by_key(|symbol| {
        let boosted = focus_area.contains(&symbol.id.to_string()) || within_two_hops_of_focus(symbol);
        let seen = seen_symbols.contains(&symbol.id.to_string());
        let pagerank = symbol.metadata.pagerank.unwrap_or(0.0);
        RankKey {
            name_match: name_match_rank(query, symbol),
            kind_priority: symbol.kind.search_priority(),
            seen_penalty: if seen && !boosted { 1 } else { 0 },
            neg_pagerank_millis: -((pagerank * 1000.0) as i64),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use codemesh_core::enums::{Language, SymbolKind};
    use codemesh_core::ids::{FileId, ProjectId, SymbolId};
    use codemesh_core::model::{SymbolMetadata, SymbolSpan};

    fn symbol(name: &str, kind: SymbolKind) -> Symbol {
        Symbol {
            id: SymbolId::new(),
            project_id: ProjectId::new(),
            file_id: FileId::new(),
            name: name.to_string(),
            qualified_name: format!("ns.{name}"),
            kind,
            language: Language::CSharp,
            span: SymbolSpan::default(),
            signature: None,
            doc: None,
            metadata: SymbolMetadata::default(),
        }
    }

    #[test]
    fn exact_match_ranks_above_prefix_and_substring() {
        let mut symbols = vec![
            symbol("OrderRepository", SymbolKind::Class),
            symbol("Order", SymbolKind::Class),
            symbol("GetOrderById", SymbolKind::Method),
        ];
        rank_symbols(&mut symbols, "Order", &HashSet::new(), &HashSet::new(), |_| false);
        assert_eq!(symbols[0].name, "Order");
    }

    #[test]
    fn seen_symbols_are_demoted_unless_boosted() {
        let mut symbols = vec![symbol("Order", SymbolKind::Class), symbol("Orders", SymbolKind::Table)];
        let seen: HashSet<String> = [symbols[0].id.to_string()].into_iter().collect();
        rank_symbols(&mut symbols, "Order", &HashSet::new(), &seen, |_| false);
        assert_eq!(symbols[0].name, "Orders");
    }

    #[test]
    fn kind_priority_breaks_ties_between_equal_name_matches() {
        let mut symbols = vec![symbol("Total", SymbolKind::Column), symbol("Total", SymbolKind::Table)];
        rank_symbols(&mut symbols, "Total", &HashSet::new(), &HashSet::new(), |_| false);
        assert_eq!(symbols[0].kind, SymbolKind::Table);
    }
}
