//! The response contract: a sequence of typed blocks plus
//! follow-up hints and a meta block, with progressive disclosure and
//! token-budget truncation at card granularity.

use codemesh_core::enums::Verbosity;
use codemesh_core::model::Symbol;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Header {
        title: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        subtitle: Option<String>,
    },
    SymbolList {
        items: Vec<SymbolCard>,
    },
    Graph {
        edges: Vec<GraphEdgeCard>,
    },
    Table {
        columns: Vec<String>,
        rows: Vec<Vec<String>>,
    },
    Text {
        text: String,
    },
    Truncation {
        shown: usize,
        total: usize,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct SymbolCard {
    pub id: String,
    pub name: String,
    pub qualified_name: String,
    pub kind: String,
    pub language: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    pub in_degree: u32,
    pub out_degree: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc_snippet: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub top_dependencies: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub all_edges: Vec<GraphEdgeCard>,
    /// When `true`, the renderer should collapse this card to a
    /// one-line "already examined" marker — the session-awareness
    /// demotion rule, not an omission of data.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub already_examined: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct GraphEdgeCard {
    pub source: String,
    pub target: String,
    pub edge_type: String,
    pub confidence: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct Hint {
    pub label: String,
    pub question: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Meta {
    pub tool_selected: String,
    pub total_results: usize,
    pub shown: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens_used: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolResponse {
    pub blocks: Vec<Block>,
    pub hints: Vec<Hint>,
    pub meta: Meta,
}

/// Renders a symbol into a card at the requested verbosity tier.
/// `summary` keeps name/kind/signature/edge counts; `standard` adds the
/// doc snippet and top dependencies; `full` adds source and every edge.
pub fn symbol_card(
    symbol: &Symbol,
    verbosity: Verbosity,
    in_degree: u32,
    out_degree: u32,
    dependencies: &[String],
    all_edges: &[GraphEdgeCard],
    source: Option<&str>,
    already_examined: bool,
) -> SymbolCard {
    let mut card = SymbolCard {
        id: symbol.id.to_string(),
        name: symbol.name.clone(),
        qualified_name: symbol.qualified_name.clone(),
        kind: symbol.kind.as_str().to_string(),
        language: symbol.language.as_str().to_string(),
        signature: symbol.signature.clone(),
        in_degree,
        out_degree,
        doc_snippet: None,
        top_dependencies: Vec::new(),
        source: None,
        all_edges: Vec::new(),
        already_examined,
    };

    if already_examined {
        return card;
    }

    if matches!(verbosity, Verbosity::Standard | Verbosity::Full) {
        card.doc_snippet = symbol.doc.as_ref().map(|d| truncate(d, 200));
        card.top_dependencies = dependencies.iter().take(5).cloned().collect();
    }

    if matches!(verbosity, Verbosity::Full) {
        card.source = source.map(str::to_string);
        card.all_edges = all_edges.to_vec();
        card.top_dependencies = dependencies.to_vec();
    }

    card
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        format!("{}...", &s[..max_len])
    }
}

/// ~4 characters per token, a rough-but-cheap approximation.
pub fn estimate_tokens(text: &str) -> u32 {
    ((text.len() / 4) as u32).max(1)
}

/// Accumulates symbol cards into a `SymbolList` block, stopping before
/// the card that would exceed `max_tokens` — truncation happens at card
/// granularity, never mid-card.
pub struct ResponseBuilder {
    tool_name: String,
    blocks: Vec<Block>,
    hints: Vec<Hint>,
    max_tokens: u32,
    tokens_used: u32,
    total_results: usize,
    shown: usize,
}

impl ResponseBuilder {
    pub fn new(tool_name: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            tool_name: tool_name.into(),
            blocks: Vec::new(),
            hints: Vec::new(),
            max_tokens,
            tokens_used: 0,
            total_results: 0,
            shown: 0,
        }
    }

    /// Overrides the `{total_results, shown}` meta pair for tools whose
    /// result count isn't driven by `symbol_list` (e.g. a single symbol
    /// detail card, or a lineage tree).
    pub fn counts(mut self, total_results: usize, shown: usize) -> Self {
        self.total_results = total_results;
        self.shown = shown;
        self
    }

    pub fn header(mut self, title: impl Into<String>, subtitle: Option<String>) -> Self {
        let title = title.into();
        self.tokens_used += estimate_tokens(&title) + subtitle.as_deref().map(estimate_tokens).unwrap_or(0);
        self.blocks.push(Block::Header { title, subtitle });
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        let text = text.into();
        self.tokens_used += estimate_tokens(&text);
        self.blocks.push(Block::Text { text });
        self
    }

    pub fn hint(mut self, label: impl Into<String>, question: impl Into<String>) -> Self {
        self.hints.push(Hint {
            label: label.into(),
            question: question.into(),
        });
        self
    }

    /// Pushes as many cards as fit in the remaining budget, returning
    /// `(shown, total)`.
    pub fn symbol_list(mut self, cards: Vec<SymbolCard>) -> Self {
        let total = cards.len();
        let mut kept = Vec::with_capacity(total);
        for card in cards {
            let rendered = serde_json::to_string(&card).unwrap_or_default();
            let cost = estimate_tokens(&rendered);
            if self.tokens_used + cost > self.max_tokens && !kept.is_empty() {
                break;
            }
            self.tokens_used += cost;
            kept.push(card);
        }
        let shown = kept.len();
        self.blocks.push(Block::SymbolList { items: kept });
        if shown < total {
            self.blocks.push(Block::Truncation { shown, total });
        }
        self.total_results = total;
        self.shown = shown;
        self
    }

    pub fn graph(mut self, edges: Vec<GraphEdgeCard>) -> Self {
        for edge in &edges {
            self.tokens_used += estimate_tokens(&serde_json::to_string(edge).unwrap_or_default());
        }
        self.blocks.push(Block::Graph { edges });
        self
    }

    pub fn table(mut self, columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        for row in &rows {
            self.tokens_used += estimate_tokens(&row.join(" "));
        }
        self.blocks.push(Block::Table { columns, rows });
        self
    }

    pub fn build(self) -> ToolResponse {
        ToolResponse {
            blocks: self.blocks,
            hints: self.hints,
            meta: Meta {
                tool_selected: self.tool_name,
                total_results: self.total_results,
                shown: self.shown,
                tokens_used: Some(self.tokens_used),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codemesh_core::enums::{Language, SymbolKind};
    use codemesh_core::ids::{FileId, ProjectId, SymbolId};
    use codemesh_core::model::{SymbolMetadata, SymbolSpan};

    fn sample_symbol() -> Symbol {
        Symbol {
            id: SymbolId::new(),
            project_id: ProjectId::new(),
            file_id: FileId::new(),
            name: "GetById".to_string(),
            qualified_name: "Orders.Repository.GetById".to_string(),
            kind: SymbolKind::Method,
            language: Language::CSharp,
            span: SymbolSpan::default(),
            signature: Some("GetById(int id)".to_string()),
            doc: Some("Loads an order by its primary key.".to_string()),
            metadata: SymbolMetadata::default(),
        }
    }

    #[test]
    fn summary_verbosity_omits_doc_and_dependencies() {
        let symbol = sample_symbol();
        let card = symbol_card(&symbol, Verbosity::Summary, 1, 2, &["Foo".to_string()], &[], None, false);
        assert!(card.doc_snippet.is_none());
        assert!(card.top_dependencies.is_empty());
    }

    #[test]
    fn standard_verbosity_adds_doc_snippet() {
        let symbol = sample_symbol();
        let card = symbol_card(&symbol, Verbosity::Standard, 1, 2, &["Foo".to_string()], &[], None, false);
        assert!(card.doc_snippet.is_some());
        assert_eq!(card.top_dependencies, vec!["Foo".to_string()]);
    }

    #[test]
    fn already_examined_card_collapses() {
        let symbol = sample_symbol();
        let card = symbol_card(&symbol, Verbosity::Full, 1, 2, &["Foo".to_string()], &[], Some("code"), true);
        assert!(card.already_examined);
        assert!(card.doc_snippet.is_none());
        assert!(card.source.is_none());
    }

    #[test]
    fn symbol_list_truncates_at_card_granularity() {
        let symbol = sample_symbol();
        let cards: Vec<_> = (0..50)
            .map(|_| symbol_card(&symbol, Verbosity::Full, 1, 2, &[], &[], Some("x".repeat(500).as_str()), false))
            .collect();
        let response = ResponseBuilder::new("search_symbols", 200).symbol_list(cards).build();
        let shown = response.meta.shown;
        assert!(shown < 50);
        let had_truncation = response
            .blocks
            .iter()
            .any(|b| matches!(b, Block::Truncation { .. }));
        assert!(had_truncation);
    }
}
