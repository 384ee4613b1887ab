//! The shape every `LanguageParser` hands back to the Resolve stage.
//! Symbols here carry no id yet — the pipeline assigns `SymbolId`s once
//! a parse result is merged into a project.

use codemesh_core::enums::{DerivationType, EdgeType, SymbolKind};

#[derive(Debug, Clone, Default)]
pub struct Span {
    pub start_line: u32,
    pub end_line: u32,
}

/// A symbol as seen by the parser, before resolution assigns it an id
/// and links it to other symbols.
#[derive(Debug, Clone)]
pub struct ParsedSymbol {
    pub name: String,
    pub qualified_name: String,
    pub kind: SymbolKind,
    pub span: Span,
    pub signature: Option<String>,
    pub doc: Option<String>,
}

/// An unresolved reference from one symbol to a name the parser saw but
/// didn't look up — the Resolve stage turns these into `SymbolEdge`s
/// once it has the whole project's symbol table in view.
#[derive(Debug, Clone)]
pub struct RawReference {
    pub from_qualified_name: String,
    pub to_name: String,
    pub edge_type: EdgeType,
    pub line: Option<u32>,
}

/// A staged column-level derivation found inside a SQL statement,
/// destined for the Lineage stage rather than direct edge resolution.
#[derive(Debug, Clone)]
pub struct ParsedColumnReference {
    pub source_column: String,
    pub target_column: String,
    pub derivation_type: DerivationType,
    pub expression: Option<String>,
    pub context: Option<String>,
    pub line: Option<u32>,
}

#[derive(Debug, Clone, Default)]
pub struct ParseResult {
    pub symbols: Vec<ParsedSymbol>,
    pub references: Vec<RawReference>,
    pub column_references: Vec<ParsedColumnReference>,
}

impl ParseResult {
    pub fn merge(&mut self, other: ParseResult) {
        self.symbols.extend(other.symbols);
        self.references.extend(other.references);
        self.column_references.extend(other.column_references);
    }
}
