//! Fallback for files whose extension no concrete parser claims: one
//! module symbol, no references, so the file still shows up in search
//! and browsing without pretending to understand its contents.

use std::path::Path;

use codemesh_core::enums::{Language, SymbolKind};

use crate::error::ParseError;
use crate::registry::LanguageParser;
use crate::result::{ParseResult, ParsedSymbol, Span};

pub struct GenericParser;

impl LanguageParser for GenericParser {
    fn language(&self) -> Language {
        Language::Unknown
    }

    fn parse(&self, path: &Path, content: &str) -> Result<ParseResult, ParseError> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();
        let end_line = content.lines().count().max(1) as u32;

        Ok(ParseResult {
            symbols: vec![ParsedSymbol {
                name: name.clone(),
                qualified_name: path.to_string_lossy().to_string(),
                kind: SymbolKind::Module,
                span: Span {
                    start_line: 1,
                    end_line,
                },
                signature: None,
                doc: None,
            }],
            references: Vec::new(),
            column_references: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emits_a_single_module_symbol() {
        let parser = GenericParser;
        let result = parser.parse(Path::new("README.md"), "line one\nline two\n").unwrap();
        assert_eq!(result.symbols.len(), 1);
        assert_eq!(result.symbols[0].kind, SymbolKind::Module);
        assert!(result.references.is_empty());
    }
}
