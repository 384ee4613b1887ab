use std::path::Path;
use std::sync::Arc;

use codemesh_core::enums::Language;

use crate::error::ParseError;
use crate::result::ParseResult;

pub trait LanguageParser: Send + Sync {
    fn language(&self) -> Language;

    /// Parses one file's content into symbols and unresolved references.
    /// Never panics — anything it can't make sense of is returned as a
    /// `ParseError` or simply omitted from the result.
    fn parse(&self, path: &Path, content: &str) -> Result<ParseResult, ParseError>;
}

/// Maps a file to the parser that should handle it. Extension-based
/// dispatch with a content-sniffing fallback for `.sql` (T-SQL vs.
/// Postgres) and a generic catch-all for anything unrecognized.
pub struct ParserRegistry {
    parsers: Vec<Arc<dyn LanguageParser>>,
    generic: Arc<dyn LanguageParser>,
}

impl ParserRegistry {
    pub fn with_default_parsers() -> Self {
        let parsers: Vec<Arc<dyn LanguageParser>> = vec![
            Arc::new(crate::dotnet::CSharpParser::new()),
            Arc::new(crate::js::JsTsParser::new()),
            Arc::new(crate::java::JavaParser::new()),
            Arc::new(crate::asp::AspClassicParser::new()),
            Arc::new(crate::delphi::DelphiParser::new()),
        ];
        Self {
            parsers,
            generic: Arc::new(crate::generic::GenericParser),
        }
    }

    /// SQL files need content sniffing, not just the extension, so they
    /// are routed explicitly rather than through the extension table.
    pub fn for_path(&self, path: &Path, content: &str) -> Arc<dyn LanguageParser> {
        if path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("sql"))
            .unwrap_or(false)
        {
            return crate::sql::router::parser_for(content);
        }

        for parser in &self.parsers {
            if parser_handles(parser.as_ref(), path) {
                return parser.clone();
            }
        }
        self.generic.clone()
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::with_default_parsers()
    }
}

fn parser_handles(parser: &dyn LanguageParser, path: &Path) -> bool {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let ext = ext.to_ascii_lowercase();
    match parser.language() {
        Language::CSharp => ext == "cs",
        Language::JavaScript | Language::TypeScript => {
            matches!(ext.as_str(), "js" | "jsx" | "ts" | "tsx" | "mjs" | "cjs")
        }
        Language::Java => ext == "java",
        Language::AspClassic => matches!(ext.as_str(), "asp" | "asa"),
        Language::Delphi => matches!(ext.as_str(), "pas" | "dpr" | "dfm"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatches_by_extension() {
        let registry = ParserRegistry::with_default_parsers();
        let parser = registry.for_path(Path::new("Service.cs"), "");
        assert_eq!(parser.language(), Language::CSharp);
    }

    #[test]
    fn falls_back_to_generic_for_unknown_extension() {
        let registry = ParserRegistry::with_default_parsers();
        let parser = registry.for_path(Path::new("notes.txt"), "");
        assert_eq!(parser.language(), Language::Unknown);
    }
}
