//! JavaScript/TypeScript parsing via tree-sitter. Symbols come from
//! walking the AST for function/class/interface declarations; the
//! frontend<->backend route bridge comes from recognizing
//! `fetch("/api/...")` and `axios.get("/api/...")`-shaped call
//! expressions and recording the literal path as a reference target —
//! the Resolve stage matches it against known route symbols.

use std::path::Path;

use regex::Regex;
use tree_sitter::{Node, Parser};

use codemesh_core::enums::{EdgeType, Language, SymbolKind};

use crate::error::ParseError;
use crate::registry::LanguageParser;
use crate::result::{ParseResult, ParsedSymbol, RawReference, Span};

pub struct JsTsParser;

impl JsTsParser {
    pub fn new() -> Self {
        Self
    }
}

impl Default for JsTsParser {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageParser for JsTsParser {
    fn language(&self) -> Language {
        Language::TypeScript
    }

    fn parse(&self, path: &Path, content: &str) -> Result<ParseResult, ParseError> {
        let is_typescript = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("ts") || e.eq_ignore_ascii_case("tsx"))
            .unwrap_or(true);

        let mut parser = Parser::new();
        let language = if is_typescript {
            tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()
        } else {
            tree_sitter_javascript::LANGUAGE.into()
        };
        parser
            .set_language(&language)
            .map_err(|e| ParseError::Syntax {
                line: 0,
                message: format!("failed to load grammar: {e}"),
            })?;

        let tree = parser.parse(content, None).ok_or_else(|| ParseError::Syntax {
            line: 0,
            message: "tree-sitter returned no tree".to_string(),
        })?;

        let module_name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("module")
            .to_string();

        let mut result = ParseResult::default();
        walk(tree.root_node(), content, &module_name, &mut result);
        extract_route_calls(content, &module_name, &mut result);
        Ok(result)
    }
}

fn walk(node: Node, source: &str, module_name: &str, result: &mut ParseResult) {
    let kind = node.kind();
    let symbol_kind = match kind {
        "function_declaration" => Some(SymbolKind::Function),
        "class_declaration" => Some(SymbolKind::Class),
        "interface_declaration" => Some(SymbolKind::Interface),
        "method_definition" => Some(SymbolKind::Method),
        _ => None,
    };

    if let Some(symbol_kind) = symbol_kind {
        if let Some(name_node) = node.child_by_field_name("name") {
            if let Ok(name) = name_node.utf8_text(source.as_bytes()) {
                result.symbols.push(ParsedSymbol {
                    name: name.to_string(),
                    qualified_name: format!("{module_name}.{name}"),
                    kind: symbol_kind,
                    span: Span {
                        start_line: node.start_position().row as u32 + 1,
                        end_line: node.end_position().row as u32 + 1,
                    },
                    signature: None,
                    doc: None,
                });
            }
        }
    }

    if kind == "import_statement" {
        if let Some(source_node) = node.child_by_field_name("source") {
            if let Ok(raw) = source_node.utf8_text(source.as_bytes()) {
                let imported = raw.trim_matches(|c| c == '\'' || c == '"');
                result.references.push(RawReference {
                    from_qualified_name: module_name.to_string(),
                    to_name: imported.to_string(),
                    edge_type: EdgeType::Imports,
                    line: Some(node.start_position().row as u32 + 1),
                });
            }
        }
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk(child, source, module_name, result);
    }
}

fn extract_route_calls(content: &str, module_name: &str, result: &mut ParseResult) {
    let call_re = Regex::new(
        r#"(?:fetch|axios\.(?:get|post|put|delete|patch))\s*\(\s*[`'"]([^`'"]+)[`'"]"#,
    )
    .expect("static regex is valid");

    for caps in call_re.captures_iter(content) {
        let route = caps.get(1).unwrap().as_str();
        if !route.starts_with('/') {
            continue;
        }
        let line = content[..caps.get(0).unwrap().start()].matches('\n').count() as u32 + 1;
        result.references.push(RawReference {
            from_qualified_name: module_name.to_string(),
            to_name: route.to_string(),
            edge_type: EdgeType::CallsApi,
            line: Some(line),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn extracts_function_and_class() {
        let parser = JsTsParser::new();
        let code = r#"
function greet(name) {
    return "hi " + name;
}

class Widget {
    render() {
        return null;
    }
}
"#;
        let result = parser.parse(&PathBuf::from("widget.js"), code).unwrap();
        assert!(result.symbols.iter().any(|s| s.name == "greet" && s.kind == SymbolKind::Function));
        assert!(result.symbols.iter().any(|s| s.name == "Widget" && s.kind == SymbolKind::Class));
        assert!(result.symbols.iter().any(|s| s.name == "render" && s.kind == SymbolKind::Method));
    }

    #[test]
    fn bridges_fetch_call_to_a_route() {
        let parser = JsTsParser::new();
        let code = r#"
async function loadInvoices() {
    const response = await fetch("/api/v1/invoices");
    return response.json();
}
"#;
        let result = parser.parse(&PathBuf::from("invoices.ts"), code).unwrap();
        assert!(result
            .references
            .iter()
            .any(|r| r.to_name == "/api/v1/invoices" && r.edge_type == EdgeType::CallsApi));
    }
}
