//! Java parsing via tree-sitter. Spring-style `@RequestMapping`-family
//! annotations are recognized so REST endpoints can be bridged against
//! the frontend's `fetch`/`axios` call sites the JS/TS parser records.

use std::path::Path;

use regex::Regex;
use tree_sitter::{Node, Parser};

use codemesh_core::enums::{Language, SymbolKind};

use crate::error::ParseError;
use crate::registry::LanguageParser;
use crate::result::{ParseResult, ParsedSymbol, Span};

pub struct JavaParser;

impl JavaParser {
    pub fn new() -> Self {
        Self
    }
}

impl Default for JavaParser {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageParser for JavaParser {
    fn language(&self) -> Language {
        Language::Java
    }

    fn parse(&self, path: &Path, content: &str) -> Result<ParseResult, ParseError> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_java::LANGUAGE.into())
            .map_err(|e| ParseError::Syntax {
                line: 0,
                message: format!("failed to load grammar: {e}"),
            })?;

        let tree = parser.parse(content, None).ok_or_else(|| ParseError::Syntax {
            line: 0,
            message: "tree-sitter returned no tree".to_string(),
        })?;

        let package = extract_package(content).unwrap_or_else(|| {
            path.file_stem().and_then(|s| s.to_str()).unwrap_or("unknown").to_string()
        });

        let mut result = ParseResult::default();
        walk(tree.root_node(), content, &package, &mut result);
        extract_endpoints(content, &package, &mut result);
        Ok(result)
    }
}

fn extract_package(content: &str) -> Option<String> {
    let re = Regex::new(r"package\s+([\w.]+)\s*;").expect("static regex is valid");
    re.captures(content).map(|c| c.get(1).unwrap().as_str().to_string())
}

fn walk(node: Node, source: &str, package: &str, result: &mut ParseResult) {
    let symbol_kind = match node.kind() {
        "class_declaration" => Some(SymbolKind::Class),
        "interface_declaration" => Some(SymbolKind::Interface),
        "enum_declaration" => Some(SymbolKind::Enum),
        "method_declaration" => Some(SymbolKind::Method),
        _ => None,
    };

    if let Some(symbol_kind) = symbol_kind {
        if let Some(name_node) = node.child_by_field_name("name") {
            if let Ok(name) = name_node.utf8_text(source.as_bytes()) {
                result.symbols.push(ParsedSymbol {
                    name: name.to_string(),
                    qualified_name: format!("{package}.{name}"),
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

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk(child, source, package, result);
    }
}

fn extract_endpoints(content: &str, package: &str, result: &mut ParseResult) {
    let mapping_re = Regex::new(
        r#"@(?:Request|Get|Post|Put|Delete|Patch)Mapping\s*\(\s*(?:value\s*=\s*)?"([^"]+)""#,
    )
    .expect("static regex is valid");

    for caps in mapping_re.captures_iter(content) {
        let route = caps.get(1).unwrap().as_str();
        let line = content[..caps.get(0).unwrap().start()].matches('\n').count() as u32 + 1;
        result.symbols.push(ParsedSymbol {
            name: route.to_string(),
            qualified_name: format!("{package}.{route}"),
            kind: SymbolKind::Endpoint,
            span: Span {
                start_line: line,
                end_line: line,
            },
            signature: None,
            doc: None,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn extracts_class_and_method() {
        let parser = JavaParser::new();
        let code = r#"
package com.billing.api;

public class InvoiceController {
    public Invoice getInvoice(int id) {
        return null;
    }
}
"#;
        let result = parser.parse(&PathBuf::from("InvoiceController.java"), code).unwrap();
        assert!(result.symbols.iter().any(|s| s.name == "InvoiceController" && s.kind == SymbolKind::Class));
        assert!(result.symbols.iter().any(|s| s.name == "getInvoice" && s.kind == SymbolKind::Method));
    }

    #[test]
    fn extracts_request_mapping_as_endpoint() {
        let parser = JavaParser::new();
        let code = r#"
package com.billing.api;

public class InvoiceController {
    @GetMapping("/api/v1/invoices")
    public Invoice[] listInvoices() {
        return null;
    }
}
"#;
        let result = parser.parse(&PathBuf::from("InvoiceController.java"), code).unwrap();
        assert!(result
            .symbols
            .iter()
            .any(|s| s.kind == SymbolKind::Endpoint && s.name == "/api/v1/invoices"));
    }
}
