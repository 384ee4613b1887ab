//! Classic ASP (VBScript) parsing. No grammar exists for this dialect
//! anywhere in the ecosystem, so symbols come from regex-matching
//! `Sub`/`Function` blocks and the ASP<->SQL bridge comes from the same
//! embedded-SQL-string heuristic the C# parser uses.

use std::path::Path;

use regex::Regex;

use codemesh_core::enums::{EdgeType, Language, SymbolKind};

use crate::error::ParseError;
use crate::registry::LanguageParser;
use crate::result::{ParseResult, ParsedSymbol, RawReference, Span};
use crate::sql::common::line_of;

pub struct AspClassicParser;

impl AspClassicParser {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AspClassicParser {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageParser for AspClassicParser {
    fn language(&self) -> Language {
        Language::AspClassic
    }

    fn parse(&self, path: &Path, content: &str) -> Result<ParseResult, ParseError> {
        let module_name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("page")
            .to_string();

        let mut result = ParseResult::default();
        extract_routines(content, &module_name, &mut result);
        extract_sql_bridge(content, &module_name, &mut result);
        Ok(result)
    }
}

fn extract_routines(content: &str, module_name: &str, result: &mut ParseResult) {
    let routine_re = Regex::new(r"(?im)^\s*(?:public\s+|private\s+)?(sub|function)\s+(\w+)")
        .expect("static regex is valid");

    for caps in routine_re.captures_iter(content) {
        let name = caps.get(2).unwrap().as_str().to_string();
        let line = line_of(content, caps.get(0).unwrap().start());
        result.symbols.push(ParsedSymbol {
            name: name.clone(),
            qualified_name: format!("{module_name}.{name}"),
            kind: SymbolKind::Function,
            span: Span {
                start_line: line,
                end_line: line,
            },
            signature: None,
            doc: None,
        });
    }
}

fn extract_sql_bridge(content: &str, module_name: &str, result: &mut ParseResult) {
    let string_re = Regex::new(r#""([^"]*(?:FROM|INSERT\s+INTO|UPDATE)[^"]*)""#).expect("static regex is valid");
    let table_re = Regex::new(r"(?is)(?:FROM|INSERT\s+INTO|UPDATE)\s+([\[\]\.\w]+)").expect("static regex is valid");

    for caps in string_re.captures_iter(content) {
        let literal = caps.get(1).unwrap().as_str();
        let line = line_of(content, caps.get(0).unwrap().start());
        if let Some(table_caps) = table_re.captures(literal) {
            let table = table_caps.get(1).unwrap().as_str().replace(['[', ']'], "");
            let edge_type = if literal.to_uppercase().contains("INSERT") || literal.to_uppercase().contains("UPDATE") {
                EdgeType::WritesTo
            } else {
                EdgeType::ReadsFrom
            };
            result.references.push(RawReference {
                from_qualified_name: module_name.to_string(),
                to_name: table,
                edge_type,
                line: Some(line),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn extracts_sub_and_function() {
        let parser = AspClassicParser::new();
        let code = r#"
<%
Sub RenderHeader()
    Response.Write "<h1>Hi</h1>"
End Sub

Function GetTotal(id)
    GetTotal = 42
End Function
%>
"#;
        let result = parser.parse(&PathBuf::from("page.asp"), code).unwrap();
        assert!(result.symbols.iter().any(|s| s.name == "RenderHeader"));
        assert!(result.symbols.iter().any(|s| s.name == "GetTotal"));
    }

    #[test]
    fn bridges_embedded_sql() {
        let parser = AspClassicParser::new();
        let code = r#"
<%
sql = "SELECT * FROM Customers WHERE Id = " & id
%>
"#;
        let result = parser.parse(&PathBuf::from("page.asp"), code).unwrap();
        assert!(result.references.iter().any(|r| r.to_name == "Customers"));
    }
}
