//! Delphi/Object Pascal parsing. Regex-based for the same reason as ASP
//! Classic — no tree-sitter grammar exists for the dialect in this
//! stack. Extracts unit-level `type` declarations (`class`, `interface`)
//! and procedure/function headers.

use std::path::Path;

use regex::Regex;

use codemesh_core::enums::{Language, SymbolKind};

use crate::error::ParseError;
use crate::registry::LanguageParser;
use crate::result::{ParseResult, ParsedSymbol, Span};
use crate::sql::common::line_of;

pub struct DelphiParser;

impl DelphiParser {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DelphiParser {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageParser for DelphiParser {
    fn language(&self) -> Language {
        Language::Delphi
    }

    fn parse(&self, path: &Path, content: &str) -> Result<ParseResult, ParseError> {
        let unit = extract_unit_name(content).unwrap_or_else(|| {
            path.file_stem().and_then(|s| s.to_str()).unwrap_or("Unit1").to_string()
        });

        let mut result = ParseResult::default();
        extract_types(content, &unit, &mut result);
        extract_routines(content, &unit, &mut result);
        Ok(result)
    }
}

fn extract_unit_name(content: &str) -> Option<String> {
    let re = Regex::new(r"(?im)^\s*unit\s+(\w+)\s*;").expect("static regex is valid");
    re.captures(content).map(|c| c.get(1).unwrap().as_str().to_string())
}

fn extract_types(content: &str, unit: &str, result: &mut ParseResult) {
    let type_re = Regex::new(r"(?im)^\s*(\w+)\s*=\s*class\b").expect("static regex is valid");
    for caps in type_re.captures_iter(content) {
        let name = caps.get(1).unwrap().as_str().to_string();
        let line = line_of(content, caps.get(0).unwrap().start());
        result.symbols.push(ParsedSymbol {
            name: name.clone(),
            qualified_name: format!("{unit}.{name}"),
            kind: SymbolKind::Class,
            span: Span {
                start_line: line,
                end_line: line,
            },
            signature: None,
            doc: None,
        });
    }

    let interface_re = Regex::new(r"(?im)^\s*(\w+)\s*=\s*interface\b").expect("static regex is valid");
    for caps in interface_re.captures_iter(content) {
        let name = caps.get(1).unwrap().as_str().to_string();
        let line = line_of(content, caps.get(0).unwrap().start());
        result.symbols.push(ParsedSymbol {
            name: name.clone(),
            qualified_name: format!("{unit}.{name}"),
            kind: SymbolKind::Interface,
            span: Span {
                start_line: line,
                end_line: line,
            },
            signature: None,
            doc: None,
        });
    }
}

fn extract_routines(content: &str, unit: &str, result: &mut ParseResult) {
    let routine_re =
        Regex::new(r"(?im)^\s*(procedure|function)\s+(\w+(?:\.\w+)?)").expect("static regex is valid");
    for caps in routine_re.captures_iter(content) {
        let kind_word = caps.get(1).unwrap().as_str();
        let name = caps.get(2).unwrap().as_str().to_string();
        let kind = if kind_word.eq_ignore_ascii_case("function") {
            SymbolKind::Function
        } else {
            SymbolKind::Method
        };
        let line = line_of(content, caps.get(0).unwrap().start());
        result.symbols.push(ParsedSymbol {
            name: name.clone(),
            qualified_name: format!("{unit}.{name}"),
            kind,
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
    fn extracts_class_and_function() {
        let parser = DelphiParser::new();
        let code = r#"
unit InvoiceUnit;

interface

type
  TInvoice = class
    function GetTotal: Double;
  end;

implementation

function TInvoice.GetTotal: Double;
begin
  Result := 0;
end;

end.
"#;
        let result = parser.parse(&PathBuf::from("InvoiceUnit.pas"), code).unwrap();
        assert!(result.symbols.iter().any(|s| s.name == "TInvoice" && s.kind == SymbolKind::Class));
        assert!(result.symbols.iter().any(|s| s.name.contains("GetTotal")));
    }
}
