//! C# parsing. No tree-sitter grammar for C# is available, so symbols
//! come from a regex scan of class/interface/method declarations — good
//! enough for the shapes ORM and ADO.NET code actually takes. Cross-
//! language bridges come from three independent scans: `[Table("X")]`/
//! `DbSet<X>` ORM mappings, `ExecuteNonQuery`/`ExecuteReader`-style ADO
//! stored-procedure calls, and embedded SQL string literals — the same
//! three places a reviewer would grep for a table or proc name.

use std::ops::Range;
use std::path::Path;

use regex::Regex;

use codemesh_core::enums::{EdgeType, Language, SymbolKind};

use crate::error::ParseError;
use crate::registry::LanguageParser;
use crate::result::{ParseResult, ParsedSymbol, RawReference, Span};
use crate::sql::common::line_of;

pub struct CSharpParser;

impl CSharpParser {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CSharpParser {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageParser for CSharpParser {
    fn language(&self) -> Language {
        Language::CSharp
    }

    fn parse(&self, path: &Path, content: &str) -> Result<ParseResult, ParseError> {
        let namespace = extract_namespace(content).unwrap_or_else(|| {
            path.file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("Unknown")
                .to_string()
        });

        let mut result = ParseResult::default();
        let enclosure = extract_types(content, &namespace, &mut result);
        extract_table_attribute_references(content, &namespace, &enclosure, &mut result);
        extract_ado_call_references(content, &namespace, &enclosure, &mut result);
        extract_sql_bridge_references(content, &namespace, &enclosure, &mut result);
        Ok(result)
    }
}

fn extract_namespace(content: &str) -> Option<String> {
    let re = Regex::new(r"namespace\s+([\w.]+)").expect("static regex is valid");
    re.captures(content)
        .map(|c| c.get(1).unwrap().as_str().to_string())
}

/// Byte-offset spans of every class and method body found in the file,
/// so later passes can name the symbol that actually encloses a given
/// reference instead of falling back to the whole namespace.
#[derive(Default)]
struct Enclosure {
    classes: Vec<(Range<usize>, String)>,
    methods: Vec<(Range<usize>, String)>,
}

impl Enclosure {
    /// The innermost known symbol containing `offset`: a method body if
    /// one wraps it, else a class body, else `fallback` (the namespace).
    fn qualified_name_at(&self, offset: usize, fallback: &str) -> String {
        if let Some((_, name)) = smallest_containing(&self.methods, offset) {
            return name.clone();
        }
        if let Some((_, name)) = smallest_containing(&self.classes, offset) {
            return name.clone();
        }
        fallback.to_string()
    }

    fn class_at(&self, offset: usize, fallback: &str) -> String {
        smallest_containing(&self.classes, offset)
            .map(|(_, name)| name.clone())
            .unwrap_or_else(|| fallback.to_string())
    }
}

fn smallest_containing<'a>(spans: &'a [(Range<usize>, String)], offset: usize) -> Option<&'a (Range<usize>, String)> {
    spans
        .iter()
        .filter(|(range, _)| range.contains(&offset))
        .min_by_key(|(range, _)| range.end - range.start)
}

/// Finds the `{` that opens the block starting at or after `search_from`,
/// then walks forward counting brace depth until it closes, returning the
/// byte range `open..close` (exclusive of `close`'s matching `}` byte).
fn block_span(content: &str, search_from: usize) -> Option<Range<usize>> {
    let open_rel = content[search_from..].find('{')?;
    let open = search_from + open_rel;
    let mut depth = 0i32;
    for (idx, ch) in content[open..].char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open..(open + idx + ch.len_utf8()));
                }
            }
            _ => {}
        }
    }
    Some(open..content.len())
}

fn extract_types(content: &str, namespace: &str, result: &mut ParseResult) -> Enclosure {
    let mut enclosure = Enclosure::default();

    let type_re = Regex::new(
        r"(?m)^\s*(?:public|internal|private|protected)?\s*(?:static\s+|sealed\s+|abstract\s+|partial\s+)*(class|interface|struct|enum)\s+(\w+)",
    )
    .expect("static regex is valid");

    for caps in type_re.captures_iter(content) {
        let kind_word = caps.get(1).unwrap().as_str();
        let name = caps.get(2).unwrap().as_str().to_string();
        let kind = match kind_word {
            "class" => SymbolKind::Class,
            "interface" => SymbolKind::Interface,
            "struct" => SymbolKind::Struct,
            "enum" => SymbolKind::Enum,
            _ => continue,
        };
        let whole = caps.get(0).unwrap();
        let line = line_of(content, whole.start());
        let qualified_name = format!("{namespace}.{name}");

        if let Some(span) = block_span(content, whole.end()) {
            enclosure.classes.push((span, qualified_name.clone()));
        }

        result.symbols.push(ParsedSymbol {
            name: name.clone(),
            qualified_name,
            kind,
            span: Span {
                start_line: line,
                end_line: line,
            },
            signature: None,
            doc: None,
        });
    }

    let method_re = Regex::new(
        r"(?m)^\s*(?:public|internal|private|protected)\s+(?:static\s+|virtual\s+|override\s+|async\s+)*[\w<>\[\],\s]+\s+(\w+)\s*\([^)]*\)\s*\{",
    )
    .expect("static regex is valid");

    for caps in method_re.captures_iter(content) {
        let name = caps.get(1).unwrap().as_str().to_string();
        if name == "if" || name == "for" || name == "while" || name == "switch" {
            continue;
        }
        let whole = caps.get(0).unwrap();
        let line = line_of(content, whole.start());
        let class_qualified = enclosure.class_at(whole.start(), namespace);
        let qualified_name = format!("{class_qualified}.{name}");

        // The regex's trailing `\{` is the method's own opening brace.
        let open = whole.end() - 1;
        if let Some(span) = block_span(content, open) {
            enclosure.methods.push((span, qualified_name.clone()));
        }

        result.symbols.push(ParsedSymbol {
            name: name.clone(),
            qualified_name,
            kind: SymbolKind::Method,
            span: Span {
                start_line: line,
                end_line: line,
            },
            signature: None,
            doc: None,
        });
    }

    enclosure
}

/// `[Table("Orders")]` immediately preceding a class declaration, and
/// `DbSet<Order> Orders { get; set; }` properties on a `DbContext`,
/// both recorded as `uses_table` references from the enclosing class.
fn extract_table_attribute_references(content: &str, namespace: &str, enclosure: &Enclosure, result: &mut ParseResult) {
    let table_attr_re = Regex::new(
        r#"(?s)\[\s*Table\(\s*"([^"]+)"\s*\)\s*\]\s*(?:public\s+|internal\s+)?(?:sealed\s+|abstract\s+|partial\s+)*class\s+(\w+)"#,
    )
    .expect("static regex is valid");

    for caps in table_attr_re.captures_iter(content) {
        let table = caps.get(1).unwrap().as_str().to_string();
        let class_name = caps.get(2).unwrap().as_str();
        let whole = caps.get(0).unwrap();
        let line = line_of(content, whole.start());
        result.references.push(RawReference {
            from_qualified_name: format!("{namespace}.{class_name}"),
            to_name: table,
            edge_type: EdgeType::UsesTable,
            line: Some(line),
        });
    }

    let dbset_re = Regex::new(r"DbSet\s*<\s*(\w+)\s*>\s*\w+").expect("static regex is valid");
    for caps in dbset_re.captures_iter(content) {
        let entity = caps.get(1).unwrap().as_str().to_string();
        let whole = caps.get(0).unwrap();
        let line = line_of(content, whole.start());
        let from = enclosure.qualified_name_at(whole.start(), namespace);
        result.references.push(RawReference {
            from_qualified_name: from,
            to_name: entity,
            edge_type: EdgeType::UsesTable,
            line: Some(line),
        });
    }
}

/// ADO.NET stored-procedure call sites: `provider.ExecuteNonQuery("GetActiveUsers", ...)`
/// and its `ExecuteReader`/`ExecuteScalar` siblings, recorded as `calls`
/// references from the enclosing method to the named procedure.
fn extract_ado_call_references(content: &str, namespace: &str, enclosure: &Enclosure, result: &mut ParseResult) {
    let exec_re = Regex::new(r#"(?:ExecuteNonQuery|ExecuteReader|ExecuteScalar)\s*\(\s*"([A-Za-z_]\w*)""#)
        .expect("static regex is valid");

    for caps in exec_re.captures_iter(content) {
        let proc_name = caps.get(1).unwrap().as_str().to_string();
        let whole = caps.get(0).unwrap();
        let line = line_of(content, whole.start());
        let from = enclosure.qualified_name_at(whole.start(), namespace);
        result.references.push(RawReference {
            from_qualified_name: from,
            to_name: proc_name,
            edge_type: EdgeType::Calls,
            line: Some(line),
        });
    }
}

/// Scans string literals for `FROM <table>` / `INSERT INTO <table>` /
/// `UPDATE <table>` and records a `ReadsFrom`/`WritesTo` reference from
/// the enclosing method (or class, if the literal sits outside any
/// method) to that table name.
fn extract_sql_bridge_references(content: &str, namespace: &str, enclosure: &Enclosure, result: &mut ParseResult) {
    let string_re = Regex::new(r#""([^"]*(?:FROM|INSERT\s+INTO|UPDATE)[^"]*)""#).expect("static regex is valid");
    let table_re = Regex::new(r"(?is)(?:FROM|INSERT\s+INTO|UPDATE)\s+([\[\]\.\w]+)").expect("static regex is valid");

    for caps in string_re.captures_iter(content) {
        let literal = caps.get(1).unwrap().as_str();
        let whole = caps.get(0).unwrap();
        let line = line_of(content, whole.start());
        if let Some(table_caps) = table_re.captures(literal) {
            let table = table_caps.get(1).unwrap().as_str().replace(['[', ']'], "");
            let edge_type = if literal.to_uppercase().contains("INSERT") || literal.to_uppercase().contains("UPDATE") {
                EdgeType::WritesTo
            } else {
                EdgeType::ReadsFrom
            };
            let from = enclosure.qualified_name_at(whole.start(), namespace);
            result.references.push(RawReference {
                from_qualified_name: from,
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
    fn extracts_class_and_method() {
        let parser = CSharpParser::new();
        let code = r#"
namespace Billing.Services
{
    public class InvoiceService
    {
        public Invoice GetInvoice(int id)
        {
            return null;
        }
    }
}
"#;
        let result = parser.parse(&PathBuf::from("InvoiceService.cs"), code).unwrap();
        assert!(result.symbols.iter().any(|s| s.name == "InvoiceService" && s.kind == SymbolKind::Class));
        let method = result
            .symbols
            .iter()
            .find(|s| s.name == "GetInvoice" && s.kind == SymbolKind::Method)
            .expect("method should be extracted");
        assert_eq!(method.qualified_name, "Billing.Services.InvoiceService.GetInvoice");
    }

    #[test]
    fn bridges_embedded_sql_to_a_table_reference_from_the_enclosing_method() {
        let parser = CSharpParser::new();
        let code = r#"
namespace Billing.Data
{
    public class InvoiceRepository
    {
        public void Load()
        {
            var sql = "SELECT * FROM Invoices WHERE Id = @id";
        }
    }
}
"#;
        let result = parser.parse(&PathBuf::from("InvoiceRepository.cs"), code).unwrap();
        let reference = result
            .references
            .iter()
            .find(|r| r.to_name == "Invoices" && r.edge_type == EdgeType::ReadsFrom)
            .expect("embedded SQL reference should be found");
        assert_eq!(reference.from_qualified_name, "Billing.Data.InvoiceRepository.Load");
    }

    #[test]
    fn table_attribute_bridges_the_class_to_its_table() {
        let parser = CSharpParser::new();
        let code = r#"
namespace Billing.Data
{
    [Table("Users")]
    public class User
    {
    }
}
"#;
        let result = parser.parse(&PathBuf::from("User.cs"), code).unwrap();
        assert!(result
            .references
            .iter()
            .any(|r| r.from_qualified_name == "Billing.Data.User" && r.to_name == "Users" && r.edge_type == EdgeType::UsesTable));
    }

    #[test]
    fn dbset_property_bridges_the_dbcontext_to_its_entity_table() {
        let parser = CSharpParser::new();
        let code = r#"
namespace Billing.Data
{
    public class BillingContext
    {
        public DbSet<Order> Orders { get; set; }
    }
}
"#;
        let result = parser.parse(&PathBuf::from("BillingContext.cs"), code).unwrap();
        assert!(result
            .references
            .iter()
            .any(|r| r.from_qualified_name == "Billing.Data.BillingContext" && r.to_name == "Order" && r.edge_type == EdgeType::UsesTable));
    }

    #[test]
    fn ado_stored_procedure_call_bridges_the_method_to_the_procedure() {
        let parser = CSharpParser::new();
        let code = r#"
namespace Billing.Data
{
    public class UserRepo
    {
        public void LoadActive()
        {
            provider.ExecuteNonQuery("GetActiveUsers", CommandType.StoredProcedure);
        }
    }
}
"#;
        let result = parser.parse(&PathBuf::from("UserRepo.cs"), code).unwrap();
        let reference = result
            .references
            .iter()
            .find(|r| r.to_name == "GetActiveUsers" && r.edge_type == EdgeType::Calls)
            .expect("ADO call-site reference should be found");
        assert_eq!(reference.from_qualified_name, "Billing.Data.UserRepo.LoadActive");
    }
}
