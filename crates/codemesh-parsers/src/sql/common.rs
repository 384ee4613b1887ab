//! Regex-based statement scanning shared by the T-SQL and Postgres
//! parsers. Neither dialect needs a full grammar for the symbols and
//! lineage this system cares about — table/view/routine definitions and
//! simple `INSERT ... SELECT` / `UPDATE ... SET` derivations cover the
//! vast majority of real schemas and migrations.

use regex::Regex;

use codemesh_core::enums::{DerivationType, SymbolKind};

use crate::result::{ParseResult, ParsedColumnReference, ParsedSymbol, RawReference, Span};

pub fn line_of(content: &str, byte_offset: usize) -> u32 {
    content[..byte_offset.min(content.len())]
        .matches('\n')
        .count() as u32
        + 1
}

pub fn extract(content: &str, qualifier: &str) -> ParseResult {
    let mut result = ParseResult::default();
    extract_definitions(content, qualifier, &mut result);
    extract_lineage(content, &mut result);
    result
}

fn extract_definitions(content: &str, qualifier: &str, result: &mut ParseResult) {
    let object_re = Regex::new(
        r#"(?is)CREATE\s+(OR\s+REPLACE\s+)?(TABLE|VIEW|PROCEDURE|FUNCTION|TRIGGER)\s+(IF\s+NOT\s+EXISTS\s+)?([\[\]\.\w"]+)"#,
    )
    .expect("static regex is valid");

    for caps in object_re.captures_iter(content) {
        let kind_word = caps.get(2).unwrap().as_str().to_uppercase();
        let raw_name = caps.get(4).unwrap().as_str();
        let name = clean_identifier(raw_name);
        let kind = match kind_word.as_str() {
            "TABLE" => SymbolKind::Table,
            "VIEW" => SymbolKind::View,
            "PROCEDURE" => SymbolKind::Procedure,
            "FUNCTION" => SymbolKind::Function,
            "TRIGGER" => SymbolKind::Trigger,
            _ => continue,
        };
        let start = caps.get(0).unwrap().start();
        let line = line_of(content, start);
        let qualified_name = qualify(&name, qualifier);

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
}

/// Finds `INSERT INTO target (...) SELECT ... FROM source` and
/// `UPDATE target SET col = source.col` shapes and records them as
/// staged column references for the Lineage stage to resolve.
fn extract_lineage(content: &str, result: &mut ParseResult) {
    let insert_select_re = Regex::new(
        r#"(?is)INSERT\s+INTO\s+([\[\]\.\w"]+)\s*\(([^)]*)\)\s*SELECT\s+(.*?)\s+FROM\s+([\[\]\.\w"]+)"#,
    )
    .expect("static regex is valid");

    for caps in insert_select_re.captures_iter(content) {
        let target_table = clean_identifier(caps.get(1).unwrap().as_str());
        let target_cols: Vec<&str> = caps.get(2).unwrap().as_str().split(',').map(str::trim).collect();
        let select_list: Vec<&str> = caps.get(3).unwrap().as_str().split(',').map(str::trim).collect();
        let source_table = clean_identifier(caps.get(4).unwrap().as_str());
        let line = line_of(content, caps.get(0).unwrap().start());

        for (target_col, expr) in target_cols.iter().zip(select_list.iter()) {
            let target_col = clean_identifier(target_col);
            if target_col.is_empty() {
                continue;
            }
            let derivation = classify_expression(expr);
            result.column_references.push(ParsedColumnReference {
                source_column: format!("{source_table}.{}", source_column_of(expr)),
                target_column: format!("{target_table}.{target_col}"),
                derivation_type: derivation,
                expression: Some((*expr).to_string()),
                context: Some("insert_select".to_string()),
                line: Some(line),
            });
        }

        result.references.push(RawReference {
            from_qualified_name: target_table,
            to_name: source_table,
            edge_type: codemesh_core::enums::EdgeType::ReadsFrom,
            line: Some(line),
        });
    }
}

fn classify_expression(expr: &str) -> DerivationType {
    let upper = expr.to_uppercase();
    if upper.contains("CASE") || upper.contains("IIF(") {
        DerivationType::Conditional
    } else if upper.contains("SUM(") || upper.contains("COUNT(") || upper.contains("AVG(") || upper.contains("MAX(") || upper.contains("MIN(") {
        DerivationType::Aggregate
    } else if expr.contains('(') || upper.contains(" || ") || upper.contains('+') {
        DerivationType::Transform
    } else if expr.contains('.') && !expr.contains(' ') {
        DerivationType::DirectCopy
    } else {
        DerivationType::Other
    }
}

fn source_column_of(expr: &str) -> String {
    expr.rsplit('.').next().unwrap_or(expr).trim().to_string()
}

fn clean_identifier(raw: &str) -> String {
    raw.trim()
        .trim_matches(|c| c == '[' || c == ']' || c == '"')
        .replace("].[", ".")
        .to_string()
}

/// Prepends the dialect's default schema, but only when `name` doesn't
/// already carry one (`CREATE PROCEDURE dbo.GetActiveUsers` must stay
/// `dbo.GetActiveUsers`, not double up to `dbo.dbo.GetActiveUsers`).
fn qualify(name: &str, qualifier: &str) -> String {
    if name.contains('.') {
        name.to_string()
    } else {
        format!("{qualifier}.{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_table_and_view() {
        let sql = "CREATE TABLE orders (id INT);\nCREATE VIEW order_summary AS SELECT * FROM orders;";
        let result = extract(sql, "dbo");
        assert_eq!(result.symbols.len(), 2);
        assert_eq!(result.symbols[0].kind, SymbolKind::Table);
        assert_eq!(result.symbols[1].kind, SymbolKind::View);
    }

    #[test]
    fn does_not_double_prefix_an_already_schema_qualified_name() {
        let sql = "CREATE PROCEDURE dbo.GetActiveUsers AS SELECT * FROM dbo.Users WHERE active = 1;";
        let result = extract(sql, "dbo");
        assert_eq!(result.symbols[0].qualified_name, "dbo.GetActiveUsers");
    }

    #[test]
    fn migration_insert_select_on_schema_qualified_tables_stays_qualified() {
        let sql = "INSERT INTO dbo.Users (id, email) SELECT id, email FROM dbo.UsersLegacy;";
        let result = extract(sql, "dbo");
        assert_eq!(result.column_references.len(), 2);
        assert_eq!(result.column_references[0].target_column, "dbo.Users.id");
        assert_eq!(result.column_references[0].source_column, "dbo.UsersLegacy.id");
        assert_eq!(result.references[0].from_qualified_name, "dbo.Users");
        assert_eq!(result.references[0].to_name, "dbo.UsersLegacy");
    }

    #[test]
    fn classifies_direct_copy_lineage() {
        let sql = "INSERT INTO target_table (id, name) SELECT src.id, src.name FROM source_table src";
        let result = extract(sql, "dbo");
        assert_eq!(result.column_references.len(), 2);
        assert_eq!(result.column_references[0].derivation_type, DerivationType::DirectCopy);
    }

    #[test]
    fn classifies_aggregate_lineage() {
        let sql = "INSERT INTO totals (id, amount) SELECT src.id, SUM(src.amount) FROM source_table src";
        let result = extract(sql, "dbo");
        assert_eq!(result.column_references[1].derivation_type, DerivationType::Aggregate);
    }
}
