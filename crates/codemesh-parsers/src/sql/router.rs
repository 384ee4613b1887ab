//! SQL has no file-extension tell for which dialect it is, so the
//! router sniffs a handful of dialect-specific tokens before handing
//! the file to the matching parser.

use std::sync::Arc;

use codemesh_core::enums::Language;

use crate::registry::LanguageParser;

use super::{PostgresParser, TSqlParser};

/// Picks T-SQL when it sees the `GO` batch separator or T-SQL-only
/// builtins (`NVARCHAR`, `GETDATE()`), Postgres when it sees `$$`
/// dollar-quoting or Postgres-only builtins (`SERIAL`, `NOW()`).
/// Defaults to Postgres when neither side has a clear signal, since
/// ANSI-ish SQL parses fine under the Postgres grammar.
pub fn detect_dialect(content: &str) -> Language {
    let upper = content.to_uppercase();

    let tsql_score = count_occurrences(&upper, "\nGO\n")
        + count_occurrences(&upper, "NVARCHAR")
        + count_occurrences(&upper, "GETDATE()")
        + count_occurrences(&upper, "[DBO].");

    let postgres_score = count_occurrences(content, "$$")
        + count_occurrences(&upper, "SERIAL")
        + count_occurrences(&upper, "NOW()")
        + count_occurrences(&upper, "::TEXT");

    if tsql_score > postgres_score {
        Language::TSql
    } else {
        Language::Postgres
    }
}

fn count_occurrences(haystack: &str, needle: &str) -> usize {
    haystack.matches(needle).count()
}

pub fn parser_for(content: &str) -> Arc<dyn LanguageParser> {
    match detect_dialect(content) {
        Language::TSql => Arc::new(TSqlParser::new()),
        _ => Arc::new(PostgresParser::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_tsql_from_batch_separator() {
        let sql = "CREATE TABLE dbo.Orders (Id INT, Placed NVARCHAR(50))\nGO\n";
        assert_eq!(detect_dialect(sql), Language::TSql);
    }

    #[test]
    fn detects_postgres_from_serial_and_now() {
        let sql = "CREATE TABLE orders (id SERIAL PRIMARY KEY, placed TIMESTAMP DEFAULT NOW())";
        assert_eq!(detect_dialect(sql), Language::Postgres);
    }

    #[test]
    fn defaults_to_postgres_on_ambiguous_input() {
        let sql = "SELECT 1";
        assert_eq!(detect_dialect(sql), Language::Postgres);
    }
}
