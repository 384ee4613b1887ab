use std::path::Path;

use codemesh_core::enums::Language;

use crate::error::ParseError;
use crate::registry::LanguageParser;
use crate::result::ParseResult;

use super::common;

pub struct PostgresParser;

impl PostgresParser {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PostgresParser {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageParser for PostgresParser {
    fn language(&self) -> Language {
        Language::Postgres
    }

    fn parse(&self, _path: &Path, content: &str) -> Result<ParseResult, ParseError> {
        Ok(common::extract(content, "public"))
    }
}
