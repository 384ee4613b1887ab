use std::path::Path;

use codemesh_core::enums::Language;

use crate::error::ParseError;
use crate::registry::LanguageParser;
use crate::result::ParseResult;

use super::common;

pub struct TSqlParser;

impl TSqlParser {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TSqlParser {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageParser for TSqlParser {
    fn language(&self) -> Language {
        Language::TSql
    }

    fn parse(&self, _path: &Path, content: &str) -> Result<ParseResult, ParseError> {
        // `GO` batches are independent statements to SSMS but don't
        // change what our regex scan sees, so the batches are just
        // concatenated back with the separator stripped.
        let joined: String = content
            .lines()
            .filter(|line| !line.trim().eq_ignore_ascii_case("go"))
            .collect::<Vec<_>>()
            .join("\n");
        Ok(common::extract(&joined, "dbo"))
    }
}
