//! Per-language parsing. Every concrete parser implements
//! [`registry::LanguageParser`] and is deterministic: the same input
//! bytes always produce the same `ParseResult`, and malformed input
//! becomes a [`error::ParseError`] rather than a panic.

pub mod asp;
pub mod delphi;
pub mod dotnet;
pub mod error;
pub mod generic;
pub mod java;
pub mod js;
pub mod registry;
pub mod result;
pub mod sql;

pub use error::ParseError;
pub use registry::{LanguageParser, ParserRegistry};
pub use result::{ParseResult, ParsedColumnReference, ParsedSymbol, RawReference, Span};
