use thiserror::Error;

/// A parser never panics on malformed input — anything it can't make
/// sense of becomes one of these instead.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("io error reading source: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not decode file as utf-8")]
    Encoding,

    #[error("syntax error at line {line}: {message}")]
    Syntax { line: u32, message: String },

    #[error("no parser registered for language: {0}")]
    UnsupportedLanguage(String),
}
