//! Unified error type for the engine's public surface.
//!
//! Every layer below `execute()` (lexer, parser, storage) is free to use
//! its own error type internally; this is the one type that ever crosses
//! that boundary.

use thiserror::Error;

/// Convenience alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Every way a statement can fail to execute, from lexing through storage.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    /// The lexer could not classify part of the input (unterminated
    /// string, stray byte).
    #[error("lex error: {0}")]
    LexError(String),

    /// The parser rejected the statement's grammar.
    #[error("parse error: {0}")]
    ParseError(String),

    /// A referenced table or column does not exist.
    #[error("name error: {0}")]
    NameError(String),

    /// A `CREATE`/`ALTER TABLE` would leave the schema in an invalid state.
    #[error("schema error: {0}")]
    SchemaError(String),

    /// A `NOT NULL` or primary-key constraint was violated.
    #[error("constraint violation: {0}")]
    ConstraintError(String),

    /// A `WITH OPTIONS` value was out of its allowed range.
    #[error("invalid option: {0}")]
    OptionError(String),

    /// The storage backend failed to read or write its backing data.
    #[error("storage error: {0}")]
    StorageError(String),

    /// A bug in the engine itself, not a property of the input statement.
    #[error("internal error: {0}")]
    InternalError(String),
}

impl From<crate::parser::ParseError> for EngineError {
    fn from(err: crate::parser::ParseError) -> Self {
        Self::ParseError(err.to_string())
    }
}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        Self::StorageError(err.to_string())
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        Self::StorageError(err.to_string())
    }
}
