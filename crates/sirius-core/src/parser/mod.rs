//! SQL Parser
//!
//! A hand-written recursive-descent parser with Pratt expression parsing,
//! covering `SELECT`, `INSERT`, `UPDATE`, `DELETE`, `CREATE TABLE`,
//! `DROP TABLE` and `ALTER TABLE`.
//!
//! # Parsing approach
//!
//! Statements are parsed by dedicated recursive-descent methods.
//! Expressions use a Pratt (top-down operator precedence) parser: each
//! [`crate::ast::BinaryOp`] carries its own binding power, and `NOT`
//! binds tighter than any comparison but looser than a primary
//! expression.
//!
//! # Error recovery
//!
//! [`parse_statements`] parses a `;`-separated batch. A statement that
//! fails to parse does not abort the batch: the parser records the
//! error, discards tokens up to the next `;` or statement-starting
//! keyword, and resumes with the next statement. Consecutive identical
//! error messages are collapsed into one.
mod error;
mod parser;
mod pratt;

pub use error::ParseError;
pub use parser::{parse_statements, Parser};
