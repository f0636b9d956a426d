//! Binding powers and token-to-operator mapping for the expression parser.

use crate::ast::BinaryOp;
use crate::lexer::{Keyword, TokenKind};

/// Binding power of unary `NOT`, tighter than every comparison but looser
/// than a primary expression.
pub const NOT_BINDING_POWER: u8 = 7;

/// Maps a binary operator token to its [`BinaryOp`], if any.
#[must_use]
pub fn token_to_binary_op(kind: &TokenKind) -> Option<BinaryOp> {
    match kind {
        TokenKind::Eq => Some(BinaryOp::Eq),
        TokenKind::NotEq => Some(BinaryOp::NotEq),
        TokenKind::Lt => Some(BinaryOp::Lt),
        TokenKind::Gt => Some(BinaryOp::Gt),
        TokenKind::LtEq => Some(BinaryOp::LtEq),
        TokenKind::GtEq => Some(BinaryOp::GtEq),
        TokenKind::Keyword(Keyword::And) => Some(BinaryOp::And),
        TokenKind::Keyword(Keyword::Or) => Some(BinaryOp::Or),
        TokenKind::Keyword(Keyword::Like) => Some(BinaryOp::Like),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_to_binary_op() {
        assert_eq!(token_to_binary_op(&TokenKind::Eq), Some(BinaryOp::Eq));
        assert_eq!(
            token_to_binary_op(&TokenKind::Keyword(Keyword::And)),
            Some(BinaryOp::And)
        );
        assert_eq!(token_to_binary_op(&TokenKind::Comma), None);
    }
}
