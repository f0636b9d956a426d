//! Expression AST types.

use super::statement::SelectStatement;
use super::types::Value;
use crate::lexer::Span;

/// A literal value as it appears in source text.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// Integer literal.
    Integer(i64),
    /// Float literal.
    Float(f64),
    /// String literal.
    String(String),
    /// `NULL`.
    Null,
    /// `TRUE` / `FALSE`.
    Boolean(bool),
}

impl Literal {
    /// Converts a parsed literal into a runtime [`Value`].
    #[must_use]
    pub fn into_value(self) -> Value {
        match self {
            Self::Integer(i) => Value::Integer(i),
            Self::Float(f) => Value::Double(f),
            Self::String(s) => Value::String(s),
            Self::Null => Value::Null,
            Self::Boolean(b) => Value::Boolean(b),
        }
    }
}

/// Binary comparison and logical operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// `=`
    Eq,
    /// `<>` / `!=`
    NotEq,
    /// `<`
    Lt,
    /// `>`
    Gt,
    /// `<=`
    LtEq,
    /// `>=`
    GtEq,
    /// `AND`
    And,
    /// `OR`
    Or,
    /// `LIKE`
    Like,
}

impl BinaryOp {
    /// Binding power used by the Pratt parser: `(left, right)`. Higher binds
    /// tighter. `OR < AND < comparisons`, matching the grammar in order.
    #[must_use]
    pub const fn binding_power(self) -> (u8, u8) {
        match self {
            Self::Or => (1, 2),
            Self::And => (3, 4),
            Self::Eq | Self::NotEq | Self::Lt | Self::Gt | Self::LtEq | Self::GtEq | Self::Like => {
                (5, 6)
            }
        }
    }
}

/// A node in the expression tree. Owns its children; the tree is acyclic
/// even where a subquery nests another full statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A literal value.
    Literal(Literal, Span),
    /// A column reference.
    Column(String, Span),
    /// A binary operator application.
    Binary {
        /// Left-hand operand.
        left: Box<Expr>,
        /// The operator.
        op: BinaryOp,
        /// Right-hand operand.
        right: Box<Expr>,
        /// Location of the whole expression.
        span: Span,
    },
    /// Logical negation, `NOT expr`.
    Not {
        /// The negated expression.
        expr: Box<Expr>,
        /// Location of the whole expression.
        span: Span,
    },
    /// A parenthesized sub-expression, kept to preserve evaluation order
    /// in diagnostics; it evaluates identically to its inner expression.
    Paren(Box<Expr>, Span),
    /// `expr IN (literal, literal, …)`.
    InList {
        /// The expression being tested.
        expr: Box<Expr>,
        /// The candidate literal values.
        list: Vec<Expr>,
        /// Location of the whole expression.
        span: Span,
    },
    /// `expr IN (SELECT …)`.
    InSubquery {
        /// The expression being tested.
        expr: Box<Expr>,
        /// The nested single-column SELECT.
        subquery: Box<SelectStatement>,
        /// Location of the whole expression.
        span: Span,
    },
}

impl Expr {
    /// Returns the source span covering this expression.
    #[must_use]
    pub const fn span(&self) -> Span {
        match self {
            Self::Literal(_, span)
            | Self::Column(_, span)
            | Self::Binary { span, .. }
            | Self::Not { span, .. }
            | Self::Paren(_, span)
            | Self::InList { span, .. }
            | Self::InSubquery { span, .. } => *span,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binding_power_ordering() {
        assert!(BinaryOp::Or.binding_power().0 < BinaryOp::And.binding_power().0);
        assert!(BinaryOp::And.binding_power().0 < BinaryOp::Eq.binding_power().0);
        assert_eq!(BinaryOp::Like.binding_power(), BinaryOp::Lt.binding_power());
    }

    #[test]
    fn test_literal_into_value() {
        assert_eq!(Literal::Integer(3).into_value(), Value::Integer(3));
        assert_eq!(Literal::Null.into_value(), Value::Null);
    }
}
