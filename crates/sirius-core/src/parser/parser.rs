//! SQL parser implementation.

use super::error::ParseError;
use super::pratt::{token_to_binary_op, NOT_BINDING_POWER};
use crate::ast::{
    AlterAction, AlterTableStatement, ColumnDef, CreateTableStatement, DataType, DeleteStatement,
    DropTableStatement, Expr, InsertStatement, Literal, SelectStatement, Statement, TableOptions,
    UpdateAssignment, UpdateStatement,
};
use crate::lexer::{Keyword, Lexer, Span, Token, TokenKind};

/// Recursive-descent parser over a pre-tokenized input.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    /// Tokenizes `input` and prepares a parser over the result.
    #[must_use]
    pub fn new(input: &str) -> Self {
        let tokens = Lexer::new(input).tokenize();
        Self { tokens, pos: 0 }
    }

    fn current(&self) -> &Token {
        // `tokenize` always ends with an `Eof` token, so this never runs past the end.
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn is_eof(&self) -> bool {
        self.current().is_eof()
    }

    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if !token.is_eof() {
            self.pos += 1;
        }
        token
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.current().kind) == std::mem::discriminant(kind)
    }

    fn check_keyword(&self, keyword: Keyword) -> bool {
        self.current().is_keyword(keyword)
    }

    fn expect_kind(&mut self, want: TokenKind, name: &str) -> Result<Token, ParseError> {
        if self.check(&want) {
            Ok(self.advance())
        } else if self.is_eof() {
            Err(ParseError::unexpected_eof(name, self.current().span))
        } else {
            let span = self.current().span;
            let kind = self.current().kind.clone();
            Err(ParseError::unexpected(name, &kind, span))
        }
    }

    fn expect_keyword(&mut self, keyword: Keyword) -> Result<Span, ParseError> {
        if self.check_keyword(keyword) {
            Ok(self.advance().span)
        } else if self.is_eof() {
            Err(ParseError::unexpected_eof(keyword.as_str(), self.current().span))
        } else {
            let span = self.current().span;
            let kind = self.current().kind.clone();
            Err(ParseError::unexpected(keyword.as_str(), &kind, span))
        }
    }

    fn expect_identifier(&mut self) -> Result<(String, Span), ParseError> {
        let span = self.current().span;
        match self.current().kind.clone() {
            TokenKind::Identifier(name) => {
                self.advance();
                Ok((name, span))
            }
            kind => Err(ParseError::unexpected("an identifier", &kind, span)),
        }
    }

    fn expect_integer(&mut self) -> Result<i64, ParseError> {
        let span = self.current().span;
        match self.current().kind.clone() {
            TokenKind::Integer(n) => {
                self.advance();
                Ok(n)
            }
            kind => Err(ParseError::unexpected("an integer literal", &kind, span)),
        }
    }

    fn expect_string(&mut self) -> Result<String, ParseError> {
        let span = self.current().span;
        match self.current().kind.clone() {
            TokenKind::String(s) => {
                self.advance();
                Ok(s)
            }
            kind => Err(ParseError::unexpected("a string literal", &kind, span)),
        }
    }

    fn parse_literal(&mut self) -> Result<Literal, ParseError> {
        let span = self.current().span;
        let literal = match self.current().kind.clone() {
            TokenKind::Integer(n) => Literal::Integer(n),
            TokenKind::Float(f) => Literal::Float(f),
            TokenKind::String(s) => Literal::String(s),
            TokenKind::Keyword(Keyword::Null) => Literal::Null,
            TokenKind::Keyword(Keyword::True) => Literal::Boolean(true),
            TokenKind::Keyword(Keyword::False) => Literal::Boolean(false),
            kind => return Err(ParseError::unexpected("a literal value", &kind, span)),
        };
        self.advance();
        Ok(literal)
    }

    /// Parses every statement in the input. A statement that fails to parse
    /// is skipped after recording its error; parsing resumes at the next
    /// `;` or statement-starting keyword.
    pub fn parse_program(&mut self) -> (Vec<Statement>, Vec<ParseError>) {
        let mut statements = Vec::new();
        let mut errors: Vec<ParseError> = Vec::new();

        while !self.is_eof() {
            while self.check(&TokenKind::Semicolon) {
                self.advance();
            }
            if self.is_eof() {
                break;
            }
            match self.parse_statement() {
                Ok(stmt) => statements.push(stmt),
                Err(err) => {
                    let is_duplicate = errors
                        .last()
                        .is_some_and(|last: &ParseError| last.message == err.message);
                    if !is_duplicate {
                        errors.push(err);
                    }
                    self.synchronize();
                }
            }
            if self.check(&TokenKind::Semicolon) {
                self.advance();
            }
        }

        (statements, errors)
    }

    /// Discards tokens until the next statement boundary so the next
    /// statement in a batch can still be parsed after an error.
    fn synchronize(&mut self) {
        loop {
            if self.is_eof() {
                return;
            }
            if self.check(&TokenKind::Semicolon) {
                self.advance();
                return;
            }
            if is_statement_start(self.current()) {
                return;
            }
            self.advance();
        }
    }

    fn parse_statement(&mut self) -> Result<Statement, ParseError> {
        match self.current().as_keyword() {
            Some(Keyword::Select) => self.parse_select().map(Statement::Select),
            Some(Keyword::Insert) => self.parse_insert().map(Statement::Insert),
            Some(Keyword::Update) => self.parse_update().map(Statement::Update),
            Some(Keyword::Delete) => self.parse_delete().map(Statement::Delete),
            Some(Keyword::Create) => self.parse_create_table().map(Statement::CreateTable),
            Some(Keyword::Drop) => self.parse_drop_table().map(Statement::DropTable),
            Some(Keyword::Alter) => self.parse_alter_table().map(Statement::AlterTable),
            _ => {
                let span = self.current().span;
                let kind = self.current().kind.clone();
                Err(ParseError::unexpected("a statement", &kind, span))
            }
        }
    }

    fn parse_select(&mut self) -> Result<SelectStatement, ParseError> {
        let start = self.expect_keyword(Keyword::Select)?;
        let columns = if self.check(&TokenKind::Asterisk) {
            self.advance();
            Vec::new()
        } else {
            self.parse_identifier_list()?
        };
        self.expect_keyword(Keyword::From)?;
        let (from, from_span) = self.expect_identifier()?;
        let where_clause = if self.check_keyword(Keyword::Where) {
            self.advance();
            Some(self.parse_expression(0)?)
        } else {
            None
        };
        let end = where_clause.as_ref().map_or(from_span, Expr::span);
        Ok(SelectStatement {
            columns,
            from,
            where_clause,
            span: start.merge(end),
        })
    }

    fn parse_identifier_list(&mut self) -> Result<Vec<String>, ParseError> {
        let mut names = vec![self.expect_identifier()?.0];
        while self.check(&TokenKind::Comma) {
            self.advance();
            names.push(self.expect_identifier()?.0);
        }
        Ok(names)
    }

    fn parse_insert(&mut self) -> Result<InsertStatement, ParseError> {
        let start = self.expect_keyword(Keyword::Insert)?;
        self.expect_keyword(Keyword::Into)?;
        let (table, _) = self.expect_identifier()?;

        let columns = if self.check(&TokenKind::LeftParen) {
            self.advance();
            let cols = self.parse_identifier_list()?;
            self.expect_kind(TokenKind::RightParen, "')'")?;
            cols
        } else {
            Vec::new()
        };

        self.expect_keyword(Keyword::Values)?;
        let mut rows = Vec::new();
        let mut end = start;
        loop {
            self.expect_kind(TokenKind::LeftParen, "'('")?;
            let mut row = vec![self.parse_literal()?];
            while self.check(&TokenKind::Comma) {
                self.advance();
                row.push(self.parse_literal()?);
            }
            let rparen = self.expect_kind(TokenKind::RightParen, "')'")?;
            end = rparen.span;
            rows.push(row);
            if self.check(&TokenKind::Comma) {
                self.advance();
                continue;
            }
            break;
        }

        Ok(InsertStatement {
            table,
            columns,
            rows,
            span: start.merge(end),
        })
    }

    fn parse_update(&mut self) -> Result<UpdateStatement, ParseError> {
        let start = self.expect_keyword(Keyword::Update)?;
        let (table, _) = self.expect_identifier()?;
        self.expect_keyword(Keyword::Set)?;

        let mut assignments = Vec::new();
        loop {
            let (column, _) = self.expect_identifier()?;
            self.expect_kind(TokenKind::Eq, "'='")?;
            let value = self.parse_literal()?;
            assignments.push(UpdateAssignment { column, value });
            if self.check(&TokenKind::Comma) {
                self.advance();
                continue;
            }
            break;
        }

        let where_clause = if self.check_keyword(Keyword::Where) {
            self.advance();
            Some(self.parse_expression(0)?)
        } else {
            None
        };
        let end = where_clause.as_ref().map_or(start, Expr::span);

        Ok(UpdateStatement {
            table,
            assignments,
            where_clause,
            span: start.merge(end),
        })
    }

    fn parse_delete(&mut self) -> Result<DeleteStatement, ParseError> {
        let start = self.expect_keyword(Keyword::Delete)?;
        self.expect_keyword(Keyword::From)?;
        let (table, table_span) = self.expect_identifier()?;
        let where_clause = if self.check_keyword(Keyword::Where) {
            self.advance();
            Some(self.parse_expression(0)?)
        } else {
            None
        };
        let end = where_clause.as_ref().map_or(table_span, Expr::span);
        Ok(DeleteStatement {
            table,
            where_clause,
            span: start.merge(end),
        })
    }

    fn parse_create_table(&mut self) -> Result<CreateTableStatement, ParseError> {
        let start = self.expect_keyword(Keyword::Create)?;
        self.expect_keyword(Keyword::Table)?;
        let (table, _) = self.expect_identifier()?;

        self.expect_kind(TokenKind::LeftParen, "'('")?;
        let mut columns = vec![self.parse_column_def()?];
        while self.check(&TokenKind::Comma) {
            self.advance();
            columns.push(self.parse_column_def()?);
        }
        let mut end = self.expect_kind(TokenKind::RightParen, "')'")?.span;

        let mut options = TableOptions::default();
        if self.check_keyword(Keyword::With) {
            self.advance();
            self.expect_keyword(Keyword::Options)?;
            self.expect_kind(TokenKind::LeftParen, "'('")?;
            self.parse_table_option(&mut options)?;
            while self.check(&TokenKind::Comma) {
                self.advance();
                self.parse_table_option(&mut options)?;
            }
            end = self.expect_kind(TokenKind::RightParen, "')'")?.span;
        }

        Ok(CreateTableStatement {
            table,
            columns,
            options,
            span: start.merge(end),
        })
    }

    fn parse_column_def(&mut self) -> Result<ColumnDef, ParseError> {
        let (name, _) = self.expect_identifier()?;
        let (type_name, _) = self.expect_identifier()?;
        let mut column = ColumnDef::new(name, DataType::from_name(&type_name));

        if self.check(&TokenKind::LeftParen) {
            self.advance();
            let len = self.expect_integer()?;
            self.expect_kind(TokenKind::RightParen, "')'")?;
            column.max_length = Some(len.max(0) as u32);
        }

        loop {
            if self.check_keyword(Keyword::Primary) {
                self.advance();
                self.expect_keyword(Keyword::Key)?;
                column.primary_key = true;
                column.not_null = true;
            } else if self.check_keyword(Keyword::Not) {
                self.advance();
                self.expect_keyword(Keyword::Null)?;
                column.not_null = true;
            } else {
                break;
            }
        }

        Ok(column)
    }

    fn parse_table_option(&mut self, options: &mut TableOptions) -> Result<(), ParseError> {
        if self.check_keyword(Keyword::MaxColumnLength) {
            self.advance();
            self.expect_kind(TokenKind::Eq, "'='")?;
            options.max_column_name_length = self.expect_integer()?.max(0) as u32;
        } else if self.check_keyword(Keyword::MaxStringLength) {
            self.advance();
            self.expect_kind(TokenKind::Eq, "'='")?;
            options.max_string_length = self.expect_integer()?.max(0) as u64;
        } else if self.check_keyword(Keyword::GcFrequency) {
            self.advance();
            self.expect_kind(TokenKind::Eq, "'='")?;
            let days = self.expect_integer()?;
            self.expect_keyword(Keyword::Days)?;
            options.gc_frequency_days = days.clamp(0, u16::MAX as i64) as u16;
        } else if self.check_keyword(Keyword::AdditionalChars) {
            self.advance();
            self.expect_kind(TokenKind::Eq, "'='")?;
            let chars = self.expect_string()?;
            options.additional_name_chars = chars.chars().collect();
        } else if self.check_keyword(Keyword::Types) {
            self.advance();
            self.expect_kind(TokenKind::Eq, "'='")?;
            self.expect_kind(TokenKind::LeftParen, "'('")?;
            let (name, _) = self.expect_identifier()?;
            options.allowed_types.insert(DataType::from_name(&name));
            while self.check(&TokenKind::Comma) {
                self.advance();
                let (name, _) = self.expect_identifier()?;
                options.allowed_types.insert(DataType::from_name(&name));
            }
            self.expect_kind(TokenKind::RightParen, "')'")?;
        } else {
            let span = self.current().span;
            let kind = self.current().kind.clone();
            return Err(ParseError::unexpected("a table option name", &kind, span));
        }
        Ok(())
    }

    fn parse_drop_table(&mut self) -> Result<DropTableStatement, ParseError> {
        let start = self.expect_keyword(Keyword::Drop)?;
        self.expect_keyword(Keyword::Table)?;
        let if_exists = if self.check_keyword(Keyword::If) {
            self.advance();
            self.expect_keyword(Keyword::Exists)?;
            true
        } else {
            false
        };
        let (table, table_span) = self.expect_identifier()?;
        Ok(DropTableStatement {
            table,
            if_exists,
            span: start.merge(table_span),
        })
    }

    fn parse_alter_table(&mut self) -> Result<AlterTableStatement, ParseError> {
        let start = self.expect_keyword(Keyword::Alter)?;
        self.expect_keyword(Keyword::Table)?;
        let (table, table_span) = self.expect_identifier()?;

        let (action, end) = if self.check_keyword(Keyword::Rename) {
            self.advance();
            if self.check_keyword(Keyword::Column) {
                self.advance();
                let (old_name, _) = self.expect_identifier()?;
                self.expect_keyword(Keyword::To)?;
                let (new_name, new_span) = self.expect_identifier()?;
                (AlterAction::RenameColumn { old_name, new_name }, new_span)
            } else {
                self.expect_keyword(Keyword::To)?;
                let (new_name, new_span) = self.expect_identifier()?;
                (AlterAction::RenameTable { new_name }, new_span)
            }
        } else if self.check_keyword(Keyword::Alter) {
            self.advance();
            self.expect_keyword(Keyword::Column)?;
            let (column, _) = self.expect_identifier()?;
            self.expect_keyword(Keyword::Type)?;
            let (new_type, type_span) = self.expect_identifier()?;
            (AlterAction::AlterColumnType { column, new_type }, type_span)
        } else if self.check_keyword(Keyword::Drop) {
            self.advance();
            self.expect_keyword(Keyword::Column)?;
            let (column, col_span) = self.expect_identifier()?;
            (AlterAction::DropColumn { column }, col_span)
        } else if self.check_keyword(Keyword::Add) {
            self.advance();
            self.expect_keyword(Keyword::Column)?;
            let column = self.parse_column_def()?;
            (AlterAction::AddColumn { column }, table_span)
        } else {
            let span = self.current().span;
            let kind = self.current().kind.clone();
            return Err(ParseError::unexpected(
                "RENAME, ALTER COLUMN, DROP COLUMN or ADD COLUMN",
                &kind,
                span,
            ));
        };

        Ok(AlterTableStatement {
            table,
            action,
            span: start.merge(table_span).merge(end),
        })
    }

    /// Pratt expression parser. `min_bp` is the minimum left binding power
    /// an operator must have to be consumed at this recursion level.
    fn parse_expression(&mut self, min_bp: u8) -> Result<Expr, ParseError> {
        let mut left = self.parse_prefix()?;

        loop {
            if self.check_keyword(Keyword::In) {
                const IN_BP: u8 = 5;
                if IN_BP < min_bp {
                    break;
                }
                self.advance();
                left = self.parse_in(left)?;
                continue;
            }

            let Some(op) = token_to_binary_op(&self.current().kind) else {
                break;
            };
            let (lbp, rbp) = op.binding_power();
            if lbp < min_bp {
                break;
            }
            self.advance();
            let right = self.parse_expression(rbp)?;
            let span = left.span().merge(right.span());
            left = Expr::Binary {
                left: Box::new(left),
                op,
                right: Box::new(right),
                span,
            };
        }

        Ok(left)
    }

    fn parse_in(&mut self, expr: Expr) -> Result<Expr, ParseError> {
        self.expect_kind(TokenKind::LeftParen, "'('")?;
        if self.check_keyword(Keyword::Select) {
            let subquery = self.parse_select()?;
            let end = self.expect_kind(TokenKind::RightParen, "')'")?.span;
            let span = expr.span().merge(end);
            Ok(Expr::InSubquery {
                expr: Box::new(expr),
                subquery: Box::new(subquery),
                span,
            })
        } else {
            let first_span = self.current().span;
            let mut list = vec![Expr::Literal(self.parse_literal()?, first_span)];
            while self.check(&TokenKind::Comma) {
                self.advance();
                let span = self.current().span;
                list.push(Expr::Literal(self.parse_literal()?, span));
            }
            let end = self.expect_kind(TokenKind::RightParen, "')'")?.span;
            let span = expr.span().merge(end);
            Ok(Expr::InList {
                expr: Box::new(expr),
                list,
                span,
            })
        }
    }

    fn parse_prefix(&mut self) -> Result<Expr, ParseError> {
        if self.check_keyword(Keyword::Not) {
            let start = self.advance().span;
            let inner = self.parse_expression(NOT_BINDING_POWER)?;
            let span = start.merge(inner.span());
            return Ok(Expr::Not {
                expr: Box::new(inner),
                span,
            });
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let span = self.current().span;
        match self.current().kind.clone() {
            TokenKind::Integer(n) => {
                self.advance();
                Ok(Expr::Literal(Literal::Integer(n), span))
            }
            TokenKind::Float(f) => {
                self.advance();
                Ok(Expr::Literal(Literal::Float(f), span))
            }
            TokenKind::String(s) => {
                self.advance();
                Ok(Expr::Literal(Literal::String(s), span))
            }
            TokenKind::Keyword(Keyword::Null) => {
                self.advance();
                Ok(Expr::Literal(Literal::Null, span))
            }
            TokenKind::Keyword(Keyword::True) => {
                self.advance();
                Ok(Expr::Literal(Literal::Boolean(true), span))
            }
            TokenKind::Keyword(Keyword::False) => {
                self.advance();
                Ok(Expr::Literal(Literal::Boolean(false), span))
            }
            TokenKind::Identifier(name) => {
                self.advance();
                Ok(Expr::Column(name, span))
            }
            TokenKind::LeftParen => {
                self.advance();
                let inner = self.parse_expression(0)?;
                let end = self.expect_kind(TokenKind::RightParen, "')'")?.span;
                Ok(Expr::Paren(Box::new(inner), span.merge(end)))
            }
            kind => Err(ParseError::unexpected(
                "a literal, column reference or '('",
                &kind,
                span,
            )),
        }
    }
}

fn is_statement_start(token: &Token) -> bool {
    matches!(
        token.as_keyword(),
        Some(
            Keyword::Select
                | Keyword::Insert
                | Keyword::Update
                | Keyword::Delete
                | Keyword::Create
                | Keyword::Drop
                | Keyword::Alter
        )
    )
}

/// Parses a `;`-separated batch of statements, recovering from errors one
/// statement at a time. Returns every statement that parsed cleanly and
/// every distinct error encountered.
#[must_use]
pub fn parse_statements(input: &str) -> (Vec<Statement>, Vec<ParseError>) {
    Parser::new(input).parse_program()
}
