//! Hand-written lexer.

use super::span::Position;
use super::{Keyword, Span, Token, TokenKind};

/// Converts source text into a stream of tokens.
///
/// The lexer never fails: unrecognized bytes become [`TokenKind::Unknown`]
/// tokens and scanning continues, matching the recovery-first philosophy of
/// the parser above it.
pub struct Lexer<'a> {
    input: &'a [u8],
    pos: Position,
}

impl<'a> Lexer<'a> {
    /// Creates a lexer over the given source text.
    #[must_use]
    pub const fn new(input: &'a str) -> Self {
        Self {
            input: input.as_bytes(),
            pos: Position::start(),
        }
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos.offset).copied()
    }

    fn peek_at(&self, ahead: usize) -> Option<u8> {
        self.input.get(self.pos.offset + ahead).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos.offset += 1;
        if b == b'\n' {
            self.pos.line += 1;
            self.pos.column = 1;
        } else {
            self.pos.column += 1;
        }
        Some(b)
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.peek() {
                Some(b) if b.is_ascii_whitespace() => {
                    self.advance();
                }
                Some(b'-') if self.peek_at(1) == Some(b'-') => {
                    while let Some(b) = self.peek() {
                        if b == b'\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    fn slice(&self, start: usize, end: usize) -> String {
        String::from_utf8_lossy(&self.input[start..end]).into_owned()
    }

    fn scan_identifier(&mut self, start: Position) -> Token {
        while matches!(self.peek(), Some(b) if b.is_ascii_alphanumeric() || b == b'_') {
            self.advance();
        }
        let lexeme = self.slice(start.offset, self.pos.offset);
        let span = Span::new(start, self.pos);
        let kind = Keyword::from_str(&lexeme)
            .map_or_else(|| TokenKind::Identifier(lexeme.clone()), TokenKind::Keyword);
        Token::new(kind, lexeme, span)
    }

    fn scan_number(&mut self, start: Position) -> Token {
        while matches!(self.peek(), Some(b) if b.is_ascii_digit()) {
            self.advance();
        }
        let mut is_float = false;
        if self.peek() == Some(b'.') && matches!(self.peek_at(1), Some(b) if b.is_ascii_digit()) {
            is_float = true;
            self.advance();
            while matches!(self.peek(), Some(b) if b.is_ascii_digit()) {
                self.advance();
            }
        }
        let lexeme = self.slice(start.offset, self.pos.offset);
        let span = Span::new(start, self.pos);
        let kind = if is_float {
            lexeme
                .parse::<f64>()
                .map_or_else(|_| TokenKind::Unknown(lexeme.clone()), TokenKind::Float)
        } else {
            lexeme
                .parse::<i64>()
                .map_or_else(|_| TokenKind::Unknown(lexeme.clone()), TokenKind::Integer)
        };
        Token::new(kind, lexeme, span)
    }

    fn scan_string(&mut self, start: Position) -> Token {
        // Opening quote already consumed by the caller.
        let mut value = String::new();
        loop {
            match self.peek() {
                None => {
                    let lexeme = self.slice(start.offset, self.pos.offset);
                    let span = Span::new(start, self.pos);
                    return Token::new(TokenKind::Unknown(lexeme.clone()), lexeme, span);
                }
                Some(b'\'') => {
                    self.advance();
                    if self.peek() == Some(b'\'') {
                        value.push('\'');
                        self.advance();
                    } else {
                        break;
                    }
                }
                Some(_) => {
                    let byte_start = self.pos.offset;
                    self.advance();
                    value.push_str(&self.slice(byte_start, self.pos.offset));
                }
            }
        }
        let lexeme = self.slice(start.offset, self.pos.offset);
        let span = Span::new(start, self.pos);
        Token::new(TokenKind::String(value), lexeme, span)
    }

    fn single(&mut self, kind: TokenKind, start: Position) -> Token {
        self.advance();
        let lexeme = self.slice(start.offset, self.pos.offset);
        let span = Span::new(start, self.pos);
        Token::new(kind, lexeme, span)
    }

    /// Scans and returns the next token, advancing the cursor past it.
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace_and_comments();
        let start = self.pos;

        let Some(b) = self.peek() else {
            return Token::new(TokenKind::Eof, String::new(), Span::new(start, start));
        };

        match b {
            b'0'..=b'9' => self.scan_number(start),
            b'\'' => {
                self.advance();
                self.scan_string(start)
            }
            b'A'..=b'Z' | b'a'..=b'z' | b'_' => self.scan_identifier(start),
            b'(' => self.single(TokenKind::LeftParen, start),
            b')' => self.single(TokenKind::RightParen, start),
            b'[' => self.single(TokenKind::LeftBracket, start),
            b']' => self.single(TokenKind::RightBracket, start),
            b',' => self.single(TokenKind::Comma, start),
            b';' => self.single(TokenKind::Semicolon, start),
            b'*' => self.single(TokenKind::Asterisk, start),
            b'=' => self.single(TokenKind::Eq, start),
            b'<' => {
                self.advance();
                match self.peek() {
                    Some(b'>') => {
                        self.advance();
                        let lexeme = self.slice(start.offset, self.pos.offset);
                        Token::new(TokenKind::NotEq, lexeme, Span::new(start, self.pos))
                    }
                    Some(b'=') => {
                        self.advance();
                        let lexeme = self.slice(start.offset, self.pos.offset);
                        Token::new(TokenKind::LtEq, lexeme, Span::new(start, self.pos))
                    }
                    _ => {
                        let lexeme = self.slice(start.offset, self.pos.offset);
                        Token::new(TokenKind::Lt, lexeme, Span::new(start, self.pos))
                    }
                }
            }
            b'>' => {
                self.advance();
                if self.peek() == Some(b'=') {
                    self.advance();
                    let lexeme = self.slice(start.offset, self.pos.offset);
                    Token::new(TokenKind::GtEq, lexeme, Span::new(start, self.pos))
                } else {
                    let lexeme = self.slice(start.offset, self.pos.offset);
                    Token::new(TokenKind::Gt, lexeme, Span::new(start, self.pos))
                }
            }
            b'!' => {
                self.advance();
                if self.peek() == Some(b'=') {
                    self.advance();
                    let lexeme = self.slice(start.offset, self.pos.offset);
                    Token::new(TokenKind::NotEq, lexeme, Span::new(start, self.pos))
                } else {
                    let lexeme = self.slice(start.offset, self.pos.offset);
                    Token::new(
                        TokenKind::Unknown(lexeme.clone()),
                        lexeme,
                        Span::new(start, self.pos),
                    )
                }
            }
            _ => {
                self.advance();
                let lexeme = self.slice(start.offset, self.pos.offset);
                Token::new(
                    TokenKind::Unknown(lexeme.clone()),
                    lexeme,
                    Span::new(start, self.pos),
                )
            }
        }
    }

    /// Tokenizes the entire input, ending with a single `Eof` token.
    #[must_use]
    pub fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let tok = self.next_token();
            let is_eof = tok.is_eof();
            tokens.push(tok);
            if is_eof {
                break;
            }
        }
        tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Lexer::new(src)
            .tokenize()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_select_statement() {
        let kinds = kinds("SELECT * FROM users");
        assert_eq!(
            kinds,
            vec![
                TokenKind::Keyword(Keyword::Select),
                TokenKind::Asterisk,
                TokenKind::Keyword(Keyword::From),
                TokenKind::Identifier("users".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_keywords_case_insensitive() {
        let kinds = kinds("select Id from Users where Age > 1");
        assert!(matches!(kinds[0], TokenKind::Keyword(Keyword::Select)));
        assert!(matches!(kinds[2], TokenKind::Keyword(Keyword::From)));
        assert!(matches!(kinds[4], TokenKind::Keyword(Keyword::Where)));
    }

    #[test]
    fn test_string_literal_with_escaped_quote() {
        let kinds = kinds("'it''s here'");
        assert_eq!(
            kinds,
            vec![TokenKind::String("it's here".to_string()), TokenKind::Eof]
        );
    }

    #[test]
    fn test_unterminated_string_is_unknown() {
        let kinds = kinds("'abc");
        assert!(matches!(kinds[0], TokenKind::Unknown(_)));
    }

    #[test]
    fn test_integer_and_float_literals() {
        let kinds = kinds("42 3.14");
        assert_eq!(
            kinds,
            vec![
                TokenKind::Integer(42),
                TokenKind::Float(3.14),
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_comparison_operators() {
        let kinds = kinds("= <> != < > <= >=");
        assert_eq!(
            kinds,
            vec![
                TokenKind::Eq,
                TokenKind::NotEq,
                TokenKind::NotEq,
                TokenKind::Lt,
                TokenKind::Gt,
                TokenKind::LtEq,
                TokenKind::GtEq,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_line_comment_skipped() {
        let kinds = kinds("SELECT 1 -- trailing comment\nFROM t");
        assert_eq!(
            kinds,
            vec![
                TokenKind::Keyword(Keyword::Select),
                TokenKind::Integer(1),
                TokenKind::Keyword(Keyword::From),
                TokenKind::Identifier("t".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_unknown_byte_does_not_stop_lexing() {
        let kinds = kinds("SELECT # FROM t");
        assert!(matches!(kinds[1], TokenKind::Unknown(ref s) if s == "#"));
        assert!(matches!(kinds[2], TokenKind::Keyword(Keyword::From)));
    }

    #[test]
    fn test_line_and_column_tracking() {
        let tokens = Lexer::new("SELECT\n  x").tokenize();
        let ident = &tokens[1];
        assert_eq!(ident.span.start.line, 2);
        assert_eq!(ident.span.start.column, 3);
    }
}
