//! Lexer for the source language.
//!
//! The lexer converts source text into a stream of tokens ending in a
//! single `Eof` sentinel. It never fails as a whole: offending input
//! produces a [`LexError`], the character is skipped, and scanning
//! continues.

use crate::token::{LiteralValue, Token, TokenKind};
use crate::utils::errors::{LexError, LexErrorKind};
use crate::utils::location::{SourceMap, Span};
use std::iter::Peekable;
use std::str::Chars;

/// A lexer for tokenizing source code.
pub struct Lexer<'a> {
    /// The source text
    source: &'a str,
    /// Character iterator
    chars: Peekable<Chars<'a>>,
    /// Current byte offset
    offset: usize,
    /// Byte offset where the current token started
    token_start: usize,
    /// Line-start index over the buffer; every span location is
    /// derived through it
    source_map: SourceMap,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given source.
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.chars().peekable(),
            offset: 0,
            token_start: 0,
            source_map: SourceMap::new(source),
        }
    }

    /// The source map built for this buffer. The host can reuse it to
    /// show source lines next to diagnostics.
    pub fn source_map(&self) -> &SourceMap {
        &self.source_map
    }

    /// Mark the start of a new token.
    fn mark_token_start(&mut self) {
        self.token_start = self.offset;
    }

    /// Create a span between two byte offsets.
    fn span_between(&self, start: usize, end: usize) -> Span {
        Span::from_locations(self.source_map.location(start), self.source_map.location(end))
    }

    /// Create a span from token start to the current offset.
    fn make_span(&self) -> Span {
        self.span_between(self.token_start, self.offset)
    }

    /// Peek at the current character without consuming it.
    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    /// Peek at the next character (one ahead).
    fn peek_next(&self) -> Option<char> {
        let mut chars = self.source[self.offset..].chars();
        chars.next();
        chars.next()
    }

    /// Consume and return the current character.
    fn advance(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        self.offset += c.len_utf8();
        Some(c)
    }

    /// Consume the current character if it matches.
    fn match_char(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Skip whitespace and `//` line comments.
    fn skip_whitespace(&mut self) {
        loop {
            match self.peek() {
                Some(' ') | Some('\t') | Some('\r') | Some('\n') => {
                    self.advance();
                }
                Some('/') if self.peek_next() == Some('/') => {
                    while self.peek().is_some() && self.peek() != Some('\n') {
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    /// Create a token with the given kind.
    fn make_token(&self, kind: TokenKind) -> Token {
        let span = self.make_span();
        let lexeme = self.source_map.span_text(&span).to_string();
        Token::new(kind, span, lexeme)
    }

    /// Create an error covering the current token.
    fn make_error(&self, message: impl Into<String>, kind: LexErrorKind) -> LexError {
        LexError {
            message: message.into(),
            span: self.make_span(),
            kind,
        }
    }

    /// Scan a number literal: digits, optionally `.` and more digits.
    /// The dot is only taken when a digit follows, so `1.` lexes as a
    /// number and a dot token.
    fn scan_number(&mut self) -> Result<Token, LexError> {
        while self.peek().map(|c| c.is_ascii_digit()).unwrap_or(false) {
            self.advance();
        }

        if self.peek() == Some('.') && self.peek_next().map(|c| c.is_ascii_digit()).unwrap_or(false) {
            self.advance(); // consume '.'
            while self.peek().map(|c| c.is_ascii_digit()).unwrap_or(false) {
                self.advance();
            }
        }

        let span = self.make_span();
        let lexeme = self.source_map.span_text(&span);
        match lexeme.parse::<f64>() {
            Ok(value) => Ok(Token::with_literal(
                TokenKind::Number,
                span,
                lexeme.to_string(),
                LiteralValue::Number(value),
            )),
            Err(_) => Err(self.make_error(
                format!("malformed number literal '{}'", lexeme),
                LexErrorKind::MalformedNumber,
            )),
        }
    }

    /// Scan an identifier or keyword: `[A-Za-z_][A-Za-z0-9_]*`.
    fn scan_identifier(&mut self) -> Token {
        while self
            .peek()
            .map(|c| c.is_ascii_alphanumeric() || c == '_')
            .unwrap_or(false)
        {
            self.advance();
        }

        let span = self.make_span();
        let lexeme = self.source_map.span_text(&span);
        let kind = TokenKind::keyword(lexeme).unwrap_or(TokenKind::Identifier);
        Token::new(kind, span, lexeme.to_string())
    }

    /// Scan a string literal. The opening quote is already consumed; the
    /// literal must close on the same line, and `\"` is the sole escape.
    fn scan_string(&mut self) -> Result<Token, LexError> {
        let mut value = String::new();

        loop {
            match self.peek() {
                Some('"') => {
                    self.advance();
                    let span = self.make_span();
                    let lexeme = self.source_map.span_text(&span).to_string();
                    return Ok(Token::with_literal(
                        TokenKind::String,
                        span,
                        lexeme,
                        LiteralValue::Str(value),
                    ));
                }
                Some('\\') if self.peek_next() == Some('"') => {
                    self.advance();
                    self.advance();
                    value.push('"');
                }
                Some('\n') | None => {
                    // Report at the opening quote; the newline stays in
                    // the input for normal whitespace handling.
                    return Err(LexError {
                        message: "unterminated string literal".to_string(),
                        span: self.span_between(self.token_start, self.token_start + 1),
                        kind: LexErrorKind::UnterminatedString,
                    });
                }
                Some(_) => {
                    if let Some(c) = self.advance() {
                        value.push(c);
                    }
                }
            }
        }
    }

    /// Scan the next token.
    pub fn next_token(&mut self) -> Result<Token, LexError> {
        self.skip_whitespace();
        self.mark_token_start();

        let c = match self.advance() {
            Some(c) => c,
            None => return Ok(self.make_token(TokenKind::Eof)),
        };

        match c {
            // Punctuation
            '(' => Ok(self.make_token(TokenKind::LeftParen)),
            ')' => Ok(self.make_token(TokenKind::RightParen)),
            '{' => Ok(self.make_token(TokenKind::LeftBrace)),
            '}' => Ok(self.make_token(TokenKind::RightBrace)),
            '[' => Ok(self.make_token(TokenKind::LeftBracket)),
            ']' => Ok(self.make_token(TokenKind::RightBracket)),
            ',' => Ok(self.make_token(TokenKind::Comma)),
            ';' => Ok(self.make_token(TokenKind::Semicolon)),
            '.' => Ok(self.make_token(TokenKind::Dot)),

            // Operators, longest match first
            '+' => Ok(self.make_token(TokenKind::Plus)),
            '-' => Ok(self.make_token(TokenKind::Minus)),
            '*' => Ok(self.make_token(TokenKind::Star)),
            '/' => Ok(self.make_token(TokenKind::Slash)),
            '%' => Ok(self.make_token(TokenKind::Percent)),
            '=' => {
                if self.match_char('=') {
                    Ok(self.make_token(TokenKind::EqualEqual))
                } else {
                    Ok(self.make_token(TokenKind::Equal))
                }
            }
            '!' => {
                if self.match_char('=') {
                    Ok(self.make_token(TokenKind::BangEqual))
                } else {
                    Ok(self.make_token(TokenKind::Bang))
                }
            }
            '<' => {
                if self.match_char('=') {
                    Ok(self.make_token(TokenKind::LessEqual))
                } else {
                    Ok(self.make_token(TokenKind::Less))
                }
            }
            '>' => {
                if self.match_char('=') {
                    Ok(self.make_token(TokenKind::GreaterEqual))
                } else {
                    Ok(self.make_token(TokenKind::Greater))
                }
            }
            '&' => {
                if self.match_char('&') {
                    Ok(self.make_token(TokenKind::AmpAmp))
                } else {
                    Err(self.make_error(
                        "expected '&&', found lone '&'",
                        LexErrorKind::UnknownChar,
                    ))
                }
            }
            '|' => {
                if self.match_char('|') {
                    Ok(self.make_token(TokenKind::PipePipe))
                } else {
                    Err(self.make_error(
                        "expected '||', found lone '|'",
                        LexErrorKind::UnknownChar,
                    ))
                }
            }

            // String literals
            '"' => self.scan_string(),

            // Numbers
            c if c.is_ascii_digit() => self.scan_number(),

            // Identifiers and keywords (ASCII only)
            c if c.is_ascii_alphabetic() || c == '_' => Ok(self.scan_identifier()),

            // Anything else, including non-ASCII
            _ => Err(self.make_error(
                format!("unexpected character '{}'", c),
                LexErrorKind::UnknownChar,
            )),
        }
    }

    /// Scan the whole buffer. Errors are accumulated, not raised; the
    /// token stream always ends with exactly one `Eof`.
    pub fn scan(mut self) -> (Vec<Token>, Vec<LexError>) {
        let mut tokens = Vec::new();
        let mut errors = Vec::new();
        loop {
            match self.next_token() {
                Ok(token) => {
                    let is_eof = token.is_eof();
                    tokens.push(token);
                    if is_eof {
                        break;
                    }
                }
                Err(e) => errors.push(e),
            }
        }
        (tokens, errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(source: &str) -> Vec<Token> {
        let (tokens, errors) = Lexer::new(source).scan();
        assert!(errors.is_empty(), "unexpected lex errors: {:?}", errors);
        tokens
    }

    fn token_kinds(source: &str) -> Vec<TokenKind> {
        lex(source).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_empty() {
        let tokens = lex("");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Eof);
    }

    #[test]
    fn test_whitespace_and_comments_only() {
        let tokens = lex("  \t\r\n // just a comment\n");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Eof);
    }

    #[test]
    fn test_keywords() {
        let kinds = token_kinds("let const function if else while for return true false");
        assert_eq!(kinds, vec![
            TokenKind::Let,
            TokenKind::Const,
            TokenKind::Function,
            TokenKind::If,
            TokenKind::Else,
            TokenKind::While,
            TokenKind::For,
            TokenKind::Return,
            TokenKind::True,
            TokenKind::False,
            TokenKind::Eof,
        ]);
    }

    #[test]
    fn test_identifiers() {
        let tokens = lex("foo _bar x123 letter");
        assert_eq!(tokens[0].kind, TokenKind::Identifier);
        assert_eq!(tokens[0].lexeme, "foo");
        assert_eq!(tokens[1].lexeme, "_bar");
        assert_eq!(tokens[2].lexeme, "x123");
        // Keyword prefix does not make an identifier a keyword.
        assert_eq!(tokens[3].kind, TokenKind::Identifier);
        assert_eq!(tokens[3].lexeme, "letter");
    }

    #[test]
    fn test_numbers() {
        let tokens = lex("123 45.67 0.5");
        assert_eq!(tokens[0].kind, TokenKind::Number);
        assert_eq!(tokens[0].number_value(), Some(123.0));
        assert_eq!(tokens[1].lexeme, "45.67");
        assert_eq!(tokens[1].number_value(), Some(45.67));
        assert_eq!(tokens[2].number_value(), Some(0.5));
    }

    #[test]
    fn test_number_trailing_dot() {
        // The dot is only part of the number when a digit follows.
        let kinds = token_kinds("1.");
        assert_eq!(kinds, vec![TokenKind::Number, TokenKind::Dot, TokenKind::Eof]);
    }

    #[test]
    fn test_string_literal() {
        let tokens = lex(r#""hello world""#);
        assert_eq!(tokens[0].kind, TokenKind::String);
        assert_eq!(tokens[0].string_value(), Some("hello world"));
        assert_eq!(tokens[0].lexeme, r#""hello world""#);
    }

    #[test]
    fn test_string_escape() {
        let tokens = lex(r#""say \"hi\"""#);
        assert_eq!(tokens[0].string_value(), Some(r#"say "hi""#));
    }

    #[test]
    fn test_unterminated_string() {
        let (tokens, errors) = Lexer::new("\"abc").scan();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Eof);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, LexErrorKind::UnterminatedString);
        // Reported at the opening quote.
        assert_eq!(errors[0].span.start_offset, 0);
        assert_eq!(errors[0].span.start_column, 1);
    }

    #[test]
    fn test_unterminated_string_at_newline() {
        let (tokens, errors) = Lexer::new("\"abc\nlet x;").scan();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, LexErrorKind::UnterminatedString);
        // Scanning resumes on the next line.
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(kinds, vec![
            TokenKind::Let,
            TokenKind::Identifier,
            TokenKind::Semicolon,
            TokenKind::Eof,
        ]);
    }

    #[test]
    fn test_operators_longest_match() {
        let kinds = token_kinds("== != <= >= && || = ! < >");
        assert_eq!(kinds, vec![
            TokenKind::EqualEqual,
            TokenKind::BangEqual,
            TokenKind::LessEqual,
            TokenKind::GreaterEqual,
            TokenKind::AmpAmp,
            TokenKind::PipePipe,
            TokenKind::Equal,
            TokenKind::Bang,
            TokenKind::Less,
            TokenKind::Greater,
            TokenKind::Eof,
        ]);
    }

    #[test]
    fn test_adjacent_operators() {
        // `===` is not in the language: longest match gives `==` then `=`.
        let kinds = token_kinds("===");
        assert_eq!(kinds, vec![TokenKind::EqualEqual, TokenKind::Equal, TokenKind::Eof]);
    }

    #[test]
    fn test_unknown_char_recovery() {
        let (tokens, errors) = Lexer::new("let @ x;").scan();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, LexErrorKind::UnknownChar);
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(kinds, vec![
            TokenKind::Let,
            TokenKind::Identifier,
            TokenKind::Semicolon,
            TokenKind::Eof,
        ]);
    }

    #[test]
    fn test_non_ascii_is_unknown() {
        let (tokens, errors) = Lexer::new("let ñ;").scan();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, LexErrorKind::UnknownChar);
        assert_eq!(tokens.iter().filter(|t| t.kind == TokenKind::Identifier).count(), 0);
    }

    #[test]
    fn test_lone_ampersand() {
        let (_, errors) = Lexer::new("a & b").scan();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, LexErrorKind::UnknownChar);
    }

    #[test]
    fn test_spans_project_to_source() {
        let source = "let x = 10;\nx = x + 1;";
        let tokens = lex(source);
        for token in tokens.iter().filter(|t| !t.is_eof()) {
            assert_eq!(
                &source[token.span.start_offset..token.span.end_offset],
                token.lexeme,
            );
        }
    }

    #[test]
    fn test_spans_are_ordered_and_disjoint() {
        let tokens = lex("let x = 1 + 2; // trailing\nprint(x);");
        for pair in tokens.windows(2) {
            assert!(pair[0].span.end_offset <= pair[1].span.start_offset);
        }
    }

    #[test]
    fn test_location_tracking() {
        let tokens = lex("foo\n  bar");
        assert_eq!(tokens[0].span.start_line, 1);
        assert_eq!(tokens[0].span.start_column, 1);
        assert_eq!(tokens[1].span.start_line, 2);
        assert_eq!(tokens[1].span.start_column, 3);
    }

    #[test]
    fn test_source_map_lookups() {
        let lexer = Lexer::new("let x = 1;\nprint(x);");
        let map = lexer.source_map();
        assert_eq!(map.line(1), Some("let x = 1;"));
        assert_eq!(map.line(2), Some("print(x);"));
        let loc = map.location(11); // 'p' on line 2
        assert_eq!((loc.line, loc.column), (2, 1));
    }
}
