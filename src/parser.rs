//! Recursive descent parser for the source language.
//!
//! The parser consumes the finished token sequence and produces a
//! [`Program`] plus a list of [`SyntaxError`]s. It never fails as a
//! whole: a statement that cannot be parsed is recorded and skipped,
//! and parsing resumes at the next synchronization point (`;`, `}`, or
//! a statement-starter keyword). Recovery never advances past `Eof`.

use crate::ast::*;
use crate::token::{Token, TokenKind};
use crate::utils::errors::{SyntaxError, SyntaxErrorKind};
use crate::utils::location::Span;

/// Upper bound on expression nesting. Far above anything a real program
/// needs, but keeps degenerate inputs from exhausting the stack.
const MAX_EXPR_DEPTH: usize = 300;

/// Parse a token sequence into a program plus accumulated errors.
pub fn parse(tokens: Vec<Token>) -> (Program, Vec<SyntaxError>) {
    let mut parser = Parser::new(tokens);
    let program = parser.parse_program();
    (program, parser.into_errors())
}

/// A recursive descent parser over a token sequence.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    errors: Vec<SyntaxError>,
    expr_depth: usize,
}

impl Parser {
    /// Create a new parser. The token sequence is expected to end with
    /// `Eof`; one is appended if missing so the cursor always has a
    /// sentinel to rest on.
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map(|t| !t.is_eof()).unwrap_or(true) {
            let span = tokens.last().map(|t| t.span).unwrap_or_else(Span::dummy);
            tokens.push(Token::new(TokenKind::Eof, span, String::new()));
        }
        Self {
            tokens,
            pos: 0,
            errors: Vec::new(),
            expr_depth: 0,
        }
    }

    /// The errors accumulated during parsing.
    pub fn into_errors(self) -> Vec<SyntaxError> {
        self.errors
    }

    /// Parse a complete program. Always returns a `Program` root;
    /// statements that failed to parse are omitted.
    pub fn parse_program(&mut self) -> Program {
        let start = self.current().span;

        let mut statements = Vec::new();
        while !self.is_at_end() {
            if self.check(TokenKind::RightBrace) {
                // A stray closing brace at top level; skip it so the
                // rest of the buffer still gets parsed.
                let err = self.unexpected("unexpected '}'");
                self.errors.push(err);
                self.advance();
                continue;
            }
            match self.parse_stmt() {
                Ok(Some(stmt)) => statements.push(stmt),
                Ok(None) => {}
                Err(e) => {
                    self.errors.push(e);
                    self.synchronize();
                }
            }
        }

        let span = if self.pos > 0 {
            start.merge(&self.previous().span)
        } else {
            start
        };
        Program { statements, span }
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    /// Parse one statement. Returns `Ok(None)` for a bare `;`.
    fn parse_stmt(&mut self) -> Result<Option<Stmt>, SyntaxError> {
        match self.current().kind {
            TokenKind::Let | TokenKind::Const => Ok(Some(self.parse_var_decl()?)),
            TokenKind::Function => Ok(Some(self.parse_fun_decl()?)),
            TokenKind::If => Ok(Some(self.parse_if_stmt()?)),
            TokenKind::While => Ok(Some(self.parse_while_stmt()?)),
            TokenKind::For => Ok(Some(self.parse_for_stmt()?)),
            TokenKind::Return => Ok(Some(self.parse_return_stmt()?)),
            TokenKind::LeftBrace => {
                let block = self.parse_block()?;
                let span = block.span;
                Ok(Some(Stmt { kind: StmtKind::Block(block), span }))
            }
            TokenKind::Semicolon => {
                self.advance();
                Ok(None)
            }
            _ => Ok(Some(self.parse_expr_stmt()?)),
        }
    }

    /// Parse a statement in a position that requires one (loop and
    /// branch bodies). A bare `;` becomes an empty block.
    fn parse_stmt_required(&mut self) -> Result<Stmt, SyntaxError> {
        let span = self.current().span;
        match self.parse_stmt()? {
            Some(stmt) => Ok(stmt),
            None => Ok(Stmt {
                kind: StmtKind::Block(Block { statements: Vec::new(), span }),
                span,
            }),
        }
    }

    /// `VarDecl → (let|const) Id (= Expr)? ;`
    fn parse_var_decl(&mut self) -> Result<Stmt, SyntaxError> {
        let stmt = self.parse_var_decl_body()?;
        let semi = self.consume(TokenKind::Semicolon, "expected ';' after declaration")?;
        Ok(Stmt {
            span: stmt.span.merge(&semi.span),
            ..stmt
        })
    }

    /// The declaration without its terminating semicolon, shared with
    /// the `for` init clause.
    fn parse_var_decl_body(&mut self) -> Result<Stmt, SyntaxError> {
        let kind_token = self.advance();
        let kind = match kind_token.kind {
            TokenKind::Const => DeclKind::Const,
            _ => DeclKind::Let,
        };

        let name_token = self.consume(TokenKind::Identifier, "expected variable name")?;
        let name = name_token.lexeme.clone();
        let name_span = name_token.span;

        let init = if self.match_kind(TokenKind::Equal) {
            Some(self.parse_expr()?)
        } else {
            None
        };

        let span = kind_token
            .span
            .merge(&init.as_ref().map(|e| e.span).unwrap_or(name_span));

        if kind == DeclKind::Const && init.is_none() {
            self.errors.push(SyntaxError {
                message: format!("constant '{}' must be initialized", name),
                span,
                kind: SyntaxErrorKind::MissingInitializer,
                found: None,
            });
        }

        Ok(Stmt {
            kind: StmtKind::VarDecl { kind, name, name_span, init },
            span,
        })
    }

    /// `FunDecl → function Id ( ParamList? ) Block`
    fn parse_fun_decl(&mut self) -> Result<Stmt, SyntaxError> {
        let start = self.advance().span; // `function`

        let name_token = self.consume(TokenKind::Identifier, "expected function name")?;
        let name = name_token.lexeme.clone();
        let name_span = name_token.span;

        self.consume(TokenKind::LeftParen, "expected '(' after function name")?;
        let params = self.parse_params()?;
        self.consume(TokenKind::RightParen, "expected ')' after parameters")?;

        let body = self.parse_block()?;
        let span = start.merge(&body.span);

        Ok(Stmt {
            kind: StmtKind::FunDecl { name, name_span, params, body },
            span,
        })
    }

    /// `ParamList → Id (, Id)*`
    fn parse_params(&mut self) -> Result<Vec<Param>, SyntaxError> {
        let mut params = Vec::new();

        if self.check(TokenKind::Identifier) {
            loop {
                let token = self.consume(TokenKind::Identifier, "expected parameter name")?;
                params.push(Param { name: token.lexeme.clone(), span: token.span });
                if !self.match_kind(TokenKind::Comma) {
                    break;
                }
            }
        }

        Ok(params)
    }

    /// `IfStmt → if ( Expr ) Stmt (else Stmt)?`
    ///
    /// `else` binds to the nearest preceding open `if`.
    fn parse_if_stmt(&mut self) -> Result<Stmt, SyntaxError> {
        let start = self.advance().span; // `if`

        self.consume(TokenKind::LeftParen, "expected '(' after 'if'")?;
        let cond = self.parse_expr()?;
        self.consume(TokenKind::RightParen, "expected ')' after condition")?;

        let then_branch = Box::new(self.parse_stmt_required()?);

        let else_branch = if self.match_kind(TokenKind::Else) {
            Some(Box::new(self.parse_stmt_required()?))
        } else {
            None
        };

        let end = else_branch
            .as_ref()
            .map(|s| s.span)
            .unwrap_or(then_branch.span);
        Ok(Stmt {
            kind: StmtKind::If { cond, then_branch, else_branch },
            span: start.merge(&end),
        })
    }

    /// `WhileStmt → while ( Expr ) Stmt`
    fn parse_while_stmt(&mut self) -> Result<Stmt, SyntaxError> {
        let start = self.advance().span; // `while`

        self.consume(TokenKind::LeftParen, "expected '(' after 'while'")?;
        let cond = self.parse_expr()?;
        self.consume(TokenKind::RightParen, "expected ')' after condition")?;

        let body = Box::new(self.parse_stmt_required()?);
        let span = start.merge(&body.span);

        Ok(Stmt { kind: StmtKind::While { cond, body }, span })
    }

    /// `ForStmt → for ( ForInit? ; Expr? ; Expr? ) Stmt`
    fn parse_for_stmt(&mut self) -> Result<Stmt, SyntaxError> {
        let start = self.advance().span; // `for`

        self.consume(TokenKind::LeftParen, "expected '(' after 'for'")?;

        let init = if self.match_kind(TokenKind::Semicolon) {
            None
        } else if self.check(TokenKind::Let) || self.check(TokenKind::Const) {
            let decl = self.parse_var_decl_body()?;
            self.consume(TokenKind::Semicolon, "expected ';' after loop init")?;
            Some(ForInit::Decl(Box::new(decl)))
        } else {
            let expr = self.parse_expr()?;
            self.consume(TokenKind::Semicolon, "expected ';' after loop init")?;
            Some(ForInit::Expr(expr))
        };

        let cond = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.consume(TokenKind::Semicolon, "expected ';' after loop condition")?;

        let update = if self.check(TokenKind::RightParen) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.consume(TokenKind::RightParen, "expected ')' after loop clauses")?;

        let body = Box::new(self.parse_stmt_required()?);
        let span = start.merge(&body.span);

        Ok(Stmt {
            kind: StmtKind::For { init, cond, update, body },
            span,
        })
    }

    /// `ReturnStmt → return Expr? ;`
    fn parse_return_stmt(&mut self) -> Result<Stmt, SyntaxError> {
        let start = self.advance().span; // `return`

        let value = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        let semi = self.consume(TokenKind::Semicolon, "expected ';' after return")?;

        Ok(Stmt {
            kind: StmtKind::Return { value },
            span: start.merge(&semi.span),
        })
    }

    /// `Block → { Stmt* }`
    fn parse_block(&mut self) -> Result<Block, SyntaxError> {
        let start = self.consume(TokenKind::LeftBrace, "expected '{'")?.span;

        let mut statements = Vec::new();
        while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
            match self.parse_stmt() {
                Ok(Some(stmt)) => statements.push(stmt),
                Ok(None) => {}
                Err(e) => {
                    self.errors.push(e);
                    self.synchronize();
                }
            }
        }

        let end = self.consume(TokenKind::RightBrace, "expected '}' after block")?;
        Ok(Block {
            statements,
            span: start.merge(&end.span),
        })
    }

    /// `ExprStmt → Expr ;`
    fn parse_expr_stmt(&mut self) -> Result<Stmt, SyntaxError> {
        let expr = self.parse_expr()?;
        let semi = self.consume(TokenKind::Semicolon, "expected ';' after expression")?;
        let span = expr.span.merge(&semi.span);
        Ok(Stmt { kind: StmtKind::Expr { expr }, span })
    }

    // ------------------------------------------------------------------
    // Expressions (precedence climbing)
    // ------------------------------------------------------------------

    /// `Expr → Assignment`, with a depth guard so pathological nesting
    /// reports an error instead of overflowing the stack.
    fn parse_expr(&mut self) -> Result<Expr, SyntaxError> {
        if self.expr_depth >= MAX_EXPR_DEPTH {
            return Err(self.unexpected("expression nesting too deep"));
        }
        self.expr_depth += 1;
        let result = self.parse_assign();
        self.expr_depth -= 1;
        result
    }

    /// `Assignment → LogicalOr (= Assignment)?`, right-associative.
    ///
    /// A non-lvalue target is recorded as an error but the assignment
    /// node is still produced with the offending left side intact.
    fn parse_assign(&mut self) -> Result<Expr, SyntaxError> {
        let left = self.parse_or()?;

        if self.match_kind(TokenKind::Equal) {
            let value = self.parse_expr()?;
            if !left.is_lvalue() {
                self.errors.push(SyntaxError {
                    message: "invalid assignment target".to_string(),
                    span: left.span,
                    kind: SyntaxErrorKind::InvalidAssignmentTarget,
                    found: None,
                });
            }
            let span = left.span.merge(&value.span);
            return Ok(Expr::new(
                ExprKind::Assign {
                    target: Box::new(left),
                    value: Box::new(value),
                },
                span,
            ));
        }

        Ok(left)
    }

    /// `LogicalOr → LogicalAnd (|| LogicalAnd)*`
    fn parse_or(&mut self) -> Result<Expr, SyntaxError> {
        let mut left = self.parse_and()?;
        while self.match_kind(TokenKind::PipePipe) {
            let right = self.parse_and()?;
            left = Self::binary(BinaryOp::Or, left, right);
        }
        Ok(left)
    }

    /// `LogicalAnd → Equality (&& Equality)*`
    fn parse_and(&mut self) -> Result<Expr, SyntaxError> {
        let mut left = self.parse_equality()?;
        while self.match_kind(TokenKind::AmpAmp) {
            let right = self.parse_equality()?;
            left = Self::binary(BinaryOp::And, left, right);
        }
        Ok(left)
    }

    /// `Equality → Relational ((==|!=) Relational)*`
    fn parse_equality(&mut self) -> Result<Expr, SyntaxError> {
        let mut left = self.parse_relational()?;
        loop {
            let op = match self.current().kind {
                TokenKind::EqualEqual => BinaryOp::Eq,
                TokenKind::BangEqual => BinaryOp::Ne,
                _ => break,
            };
            self.advance();
            let right = self.parse_relational()?;
            left = Self::binary(op, left, right);
        }
        Ok(left)
    }

    /// `Relational → Additive ((<|<=|>|>=) Additive)*`
    fn parse_relational(&mut self) -> Result<Expr, SyntaxError> {
        let mut left = self.parse_additive()?;
        loop {
            let op = match self.current().kind {
                TokenKind::Less => BinaryOp::Lt,
                TokenKind::LessEqual => BinaryOp::Le,
                TokenKind::Greater => BinaryOp::Gt,
                TokenKind::GreaterEqual => BinaryOp::Ge,
                _ => break,
            };
            self.advance();
            let right = self.parse_additive()?;
            left = Self::binary(op, left, right);
        }
        Ok(left)
    }

    /// `Additive → Multiplicative ((+|-) Multiplicative)*`
    fn parse_additive(&mut self) -> Result<Expr, SyntaxError> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.current().kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = Self::binary(op, left, right);
        }
        Ok(left)
    }

    /// `Multiplicative → Unary ((*|/|%) Unary)*`
    fn parse_multiplicative(&mut self) -> Result<Expr, SyntaxError> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.current().kind {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Percent => BinaryOp::Mod,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            left = Self::binary(op, left, right);
        }
        Ok(left)
    }

    /// `Unary → (!|-|+) Unary | Postfix`
    ///
    /// Prefix operators are collected iteratively and applied inside
    /// out, so long chains cost no stack.
    fn parse_unary(&mut self) -> Result<Expr, SyntaxError> {
        let mut ops = Vec::new();
        loop {
            let op = match self.current().kind {
                TokenKind::Bang => UnaryOp::Not,
                TokenKind::Minus => UnaryOp::Neg,
                TokenKind::Plus => UnaryOp::Pos,
                _ => break,
            };
            let span = self.advance().span;
            ops.push((op, span));
        }

        let mut expr = self.parse_postfix()?;
        for (op, span) in ops.into_iter().rev() {
            let merged = span.merge(&expr.span);
            expr = Expr::new(ExprKind::Unary { op, operand: Box::new(expr) }, merged);
        }
        Ok(expr)
    }

    /// `Postfix → Primary ( ( ArgList? ) | [ Expr ] | . Id )*`
    fn parse_postfix(&mut self) -> Result<Expr, SyntaxError> {
        let mut expr = self.parse_primary()?;

        loop {
            if self.match_kind(TokenKind::LeftParen) {
                let args = self.parse_args()?;
                let end = self.consume(TokenKind::RightParen, "expected ')' after arguments")?;
                let span = expr.span.merge(&end.span);
                expr = Expr::new(
                    ExprKind::Call { callee: Box::new(expr), args },
                    span,
                );
            } else if self.match_kind(TokenKind::LeftBracket) {
                let index = self.parse_expr()?;
                let end = self.consume(TokenKind::RightBracket, "expected ']' after index")?;
                let span = expr.span.merge(&end.span);
                expr = Expr::new(
                    ExprKind::Index {
                        object: Box::new(expr),
                        index: Box::new(index),
                    },
                    span,
                );
            } else if self.match_kind(TokenKind::Dot) {
                let name_token = self.consume(TokenKind::Identifier, "expected member name after '.'")?;
                let span = expr.span.merge(&name_token.span);
                expr = Expr::new(
                    ExprKind::Member {
                        object: Box::new(expr),
                        name: name_token.lexeme.clone(),
                    },
                    span,
                );
            } else {
                break;
            }
        }

        Ok(expr)
    }

    /// `Primary → Id | Number | String | true | false | ( Expr )`
    fn parse_primary(&mut self) -> Result<Expr, SyntaxError> {
        let token = self.current().clone();
        match token.kind {
            TokenKind::Identifier => {
                self.advance();
                Ok(Expr::new(ExprKind::Identifier(token.lexeme), token.span))
            }
            TokenKind::Number => {
                self.advance();
                let value = token.number_value().unwrap_or_default();
                Ok(Expr::new(ExprKind::Number(value), token.span))
            }
            TokenKind::String => {
                self.advance();
                let value = token.string_value().unwrap_or_default().to_string();
                Ok(Expr::new(ExprKind::Str(value), token.span))
            }
            TokenKind::True => {
                self.advance();
                Ok(Expr::new(ExprKind::Bool(true), token.span))
            }
            TokenKind::False => {
                self.advance();
                Ok(Expr::new(ExprKind::Bool(false), token.span))
            }
            TokenKind::LeftParen => {
                self.advance();
                let inner = self.parse_expr()?;
                let end = self.consume(TokenKind::RightParen, "expected ')' after expression")?;
                // The grouping leaves no node of its own; widen the span
                // to cover the parentheses.
                Ok(Expr::new(inner.kind, token.span.merge(&end.span)))
            }
            _ => Err(self.unexpected("expected an expression")),
        }
    }

    /// `ArgList → Expr (, Expr)*`
    fn parse_args(&mut self) -> Result<Vec<Expr>, SyntaxError> {
        let mut args = Vec::new();
        if !self.check(TokenKind::RightParen) {
            loop {
                args.push(self.parse_expr()?);
                if !self.match_kind(TokenKind::Comma) {
                    break;
                }
            }
        }
        Ok(args)
    }

    // ------------------------------------------------------------------
    // Cursor helpers
    // ------------------------------------------------------------------

    fn current(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.pos.saturating_sub(1)]
    }

    /// Look at the k-th upcoming token; saturates at `Eof`.
    pub fn peek(&self, k: usize) -> &Token {
        let idx = (self.pos + k).min(self.tokens.len() - 1);
        &self.tokens[idx]
    }

    fn is_at_end(&self) -> bool {
        self.current().kind == TokenKind::Eof
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current().kind == kind
    }

    /// Advance and return the token stepped over. Never moves past `Eof`.
    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    /// Consume the current token if it matches.
    fn match_kind(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Require a token of the given kind; on mismatch build the
    /// `Expected` error describing what was found instead.
    fn consume(&mut self, kind: TokenKind, message: &str) -> Result<Token, SyntaxError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            let found = self.current();
            Err(SyntaxError {
                message: message.to_string(),
                span: found.span,
                kind: SyntaxErrorKind::Expected(kind),
                found: Some(found.kind),
            })
        }
    }

    fn unexpected(&self, message: &str) -> SyntaxError {
        let found = self.current();
        SyntaxError {
            message: message.to_string(),
            span: found.span,
            kind: SyntaxErrorKind::UnexpectedToken,
            found: Some(found.kind),
        }
    }

    /// Skip tokens until a synchronization point: just past a `;`, or
    /// just before a `}` or a statement-starter keyword.
    fn synchronize(&mut self) {
        while !self.is_at_end() {
            let kind = self.current().kind;
            if kind == TokenKind::RightBrace || kind.starts_statement() {
                return;
            }
            self.advance();
            if kind == TokenKind::Semicolon {
                return;
            }
        }
    }

    fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
        let span = left.span.merge(&right.span);
        Expr::new(
            ExprKind::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            span,
        )
    }
}
