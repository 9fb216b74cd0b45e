//! # minijs-front
//!
//! Front-end analyzer for a small JavaScript-flavored language:
//! a lexer, a recursive descent parser, and a semantic analyzer with
//! nested scopes and type inference. No code is executed or emitted;
//! the crate is a pure function from source text to an analysis
//! report.
//!
//! ## Architecture
//!
//! ```text
//! source → Lexer → tokens → Parser → AST → SemanticAnalyzer → Report
//! ```
//!
//! Every stage accumulates diagnostics instead of failing: the report
//! always carries the tokens, a best-effort AST, the scope tree, and
//! all errors and warnings ordered by source position.
//!
//! ## Example
//!
//! ```rust
//! use minijs_front::analyze;
//!
//! let report = analyze("let x = 10; print(x);");
//! assert!(report.errors.is_empty());
//! assert!(report.ast.is_some());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod semantic;
pub mod symtab;
pub mod token;
pub mod utils;

// Re-export commonly used types
pub mod prelude {
    //! Convenient re-exports of commonly used types.

    pub use crate::ast::*;
    pub use crate::semantic::{Analysis, SemanticAnalyzer};
    pub use crate::symtab::{
        Arity, Scope, ScopeId, ScopeKind, Symbol, SymbolKind, SymbolTable, Type,
    };
    pub use crate::token::{LiteralValue, Token, TokenKind};
    pub use crate::utils::errors::*;
    pub use crate::utils::location::{SourceLocation, SourceMap, Span};
    pub use crate::{analyze, parse, tokenize, Report};
}

use crate::ast::Program;
use crate::token::Token;
use crate::utils::errors::{Diagnostic, LexError, SyntaxError, Warning};
use serde::{Deserialize, Serialize};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Run only the lexer.
pub fn tokenize(source: &str) -> (Vec<Token>, Vec<LexError>) {
    lexer::Lexer::new(source).scan()
}

/// Run only the parser over an already-lexed token sequence.
pub fn parse(tokens: Vec<Token>) -> (Program, Vec<SyntaxError>) {
    parser::parse(tokens)
}

/// The aggregate result of analyzing one source buffer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// The full token sequence, ending in `Eof`
    pub tokens: Vec<Token>,
    /// The AST; absent only when lexing produced nothing usable
    pub ast: Option<Program>,
    /// The scope tree; present whenever the AST is
    pub scopes: Option<symtab::SymbolTable>,
    /// Errors from all stages, ordered by position then stage
    pub errors: Vec<Diagnostic>,
    /// Warnings (always semantic), ordered by position
    pub warnings: Vec<Warning>,
}

impl Report {
    /// Whether the analysis found no errors. Warnings do not count.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Run the whole pipeline: lex, parse, and analyze.
///
/// Later stages run as long as the earlier ones produced something
/// structurally usable; diagnostics from every stage that ran are
/// merged into one position-ordered list. An empty (or comment-only)
/// buffer is perfectly usable and analyzes to an empty program; a
/// buffer that lexed to nothing but errors is not, and yields a report
/// with no AST.
pub fn analyze(source: &str) -> Report {
    let (tokens, lex_errors) = tokenize(source);

    let only_eof = tokens.len() == 1;
    let mut errors: Vec<Diagnostic> = lex_errors.into_iter().map(Diagnostic::from).collect();
    let mut warnings = Vec::new();

    let (ast, scopes) = if only_eof && !errors.is_empty() {
        (None, None)
    } else {
        let (program, syntax_errors) = parser::parse(tokens.clone());
        errors.extend(syntax_errors.into_iter().map(Diagnostic::from));

        let semantic::Analysis {
            symbols,
            errors: semantic_errors,
            warnings: semantic_warnings,
        } = semantic::analyze(&program);
        errors.extend(semantic_errors.into_iter().map(Diagnostic::from));
        warnings = semantic_warnings;

        (Some(program), Some(symbols))
    };

    // Position first; the stage order Lex < Syntax < Semantic breaks
    // ties at the same offset. Both sorts are stable.
    errors.sort_by_key(|d| (d.span().start_offset, d.stage()));
    warnings.sort_by_key(|w| w.span.start_offset);

    Report {
        tokens,
        ast,
        scopes,
        errors,
        warnings,
    }
}
