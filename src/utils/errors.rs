//! Diagnostic types for the analysis pipeline.
//!
//! Each stage reports through its own error struct; [`Diagnostic`]
//! aggregates them for the final report. No error ever aborts the
//! pipeline: stages accumulate these values and keep going.

use crate::token::TokenKind;
use crate::utils::location::Span;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// The pipeline stage a diagnostic originates from.
///
/// Ordered `Lex < Syntax < Semantic`; the report uses this order to
/// break ties between diagnostics at the same source position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Stage {
    /// Lexical analysis
    Lex,
    /// Syntactic analysis
    Syntax,
    /// Semantic analysis
    Semantic,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Lex => write!(f, "lexical"),
            Stage::Syntax => write!(f, "syntax"),
            Stage::Semantic => write!(f, "semantic"),
        }
    }
}

/// Error during lexical analysis.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LexError {
    /// The error message
    pub message: String,
    /// Location in source
    pub span: Span,
    /// The kind of lexical error
    pub kind: LexErrorKind,
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.message, self.span)
    }
}

/// The kind of a lexical error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LexErrorKind {
    /// A character outside the language's alphabet
    UnknownChar,
    /// A string literal with no closing quote on its line
    UnterminatedString,
    /// A numeric literal that does not parse
    MalformedNumber,
}

/// Error during parsing.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntaxError {
    /// The error message
    pub message: String,
    /// Location in source
    pub span: Span,
    /// The kind of syntax error
    pub kind: SyntaxErrorKind,
    /// The token actually found, when one was inspected
    pub found: Option<TokenKind>,
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.message, self.span)?;
        if let Some(found) = self.found {
            write!(f, " (found: {})", found)?;
        }
        Ok(())
    }
}

/// The kind of a syntax error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SyntaxErrorKind {
    /// A specific token kind was required and something else appeared
    Expected(TokenKind),
    /// A token that no production can start with
    UnexpectedToken,
    /// Assignment to something that is not an lvalue
    InvalidAssignmentTarget,
    /// A `const` declaration without an initializer
    MissingInitializer,
}

/// Error during semantic analysis.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticError {
    /// The error message
    pub message: String,
    /// Location in source
    pub span: Span,
    /// The kind of semantic error
    pub kind: SemanticErrorKind,
}

impl fmt::Display for SemanticError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.message, self.span)
    }
}

/// The kind of a semantic error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SemanticErrorKind {
    /// Reference to a name with no visible declaration
    UndeclaredVariable,
    /// A second declaration of a name in the same scope
    Redeclaration,
    /// Operand or assignment types that do not fit
    TypeMismatch,
    /// Assignment to a `const` or builtin binding
    AssignToConstant,
    /// Call of a non-function value
    NotCallable,
    /// Call with the wrong number of arguments
    ArgumentCountMismatch,
    /// `return` outside any function body
    ReturnOutsideFunction,
}

/// A semantic warning. Warnings never make an analysis fail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Warning {
    /// The warning message
    pub message: String,
    /// Location in source
    pub span: Span,
    /// The kind of warning
    pub kind: WarningKind,
}

impl Warning {
    /// Warnings are always produced by the semantic stage.
    pub fn stage(&self) -> Stage {
        Stage::Semantic
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.message, self.span)
    }
}

/// The kind of a warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WarningKind {
    /// A variable or constant never read
    UnusedVariable,
    /// A parameter never read
    UnusedParameter,
    /// A user function never called
    UncalledFunction,
    /// A declaration hiding an outer binding
    Shadowing,
    /// A loop or branch condition of concrete non-boolean type
    NonBooleanCondition,
    /// `==` / `!=` between differing concrete types
    EqualityAcrossTypes,
}

/// Any error from any stage of the pipeline.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Diagnostic {
    /// Error during lexing
    #[error("lexical error: {0}")]
    Lex(#[from] LexError),

    /// Error during parsing
    #[error("syntax error: {0}")]
    Syntax(#[from] SyntaxError),

    /// Error during semantic analysis
    #[error("semantic error: {0}")]
    Semantic(#[from] SemanticError),
}

impl Diagnostic {
    /// The stage that produced this diagnostic.
    pub fn stage(&self) -> Stage {
        match self {
            Diagnostic::Lex(_) => Stage::Lex,
            Diagnostic::Syntax(_) => Stage::Syntax,
            Diagnostic::Semantic(_) => Stage::Semantic,
        }
    }

    /// The source span the diagnostic points at.
    pub fn span(&self) -> Span {
        match self {
            Diagnostic::Lex(e) => e.span,
            Diagnostic::Syntax(e) => e.span,
            Diagnostic::Semantic(e) => e.span,
        }
    }

    /// The human-readable message.
    pub fn message(&self) -> &str {
        match self {
            Diagnostic::Lex(e) => &e.message,
            Diagnostic::Syntax(e) => &e.message,
            Diagnostic::Semantic(e) => &e.message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_ordering() {
        assert!(Stage::Lex < Stage::Syntax);
        assert!(Stage::Syntax < Stage::Semantic);
    }

    #[test]
    fn test_error_display() {
        let err = SyntaxError {
            message: "expected ';'".to_string(),
            span: Span::dummy(),
            kind: SyntaxErrorKind::Expected(TokenKind::Semicolon),
            found: Some(TokenKind::RightBrace),
        };
        let s = format!("{}", err);
        assert!(s.contains("expected ';'"));
        assert!(s.contains("found: }"));
    }

    #[test]
    fn test_diagnostic_from_stage_errors() {
        let diag: Diagnostic = LexError {
            message: "unexpected character '@'".to_string(),
            span: Span::dummy(),
            kind: LexErrorKind::UnknownChar,
        }
        .into();
        assert_eq!(diag.stage(), Stage::Lex);
        assert!(diag.message().contains('@'));
    }
}
