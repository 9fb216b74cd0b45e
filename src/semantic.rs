//! Semantic analysis.
//!
//! A single in-order traversal of the AST that builds the scope tree,
//! declares and resolves symbols, infers expression types, and records
//! semantic errors and warnings. A post-pass over the finished scope
//! tree reports unused and uncalled bindings.
//!
//! `Unknown` acts as an absorbing bottom: once a subexpression has
//! failed (or simply has no known type yet), operators over it stay
//! silent instead of piling follow-up errors onto one root cause.

use crate::ast::*;
use crate::symtab::{ScopeKind, Symbol, SymbolKind, SymbolTable, Type};
use crate::utils::errors::{SemanticError, SemanticErrorKind, Warning, WarningKind};
use crate::utils::location::Span;

/// The result of semantic analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    /// The populated scope tree
    pub symbols: SymbolTable,
    /// Semantic errors in traversal order
    pub errors: Vec<SemanticError>,
    /// Warnings in emission order
    pub warnings: Vec<Warning>,
}

/// Analyze a program against a fresh symbol table.
pub fn analyze(program: &Program) -> Analysis {
    let mut analyzer = SemanticAnalyzer::new();
    analyzer.analyze_program(program);
    analyzer.finish()
}

/// Semantic analyzer.
pub struct SemanticAnalyzer {
    table: SymbolTable,
    errors: Vec<SemanticError>,
    warnings: Vec<Warning>,
    /// How many function bodies the traversal is inside
    function_depth: usize,
    /// Names of the functions whose bodies are being analyzed, so a
    /// recursive call is not counted as "called from outside"
    enclosing_functions: Vec<String>,
}

impl SemanticAnalyzer {
    /// Create an analyzer with a fresh, builtin-seeded symbol table.
    pub fn new() -> Self {
        Self {
            table: SymbolTable::new(),
            errors: Vec::new(),
            warnings: Vec::new(),
            function_depth: 0,
            enclosing_functions: Vec::new(),
        }
    }

    /// Run the traversal and the usage post-pass.
    pub fn analyze_program(&mut self, program: &Program) {
        for stmt in &program.statements {
            self.visit_stmt(stmt);
        }
        self.check_unused();
    }

    /// Take the analysis results.
    pub fn finish(self) -> Analysis {
        Analysis {
            symbols: self.table,
            errors: self.errors,
            warnings: self.warnings,
        }
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    fn visit_stmt(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::VarDecl { kind, name, name_span, init } => {
                self.visit_var_decl(*kind, name, *name_span, init.as_ref(), stmt.span);
            }

            StmtKind::FunDecl { name, name_span, params, body } => {
                self.visit_fun_decl(name, *name_span, params, body, stmt.span);
            }

            StmtKind::If { cond, then_branch, else_branch } => {
                let cond_ty = self.visit_expr(cond);
                self.check_condition(&cond_ty, cond.span, "if");
                self.visit_stmt(then_branch);
                if let Some(else_branch) = else_branch {
                    self.visit_stmt(else_branch);
                }
            }

            StmtKind::While { cond, body } => {
                let cond_ty = self.visit_expr(cond);
                self.check_condition(&cond_ty, cond.span, "while");
                self.visit_stmt(body);
            }

            StmtKind::For { init, cond, update, body } => {
                // One block scope wraps the whole loop, so a `let` in
                // the init clause is invisible after the statement.
                self.table.push(ScopeKind::Block);
                match init {
                    Some(ForInit::Decl(decl)) => self.visit_stmt(decl),
                    Some(ForInit::Expr(expr)) => {
                        self.visit_expr(expr);
                    }
                    None => {}
                }
                if let Some(cond) = cond {
                    let cond_ty = self.visit_expr(cond);
                    self.check_condition(&cond_ty, cond.span, "for");
                }
                if let Some(update) = update {
                    self.visit_expr(update);
                }
                self.visit_stmt(body);
                self.table.pop();
            }

            StmtKind::Return { value } => {
                if self.function_depth == 0 {
                    self.error(
                        SemanticErrorKind::ReturnOutsideFunction,
                        "'return' outside of a function".to_string(),
                        stmt.span,
                    );
                }
                if let Some(value) = value {
                    self.visit_expr(value);
                }
            }

            StmtKind::Block(block) => {
                self.table.push(ScopeKind::Block);
                self.visit_block(block);
                self.table.pop();
            }

            StmtKind::Expr { expr } => {
                self.visit_expr(expr);
            }
        }
    }

    fn visit_block(&mut self, block: &Block) {
        for stmt in &block.statements {
            self.visit_stmt(stmt);
        }
    }

    fn visit_var_decl(
        &mut self,
        kind: DeclKind,
        name: &str,
        name_span: Span,
        init: Option<&Expr>,
        span: Span,
    ) {
        if let Some(prior_span) = self.table.resolve_local(name).map(|s| s.span) {
            self.error(
                SemanticErrorKind::Redeclaration,
                format!("'{}' is already declared at {}", name, prior_span),
                span,
            );
            return;
        }

        let shadowed = self.table.shadows(name);

        // Missing `const` initializers are the parser's to report; the
        // binding still comes into existence here with type unknown.
        let ty = match init {
            Some(expr) => self.visit_expr(expr),
            None => Type::Unknown,
        };

        let symbol_kind = match kind {
            DeclKind::Let => SymbolKind::Variable,
            DeclKind::Const => SymbolKind::Constant,
        };
        let _ = self.table.declare(Symbol::new(name, symbol_kind, ty, span));

        if shadowed.is_some() {
            self.warn(
                WarningKind::Shadowing,
                format!("'{}' shadows an outer declaration", name),
                name_span,
            );
        }
    }

    fn visit_fun_decl(
        &mut self,
        name: &str,
        name_span: Span,
        params: &[Param],
        body: &Block,
        span: Span,
    ) {
        if let Some(prior_span) = self.table.resolve_local(name).map(|s| s.span) {
            self.error(
                SemanticErrorKind::Redeclaration,
                format!("'{}' is already declared at {}", name, prior_span),
                span,
            );
            return;
        }

        let shadowed = self.table.shadows(name);

        // Declare before analyzing the body so the function is visible
        // inside itself.
        let ty = Type::function(params.len());
        let _ = self.table.declare(Symbol::new(name, SymbolKind::Function, ty, span));

        if shadowed.is_some() {
            self.warn(
                WarningKind::Shadowing,
                format!("'{}' shadows an outer declaration", name),
                name_span,
            );
        }

        self.table.push(ScopeKind::Function);
        self.function_depth += 1;
        self.enclosing_functions.push(name.to_string());

        for param in params {
            if self.table.resolve_local(&param.name).is_some() {
                self.error(
                    SemanticErrorKind::Redeclaration,
                    format!("duplicate parameter '{}' in function '{}'", param.name, name),
                    param.span,
                );
                continue;
            }
            let shadowed = self.table.shadows(&param.name);
            let _ = self.table.declare(Symbol::new(
                param.name.as_str(),
                SymbolKind::Parameter,
                Type::Unknown,
                param.span,
            ));
            if shadowed.is_some() {
                self.warn(
                    WarningKind::Shadowing,
                    format!("'{}' shadows an outer declaration", param.name),
                    param.span,
                );
            }
        }

        self.visit_block(body);

        self.enclosing_functions.pop();
        self.function_depth -= 1;
        self.table.pop();
    }

    fn check_condition(&mut self, ty: &Type, span: Span, construct: &str) {
        if ty.is_concrete() && *ty != Type::Boolean {
            self.warn(
                WarningKind::NonBooleanCondition,
                format!("'{}' condition should be boolean, found {}", construct, ty),
                span,
            );
        }
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    fn visit_expr(&mut self, expr: &Expr) -> Type {
        match &expr.kind {
            ExprKind::Number(_) => Type::Number,
            ExprKind::Str(_) => Type::String,
            ExprKind::Bool(_) => Type::Boolean,

            ExprKind::Identifier(name) => match self.table.resolve(name) {
                Some(symbol) => {
                    let ty = symbol.ty.clone();
                    self.table.mark_used(name);
                    ty
                }
                None => {
                    self.error(
                        SemanticErrorKind::UndeclaredVariable,
                        format!("'{}' is not declared", name),
                        expr.span,
                    );
                    Type::Unknown
                }
            },

            ExprKind::Assign { target, value } => self.visit_assign(target, value, expr.span),

            ExprKind::Binary { op, left, right } => self.visit_binary(*op, left, right, expr.span),

            ExprKind::Unary { op, operand } => self.visit_unary(*op, operand),

            ExprKind::Call { callee, args } => self.visit_call(callee, args, expr.span),

            ExprKind::Index { object, index } => {
                let object_ty = self.visit_expr(object);
                let index_ty = self.visit_expr(index);
                if object_ty.is_concrete() && object_ty != Type::String {
                    self.error(
                        SemanticErrorKind::TypeMismatch,
                        format!("type {} cannot be indexed", object_ty),
                        object.span,
                    );
                }
                if index_ty.is_concrete() && index_ty != Type::Number {
                    self.error(
                        SemanticErrorKind::TypeMismatch,
                        format!("index must be a number, found {}", index_ty),
                        index.span,
                    );
                }
                Type::Unknown
            }

            ExprKind::Member { object, .. } => {
                // No object model: members type as unknown.
                self.visit_expr(object);
                Type::Unknown
            }
        }
    }

    fn visit_assign(&mut self, target: &Expr, value: &Expr, span: Span) -> Type {
        match &target.kind {
            ExprKind::Identifier(name) => {
                let resolved = self
                    .table
                    .resolve(name)
                    .map(|s| (s.kind, s.ty.clone(), s.mutable));
                let value_ty = self.visit_expr(value);

                match resolved {
                    None => {
                        self.error(
                            SemanticErrorKind::UndeclaredVariable,
                            format!("'{}' is not declared", name),
                            target.span,
                        );
                    }
                    Some((kind, target_ty, mutable)) => {
                        self.table.mark_used(name);
                        if !mutable {
                            let what = match kind {
                                SymbolKind::Builtin => "builtin",
                                _ => "constant",
                            };
                            self.error(
                                SemanticErrorKind::AssignToConstant,
                                format!("cannot reassign {} '{}'", what, name),
                                span,
                            );
                        }
                        if target_ty.is_concrete()
                            && value_ty.is_concrete()
                            && target_ty != value_ty
                        {
                            self.error(
                                SemanticErrorKind::TypeMismatch,
                                format!(
                                    "cannot assign {} to '{}' of type {}",
                                    value_ty, name, target_ty
                                ),
                                span,
                            );
                        } else if target_ty.is_unknown() && value_ty.is_concrete() {
                            self.table.refine_type(name, value_ty.clone());
                        }
                    }
                }

                value_ty
            }
            // Writes through an index or member check their
            // subexpressions; there is no binding to update.
            ExprKind::Index { .. } | ExprKind::Member { .. } => {
                self.visit_expr(target);
                self.visit_expr(value)
            }
            // Non-lvalue targets were already reported by the parser.
            _ => {
                self.visit_expr(target);
                self.visit_expr(value)
            }
        }
    }

    fn visit_binary(&mut self, op: BinaryOp, left: &Expr, right: &Expr, span: Span) -> Type {
        let left_ty = self.visit_expr(left);
        let right_ty = self.visit_expr(right);

        if op.is_arithmetic() {
            // `+` doubles as concatenation whenever a string shows up.
            if op == BinaryOp::Add
                && (left_ty == Type::String || right_ty == Type::String)
            {
                return Type::String;
            }
            if left_ty.is_unknown() || right_ty.is_unknown() {
                return Type::Unknown;
            }
            if left_ty == Type::Number && right_ty == Type::Number {
                return Type::Number;
            }
            self.error(
                SemanticErrorKind::TypeMismatch,
                format!(
                    "operator '{}' requires number operands, found {} and {}",
                    op, left_ty, right_ty
                ),
                span,
            );
            return Type::Unknown;
        }

        if op.is_comparison() {
            if left_ty.is_unknown() || right_ty.is_unknown() {
                return Type::Unknown;
            }
            if left_ty == Type::Number && right_ty == Type::Number {
                return Type::Boolean;
            }
            self.error(
                SemanticErrorKind::TypeMismatch,
                format!(
                    "comparison '{}' requires number operands, found {} and {}",
                    op, left_ty, right_ty
                ),
                span,
            );
            return Type::Unknown;
        }

        if op.is_equality() {
            if left_ty.is_concrete() && right_ty.is_concrete() && left_ty != right_ty {
                self.warn(
                    WarningKind::EqualityAcrossTypes,
                    format!("'{}' compares {} with {}", op, left_ty, right_ty),
                    span,
                );
            }
            return Type::Boolean;
        }

        // Logical && and ||
        for (ty, operand) in [(&left_ty, left), (&right_ty, right)] {
            if ty.is_concrete() && *ty != Type::Boolean {
                self.error(
                    SemanticErrorKind::TypeMismatch,
                    format!("operand of '{}' must be boolean, found {}", op, ty),
                    operand.span,
                );
            }
        }
        Type::Boolean
    }

    fn visit_unary(&mut self, op: UnaryOp, operand: &Expr) -> Type {
        let operand_ty = self.visit_expr(operand);
        match op {
            UnaryOp::Not => {
                if operand_ty.is_concrete() && operand_ty != Type::Boolean {
                    self.error(
                        SemanticErrorKind::TypeMismatch,
                        format!("operand of '!' must be boolean, found {}", operand_ty),
                        operand.span,
                    );
                }
                Type::Boolean
            }
            UnaryOp::Neg | UnaryOp::Pos => {
                if operand_ty.is_unknown() {
                    return Type::Unknown;
                }
                if operand_ty == Type::Number {
                    return Type::Number;
                }
                self.error(
                    SemanticErrorKind::TypeMismatch,
                    format!("unary '{}' requires a number operand, found {}", op, operand_ty),
                    operand.span,
                );
                Type::Unknown
            }
        }
    }

    fn visit_call(&mut self, callee: &Expr, args: &[Expr], span: Span) -> Type {
        let arg_count = args.len();
        for arg in args {
            self.visit_expr(arg);
        }

        match &callee.kind {
            ExprKind::Identifier(name) => {
                let resolved = self.table.resolve(name).map(|s| s.ty.clone());
                match resolved {
                    None => {
                        self.error(
                            SemanticErrorKind::UndeclaredVariable,
                            format!("'{}' is not declared", name),
                            callee.span,
                        );
                        Type::Unknown
                    }
                    Some(ty) => {
                        self.table.mark_used(name);
                        match ty {
                            Type::Function { arity, return_type } => {
                                // A function calling itself says nothing
                                // about whether anyone else ever calls it.
                                if !self.enclosing_functions.iter().any(|f| f == name) {
                                    self.table.mark_called(name);
                                }
                                if !arity.accepts(arg_count) {
                                    self.error(
                                        SemanticErrorKind::ArgumentCountMismatch,
                                        format!(
                                            "function '{}' expects {} arguments, {} given",
                                            name, arity, arg_count
                                        ),
                                        span,
                                    );
                                }
                                *return_type
                            }
                            Type::Unknown => Type::Unknown,
                            other => {
                                self.error(
                                    SemanticErrorKind::NotCallable,
                                    format!("'{}' is not a function (type {})", name, other),
                                    callee.span,
                                );
                                Type::Unknown
                            }
                        }
                    }
                }
            }
            _ => {
                let callee_ty = self.visit_expr(callee);
                match callee_ty {
                    Type::Function { return_type, .. } => *return_type,
                    Type::Unknown => Type::Unknown,
                    other => {
                        self.error(
                            SemanticErrorKind::NotCallable,
                            format!("type {} is not callable", other),
                            callee.span,
                        );
                        Type::Unknown
                    }
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Post-pass
    // ------------------------------------------------------------------

    /// Walk every scope in creation order and flag bindings that were
    /// never used or never called.
    fn check_unused(&mut self) {
        let mut pending = Vec::new();
        for (_, scope) in self.table.scopes() {
            for symbol in scope.symbols() {
                match symbol.kind {
                    SymbolKind::Variable | SymbolKind::Constant if !symbol.used => {
                        pending.push(Warning {
                            message: format!("{} '{}' is never used", symbol.kind, symbol.name),
                            span: symbol.span,
                            kind: WarningKind::UnusedVariable,
                        });
                    }
                    SymbolKind::Parameter if !symbol.used => {
                        pending.push(Warning {
                            message: format!("parameter '{}' is never used", symbol.name),
                            span: symbol.span,
                            kind: WarningKind::UnusedParameter,
                        });
                    }
                    SymbolKind::Function if !symbol.called => {
                        pending.push(Warning {
                            message: format!("function '{}' is never called", symbol.name),
                            span: symbol.span,
                            kind: WarningKind::UncalledFunction,
                        });
                    }
                    _ => {}
                }
            }
        }
        self.warnings.extend(pending);
    }

    fn error(&mut self, kind: SemanticErrorKind, message: String, span: Span) {
        self.errors.push(SemanticError { message, span, kind });
    }

    fn warn(&mut self, kind: WarningKind, message: String, span: Span) {
        self.warnings.push(Warning { message, span, kind });
    }
}

impl Default for SemanticAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use crate::parser;

    fn analyze_source(source: &str) -> Analysis {
        let (tokens, lex_errors) = Lexer::new(source).scan();
        assert!(lex_errors.is_empty(), "unexpected lex errors: {:?}", lex_errors);
        let (program, syn_errors) = parser::parse(tokens);
        assert!(syn_errors.is_empty(), "unexpected parse errors: {:?}", syn_errors);
        analyze(&program)
    }

    fn error_kinds(analysis: &Analysis) -> Vec<SemanticErrorKind> {
        analysis.errors.iter().map(|e| e.kind).collect()
    }

    fn warning_kinds(analysis: &Analysis) -> Vec<WarningKind> {
        analysis.warnings.iter().map(|w| w.kind).collect()
    }

    #[test]
    fn test_clean_program() {
        let analysis = analyze_source("let x = 1; print(x);");
        assert!(analysis.errors.is_empty());
        assert!(analysis.warnings.is_empty());
    }

    #[test]
    fn test_undeclared_variable() {
        let analysis = analyze_source("let x = missing + 5;");
        assert_eq!(error_kinds(&analysis), vec![SemanticErrorKind::UndeclaredVariable]);
        // x is still declared, with unknown type.
        let x = analysis.symbols.scope(analysis.symbols.global()).local("x").unwrap();
        assert_eq!(x.ty, Type::Unknown);
    }

    #[test]
    fn test_unknown_suppresses_cascades() {
        // Only the root cause is reported, not the uses downstream.
        let analysis = analyze_source("let x = missing + 5; let y = x * 2; let z = y < 3;");
        assert_eq!(error_kinds(&analysis), vec![SemanticErrorKind::UndeclaredVariable]);
    }

    #[test]
    fn test_redeclaration() {
        let analysis = analyze_source("let y = 10; let y = 20;");
        assert_eq!(error_kinds(&analysis), vec![SemanticErrorKind::Redeclaration]);
        // The error points at the second declaration.
        assert_eq!(analysis.errors[0].span.start_offset, 12);
    }

    #[test]
    fn test_assign_to_constant() {
        let analysis = analyze_source("const pi = 3.14; pi = 3.1416;");
        assert_eq!(error_kinds(&analysis), vec![SemanticErrorKind::AssignToConstant]);
    }

    #[test]
    fn test_assign_to_builtin() {
        let analysis = analyze_source("print = 5;");
        let kinds = error_kinds(&analysis);
        assert!(kinds.contains(&SemanticErrorKind::AssignToConstant));
    }

    #[test]
    fn test_assignment_type_mismatch() {
        let analysis = analyze_source("let x = 1; x = \"text\";");
        assert_eq!(error_kinds(&analysis), vec![SemanticErrorKind::TypeMismatch]);
    }

    #[test]
    fn test_assignment_refines_unknown() {
        let analysis = analyze_source("let x; x = 1; let y = x + 1; print(y);");
        assert!(analysis.errors.is_empty());
        let x = analysis.symbols.scope(analysis.symbols.global()).local("x").unwrap();
        assert_eq!(x.ty, Type::Number);
    }

    #[test]
    fn test_plus_concatenates_strings() {
        let analysis = analyze_source("let s = 10 + \"text\"; print(s);");
        assert!(analysis.errors.is_empty());
        let s = analysis.symbols.scope(analysis.symbols.global()).local("s").unwrap();
        assert_eq!(s.ty, Type::String);
    }

    #[test]
    fn test_arithmetic_mismatch() {
        let analysis = analyze_source("let x = true * 2;");
        assert_eq!(error_kinds(&analysis), vec![SemanticErrorKind::TypeMismatch]);
        let x = analysis.symbols.scope(analysis.symbols.global()).local("x").unwrap();
        assert_eq!(x.ty, Type::Unknown);
    }

    #[test]
    fn test_comparison_requires_numbers() {
        let analysis = analyze_source("let b = \"a\" < 1;");
        assert_eq!(error_kinds(&analysis), vec![SemanticErrorKind::TypeMismatch]);
    }

    #[test]
    fn test_equality_across_types_warns() {
        let analysis = analyze_source("let b = 1 == \"one\"; print(b);");
        assert!(analysis.errors.is_empty());
        assert_eq!(warning_kinds(&analysis), vec![WarningKind::EqualityAcrossTypes]);
        let b = analysis.symbols.scope(analysis.symbols.global()).local("b").unwrap();
        assert_eq!(b.ty, Type::Boolean);
    }

    #[test]
    fn test_logical_operand_mismatch() {
        let analysis = analyze_source("let b = 1 && true; print(b);");
        assert_eq!(error_kinds(&analysis), vec![SemanticErrorKind::TypeMismatch]);
    }

    #[test]
    fn test_unary_rules() {
        let analysis = analyze_source("let a = !true; let b = -1; print(a); print(b);");
        assert!(analysis.errors.is_empty());

        let analysis = analyze_source("let a = -\"text\";");
        assert_eq!(error_kinds(&analysis), vec![SemanticErrorKind::TypeMismatch]);
    }

    #[test]
    fn test_return_outside_function() {
        let analysis = analyze_source("return 1;");
        assert_eq!(error_kinds(&analysis), vec![SemanticErrorKind::ReturnOutsideFunction]);
    }

    #[test]
    fn test_return_inside_function() {
        let analysis = analyze_source("function f() { return 1; } f();");
        assert!(analysis.errors.is_empty());
    }

    #[test]
    fn test_recursion_is_visible() {
        let analysis =
            analyze_source("function f(n) { if (n == 0) { return 1; } return n * f(n - 1); }");
        assert!(analysis.errors.is_empty());
        // Recursive use alone does not count as a call from outside.
        assert!(warning_kinds(&analysis).contains(&WarningKind::UncalledFunction));
    }

    #[test]
    fn test_called_function_not_flagged() {
        let analysis = analyze_source("function f() { return 1; } print(f());");
        assert!(!warning_kinds(&analysis).contains(&WarningKind::UncalledFunction));
    }

    #[test]
    fn test_not_callable() {
        let analysis = analyze_source("let x = 1; x();");
        assert_eq!(error_kinds(&analysis), vec![SemanticErrorKind::NotCallable]);
    }

    #[test]
    fn test_argument_count_mismatch() {
        let analysis = analyze_source("function f(a, b) { return a + b; } f(1);");
        assert_eq!(error_kinds(&analysis), vec![SemanticErrorKind::ArgumentCountMismatch]);
    }

    #[test]
    fn test_variadic_builtin_accepts_any_count() {
        let analysis = analyze_source("print(); print(1); print(1, 2, 3);");
        assert!(analysis.errors.is_empty());
    }

    #[test]
    fn test_builtin_arity_checked() {
        let analysis = analyze_source("let n = parseInt(\"1\", 10);");
        assert_eq!(error_kinds(&analysis), vec![SemanticErrorKind::ArgumentCountMismatch]);
    }

    #[test]
    fn test_builtin_return_types() {
        let analysis = analyze_source("let s = input(); let n = parseInt(s); print(n);");
        assert!(analysis.errors.is_empty());
        let global = analysis.symbols.global();
        assert_eq!(analysis.symbols.scope(global).local("s").unwrap().ty, Type::String);
        assert_eq!(analysis.symbols.scope(global).local("n").unwrap().ty, Type::Number);
    }

    #[test]
    fn test_unused_variable_warning() {
        let analysis = analyze_source("let x = 1;");
        assert_eq!(warning_kinds(&analysis), vec![WarningKind::UnusedVariable]);
        assert!(analysis.warnings[0].message.contains('x'));
    }

    #[test]
    fn test_unused_parameter_warning() {
        let analysis = analyze_source("function f(a, b) { return a; } f(1, 2);");
        let kinds = warning_kinds(&analysis);
        assert_eq!(kinds, vec![WarningKind::UnusedParameter]);
        assert!(analysis.warnings[0].message.contains('b'));
    }

    #[test]
    fn test_shadowing_warning() {
        let analysis = analyze_source("let x = 1; { let x = 2; print(x); } print(x);");
        assert_eq!(warning_kinds(&analysis), vec![WarningKind::Shadowing]);
    }

    #[test]
    fn test_non_boolean_condition_warning() {
        let analysis = analyze_source("if (1) { print(1); }");
        assert_eq!(warning_kinds(&analysis), vec![WarningKind::NonBooleanCondition]);
        // Unknown conditions stay silent.
        let analysis = analyze_source("let x; while (x) { x = false; }");
        assert!(!warning_kinds(&analysis).contains(&WarningKind::NonBooleanCondition));
    }

    #[test]
    fn test_block_scoping() {
        let analysis = analyze_source("{ let inner = 1; print(inner); } print(inner);");
        assert_eq!(error_kinds(&analysis), vec![SemanticErrorKind::UndeclaredVariable]);
    }

    #[test]
    fn test_for_init_scoped_to_loop() {
        let analysis = analyze_source("for (let i = 0; i < 3; i = i + 1) { print(i); } print(i);");
        assert_eq!(error_kinds(&analysis), vec![SemanticErrorKind::UndeclaredVariable]);
    }

    #[test]
    fn test_index_and_member() {
        let analysis = analyze_source("let s = \"abc\"; let c = s[0]; print(c, s.length);");
        assert!(analysis.errors.is_empty());

        let analysis = analyze_source("let n = 5; let c = n[0];");
        assert!(error_kinds(&analysis).contains(&SemanticErrorKind::TypeMismatch));
    }

    #[test]
    fn test_scope_tree_shape() {
        let analysis = analyze_source("function f() { { let x = 1; print(x); } } f();");
        let table = &analysis.symbols;
        let global = table.scope(table.global());
        assert_eq!(global.kind, ScopeKind::Global);
        assert_eq!(global.children.len(), 1);

        let fn_scope = table.scope(global.children[0]);
        assert_eq!(fn_scope.kind, ScopeKind::Function);
        assert_eq!(fn_scope.children.len(), 1);

        let block = table.scope(fn_scope.children[0]);
        assert_eq!(block.kind, ScopeKind::Block);
        assert_eq!(block.symbols().len(), 1);
    }
}
