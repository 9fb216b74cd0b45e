//! Types, symbols, and the scope tree.
//!
//! Scopes live in an arena owned by the [`SymbolTable`]; entering and
//! leaving a scope only moves an index, so the whole tree survives the
//! traversal and can be handed to the host for inspection afterwards.

use crate::utils::location::Span;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Arity of a function type: a concrete parameter count, or the
/// distinguished variadic marker used by builtins such as `print`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Arity {
    /// Exactly this many arguments
    Fixed(usize),
    /// Any number of arguments
    Variadic,
}

impl Arity {
    /// Whether a call with `n` arguments satisfies this arity.
    pub fn accepts(&self, n: usize) -> bool {
        match self {
            Arity::Fixed(k) => *k == n,
            Arity::Variadic => true,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Fixed(k) => write!(f, "{}", k),
            Arity::Variadic => write!(f, ".."),
        }
    }
}

/// A type in the language.
///
/// `Unknown` doubles as the absorbing bottom for error suppression: an
/// expression that already failed types as `Unknown`, and operators
/// with an `Unknown` operand stay silent instead of cascading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Type {
    /// Double-precision number
    Number,
    /// String
    String,
    /// Boolean
    Boolean,
    /// Function with arity and return type
    Function {
        /// Parameter count or variadic
        arity: Arity,
        /// Declared return type
        return_type: Box<Type>,
    },
    /// No value (builtin procedures)
    Void,
    /// Not yet known, or already failed
    Unknown,
}

impl Type {
    /// A function type with a fixed arity and `Unknown` return.
    pub fn function(params: usize) -> Self {
        Type::Function {
            arity: Arity::Fixed(params),
            return_type: Box::new(Type::Unknown),
        }
    }

    /// Check if this is `Unknown`.
    pub fn is_unknown(&self) -> bool {
        matches!(self, Type::Unknown)
    }

    /// Check if this is a known, settled type.
    pub fn is_concrete(&self) -> bool {
        !self.is_unknown()
    }

    /// Check if this is a function type.
    pub fn is_function(&self) -> bool {
        matches!(self, Type::Function { .. })
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Number => write!(f, "number"),
            Type::String => write!(f, "string"),
            Type::Boolean => write!(f, "boolean"),
            Type::Function { arity, return_type } => {
                write!(f, "fn({}) -> {}", arity, return_type)
            }
            Type::Void => write!(f, "void"),
            Type::Unknown => write!(f, "unknown"),
        }
    }
}

/// The kind of a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SymbolKind {
    /// `let` binding
    Variable,
    /// `const` binding
    Constant,
    /// User-declared function
    Function,
    /// Function parameter
    Parameter,
    /// Pre-seeded global
    Builtin,
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SymbolKind::Variable => write!(f, "variable"),
            SymbolKind::Constant => write!(f, "constant"),
            SymbolKind::Function => write!(f, "function"),
            SymbolKind::Parameter => write!(f, "parameter"),
            SymbolKind::Builtin => write!(f, "builtin"),
        }
    }
}

/// A named entity known to the semantic analyzer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Symbol {
    /// Symbol name
    pub name: String,
    /// What kind of binding this is
    pub kind: SymbolKind,
    /// Declared or inferred type
    pub ty: Type,
    /// Declaration span
    pub span: Span,
    /// Whether the symbol was ever referenced
    pub used: bool,
    /// Whether the symbol was ever called (functions)
    pub called: bool,
    /// Whether the binding may be reassigned
    pub mutable: bool,
}

impl Symbol {
    /// Create a symbol. Mutability follows the kind: `const` and
    /// builtin bindings are immutable, everything else may be
    /// reassigned.
    pub fn new(name: impl Into<String>, kind: SymbolKind, ty: Type, span: Span) -> Self {
        let mutable = !matches!(kind, SymbolKind::Constant | SymbolKind::Builtin);
        Self {
            name: name.into(),
            kind,
            ty,
            span,
            used: false,
            called: false,
            mutable,
        }
    }

    /// The arity carried by this symbol's type, for functions.
    pub fn arity(&self) -> Option<Arity> {
        match &self.ty {
            Type::Function { arity, .. } => Some(*arity),
            _ => None,
        }
    }
}

/// The kind of a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScopeKind {
    /// The root scope
    Global,
    /// A function body
    Function,
    /// A braced block or `for` header
    Block,
}

impl fmt::Display for ScopeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScopeKind::Global => write!(f, "global"),
            ScopeKind::Function => write!(f, "function"),
            ScopeKind::Block => write!(f, "block"),
        }
    }
}

/// Handle into the scope arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScopeId(pub usize);

/// A lexical scope: a set of bindings plus links to its parent and
/// children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scope {
    /// What opened this scope
    pub kind: ScopeKind,
    /// Enclosing scope, `None` for the root
    pub parent: Option<ScopeId>,
    /// Child scopes in creation order
    pub children: Vec<ScopeId>,
    /// Symbols in declaration order; names are unique within a scope
    symbols: Vec<Symbol>,
}

impl Scope {
    fn new(kind: ScopeKind, parent: Option<ScopeId>) -> Self {
        Self {
            kind,
            parent,
            children: Vec::new(),
            symbols: Vec::new(),
        }
    }

    /// Symbols of this scope in declaration order.
    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    /// Look up a name in this scope only.
    pub fn local(&self, name: &str) -> Option<&Symbol> {
        self.symbols.iter().find(|s| s.name == name)
    }

    fn local_mut(&mut self, name: &str) -> Option<&mut Symbol> {
        self.symbols.iter_mut().find(|s| s.name == name)
    }
}

/// The scope tree: an arena of scopes with a cursor for the scope the
/// traversal is currently inside.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
    current: ScopeId,
}

impl SymbolTable {
    /// Create a table with the global scope and its builtins.
    pub fn new() -> Self {
        let mut table = Self {
            scopes: vec![Scope::new(ScopeKind::Global, None)],
            current: ScopeId(0),
        };
        table.seed_builtins();
        table
    }

    /// Seed the pre-declared globals. They count as always-used so the
    /// unused-symbol pass never flags them.
    fn seed_builtins(&mut self) {
        let builtins = [
            ("print", Arity::Variadic, Type::Void),
            ("input", Arity::Fixed(0), Type::String),
            ("parseInt", Arity::Fixed(1), Type::Number),
            ("parseFloat", Arity::Fixed(1), Type::Number),
        ];

        for (name, arity, return_type) in builtins {
            let ty = Type::Function {
                arity,
                return_type: Box::new(return_type),
            };
            let mut symbol = Symbol::new(name, SymbolKind::Builtin, ty, Span::dummy());
            symbol.used = true;
            symbol.called = true;
            self.scopes[0].symbols.push(symbol);
        }
    }

    /// The root scope handle.
    pub fn global(&self) -> ScopeId {
        ScopeId(0)
    }

    /// The scope the traversal is currently inside.
    pub fn current(&self) -> ScopeId {
        self.current
    }

    /// Access a scope by handle.
    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0]
    }

    /// All scopes in creation order.
    pub fn scopes(&self) -> impl Iterator<Item = (ScopeId, &Scope)> {
        self.scopes.iter().enumerate().map(|(i, s)| (ScopeId(i), s))
    }

    /// Create a child of the current scope and enter it.
    pub fn push(&mut self, kind: ScopeKind) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        self.scopes.push(Scope::new(kind, Some(self.current)));
        self.scopes[self.current.0].children.push(id);
        self.current = id;
        id
    }

    /// Leave the current scope. The scope itself stays in the arena,
    /// reachable through its parent's `children`.
    pub fn pop(&mut self) {
        if let Some(parent) = self.scopes[self.current.0].parent {
            self.current = parent;
        }
    }

    /// Insert a symbol into the current scope. Fails with the prior
    /// declaration's span if the name already exists in this scope;
    /// the first binding stays in place.
    pub fn declare(&mut self, symbol: Symbol) -> Result<(), Span> {
        if let Some(existing) = self.scopes[self.current.0].local(&symbol.name) {
            return Err(existing.span);
        }
        self.scopes[self.current.0].symbols.push(symbol);
        Ok(())
    }

    /// Check whether `name` is bound in an enclosing scope (not the
    /// current one). Returns the outer declaration's span if so.
    pub fn shadows(&self, name: &str) -> Option<Span> {
        let mut cursor = self.scopes[self.current.0].parent;
        while let Some(id) = cursor {
            if let Some(symbol) = self.scopes[id.0].local(name) {
                return Some(symbol.span);
            }
            cursor = self.scopes[id.0].parent;
        }
        None
    }

    /// Look up a name in the current scope only.
    pub fn resolve_local(&self, name: &str) -> Option<&Symbol> {
        self.scopes[self.current.0].local(name)
    }

    /// Innermost-first lookup from the current scope to the root.
    pub fn resolve(&self, name: &str) -> Option<&Symbol> {
        self.find(name)
            .map(|(scope, index)| &self.scopes[scope.0].symbols[index])
    }

    fn find(&self, name: &str) -> Option<(ScopeId, usize)> {
        let mut cursor = Some(self.current);
        while let Some(id) = cursor {
            let scope = &self.scopes[id.0];
            if let Some(index) = scope.symbols.iter().position(|s| s.name == name) {
                return Some((id, index));
            }
            cursor = scope.parent;
        }
        None
    }

    /// Flip the used flag on the innermost binding of `name`.
    pub fn mark_used(&mut self, name: &str) {
        if let Some((scope, index)) = self.find(name) {
            self.scopes[scope.0].symbols[index].used = true;
        }
    }

    /// Flip the called flag on the innermost binding of `name`.
    pub fn mark_called(&mut self, name: &str) {
        if let Some((scope, index)) = self.find(name) {
            self.scopes[scope.0].symbols[index].called = true;
        }
    }

    /// Replace the type of the innermost binding of `name`.
    pub fn refine_type(&mut self, name: &str, ty: Type) {
        if let Some((scope, index)) = self.find(name) {
            self.scopes[scope.0].symbols[index].ty = ty;
        }
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(name: &str, ty: Type) -> Symbol {
        Symbol::new(name, SymbolKind::Variable, ty, Span::dummy())
    }

    #[test]
    fn test_builtins_seeded() {
        let table = SymbolTable::new();
        let print = table.resolve("print").unwrap();
        assert_eq!(print.kind, SymbolKind::Builtin);
        assert!(print.used);
        assert!(!print.mutable);
        assert_eq!(print.arity(), Some(Arity::Variadic));

        let input = table.resolve("input").unwrap();
        assert_eq!(input.arity(), Some(Arity::Fixed(0)));
        assert!(matches!(
            &input.ty,
            Type::Function { return_type, .. } if **return_type == Type::String
        ));
    }

    #[test]
    fn test_declare_and_resolve() {
        let mut table = SymbolTable::new();
        table.declare(var("x", Type::Number)).unwrap();
        assert_eq!(table.resolve("x").unwrap().ty, Type::Number);
        assert!(table.resolve("y").is_none());
    }

    #[test]
    fn test_duplicate_in_same_scope() {
        let mut table = SymbolTable::new();
        table.declare(var("x", Type::Number)).unwrap();
        assert!(table.declare(var("x", Type::String)).is_err());
        // The first binding wins.
        assert_eq!(table.resolve("x").unwrap().ty, Type::Number);
    }

    #[test]
    fn test_shadowing_across_scopes() {
        let mut table = SymbolTable::new();
        table.declare(var("x", Type::Number)).unwrap();

        table.push(ScopeKind::Block);
        assert!(table.shadows("x").is_some());
        assert!(table.shadows("y").is_none());
        table.declare(var("x", Type::String)).unwrap();
        // Innermost binding wins.
        assert_eq!(table.resolve("x").unwrap().ty, Type::String);

        table.pop();
        assert_eq!(table.resolve("x").unwrap().ty, Type::Number);
    }

    #[test]
    fn test_scopes_retained_after_pop() {
        let mut table = SymbolTable::new();
        let inner = table.push(ScopeKind::Function);
        table.declare(var("local", Type::Number)).unwrap();
        table.pop();

        assert_eq!(table.current(), table.global());
        assert_eq!(table.scope(table.global()).children, vec![inner]);
        assert_eq!(table.scope(inner).kind, ScopeKind::Function);
        assert_eq!(table.scope(inner).symbols().len(), 1);
    }

    #[test]
    fn test_mark_used_hits_innermost() {
        let mut table = SymbolTable::new();
        table.declare(var("x", Type::Number)).unwrap();
        let inner = table.push(ScopeKind::Block);
        table.declare(var("x", Type::String)).unwrap();

        table.mark_used("x");
        assert!(table.scope(inner).local("x").unwrap().used);
        table.pop();
        assert!(!table.scope(table.global()).local("x").unwrap().used);
    }

    #[test]
    fn test_refine_type() {
        let mut table = SymbolTable::new();
        table.declare(var("x", Type::Unknown)).unwrap();
        table.refine_type("x", Type::Boolean);
        assert_eq!(table.resolve("x").unwrap().ty, Type::Boolean);
    }

    #[test]
    fn test_type_display() {
        assert_eq!(Type::Number.to_string(), "number");
        assert_eq!(
            Type::Function {
                arity: Arity::Fixed(2),
                return_type: Box::new(Type::Unknown),
            }
            .to_string(),
            "fn(2) -> unknown"
        );
        assert_eq!(
            Type::Function {
                arity: Arity::Variadic,
                return_type: Box::new(Type::Void),
            }
            .to_string(),
            "fn(..) -> void"
        );
    }

    #[test]
    fn test_arity_accepts() {
        assert!(Arity::Fixed(2).accepts(2));
        assert!(!Arity::Fixed(2).accepts(3));
        assert!(Arity::Variadic.accepts(0));
        assert!(Arity::Variadic.accepts(17));
    }
}
