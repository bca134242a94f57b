//! AST node types

use std::fmt;

use serde::{Deserialize, Serialize};

/// Symbol reserved for call and throw sites outside any function body
/// (global/static initialization).
const GLOBAL_SCOPE: &str = "<global-scope>";

/// Symbol reserved for call targets the frontend could not name
/// (e.g. calls through arbitrary expressions).
const UNRESOLVED: &str = "<unresolved>";

/// Globally unique identifier for a function, stable across translation
/// units. Produced by the frontend as the fully qualified spelled name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SymbolId(String);

impl SymbolId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Sentinel for sites outside any enclosing function.
    pub fn global_scope() -> Self {
        Self(GLOBAL_SCOPE.to_string())
    }

    /// Sentinel for call targets that could not be resolved to a name.
    pub fn unresolved() -> Self {
        Self(UNRESOLVED.to_string())
    }

    /// True for the global-scope and unresolved sentinels.
    pub fn is_sentinel(&self) -> bool {
        self.0 == GLOBAL_SCOPE || self.0 == UNRESOLVED
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A source position, detached from any parse tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    /// File the node was parsed from.
    pub file: String,
    /// 1-based line.
    pub line: u32,
    /// 1-based column.
    pub column: u32,
}

impl SourceLocation {
    pub fn new(file: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// Node kinds the analysis dispatches on. Closed set, matched exhaustively;
/// constructs with no analysis meaning are lowered to `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// A function definition (with body).
    FunctionDecl,
    /// A call expression.
    CallExpr,
    /// A variable declaration; under a catch clause this carries the
    /// declared exception parameter's type.
    VarDecl,
    /// A `try` statement.
    TryStmt,
    /// A `catch` clause of a try statement.
    CatchClause,
    /// A `throw` expression (including the bare rethrow `throw;`).
    ThrowExpr,
    /// Anything else; kept for tree shape and AST dumps.
    Other,
}

impl NodeKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::FunctionDecl => "function_decl",
            Self::CallExpr => "call_expr",
            Self::VarDecl => "var_decl",
            Self::TryStmt => "try_stmt",
            Self::CatchClause => "catch_clause",
            Self::ThrowExpr => "throw_expr",
            Self::Other => "other",
        }
    }
}

/// A node in the lowered syntax tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AstNode {
    pub kind: NodeKind,
    pub location: SourceLocation,
    /// Kind-dependent spelling: qualified name for function definitions,
    /// callee text for calls, declared type for catch parameters, static
    /// type of the thrown expression for throws (empty for `throw;`),
    /// grammar rule name for `Other` nodes.
    pub spelling: String,
    /// Referenced symbol: the defined function for `FunctionDecl`, the
    /// spelled target for `CallExpr` (`None` when unresolvable).
    pub referenced: Option<SymbolId>,
    pub children: Vec<AstNode>,
}

impl AstNode {
    pub fn new(kind: NodeKind, location: SourceLocation) -> Self {
        Self {
            kind,
            location,
            spelling: String::new(),
            referenced: None,
            children: Vec::new(),
        }
    }
}

/// One parsed source file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationUnit {
    /// Path the unit was parsed from, as given to the frontend.
    pub path: String,
    pub root: AstNode,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinels_are_distinct() {
        assert_ne!(SymbolId::global_scope(), SymbolId::unresolved());
        assert!(SymbolId::global_scope().is_sentinel());
        assert!(SymbolId::unresolved().is_sentinel());
        assert!(!SymbolId::new("ns::f").is_sentinel());
    }

    #[test]
    fn test_location_display() {
        let loc = SourceLocation::new("src/main.cpp", 12, 5);
        assert_eq!(loc.to_string(), "src/main.cpp:12:5");
    }
}
