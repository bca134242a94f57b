//! unwind-core: C++ exception-propagation analysis engine
//!
//! This crate answers two questions about a C++ codebase:
//! - who calls whom (the static call graph), and
//! - for every `throw`, where can the exception land (the throw trees).
//!
//! Subsystems:
//! - AST: the lowered node model shared by everything downstream
//! - Frontend: native tree-sitter C++ parsing and lowering
//! - Context: lexical context stacks for the indexing walk
//! - Call Graph: symbol-keyed bidirectional graph in an arena
//! - Exceptions: throw/catch model and the type-matching hook
//! - Throw Trees: propagation paths to catch handlers or "uncaught"
//! - Index: the single-pass driver owning graph and model
//! - Report: text and JSON rendering

pub mod ast;
pub mod call_graph;
pub mod context;
pub mod exceptions;
pub mod frontend;
pub mod index;
pub mod report;
pub mod throw_tree;

// Re-exports for convenience
pub use ast::{AstNode, NodeKind, SourceLocation, SymbolId, TranslationUnit};
pub use call_graph::{CallEdge, CallGraph, CallGraphError, FunctionDecl, FunctionGraphNode, FunctionId};
pub use context::{ContextError, ContextTracker};
pub use exceptions::{
    CatchOutcome, CatchRef, Catcher, ExceptionModel, SpelledTypeMatcher, Thrower, ThrowerId,
    TryBlockId, TryCatch, TryStack, TypeMatcher,
};
pub use frontend::{collect_cpp_sources, CppFrontend, FrontendError};
pub use index::{IndexError, IndexStats, ProgramIndex};
pub use report::{
    call_graph_report, throw_site_reports, write_ast, write_call_graph, write_throw_report,
    write_throw_trees, CallGraphReport, EdgeReport, FunctionReport, ThrowSiteReport,
};
pub use throw_tree::{build_throw_trees, ThrowLeaf, ThrowTree, ThrowTreeBuilder, ThrowTreeNode};
