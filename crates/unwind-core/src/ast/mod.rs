//! AST Model
//!
//! Language-neutral syntax tree consumed by the indexer. The C++ frontend
//! lowers tree-sitter parse trees into these nodes; everything downstream
//! (context tracking, call graph, exception model) only sees this shape.
//!
//! Locations and symbols are owned values: nothing here borrows from the
//! parse tree, which is discarded per translation unit.

mod types;

pub use types::{AstNode, NodeKind, SourceLocation, SymbolId, TranslationUnit};
