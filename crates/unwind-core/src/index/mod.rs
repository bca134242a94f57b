//! Program Index
//!
//! Owns the call graph and the exception model and drives the single
//! depth-first pass over each translation unit that populates both. The
//! context tracker is created fresh per unit and must be fully unwound at
//! the unit boundary; the throw-tree phase runs only once indexing is
//! complete and the graph is read-only.

use tracing::debug;

use crate::ast::{AstNode, NodeKind, SymbolId, TranslationUnit};
use crate::call_graph::{CallGraph, CallGraphError};
use crate::context::{ContextError, ContextTracker};
use crate::exceptions::{CatchRef, Catcher, ExceptionModel, Thrower, TypeMatcher};
use crate::frontend::FrontendError;
use crate::throw_tree::{build_throw_trees, ThrowTree};

/// Top-level analysis error, aggregating the subsystem errors.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("call graph error: {0}")]
    CallGraph(#[from] CallGraphError),

    #[error("traversal error: {0}")]
    Context(#[from] ContextError),

    #[error("frontend error: {0}")]
    Frontend(#[from] FrontendError),
}

/// Counters and non-fatal errors from indexing a batch of units. Units
/// that fail hard (duplicate definitions, traversal bugs) are reported
/// here and skipped; the rest of the batch is still indexed.
#[derive(Debug, Clone, Default)]
pub struct IndexStats {
    pub units_indexed: usize,
    pub functions: usize,
    pub calls: usize,
    pub try_blocks: usize,
    pub throwers: usize,
    pub errors: Vec<String>,
}

/// The analysis index: call graph plus exception model.
#[derive(Debug, Default)]
pub struct ProgramIndex {
    graph: CallGraph,
    exceptions: ExceptionModel,
}

impl ProgramIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn graph(&self) -> &CallGraph {
        &self.graph
    }

    pub fn exceptions(&self) -> &ExceptionModel {
        &self.exceptions
    }

    /// Index one translation unit. The tracker starts empty by
    /// construction and is checked empty again after the walk; an
    /// unbalanced walk or a duplicate definition aborts this unit.
    pub fn index_unit(&mut self, unit: &TranslationUnit) -> Result<(), IndexError> {
        let mut ctx = ContextTracker::new();
        self.visit(&unit.root, &mut ctx)?;
        ctx.ensure_empty()?;
        debug!(
            unit = unit.path.as_str(),
            functions = self.graph.len(),
            throwers = self.exceptions.throwers().len(),
            "indexed translation unit"
        );
        Ok(())
    }

    /// Index a batch of units, accumulating per-unit failures instead of
    /// stopping at the first one.
    pub fn index_units<'a>(
        &mut self,
        units: impl IntoIterator<Item = &'a TranslationUnit>,
    ) -> IndexStats {
        let mut stats = IndexStats::default();
        for unit in units {
            match self.index_unit(unit) {
                Ok(()) => stats.units_indexed += 1,
                Err(e) => stats.errors.push(format!("{}: {}", unit.path, e)),
            }
        }
        stats.functions = self.graph.len();
        stats.calls = self.graph.call_count();
        stats.try_blocks = self.exceptions.try_blocks().len();
        stats.throwers = self.exceptions.throwers().len();
        stats
    }

    /// Build one propagation tree per recorded thrower. Requires indexing
    /// to be finished: the graph is only read from here on.
    pub fn build_throw_trees(&self, matcher: &dyn TypeMatcher) -> Vec<ThrowTree> {
        build_throw_trees(&self.graph, &self.exceptions, matcher)
    }

    fn visit(&mut self, node: &AstNode, ctx: &mut ContextTracker) -> Result<(), IndexError> {
        self.enter(node, ctx)?;
        for child in &node.children {
            self.visit(child, ctx)?;
        }
        self.exit(node, ctx)
    }

    fn enter(&mut self, node: &AstNode, ctx: &mut ContextTracker) -> Result<(), IndexError> {
        ctx.push_node(node.kind);
        match node.kind {
            NodeKind::FunctionDecl => {
                let symbol = node
                    .referenced
                    .clone()
                    .unwrap_or_else(|| SymbolId::new(node.spelling.clone()));
                self.graph.declare(symbol.clone(), node.location.clone())?;
                ctx.push_function(symbol);
            }
            NodeKind::CallExpr => {
                let caller = ctx
                    .current_function()
                    .cloned()
                    .unwrap_or_else(SymbolId::global_scope);
                let callee = node
                    .referenced
                    .clone()
                    .unwrap_or_else(SymbolId::unresolved);
                self.graph.record_call(
                    caller,
                    callee,
                    node.location.clone(),
                    ctx.try_stack_snapshot(),
                );
            }
            NodeKind::VarDecl => {
                // Only meaningful directly under a catch clause, where it
                // carries the declared exception type.
                if ctx.parent_kind() == Some(NodeKind::CatchClause) && !node.spelling.is_empty() {
                    if let Some(try_block) = ctx.top_try_block() {
                        self.exceptions
                            .set_top_catcher_type(try_block, node.spelling.clone());
                    }
                }
            }
            NodeKind::TryStmt => {
                let id = self.exceptions.alloc_try_block(node.location.clone());
                ctx.push_try_block(id);
            }
            NodeKind::CatchClause => {
                let try_block = ctx.top_try_block().ok_or(ContextError::StackUnderflow {
                    what: "try-block",
                })?;
                let catcher = self
                    .exceptions
                    .add_catcher(try_block, Catcher::new(node.location.clone()));
                ctx.push_catch(CatchRef { try_block, catcher });
            }
            NodeKind::ThrowExpr => {
                let thrower = Thrower {
                    function: ctx
                        .current_function()
                        .cloned()
                        .unwrap_or_else(SymbolId::global_scope),
                    location: node.location.clone(),
                    try_stack: ctx.thrower_try_stack(),
                    exception_type: (!node.spelling.is_empty()).then(|| node.spelling.clone()),
                    enclosing_catch: ctx.enclosing_catch(),
                };
                let id = self.exceptions.record_thrower(thrower);
                ctx.push_thrower(id);
            }
            NodeKind::Other => {}
        }
        Ok(())
    }

    fn exit(&mut self, node: &AstNode, ctx: &mut ContextTracker) -> Result<(), IndexError> {
        match node.kind {
            NodeKind::FunctionDecl => {
                ctx.pop_function()?;
            }
            NodeKind::TryStmt => {
                ctx.pop_try_block()?;
            }
            NodeKind::CatchClause => {
                ctx.pop_catch()?;
            }
            NodeKind::ThrowExpr => {
                ctx.pop_thrower()?;
            }
            NodeKind::CallExpr | NodeKind::VarDecl | NodeKind::Other => {}
        }
        ctx.pop_node(node.kind)?;
        Ok(())
    }
}
