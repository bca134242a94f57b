//! Lexical context stacks

use crate::ast::{NodeKind, SymbolId};
use crate::exceptions::{CatchRef, ThrowerId, TryBlockId, TryStack};

/// Internal-consistency errors of the traversal. These indicate a bug in
/// the walk (mismatched enter/exit), never a problem with user sources.
#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    #[error("popped an empty {what} stack")]
    StackUnderflow { what: &'static str },

    #[error("exited a {exited:?} node while a {entered:?} frame was on top")]
    MismatchedExit { entered: NodeKind, exited: NodeKind },

    #[error("{what} stack holds {depth} frame(s) at a translation-unit boundary")]
    UnbalancedTraversal { what: &'static str, depth: usize },
}

/// Lexical context at the node currently being visited.
#[derive(Debug, Default)]
pub struct ContextTracker {
    /// Kinds of all nodes on the path from the root to the current node.
    nodes: Vec<NodeKind>,
    /// Enclosing function definitions, outermost first.
    functions: Vec<SymbolId>,
    /// Enclosing try blocks, outermost first.
    try_blocks: Vec<TryBlockId>,
    /// Enclosing catch clauses, outermost first.
    catches: Vec<CatchRef>,
    /// Enclosing throw expressions, outermost first.
    throwers: Vec<ThrowerId>,
}

impl ContextTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_node(&mut self, kind: NodeKind) {
        self.nodes.push(kind);
    }

    /// Pop the current node frame, verifying it matches the node being
    /// exited.
    pub fn pop_node(&mut self, kind: NodeKind) -> Result<(), ContextError> {
        match self.nodes.pop() {
            None => Err(ContextError::StackUnderflow { what: "node" }),
            Some(entered) if entered != kind => Err(ContextError::MismatchedExit {
                entered,
                exited: kind,
            }),
            Some(_) => Ok(()),
        }
    }

    pub fn push_function(&mut self, symbol: SymbolId) {
        self.functions.push(symbol);
    }

    pub fn pop_function(&mut self) -> Result<SymbolId, ContextError> {
        self.functions
            .pop()
            .ok_or(ContextError::StackUnderflow { what: "function" })
    }

    pub fn push_try_block(&mut self, id: TryBlockId) {
        self.try_blocks.push(id);
    }

    pub fn pop_try_block(&mut self) -> Result<TryBlockId, ContextError> {
        self.try_blocks
            .pop()
            .ok_or(ContextError::StackUnderflow { what: "try-block" })
    }

    pub fn push_catch(&mut self, catch: CatchRef) {
        self.catches.push(catch);
    }

    pub fn pop_catch(&mut self) -> Result<CatchRef, ContextError> {
        self.catches
            .pop()
            .ok_or(ContextError::StackUnderflow { what: "catch" })
    }

    pub fn push_thrower(&mut self, id: ThrowerId) {
        self.throwers.push(id);
    }

    pub fn pop_thrower(&mut self) -> Result<ThrowerId, ContextError> {
        self.throwers
            .pop()
            .ok_or(ContextError::StackUnderflow { what: "thrower" })
    }

    /// Function lexically containing the current node, if any. `None` in
    /// global/static initialization context.
    pub fn current_function(&self) -> Option<&SymbolId> {
        self.functions.last()
    }

    pub fn top_try_block(&self) -> Option<TryBlockId> {
        self.try_blocks.last().copied()
    }

    pub fn in_try_block(&self) -> bool {
        !self.try_blocks.is_empty()
    }

    /// Innermost catch clause containing the current node, if any.
    pub fn enclosing_catch(&self) -> Option<CatchRef> {
        self.catches.last().copied()
    }

    pub fn current_thrower(&self) -> Option<ThrowerId> {
        self.throwers.last().copied()
    }

    /// Kind of the parent of the current node.
    pub fn parent_kind(&self) -> Option<NodeKind> {
        let len = self.nodes.len();
        (len >= 2).then(|| self.nodes[len - 2])
    }

    /// Full lexical try-block snapshot, outermost first. This is what call
    /// edges carry.
    pub fn try_stack_snapshot(&self) -> TryStack {
        self.try_blocks.iter().copied().collect()
    }

    /// Try-block snapshot for a throw site: like `try_stack_snapshot`, but
    /// excluding blocks whose catch clause (rather than protected region)
    /// contains the site. A handler's own try cannot catch what the
    /// handler throws.
    pub fn thrower_try_stack(&self) -> TryStack {
        self.try_blocks
            .iter()
            .copied()
            .filter(|id| !self.catches.iter().any(|c| c.try_block == *id))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
            && self.functions.is_empty()
            && self.try_blocks.is_empty()
            && self.catches.is_empty()
            && self.throwers.is_empty()
    }

    /// Check the unit-boundary invariant: every stack fully unwound.
    pub fn ensure_empty(&self) -> Result<(), ContextError> {
        let stacks: [(&'static str, usize); 5] = [
            ("node", self.nodes.len()),
            ("function", self.functions.len()),
            ("try-block", self.try_blocks.len()),
            ("catch", self.catches.len()),
            ("thrower", self.throwers.len()),
        ];
        for (what, depth) in stacks {
            if depth != 0 {
                return Err(ContextError::UnbalancedTraversal { what, depth });
            }
        }
        Ok(())
    }
}
