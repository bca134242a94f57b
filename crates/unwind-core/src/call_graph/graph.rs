//! Arena-backed call graph

use rustc_hash::FxHashMap;

use crate::ast::{SourceLocation, SymbolId};
use crate::exceptions::TryStack;

use super::types::{CallEdge, CallGraphError, FunctionDecl, FunctionGraphNode, FunctionId};

/// The call graph. Nodes are created lazily on first reference, so callers
/// can be recorded before the callee's definition is visited (forward
/// references, cross-unit calls) and stay valid once it arrives.
#[derive(Debug, Clone, Default)]
pub struct CallGraph {
    nodes: Vec<FunctionGraphNode>,
    ids: FxHashMap<SymbolId, FunctionId>,
}

impl CallGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch-or-insert the node for a symbol, returning its stable handle.
    pub fn intern(&mut self, symbol: &SymbolId) -> FunctionId {
        if let Some(&id) = self.ids.get(symbol) {
            return id;
        }
        let id = FunctionId(self.nodes.len());
        self.nodes.push(FunctionGraphNode::new(symbol.clone()));
        self.ids.insert(symbol.clone(), id);
        id
    }

    /// Record a function definition. Fails if the symbol already has one.
    pub fn declare(
        &mut self,
        symbol: SymbolId,
        location: SourceLocation,
    ) -> Result<FunctionId, CallGraphError> {
        let id = self.intern(&symbol);
        let node = &mut self.nodes[id.0];
        if let Some(existing) = &node.decl {
            return Err(CallGraphError::DuplicateDeclaration {
                symbol,
                first: existing.location.clone(),
                second: location,
            });
        }
        node.decl = Some(FunctionDecl { symbol, location });
        Ok(id)
    }

    /// Record one call: appends the edge to the caller's `calls` and the
    /// callee's `callers`, both with the same location and try-block
    /// snapshot.
    pub fn record_call(
        &mut self,
        caller: SymbolId,
        callee: SymbolId,
        location: SourceLocation,
        try_stack: TryStack,
    ) -> (FunctionId, FunctionId) {
        let caller_id = self.intern(&caller);
        let callee_id = self.intern(&callee);
        self.nodes[caller_id.0].calls.push(CallEdge {
            peer: callee_id,
            location: location.clone(),
            try_stack: try_stack.clone(),
        });
        self.nodes[callee_id.0].callers.push(CallEdge {
            peer: caller_id,
            location,
            try_stack,
        });
        (caller_id, callee_id)
    }

    pub fn lookup(&self, symbol: &SymbolId) -> Option<FunctionId> {
        self.ids.get(symbol).copied()
    }

    pub fn node(&self, id: FunctionId) -> &FunctionGraphNode {
        &self.nodes[id.0]
    }

    pub fn symbol(&self, id: FunctionId) -> &SymbolId {
        &self.nodes[id.0].symbol
    }

    /// Nodes in insertion order, paired with their handles.
    pub fn iter(&self) -> impl Iterator<Item = (FunctionId, &FunctionGraphNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (FunctionId(i), node))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Total number of call edges (each call counted once).
    pub fn call_count(&self) -> usize {
        self.nodes.iter().map(|n| n.calls.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    use crate::exceptions::TryBlockId;

    fn loc(line: u32) -> SourceLocation {
        SourceLocation::new("t.cpp", line, 1)
    }

    #[test]
    fn test_intern_is_fetch_or_insert() {
        let mut graph = CallGraph::new();
        let f = SymbolId::new("f");
        let a = graph.intern(&f);
        let b = graph.intern(&f);
        assert_eq!(a, b);
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn test_call_edges_are_mirrored() {
        let mut graph = CallGraph::new();
        let stack: TryStack = smallvec![TryBlockId(0)];
        let (caller, callee) = graph.record_call(
            SymbolId::new("g"),
            SymbolId::new("f"),
            loc(10),
            stack.clone(),
        );

        let out = &graph.node(caller).calls;
        let inn = &graph.node(callee).callers;
        assert_eq!(out.len(), 1);
        assert_eq!(inn.len(), 1);
        assert_eq!(out[0].peer, callee);
        assert_eq!(inn[0].peer, caller);
        assert_eq!(out[0].location, inn[0].location);
        assert_eq!(out[0].try_stack, inn[0].try_stack);
    }

    #[test]
    fn test_callers_recorded_before_declaration_survive_it() {
        let mut graph = CallGraph::new();
        let f = SymbolId::new("f");
        graph.record_call(SymbolId::new("g"), f.clone(), loc(3), TryStack::new());

        let id = graph.declare(f.clone(), loc(20)).unwrap();
        let node = graph.node(id);
        assert_eq!(node.callers.len(), 1);
        assert_eq!(node.decl.as_ref().unwrap().location.line, 20);
    }

    #[test]
    fn test_duplicate_declaration_is_rejected() {
        let mut graph = CallGraph::new();
        let f = SymbolId::new("f");
        graph.declare(f.clone(), loc(1)).unwrap();
        let err = graph.declare(f, loc(9)).unwrap_err();
        match err {
            CallGraphError::DuplicateDeclaration { first, second, .. } => {
                assert_eq!(first.line, 1);
                assert_eq!(second.line, 9);
            }
        }
    }

    #[test]
    fn test_undeclared_reference_has_no_decl() {
        let mut graph = CallGraph::new();
        graph.record_call(
            SymbolId::new("main"),
            SymbolId::new("std::printf"),
            loc(2),
            TryStack::new(),
        );
        let id = graph.lookup(&SymbolId::new("std::printf")).unwrap();
        assert!(graph.node(id).decl.is_none());
    }
}
