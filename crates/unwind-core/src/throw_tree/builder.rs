//! Propagation-tree construction

use rayon::prelude::*;
use rustc_hash::FxHashSet;

use crate::call_graph::{CallGraph, FunctionId};
use crate::exceptions::{
    resolve_catch, CatchOutcome, CatchRef, ExceptionModel, Thrower, ThrowerId, TryStack,
    TypeMatcher,
};

use super::types::{ThrowLeaf, ThrowTree, ThrowTreeNode};

/// Builds the propagation tree for one thrower against a completed,
/// read-only call graph.
pub struct ThrowTreeBuilder<'a> {
    graph: &'a CallGraph,
    exceptions: &'a ExceptionModel,
    matcher: &'a dyn TypeMatcher,
}

/// Outcome of resolving a thrown type against a stack of enclosing try
/// blocks, innermost outward.
enum TryResolution {
    Caught(ThrowLeaf),
    Indeterminate,
    Escapes,
}

impl<'a> ThrowTreeBuilder<'a> {
    pub fn new(
        graph: &'a CallGraph,
        exceptions: &'a ExceptionModel,
        matcher: &'a dyn TypeMatcher,
    ) -> Self {
        Self {
            graph,
            exceptions,
            matcher,
        }
    }

    pub fn build(&self, id: ThrowerId) -> ThrowTree {
        let thrower = self.exceptions.thrower(id);
        let thrown = self.exceptions.effective_throw_type(thrower);
        let mut root = ThrowTreeNode::new(thrower.function.clone(), thrower.location.clone());
        let mut leaves = Vec::new();

        let resolved_locally = self.resolve_node_try_stack(
            &mut root,
            &thrower.try_stack,
            thrown.as_deref(),
            &mut leaves,
        );

        if !resolved_locally {
            self.expand_callers(&mut root, thrower, thrown.as_deref(), &mut leaves);
        }

        ThrowTree {
            thrower: id,
            location: thrower.location.clone(),
            thrown_type: thrown,
            root,
            leaves,
        }
    }

    /// Resolve a node against its enclosing try blocks. Returns true when
    /// the node became a leaf; false when the exception escapes every
    /// block and propagation must continue through callers.
    fn resolve_node_try_stack(
        &self,
        node: &mut ThrowTreeNode,
        try_stack: &TryStack,
        thrown: Option<&str>,
        leaves: &mut Vec<ThrowLeaf>,
    ) -> bool {
        if try_stack.is_empty() {
            return false;
        }
        match self.resolve_try_stack(try_stack, thrown) {
            TryResolution::Caught(leaf) => {
                leaves.push(leaf.clone());
                node.leaf = Some(leaf);
                true
            }
            TryResolution::Indeterminate => {
                let leaf = ThrowLeaf::Indeterminate {
                    function: node.function.clone(),
                };
                leaves.push(leaf.clone());
                node.leaf = Some(leaf);
                true
            }
            TryResolution::Escapes => false,
        }
    }

    /// Walk the try stack innermost to outermost. The first catcher that
    /// definitely catches ends the path. A catcher that cannot be decided
    /// (typed against an unresolved rethrow) does not stop the scan: a
    /// later catch-all still catches unconditionally. Only when the whole
    /// stack is exhausted with at least one undecidable catcher and no
    /// definite catch does the path end as indeterminate; otherwise the
    /// exception escapes to the callers.
    fn resolve_try_stack(&self, try_stack: &TryStack, thrown: Option<&str>) -> TryResolution {
        let mut saw_indeterminate = false;
        for &try_block in try_stack.iter().rev() {
            let block = self.exceptions.try_block(try_block);
            for (index, catcher) in block.catchers.iter().enumerate() {
                match resolve_catch(catcher, thrown, self.matcher) {
                    CatchOutcome::Caught => {
                        return TryResolution::Caught(ThrowLeaf::Caught {
                            catch: CatchRef {
                                try_block,
                                catcher: index,
                            },
                            location: catcher.location.clone(),
                            exception_type: catcher.exception_type.clone(),
                        });
                    }
                    CatchOutcome::Indeterminate => saw_indeterminate = true,
                    CatchOutcome::Propagates => {}
                }
            }
        }
        if saw_indeterminate {
            TryResolution::Indeterminate
        } else {
            TryResolution::Escapes
        }
    }

    /// Root entry into the caller traversal, seeding the per-path visited
    /// set with the thrower's containing function.
    fn expand_callers(
        &self,
        root: &mut ThrowTreeNode,
        thrower: &Thrower,
        thrown: Option<&str>,
        leaves: &mut Vec<ThrowLeaf>,
    ) {
        let Some(function) = self.graph.lookup(&thrower.function) else {
            // Never interned: nothing in the graph calls it and it calls
            // nothing. Zero callers, no enclosing try.
            let leaf = ThrowLeaf::Uncaught {
                function: thrower.function.clone(),
            };
            leaves.push(leaf.clone());
            root.leaf = Some(leaf);
            return;
        };
        let mut visited = FxHashSet::default();
        visited.insert(function);
        self.expand(root, function, thrown, &mut visited, leaves);
    }

    /// Expand one function's callers into children of `node`. `visited`
    /// holds the functions on the current root-to-node path; a caller
    /// already on the path is skipped, not re-expanded (bounded handling
    /// of recursive call cycles).
    fn expand(
        &self,
        node: &mut ThrowTreeNode,
        function: FunctionId,
        thrown: Option<&str>,
        visited: &mut FxHashSet<FunctionId>,
        leaves: &mut Vec<ThrowLeaf>,
    ) {
        let callers = &self.graph.node(function).callers;
        if callers.is_empty() {
            let leaf = ThrowLeaf::Uncaught {
                function: self.graph.symbol(function).clone(),
            };
            leaves.push(leaf.clone());
            node.leaf = Some(leaf);
            return;
        }

        for edge in callers {
            if visited.contains(&edge.peer) {
                continue;
            }
            let mut child = ThrowTreeNode::new(
                self.graph.symbol(edge.peer).clone(),
                edge.location.clone(),
            );
            if self.resolve_node_try_stack(&mut child, &edge.try_stack, thrown, leaves) {
                node.children.push(child);
                continue;
            }
            visited.insert(edge.peer);
            self.expand(&mut child, edge.peer, thrown, visited, leaves);
            visited.remove(&edge.peer);
            node.children.push(child);
        }
    }
}

/// Build one tree per recorded thrower, in thrower order. Each build only
/// reads the shared graph and model, so the throwers fan out across the
/// rayon pool.
pub fn build_throw_trees(
    graph: &CallGraph,
    exceptions: &ExceptionModel,
    matcher: &dyn TypeMatcher,
) -> Vec<ThrowTree> {
    (0..exceptions.throwers().len())
        .into_par_iter()
        .map(|i| ThrowTreeBuilder::new(graph, exceptions, matcher).build(ThrowerId(i)))
        .collect()
}
