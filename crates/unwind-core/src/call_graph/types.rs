//! Call graph types

use serde::{Deserialize, Serialize};

use crate::ast::{SourceLocation, SymbolId};
use crate::exceptions::TryStack;

/// Stable handle into the call graph's node arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FunctionId(pub usize);

/// A function definition seen during indexing. At most one per symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDecl {
    pub symbol: SymbolId,
    pub location: SourceLocation,
}

/// One direction of a call relationship. The peer is the callee when the
/// edge sits in a caller's `calls` list, the caller when it sits in a
/// callee's `callers` list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallEdge {
    pub peer: FunctionId,
    /// Location of the call expression.
    pub location: SourceLocation,
    /// Try blocks lexically enclosing the call site, outermost first.
    pub try_stack: TryStack,
}

/// A node in the call graph. `decl` stays `None` for functions that are
/// only referenced, never defined, in the indexed sources (external
/// library functions, or the sentinel symbols).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionGraphNode {
    pub symbol: SymbolId,
    pub decl: Option<FunctionDecl>,
    /// Outgoing edges, in indexing order.
    pub calls: Vec<CallEdge>,
    /// Incoming edges, in indexing order.
    pub callers: Vec<CallEdge>,
}

impl FunctionGraphNode {
    pub fn new(symbol: SymbolId) -> Self {
        Self {
            symbol,
            decl: None,
            calls: Vec::new(),
            callers: Vec::new(),
        }
    }
}

/// Call graph construction errors.
#[derive(Debug, thiserror::Error)]
pub enum CallGraphError {
    /// A symbol received a second function definition. Either the frontend
    /// visited a definition twice or the sources genuinely redefine the
    /// function; both abort the current translation unit.
    #[error("duplicate definition of `{symbol}` at {second} (first at {first})")]
    DuplicateDeclaration {
        symbol: SymbolId,
        first: SourceLocation,
        second: SourceLocation,
    },
}
