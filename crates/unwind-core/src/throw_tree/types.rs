//! Throw tree types

use serde::{Deserialize, Serialize};

use crate::ast::{SourceLocation, SymbolId};
use crate::exceptions::{CatchRef, ThrowerId};

/// Terminal outcome of one propagation path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ThrowLeaf {
    /// The exception reaches this catch clause.
    Caught {
        catch: CatchRef,
        /// Location of the catch clause.
        location: SourceLocation,
        /// The catcher's declared type; `None` for `catch (...)`.
        exception_type: Option<String>,
    },
    /// No caller and no enclosing try left: the exception leaves the
    /// indexed program (or thread) through this function.
    Uncaught { function: SymbolId },
    /// Resolution stalled on an unresolved rethrow type meeting typed
    /// catchers. Recorded explicitly instead of guessing a match.
    Indeterminate { function: SymbolId },
}

/// A node in a propagation tree. The root sits at the throw site; each
/// child corresponds to one caller of the node's function, placed at the
/// call-site location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThrowTreeNode {
    pub function: SymbolId,
    pub location: SourceLocation,
    pub children: Vec<ThrowTreeNode>,
    /// Set exactly on terminal nodes.
    pub leaf: Option<ThrowLeaf>,
}

impl ThrowTreeNode {
    pub fn new(function: SymbolId, location: SourceLocation) -> Self {
        Self {
            function,
            location,
            children: Vec::new(),
            leaf: None,
        }
    }
}

/// All propagation paths of one throw site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThrowTree {
    pub thrower: ThrowerId,
    /// The throw site.
    pub location: SourceLocation,
    /// Effective thrown type (rethrows resolved through their enclosing
    /// catch); `None` when indeterminate.
    pub thrown_type: Option<String>,
    pub root: ThrowTreeNode,
    /// Flat view of every terminal outcome, in traversal order.
    pub leaves: Vec<ThrowLeaf>,
}
