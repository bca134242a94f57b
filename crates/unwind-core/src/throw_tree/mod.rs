//! Throw Trees
//!
//! For each throw site, reconstructs every propagation path through the
//! completed call graph: up through lexically enclosing try blocks first,
//! then through caller chains, until a matching catch clause or the edge
//! of the indexed program.
//!
//! Runs strictly after indexing: the call graph is read-only here, which
//! is what lets the per-thrower builds fan out in parallel.

mod builder;
mod types;

pub use builder::{build_throw_trees, ThrowTreeBuilder};
pub use types::{ThrowLeaf, ThrowTree, ThrowTreeNode};
