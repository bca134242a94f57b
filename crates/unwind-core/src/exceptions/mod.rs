//! Exception Model
//!
//! Records every throw site and every try/catch structure found during
//! indexing, and owns the type-matching hook used when throw trees are
//! resolved against catch clauses.
//!
//! Try blocks live in an arena addressed by `TryBlockId`; the stacks and
//! snapshots taken during traversal hold ids, so they stay valid for the
//! whole analysis regardless of when the blocks were recorded.

mod matching;
mod types;

pub use matching::{normalize_type, resolve_catch, CatchOutcome, SpelledTypeMatcher, TypeMatcher};
pub use types::{
    CatchRef, Catcher, ExceptionModel, Thrower, ThrowerId, TryBlockId, TryCatch, TryStack,
};
