//! Throw/catch data model

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::ast::{SourceLocation, SymbolId};

/// Stable handle into the exception model's try-block arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TryBlockId(pub usize);

/// Stable handle into the exception model's thrower list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThrowerId(pub usize);

/// Ordered snapshot of lexically enclosing try blocks, outermost first.
/// Nesting deeper than four is rare enough to spill.
pub type TryStack = SmallVec<[TryBlockId; 4]>;

/// A specific catch clause within a try block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatchRef {
    pub try_block: TryBlockId,
    /// Index into the try block's `catchers`, source order.
    pub catcher: usize,
}

/// A `catch` clause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catcher {
    pub location: SourceLocation,
    /// Declared exception type spelling; `None` is `catch (...)`.
    pub exception_type: Option<String>,
}

impl Catcher {
    pub fn new(location: SourceLocation) -> Self {
        Self {
            location,
            exception_type: None,
        }
    }

    pub fn is_catch_all(&self) -> bool {
        self.exception_type.is_none()
    }
}

/// A `try` statement with its ordered catch clauses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TryCatch {
    pub location: SourceLocation,
    /// Appended in source order while the try statement is traversed.
    pub catchers: Vec<Catcher>,
}

impl TryCatch {
    pub fn new(location: SourceLocation) -> Self {
        Self {
            location,
            catchers: Vec::new(),
        }
    }
}

/// A specific `throw` site with its lexical context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thrower {
    /// Function lexically containing the throw; the global-scope sentinel
    /// for throws in global/static initialization.
    pub function: SymbolId,
    pub location: SourceLocation,
    /// Enclosing try blocks whose protected region contains the site,
    /// outermost first. Try blocks whose *catch clause* contains the site
    /// are excluded: a handler's own try cannot catch its rethrow.
    pub try_stack: TryStack,
    /// Static type of the thrown expression; `None` for `throw;`.
    pub exception_type: Option<String>,
    /// Innermost catch clause lexically containing the site, if any.
    /// Rethrow type resolution walks through this.
    pub enclosing_catch: Option<CatchRef>,
}

/// All throw/catch structure collected from the indexed sources.
#[derive(Debug, Clone, Default)]
pub struct ExceptionModel {
    try_blocks: Vec<TryCatch>,
    throwers: Vec<Thrower>,
}

impl ExceptionModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a try block, returning its stable handle.
    pub fn alloc_try_block(&mut self, location: SourceLocation) -> TryBlockId {
        let id = TryBlockId(self.try_blocks.len());
        self.try_blocks.push(TryCatch::new(location));
        id
    }

    pub fn try_block(&self, id: TryBlockId) -> &TryCatch {
        &self.try_blocks[id.0]
    }

    pub fn try_blocks(&self) -> &[TryCatch] {
        &self.try_blocks
    }

    /// Append a catcher to a try block, returning its source-order index.
    pub fn add_catcher(&mut self, id: TryBlockId, catcher: Catcher) -> usize {
        let catchers = &mut self.try_blocks[id.0].catchers;
        catchers.push(catcher);
        catchers.len() - 1
    }

    /// Set the exception type of the catcher currently being visited
    /// (the last one appended to the block).
    pub fn set_top_catcher_type(&mut self, id: TryBlockId, exception_type: String) {
        let catchers = &mut self.try_blocks[id.0].catchers;
        debug_assert!(!catchers.is_empty(), "catch parameter outside any catcher");
        if let Some(catcher) = catchers.last_mut() {
            catcher.exception_type = Some(exception_type);
        }
    }

    pub fn record_thrower(&mut self, thrower: Thrower) -> ThrowerId {
        let id = ThrowerId(self.throwers.len());
        self.throwers.push(thrower);
        id
    }

    pub fn thrower(&self, id: ThrowerId) -> &Thrower {
        &self.throwers[id.0]
    }

    pub fn throwers(&self) -> &[Thrower] {
        &self.throwers
    }

    pub fn catcher(&self, catch: CatchRef) -> &Catcher {
        &self.try_blocks[catch.try_block.0].catchers[catch.catcher]
    }

    /// The type a thrower actually propagates: its own spelled type, or for
    /// a bare rethrow the type caught by the enclosing catch clause. Stays
    /// `None` (indeterminate) when the enclosing catch is a catch-all or
    /// when a rethrow has no enclosing catch at all.
    pub fn effective_throw_type(&self, thrower: &Thrower) -> Option<String> {
        if thrower.exception_type.is_some() {
            return thrower.exception_type.clone();
        }
        thrower
            .enclosing_catch
            .map(|catch| self.catcher(catch))
            .and_then(|catcher| catcher.exception_type.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    fn loc(line: u32) -> SourceLocation {
        SourceLocation::new("t.cpp", line, 1)
    }

    #[test]
    fn test_try_block_arena_handles_stay_valid() {
        let mut model = ExceptionModel::new();
        let outer = model.alloc_try_block(loc(1));
        let inner = model.alloc_try_block(loc(3));
        model.add_catcher(outer, Catcher::new(loc(10)));
        model.set_top_catcher_type(outer, "std::exception".to_string());

        assert_eq!(model.try_block(outer).location.line, 1);
        assert_eq!(model.try_block(inner).location.line, 3);
        assert_eq!(
            model.try_block(outer).catchers[0].exception_type.as_deref(),
            Some("std::exception")
        );
    }

    #[test]
    fn test_effective_type_of_plain_throw() {
        let model = ExceptionModel::new();
        let thrower = Thrower {
            function: SymbolId::new("f"),
            location: loc(5),
            try_stack: TryStack::new(),
            exception_type: Some("std::runtime_error".to_string()),
            enclosing_catch: None,
        };
        assert_eq!(
            model.effective_throw_type(&thrower).as_deref(),
            Some("std::runtime_error")
        );
    }

    #[test]
    fn test_rethrow_takes_enclosing_catch_type() {
        let mut model = ExceptionModel::new();
        let tb = model.alloc_try_block(loc(1));
        model.add_catcher(tb, Catcher::new(loc(4)));
        model.set_top_catcher_type(tb, "const std::logic_error &".to_string());

        let rethrow = Thrower {
            function: SymbolId::new("g"),
            location: loc(5),
            try_stack: smallvec![],
            exception_type: None,
            enclosing_catch: Some(CatchRef {
                try_block: tb,
                catcher: 0,
            }),
        };
        assert_eq!(
            model.effective_throw_type(&rethrow).as_deref(),
            Some("const std::logic_error &")
        );
    }

    #[test]
    fn test_rethrow_inside_catch_all_stays_indeterminate() {
        let mut model = ExceptionModel::new();
        let tb = model.alloc_try_block(loc(1));
        model.add_catcher(tb, Catcher::new(loc(4)));

        let rethrow = Thrower {
            function: SymbolId::new("g"),
            location: loc(5),
            try_stack: smallvec![],
            exception_type: None,
            enclosing_catch: Some(CatchRef {
                try_block: tb,
                catcher: 0,
            }),
        };
        assert_eq!(model.effective_throw_type(&rethrow), None);
    }
}
