//! Catch-clause type matching
//!
//! The traversal algorithm never compares types itself; it asks a
//! `TypeMatcher`. The shipped matcher compares normalized spellings, which
//! handles the common exact-type catch. Base-class catching or
//! reference/value compatibility can be supplied by a stricter
//! implementation without touching the tree builder.

use serde::{Deserialize, Serialize};

use super::types::Catcher;

/// Pluggable type-compatibility predicate: does a handler declared as
/// `caught` accept an exception of static type `thrown`?
pub trait TypeMatcher: Sync {
    fn matches(&self, caught: &str, thrown: &str) -> bool;
}

/// Outcome of resolving one thrown type against one catcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatchOutcome {
    /// The catcher handles this exception.
    Caught,
    /// The catcher does not handle it; propagation continues.
    Propagates,
    /// Cannot be decided: a typed catcher against an unresolved rethrow
    /// type. Never silently treated as a match.
    Indeterminate,
}

/// Matcher comparing type spellings after stripping cv-qualifiers,
/// references, and spacing. `catch (const std::exception &)` matches a
/// `throw std::exception(...)`; derived-to-base catches do not match.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpelledTypeMatcher;

impl TypeMatcher for SpelledTypeMatcher {
    fn matches(&self, caught: &str, thrown: &str) -> bool {
        normalize_type(caught) == normalize_type(thrown)
    }
}

/// Reduce a type spelling to its bare form: drop `const`/`volatile`
/// tokens, `&`/`&&` declarators, and whitespace differences.
pub fn normalize_type(spelling: &str) -> String {
    let stripped = spelling.replace('&', " ");
    stripped
        .split_whitespace()
        .filter(|token| *token != "const" && *token != "volatile")
        .collect::<Vec<_>>()
        .join(" ")
}

/// Resolve one catcher against a thrown type (`None` = indeterminate
/// rethrow). Catch-all handlers accept anything, known or not.
pub fn resolve_catch(
    catcher: &Catcher,
    thrown: Option<&str>,
    matcher: &dyn TypeMatcher,
) -> CatchOutcome {
    match (catcher.exception_type.as_deref(), thrown) {
        (None, _) => CatchOutcome::Caught,
        (Some(_), None) => CatchOutcome::Indeterminate,
        (Some(caught), Some(thrown)) => {
            if matcher.matches(caught, thrown) {
                CatchOutcome::Caught
            } else {
                CatchOutcome::Propagates
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::SourceLocation;

    fn catcher(exception_type: Option<&str>) -> Catcher {
        Catcher {
            location: SourceLocation::new("t.cpp", 1, 1),
            exception_type: exception_type.map(str::to_string),
        }
    }

    #[test]
    fn test_normalize_strips_qualifiers_and_refs() {
        assert_eq!(normalize_type("const std::exception &"), "std::exception");
        assert_eq!(normalize_type("std::exception&"), "std::exception");
        assert_eq!(normalize_type("volatile int"), "int");
        assert_eq!(normalize_type("my::Error &&"), "my::Error");
    }

    #[test]
    fn test_spelled_matcher_is_exact_after_normalization() {
        let m = SpelledTypeMatcher;
        assert!(m.matches("const std::exception &", "std::exception"));
        assert!(!m.matches("std::exception", "std::runtime_error"));
    }

    #[test]
    fn test_catch_all_accepts_unknown_type() {
        let m = SpelledTypeMatcher;
        assert_eq!(resolve_catch(&catcher(None), None, &m), CatchOutcome::Caught);
        assert_eq!(
            resolve_catch(&catcher(None), Some("E"), &m),
            CatchOutcome::Caught
        );
    }

    #[test]
    fn test_typed_catcher_against_unknown_is_indeterminate() {
        let m = SpelledTypeMatcher;
        assert_eq!(
            resolve_catch(&catcher(Some("std::exception")), None, &m),
            CatchOutcome::Indeterminate
        );
    }

    #[test]
    fn test_typed_catcher_mismatch_propagates() {
        let m = SpelledTypeMatcher;
        assert_eq!(
            resolve_catch(&catcher(Some("A")), Some("B"), &m),
            CatchOutcome::Propagates
        );
    }
}
