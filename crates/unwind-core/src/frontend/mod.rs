//! C++ Frontend
//!
//! Turns C++ source text into the lowered AST the indexer consumes, using
//! native tree-sitter parsing. No compilation database or compiler flags
//! are involved: tree-sitter parses each file standalone and tolerates
//! missing headers, so every source file is one translation unit.
//!
//! Symbol identity is the fully qualified spelled name built from lexical
//! namespace/class nesting. That is a deliberate approximation of
//! compiler-grade symbol resolution: calls through object expressions
//! resolve to the bare method name, and unqualified calls are taken as
//! written.

mod cpp;

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

pub use cpp::CppFrontend;

/// Frontend failures. Per-file errors carry the offending path so callers
/// can report and continue with the remaining files.
#[derive(Debug, thiserror::Error)]
pub enum FrontendError {
    #[error("failed to load the C++ grammar: {0}")]
    Language(String),

    #[error("{path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}: parser produced no syntax tree")]
    Parse { path: String },
}

const CPP_EXTENSIONS: &[&str] = &["cpp", "cc", "cxx", "h", "hpp", "hh", "hxx"];

/// Collect C++ sources under a root, recursively, in a stable
/// (path-sorted) order.
pub fn collect_cpp_sources(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| CPP_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        })
        .collect();
    files.sort();
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_collect_cpp_sources_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.cpp"), "int b;").unwrap();
        fs::write(dir.path().join("a.cc"), "int a;").unwrap();
        fs::write(dir.path().join("notes.txt"), "not code").unwrap();
        fs::create_dir(dir.path().join("inc")).unwrap();
        fs::write(dir.path().join("inc/x.hpp"), "int x;").unwrap();

        let files = collect_cpp_sources(dir.path());
        let names: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.cc", "b.cpp", "inc/x.hpp"]);
    }
}
