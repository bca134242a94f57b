//! Reports
//!
//! Consumer-facing rendering of the call graph and the throw trees: plain
//! text for terminals, serde types for JSON output, plus the raw AST dump
//! used for debugging the frontend.

use std::io::{self, Write};

use serde::{Deserialize, Serialize};

use crate::ast::{AstNode, SourceLocation, SymbolId};
use crate::call_graph::CallGraph;
use crate::exceptions::{ExceptionModel, TryStack};
use crate::throw_tree::{ThrowLeaf, ThrowTree, ThrowTreeNode};

/// One function's view of the call graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionReport {
    pub symbol: SymbolId,
    pub defined_at: Option<SourceLocation>,
    pub callers: Vec<EdgeReport>,
    pub calls: Vec<EdgeReport>,
}

/// One call edge with its try-block context resolved to locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeReport {
    pub peer: SymbolId,
    pub location: SourceLocation,
    pub try_blocks: Vec<SourceLocation>,
}

/// The whole call graph, in indexing order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallGraphReport {
    pub functions: Vec<FunctionReport>,
}

/// One throw site with its resolved propagation leaves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThrowSiteReport {
    pub location: SourceLocation,
    /// Effective thrown type; `None` when an unresolved rethrow.
    pub thrown_type: Option<String>,
    pub leaves: Vec<ThrowLeaf>,
}

/// Build the serializable call-graph report.
pub fn call_graph_report(graph: &CallGraph, exceptions: &ExceptionModel) -> CallGraphReport {
    let edge = |edge: &crate::call_graph::CallEdge| EdgeReport {
        peer: graph.symbol(edge.peer).clone(),
        location: edge.location.clone(),
        try_blocks: try_block_locations(exceptions, &edge.try_stack),
    };
    CallGraphReport {
        functions: graph
            .iter()
            .map(|(_, node)| FunctionReport {
                symbol: node.symbol.clone(),
                defined_at: node.decl.as_ref().map(|d| d.location.clone()),
                callers: node.callers.iter().map(edge).collect(),
                calls: node.calls.iter().map(edge).collect(),
            })
            .collect(),
    }
}

/// Build the serializable throw report.
pub fn throw_site_reports(trees: &[ThrowTree]) -> Vec<ThrowSiteReport> {
    trees
        .iter()
        .map(|tree| ThrowSiteReport {
            location: tree.location.clone(),
            thrown_type: tree.thrown_type.clone(),
            leaves: tree.leaves.clone(),
        })
        .collect()
}

/// Text dump of the call graph: per function, its definition site, then
/// callers and calls with try-block context.
pub fn write_call_graph<W: Write>(
    w: &mut W,
    graph: &CallGraph,
    exceptions: &ExceptionModel,
) -> io::Result<()> {
    for (_, node) in graph.iter() {
        writeln!(w, "node: {}", node.symbol)?;
        match &node.decl {
            Some(decl) => writeln!(w, "  defined at {}", decl.location)?,
            None => writeln!(w, "  (no definition indexed)")?,
        }
        for edge in &node.callers {
            writeln!(
                w,
                "  caller: {} at {}{}",
                graph.symbol(edge.peer),
                edge.location,
                try_suffix(exceptions, &edge.try_stack)
            )?;
        }
        for edge in &node.calls {
            writeln!(
                w,
                "  calls:  {} at {}{}",
                graph.symbol(edge.peer),
                edge.location,
                try_suffix(exceptions, &edge.try_stack)
            )?;
        }
    }
    Ok(())
}

/// Text dump of throw sites and their leaves.
pub fn write_throw_report<W: Write>(w: &mut W, trees: &[ThrowTree]) -> io::Result<()> {
    for tree in trees {
        writeln!(
            w,
            "throw at {} : {}",
            tree.location,
            tree.thrown_type.as_deref().unwrap_or("<unresolved rethrow>")
        )?;
        for leaf in &tree.leaves {
            writeln!(w, "  {}", leaf_line(leaf))?;
        }
        if tree.leaves.is_empty() {
            writeln!(w, "  (every path cut at a recursive cycle)")?;
        }
    }
    Ok(())
}

/// Text dump of the full propagation trees, one indented path per line.
pub fn write_throw_trees<W: Write>(w: &mut W, trees: &[ThrowTree]) -> io::Result<()> {
    for tree in trees {
        writeln!(
            w,
            "throw at {} : {}",
            tree.location,
            tree.thrown_type.as_deref().unwrap_or("<unresolved rethrow>")
        )?;
        write_tree_node(w, &tree.root, 1)?;
    }
    Ok(())
}

fn write_tree_node<W: Write>(w: &mut W, node: &ThrowTreeNode, depth: usize) -> io::Result<()> {
    write!(w, "{}{} at {}", "  ".repeat(depth), node.function, node.location)?;
    match &node.leaf {
        Some(leaf) => writeln!(w, " -> {}", leaf_line(leaf))?,
        None => writeln!(w)?,
    }
    for child in &node.children {
        write_tree_node(w, child, depth + 1)?;
    }
    Ok(())
}

/// Indented dump of the lowered AST, for frontend debugging.
pub fn write_ast<W: Write>(w: &mut W, node: &AstNode) -> io::Result<()> {
    write_ast_node(w, node, 0)
}

fn write_ast_node<W: Write>(w: &mut W, node: &AstNode, depth: usize) -> io::Result<()> {
    writeln!(
        w,
        "{}{}:{}:{}",
        " ".repeat(depth),
        node.kind.name(),
        node.spelling,
        node.location
    )?;
    for child in &node.children {
        write_ast_node(w, child, depth + 1)?;
    }
    Ok(())
}

fn leaf_line(leaf: &ThrowLeaf) -> String {
    match leaf {
        ThrowLeaf::Caught {
            location,
            exception_type,
            ..
        } => format!(
            "caught by catch ({}) at {}",
            exception_type.as_deref().unwrap_or("..."),
            location
        ),
        ThrowLeaf::Uncaught { function } => format!("uncaught (escapes through {})", function),
        ThrowLeaf::Indeterminate { function } => {
            format!("indeterminate in {} (unresolved rethrow)", function)
        }
    }
}

fn try_block_locations(exceptions: &ExceptionModel, stack: &TryStack) -> Vec<SourceLocation> {
    stack
        .iter()
        .map(|&id| exceptions.try_block(id).location.clone())
        .collect()
}

fn try_suffix(exceptions: &ExceptionModel, stack: &TryStack) -> String {
    if stack.is_empty() {
        return String::new();
    }
    let locations: Vec<String> = try_block_locations(exceptions, stack)
        .iter()
        .map(ToString::to_string)
        .collect();
    format!(" [in try at {}]", locations.join(" > "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    use crate::exceptions::Catcher;

    fn loc(line: u32) -> SourceLocation {
        SourceLocation::new("t.cpp", line, 1)
    }

    #[test]
    fn test_call_graph_text_includes_try_context() {
        let mut graph = CallGraph::new();
        let mut exceptions = ExceptionModel::new();
        let tb = exceptions.alloc_try_block(loc(5));
        exceptions.add_catcher(tb, Catcher::new(loc(7)));
        graph.record_call(
            SymbolId::new("g"),
            SymbolId::new("f"),
            loc(6),
            smallvec![tb],
        );

        let mut out = Vec::new();
        write_call_graph(&mut out, &graph, &exceptions).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("node: g"));
        assert!(text.contains("calls:  f at t.cpp:6:1 [in try at t.cpp:5:1]"));
        assert!(text.contains("caller: g at t.cpp:6:1"));
    }

    #[test]
    fn test_sentinel_symbols_render_distinctly() {
        let mut graph = CallGraph::new();
        let exceptions = ExceptionModel::new();
        graph.record_call(
            SymbolId::global_scope(),
            SymbolId::unresolved(),
            loc(1),
            TryStack::new(),
        );

        let mut out = Vec::new();
        write_call_graph(&mut out, &graph, &exceptions).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("node: <global-scope>"));
        assert!(text.contains("calls:  <unresolved>"));
    }

    #[test]
    fn test_throw_report_lines() {
        let trees = vec![ThrowTree {
            thrower: crate::exceptions::ThrowerId(0),
            location: loc(3),
            thrown_type: Some("E".to_string()),
            root: ThrowTreeNode::new(SymbolId::new("f"), loc(3)),
            leaves: vec![ThrowLeaf::Uncaught {
                function: SymbolId::new("f"),
            }],
        }];

        let mut out = Vec::new();
        write_throw_report(&mut out, &trees).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("throw at t.cpp:3:1 : E"));
        assert!(text.contains("uncaught (escapes through f)"));
    }

    #[test]
    fn test_json_report_round_trips() {
        let mut graph = CallGraph::new();
        let exceptions = ExceptionModel::new();
        graph
            .declare(SymbolId::new("f"), loc(1))
            .unwrap();

        let report = call_graph_report(&graph, &exceptions);
        let json = serde_json::to_string(&report).unwrap();
        let parsed: CallGraphReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.functions.len(), 1);
        assert_eq!(parsed.functions[0].symbol, SymbolId::new("f"));
    }
}
