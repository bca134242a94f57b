//! C++ lowering using native tree-sitter
//!
//! Walks the tree-sitter CST and lowers the constructs the analysis cares
//! about (function definitions, calls, try/catch, throw) to `AstNode`s,
//! keeping everything else as `Other` nodes so the tree shape and the AST
//! dump stay faithful to the source.

use std::path::Path;

use tree_sitter::{Node, Parser};

use crate::ast::{AstNode, NodeKind, SourceLocation, SymbolId, TranslationUnit};

use super::FrontendError;

/// C++ parser and lowering pass.
pub struct CppFrontend {
    parser: Parser,
}

impl CppFrontend {
    pub fn new() -> Result<Self, FrontendError> {
        let mut parser = Parser::new();
        let language = tree_sitter_cpp::LANGUAGE;
        parser
            .set_language(&language.into())
            .map_err(|e| FrontendError::Language(e.to_string()))?;
        Ok(Self { parser })
    }

    /// Read and lower one file.
    pub fn parse_file(&mut self, path: &Path) -> Result<TranslationUnit, FrontendError> {
        let display = path.to_string_lossy().to_string();
        let source = std::fs::read_to_string(path).map_err(|source| FrontendError::Io {
            path: display.clone(),
            source,
        })?;
        self.parse_source(&display, &source)
    }

    /// Lower one source buffer into a translation unit. Sources with
    /// syntax errors still produce a tree (tree-sitter is error-tolerant)
    /// and are indexed best-effort.
    pub fn parse_source(
        &mut self,
        path: &str,
        source: &str,
    ) -> Result<TranslationUnit, FrontendError> {
        let tree = self
            .parser
            .parse(source, None)
            .ok_or_else(|| FrontendError::Parse {
                path: path.to_string(),
            })?;
        let mut scope = Vec::new();
        let root = lower(tree.root_node(), source.as_bytes(), path, &mut scope);
        Ok(TranslationUnit {
            path: path.to_string(),
            root,
        })
    }
}

/// Lower one CST node (and its named descendants).
fn lower(node: Node, source: &[u8], path: &str, scope: &mut Vec<String>) -> AstNode {
    match node.kind() {
        "function_definition" => lower_function(node, source, path, scope),
        "call_expression" => lower_call(node, source, path, scope),
        "try_statement" => lower_plain(node, NodeKind::TryStmt, source, path, scope),
        "catch_clause" => lower_catch(node, source, path, scope),
        "throw_statement" => lower_throw(node, source, path, scope),
        "declaration" => {
            let mut ast = AstNode::new(NodeKind::VarDecl, location(node, path));
            if let Some(ty) = node.child_by_field_name("type") {
                ast.spelling = text(ty, source).to_string();
            }
            lower_children(node, source, path, scope, &mut ast);
            ast
        }
        "namespace_definition" => {
            let name = node
                .child_by_field_name("name")
                .map(|n| text(n, source).to_string());
            let mut ast = other(node, path);
            match name {
                Some(name) if !name.is_empty() => {
                    scope.push(name);
                    lower_children(node, source, path, scope, &mut ast);
                    scope.pop();
                }
                // Anonymous namespaces add no scope component.
                _ => lower_children(node, source, path, scope, &mut ast),
            }
            ast
        }
        "class_specifier" | "struct_specifier" => {
            let mut ast = other(node, path);
            let name = node
                .child_by_field_name("name")
                .map(|n| text(n, source).to_string());
            match (name, node.child_by_field_name("body")) {
                (Some(name), Some(_)) if !name.is_empty() => {
                    scope.push(name);
                    lower_children(node, source, path, scope, &mut ast);
                    scope.pop();
                }
                _ => lower_children(node, source, path, scope, &mut ast),
            }
            ast
        }
        _ => {
            let mut ast = other(node, path);
            lower_children(node, source, path, scope, &mut ast);
            ast
        }
    }
}

fn lower_children(
    node: Node,
    source: &[u8],
    path: &str,
    scope: &mut Vec<String>,
    parent: &mut AstNode,
) {
    for i in 0..node.named_child_count() {
        if let Some(child) = node.named_child(i) {
            parent.children.push(lower(child, source, path, scope));
        }
    }
}

fn lower_plain(
    node: Node,
    kind: NodeKind,
    source: &[u8],
    path: &str,
    scope: &mut Vec<String>,
) -> AstNode {
    let mut ast = AstNode::new(kind, location(node, path));
    lower_children(node, source, path, scope, &mut ast);
    ast
}

fn lower_function(node: Node, source: &[u8], path: &str, scope: &mut Vec<String>) -> AstNode {
    let mut ast = AstNode::new(NodeKind::FunctionDecl, location(node, path));
    if let Some(name) = function_name(node, source) {
        let qualified = qualify(scope, &name);
        ast.spelling = qualified.clone();
        ast.referenced = Some(SymbolId::new(qualified));
    }
    lower_children(node, source, path, scope, &mut ast);
    ast
}

fn lower_call(node: Node, source: &[u8], path: &str, scope: &mut Vec<String>) -> AstNode {
    let mut ast = AstNode::new(NodeKind::CallExpr, location(node, path));
    if let Some(callee) = callee_name(node, source) {
        ast.spelling = callee.clone();
        ast.referenced = Some(SymbolId::new(callee));
    }
    lower_children(node, source, path, scope, &mut ast);
    ast
}

fn lower_catch(node: Node, source: &[u8], path: &str, scope: &mut Vec<String>) -> AstNode {
    let mut ast = AstNode::new(NodeKind::CatchClause, location(node, path));
    // A typed handler gets a synthetic VarDecl child carrying the declared
    // exception type; `catch (...)` gets none.
    if let Some(params) = node.child_by_field_name("parameters") {
        let mut cursor = params.walk();
        for param in params.named_children(&mut cursor) {
            if param.kind() == "parameter_declaration" {
                let mut var = AstNode::new(NodeKind::VarDecl, location(param, path));
                var.spelling = parameter_type(param, source);
                ast.children.push(var);
            }
        }
    }
    if let Some(body) = node.child_by_field_name("body") {
        ast.children.push(lower(body, source, path, scope));
    }
    ast
}

fn lower_throw(node: Node, source: &[u8], path: &str, scope: &mut Vec<String>) -> AstNode {
    let mut ast = AstNode::new(NodeKind::ThrowExpr, location(node, path));
    ast.spelling = thrown_type(node, source);
    lower_children(node, source, path, scope, &mut ast);
    ast
}

/// Name of a function definition: descend through pointer/reference
/// declarators to the function declarator, then take its declarator
/// spelling (identifier, qualified name, operator, or destructor).
fn function_name(node: Node, source: &[u8]) -> Option<String> {
    let mut declarator = node.child_by_field_name("declarator")?;
    while declarator.kind() != "function_declarator" {
        declarator = declarator.child_by_field_name("declarator")?;
    }
    let name = declarator.child_by_field_name("declarator")?;
    let spelled = text(name, source).trim().to_string();
    (!spelled.is_empty()).then_some(spelled)
}

/// Spelled call target. Member calls resolve to the bare method name;
/// callees with no spellable name (calls through arbitrary expressions)
/// return `None` and are recorded under the unresolved sentinel.
fn callee_name(node: Node, source: &[u8]) -> Option<String> {
    let function = node.child_by_field_name("function")?;
    let name = match function.kind() {
        "identifier" | "qualified_identifier" => text(function, source).to_string(),
        "field_expression" => {
            let field = function.child_by_field_name("field")?;
            text(field, source).to_string()
        }
        "template_function" => {
            let name = function.child_by_field_name("name")?;
            text(name, source).to_string()
        }
        _ => return None,
    };
    let name: String = name.split_whitespace().collect();
    (!name.is_empty()).then_some(name)
}

/// Declared type of a catch parameter: the parameter text with the bound
/// name spliced out (`const std::exception &e` → `const std::exception &`).
fn parameter_type(param: Node, source: &[u8]) -> String {
    let full = text(param, source);
    let base = param.start_byte();
    if let Some(name) = declarator_identifier(param.child_by_field_name("declarator")) {
        let start = name.start_byte() - base;
        let end = name.end_byte() - base;
        let mut spelled = String::with_capacity(full.len());
        spelled.push_str(&full[..start]);
        spelled.push_str(&full[end..]);
        spelled.trim().to_string()
    } else {
        full.trim().to_string()
    }
}

/// The identifier bound by a declarator, if any (unnamed catch parameters
/// have none).
fn declarator_identifier(declarator: Option<Node>) -> Option<Node> {
    let mut current = declarator?;
    loop {
        if current.kind() == "identifier" {
            return Some(current);
        }
        match current.child_by_field_name("declarator") {
            Some(inner) => current = inner,
            None => {
                // Reference/pointer declarators keep the identifier as a
                // plain named child.
                let mut cursor = current.walk();
                let found = current
                    .named_children(&mut cursor)
                    .find(|c| c.kind() == "identifier");
                return found;
            }
        }
    }
}

/// Best-effort static type of a thrown expression: the constructor name
/// for `throw T(...)` / `throw T{...}`, the raw expression text otherwise,
/// empty for the bare rethrow `throw;`.
fn thrown_type(node: Node, source: &[u8]) -> String {
    let Some(operand) = node.named_child(0) else {
        return String::new();
    };
    let spelled = match operand.kind() {
        "call_expression" => operand
            .child_by_field_name("function")
            .map(|f| text(f, source).to_string())
            .unwrap_or_default(),
        "compound_literal_expression" => operand
            .child_by_field_name("type")
            .map(|t| text(t, source).to_string())
            .unwrap_or_default(),
        _ => text(operand, source).to_string(),
    };
    spelled.split_whitespace().collect()
}

fn qualify(scope: &[String], name: &str) -> String {
    if scope.is_empty() {
        name.to_string()
    } else {
        format!("{}::{}", scope.join("::"), name)
    }
}

fn other(node: Node, path: &str) -> AstNode {
    let mut ast = AstNode::new(NodeKind::Other, location(node, path));
    ast.spelling = node.kind().to_string();
    ast
}

fn location(node: Node, path: &str) -> SourceLocation {
    let pos = node.start_position();
    SourceLocation::new(path, pos.row as u32 + 1, pos.column as u32 + 1)
}

fn text<'a>(node: Node, source: &'a [u8]) -> &'a str {
    node.utf8_text(source).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> TranslationUnit {
        let mut frontend = CppFrontend::new().unwrap();
        frontend.parse_source("test.cpp", source).unwrap()
    }

    fn collect<'a>(node: &'a AstNode, kind: NodeKind, out: &mut Vec<&'a AstNode>) {
        if node.kind == kind {
            out.push(node);
        }
        for child in &node.children {
            collect(child, kind, out);
        }
    }

    fn find(unit: &TranslationUnit, kind: NodeKind) -> Vec<&AstNode> {
        let mut out = Vec::new();
        collect(&unit.root, kind, &mut out);
        out
    }

    #[test]
    fn test_parse_function() {
        let unit = parse("int main() { return 0; }");
        let funcs = find(&unit, NodeKind::FunctionDecl);
        assert_eq!(funcs.len(), 1);
        assert_eq!(funcs[0].spelling, "main");
        assert_eq!(funcs[0].referenced, Some(SymbolId::new("main")));
        assert_eq!(funcs[0].location.line, 1);
    }

    #[test]
    fn test_namespace_qualifies_function_names() {
        let unit = parse("namespace ns { namespace detail { void f() {} } }");
        let funcs = find(&unit, NodeKind::FunctionDecl);
        assert_eq!(funcs.len(), 1);
        assert_eq!(funcs[0].spelling, "ns::detail::f");
    }

    #[test]
    fn test_inline_method_gets_class_scope() {
        let unit = parse("struct Widget { void draw() {} };");
        let funcs = find(&unit, NodeKind::FunctionDecl);
        assert_eq!(funcs.len(), 1);
        assert_eq!(funcs[0].spelling, "Widget::draw");
    }

    #[test]
    fn test_out_of_line_method_keeps_spelled_scope() {
        let unit = parse("void Widget::draw() {}");
        let funcs = find(&unit, NodeKind::FunctionDecl);
        assert_eq!(funcs[0].spelling, "Widget::draw");
    }

    #[test]
    fn test_prototype_is_not_a_function_decl() {
        let unit = parse("void f();");
        assert!(find(&unit, NodeKind::FunctionDecl).is_empty());
    }

    #[test]
    fn test_call_targets() {
        let unit = parse(
            "void f() { g(); std::abort(); obj.update(); }",
        );
        let calls = find(&unit, NodeKind::CallExpr);
        let targets: Vec<_> = calls
            .iter()
            .map(|c| c.referenced.as_ref().unwrap().as_str())
            .collect();
        assert_eq!(targets, vec!["g", "std::abort", "update"]);
    }

    #[test]
    fn test_try_catch_lowering() {
        let unit = parse(
            "void f() { try { g(); } catch (const std::exception &e) {} catch (...) {} }",
        );
        let tries = find(&unit, NodeKind::TryStmt);
        assert_eq!(tries.len(), 1);
        let catches = find(&unit, NodeKind::CatchClause);
        assert_eq!(catches.len(), 2);

        // Typed handler carries its type through a synthetic VarDecl child.
        let first: Vec<_> = catches[0]
            .children
            .iter()
            .filter(|c| c.kind == NodeKind::VarDecl)
            .collect();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].spelling, "const std::exception &");

        // Catch-all has no VarDecl child.
        assert!(catches[1]
            .children
            .iter()
            .all(|c| c.kind != NodeKind::VarDecl));
    }

    #[test]
    fn test_unnamed_catch_parameter_keeps_type() {
        let unit = parse("void f() { try {} catch (const std::exception &) {} }");
        let catches = find(&unit, NodeKind::CatchClause);
        let var = catches[0]
            .children
            .iter()
            .find(|c| c.kind == NodeKind::VarDecl)
            .unwrap();
        assert_eq!(var.spelling, "const std::exception &");
    }

    #[test]
    fn test_throw_spellings() {
        let unit = parse(
            r#"void f() {
                throw std::runtime_error("boom");
                throw Error{1};
                throw code;
            }"#,
        );
        let throws = find(&unit, NodeKind::ThrowExpr);
        let spellings: Vec<_> = throws.iter().map(|t| t.spelling.as_str()).collect();
        assert_eq!(spellings, vec!["std::runtime_error", "Error", "code"]);
    }

    #[test]
    fn test_bare_rethrow_has_empty_spelling() {
        let unit = parse("void f() { try {} catch (...) { throw; } }");
        let throws = find(&unit, NodeKind::ThrowExpr);
        assert_eq!(throws.len(), 1);
        assert!(throws[0].spelling.is_empty());
    }

    #[test]
    fn test_call_inside_throw_operand_is_lowered() {
        let unit = parse("void f() { throw make_error(); }");
        let calls = find(&unit, NodeKind::CallExpr);
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].referenced, Some(SymbolId::new("make_error")));
    }
}
