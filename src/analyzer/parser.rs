//! Tree-sitter-based TypeScript parsing (spec §4.A).
//!
//! Grounded on the teacher's `server/semantic_analyzer.rs`, which walks a
//! `tree_sitter::Tree` with a cursor to pull out named constructs without
//! ever evaluating the source. This module does the same thing against
//! the TypeScript grammar instead of Rust's: find the default-exported
//! class, its constructor parameters, and its public methods. Everything
//! of interest is copied out of the tree before `parse_class` returns, so
//! callers never have to carry tree-sitter lifetimes around.

use tree_sitter::{Node, Parser};

use super::docblock::{parse_docblock, ParsedDocblock};
use super::error::AnalyzerError;
use super::schema::{split_object_properties, PropertySig};

pub struct RawMethod {
    pub name: String,
    pub doc: ParsedDocblock,
    pub object_param_type_text: Option<String>,
}

pub struct RawConstructorParam {
    pub name: String,
    pub type_text: String,
    pub optional: bool,
    pub default_symbolic: Option<String>,
}

pub struct RawClass {
    pub name: String,
    pub doc: ParsedDocblock,
    pub constructor_params: Vec<RawConstructorParam>,
    pub methods: Vec<RawMethod>,
}

fn make_parser() -> Parser {
    let mut parser = Parser::new();
    let language: tree_sitter::Language = tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into();
    parser
        .set_language(&language)
        .expect("tree-sitter-typescript grammar loads");
    parser
}

/// Text of the comment node immediately preceding `node` among its
/// siblings, if any — tree-sitter attaches comments as extra sibling
/// nodes rather than as children of the thing they document.
fn leading_docblock(node: Node, source: &str) -> ParsedDocblock {
    let mut sibling = node.prev_sibling();
    while let Some(s) = sibling {
        if s.kind() == "comment" {
            let text = s.utf8_text(source.as_bytes()).unwrap_or("");
            if text.starts_with("/**") {
                return parse_docblock(text);
            }
            return ParsedDocblock::default();
        }
        break;
    }
    ParsedDocblock::default()
}

fn find_default_export_class(root: Node) -> Option<Node> {
    let mut cursor = root.walk();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.kind() == "class_declaration" {
            if let Some(parent) = node.parent() {
                if parent.kind() == "export_statement" {
                    return Some(node);
                }
            }
        }
        for child in node.children(&mut cursor) {
            stack.push(child);
        }
    }
    None
}

fn class_name(class_node: Node, source: &str) -> Option<String> {
    class_node
        .child_by_field_name("name")
        .and_then(|n| n.utf8_text(source.as_bytes()).ok())
        .map(|s| s.to_string())
}

fn constructor_params(class_node: Node, source: &str) -> Vec<RawConstructorParam> {
    let body = match class_node.child_by_field_name("body") {
        Some(b) => b,
        None => return Vec::new(),
    };

    let mut cursor = body.walk();
    for member in body.children(&mut cursor) {
        if member.kind() != "method_definition" {
            continue;
        }
        let name = member
            .child_by_field_name("name")
            .and_then(|n| n.utf8_text(source.as_bytes()).ok())
            .unwrap_or("");
        if name != "constructor" {
            continue;
        }

        let params_node = match member.child_by_field_name("parameters") {
            Some(p) => p,
            None => return Vec::new(),
        };
        let mut out = Vec::new();
        let mut pc = params_node.walk();
        for param in params_node.children(&mut pc) {
            if !matches!(param.kind(), "required_parameter" | "optional_parameter") {
                continue;
            }
            let optional = param.kind() == "optional_parameter";
            let pname = param
                .child_by_field_name("pattern")
                .and_then(|p| p.utf8_text(source.as_bytes()).ok())
                .unwrap_or("")
                .trim_start_matches("public ")
                .trim_start_matches("private ")
                .trim_start_matches("readonly ")
                .to_string();
            let type_text = param
                .child_by_field_name("type")
                .and_then(|t| t.utf8_text(source.as_bytes()).ok())
                .unwrap_or(": any")
                .trim_start_matches(':')
                .trim()
                .to_string();
            let default_symbolic = param
                .child_by_field_name("value")
                .and_then(|v| v.utf8_text(source.as_bytes()).ok())
                .map(|s| s.to_string());
            out.push(RawConstructorParam {
                name: pname,
                type_text,
                optional,
                default_symbolic,
            });
        }
        return out;
    }
    Vec::new()
}

fn is_private_method(member: Node, source: &str) -> bool {
    let mut cursor = member.walk();
    member.children(&mut cursor).any(|c| {
        c.kind() == "accessibility_modifier"
            && c.utf8_text(source.as_bytes()) == Ok("private")
    })
}

fn public_methods(class_node: Node, source: &str) -> Vec<RawMethod> {
    let body = match class_node.child_by_field_name("body") {
        Some(b) => b,
        None => return Vec::new(),
    };

    let mut methods = Vec::new();
    let mut cursor = body.walk();
    for member in body.children(&mut cursor) {
        if member.kind() != "method_definition" {
            continue;
        }
        let name = match member
            .child_by_field_name("name")
            .and_then(|n| n.utf8_text(source.as_bytes()).ok())
        {
            Some(n) => n.to_string(),
            None => continue,
        };
        if name == "constructor" || name.starts_with('_') || is_private_method(member, source) {
            continue;
        }

        let doc = leading_docblock(member, source);

        let object_param_type_text = member
            .child_by_field_name("parameters")
            .and_then(|params| {
                let mut pc = params.walk();
                params
                    .children(&mut pc)
                    .find(|p| matches!(p.kind(), "required_parameter" | "optional_parameter"))
            })
            .and_then(|first_param| first_param.child_by_field_name("type"))
            .and_then(|t| t.utf8_text(source.as_bytes()).ok())
            .map(|s| s.trim_start_matches(':').trim().to_string());

        methods.push(RawMethod {
            name,
            doc,
            object_param_type_text,
        });
    }
    methods
}

fn first_error_node(node: Node) -> Option<Node> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if let Some(found) = first_error_node(child) {
            return Some(found);
        }
    }
    None
}

/// Parses `source` and extracts the default-exported class, or fails with
/// a span-carrying [`AnalyzerError`].
pub fn parse_class(source: &str) -> Result<RawClass, AnalyzerError> {
    let mut parser = make_parser();
    let tree = parser
        .parse(source, None)
        .ok_or(AnalyzerError::SyntaxError(0, source.len(), 1))?;

    let root = tree.root_node();
    if root.has_error() {
        let node = first_error_node(root).unwrap_or(root);
        let start = node.start_position();
        return Err(AnalyzerError::SyntaxError(
            node.start_byte(),
            node.end_byte(),
            start.row + 1,
        ));
    }

    let class_node = find_default_export_class(root).ok_or(AnalyzerError::MissingDefaultExport)?;
    let name = class_name(class_node, source)
        .ok_or_else(|| AnalyzerError::UnsupportedConstructor("<anonymous>".to_string()))?;
    let doc = leading_docblock(class_node.parent().unwrap_or(class_node), source);
    let constructor_params = constructor_params(class_node, source);
    let methods = public_methods(class_node, source);

    Ok(RawClass {
        name,
        doc,
        constructor_params,
        methods,
    })
}

/// The properties of a method's single object-typed parameter, e.g.
/// `{ message: string }` → `[message: string]`.
pub fn object_param_properties(type_text: &str) -> Vec<PropertySig> {
    let t = type_text.trim();
    if t.starts_with('{') && t.ends_with('}') {
        split_object_properties(&t[1..t.len() - 1])
    } else {
        Vec::new()
    }
}
