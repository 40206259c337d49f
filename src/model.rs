//! Shared data model (spec §3): the shapes produced by the analyzer and
//! carried through the loader, the instance, and the protocol core.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How a tool's return value should be rendered by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Text,
    Json,
    Markdown,
    Html,
}

impl Default for OutputFormat {
    fn default() -> Self {
        OutputFormat::Text
    }
}

/// Flags carried on a tool, derived from docblock tags (spec §4.A).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolFlags {
    pub autorun: bool,
    pub is_static: bool,
    pub internal: bool,
}

/// One exposed member of a photon: a tool, a prompt, or a resource.
///
/// Spec §9 calls for a tagged union rather than a class hierarchy for the
/// three kinds — this is that union.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ExposedMember {
    Tool(Tool),
    Prompt(Tool),
    Resource(Resource),
}

impl ExposedMember {
    pub fn method_name(&self) -> &str {
        match self {
            ExposedMember::Tool(t) | ExposedMember::Prompt(t) => &t.method_name,
            ExposedMember::Resource(r) => &r.method_name,
        }
    }
}

/// A tool (or, reused verbatim, a prompt — spec §3 says they share a shape).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tool {
    /// The bare method name on the user class, e.g. `echo`.
    pub method_name: String,
    /// Full protocol name: `{photonName}/{methodName}`.
    pub name: String,
    pub description: String,
    pub input_schema: Value,
    pub output_format: OutputFormat,
    pub linked_ui: Option<String>,
    pub flags: ToolFlags,
    pub layout_hints: Option<Value>,
}

/// A resource, derived from a method tagged `@Static <uriTemplate>`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    pub method_name: String,
    pub uri_template: String,
    pub name: String,
    pub description: String,
    pub mime_type: Option<String>,
}

/// Constructor parameter extracted from the user class, with its
/// environment-variable binding (spec §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigParam {
    pub name: String,
    pub type_name: String,
    pub required: bool,
    /// Symbolic default (e.g. `homedir()`), never evaluated by the analyzer
    /// (spec §4.A numeric/edge policy).
    pub default_symbolic: Option<String>,
}

/// Static analysis output for one source file, before compilation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecSkeleton {
    pub class_name: String,
    pub display_name: Option<String>,
    pub description: String,
    pub version: Option<String>,
    pub icon: Option<String>,
    pub config_params: Vec<ConfigParam>,
    pub tools: Vec<Tool>,
    pub prompts: Vec<Tool>,
    pub resources: Vec<Resource>,
    /// Dependencies declared in the docblock dependency manifest (spec §4.B).
    pub dependencies: Vec<String>,
}

impl SpecSkeleton {
    pub fn config_schema(&self) -> Value {
        let mut properties = serde_json::Map::new();
        let mut required = Vec::new();
        for p in &self.config_params {
            properties.insert(
                p.name.clone(),
                serde_json::json!({ "type": "string", "description": p.type_name }),
            );
            if p.required && p.default_symbolic.is_none() {
                required.push(Value::String(p.name.clone()));
            }
        }
        serde_json::json!({
            "type": "object",
            "properties": Value::Object(properties),
            "required": required,
        })
    }
}

/// The in-memory Photon Spec (spec §3), rebuilt on every successful load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhotonSpec {
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub version: String,
    pub icon: Option<String>,
    pub tools: Vec<Tool>,
    pub prompts: Vec<Tool>,
    pub resources: Vec<Resource>,
    pub config_schema: Value,
    pub source_hash: String,
    pub source_path: PathBuf,
}

impl PhotonSpec {
    pub fn tool(&self, name: &str) -> Option<&Tool> {
        self.tools.iter().find(|t| t.name == name)
    }

    pub fn prompt(&self, name: &str) -> Option<&Tool> {
        self.prompts.iter().find(|t| t.name == name)
    }

    /// Find a resource whose URI template matches `uri`, returning the
    /// matched placeholder bindings alongside it (spec §8 boundary
    /// behavior: `foo://{id}` matches `foo://abc`, not `foo://abc/def`).
    pub fn resource_match(&self, uri: &str) -> Option<(&Resource, HashMap<String, String>)> {
        self.resources
            .iter()
            .find_map(|r| match_uri_template(&r.uri_template, uri).map(|b| (r, b)))
    }
}

/// RFC-6570-ish single-segment-placeholder matching, per spec §4.A/§8.
pub fn match_uri_template(template: &str, uri: &str) -> Option<HashMap<String, String>> {
    let (t_scheme, t_rest) = template.split_once("://")?;
    let (u_scheme, u_rest) = uri.split_once("://")?;
    if t_scheme != u_scheme {
        return None;
    }

    let t_segments: Vec<&str> = t_rest.split('/').collect();
    let u_segments: Vec<&str> = u_rest.split('/').collect();
    if t_segments.len() != u_segments.len() {
        return None;
    }

    let mut bindings = HashMap::new();
    for (t_seg, u_seg) in t_segments.iter().zip(u_segments.iter()) {
        if let Some(name) = t_seg.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            if u_seg.is_empty() {
                return None;
            }
            bindings.insert(name.to_string(), u_seg.to_string());
        } else if t_seg != u_seg {
            return None;
        }
    }
    Some(bindings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_matches_single_segment() {
        let b = match_uri_template("foo://{id}", "foo://abc").unwrap();
        assert_eq!(b.get("id"), Some(&"abc".to_string()));
    }

    #[test]
    fn template_rejects_extra_segment() {
        assert!(match_uri_template("foo://{id}", "foo://abc/def").is_none());
    }

    #[test]
    fn template_rejects_scheme_mismatch() {
        assert!(match_uri_template("foo://{id}", "bar://abc").is_none());
    }
}
