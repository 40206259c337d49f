//! Source Analyzer (spec §4.A): turns one TypeScript source file into a
//! [`SpecSkeleton`] by static analysis alone. Never executes user code.

pub mod docblock;
pub mod error;
pub mod parser;
pub mod schema;

use std::collections::HashMap;

use serde_json::Value;

use crate::model::{ConfigParam, OutputFormat, Resource, SpecSkeleton, Tool, ToolFlags};

pub use error::AnalyzerError;

fn output_format_from_tags(unknown_tags: &[(String, String)]) -> OutputFormat {
    unknown_tags
        .iter()
        .find(|(tag, _)| tag == "outputFormat")
        .map(|(_, value)| match value.trim() {
            "json" => OutputFormat::Json,
            "markdown" => OutputFormat::Markdown,
            "html" => OutputFormat::Html,
            _ => OutputFormat::Text,
        })
        .unwrap_or(OutputFormat::Text)
}

fn layout_hints_from_tags(unknown_tags: &[(String, String)]) -> Option<Value> {
    unknown_tags
        .iter()
        .find(|(tag, _)| tag == "layoutHints")
        .and_then(|(_, value)| serde_json::from_str(value).ok())
}

fn tag_value<'a>(unknown_tags: &'a [(String, String)], name: &str) -> Option<&'a str> {
    unknown_tags
        .iter()
        .find(|(tag, _)| tag == name)
        .map(|(_, v)| v.as_str())
}

/// Parses `source` and produces a [`SpecSkeleton`], per spec §4.A.
///
/// `analyze` is a pure function of `source` (spec §8 round-trip property):
/// no filesystem access, no environment lookups, no randomness.
pub fn analyze(source_text: &str) -> Result<SpecSkeleton, AnalyzerError> {
    let raw = parser::parse_class(source_text)?;

    let config_params = raw
        .constructor_params
        .into_iter()
        .map(|p| ConfigParam {
            name: p.name,
            type_name: p.type_text,
            required: !p.optional && p.default_symbolic.is_none(),
            default_symbolic: p.default_symbolic,
        })
        .collect();

    let mut tools = Vec::new();
    let mut prompts = Vec::new();
    let mut resources = Vec::new();

    for method in raw.methods {
        let descriptions: HashMap<String, String> = method.doc.params.clone();
        let props = method
            .object_param_type_text
            .as_deref()
            .map(parser::object_param_properties)
            .unwrap_or_default();
        let input_schema = schema::build_input_schema(&props, &descriptions);

        if let Some(uri_template) = method.doc.static_uri.clone() {
            resources.push(Resource {
                method_name: method.name.clone(),
                uri_template,
                name: method.name.clone(),
                description: method.doc.description.clone(),
                mime_type: tag_value(&method.doc.unknown_tags, "mimeType").map(|s| s.to_string()),
            });
            continue;
        }

        let tool = Tool {
            method_name: method.name.clone(),
            name: method.name.clone(),
            description: method.doc.description.clone(),
            input_schema,
            output_format: output_format_from_tags(&method.doc.unknown_tags),
            linked_ui: method.doc.linked_ui.clone(),
            flags: ToolFlags {
                autorun: method.doc.flags.autorun,
                is_static: false,
                internal: method.doc.flags.internal,
            },
            layout_hints: layout_hints_from_tags(&method.doc.unknown_tags),
        };

        if method.doc.template_tag {
            prompts.push(tool);
        } else {
            tools.push(tool);
        }
    }

    Ok(SpecSkeleton {
        class_name: raw.name,
        display_name: tag_value(&raw.doc.unknown_tags, "displayName").map(|s| s.to_string()),
        description: raw.doc.description,
        version: tag_value(&raw.doc.unknown_tags, "version").map(|s| s.to_string()),
        icon: tag_value(&raw.doc.unknown_tags, "icon").map(|s| s.to_string()),
        config_params,
        tools,
        prompts,
        resources,
        dependencies: raw.doc.dependencies,
    })
}
