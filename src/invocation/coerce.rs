//! Return-value coercion into MCP content blocks (spec §4.D step 5).

use serde::Serialize;
use serde_json::Value;

use crate::model::OutputFormat;

#[derive(Debug, Clone, Serialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
    #[serde(rename = "mimeType", skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(rename = "resource", skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
}

impl ContentBlock {
    fn text(text: impl Into<String>) -> Self {
        Self {
            kind: "text".to_string(),
            text: text.into(),
            mime_type: None,
            resource: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CoercedResult {
    pub content: Vec<ContentBlock>,
    #[serde(rename = "structuredContent", skip_serializing_if = "Option::is_none")]
    pub structured_content: Option<Value>,
}

/// Converts a method's return value into the content blocks a `tools/call`
/// response carries, per the rules in spec §4.D step 5.
pub fn coerce(value: &Value, output_format: OutputFormat, linked_ui: Option<&str>) -> CoercedResult {
    match value {
        Value::String(s) => coerce_string(s, output_format, linked_ui),
        other => {
            let text = serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string());
            let mut block = ContentBlock::text(text);
            block.mime_type = Some("application/json".to_string());
            CoercedResult {
                content: vec![block],
                structured_content: Some(other.clone()),
            }
        }
    }
}

fn coerce_string(s: &str, output_format: OutputFormat, linked_ui: Option<&str>) -> CoercedResult {
    let looks_like_markdown = s.trim_start().starts_with("```");

    let mut block = ContentBlock::text(s.to_string());
    if looks_like_markdown || output_format == OutputFormat::Markdown {
        block.mime_type = Some("text/markdown".to_string());
    } else if output_format == OutputFormat::Html {
        block.mime_type = Some("text/html".to_string());
        block.resource = linked_ui.map(|s| s.to_string());
    }

    CoercedResult {
        content: vec![block],
        structured_content: None,
    }
}

/// Builds the single-block `isError=true` result for a thrown error (spec
/// §4.D step 6).
pub fn coerce_error(message: &str) -> CoercedResult {
    CoercedResult {
        content: vec![ContentBlock::text(message.to_string())],
        structured_content: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_string_becomes_text() {
        let result = coerce(&Value::String("hello".to_string()), OutputFormat::Text, None);
        assert_eq!(result.content[0].kind, "text");
        assert_eq!(result.content[0].mime_type, None);
    }

    #[test]
    fn object_becomes_json_with_structured_content() {
        let value = serde_json::json!({ "a": 1 });
        let result = coerce(&value, OutputFormat::Text, None);
        assert_eq!(result.structured_content, Some(value));
        assert_eq!(result.content[0].mime_type.as_deref(), Some("application/json"));
    }

    #[test]
    fn markdown_fence_is_detected_regardless_of_output_format() {
        let result = coerce(&Value::String("```rust\nfn main() {}\n```".to_string()), OutputFormat::Text, None);
        assert_eq!(result.content[0].mime_type.as_deref(), Some("text/markdown"));
    }

    #[test]
    fn html_output_carries_linked_ui_reference() {
        let result = coerce(&Value::String("<p>hi</p>".to_string()), OutputFormat::Html, Some("ui://panel"));
        assert_eq!(result.content[0].mime_type.as_deref(), Some("text/html"));
        assert_eq!(result.content[0].resource.as_deref(), Some("ui://panel"));
    }
}
