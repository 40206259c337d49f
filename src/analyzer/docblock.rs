//! Docblock tag extraction (spec §4.A).
//!
//! A docblock is a `/** ... */` comment immediately preceding a class,
//! method, or the top of the file. The first paragraph is the
//! description; everything after is scanned line-by-line for tags.

use std::collections::HashMap;

use regex::Regex;

use crate::model::ToolFlags;

#[derive(Debug, Clone, Default)]
pub struct ParsedDocblock {
    pub description: String,
    pub params: HashMap<String, String>,
    pub flags: ToolFlags,
    pub template_tag: bool,
    pub static_uri: Option<String>,
    pub linked_ui: Option<String>,
    /// Tags this parser does not recognize, preserved verbatim rather than
    /// rejected (spec §4.A: "unknown tags are not errors").
    pub unknown_tags: Vec<(String, String)>,
    pub dependencies: Vec<String>,
}

/// Strips the comment delimiters and leading `*` continuation markers from
/// a raw `/** ... */` block, returning one line per doc line.
fn raw_lines(comment_text: &str) -> Vec<String> {
    let inner = comment_text
        .trim_start_matches("/**")
        .trim_start_matches("/*")
        .trim_end_matches("*/");

    inner
        .lines()
        .map(|line| {
            let trimmed = line.trim_start();
            let trimmed = trimmed.strip_prefix('*').unwrap_or(trimmed);
            trimmed.trim().to_string()
        })
        .filter(|line| !line.is_empty())
        .collect()
}

/// Parses one `/** ... */` docblock into description, tags, and flags.
pub fn parse_docblock(comment_text: &str) -> ParsedDocblock {
    let tag_re = Regex::new(r"^@(\w+)(?:\s+(.*))?$").expect("static regex compiles");
    let param_re = Regex::new(r"^(\S+)\s*(.*)$").expect("static regex compiles");

    let mut doc = ParsedDocblock::default();
    let mut description_lines = Vec::new();

    for line in raw_lines(comment_text) {
        if let Some(caps) = tag_re.captures(&line) {
            let tag = caps.get(1).unwrap().as_str();
            let rest = caps.get(2).map(|m| m.as_str().trim()).unwrap_or("");

            match tag {
                "param" => {
                    if let Some(pc) = param_re.captures(rest) {
                        let name = pc.get(1).unwrap().as_str().trim_matches(|c| c == '{' || c == '}');
                        let text = pc.get(2).map(|m| m.as_str()).unwrap_or("");
                        doc.params.insert(name.to_string(), text.to_string());
                    }
                }
                "Template" => doc.template_tag = true,
                "Static" => doc.static_uri = Some(rest.to_string()),
                "internal" => doc.flags.internal = true,
                "autorun" => doc.flags.autorun = true,
                "linkedUi" => doc.linked_ui = Some(rest.to_string()),
                "dependency" => doc.dependencies.push(rest.to_string()),
                other => doc.unknown_tags.push((other.to_string(), rest.to_string())),
            }
        } else {
            description_lines.push(line);
        }
    }

    doc.static_uri.is_some().then(|| doc.flags.is_static = true);
    doc.description = description_lines.join(" ").trim().to_string();
    doc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_description_and_params() {
        let doc = parse_docblock(
            "/**\n * Echoes a message back to the caller.\n * @param message text to echo\n */",
        );
        assert_eq!(doc.description, "Echoes a message back to the caller.");
        assert_eq!(doc.params.get("message").unwrap(), "text to echo");
    }

    #[test]
    fn recognizes_special_tags() {
        let doc = parse_docblock("/**\n * A resource.\n * @Static foo://{id}\n * @internal\n */");
        assert_eq!(doc.static_uri.as_deref(), Some("foo://{id}"));
        assert!(doc.flags.is_static);
        assert!(doc.flags.internal);
    }

    #[test]
    fn preserves_unknown_tags() {
        let doc = parse_docblock("/**\n * @weird some value\n */");
        assert_eq!(doc.unknown_tags, vec![("weird".to_string(), "some value".to_string())]);
    }
}
