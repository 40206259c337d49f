//! JSON Schema fragment derivation from TypeScript type text (spec §4.A,
//! supplemented subset per SPEC_FULL.md §11).
//!
//! This is deliberately not a type-checker: it recognizes the shapes a
//! single-object tool parameter realistically uses (primitives, string
//! literal unions, arrays, nested object literals, optional properties)
//! and falls back to an untyped `{}` fragment for anything else, per the
//! "never fail on one unsupported parameter type" rule.

use serde_json::{json, Value};

/// One property of an object type, as parsed out of `{ name: Type, ... }`.
pub struct PropertySig {
    pub name: String,
    pub type_text: String,
    pub optional: bool,
}

/// Splits `{ a: string, b?: number[] }` into its top-level properties,
/// respecting nested braces/brackets so commas inside a nested type don't
/// split early.
pub fn split_object_properties(body: &str) -> Vec<PropertySig> {
    let mut props = Vec::new();
    let mut depth = 0i32;
    let mut current = String::new();

    for ch in body.chars() {
        match ch {
            '{' | '(' | '<' | '[' => {
                depth += 1;
                current.push(ch);
            }
            '}' | ')' | '>' | ']' => {
                depth -= 1;
                current.push(ch);
            }
            ',' if depth == 0 => {
                if let Some(p) = parse_property(&current) {
                    props.push(p);
                }
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    if let Some(p) = parse_property(&current) {
        props.push(p);
    }
    props
}

fn parse_property(raw: &str) -> Option<PropertySig> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let (name_part, type_part) = raw.split_once(':')?;
    let name_part = name_part.trim();
    let (name, optional) = match name_part.strip_suffix('?') {
        Some(stripped) => (stripped.trim().to_string(), true),
        None => (name_part.to_string(), false),
    };
    Some(PropertySig {
        name,
        type_text: type_part.trim().to_string(),
        optional,
    })
}

/// Derives a JSON Schema fragment for one TypeScript type expression.
pub fn type_to_schema(type_text: &str) -> Value {
    let t = type_text.trim();

    match t {
        "string" => return json!({ "type": "string" }),
        "number" => return json!({ "type": "number" }),
        "boolean" => return json!({ "type": "boolean" }),
        "any" | "unknown" => return json!({}),
        _ => {}
    }

    if let Some(elem) = t.strip_suffix("[]") {
        return json!({ "type": "array", "items": type_to_schema(elem) });
    }

    if t.starts_with('{') && t.ends_with('}') {
        let body = &t[1..t.len() - 1];
        let props = split_object_properties(body);
        let mut properties = serde_json::Map::new();
        let mut required = Vec::new();
        for p in &props {
            properties.insert(p.name.clone(), type_to_schema(&p.type_text));
            if !p.optional {
                required.push(Value::String(p.name.clone()));
            }
        }
        return json!({
            "type": "object",
            "properties": Value::Object(properties),
            "required": required,
        });
    }

    if t.contains('|') {
        let variants: Vec<&str> = t.split('|').map(|s| s.trim()).collect();
        let literals: Option<Vec<Value>> = variants
            .iter()
            .map(|v| {
                if v.starts_with('"') && v.ends_with('"') && v.len() >= 2 {
                    Some(Value::String(v[1..v.len() - 1].to_string()))
                } else {
                    None
                }
            })
            .collect();
        if let Some(enum_values) = literals {
            return json!({ "enum": enum_values });
        }
    }

    json!({})
}

/// Wraps a list of extracted properties into an object input schema,
/// folding in docblock `@param` descriptions where present.
pub fn build_input_schema(
    props: &[PropertySig],
    descriptions: &std::collections::HashMap<String, String>,
) -> Value {
    let mut properties = serde_json::Map::new();
    let mut required = Vec::new();

    for p in props {
        let mut fragment = type_to_schema(&p.type_text);
        if let Some(obj) = fragment.as_object_mut() {
            if let Some(desc) = descriptions.get(&p.name) {
                obj.insert("description".to_string(), Value::String(desc.clone()));
            }
        }
        properties.insert(p.name.clone(), fragment);
        if !p.optional {
            required.push(Value::String(p.name.clone()));
        }
    }

    json!({
        "type": "object",
        "properties": Value::Object(properties),
        "required": required,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitive_types() {
        assert_eq!(type_to_schema("string"), json!({ "type": "string" }));
        assert_eq!(type_to_schema("number"), json!({ "type": "number" }));
    }

    #[test]
    fn string_literal_union_becomes_enum() {
        let schema = type_to_schema(r#""a" | "b""#);
        assert_eq!(schema, json!({ "enum": ["a", "b"] }));
    }

    #[test]
    fn array_of_primitive() {
        assert_eq!(
            type_to_schema("string[]"),
            json!({ "type": "array", "items": { "type": "string" } })
        );
    }

    #[test]
    fn nested_object_with_optional_property() {
        let props = split_object_properties(" a: string, b?: number ");
        assert_eq!(props.len(), 2);
        assert!(!props[0].optional);
        assert!(props[1].optional);
    }

    #[test]
    fn unsupported_type_falls_back_to_untyped() {
        assert_eq!(type_to_schema("Map<string, number>"), json!({}));
    }
}
