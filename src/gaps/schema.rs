//! `$ref` discovery in request/response schemas

use serde_json::Value;

/// Collect every `$ref` string in `schema`, depth first.
pub fn collect_refs(schema: &Value) -> Vec<String> {
    let mut refs = Vec::new();
    walk(schema, &mut refs);
    refs
}

fn walk(value: &Value, refs: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                match (key.as_str(), child) {
                    ("$ref", Value::String(target)) => refs.push(target.clone()),
                    _ => walk(child, refs),
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                walk(item, refs);
            }
        }
        _ => {}
    }
}

/// Resolve a reference such as `#/components/schemas/User` or `./user.schema.json`
/// to the model name it points at.
pub fn model_name(reference: &str) -> Option<&str> {
    let last = reference
        .rsplit(['/', '#'])
        .find(|segment| !segment.is_empty())?;

    let mut name = last;
    for suffix in [".json", ".yaml", ".yml"] {
        if let Some(stripped) = name.strip_suffix(suffix) {
            name = stripped;
            break;
        }
    }
    let name = name.strip_suffix(".schema").unwrap_or(name);
    (!name.is_empty()).then_some(name)
}

/// Model names referenced from a schema, deduplicated in first-seen order
pub fn referenced_models(schema: &Value) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for reference in collect_refs(schema) {
        if let Some(name) = model_name(&reference) {
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
    }
    names
}

/// True for `null`, `{}`, `[]` and blank strings
pub fn is_empty_schema(schema: &Value) -> bool {
    match schema {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use yare::parameterized;

    #[test]
    fn test_collect_nested_refs() {
        let schema = json!({
            "type": "object",
            "properties": {
                "owner": {"$ref": "#/components/schemas/User"},
                "items": {
                    "type": "array",
                    "items": {"$ref": "#/components/schemas/LineItem"}
                },
                "variants": [
                    {"oneOf": [{"$ref": "#/definitions/Card"}, {"$ref": "#/definitions/Bank"}]}
                ]
            }
        });
        let mut refs = collect_refs(&schema);
        refs.sort();
        assert_eq!(
            refs,
            vec![
                "#/components/schemas/LineItem",
                "#/components/schemas/User",
                "#/definitions/Bank",
                "#/definitions/Card",
            ]
        );
    }

    #[test]
    fn test_non_string_ref_is_walked() {
        let schema = json!({"$ref": {"$ref": "#/definitions/Inner"}});
        assert_eq!(collect_refs(&schema), vec!["#/definitions/Inner"]);
    }

    #[parameterized(
        openapi = { "#/components/schemas/User", Some("User") },
        definitions = { "#/definitions/Order", Some("Order") },
        file = { "./address.json", Some("address") },
        schema_file = { "models/user.schema.json", Some("user") },
        file_fragment = { "common.yaml#/Money", Some("Money") },
        trailing_slash = { "#/components/schemas/Item/", Some("Item") },
        empty = { "#", None },
    )]
    fn test_model_name(reference: &str, expected: Option<&str>) {
        assert_eq!(model_name(reference), expected);
    }

    #[test]
    fn test_referenced_models_dedup() {
        let schema = json!([
            {"$ref": "#/definitions/User"},
            {"$ref": "#/components/schemas/User"},
            {"$ref": "#/definitions/Team"}
        ]);
        assert_eq!(referenced_models(&schema), vec!["User", "Team"]);
    }

    #[test]
    fn test_is_empty_schema() {
        assert!(is_empty_schema(&json!(null)));
        assert!(is_empty_schema(&json!({})));
        assert!(is_empty_schema(&json!([])));
        assert!(!is_empty_schema(&json!({"type": "object"})));
    }
}
