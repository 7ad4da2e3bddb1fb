//! Field-granular document diff.

use serde_json::Value;
use shared_types::GameState;

/// Depth below each top-level section at which paths are reported.
/// `tabs.<n>.<field>` is two levels down; every other section one.
fn section_depth(section: &str) -> usize {
    if section == "tabs" {
        2
    } else {
        1
    }
}

/// Dotted paths whose values differ between `before` and `after`, sorted.
#[must_use]
pub fn changed_paths(before: &GameState, after: &GameState) -> Vec<String> {
    let (Ok(before), Ok(after)) = (serde_json::to_value(before), serde_json::to_value(after))
    else {
        return vec!["*".to_string()];
    };

    let mut out = Vec::new();
    if let (Value::Object(b), Value::Object(a)) = (&before, &after) {
        for section in union_keys(b, a) {
            let depth = section_depth(&section);
            walk(
                &section,
                b.get(&section).unwrap_or(&Value::Null),
                a.get(&section).unwrap_or(&Value::Null),
                depth,
                &mut out,
            );
        }
    }
    out.sort();
    out
}

fn walk(prefix: &str, before: &Value, after: &Value, depth: usize, out: &mut Vec<String>) {
    if before == after {
        return;
    }
    match (before, after) {
        (Value::Object(b), Value::Object(a)) if depth > 0 => {
            for key in union_keys(b, a) {
                walk(
                    &format!("{prefix}.{key}"),
                    b.get(&key).unwrap_or(&Value::Null),
                    a.get(&key).unwrap_or(&Value::Null),
                    depth - 1,
                    out,
                );
            }
        }
        // A whole record appearing or vanishing is reported field by field.
        (Value::Null, Value::Object(a)) if depth > 0 => {
            for key in a.keys() {
                walk(&format!("{prefix}.{key}"), &Value::Null, &a[key], depth - 1, out);
            }
        }
        (Value::Object(b), Value::Null) if depth > 0 => {
            for key in b.keys() {
                walk(&format!("{prefix}.{key}"), &b[key], &Value::Null, depth - 1, out);
            }
        }
        _ => out.push(prefix.to_string()),
    }
}

fn union_keys(
    a: &serde_json::Map<String, Value>,
    b: &serde_json::Map<String, Value>,
) -> Vec<String> {
    let mut keys: Vec<String> = a.keys().chain(b.keys()).cloned().collect();
    keys.sort();
    keys.dedup();
    keys
}
