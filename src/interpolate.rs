use std::sync::OnceLock;

use regex::{Captures, Regex};
use serde_json::Value;

use crate::model::{Properties, display_value};

static TOKEN: OnceLock<Regex> = OnceLock::new();

fn token_pattern() -> &'static Regex {
    TOKEN.get_or_init(|| {
        Regex::new(r"\{\{(\w+(?:\.\w+)*)\}\}").expect("token pattern is a valid regex")
    })
}

/// Resolve a dotted path (`customer.address.city`) inside `data`.
pub fn lookup<'a>(data: &'a Properties, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let first = segments.next()?;
    let mut current = data.get(first)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current).filter(|v| !v.is_null())
}

/// Replace every `{{name}}` / `{{name.path}}` token with its value in `data`.
/// Tokens that do not resolve are kept exactly as written.
pub fn interpolate(text: &str, data: &Properties) -> String {
    if data.is_empty() || !text.contains("{{") {
        return text.to_string();
    }
    token_pattern()
        .replace_all(text, |caps: &Captures| match lookup(data, &caps[1]) {
            Some(value) => display_value(value),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Interpolate every string leaf of `value` in place.
pub fn interpolate_value(value: &mut Value, data: &Properties) {
    match value {
        Value::String(s) => {
            let replaced = interpolate(s, data);
            *s = replaced;
        }
        Value::Array(items) => {
            for item in items {
                interpolate_value(item, data);
            }
        }
        Value::Object(map) => {
            for (_, item) in map.iter_mut() {
                interpolate_value(item, data);
            }
        }
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}

/// Merge `overrides` onto `base`. Nested objects merge key by key; any other
/// value in `overrides` replaces the one in `base`.
pub fn deep_merge(base: &Properties, overrides: &Properties) -> Properties {
    let mut merged = base.clone();
    for (key, value) in overrides {
        let combined = match (merged.get(key), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                Value::Object(deep_merge(existing, incoming))
            }
            _ => value.clone(),
        };
        merged.insert(key.clone(), combined);
    }
    merged
}
