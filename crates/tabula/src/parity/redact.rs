use heck::ToSnakeCase;
use serde_json::Value;

/// Replacement written over sensitive values.
pub const REDACTED: &str = "[REDACTED]";

const SENSITIVE: [&str; 8] = [
    "password",
    "token",
    "secret",
    "auth",
    "credential",
    "session",
    "cookie",
    "key",
];

/// Schema vocabulary that contains a sensitive word without carrying a secret.
const STRUCTURAL: [&str; 3] = ["foreign_key", "primary_key", "sort_key"];

/// Whether a key name looks sensitive.
///
/// The name is split into words on `_`, `-`, spaces and case changes, and
/// matches when any word is a sensitive word or its plural. `auth_token`,
/// `X-Api-Key` and `accessToken` match; `author`, `keyword` and `monkey` do
/// not.
pub fn is_sensitive(key: &str) -> bool {
    let key = key.to_snake_case();
    if STRUCTURAL.contains(&key.as_str()) {
        return false;
    }

    key.split('_').any(|word| {
        let singular = word.strip_suffix('s').unwrap_or(word);
        SENSITIVE.contains(&word) || SENSITIVE.contains(&singular)
    })
}

/// Replaces the value of every sensitive key, at any depth, with
/// [`REDACTED`].
pub fn redact(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, value) in map.iter_mut() {
                if is_sensitive(key) {
                    *value = Value::from(REDACTED);
                } else {
                    redact(value);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(redact),
        _ => {}
    }
}
