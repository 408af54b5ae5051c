//! Config redaction: safe-to-print config snapshots with secrets masked.

use serde_json::Value;

static SENSITIVE_KEYS: &[&str] = &[
    "token",
    "accessToken",
    "access_token",
    "password",
    "secret",
    "apiKey",
    "api_key",
];

fn is_sensitive_key(key: &str) -> bool {
    SENSITIVE_KEYS.iter().any(|k| k.eq_ignore_ascii_case(key))
}

/// Replace every sensitive string with a 4-character hint followed by `***`.
pub fn redact(value: &Value) -> Value {
    redact_recursive(value, "")
}

fn redact_recursive(value: &Value, key: &str) -> Value {
    match value {
        Value::String(s) if is_sensitive_key(key) && !s.is_empty() => {
            let hint: String = if s.chars().count() > 8 {
                s.chars().take(4).collect()
            } else {
                String::new()
            };
            Value::String(format!("{hint}***"))
        }
        Value::Array(arr) => Value::Array(arr.iter().map(|v| redact_recursive(v, key)).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), redact_recursive(v, k)))
                .collect(),
        ),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn masks_management_token() {
        let v = json!({ "management": { "token": "eyJhbGciOiJIUzI1NiJ9.payload", "baseUrl": "http://x" } });
        let redacted = redact(&v);
        assert_eq!(redacted["management"]["token"], "eyJh***");
        assert_eq!(redacted["management"]["baseUrl"], "http://x");
    }

    #[test]
    fn short_secrets_get_no_hint() {
        let redacted = redact(&json!({ "password": "abc" }));
        assert_eq!(redacted["password"], "***");
    }
}
