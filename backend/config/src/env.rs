//! `${VAR}` substitution in config string values, resolved at load time.
//!
//! Only uppercase `[A-Z_][A-Z0-9_]*` names are recognised. `$${VAR}` is an
//! escape and yields the literal text `${VAR}`.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;
use std::collections::HashMap;

/// Group 1 is the escaping `$`, group 2 the variable name.
static REFERENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$(\$)?\{([A-Z_][A-Z0-9_]*)\}").unwrap());

#[derive(Debug, thiserror::Error)]
#[error("Missing env var \"{var_name}\" referenced at config path: {config_path}")]
pub struct MissingEnvVarError {
    pub var_name: String,
    pub config_path: String,
}

/// Substitute references using `env`. Unset or empty variables are errors.
pub fn resolve_env_vars_with(
    value: &Value,
    env: &HashMap<String, String>,
) -> Result<Value, MissingEnvVarError> {
    walk(value, "", &mut |s, path| substitute(s, env, path))
}

/// Names of every variable referenced in the tree, sorted and de-duplicated.
pub fn collect_referenced_vars(value: &Value) -> Vec<String> {
    let mut vars = Vec::new();
    let _ = walk(value, "", &mut |s, _| {
        vars.extend(
            REFERENCE
                .captures_iter(s)
                .filter(|caps| caps.get(1).is_none())
                .map(|caps| caps[2].to_string()),
        );
        Ok(s.to_string())
    });
    vars.sort();
    vars.dedup();
    vars
}

/// Rebuild `value`, passing every string leaf through `leaf`.
fn walk<F>(value: &Value, path: &str, leaf: &mut F) -> Result<Value, MissingEnvVarError>
where
    F: FnMut(&str, &str) -> Result<String, MissingEnvVarError>,
{
    Ok(match value {
        Value::String(s) => Value::String(leaf(s, path)?),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .enumerate()
                .map(|(i, v)| walk(v, &format!("{path}[{i}]"), leaf))
                .collect::<Result<_, _>>()?,
        ),
        Value::Object(map) => {
            let mut out = serde_json::Map::new();
            for (k, v) in map {
                let child = if path.is_empty() { k.clone() } else { format!("{path}.{k}") };
                out.insert(k.clone(), walk(v, &child, leaf)?);
            }
            Value::Object(out)
        }
        other => other.clone(),
    })
}

fn substitute(
    s: &str,
    env: &HashMap<String, String>,
    path: &str,
) -> Result<String, MissingEnvVarError> {
    if !s.contains('$') {
        return Ok(s.to_string());
    }

    let mut missing = None;
    let out = REFERENCE.replace_all(s, |caps: &Captures| {
        let name = &caps[2];
        if caps.get(1).is_some() {
            return format!("${{{name}}}");
        }
        match env.get(name) {
            Some(val) if !val.is_empty() => val.clone(),
            _ => {
                missing.get_or_insert_with(|| MissingEnvVarError {
                    var_name: name.to_string(),
                    config_path: path.to_string(),
                });
                String::new()
            }
        }
    });

    match missing {
        Some(err) => Err(err),
        None => Ok(out.into_owned()),
    }
}
