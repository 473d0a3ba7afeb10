//! Environment variable substitution for config values.
//!
//! Supports `${VAR_NAME}` syntax, resolved at load time. Only uppercase
//! `[A-Z_][A-Z0-9_]*` variable names are matched. `$${VAR}` escapes to a
//! literal `${VAR}`.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

/// Matches both escaped (`$${VAR}`) and live (`${VAR}`) references;
/// group 1 captures the escaped name, group 2 the live one.
static REF_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$\$\{([A-Z_][A-Z0-9_]*)\}|\$\{([A-Z_][A-Z0-9_]*)\}").unwrap()
});

/// Error returned for missing env vars.
#[derive(Debug, thiserror::Error)]
#[error("missing or empty env var \"{var_name}\" referenced in config")]
pub struct MissingEnvVarError {
    pub var_name: String,
}

/// Substitute `${VAR}` references in raw config text from the process env.
pub fn resolve_env_vars(raw: &str) -> Result<String, MissingEnvVarError> {
    resolve_env_vars_with(raw, &std::env::vars().collect())
}

/// Substitute env vars using a provided map (useful for testing).
pub fn resolve_env_vars_with(
    raw: &str,
    env: &HashMap<String, String>,
) -> Result<String, MissingEnvVarError> {
    let mut out = String::with_capacity(raw.len());
    let mut last = 0;

    for caps in REF_PATTERN.captures_iter(raw) {
        let whole = caps.get(0).unwrap();
        out.push_str(&raw[last..whole.start()]);
        last = whole.end();

        if let Some(escaped) = caps.get(1) {
            out.push_str("${");
            out.push_str(escaped.as_str());
            out.push('}');
        } else {
            let name = caps.get(2).unwrap().as_str();
            match env.get(name) {
                Some(value) if !value.is_empty() => out.push_str(value),
                _ => {
                    return Err(MissingEnvVarError {
                        var_name: name.to_string(),
                    })
                }
            }
        }
    }
    out.push_str(&raw[last..]);
    Ok(out)
}
