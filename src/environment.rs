use std::env;
use std::str::FromStr;
use tracing::warn;

/// Retrieves an environment variable and splits it into a vector of strings based on a delimiter.
///
/// # Arguments
/// - `var`: The name of the environment variable.
/// - `delimiter`: The character to split the environment variable's value by.
///
/// # Returns
/// - `Vec<String>`, without empty items
pub fn get_env_var_as_vec(var: &str, delimiter: char) -> Vec<String> {
    env::var(var)
        .unwrap_or_default()
        .split(delimiter)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Non-empty value of an environment variable.
pub fn get_env_var(var: &str) -> Option<String> {
    env::var(var)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parses an environment variable, falling back to `default` when it is
/// unset or invalid.
pub fn get_env_var_or<T: FromStr>(var: &str, default: T) -> T {
    match get_env_var(var) {
        Some(value) => value.parse().unwrap_or_else(|_| {
            warn!("Invalid value '{}' for {}, using the default", value, var);
            default
        }),
        None => default,
    }
}

/// Accepts `1/0`, `true/false`, `yes/no` and `on/off`.
pub fn get_env_var_as_bool(var: &str, default: bool) -> bool {
    match get_env_var(var).map(|v| v.to_lowercase()) {
        Some(v) if ["1", "true", "yes", "on"].contains(&v.as_str()) => true,
        Some(v) if ["0", "false", "no", "off"].contains(&v.as_str()) => false,
        Some(v) => {
            warn!("Invalid boolean '{}' for {}, using the default", v, var);
            default
        }
        None => default,
    }
}
