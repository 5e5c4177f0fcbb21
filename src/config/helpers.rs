//! Environment overlay helpers shared by the resolved-config builders.

use std::env::{self, VarError};

use crate::error::ConfigError;

/// Read an optional environment variable. Unset and blank both mean "not
/// provided"; a non-UTF-8 value is a hard error.
pub(crate) fn optional_env(key: &str) -> Result<Option<String>, ConfigError> {
    match env::var(key) {
        Ok(value) => {
            let trimmed = value.trim();
            Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
        }
        Err(VarError::NotPresent) => Ok(None),
        Err(VarError::NotUnicode(_)) => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: "value is not valid UTF-8".to_string(),
        }),
    }
}

pub(crate) fn parse_string_env(key: &str, default: String) -> Result<String, ConfigError> {
    Ok(optional_env(key)?.unwrap_or(default))
}

pub(crate) fn parse_bool_env(key: &str, default: bool) -> Result<bool, ConfigError> {
    match optional_env(key)? {
        Some(raw) => parse_bool(key, &raw),
        None => Ok(default),
    }
}

pub(crate) fn parse_u64_env(key: &str, default: u64) -> Result<u64, ConfigError> {
    match optional_env(key)? {
        Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected an integer, got '{raw}'"),
        }),
        None => Ok(default),
    }
}

fn parse_bool(key: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected a boolean, got '{other}'"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::{optional_env, parse_bool};

    #[test]
    fn bool_spellings_parse_case_insensitively() {
        for raw in ["1", "true", "YES", "On"] {
            assert!(parse_bool("WAKEEL_TEST_FLAG", raw).expect("truthy"));
        }
        for raw in ["0", "false", "NO", "Off"] {
            assert!(!parse_bool("WAKEEL_TEST_FLAG", raw).expect("falsy"));
        }
        assert!(parse_bool("WAKEEL_TEST_FLAG", "maybe").is_err());
    }

    #[test]
    fn unset_variable_reads_as_none() {
        assert_eq!(
            optional_env("WAKEEL_TEST_NEVER_SET_SENTINEL").expect("readable"),
            None
        );
    }
}
