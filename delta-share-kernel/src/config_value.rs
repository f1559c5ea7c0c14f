//! Configuration values with environment variable indirection.
//!
//! Table roots and backend credentials are usually injected by the serving
//! layer's deployment rather than written into config files, so every string
//! setting of [`crate::config::SharingConfig`] accepts either form:
//!
//! ```json
//! "s3://bucket/table"
//! {"env_var": "SHARE_TABLE_ROOT", "default_val": "s3://bucket/table"}
//! ```

use crate::error::{Result, SharingError};
use serde::{Deserialize, Serialize};

/// A literal string or a value resolved from the environment.
#[derive(Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ConfigValue {
    Literal(String),
    Env {
        env_var: String,
        #[serde(default)]
        default_val: Option<String>,
    },
}

impl ConfigValue {
    pub fn literal(value: impl Into<String>) -> Self {
        Self::Literal(value.into())
    }

    pub fn from_env(var_name: impl Into<String>) -> Self {
        Self::Env {
            env_var: var_name.into(),
            default_val: None,
        }
    }

    pub fn from_env_with_default(var_name: impl Into<String>, default: impl Into<String>) -> Self {
        Self::Env {
            env_var: var_name.into(),
            default_val: Some(default.into()),
        }
    }

    /// Resolve to a string. An empty environment variable counts as unset.
    pub fn resolve(&self) -> Result<String> {
        match self {
            ConfigValue::Literal(value) => Ok(value.clone()),
            ConfigValue::Env {
                env_var,
                default_val,
            } => match std::env::var(env_var) {
                Ok(value) if !value.is_empty() => Ok(value),
                _ => default_val.clone().ok_or_else(|| {
                    SharingError::config(format!(
                        "Environment variable '{}' not set and no default provided",
                        env_var
                    ))
                }),
            },
        }
    }

    /// Resolve an optional setting; an absent setting stays `None`.
    pub fn resolve_opt(value: Option<&ConfigValue>) -> Result<Option<String>> {
        value.map(ConfigValue::resolve).transpose()
    }
}

// Values may carry credentials; never print literals.
impl std::fmt::Debug for ConfigValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigValue::Literal(_) => f.write_str("ConfigValue::Literal(<redacted>)"),
            ConfigValue::Env { env_var, .. } => f
                .debug_struct("ConfigValue::Env")
                .field("env_var", env_var)
                .finish(),
        }
    }
}

impl From<String> for ConfigValue {
    fn from(s: String) -> Self {
        ConfigValue::Literal(s)
    }
}

impl From<&str> for ConfigValue {
    fn from(s: &str) -> Self {
        ConfigValue::Literal(s.to_string())
    }
}
