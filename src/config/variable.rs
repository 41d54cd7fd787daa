//! Typed configuration variables

use serde::Serialize;
use std::fmt::Write as _;
use std::path::PathBuf;

use super::{ConfigError, ConfigSource};
use crate::env::{Environment, Value};

/// Declared kind of a configuration variable
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "allowed")]
pub enum VariableKind {
    String,
    Bool,
    Path,
    Enum(Vec<String>),
    List,
}

impl VariableKind {
    pub fn enumeration(allowed: &[&str]) -> Self {
        VariableKind::Enum(allowed.iter().map(|s| s.to_string()).collect())
    }

    fn describe(&self) -> String {
        match self {
            VariableKind::String => "string".to_string(),
            VariableKind::Bool => "yes|no".to_string(),
            VariableKind::Path => "path".to_string(),
            VariableKind::Enum(allowed) => allowed.join("|"),
            VariableKind::List => "list".to_string(),
        }
    }
}

/// One declared variable.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigVariable {
    pub key: &'static str,
    pub help: &'static str,
    pub kind: VariableKind,

    /// Used when the source lacks the key; `None` makes the key required
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl ConfigVariable {
    pub fn new(key: &'static str, help: &'static str, kind: VariableKind) -> Self {
        Self {
            key,
            help,
            kind,
            default: None,
        }
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Convert a raw source value to this variable's kind
    pub fn convert(&self, raw: &toml::Value) -> Result<Value, ConfigError> {
        let invalid = |expected: &'static str| ConfigError::InvalidValue {
            key: self.key.to_string(),
            value: raw.to_string(),
            expected,
        };

        match &self.kind {
            VariableKind::String => raw
                .as_str()
                .map(|s| Value::Str(s.to_string()))
                .ok_or_else(|| invalid("a quoted string")),
            VariableKind::Path => raw
                .as_str()
                .map(|s| Value::Path(PathBuf::from(s)))
                .ok_or_else(|| invalid("a path")),
            VariableKind::Bool => match raw {
                toml::Value::Boolean(b) => Ok(Value::Bool(*b)),
                toml::Value::String(s) => {
                    parse_bool(s).map(Value::Bool).ok_or_else(|| invalid("yes or no"))
                }
                toml::Value::Integer(1) => Ok(Value::Bool(true)),
                toml::Value::Integer(0) => Ok(Value::Bool(false)),
                _ => Err(invalid("yes or no")),
            },
            VariableKind::Enum(allowed) => {
                let value = raw.as_str().ok_or_else(|| invalid("a string"))?;
                if allowed.iter().any(|a| a == value) {
                    Ok(Value::Str(value.to_string()))
                } else {
                    Err(ConfigError::InvalidEnum {
                        key: self.key.to_string(),
                        value: value.to_string(),
                        allowed: allowed.clone(),
                    })
                }
            }
            VariableKind::List => match raw {
                toml::Value::Array(items) => items
                    .iter()
                    .map(|item| item.as_str().map(str::to_string))
                    .collect::<Option<Vec<_>>>()
                    .map(Value::List)
                    .ok_or_else(|| invalid("a list of strings")),
                toml::Value::String(s) => {
                    Ok(Value::List(s.split_whitespace().map(str::to_string).collect()))
                }
                _ => Err(invalid("a list of strings")),
            },
        }
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "y" | "yes" | "t" | "true" | "1" | "on" | "all" => Some(true),
        "n" | "no" | "f" | "false" | "0" | "off" | "none" => Some(false),
        _ => None,
    }
}

/// An ordered set of declared variables.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Variables {
    vars: Vec<ConfigVariable>,
}

impl Variables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, var: ConfigVariable) {
        self.vars.push(var);
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConfigVariable> {
        self.vars.iter()
    }

    pub fn get(&self, key: &str) -> Option<&ConfigVariable> {
        self.vars.iter().find(|v| v.key == key)
    }

    /// Resolve every declared variable from `source`.
    ///
    /// Keys the source has but nobody declared are ignored. The first
    /// missing or invalid variable aborts the whole load.
    pub fn resolve(
        &self,
        source: &ConfigSource,
    ) -> Result<Vec<(&'static str, Value)>, ConfigError> {
        for key in source.keys() {
            if self.get(key).is_none() {
                tracing::debug!(key, path = %source.path.display(), "ignoring unknown config key");
            }
        }

        self.vars
            .iter()
            .map(|var| -> Result<(&'static str, Value), ConfigError> {
                let value = match (source.get(var.key), &var.default) {
                    (Some(raw), _) => var.convert(raw)?,
                    (None, Some(default)) => default.clone(),
                    (None, None) => {
                        return Err(ConfigError::Missing {
                            key: var.key.to_string(),
                            path: source.path.clone(),
                        })
                    }
                };
                Ok((var.key, value))
            })
            .collect()
    }

    /// Resolve from `source` and store the values into every environment.
    ///
    /// Nothing is written unless every variable resolves.
    pub fn update(
        &self,
        source: &ConfigSource,
        envs: &mut [&mut Environment],
    ) -> Result<(), ConfigError> {
        let values = self.resolve(source)?;
        for env in envs.iter_mut() {
            for (key, value) in &values {
                env.set(key, value.clone());
            }
        }
        Ok(())
    }

    /// Help text listing every variable with its current value in `env`
    pub fn help_text(&self, env: &Environment) -> String {
        let mut out = String::new();
        for var in &self.vars {
            let _ = writeln!(out);
            let _ = writeln!(out, "{}: {} ({})", var.key, var.help, var.kind.describe());
            let default = var
                .default
                .as_ref()
                .map(Value::render)
                .unwrap_or_else(|| "None".to_string());
            let _ = writeln!(out, "    default: {}", default);
            let actual = env.get_str(var.key).unwrap_or_else(|| "None".to_string());
            let _ = writeln!(out, "    actual: {}", actual);
        }
        out
    }
}
