//! Configuration loading
//!
//! Two key/value sources feed the environments:
//! 1. The global source (`build.conf`), loaded into target and host
//! 2. The system source named by the global `COMPILER` key, loaded into
//!    target only
//!
//! Each declared variable has a kind that its value is checked against when
//! loaded. Enum values outside their allowed set are rejected here, never
//! later.

mod catalog;
mod source;
mod variable;

pub use catalog::{global_variables, system_variables, ARCHITECTURES, SYSTEMS};
pub use source::{ConfigSource, SourceOrigin};
pub use variable::{ConfigVariable, VariableKind, Variables};

use std::io;
use std::path::PathBuf;
use std::string::FromUtf8Error;

/// Conventional name of the global source
pub const GLOBAL_CONFIG_FILE: &str = "build.conf";

/// Configuration errors. All of them are fatal to setup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Config file {path} is not valid UTF-8: {source}")]
    Encoding {
        path: PathBuf,
        #[source]
        source: FromUtf8Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Missing required variable '{key}' in {path}")]
    Missing { key: String, path: PathBuf },

    #[error("Invalid value '{value}' for '{key}': allowed values are {}", .allowed.join(", "))]
    InvalidEnum {
        key: String,
        value: String,
        allowed: Vec<String>,
    },

    #[error("Invalid value {value} for '{key}': expected {expected}")]
    InvalidValue {
        key: String,
        value: String,
        expected: &'static str,
    },

    #[error("'{key}' may not be '{value}': that directory is reserved for host builds")]
    ReservedValue { key: String, value: String },
}
