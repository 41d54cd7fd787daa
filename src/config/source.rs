//! Persisted key/value sources

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

use super::ConfigError;

/// Which source a set of values came from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SourceOrigin {
    Global,
    System,
}

/// A parsed configuration file with provenance.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigSource {
    pub origin: SourceOrigin,

    pub path: PathBuf,

    /// SHA-256 digest of the raw file bytes
    pub digest: String,

    #[serde(skip)]
    table: toml::Table,
}

impl ConfigSource {
    /// Read and parse a source file
    pub fn load(origin: SourceOrigin, path: &Path) -> Result<Self, ConfigError> {
        let bytes = fs::read(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let digest = hex::encode(Sha256::digest(&bytes));
        let text = String::from_utf8(bytes).map_err(|source| ConfigError::Encoding {
            path: path.to_path_buf(),
            source,
        })?;
        let table = Self::parse(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(Self {
            origin,
            path: path.to_path_buf(),
            digest,
            table,
        })
    }

    /// Parse a source held in memory; `path` is only used in messages
    pub fn from_str(
        origin: SourceOrigin,
        path: impl Into<PathBuf>,
        text: &str,
    ) -> Result<Self, ConfigError> {
        let path = path.into();
        let table = Self::parse(text).map_err(|source| ConfigError::Parse {
            path: path.clone(),
            source,
        })?;

        Ok(Self {
            origin,
            path,
            digest: hex::encode(Sha256::digest(text.as_bytes())),
            table,
        })
    }

    fn parse(text: &str) -> Result<toml::Table, toml::de::Error> {
        text.parse::<toml::Table>()
    }

    pub fn get(&self, key: &str) -> Option<&toml::Value> {
        self.table.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.table.keys().map(String::as_str)
    }
}
