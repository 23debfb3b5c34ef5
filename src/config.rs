//! Loader configuration.
//!
//! Settings come from an optional YAML file and are then overridden by
//! command-line flags. [`LoaderConfig::validate`] performs every pre-flight
//! check before any file is read, so setup mistakes surface immediately.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{cli::parse_delimiter, data::DateOrder};

pub const DEFAULT_TABLE_PREFIX: &str = "_csv_";
pub const SOURCE_EXTENSION: &str = "csv";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing source folder setting")]
    MissingSourceFolder,
    #[error("invalid source folder {0:?}")]
    InvalidSourceFolder(PathBuf),
    #[error("there are not any *.csv files in the source folder {0:?}")]
    NoInputFiles(PathBuf),
    #[error("missing database setting")]
    MissingDatabase,
    #[error("invalid delimiter '{value}': {reason}")]
    InvalidDelimiter { value: String, reason: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoaderConfig {
    pub source_folder: Option<PathBuf>,
    pub database: Option<PathBuf>,
    pub table_prefix: Option<String>,
    pub delimiter: Option<String>,
    pub input_encoding: Option<String>,
    pub date_order: Option<DateOrder>,
}

/// A configuration that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedConfig {
    pub source_folder: PathBuf,
    pub files: Vec<PathBuf>,
    pub database: PathBuf,
    pub table_prefix: String,
    pub delimiter: Option<u8>,
    pub input_encoding: Option<String>,
    pub date_order: DateOrder,
}

impl LoaderConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Opening configuration file {path:?}"))?;
        serde_yaml::from_str(&raw).with_context(|| format!("Parsing configuration file {path:?}"))
    }

    /// Layers `overrides` on top of `self`; any value set in `overrides` wins.
    pub fn merge(self, overrides: LoaderConfig) -> Self {
        Self {
            source_folder: overrides.source_folder.or(self.source_folder),
            database: overrides.database.or(self.database),
            table_prefix: overrides.table_prefix.or(self.table_prefix),
            delimiter: overrides.delimiter.or(self.delimiter),
            input_encoding: overrides.input_encoding.or(self.input_encoding),
            date_order: overrides.date_order.or(self.date_order),
        }
    }

    pub fn table_prefix(&self) -> &str {
        match self.table_prefix.as_deref() {
            Some(prefix) if !prefix.trim().is_empty() => prefix,
            _ => DEFAULT_TABLE_PREFIX,
        }
    }

    pub fn validate(&self) -> std::result::Result<ValidatedConfig, ConfigError> {
        let source_folder = self
            .source_folder
            .clone()
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or(ConfigError::MissingSourceFolder)?;
        if !source_folder.is_dir() {
            return Err(ConfigError::InvalidSourceFolder(source_folder));
        }
        let files = list_source_files(&source_folder)
            .map_err(|_| ConfigError::InvalidSourceFolder(source_folder.clone()))?;
        if files.is_empty() {
            return Err(ConfigError::NoInputFiles(source_folder));
        }
        let database = self
            .database
            .clone()
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or(ConfigError::MissingDatabase)?;
        let delimiter = self
            .delimiter
            .as_deref()
            .map(|value| {
                parse_delimiter(value).map_err(|reason| ConfigError::InvalidDelimiter {
                    value: value.to_string(),
                    reason,
                })
            })
            .transpose()?;

        Ok(ValidatedConfig {
            source_folder,
            files,
            database,
            table_prefix: self.table_prefix().to_string(),
            delimiter,
            input_encoding: self.input_encoding.clone(),
            date_order: self.date_order.unwrap_or_default(),
        })
    }
}

/// Lists `*.csv` files directly under `folder`, sorted by file name.
pub fn list_source_files(folder: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(folder)? {
        let path = entry?.path();
        let is_source = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(SOURCE_EXTENSION));
        if is_source && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
