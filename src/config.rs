use serde::{Deserialize, Serialize};
use std::{fs::File, io::BufReader, path::Path};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to open {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterConfig {
    // Parameters accepted per expression, %0..%99 by default
    #[serde(default = "default_max_parameters")]
    pub max_parameters: usize,

    // Released expressions kept for reuse
    #[serde(default = "default_pool_capacity")]
    pub pool_capacity: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            max_parameters: default_max_parameters(),
            pool_capacity: default_pool_capacity(),
        }
    }
}

impl FilterConfig {
    // Reads a JSON file; absent keys take their defaults
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        from_file(path)
    }

    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        from_str(s)
    }
}

pub fn from_file<T: for<'de> Deserialize<'de>, P: AsRef<Path>>(path: P) -> Result<T, ConfigError> {
    let file = File::open(&path).map_err(|source| ConfigError::Io {
        path: path.as_ref().display().to_string(),
        source,
    })?;
    let reader = BufReader::new(file);
    let config = serde_json::from_reader(reader)?;
    Ok(config)
}

pub fn from_str<T: for<'de> Deserialize<'de>>(s: &str) -> Result<T, ConfigError> {
    let config = serde_json::from_str(s)?;
    Ok(config)
}

fn default_max_parameters() -> usize {
    100
}

fn default_pool_capacity() -> usize {
    16
}
