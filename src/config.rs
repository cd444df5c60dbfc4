use log::debug;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::bencode::{DecodeOptions, MAX_DEPTH_CEILING};

/// File picked up from the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "rusbit-meta.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid config value: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub decoder: DecodeOptions,
    pub report: ReportOptions,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportOptions {
    pub max_files: usize,       // files listed before truncating
    pub piece_preview: bool,    // show first/last piece hash
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            max_files: 10,
            piece_preview: true,
        }
    }
}

impl Config {
    /// Loads `path` if given (it must exist), else `rusbit-meta.toml` in the
    /// working directory when present, else the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))
            }
            None => {
                debug!("No {} found, using default config", DEFAULT_CONFIG_FILE);
                Ok(Self::default())
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;

        debug!("Loaded config from {}: {:?}", path.display(), config);
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.decoder.max_depth == 0 {
            return Err(ConfigError::Invalid(
                "decoder.max_depth must be at least 1".to_string(),
            ));
        }
        if self.decoder.max_depth > MAX_DEPTH_CEILING {
            return Err(ConfigError::Invalid(format!(
                "decoder.max_depth must be at most {}, got {}",
                MAX_DEPTH_CEILING, self.decoder.max_depth
            )));
        }
        Ok(())
    }
}
