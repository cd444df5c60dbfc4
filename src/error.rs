use std::path::PathBuf;

use thiserror::Error;

use crate::bencode::DecodeError;
use crate::config::ConfigError;
use crate::torrent::{InfoHashError, MapError};

#[derive(Debug, Error)]
pub enum Error {
    #[error("Bencode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Torrent error: {0}")]
    Map(#[from] MapError),

    #[error("Info hash error: {0}")]
    InfoHash(#[from] InfoHashError),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
