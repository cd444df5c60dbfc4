// lib.rs - Library interface for the metainfo inspector

pub mod bencode;
pub mod config;
pub mod error;
pub mod file_io;
pub mod report;
pub mod torrent;

// Re-export commonly used types for easier testing
pub use bencode::{decode, decode_with, BDict, BValue, DecodeError, DecodeOptions, DuplicateKeyPolicy};
pub use config::{Config, ConfigError, ReportOptions};
pub use error::{Error, Result};
pub use torrent::{map, FileEntry, FileLayout, InfoHash, InfoView, MapError, Metainfo, TorrentView};
