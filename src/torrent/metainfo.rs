use std::path::Path;

use crate::bencode::{decode_with_entry_span, DecodeOptions};
use crate::error::Result;
use crate::file_io::read_torrent_file;
use crate::torrent::infohash::{hash_span, InfoHash, InfoHashError};
use crate::torrent::metadata::{map, TorrentView};

/// A mapped .torrent file together with the hash of its raw `info` bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metainfo {
    pub torrent: TorrentView,
    pub info_hash: InfoHash,
}

impl Metainfo {
    /// Reads a .torrent file from disk and parses its contents.
    pub fn from_file<P: AsRef<Path>>(path: P, options: &DecodeOptions) -> Result<Self> {
        let buf = read_torrent_file(path)?;
        Self::from_bytes(&buf, options)
    }

    /// Decodes, maps and hashes a complete .torrent buffer in one pass.
    pub fn from_bytes(buf: &[u8], options: &DecodeOptions) -> Result<Self> {
        let (root, info_span) = decode_with_entry_span(buf, b"info", options)?;
        let torrent = map(&root)?;

        // map() has already required a root `info` entry
        let span = info_span.ok_or(InfoHashError::MissingInfo)?;
        let info_hash = hash_span(buf, span);

        Ok(Metainfo { torrent, info_hash })
    }
}
