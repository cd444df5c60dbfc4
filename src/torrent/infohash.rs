// infohash.rs
use std::fmt;
use std::ops::Range;

use sha1::{Digest, Sha1};
use thiserror::Error;

use crate::bencode::{dict_entry_span, DecodeError, DecodeOptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InfoHash(pub [u8; 20]);

impl InfoHash {
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for InfoHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InfoHashError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("Missing 'info' dictionary")]
    MissingInfo,
}

/// SHA-1 of the root `info` value, hashed exactly as it appears in `buf`.
pub fn info_hash(buf: &[u8], options: &DecodeOptions) -> Result<InfoHash, InfoHashError> {
    let span = dict_entry_span(buf, b"info", options)?.ok_or(InfoHashError::MissingInfo)?;
    Ok(hash_span(buf, span))
}

pub(crate) fn hash_span(buf: &[u8], span: Range<usize>) -> InfoHash {
    let mut hasher = Sha1::new();
    hasher.update(&buf[span]);
    let result = hasher.finalize();

    let mut hash_bytes = [0u8; 20];
    hash_bytes.copy_from_slice(&result);
    InfoHash(hash_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sha1_of(bytes: &[u8]) -> [u8; 20] {
        let mut out = [0u8; 20];
        out.copy_from_slice(&Sha1::digest(bytes));
        out
    }

    #[test]
    fn test_info_hash_covers_raw_info_bytes() {
        let info = b"d6:lengthi5e4:name5:a.txt12:piece lengthi16384e6:pieces0:e";
        let mut torrent = b"d8:announce3:url4:info".to_vec();
        torrent.extend_from_slice(info);
        torrent.push(b'e');

        let expected = sha1_of(info);
        let hash = info_hash(&torrent, &DecodeOptions::default()).unwrap();
        assert_eq!(hash, InfoHash(expected));
        assert_eq!(hash.to_hex(), hex::encode(expected));
        assert_eq!(hash.to_string().len(), 40);
    }

    #[test]
    fn test_info_hash_keeps_unsorted_keys() {
        // re-encoding would sort these; the hash must use the original order
        let info = b"d4:name1:x6:lengthi1ee";
        let mut torrent = b"d4:info".to_vec();
        torrent.extend_from_slice(info);
        torrent.push(b'e');

        let expected = sha1_of(info);
        assert_eq!(
            info_hash(&torrent, &DecodeOptions::default()).unwrap(),
            InfoHash(expected)
        );
    }

    #[test]
    fn test_info_hash_missing_info() {
        assert_eq!(
            info_hash(b"d8:announce3:urle", &DecodeOptions::default()),
            Err(InfoHashError::MissingInfo)
        );
    }

    #[test]
    fn test_info_hash_decode_error() {
        assert_eq!(
            info_hash(b"d4:infod", &DecodeOptions::default()),
            Err(InfoHashError::Decode(DecodeError::UnterminatedDictionary { offset: 7 }))
        );
    }
}
