use serde::Serialize;

use crate::bencode::{BDict, BValue};
use crate::torrent::error::MapError;

/// Size of one SHA-1 piece hash inside `pieces`.
pub const PIECE_HASH_LEN: usize = 20;

/// Typed view of a .torrent file's top-level dictionary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TorrentView {
    pub announce: Option<String>,             // The tracker URL
    pub announce_list: Option<Vec<Vec<String>>>, // Tracker tiers
    pub created_by: Option<String>,
    pub comment: Option<String>,
    pub creation_date: Option<i64>,           // Unix timestamp, seconds
    pub encoding: Option<String>,
    pub info: InfoView,
}

/// Contains detailed metadata about the torrent's content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoView {
    pub name: String,           // Name of the file or folder
    pub piece_length: i64,      // Size of each piece
    pub pieces_raw: Vec<u8>,    // Concatenated 20-byte SHA-1 hashes, as on disk
    pub private: Option<bool>,
    pub layout: FileLayout,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileLayout {
    Single { length: i64 },
    Multi { files: Vec<FileEntry> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEntry {
    pub path: Vec<String>,      // Segments from the torrent root to the leaf
    pub length: i64,
}

impl InfoView {
    pub fn piece_count(&self) -> usize {
        self.pieces_raw.len() / PIECE_HASH_LEN
    }

    pub fn piece_hashes(&self) -> impl Iterator<Item = &[u8]> {
        self.pieces_raw.chunks_exact(PIECE_HASH_LEN)
    }

    /// Length of the single file, `None` in multi-file mode.
    pub fn length(&self) -> Option<i64> {
        match self.layout {
            FileLayout::Single { length } => Some(length),
            FileLayout::Multi { .. } => None,
        }
    }

    /// Files of a multi-file torrent, `None` in single-file mode.
    pub fn files(&self) -> Option<&[FileEntry]> {
        match &self.layout {
            FileLayout::Single { .. } => None,
            FileLayout::Multi { files } => Some(files),
        }
    }
}

impl FileEntry {
    pub fn joined_path(&self) -> String {
        self.path.join("/")
    }
}

/// Maps a decoded tree onto a [`TorrentView`].
///
/// Free-text fields are decoded as UTF-8 with invalid sequences replaced by
/// U+FFFD. The first problem found aborts the mapping.
pub fn map(root: &BValue) -> Result<TorrentView, MapError> {
    let root_dict = match root {
        BValue::Dict(m) => Fields::root(m),
        other => return Err(MapError::RootNotDictionary { found: other.kind() }),
    };

    let announce = root_dict.optional_text("announce")?;
    let announce_list = root_dict.optional_announce_list("announce-list")?;
    let created_by = root_dict.optional_text("created by")?;
    let comment = root_dict.optional_text("comment")?;
    let creation_date = root_dict.optional_integer("creation date")?;
    let encoding = root_dict.optional_text("encoding")?;

    let info = map_info(&root_dict.dict("info")?)?;

    Ok(TorrentView {
        announce,
        announce_list,
        created_by,
        comment,
        creation_date,
        encoding,
        info,
    })
}

fn map_info(info: &Fields) -> Result<InfoView, MapError> {
    let name = info.text("name")?;
    let piece_length = info.integer("piece length")?;

    let pieces_raw = info.bytes("pieces")?;
    if pieces_raw.len() % PIECE_HASH_LEN != 0 {
        return Err(MapError::InvalidPiecesLength {
            field: info.path("pieces"),
            length: pieces_raw.len(),
        });
    }

    let private = info.optional_integer("private")?.map(|flag| flag != 0);

    let layout = match (info.get("length"), info.get("files")) {
        (Some(length), None) => FileLayout::Single {
            length: expect_integer(length, || info.path("length"))?,
        },
        (None, Some(files)) => FileLayout::Multi {
            files: map_files(files, &info.path("files"))?,
        },
        (length, _) => {
            return Err(MapError::AmbiguousFileLayout {
                field: info.scope.clone(),
                both: length.is_some(),
            })
        }
    };

    Ok(InfoView {
        name,
        piece_length,
        pieces_raw: pieces_raw.to_vec(),
        private,
        layout,
    })
}

fn map_files(value: &BValue, field: &str) -> Result<Vec<FileEntry>, MapError> {
    let entries = expect_list(value, || field.to_string())?;

    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| -> Result<FileEntry, MapError> {
            let scope = format!("{}[{}]", field, i);
            let dict = expect_dict(entry, || scope.clone())?;
            let file = Fields { dict, scope };

            let length = file.integer("length")?;
            let segments = file.list("path")?;
            let path = segments
                .iter()
                .enumerate()
                .map(|(j, segment)| {
                    expect_bytes(segment, || format!("{}[{}]", file.path("path"), j)).map(lossy_text)
                })
                .collect::<Result<Vec<_>, _>>()?;

            Ok(FileEntry { path, length })
        })
        .collect()
}

/// One dictionary plus the dotted path leading to it, for error messages.
struct Fields<'a> {
    dict: &'a BDict,
    scope: String,
}

impl<'a> Fields<'a> {
    fn root(dict: &'a BDict) -> Self {
        Fields { dict, scope: String::new() }
    }

    fn path(&self, key: &str) -> String {
        if self.scope.is_empty() {
            key.to_string()
        } else {
            format!("{}.{}", self.scope, key)
        }
    }

    fn get(&self, key: &str) -> Option<&'a BValue> {
        self.dict.get(key.as_bytes())
    }

    fn required(&self, key: &str) -> Result<&'a BValue, MapError> {
        self.get(key)
            .ok_or_else(|| MapError::MissingRequiredField { field: self.path(key) })
    }

    fn bytes(&self, key: &str) -> Result<&'a [u8], MapError> {
        expect_bytes(self.required(key)?, || self.path(key))
    }

    fn text(&self, key: &str) -> Result<String, MapError> {
        self.bytes(key).map(lossy_text)
    }

    fn optional_text(&self, key: &str) -> Result<Option<String>, MapError> {
        self.get(key)
            .map(|v| expect_bytes(v, || self.path(key)).map(lossy_text))
            .transpose()
    }

    fn integer(&self, key: &str) -> Result<i64, MapError> {
        expect_integer(self.required(key)?, || self.path(key))
    }

    fn optional_integer(&self, key: &str) -> Result<Option<i64>, MapError> {
        self.get(key)
            .map(|v| expect_integer(v, || self.path(key)))
            .transpose()
    }

    fn list(&self, key: &str) -> Result<&'a [BValue], MapError> {
        expect_list(self.required(key)?, || self.path(key))
    }

    fn dict(&self, key: &str) -> Result<Fields<'a>, MapError> {
        let scope = self.path(key);
        let dict = expect_dict(self.required(key)?, || scope.clone())?;
        Ok(Fields { dict, scope })
    }

    fn optional_announce_list(&self, key: &str) -> Result<Option<Vec<Vec<String>>>, MapError> {
        let Some(value) = self.get(key) else {
            return Ok(None);
        };
        let field = self.path(key);

        expect_list(value, || field.clone())?
            .iter()
            .enumerate()
            .map(|(i, tier)| -> Result<Vec<String>, MapError> {
                let tier_field = format!("{}[{}]", field, i);
                expect_list(tier, || tier_field.clone())?
                    .iter()
                    .enumerate()
                    .map(|(j, url)| {
                        expect_bytes(url, || format!("{}[{}]", tier_field, j)).map(lossy_text)
                    })
                    .collect::<Result<Vec<String>, MapError>>()
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some)
    }
}

fn lossy_text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

fn mismatch(field: String, expected: &'static str, value: &BValue) -> MapError {
    MapError::FieldTypeMismatch {
        field,
        expected,
        found: value.kind(),
    }
}

fn expect_bytes(value: &BValue, field: impl FnOnce() -> String) -> Result<&[u8], MapError> {
    value
        .as_bytes()
        .ok_or_else(|| mismatch(field(), "byte string", value))
}

fn expect_integer(value: &BValue, field: impl FnOnce() -> String) -> Result<i64, MapError> {
    value
        .as_integer()
        .ok_or_else(|| mismatch(field(), "integer", value))
}

fn expect_list(value: &BValue, field: impl FnOnce() -> String) -> Result<&[BValue], MapError> {
    value
        .as_list()
        .ok_or_else(|| mismatch(field(), "list", value))
}

fn expect_dict(value: &BValue, field: impl FnOnce() -> String) -> Result<&BDict, MapError> {
    value
        .as_dict()
        .ok_or_else(|| mismatch(field(), "dictionary", value))
}
