use thiserror::Error;

/// Mismatches between a decoded tree and the metainfo conventions.
///
/// Field names are dotted paths from the root, e.g. `info.files[2].path`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MapError {
    #[error("Root of .torrent must be a dictionary, found {found}")]
    RootNotDictionary { found: &'static str },

    #[error("Missing required field '{field}'")]
    MissingRequiredField { field: String },

    #[error("'{field}' must be a {expected}, found {found}")]
    FieldTypeMismatch {
        field: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("'{field}' is {length} bytes long, not a multiple of 20")]
    InvalidPiecesLength { field: String, length: usize },

    #[error("'{field}' must hold exactly one of 'length' or 'files' (found {})", layout_found(.both))]
    AmbiguousFileLayout { field: String, both: bool },
}

impl MapError {
    /// The offending field; the root itself is reported as `(root)`.
    pub fn field(&self) -> &str {
        match self {
            MapError::RootNotDictionary { .. } => "(root)",
            MapError::MissingRequiredField { field }
            | MapError::FieldTypeMismatch { field, .. }
            | MapError::InvalidPiecesLength { field, .. }
            | MapError::AmbiguousFileLayout { field, .. } => field,
        }
    }
}

fn layout_found(both: &bool) -> &'static str {
    if *both {
        "both"
    } else {
        "neither"
    }
}
