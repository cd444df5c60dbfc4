pub mod error;
pub mod infohash;
pub mod metadata;
pub mod metainfo;

pub use error::MapError;
pub use infohash::{info_hash, InfoHash, InfoHashError};
pub use metadata::{map, FileEntry, FileLayout, InfoView, TorrentView, PIECE_HASH_LEN};
pub use metainfo::Metainfo;
