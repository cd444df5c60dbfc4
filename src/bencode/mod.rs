pub mod bvalue;
pub mod decode;
#[cfg(test)]
pub mod encode;
pub mod error;

pub use bvalue::{BDict, BValue};   // re-export
pub use decode::{decode, decode_prefix, decode_with, dict_entry_span, decode_with_entry_span, DecodeOptions, DuplicateKeyPolicy, DEFAULT_MAX_DEPTH, MAX_DEPTH_CEILING};   // re-export
pub use error::DecodeError;   // re-export
