use std::collections::HashMap;

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BValue {
	ByteString(Vec<u8>), // raw bytes for any string
	Integer(i64),
	List(Vec<BValue>),
	Dict(BDict) // keys kept in the order they appear on disk
}

impl BValue {
	pub fn as_integer(&self) -> Option<i64> {
		match self {
			BValue::Integer(i) => Some(*i),
			_ => None,
		}
	}

	pub fn as_bytes(&self) -> Option<&[u8]> {
		match self {
			BValue::ByteString(b) => Some(b),
			_ => None,
		}
	}

	pub fn as_list(&self) -> Option<&[BValue]> {
		match self {
			BValue::List(items) => Some(items),
			_ => None,
		}
	}

	pub fn as_dict(&self) -> Option<&BDict> {
		match self {
			BValue::Dict(d) => Some(d),
			_ => None,
		}
	}

	/// Short name of the variant, used when reporting type mismatches.
	pub fn kind(&self) -> &'static str {
		match self {
			BValue::ByteString(_) => "byte string",
			BValue::Integer(_) => "integer",
			BValue::List(_) => "list",
			BValue::Dict(_) => "dictionary",
		}
	}
}

/// Dictionary with raw byte-string keys that iterates in encounter order.
///
/// Inserting a key that already exists replaces its value but keeps the
/// position where the key was first seen. Lookups go through a key index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BDict {
	entries: Vec<(Vec<u8>, BValue)>,
	index: HashMap<Vec<u8>, usize>, // key -> position in `entries`
}

impl BDict {
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns the previous value if `key` was already present.
	pub fn insert(&mut self, key: Vec<u8>, value: BValue) -> Option<BValue> {
		match self.index.get(&key) {
			Some(&pos) => Some(std::mem::replace(&mut self.entries[pos].1, value)),
			None => {
				self.index.insert(key.clone(), self.entries.len());
				self.entries.push((key, value));
				None
			}
		}
	}

	pub fn get(&self, key: &[u8]) -> Option<&BValue> {
		self.index.get(key).map(|&pos| &self.entries[pos].1)
	}

	pub fn contains_key(&self, key: &[u8]) -> bool {
		self.index.contains_key(key)
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = (&[u8], &BValue)> {
		self.entries.iter().map(|(k, v)| (k.as_slice(), v))
	}

	pub fn keys(&self) -> impl Iterator<Item = &[u8]> {
		self.entries.iter().map(|(k, _)| k.as_slice())
	}
}

impl FromIterator<(Vec<u8>, BValue)> for BDict {
	fn from_iter<I: IntoIterator<Item = (Vec<u8>, BValue)>>(iter: I) -> Self {
		let mut dict = BDict::new();
		for (k, v) in iter {
			dict.insert(k, v);
		}
		dict
	}
}

/// JSON-friendly projection:
///
/// - `Integer(i)` => number
/// - `ByteString(bytes)` => string if valid UTF-8, otherwise `{"_bytes_hex": "..."}`
/// - `List(...)` => array
/// - `Dict(...)` => object, keys lossily decoded
impl Serialize for BValue {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		match self {
			BValue::Integer(i) => serializer.serialize_i64(*i),
			BValue::ByteString(bytes) => match std::str::from_utf8(bytes) {
				Ok(s) => serializer.serialize_str(s),
				Err(_) => {
					let mut map = serializer.serialize_map(Some(1))?;
					map.serialize_entry("_bytes_hex", &hex::encode(bytes))?;
					map.end()
				}
			},
			BValue::List(items) => {
				let mut seq = serializer.serialize_seq(Some(items.len()))?;
				for item in items {
					seq.serialize_element(item)?;
				}
				seq.end()
			}
			BValue::Dict(dict) => {
				let mut map = serializer.serialize_map(Some(dict.len()))?;
				for (k, v) in dict.iter() {
					map.serialize_entry(&String::from_utf8_lossy(k), v)?;
				}
				map.end()
			}
		}
	}
}
