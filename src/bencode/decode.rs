use std::ops::Range;

use serde::Deserialize;

use super::bvalue::{BDict, BValue};
use super::error::DecodeError;

/// Maximum number of simultaneously open lists/dictionaries accepted by default.
/// Real torrent files rarely go past a handful of levels.
pub const DEFAULT_MAX_DEPTH: usize = 512;

/// Hard upper bound on `max_depth`. Decoded trees are dropped, compared and
/// serialized recursively, so deeper trees could exhaust the call stack.
pub const MAX_DEPTH_CEILING: usize = 1024;

/// What to do when a dictionary repeats a key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicateKeyPolicy {
    /// Later values overwrite earlier ones.
    #[default]
    LastWins,
    /// Fail with [`DecodeError::DuplicateKey`].
    Reject,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DecodeOptions {
    pub max_depth: usize,
    pub duplicate_keys: DuplicateKeyPolicy,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            duplicate_keys: DuplicateKeyPolicy::LastWins,
        }
    }
}

/// Read position into the input buffer. Only ever moves forward.
struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn position(&self) -> usize {
        self.pos
    }

    fn peek(&self) -> Option<u8> {
        self.buf.get(self.pos).copied()
    }

    fn bump(&mut self) {
        self.advance_to(self.pos + 1);
    }

    fn advance_to(&mut self, pos: usize) {
        debug_assert!(pos >= self.pos && pos <= self.buf.len());
        self.pos = pos;
    }

    /// Absolute index of the next `byte` at or after `from`.
    fn find(&self, from: usize, byte: u8) -> Option<usize> {
        self.buf
            .get(from..)?
            .iter()
            .position(|&b| b == byte)
            .map(|i| from + i)
    }
}

/// An open container on the worklist.
enum Frame {
    List {
        start: usize,
        items: Vec<BValue>,
    },
    Dict {
        start: usize,
        map: BDict,
        // key already read, waiting for its value
        pending_key: Option<(usize, Vec<u8>)>,
    },
}

impl Frame {
    fn unterminated(&self) -> DecodeError {
        match *self {
            Frame::List { start, .. } => DecodeError::UnterminatedList { offset: start },
            Frame::Dict { start, .. } => DecodeError::UnterminatedDictionary { offset: start },
        }
    }

    fn awaiting_key(&self) -> bool {
        matches!(self, Frame::Dict { pending_key: None, .. })
    }

    /// A dictionary holding a key without its value cannot be closed.
    fn can_close(&self) -> bool {
        !matches!(self, Frame::Dict { pending_key: Some(_), .. })
    }

    fn finish(self) -> (usize, BValue) {
        match self {
            Frame::List { start, items } => (start, BValue::List(items)),
            Frame::Dict { start, map, .. } => (start, BValue::Dict(map)),
        }
    }
}

/// Decodes the first value in `input` with default options.
///
/// Bytes after the first complete value are left unread.
pub fn decode(input: &[u8]) -> Result<BValue, DecodeError> {
    decode_with(input, &DecodeOptions::default())
}

pub fn decode_with(input: &[u8], options: &DecodeOptions) -> Result<BValue, DecodeError> {
    decode_prefix(input, options).map(|(_, value)| value)
}

/// Decodes the first value in `input`, returning the number of bytes it spans.
pub fn decode_prefix(
    input: &[u8],
    options: &DecodeOptions,
) -> Result<(usize, BValue), DecodeError> {
    run(input, options, |_, _| {})
}

/// Returns the raw byte range of the value stored under `key` in the root
/// dictionary of `input`. If the key repeats, the last occurrence wins.
pub fn dict_entry_span(
    input: &[u8],
    key: &[u8],
    options: &DecodeOptions,
) -> Result<Option<Range<usize>>, DecodeError> {
    if input.first() != Some(&b'd') {
        return Err(DecodeError::MalformedInput { offset: 0 });
    }

    decode_with_entry_span(input, key, options).map(|(_, span)| span)
}

/// Decodes `input` like [`decode_with`], also returning the raw byte range of
/// the root dictionary's `key` entry when the root is a dictionary holding it.
pub fn decode_with_entry_span(
    input: &[u8],
    key: &[u8],
    options: &DecodeOptions,
) -> Result<(BValue, Option<Range<usize>>), DecodeError> {
    let mut span = None;
    let (_, value) = run(input, options, |k, range| {
        if k == key {
            span = Some(range);
        }
    })?;
    Ok((value, span))
}

/// Worklist decoder shared by the public entry points. `on_root_entry` sees
/// every key/value pair completed directly inside a root dictionary.
fn run<F>(input: &[u8], options: &DecodeOptions, mut on_root_entry: F) -> Result<(usize, BValue), DecodeError>
where
    F: FnMut(&[u8], Range<usize>),
{
    let mut cursor = Cursor::new(input);
    let mut stack: Vec<Frame> = Vec::new();
    let max_depth = options.max_depth.min(MAX_DEPTH_CEILING);

    loop {
        let closed = match stack.last() {
            Some(frame) => match cursor.peek() {
                None => return Err(frame.unterminated()),
                Some(b'e') if frame.can_close() => {
                    cursor.bump();
                    stack.pop().map(Frame::finish)
                }
                Some(_) => None,
            },
            None => None,
        };

        let (start, value) = match closed {
            Some(done) => done,
            None => {
                let start = cursor.position();
                let lead = cursor
                    .peek()
                    .ok_or(DecodeError::MalformedInput { offset: start })?;

                // Keys must be byte strings; catch anything else before parsing it.
                if stack.last().map_or(false, Frame::awaiting_key) && !lead.is_ascii_digit() {
                    return Err(match lead {
                        b'i' | b'l' | b'd' => DecodeError::NonStringKey { offset: start },
                        _ => DecodeError::MalformedInput { offset: start },
                    });
                }

                match lead {
                    b'i' => (start, decode_integer(&mut cursor)?),
                    b'0'..=b'9' => (start, decode_string(&mut cursor)?),
                    b'l' | b'd' => {
                        if stack.len() >= max_depth {
                            return Err(DecodeError::NestingTooDeep { offset: start });
                        }
                        cursor.bump();
                        stack.push(if lead == b'l' {
                            Frame::List { start, items: Vec::new() }
                        } else {
                            Frame::Dict { start, map: BDict::new(), pending_key: None }
                        });
                        continue;
                    }
                    _ => return Err(DecodeError::MalformedInput { offset: start }),
                }
            }
        };

        let at_root = stack.len() == 1;
        match stack.last_mut() {
            None => return Ok((cursor.position(), value)),
            Some(Frame::List { items, .. }) => items.push(value),
            Some(Frame::Dict { map, pending_key, .. }) => match pending_key.take() {
                None => match value {
                    BValue::ByteString(key) => *pending_key = Some((start, key)),
                    _ => return Err(DecodeError::NonStringKey { offset: start }),
                },
                Some((key_offset, key)) => {
                    if options.duplicate_keys == DuplicateKeyPolicy::Reject && map.contains_key(&key) {
                        return Err(DecodeError::DuplicateKey { offset: key_offset });
                    }
                    if at_root {
                        on_root_entry(&key, start..cursor.position());
                    }
                    map.insert(key, value);
                }
            },
        }
    }
}

/// Decodes `i<digits>e`; the cursor sits on the `i`.
fn decode_integer(cursor: &mut Cursor) -> Result<BValue, DecodeError> {
    let start = cursor.position();
    let end = cursor
        .find(start + 1, b'e')
        .ok_or(DecodeError::UnterminatedInteger { offset: start })?;

    let parsed = parse_integer_literal(&cursor.buf[start + 1..end])
        .ok_or(DecodeError::InvalidIntegerLiteral { offset: start })?;

    cursor.advance_to(end + 1);
    Ok(BValue::Integer(parsed))
}

/// Base-10, optional leading `-`, no `+`. Leading zeros are tolerated.
fn parse_integer_literal(literal: &[u8]) -> Option<i64> {
    let digits = literal.strip_prefix(b"-").unwrap_or(literal);
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }
    std::str::from_utf8(literal).ok()?.parse::<i64>().ok()
}

/// Decodes `<length>:<bytes>`; the cursor sits on the first length digit.
fn decode_string(cursor: &mut Cursor) -> Result<BValue, DecodeError> {
    let start = cursor.position();
    let colon = cursor
        .find(start, b':')
        .ok_or(DecodeError::MissingLengthDelimiter { offset: start })?;

    let literal = &cursor.buf[start..colon];
    let length = if literal.iter().all(u8::is_ascii_digit) {
        std::str::from_utf8(literal)
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
    } else {
        None
    }
    .ok_or(DecodeError::InvalidLengthLiteral { offset: start })?;

    let data_start = colon + 1;
    let data_end = data_start
        .checked_add(length)
        .filter(|&end| end <= cursor.buf.len())
        .ok_or(DecodeError::TruncatedString { offset: start })?;

    let data = cursor.buf[data_start..data_end].to_vec();
    cursor.advance_to(data_end);
    Ok(BValue::ByteString(data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bencode::encode::encode_bvalue;

    fn bytes(s: &str) -> BValue {
        BValue::ByteString(s.as_bytes().to_vec())
    }

    #[test]
    fn test_decode_integer() {
        assert_eq!(decode(b"i42e").unwrap(), BValue::Integer(42));
        assert_eq!(decode(b"i-3e").unwrap(), BValue::Integer(-3));
        assert_eq!(decode(b"i0e").unwrap(), BValue::Integer(0));
    }

    #[test]
    fn test_decode_integer_extremes() {
        assert_eq!(
            decode(b"i-9223372036854775808e").unwrap(),
            BValue::Integer(i64::MIN)
        );
        assert_eq!(
            decode(b"i9223372036854775808e"),
            Err(DecodeError::InvalidIntegerLiteral { offset: 0 })
        );
    }

    #[test]
    fn test_decode_integer_leading_zeros_tolerated() {
        assert_eq!(decode(b"i003e").unwrap(), BValue::Integer(3));
        assert_eq!(decode(b"i-0e").unwrap(), BValue::Integer(0));
    }

    #[test]
    fn test_decode_invalid_integer_literals() {
        for input in [&b"i3.5e"[..], b"ie", b"i-e", b"i+3e", b"i1-2e", b"i 1e"] {
            assert_eq!(
                decode(input),
                Err(DecodeError::InvalidIntegerLiteral { offset: 0 }),
                "input {:?}",
                String::from_utf8_lossy(input)
            );
        }
    }

    #[test]
    fn test_decode_integer_missing_e() {
        assert_eq!(decode(b"i42"), Err(DecodeError::UnterminatedInteger { offset: 0 }));
    }

    #[test]
    fn test_decode_string() {
        assert_eq!(decode(b"4:spam").unwrap(), bytes("spam"));
        assert_eq!(decode(b"0:").unwrap(), bytes(""));
    }

    #[test]
    fn test_decode_string_is_opaque() {
        let input = b"4:\xff\x00e:";
        assert_eq!(decode(input).unwrap(), BValue::ByteString(vec![0xff, 0x00, b'e', b':']));
    }

    #[test]
    fn test_decode_truncated_string() {
        assert_eq!(decode(b"4:sp"), Err(DecodeError::TruncatedString { offset: 0 }));
        assert_eq!(
            decode(b"18446744073709551615:x"),
            Err(DecodeError::TruncatedString { offset: 0 })
        );
    }

    #[test]
    fn test_decode_string_missing_colon() {
        assert_eq!(decode(b"5hello"), Err(DecodeError::MissingLengthDelimiter { offset: 0 }));
    }

    #[test]
    fn test_decode_string_bad_length() {
        assert_eq!(decode(b"4x:spam"), Err(DecodeError::InvalidLengthLiteral { offset: 0 }));
        assert_eq!(
            decode(b"99999999999999999999999:x"),
            Err(DecodeError::InvalidLengthLiteral { offset: 0 })
        );
    }

    #[test]
    fn test_decode_list() {
        assert_eq!(
            decode(b"l4:spam4:eggse").unwrap(),
            BValue::List(vec![bytes("spam"), bytes("eggs")])
        );
        assert_eq!(decode(b"le").unwrap(), BValue::List(vec![]));
    }

    #[test]
    fn test_decode_nested_list() {
        let input = b"l4:spaml3:eggi3eee";
        let (consumed, value) = decode_prefix(input, &DecodeOptions::default()).unwrap();
        assert_eq!(consumed, input.len());
        assert_eq!(
            value,
            BValue::List(vec![
                bytes("spam"),
                BValue::List(vec![bytes("egg"), BValue::Integer(3)]),
            ])
        );
    }

    #[test]
    fn test_decode_list_unclosed() {
        assert_eq!(decode(b"l4:spam"), Err(DecodeError::UnterminatedList { offset: 0 }));
        assert_eq!(decode(b"lli1ee"), Err(DecodeError::UnterminatedList { offset: 0 }));
    }

    #[test]
    fn test_decode_list_element_error_propagates() {
        assert_eq!(decode(b"l4:spamxe"), Err(DecodeError::MalformedInput { offset: 7 }));
        assert_eq!(decode(b"li1ei2.0ee"), Err(DecodeError::InvalidIntegerLiteral { offset: 4 }));
    }

    #[test]
    fn test_decode_dict_preserves_order() {
        let value = decode(b"d3:cow3:moo4:spam4:eggse").unwrap();
        let dict = value.as_dict().unwrap();
        let keys: Vec<&[u8]> = dict.keys().collect();
        assert_eq!(keys, vec![b"cow".as_slice(), b"spam".as_slice()]);
        assert_eq!(dict.get(b"cow"), Some(&bytes("moo")));
        assert_eq!(dict.get(b"spam"), Some(&bytes("eggs")));
    }

    #[test]
    fn test_decode_dict_unsorted_keys_accepted() {
        let value = decode(b"d3:foo3:bar3:abci42ee").unwrap();
        let keys: Vec<&[u8]> = value.as_dict().unwrap().keys().collect();
        assert_eq!(keys, vec![b"foo".as_slice(), b"abc".as_slice()]);
        assert!(decode(b"d3:bar4:spam3:fooi42ee").is_ok());
    }

    #[test]
    fn test_decode_empty_dict() {
        assert_eq!(decode(b"de").unwrap(), BValue::Dict(BDict::new()));
    }

    #[test]
    fn test_decode_dict_unclosed() {
        assert_eq!(decode(b"d3:foo4:spam"), Err(DecodeError::UnterminatedDictionary { offset: 0 }));
        assert_eq!(decode(b"d3:foo"), Err(DecodeError::UnterminatedDictionary { offset: 0 }));
    }

    #[test]
    fn test_decode_dict_key_without_value() {
        assert_eq!(decode(b"d3:fooe"), Err(DecodeError::MalformedInput { offset: 6 }));
    }

    #[test]
    fn test_decode_dict_key_not_string() {
        assert_eq!(decode(b"di42e4:spame"), Err(DecodeError::NonStringKey { offset: 1 }));
        assert_eq!(decode(b"d3:fooi1eli1ee1:ae"), Err(DecodeError::NonStringKey { offset: 9 }));
        assert_eq!(decode(b"dde1:ae"), Err(DecodeError::NonStringKey { offset: 1 }));
    }

    #[test]
    fn test_decode_duplicate_keys_last_wins() {
        let value = decode(b"d1:ai1e1:bi2e1:ai3ee").unwrap();
        let dict = value.as_dict().unwrap();
        assert_eq!(dict.len(), 2);
        assert_eq!(dict.get(b"a"), Some(&BValue::Integer(3)));
    }

    #[test]
    fn test_decode_duplicate_keys_rejected() {
        let options = DecodeOptions {
            duplicate_keys: DuplicateKeyPolicy::Reject,
            ..DecodeOptions::default()
        };
        assert_eq!(
            decode_with(b"d1:ai1e1:bi2e1:ai3ee", &options),
            Err(DecodeError::DuplicateKey { offset: 13 })
        );
    }

    #[test]
    fn test_decode_malformed_lead_byte() {
        assert_eq!(decode(b""), Err(DecodeError::MalformedInput { offset: 0 }));
        assert_eq!(decode(b"x"), Err(DecodeError::MalformedInput { offset: 0 }));
        assert_eq!(decode(b"e"), Err(DecodeError::MalformedInput { offset: 0 }));
    }

    #[test]
    fn test_decode_leaves_trailing_bytes() {
        let (consumed, value) = decode_prefix(b"i1etrailing", &DecodeOptions::default()).unwrap();
        assert_eq!(consumed, 3);
        assert_eq!(value, BValue::Integer(1));
    }

    #[test]
    fn test_nesting_too_deep() {
        let mut input = vec![b'l'; 10_000];
        input.extend(vec![b'e'; 10_000]);
        assert_eq!(
            decode(&input),
            Err(DecodeError::NestingTooDeep { offset: DEFAULT_MAX_DEPTH })
        );
    }

    #[test]
    fn test_nesting_limit_is_configurable() {
        let options = DecodeOptions { max_depth: 2, ..DecodeOptions::default() };
        assert!(decode_with(b"lle1:xe", &options).is_ok());
        assert_eq!(
            decode_with(b"ld1:alee", &options),
            Err(DecodeError::NestingTooDeep { offset: 5 })
        );
        // scalars do not count towards the limit
        assert!(decode_with(b"ld1:ai1eee", &options).is_ok());
    }

    /// xorshift64, enough to vary generated trees deterministically
    struct Shapes(u64);

    impl Shapes {
        fn next(&mut self) -> u64 {
            self.0 ^= self.0 << 13;
            self.0 ^= self.0 >> 7;
            self.0 ^= self.0 << 17;
            self.0
        }

        fn bytes(&mut self) -> Vec<u8> {
            let len = (self.next() % 6) as usize;
            (0..len).map(|_| self.next() as u8).collect()
        }

        fn tree(&mut self, depth: usize) -> BValue {
            let pick = if depth == 0 { self.next() % 2 } else { self.next() % 4 };
            match pick {
                0 => BValue::Integer(self.next() as i64),
                1 => BValue::ByteString(self.bytes()),
                2 => {
                    let len = (self.next() % 4) as usize;
                    BValue::List((0..len).map(|_| self.tree(depth - 1)).collect())
                }
                _ => {
                    let len = (self.next() % 4) as usize;
                    let mut dict = BDict::new();
                    for _ in 0..len {
                        let key = self.bytes();
                        let value = self.tree(depth - 1);
                        dict.insert(key, value);
                    }
                    BValue::Dict(dict)
                }
            }
        }
    }

    #[test]
    fn test_round_trip_shape() {
        let inner: BDict = vec![
            (b"zeta".to_vec(), BValue::Integer(-7)),
            (b"alpha".to_vec(), BValue::ByteString(vec![0, 159, 146, 150])),
        ]
        .into_iter()
        .collect();
        let tree = BValue::List(vec![
            BValue::Integer(i64::MAX),
            BValue::ByteString(Vec::new()),
            BValue::Dict(inner),
            BValue::List(vec![BValue::List(vec![]), BValue::Dict(BDict::new())]),
        ]);

        let encoded = encode_bvalue(&tree);
        let (consumed, decoded) = decode_prefix(&encoded, &DecodeOptions::default()).unwrap();
        assert_eq!(consumed, encoded.len());
        assert_eq!(decoded, tree);
    }

    #[test]
    fn test_round_trip_generated_trees() {
        let mut shapes = Shapes(0x9e37_79b9_7f4a_7c15);
        for depth in 0..7 {
            for _ in 0..50 {
                let tree = shapes.tree(depth);
                let encoded = encode_bvalue(&tree);
                let (consumed, decoded) =
                    decode_prefix(&encoded, &DecodeOptions::default()).unwrap();
                assert_eq!(consumed, encoded.len());
                assert_eq!(decoded, tree, "encoded {:?}", String::from_utf8_lossy(&encoded));
            }
        }
    }

    #[test]
    fn test_decode_dict_with_many_keys() {
        let mut input = b"d".to_vec();
        for i in 0..50_000 {
            input.extend_from_slice(format!("7:k{:06}i{}e", i, i).as_bytes());
        }
        input.push(b'e');

        let value = decode(&input).unwrap();
        let dict = value.as_dict().unwrap();
        assert_eq!(dict.len(), 50_000);
        assert_eq!(dict.get(b"k049999"), Some(&BValue::Integer(49_999)));
        assert_eq!(dict.keys().next(), Some(b"k000000".as_slice()));
    }

    #[test]
    fn test_depth_ceiling_overrides_larger_limit() {
        let options = DecodeOptions { max_depth: 1_000_000, ..DecodeOptions::default() };
        let mut input = vec![b'l'; 300_000];
        input.extend(vec![b'e'; 300_000]);
        assert_eq!(
            decode_with(&input, &options),
            Err(DecodeError::NestingTooDeep { offset: MAX_DEPTH_CEILING })
        );

        let mut input = vec![b'l'; MAX_DEPTH_CEILING];
        input.extend(vec![b'e'; MAX_DEPTH_CEILING]);
        let deepest = decode_with(&input, &options).unwrap();
        drop(deepest);
    }

    #[test]
    fn test_dict_entry_span() {
        let input = b"d8:announce3:url4:infod4:name1:xe3:zzzi1ee";
        let span = dict_entry_span(input, b"info", &DecodeOptions::default())
            .unwrap()
            .unwrap();
        assert_eq!(&input[span], b"d4:name1:xe");
        assert_eq!(dict_entry_span(input, b"missing", &DecodeOptions::default()), Ok(None));
    }

    #[test]
    fn test_dict_entry_span_ignores_nested_keys() {
        let input = b"d1:ad4:infoi1ee4:infoi2ee";
        let span = dict_entry_span(input, b"info", &DecodeOptions::default())
            .unwrap()
            .unwrap();
        assert_eq!(&input[span], b"i2e");
    }

    #[test]
    fn test_dict_entry_span_requires_dict_root() {
        assert_eq!(
            dict_entry_span(b"li1ee", b"info", &DecodeOptions::default()),
            Err(DecodeError::MalformedInput { offset: 0 })
        );
    }
}
