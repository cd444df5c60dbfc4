use thiserror::Error;

/// Syntax and structure faults in a bencode stream. Each variant carries the
/// byte offset at which the fault was detected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
	#[error("Malformed input at byte {offset}")]
	MalformedInput { offset: usize },

	#[error("Integer starting at byte {offset} is missing its closing 'e'")]
	UnterminatedInteger { offset: usize },

	#[error("Invalid integer literal at byte {offset}")]
	InvalidIntegerLiteral { offset: usize },

	#[error("String starting at byte {offset} is missing its ':' delimiter")]
	MissingLengthDelimiter { offset: usize },

	#[error("Invalid string length at byte {offset}")]
	InvalidLengthLiteral { offset: usize },

	#[error("String starting at byte {offset} runs past the end of input")]
	TruncatedString { offset: usize },

	#[error("List starting at byte {offset} is missing its closing 'e'")]
	UnterminatedList { offset: usize },

	#[error("Dictionary starting at byte {offset} is missing its closing 'e'")]
	UnterminatedDictionary { offset: usize },

	#[error("Dictionary key at byte {offset} is not a byte string")]
	NonStringKey { offset: usize },

	#[error("Nesting limit exceeded at byte {offset}")]
	NestingTooDeep { offset: usize },

	#[error("Duplicate dictionary key at byte {offset}")]
	DuplicateKey { offset: usize },
}

impl DecodeError {
	pub fn offset(&self) -> usize {
		match *self {
			DecodeError::MalformedInput { offset }
			| DecodeError::UnterminatedInteger { offset }
			| DecodeError::InvalidIntegerLiteral { offset }
			| DecodeError::MissingLengthDelimiter { offset }
			| DecodeError::InvalidLengthLiteral { offset }
			| DecodeError::TruncatedString { offset }
			| DecodeError::UnterminatedList { offset }
			| DecodeError::UnterminatedDictionary { offset }
			| DecodeError::NonStringKey { offset }
			| DecodeError::NestingTooDeep { offset }
			| DecodeError::DuplicateKey { offset } => offset,
		}
	}
}
