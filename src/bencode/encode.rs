use super::BValue;

/// Reference encoder used by the decoder's round-trip tests.
///
/// Dictionaries are written in their stored order, not re-sorted.
pub fn encode_bvalue(value: &BValue) -> Vec<u8> {
	let mut out: Vec<u8> = Vec::new();
	write_bvalue(value, &mut out);
	out
}

fn write_bvalue(value: &BValue, out: &mut Vec<u8>) {
	match value {
		BValue::Integer(i) => {
			out.extend_from_slice(b"i");
			out.extend_from_slice(i.to_string().as_bytes());
			out.extend_from_slice(b"e");
		}
		BValue::ByteString(bytes) => write_bytes(bytes, out),
		BValue::List(items) => {
			out.push(b'l');
			for item in items {
				write_bvalue(item, out);
			}
			out.push(b'e');
		}
		BValue::Dict(dict) => {
			out.push(b'd');
			for (key, val) in dict.iter() {
				write_bytes(key, out);
				write_bvalue(val, out);
			}
			out.push(b'e');
		}
	}
}

fn write_bytes(bytes: &[u8], out: &mut Vec<u8>) {
	out.extend_from_slice(bytes.len().to_string().as_bytes());
	out.push(b':');
	out.extend_from_slice(bytes);
}
