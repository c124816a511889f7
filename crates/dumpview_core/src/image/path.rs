use crate::image::{ImageError, Result};

/// Parsed dotted field path such as `st.middle.inner.b`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
	/// Field names in navigation order.
	pub steps: Vec<String>,
}

impl FieldPath {
	/// Parse dotted field syntax.
	///
	/// Segments may contain ASCII alphanumerics, `_`, `<`, `>` and `$` so that
	/// compiler-generated backing field names are reachable.
	pub fn parse(input: &str) -> Result<Self> {
		let invalid = || ImageError::InvalidFieldPath { path: input.to_owned() };
		if input.is_empty() {
			return Err(invalid());
		}

		let mut steps = Vec::new();
		for segment in input.split('.') {
			if segment.is_empty() || !segment.bytes().all(is_field_byte) {
				return Err(invalid());
			}
			steps.push(segment.to_owned());
		}

		Ok(Self { steps })
	}
}

fn is_field_byte(byte: u8) -> bool {
	byte.is_ascii_alphanumeric() || matches!(byte, b'_' | b'<' | b'>' | b'$')
}
