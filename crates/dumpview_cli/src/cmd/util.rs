use dumpview::image::Result;
use serde::Serialize;

/// Render an address as fixed-width hex.
pub(crate) fn ptr_hex(value: u64) -> String {
	format!("0x{value:016x}")
}

/// Print a payload as pretty JSON on stdout.
pub(crate) fn emit_json<T: Serialize>(payload: &T) -> Result<()> {
	println!("{}", serde_json::to_string_pretty(payload)?);
	Ok(())
}

/// Truncate text to `max` Unicode scalar values, marking the cut.
pub(crate) fn truncate(text: &str, max: usize) -> String {
	match text.char_indices().nth(max) {
		Some((cut, _)) => format!("{}...", &text[..cut]),
		None => text.to_owned(),
	}
}
