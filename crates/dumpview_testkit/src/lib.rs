//! Shared test helpers for workspace crates.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Resolve the workspace root path.
pub fn workspace_root() -> PathBuf {
	let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
	manifest_dir
		.join("..")
		.join("..")
		.canonicalize()
		.unwrap_or_else(|_| manifest_dir.join("..").join(".."))
}

/// Resolve a fixture path under `<workspace>/fixtures`.
pub fn fixture_path(name: &str) -> PathBuf {
	workspace_root().join("fixtures").join(name)
}

/// Little-endian writer for synthetic captured images.
///
/// Regions are zero-filled on creation; writes outside every region panic.
#[derive(Debug, Clone)]
pub struct ImageBuilder {
	pointer_size: usize,
	regions: BTreeMap<u64, Vec<u8>>,
}

impl ImageBuilder {
	/// Start an image with the given pointer width.
	pub fn new(pointer_size: usize) -> Self {
		assert!(matches!(pointer_size, 4 | 8), "pointer size must be 4 or 8");
		Self {
			pointer_size,
			regions: BTreeMap::new(),
		}
	}

	/// Pointer width of the image under construction.
	pub fn pointer_size(&self) -> usize {
		self.pointer_size
	}

	/// Map `len` zero bytes at `base`.
	pub fn region(mut self, base: u64, len: usize) -> Self {
		self.regions.insert(base, vec![0; len]);
		self
	}

	/// Copy raw bytes to `address`.
	pub fn bytes(mut self, address: u64, data: &[u8]) -> Self {
		let (base, region) = self
			.regions
			.range_mut(..=address)
			.next_back()
			.unwrap_or_else(|| panic!("no region for 0x{address:x}"));
		let start = (address - *base) as usize;
		let end = start + data.len();
		assert!(end <= region.len(), "write at 0x{address:x} overruns region 0x{base:x}");
		region[start..end].copy_from_slice(data);
		self
	}

	/// Write a boolean as one byte.
	pub fn bool(self, address: u64, value: bool) -> Self {
		self.bytes(address, &[u8::from(value)])
	}

	/// Write a `u8`.
	pub fn u8(self, address: u64, value: u8) -> Self {
		self.bytes(address, &[value])
	}

	/// Write a `u16`.
	pub fn u16(self, address: u64, value: u16) -> Self {
		self.bytes(address, &value.to_le_bytes())
	}

	/// Write a `u32`.
	pub fn u32(self, address: u64, value: u32) -> Self {
		self.bytes(address, &value.to_le_bytes())
	}

	/// Write a `u64`.
	pub fn u64(self, address: u64, value: u64) -> Self {
		self.bytes(address, &value.to_le_bytes())
	}

	/// Write an `f32`.
	pub fn f32(self, address: u64, value: f32) -> Self {
		self.bytes(address, &value.to_le_bytes())
	}

	/// Write an `f64`.
	pub fn f64(self, address: u64, value: f64) -> Self {
		self.bytes(address, &value.to_le_bytes())
	}

	/// Write a pointer-sized word.
	pub fn ptr(self, address: u64, value: u64) -> Self {
		if self.pointer_size == 4 {
			let narrow = u32::try_from(value).expect("pointer fits in 32 bits");
			self.u32(address, narrow)
		} else {
			self.u64(address, value)
		}
	}

	/// Write a runtime string object: type handle, `u32` length, UTF-16 chars.
	pub fn string_object(self, address: u64, type_handle: u64, text: &str) -> Self {
		let units: Vec<u16> = text.encode_utf16().collect();
		let ptr = self.pointer_size as u64;
		let mut chars = Vec::with_capacity(units.len() * 2);
		for unit in &units {
			chars.extend_from_slice(&unit.to_le_bytes());
		}
		self.ptr(address, type_handle)
			.u32(address + ptr, units.len() as u32)
			.bytes(address + ptr + 4, &chars)
	}

	/// Finish into `(base, bytes)` pairs in ascending address order.
	pub fn build(self) -> Vec<(u64, Vec<u8>)> {
		self.regions.into_iter().collect()
	}

	/// Render regions as manifest `regions` entries with inline hex payloads.
	pub fn manifest_regions(&self) -> serde_json::Value {
		let items = self
			.regions
			.iter()
			.map(|(base, bytes)| {
				serde_json::json!({
					"base": format!("0x{base:x}"),
					"hex": to_hex(bytes),
				})
			})
			.collect();
		serde_json::Value::Array(items)
	}
}

/// Encode bytes as lowercase hex.
pub fn to_hex(bytes: &[u8]) -> String {
	let mut out = String::with_capacity(bytes.len() * 2);
	for byte in bytes {
		out.push_str(&format!("{byte:02x}"));
	}
	out
}
