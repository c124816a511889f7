use std::fs::File;
use std::io::Read;
use std::path::Path;

use memmap2::Mmap;

use crate::image::memory::RegionBytes;
use crate::image::{ImageError, Result};

const MAX_DECOMPRESSED_BYTES: usize = 1024 * 1024 * 1024;
/// zstd frame magic used by compressed region files.
pub const ZSTD_MAGIC: [u8; 4] = [0x28, 0xB5, 0x2F, 0xFD];

/// Compression mode detected for a region file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
	/// Raw bytes, memory-mapped in place.
	None,
	/// zstd-compressed bytes, decoded into memory.
	Zstd,
}

impl Compression {
	/// Render compression mode as a stable lowercase label.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::None => "none",
			Self::Zstd => "zstd",
		}
	}
}

/// Load a region file, mapping raw files and decoding zstd ones.
pub fn load_region_file(path: &Path) -> Result<(Compression, RegionBytes)> {
	let file = File::open(path)?;
	if file.metadata()?.len() == 0 {
		return Ok((Compression::None, RegionBytes::Owned(Vec::new())));
	}

	// SAFETY: captured images are treated as immutable for the lifetime of the snapshot.
	let map = unsafe { Mmap::map(&file) }?;
	if map.starts_with(&ZSTD_MAGIC) {
		let out = decode_zstd(&map)?;
		return Ok((Compression::Zstd, RegionBytes::Owned(out)));
	}

	Ok((Compression::None, RegionBytes::Mapped(map)))
}

fn decode_zstd(raw: &[u8]) -> Result<Vec<u8>> {
	let mut decoder = zstd::stream::read::Decoder::new(raw)?;
	let mut out = Vec::new();
	let mut buf = [0_u8; 8192];

	loop {
		let read = decoder.read(&mut buf)?;
		if read == 0 {
			break;
		}

		if out.len() + read > MAX_DECOMPRESSED_BYTES {
			return Err(ImageError::DecompressedTooLarge { limit: MAX_DECOMPRESSED_BYTES });
		}

		out.extend_from_slice(&buf[..read]);
	}

	Ok(out)
}
