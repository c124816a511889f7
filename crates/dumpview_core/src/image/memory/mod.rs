use std::ops::Deref;

use memmap2::Mmap;

use crate::image::{ImageError, Result};

mod stream;

pub use stream::{StreamExtent, StreamImage};

#[cfg(test)]
mod tests;

/// Read access to the bytes of a captured image.
///
/// Implementations are pure readers over an immutable snapshot and must be
/// safe to call from several threads at once.
pub trait MemoryReader: Send + Sync {
	/// Pointer width of the captured image in bytes (4 or 8).
	fn pointer_size(&self) -> usize;

	/// Fill `buf` with the bytes at `address..address + buf.len()`.
	///
	/// Fails with [`ImageError::OutOfRange`] when any byte of the range is unmapped.
	fn read_into(&self, address: u64, buf: &mut [u8]) -> Result<()>;

	/// Read `len` bytes starting at `address`.
	fn read(&self, address: u64, len: usize) -> Result<Vec<u8>> {
		let mut out = vec![0_u8; len];
		self.read_into(address, &mut out)?;
		Ok(out)
	}

	/// Read one pointer-sized word and widen it to `u64`.
	fn read_pointer(&self, address: u64) -> Result<u64> {
		let size = self.pointer_size();
		let mut buf = [0_u8; 8];
		let slot = buf.get_mut(..size).ok_or(ImageError::UnsupportedPointerSize { size })?;
		self.read_into(address, slot)?;
		decode_pointer(slot, size)
	}
}

/// Validate an image pointer width.
pub fn check_pointer_size(size: usize) -> Result<usize> {
	match size {
		4 | 8 => Ok(size),
		_ => Err(ImageError::UnsupportedPointerSize { size }),
	}
}

/// Decode a little-endian pointer-sized word from the front of `bytes`.
pub fn decode_pointer(bytes: &[u8], pointer_size: usize) -> Result<u64> {
	let raw = bytes.get(..pointer_size).ok_or(ImageError::InlineSliceOob {
		start: 0,
		size: pointer_size,
		have: bytes.len(),
	})?;
	match pointer_size {
		4 => {
			let mut arr = [0_u8; 4];
			arr.copy_from_slice(raw);
			Ok(u64::from(u32::from_le_bytes(arr)))
		}
		8 => {
			let mut arr = [0_u8; 8];
			arr.copy_from_slice(raw);
			Ok(u64::from_le_bytes(arr))
		}
		size => Err(ImageError::UnsupportedPointerSize { size }),
	}
}

/// Backing storage for one image region.
#[derive(Debug)]
pub enum RegionBytes {
	/// Bytes held in process memory (inline hex, decompressed data, tests).
	Owned(Vec<u8>),
	/// Bytes mapped from a raw region file.
	Mapped(Mmap),
}

impl Deref for RegionBytes {
	type Target = [u8];

	fn deref(&self) -> &[u8] {
		match self {
			Self::Owned(bytes) => bytes,
			Self::Mapped(map) => map,
		}
	}
}

/// Contiguous mapped range of the captured address space.
#[derive(Debug)]
pub struct Region {
	base: u64,
	bytes: RegionBytes,
}

impl Region {
	/// Create a region starting at `base`.
	pub fn new(base: u64, bytes: RegionBytes) -> Self {
		Self { base, bytes }
	}

	/// First mapped address.
	pub fn base(&self) -> u64 {
		self.base
	}

	/// Exclusive end address.
	pub fn end(&self) -> u64 {
		self.base.saturating_add(self.bytes.len() as u64)
	}

	/// Number of mapped bytes.
	pub fn len(&self) -> usize {
		self.bytes.len()
	}

	/// Whether the region maps no bytes.
	pub fn is_empty(&self) -> bool {
		self.bytes.is_empty()
	}

	/// Raw region bytes.
	pub fn bytes(&self) -> &[u8] {
		&self.bytes
	}

	/// Whether the region is memory-mapped from disk.
	pub fn is_mapped(&self) -> bool {
		matches!(self.bytes, RegionBytes::Mapped(_))
	}
}

/// Region table over an immutable captured address space.
#[derive(Debug)]
pub struct MemoryImage {
	pointer_size: usize,
	starts: Vec<u64>,
	regions: Vec<Region>,
}

impl MemoryImage {
	/// Build an image from regions, rejecting overlaps and dropping empty regions.
	pub fn new(pointer_size: usize, mut regions: Vec<Region>) -> Result<Self> {
		let pointer_size = check_pointer_size(pointer_size)?;
		regions.retain(|region| !region.is_empty());
		regions.sort_by_key(|region| region.base);

		for pair in regions.windows(2) {
			if pair[1].base < pair[0].end() {
				return Err(ImageError::RegionOverlap { base: pair[1].base });
			}
		}

		let starts = regions.iter().map(|region| region.base).collect();
		Ok(Self {
			pointer_size,
			starts,
			regions,
		})
	}

	/// Build an image from owned `(base, bytes)` pairs.
	pub fn from_regions(pointer_size: usize, regions: Vec<(u64, Vec<u8>)>) -> Result<Self> {
		let regions = regions.into_iter().map(|(base, bytes)| Region::new(base, RegionBytes::Owned(bytes))).collect();
		Self::new(pointer_size, regions)
	}

	/// All regions in ascending address order.
	pub fn regions(&self) -> &[Region] {
		&self.regions
	}

	/// Sum of mapped bytes across regions.
	pub fn total_bytes(&self) -> usize {
		self.regions.iter().map(Region::len).sum()
	}

	/// Whether `address..address + len` is fully mapped.
	pub fn contains(&self, address: u64, len: usize) -> bool {
		if len == 0 {
			return self.locate(address).is_some();
		}
		self.walk(address, len, |_, _| {}).is_ok()
	}

	fn locate(&self, address: u64) -> Option<(&Region, usize)> {
		let idx = self.starts.partition_point(|start| *start <= address);
		if idx == 0 {
			return None;
		}

		let region = &self.regions[idx - 1];
		if address >= region.end() {
			return None;
		}

		Some((region, (address - region.base) as usize))
	}

	/// Visit the chunks covering a range, failing on the first gap.
	fn walk(&self, address: u64, len: usize, mut visit: impl FnMut(usize, &[u8])) -> Result<()> {
		let out_of_range = || ImageError::OutOfRange { address, len };
		let end = address.checked_add(len as u64).ok_or_else(out_of_range)?;

		let mut cursor = address;
		let mut done = 0_usize;
		while cursor < end {
			let (region, offset) = self.locate(cursor).ok_or_else(out_of_range)?;
			let take = (region.len() - offset).min(len - done);
			visit(done, &region.bytes()[offset..offset + take]);
			done += take;
			cursor += take as u64;
		}

		Ok(())
	}
}

impl MemoryReader for MemoryImage {
	fn pointer_size(&self) -> usize {
		self.pointer_size
	}

	fn read_into(&self, address: u64, buf: &mut [u8]) -> Result<()> {
		tracing::trace!(address, len = buf.len(), "image read");
		self.walk(address, buf.len(), |at, chunk| buf[at..at + chunk.len()].copy_from_slice(chunk))
	}
}
