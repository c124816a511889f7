use std::io::{ErrorKind, Read, Seek, SeekFrom};
use std::sync::{Mutex, PoisonError};

use crate::image::memory::{MemoryReader, check_pointer_size};
use crate::image::{ImageError, Result};

/// One address range stored at a fixed offset of the backing stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamExtent {
	/// First captured address of the extent.
	pub base: u64,
	/// Extent length in bytes.
	pub len: u64,
	/// Stream offset holding the byte at `base`.
	pub file_offset: u64,
}

impl StreamExtent {
	fn end(&self) -> u64 {
		self.base.saturating_add(self.len)
	}
}

/// Image backed by a seekable stream that is not safe for concurrent reads.
///
/// Every read takes the internal lock for its whole seek+read sequence, so
/// concurrent callers never observe a partially filled buffer.
#[derive(Debug)]
pub struct StreamImage<R> {
	pointer_size: usize,
	extents: Vec<StreamExtent>,
	source: Mutex<R>,
}

impl<R: Read + Seek + Send> StreamImage<R> {
	/// Wrap `source` with an extent table.
	pub fn new(source: R, pointer_size: usize, mut extents: Vec<StreamExtent>) -> Result<Self> {
		let pointer_size = check_pointer_size(pointer_size)?;
		extents.retain(|extent| extent.len > 0);
		extents.sort_by_key(|extent| extent.base);
		for pair in extents.windows(2) {
			if pair[1].base < pair[0].end() {
				return Err(ImageError::RegionOverlap { base: pair[1].base });
			}
		}

		Ok(Self {
			pointer_size,
			extents,
			source: Mutex::new(source),
		})
	}

	/// Extent table in ascending address order.
	pub fn extents(&self) -> &[StreamExtent] {
		&self.extents
	}

	/// Release the backing stream.
	pub fn into_inner(self) -> R {
		self.source.into_inner().unwrap_or_else(PoisonError::into_inner)
	}

	fn locate(&self, address: u64) -> Option<&StreamExtent> {
		let idx = self.extents.partition_point(|extent| extent.base <= address);
		let extent = self.extents.get(idx.checked_sub(1)?)?;
		(address < extent.end()).then_some(extent)
	}
}

impl<R: Read + Seek + Send> MemoryReader for StreamImage<R> {
	fn pointer_size(&self) -> usize {
		self.pointer_size
	}

	fn read_into(&self, address: u64, buf: &mut [u8]) -> Result<()> {
		let len = buf.len();
		let out_of_range = || ImageError::OutOfRange { address, len };
		let end = address.checked_add(len as u64).ok_or_else(out_of_range)?;

		let mut source = self.source.lock().unwrap_or_else(PoisonError::into_inner);
		let mut cursor = address;
		let mut done = 0_usize;
		while cursor < end {
			let extent = self.locate(cursor).ok_or_else(out_of_range)?;
			let take = (extent.end() - cursor).min(end - cursor) as usize;
			source.seek(SeekFrom::Start(extent.file_offset + (cursor - extent.base)))?;
			source.read_exact(&mut buf[done..done + take]).map_err(|err| match err.kind() {
				ErrorKind::UnexpectedEof => out_of_range(),
				_ => ImageError::Io(err),
			})?;
			done += take;
			cursor += take as u64;
		}

		tracing::trace!(address, len, "stream read");
		Ok(())
	}
}
