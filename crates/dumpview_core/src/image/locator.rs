use std::fmt;
use std::sync::Arc;

use crate::image::{ImageError, Result};

/// Shared, immutable window into bytes already copied out of the image.
///
/// Sub-slicing shares the backing buffer, so navigating into embedded value
/// types never copies or re-reads.
#[derive(Clone)]
pub struct InlineBytes {
	buf: Arc<[u8]>,
	start: usize,
	len: usize,
}

impl InlineBytes {
	/// Wrap a whole buffer.
	pub fn new(buf: impl Into<Arc<[u8]>>) -> Self {
		let buf = buf.into();
		let len = buf.len();
		Self { buf, start: 0, len }
	}

	/// Visible bytes.
	pub fn as_slice(&self) -> &[u8] {
		&self.buf[self.start..self.start + self.len]
	}

	/// Number of visible bytes.
	pub fn len(&self) -> usize {
		self.len
	}

	/// Whether no bytes are visible.
	pub fn is_empty(&self) -> bool {
		self.len == 0
	}

	/// Narrow to `offset..offset + len` of the visible bytes.
	pub fn slice(&self, offset: usize, len: usize) -> Result<Self> {
		let oob = || ImageError::InlineSliceOob {
			start: offset,
			size: len,
			have: self.len,
		};
		let end = offset.checked_add(len).ok_or_else(oob)?;
		if end > self.len {
			return Err(oob());
		}

		Ok(Self {
			buf: Arc::clone(&self.buf),
			start: self.start + offset,
			len,
		})
	}
}

impl fmt::Debug for InlineBytes {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("InlineBytes").field(&self.as_slice()).finish()
	}
}

impl PartialEq for InlineBytes {
	fn eq(&self, other: &Self) -> bool {
		self.as_slice() == other.as_slice()
	}
}

impl Eq for InlineBytes {}

/// Where a value's bytes live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueLocator {
	/// Bytes must be fetched from the image on demand.
	Address {
		/// First byte of the value.
		address: u64,
		/// Expected byte length.
		len: usize,
	},
	/// Bytes were already materialized (register values, sub-slices of a parent read).
	Inline(InlineBytes),
}

impl ValueLocator {
	/// Address-backed locator.
	pub fn address(address: u64, len: usize) -> Self {
		Self::Address { address, len }
	}

	/// Inline locator over owned bytes.
	pub fn inline(bytes: impl Into<Arc<[u8]>>) -> Self {
		Self::Inline(InlineBytes::new(bytes))
	}

	/// Image address of the first byte, if the value has one.
	pub fn address_of(&self) -> Option<u64> {
		match self {
			Self::Address { address, .. } => Some(*address),
			Self::Inline(_) => None,
		}
	}

	/// Byte length described by the locator.
	pub fn len(&self) -> usize {
		match self {
			Self::Address { len, .. } => *len,
			Self::Inline(bytes) => bytes.len(),
		}
	}

	/// Whether the locator describes zero bytes.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Locator for `len` bytes at `offset` inside this one.
	///
	/// Address locators add the offset; inline locators share a sub-slice.
	pub fn offset(&self, offset: usize, len: usize) -> Result<Self> {
		match self {
			Self::Address { address, .. } => {
				let child = address.checked_add(offset as u64).ok_or(ImageError::OutOfRange { address: *address, len })?;
				Ok(Self::Address { address: child, len })
			}
			Self::Inline(bytes) => Ok(Self::Inline(bytes.slice(offset, len)?)),
		}
	}
}
