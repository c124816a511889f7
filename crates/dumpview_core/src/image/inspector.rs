use std::fmt;

use crate::image::memory::decode_pointer;
use crate::image::{HeapTypeResolver, ImageError, MemoryReader, ObjectHandle, Result, TypeId, TypeTable, TypedValue, ValueLocator};

/// Byte offsets of the runtime string object layout, relative to the object address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StringLayout {
	/// Offset of the `u32` character count.
	pub length_offset: usize,
	/// Offset of the first UTF-16 code unit.
	pub chars_offset: usize,
}

impl StringLayout {
	/// Runtime default: type handle, then length, then characters.
	pub fn for_pointer_size(pointer_size: usize) -> Self {
		Self {
			length_offset: pointer_size,
			chars_offset: pointer_size + 4,
		}
	}
}

/// Limits and layout overrides for value reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadOptions {
	/// Maximum UTF-16 code units decoded for one string.
	pub max_string_chars: usize,
	/// Override the pointer-width default string layout.
	pub string_layout: Option<StringLayout>,
}

impl Default for ReadOptions {
	fn default() -> Self {
		Self {
			max_string_chars: 1 << 20,
			string_layout: None,
		}
	}
}

/// Collaborators every typed value reads through.
///
/// Holds only shared references, so it is `Copy` and is handed to every
/// [`TypedValue`] and [`ObjectHandle`] it creates.
#[derive(Clone, Copy)]
pub struct Inspector<'a> {
	memory: &'a dyn MemoryReader,
	types: &'a TypeTable,
	heap: &'a dyn HeapTypeResolver,
	options: ReadOptions,
}

impl<'a> Inspector<'a> {
	/// Bind an image, its type table, and a heap resolver.
	///
	/// Fails when the image and the table were laid out for different pointer widths.
	pub fn new(memory: &'a dyn MemoryReader, types: &'a TypeTable, heap: &'a dyn HeapTypeResolver) -> Result<Self> {
		if memory.pointer_size() != types.pointer_size() {
			return Err(ImageError::PointerSizeMismatch {
				image: memory.pointer_size(),
				types: types.pointer_size(),
			});
		}

		Ok(Self {
			memory,
			types,
			heap,
			options: ReadOptions::default(),
		})
	}

	/// Replace the read options.
	pub fn with_options(mut self, options: ReadOptions) -> Self {
		self.options = options;
		self
	}

	/// Active read options.
	pub fn options(&self) -> ReadOptions {
		self.options
	}

	/// Backing memory accessor.
	pub fn memory(&self) -> &'a dyn MemoryReader {
		self.memory
	}

	/// Type table.
	pub fn types(&self) -> &'a TypeTable {
		self.types
	}

	/// Pointer width of the image.
	pub fn pointer_size(&self) -> usize {
		self.memory.pointer_size()
	}

	/// String object layout in effect.
	pub fn string_layout(&self) -> StringLayout {
		self.options.string_layout.unwrap_or_else(|| StringLayout::for_pointer_size(self.pointer_size()))
	}

	/// Bind a locator handed out by a collaborator (a local's storage, a register value) to its static type.
	///
	/// For reference types the locator denotes the slot holding the reference.
	/// Inline locators must match the type's storage size exactly.
	pub fn value(&self, locator: ValueLocator, type_id: TypeId) -> Result<TypedValue<'a>> {
		let ty = self.types.get(type_id)?;
		let expected = self.types.slot_size(ty);
		let locator = match locator {
			ValueLocator::Address { address, .. } => ValueLocator::address(address, expected),
			ValueLocator::Inline(bytes) if bytes.len() != expected => {
				return Err(ImageError::InlineLengthMismatch {
					type_name: ty.name.to_string(),
					expected,
					got: bytes.len(),
				});
			}
			inline @ ValueLocator::Inline(_) => inline,
		};
		Ok(TypedValue::storage(*self, locator, ty))
	}

	/// Bind a locator using a type name.
	pub fn value_by_name(&self, locator: ValueLocator, type_name: &str) -> Result<TypedValue<'a>> {
		let id = self.types.by_name(type_name)?.id;
		self.value(locator, id)
	}

	/// Handle for the heap object at `address`, resolving its concrete type.
	///
	/// A zero address yields a null handle without consulting the resolver.
	pub fn object(&self, address: u64) -> ObjectHandle<'a> {
		if address == 0 {
			return ObjectHandle::new(*self, 0, None);
		}

		let ty = self.heap.type_of(address).and_then(|id| self.types.get(id).ok());
		if ty.is_none() {
			tracing::debug!(address, "heap type unresolved");
		}
		ObjectHandle::new(*self, address, ty)
	}

	/// Read exactly `N` bytes of a locator.
	pub(crate) fn read_array<const N: usize>(&self, locator: &ValueLocator) -> Result<[u8; N]> {
		let mut out = [0_u8; N];
		self.read_prefix(locator, &mut out)?;
		Ok(out)
	}

	/// Fill `buf` from the front of a locator's bytes.
	pub(crate) fn read_prefix(&self, locator: &ValueLocator, buf: &mut [u8]) -> Result<()> {
		match locator {
			ValueLocator::Address { address, .. } => self.memory.read_into(*address, buf),
			ValueLocator::Inline(bytes) => {
				let src = bytes.slice(0, buf.len())?;
				buf.copy_from_slice(src.as_slice());
				Ok(())
			}
		}
	}

	/// Decode the pointer stored at the front of a locator.
	pub(crate) fn read_pointer_at(&self, locator: &ValueLocator) -> Result<u64> {
		match locator {
			ValueLocator::Address { address, .. } => self.memory.read_pointer(*address),
			ValueLocator::Inline(bytes) => decode_pointer(bytes.as_slice(), self.pointer_size()),
		}
	}
}

impl fmt::Debug for Inspector<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Inspector")
			.field("pointer_size", &self.pointer_size())
			.field("types", &self.types.len())
			.field("options", &self.options)
			.finish_non_exhaustive()
	}
}
