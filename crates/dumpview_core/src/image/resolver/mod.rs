use std::collections::BTreeMap;

use crate::image::{MemoryReader, TypeId, TypeTable};


/// Maps a heap address to the concrete type of the object stored there.
///
/// Returning `None` means the address could not be mapped (corrupt or
/// partially collected regions); it is not an error.
pub trait HeapTypeResolver: Send + Sync {
	/// Concrete type of the object at `address`.
	fn type_of(&self, address: u64) -> Option<TypeId>;
}

/// Explicit address to type map, for images without readable type handles.
#[derive(Debug, Clone, Default)]
pub struct ObjectTable {
	entries: BTreeMap<u64, TypeId>,
}

impl ObjectTable {
	/// Empty table.
	pub fn new() -> Self {
		Self::default()
	}

	/// Record the type of the object at `address`, returning any previous entry.
	pub fn insert(&mut self, address: u64, type_id: TypeId) -> Option<TypeId> {
		self.entries.insert(address, type_id)
	}

	/// Number of recorded objects.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Whether no objects are recorded.
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Recorded `(address, type)` pairs in address order.
	pub fn iter(&self) -> impl Iterator<Item = (u64, TypeId)> + '_ {
		self.entries.iter().map(|(address, id)| (*address, *id))
	}
}

impl FromIterator<(u64, TypeId)> for ObjectTable {
	fn from_iter<I: IntoIterator<Item = (u64, TypeId)>>(iter: I) -> Self {
		Self {
			entries: iter.into_iter().collect(),
		}
	}
}

impl HeapTypeResolver for ObjectTable {
	fn type_of(&self, address: u64) -> Option<TypeId> {
		self.entries.get(&address).copied()
	}
}

/// Resolves types by reading the type handle stored in an object's first word.
#[derive(Clone, Copy)]
pub struct TypeHandleResolver<'a> {
	memory: &'a dyn MemoryReader,
	types: &'a TypeTable,
}

impl<'a> TypeHandleResolver<'a> {
	/// Resolver over `memory` using the handles registered in `types`.
	pub fn new(memory: &'a dyn MemoryReader, types: &'a TypeTable) -> Self {
		Self { memory, types }
	}
}

impl HeapTypeResolver for TypeHandleResolver<'_> {
	fn type_of(&self, address: u64) -> Option<TypeId> {
		let handle = match self.memory.read_pointer(address) {
			Ok(handle) => handle,
			Err(err) => {
				tracing::debug!(address, %err, "type handle unreadable");
				return None;
			}
		};

		let found = self.types.by_type_handle(handle).map(|ty| ty.id);
		if found.is_none() {
			tracing::debug!(address, handle, "unknown type handle");
		}
		found
	}
}
