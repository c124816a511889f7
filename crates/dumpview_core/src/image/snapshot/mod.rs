use std::fs;
use std::path::Path;

use crate::image::{
	HeapTypeResolver, ImageError, Inspector, MemoryImage, MemoryReader, ObjectHandle, ObjectTable, ReadOptions, Result, Thread, TypeHandleResolver, TypeId,
	TypeTable, TypedValue,
};

mod manifest;

pub use manifest::{FieldSpec, FrameSpec, KindSpec, LocalSpec, Manifest, ObjectSpec, RegionSpec, ThreadSpec, TypeSpec, parse_address};


/// A captured image together with the metadata needed to read values from it.
///
/// Resolves heap types from the explicit object table first, then from the
/// type handle stored in each object's first word.
#[derive(Debug)]
pub struct Snapshot {
	memory: MemoryImage,
	types: TypeTable,
	objects: ObjectTable,
	threads: Vec<Thread>,
	options: ReadOptions,
}

impl Snapshot {
	/// Assemble a snapshot from already-loaded parts.
	pub fn from_parts(memory: MemoryImage, types: TypeTable, objects: ObjectTable, threads: Vec<Thread>) -> Result<Self> {
		if memory.pointer_size() != types.pointer_size() {
			return Err(ImageError::PointerSizeMismatch {
				image: memory.pointer_size(),
				types: types.pointer_size(),
			});
		}

		Ok(Self {
			memory,
			types,
			objects,
			threads,
			options: ReadOptions::default(),
		})
	}

	/// Load a JSON manifest; relative region files resolve against its directory.
	pub fn open(path: impl AsRef<Path>) -> Result<Self> {
		let path = path.as_ref();
		let text = fs::read(path)?;
		let manifest: Manifest = serde_json::from_slice(&text)?;
		let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
		manifest.load(base_dir)
	}

	/// Parse a manifest from JSON text.
	pub fn from_json(text: &str, base_dir: &Path) -> Result<Self> {
		let manifest: Manifest = serde_json::from_str(text)?;
		manifest.load(base_dir)
	}

	/// Replace the read options handed to inspectors.
	pub fn with_options(mut self, options: ReadOptions) -> Self {
		self.options = options;
		self
	}

	/// Captured memory.
	pub fn memory(&self) -> &MemoryImage {
		&self.memory
	}

	/// Type metadata.
	pub fn types(&self) -> &TypeTable {
		&self.types
	}

	/// Explicit heap object table.
	pub fn objects(&self) -> &ObjectTable {
		&self.objects
	}

	/// Captured threads.
	pub fn threads(&self) -> &[Thread] {
		&self.threads
	}

	/// Thread by id.
	pub fn thread(&self, id: u32) -> Result<&Thread> {
		self.threads.iter().find(|thread| thread.id == id).ok_or(ImageError::ThreadNotFound { id })
	}

	/// First captured thread.
	pub fn main_thread(&self) -> Option<&Thread> {
		self.threads.first()
	}

	/// Value context over this snapshot.
	pub fn inspector(&self) -> Result<Inspector<'_>> {
		Ok(Inspector::new(&self.memory, &self.types, self)?.with_options(self.options))
	}

	/// Typed value of a local variable.
	pub fn local(&self, thread: u32, frame: &str, name: &str) -> Result<TypedValue<'_>> {
		let local = self.thread(thread)?.frame(frame)?.local(name)?;
		self.inspector()?.value(local.locator.clone(), local.type_id)
	}

	/// Object handle at a heap address.
	pub fn object(&self, address: u64) -> Result<ObjectHandle<'_>> {
		Ok(self.inspector()?.object(address))
	}
}

impl HeapTypeResolver for Snapshot {
	fn type_of(&self, address: u64) -> Option<TypeId> {
		self.objects
			.type_of(address)
			.or_else(|| TypeHandleResolver::new(&self.memory, &self.types).type_of(address))
	}
}
