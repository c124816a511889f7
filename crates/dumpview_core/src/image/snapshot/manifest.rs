use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::image::compression::load_region_file;
use crate::image::memory::{Region, RegionBytes};
use crate::image::{
	ImageError, Local, MemoryImage, ObjectTable, Result, Snapshot, StackFrame, Thread, TypeKind, TypeTableBuilder, ValueLocator, check_pointer_size,
};

/// JSON description of a captured image and its collaborator metadata.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
	/// Image pointer width (4 or 8).
	pub pointer_size: usize,
	/// Mapped memory regions.
	pub regions: Vec<RegionSpec>,
	/// Value and reference type layouts; primitives, strings and `System.Object` are built in.
	#[serde(default)]
	pub types: Vec<TypeSpec>,
	/// Explicit heap object types.
	#[serde(default)]
	pub objects: Vec<ObjectSpec>,
	/// Captured threads.
	#[serde(default)]
	pub threads: Vec<ThreadSpec>,
}

/// One mapped region: inline hex or a raw/zstd file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegionSpec {
	/// First mapped address.
	pub base: String,
	/// Region bytes as hex.
	#[serde(default)]
	pub hex: Option<String>,
	/// Region file, relative to the manifest directory.
	#[serde(default)]
	pub file: Option<PathBuf>,
}

/// Layout model of a declared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KindSpec {
	/// Embedded struct-like value.
	Value,
	/// Heap object.
	Reference,
}

/// One declared type.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TypeSpec {
	/// Type name.
	pub name: String,
	/// Layout model.
	pub kind: KindSpec,
	/// Instance size in bytes.
	pub size: usize,
	/// Runtime type handle found in heap instances.
	#[serde(default)]
	pub type_handle: Option<String>,
	/// Field table.
	#[serde(default)]
	pub fields: Vec<FieldSpec>,
}

/// One field of a declared type.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldSpec {
	/// Field name.
	pub name: String,
	/// Declared type name.
	#[serde(rename = "type")]
	pub type_name: String,
	/// Byte offset in the owning type.
	pub offset: usize,
}

/// Explicit heap object type.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ObjectSpec {
	/// Object address.
	pub address: String,
	/// Concrete type name.
	#[serde(rename = "type")]
	pub type_name: String,
}

/// One captured thread.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ThreadSpec {
	/// Thread id.
	pub id: u32,
	/// Frames, innermost first.
	#[serde(default)]
	pub frames: Vec<FrameSpec>,
}

/// One captured frame.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FrameSpec {
	/// Frame name.
	pub name: String,
	/// Locals.
	#[serde(default)]
	pub locals: Vec<LocalSpec>,
}

/// One local: a stack address or inline register bytes.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LocalSpec {
	/// Variable name.
	pub name: String,
	/// Declared type name.
	#[serde(rename = "type")]
	pub type_name: String,
	/// Stack slot address.
	#[serde(default)]
	pub address: Option<String>,
	/// Inline value bytes as hex.
	#[serde(default)]
	pub hex: Option<String>,
}

impl Manifest {
	/// Resolve the manifest into a snapshot.
	pub fn load(self, base_dir: &Path) -> Result<Snapshot> {
		let pointer_size = check_pointer_size(self.pointer_size)?;

		let mut regions = Vec::with_capacity(self.regions.len());
		for region in &self.regions {
			regions.push(load_region(region, base_dir)?);
		}
		let memory = MemoryImage::new(pointer_size, regions)?;

		let mut builder = TypeTableBuilder::new(pointer_size)?;
		let mut declared = Vec::with_capacity(self.types.len());
		for decl in &self.types {
			let kind = match decl.kind {
				KindSpec::Value => TypeKind::Value,
				KindSpec::Reference => TypeKind::Reference,
			};
			let id = builder.declare(&decl.name, kind, decl.size)?;
			if let Some(handle) = &decl.type_handle {
				builder.set_type_handle(id, parse_address(handle)?)?;
			}
			declared.push(id);
		}
		for (decl, owner) in self.types.iter().zip(declared) {
			for field in &decl.fields {
				let type_id = lookup(&builder, &field.type_name)?;
				builder.add_field(owner, &field.name, type_id, field.offset)?;
			}
		}

		let mut objects = ObjectTable::new();
		for object in &self.objects {
			objects.insert(parse_address(&object.address)?, lookup(&builder, &object.type_name)?);
		}

		let mut threads = Vec::with_capacity(self.threads.len());
		for thread in &self.threads {
			let mut frames = Vec::with_capacity(thread.frames.len());
			for frame in &thread.frames {
				let mut locals = Vec::with_capacity(frame.locals.len());
				for local in &frame.locals {
					locals.push(Local {
						name: local.name.as_str().into(),
						type_id: lookup(&builder, &local.type_name)?,
						locator: local_locator(local, &frame.name)?,
					});
				}
				frames.push(StackFrame::new(&frame.name, locals));
			}
			threads.push(Thread::new(thread.id, frames));
		}

		tracing::debug!(
			pointer_size,
			regions = memory.regions().len(),
			types = self.types.len(),
			objects = objects.len(),
			threads = threads.len(),
			"manifest loaded"
		);
		Snapshot::from_parts(memory, builder.build()?, objects, threads)
	}
}

/// Parse decimal or `0x`-prefixed hex address literal.
pub fn parse_address(value: &str) -> Result<u64> {
	let parsed = if let Some(stripped) = value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
		u64::from_str_radix(&stripped.replace('_', ""), 16)
	} else {
		value.parse::<u64>()
	};

	parsed.map_err(|_| ImageError::InvalidAddressLiteral { value: value.to_owned() })
}

fn lookup(builder: &TypeTableBuilder, name: &str) -> Result<crate::image::TypeId> {
	builder.id_of(name).ok_or_else(|| ImageError::TypeNotFound { name: name.to_owned() })
}

fn load_region(region: &RegionSpec, base_dir: &Path) -> Result<Region> {
	let base = parse_address(&region.base)?;
	let bytes = match (&region.hex, &region.file) {
		(Some(hex), None) => RegionBytes::Owned(parse_hex(hex)?),
		(None, Some(file)) => {
			let (compression, bytes) = load_region_file(&base_dir.join(file))?;
			tracing::debug!(base, file = %file.display(), compression = compression.as_str(), "region file loaded");
			bytes
		}
		_ => {
			return Err(ImageError::InvalidManifest {
				reason: format!("region {} needs exactly one of hex or file", region.base),
			});
		}
	};
	Ok(Region::new(base, bytes))
}

fn local_locator(local: &LocalSpec, frame: &str) -> Result<ValueLocator> {
	match (&local.address, &local.hex) {
		(Some(address), None) => Ok(ValueLocator::address(parse_address(address)?, 0)),
		(None, Some(hex)) => Ok(ValueLocator::inline(parse_hex(hex)?)),
		_ => Err(ImageError::InvalidManifest {
			reason: format!("local {frame}.{} needs exactly one of address or hex", local.name),
		}),
	}
}

fn parse_hex(text: &str) -> Result<Vec<u8>> {
	let digits: Vec<u8> = text.bytes().filter(|byte| !byte.is_ascii_whitespace()).collect();
	let invalid = || ImageError::InvalidManifest {
		reason: "hex payload must be an even number of hex digits".to_owned(),
	};
	if digits.len() % 2 != 0 {
		return Err(invalid());
	}

	digits
		.chunks_exact(2)
		.map(|pair| {
			let high = char::from(pair[0]).to_digit(16).ok_or_else(invalid)?;
			let low = char::from(pair[1]).to_digit(16).ok_or_else(invalid)?;
			Ok((high * 16 + low) as u8)
		})
		.collect()
}
