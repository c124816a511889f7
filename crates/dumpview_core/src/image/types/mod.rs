use std::collections::HashMap;
use std::fmt;

use crate::image::memory::check_pointer_size;
use crate::image::{ImageError, Result};


/// Index of a descriptor inside its [`TypeTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeId(pub u32);

impl fmt::Display for TypeId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "#{}", self.0)
	}
}

/// Fixed-width scalar kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
	/// One-byte boolean, non-zero is `true`.
	Bool,
	/// UTF-16 code unit.
	Char,
	/// Signed 8-bit integer.
	I8,
	/// Unsigned 8-bit integer.
	U8,
	/// Signed 16-bit integer.
	I16,
	/// Unsigned 16-bit integer.
	U16,
	/// Signed 32-bit integer.
	I32,
	/// Unsigned 32-bit integer.
	U32,
	/// Signed 64-bit integer.
	I64,
	/// Unsigned 64-bit integer.
	U64,
	/// IEEE single precision float.
	F32,
	/// IEEE double precision float.
	F64,
	/// Signed pointer-sized integer.
	IntPtr,
	/// Unsigned pointer-sized integer.
	UIntPtr,
}

impl PrimitiveKind {
	/// Every primitive kind, in registration order.
	pub const ALL: [Self; 14] = [
		Self::Bool,
		Self::Char,
		Self::I8,
		Self::U8,
		Self::I16,
		Self::U16,
		Self::I32,
		Self::U32,
		Self::I64,
		Self::U64,
		Self::F32,
		Self::F64,
		Self::IntPtr,
		Self::UIntPtr,
	];

	/// Byte width on an image with the given pointer width.
	pub fn size(self, pointer_size: usize) -> usize {
		match self {
			Self::Bool | Self::I8 | Self::U8 => 1,
			Self::Char | Self::I16 | Self::U16 => 2,
			Self::I32 | Self::U32 | Self::F32 => 4,
			Self::I64 | Self::U64 | Self::F64 => 8,
			Self::IntPtr | Self::UIntPtr => pointer_size,
		}
	}

	/// Stable lowercase label, also accepted as a type name alias.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Bool => "bool",
			Self::Char => "char",
			Self::I8 => "i8",
			Self::U8 => "u8",
			Self::I16 => "i16",
			Self::U16 => "u16",
			Self::I32 => "i32",
			Self::U32 => "u32",
			Self::I64 => "i64",
			Self::U64 => "u64",
			Self::F32 => "f32",
			Self::F64 => "f64",
			Self::IntPtr => "isize",
			Self::UIntPtr => "usize",
		}
	}

	/// Runtime type name registered for this kind.
	pub fn runtime_name(self) -> &'static str {
		match self {
			Self::Bool => "System.Boolean",
			Self::Char => "System.Char",
			Self::I8 => "System.SByte",
			Self::U8 => "System.Byte",
			Self::I16 => "System.Int16",
			Self::U16 => "System.UInt16",
			Self::I32 => "System.Int32",
			Self::U32 => "System.UInt32",
			Self::I64 => "System.Int64",
			Self::U64 => "System.UInt64",
			Self::F32 => "System.Single",
			Self::F64 => "System.Double",
			Self::IntPtr => "System.IntPtr",
			Self::UIntPtr => "System.UIntPtr",
		}
	}
}

/// Layout model of a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
	/// Scalar read directly from its storage.
	Primitive(PrimitiveKind),
	/// Runtime string object, stored as a reference.
	String,
	/// Struct-like value embedded inline in its parent.
	Value,
	/// Heap object stored as a reference.
	Reference,
}

impl TypeKind {
	/// Stable lowercase label.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Primitive(kind) => kind.as_str(),
			Self::String => "string",
			Self::Value => "value",
			Self::Reference => "reference",
		}
	}

	/// Whether values of this kind are stored through a pointer slot.
	pub fn is_reference(self) -> bool {
		matches!(self, Self::String | Self::Reference)
	}

	/// Whether this kind may carry a field table.
	pub fn has_fields(self) -> bool {
		matches!(self, Self::Value | Self::Reference)
	}
}

/// One named field of a value or reference type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldDescriptor {
	/// Field name, unique within the owning type.
	pub name: Box<str>,
	/// Declared (static) type.
	pub type_id: TypeId,
	/// Byte offset from the start of the owning value or object.
	pub offset: usize,
	/// Whether the field's bytes live inline (primitive or value type).
	pub is_value_type: bool,
}

/// Static layout metadata for one type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeDescriptor {
	/// Position in the owning table.
	pub id: TypeId,
	/// Fully qualified type name.
	pub name: Box<str>,
	/// Instance size in bytes (for reference types, including the object header).
	pub size: usize,
	/// Layout model.
	pub kind: TypeKind,
	/// Runtime type handle stored in each heap instance's first word, when known.
	pub type_handle: Option<u64>,
	fields: Vec<FieldDescriptor>,
}

impl TypeDescriptor {
	/// Field table in offset order.
	pub fn fields(&self) -> &[FieldDescriptor] {
		&self.fields
	}

	/// Look up a field by exact name.
	pub fn field_by_name(&self, name: &str) -> Result<&FieldDescriptor> {
		self.fields
			.iter()
			.find(|field| field.name.as_ref() == name)
			.ok_or_else(|| ImageError::FieldNotFound {
				type_name: self.name.to_string(),
				field: name.to_owned(),
			})
	}

	/// Whether the type is an embedded value type.
	pub fn is_value_type(&self) -> bool {
		matches!(self.kind, TypeKind::Value | TypeKind::Primitive(_))
	}

	/// Whether the type lives on the heap behind a reference.
	pub fn is_reference_type(&self) -> bool {
		self.kind.is_reference()
	}

	/// `name (kind)` label used in diagnostics.
	pub fn describe(&self) -> String {
		format!("{} ({})", self.name, self.kind.as_str())
	}
}

/// Immutable set of type descriptors for one captured image.
#[derive(Debug)]
pub struct TypeTable {
	pointer_size: usize,
	types: Vec<TypeDescriptor>,
	by_name: HashMap<Box<str>, TypeId>,
	by_handle: HashMap<u64, TypeId>,
}

impl TypeTable {
	/// Pointer width the layouts were computed for.
	pub fn pointer_size(&self) -> usize {
		self.pointer_size
	}

	/// Descriptor by id.
	pub fn get(&self, id: TypeId) -> Result<&TypeDescriptor> {
		self.types.get(id.0 as usize).ok_or(ImageError::TypeIdOutOfRange { id: id.0 })
	}

	/// Descriptor by name or primitive alias.
	pub fn by_name(&self, name: &str) -> Result<&TypeDescriptor> {
		let id = self.by_name.get(name).ok_or_else(|| ImageError::TypeNotFound { name: name.to_owned() })?;
		self.get(*id)
	}

	/// Descriptor whose instances carry `handle` in their first word.
	pub fn by_type_handle(&self, handle: u64) -> Option<&TypeDescriptor> {
		self.by_handle.get(&handle).and_then(|id| self.types.get(id.0 as usize))
	}

	/// Bytes a value of `ty` occupies where it is stored (a pointer for reference kinds).
	pub fn slot_size(&self, ty: &TypeDescriptor) -> usize {
		slot_size(ty.kind, ty.size, self.pointer_size)
	}

	/// All descriptors in id order.
	pub fn iter(&self) -> impl Iterator<Item = &TypeDescriptor> {
		self.types.iter()
	}

	/// Number of descriptors.
	pub fn len(&self) -> usize {
		self.types.len()
	}

	/// Whether the table holds no descriptors.
	pub fn is_empty(&self) -> bool {
		self.types.is_empty()
	}
}

fn slot_size(kind: TypeKind, size: usize, pointer_size: usize) -> usize {
	if kind.is_reference() { pointer_size } else { size }
}

/// Incremental constructor for a [`TypeTable`].
///
/// Types are declared before their fields so self-referential and mutually
/// referential layouts can be expressed. [`TypeTableBuilder::build`] checks the
/// field-table invariants.
#[derive(Debug)]
pub struct TypeTableBuilder {
	pointer_size: usize,
	types: Vec<TypeDescriptor>,
	by_name: HashMap<Box<str>, TypeId>,
	by_handle: HashMap<u64, TypeId>,
}

/// Runtime name of the built-in string type.
pub const STRING_TYPE_NAME: &str = "System.String";
/// Runtime name of the built-in root object type.
pub const OBJECT_TYPE_NAME: &str = "System.Object";

impl TypeTableBuilder {
	/// Start a table for the given pointer width with the built-in types registered.
	pub fn new(pointer_size: usize) -> Result<Self> {
		let pointer_size = check_pointer_size(pointer_size)?;
		let mut builder = Self {
			pointer_size,
			types: Vec::new(),
			by_name: HashMap::new(),
			by_handle: HashMap::new(),
		};

		for kind in PrimitiveKind::ALL {
			let id = builder.declare(kind.runtime_name(), TypeKind::Primitive(kind), kind.size(pointer_size))?;
			builder.alias(kind.as_str(), id)?;
		}
		let string = builder.declare(STRING_TYPE_NAME, TypeKind::String, pointer_size + 4)?;
		builder.alias("string", string)?;
		let object = builder.declare(OBJECT_TYPE_NAME, TypeKind::Reference, pointer_size)?;
		builder.alias("object", object)?;

		Ok(builder)
	}

	/// Pointer width of the table under construction.
	pub fn pointer_size(&self) -> usize {
		self.pointer_size
	}

	/// Register a new type with an empty field table.
	pub fn declare(&mut self, name: &str, kind: TypeKind, size: usize) -> Result<TypeId> {
		if self.by_name.contains_key(name) {
			return Err(ImageError::DuplicateType { name: name.to_owned() });
		}

		let id = TypeId(self.types.len() as u32);
		self.types.push(TypeDescriptor {
			id,
			name: name.into(),
			size,
			kind,
			type_handle: None,
			fields: Vec::new(),
		});
		self.by_name.insert(name.into(), id);
		Ok(id)
	}

	/// Register an additional lookup name for an existing type.
	pub fn alias(&mut self, name: &str, id: TypeId) -> Result<()> {
		self.get(id)?;
		if self.by_name.contains_key(name) {
			return Err(ImageError::DuplicateType { name: name.to_owned() });
		}
		self.by_name.insert(name.into(), id);
		Ok(())
	}

	/// Record the runtime type handle stored in heap instances of `id`.
	pub fn set_type_handle(&mut self, id: TypeId, handle: u64) -> Result<()> {
		if self.by_handle.get(&handle).is_some_and(|existing| *existing != id) {
			return Err(ImageError::DuplicateTypeHandle { handle });
		}

		let item = self.types.get_mut(id.0 as usize).ok_or(ImageError::TypeIdOutOfRange { id: id.0 })?;
		if let Some(previous) = item.type_handle.replace(handle) {
			self.by_handle.remove(&previous);
		}
		self.by_handle.insert(handle, id);
		Ok(())
	}

	/// Append a field to `owner`.
	pub fn add_field(&mut self, owner: TypeId, name: &str, type_id: TypeId, offset: usize) -> Result<()> {
		let is_value_type = !self.get(type_id)?.kind.is_reference();
		let item = self.types.get_mut(owner.0 as usize).ok_or(ImageError::TypeIdOutOfRange { id: owner.0 })?;

		if !item.kind.has_fields() {
			return Err(ImageError::TypeMismatch {
				expected: "value or reference type",
				got: item.describe(),
			});
		}
		if item.fields.iter().any(|field| field.name.as_ref() == name) {
			return Err(ImageError::DuplicateField {
				type_name: item.name.to_string(),
				field: name.to_owned(),
			});
		}

		item.fields.push(FieldDescriptor {
			name: name.into(),
			type_id,
			offset,
			is_value_type,
		});
		Ok(())
	}

	/// Id registered for a name or alias.
	pub fn id_of(&self, name: &str) -> Option<TypeId> {
		self.by_name.get(name).copied()
	}

	/// Id of a built-in primitive.
	pub fn primitive(&self, kind: PrimitiveKind) -> TypeId {
		self.by_name[kind.runtime_name()]
	}

	/// Validate field layouts and freeze the table.
	pub fn build(mut self) -> Result<TypeTable> {
		let slot_sizes: Vec<usize> = self.types.iter().map(|ty| slot_size(ty.kind, ty.size, self.pointer_size)).collect();

		for item in &mut self.types {
			item.fields.sort_by_key(|field| field.offset);

			let mut previous: Option<(&FieldDescriptor, usize)> = None;
			for field in &item.fields {
				let size = slot_sizes[field.type_id.0 as usize];
				let end = field.offset.checked_add(size).filter(|end| *end <= item.size);
				let Some(end) = end else {
					return Err(ImageError::FieldOutOfBounds {
						type_name: item.name.to_string(),
						field: field.name.to_string(),
						offset: field.offset,
						size,
						type_size: item.size,
					});
				};

				if size == 0 {
					continue;
				}
				if let Some((prev, prev_end)) = previous {
					if field.offset < prev_end {
						return Err(ImageError::FieldOverlap {
							type_name: item.name.to_string(),
							first: prev.name.to_string(),
							second: field.name.to_string(),
						});
					}
				}
				previous = Some((field, end));
			}
		}

		Ok(TypeTable {
			pointer_size: self.pointer_size,
			types: self.types,
			by_name: self.by_name,
			by_handle: self.by_handle,
		})
	}

	fn get(&self, id: TypeId) -> Result<&TypeDescriptor> {
		self.types.get(id.0 as usize).ok_or(ImageError::TypeIdOutOfRange { id: id.0 })
	}
}
