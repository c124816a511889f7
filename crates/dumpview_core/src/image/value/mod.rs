use widestring::U16Str;

use crate::image::{FieldDescriptor, FieldPath, ImageError, Inspector, ObjectHandle, PrimitiveKind, Result, TypeDescriptor, TypeKind, ValueLocator};

#[cfg(test)]
mod tests;

/// What the locator of a reference-kind value points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Denotes {
	/// The storage itself: inline bytes, or a slot holding a reference.
	Storage,
	/// The referenced heap object; the slot was already read.
	Referent,
}

/// A locator bound to its static type.
///
/// Immutable snapshot of where a value lives; reads happen when a conversion
/// or navigation is requested and are never cached.
#[derive(Debug, Clone)]
pub struct TypedValue<'a> {
	inspector: Inspector<'a>,
	locator: ValueLocator,
	ty: &'a TypeDescriptor,
	denotes: Denotes,
}

impl<'a> TypedValue<'a> {
	pub(crate) fn storage(inspector: Inspector<'a>, locator: ValueLocator, ty: &'a TypeDescriptor) -> Self {
		Self {
			inspector,
			locator,
			ty,
			denotes: Denotes::Storage,
		}
	}

	pub(crate) fn referent(inspector: Inspector<'a>, address: u64, ty: &'a TypeDescriptor) -> Self {
		Self {
			inspector,
			locator: ValueLocator::address(address, ty.size),
			ty,
			denotes: Denotes::Referent,
		}
	}

	/// Static (declared) type.
	///
	/// For reference kinds this stays the declared type even after a field hop;
	/// use `as_object()?.ty()` for the concrete heap type.
	pub fn ty(&self) -> &'a TypeDescriptor {
		self.ty
	}

	/// Where the value's bytes live.
	pub fn locator(&self) -> &ValueLocator {
		&self.locator
	}

	/// Image address of the locator: the storage slot, or the object once a reference field was followed.
	pub fn address(&self) -> Option<u64> {
		self.locator.address_of()
	}

	/// Whether the locator already points at the referenced object rather than at a slot holding it.
	pub fn is_referent(&self) -> bool {
		self.denotes == Denotes::Referent
	}

	/// Collaborators this value reads through.
	pub fn inspector(&self) -> Inspector<'a> {
		self.inspector
	}

	/// Decode a `bool`.
	pub fn as_bool(&self) -> Result<bool> {
		Ok(self.scalar::<1>(PrimitiveKind::Bool)?[0] != 0)
	}

	/// Decode a UTF-16 code unit; lone surrogates become `U+FFFD`.
	pub fn as_char(&self) -> Result<char> {
		let unit = u16::from_le_bytes(self.scalar(PrimitiveKind::Char)?);
		Ok(char::decode_utf16([unit]).next().and_then(|item| item.ok()).unwrap_or(char::REPLACEMENT_CHARACTER))
	}

	/// Decode an `i8`.
	pub fn as_i8(&self) -> Result<i8> {
		Ok(i8::from_le_bytes(self.scalar(PrimitiveKind::I8)?))
	}

	/// Decode a `u8`.
	pub fn as_u8(&self) -> Result<u8> {
		Ok(u8::from_le_bytes(self.scalar(PrimitiveKind::U8)?))
	}

	/// Decode an `i16`.
	pub fn as_i16(&self) -> Result<i16> {
		Ok(i16::from_le_bytes(self.scalar(PrimitiveKind::I16)?))
	}

	/// Decode a `u16`.
	pub fn as_u16(&self) -> Result<u16> {
		Ok(u16::from_le_bytes(self.scalar(PrimitiveKind::U16)?))
	}

	/// Decode an `i32`.
	pub fn as_i32(&self) -> Result<i32> {
		Ok(i32::from_le_bytes(self.scalar(PrimitiveKind::I32)?))
	}

	/// Decode a `u32`.
	pub fn as_u32(&self) -> Result<u32> {
		Ok(u32::from_le_bytes(self.scalar(PrimitiveKind::U32)?))
	}

	/// Decode an `i64`.
	pub fn as_i64(&self) -> Result<i64> {
		Ok(i64::from_le_bytes(self.scalar(PrimitiveKind::I64)?))
	}

	/// Decode a `u64`.
	pub fn as_u64(&self) -> Result<u64> {
		Ok(u64::from_le_bytes(self.scalar(PrimitiveKind::U64)?))
	}

	/// Decode an `f32`.
	pub fn as_f32(&self) -> Result<f32> {
		Ok(f32::from_le_bytes(self.scalar(PrimitiveKind::F32)?))
	}

	/// Decode an `f64`.
	pub fn as_f64(&self) -> Result<f64> {
		Ok(f64::from_le_bytes(self.scalar(PrimitiveKind::F64)?))
	}

	/// Decode a signed pointer-sized integer, sign-extended from the image width.
	pub fn as_isize(&self) -> Result<i64> {
		self.expect_primitive(PrimitiveKind::IntPtr)?;
		let raw = self.inspector.read_pointer_at(&self.locator)?;
		Ok(match self.inspector.pointer_size() {
			4 => i64::from(raw as u32 as i32),
			_ => raw as i64,
		})
	}

	/// Decode an unsigned pointer-sized integer.
	pub fn as_usize(&self) -> Result<u64> {
		self.expect_primitive(PrimitiveKind::UIntPtr)?;
		self.inspector.read_pointer_at(&self.locator)
	}

	/// Decode a string; a null reference yields `None`.
	///
	/// Reads the string object's length, then its UTF-16 characters.
	pub fn as_string(&self) -> Result<Option<String>> {
		if self.ty.kind != TypeKind::String {
			return Err(self.mismatch("string"));
		}

		let address = self.referent_address()?;
		if address == 0 {
			return Ok(None);
		}
		read_string(self.inspector, address).map(Some)
	}

	/// Heap address a reference-kind value refers to, following the slot if needed.
	pub fn referent_address(&self) -> Result<u64> {
		if !self.ty.kind.is_reference() {
			return Err(self.mismatch("reference"));
		}

		match self.denotes {
			Denotes::Storage => self.inspector.read_pointer_at(&self.locator),
			Denotes::Referent => self.locator.address_of().ok_or_else(|| self.not_addressable()),
		}
	}

	/// Resolve to an object handle.
	///
	/// Reference kinds resolve the concrete heap type dynamically. An embedded
	/// value type yields an interior handle at its own address with its static type.
	pub fn as_object(&self) -> Result<ObjectHandle<'a>> {
		match self.ty.kind {
			TypeKind::Reference | TypeKind::String => Ok(self.inspector.object(self.referent_address()?)),
			TypeKind::Value => {
				let address = self.locator.address_of().ok_or_else(|| self.not_addressable())?;
				Ok(ObjectHandle::new(self.inspector, address, Some(self.ty)))
			}
			TypeKind::Primitive(_) => Err(self.mismatch("reference or value type")),
		}
	}

	/// Navigate to a named field.
	///
	/// Embedded fields add their offset to this value's locator; reference
	/// fields read their slot once and are rooted at the referenced object.
	/// Navigating from a reference-kind value goes through its resolved object.
	pub fn get_field(&self, name: &str) -> Result<TypedValue<'a>> {
		if self.ty.kind.is_reference() {
			return self.as_object()?.get_field(name);
		}

		let field = self.ty.field_by_name(name)?;
		field_value(self.inspector, &self.locator, field)
	}

	/// Navigate a dotted path one [`TypedValue::get_field`] step at a time.
	pub fn get_path(&self, path: &str) -> Result<TypedValue<'a>> {
		let path = FieldPath::parse(path)?;
		path.steps.iter().try_fold(self.clone(), |current, step| current.get_field(step))
	}

	/// Copy an address-backed value's bytes once and rebind them inline.
	///
	/// Subsequent field reads on the result are served from the copy.
	pub fn materialize(&self) -> Result<TypedValue<'a>> {
		match (&self.locator, self.denotes) {
			(ValueLocator::Address { address, len }, Denotes::Storage) => {
				let bytes = self.inspector.memory().read(*address, *len)?;
				Ok(Self::storage(self.inspector, ValueLocator::inline(bytes), self.ty))
			}
			_ => Ok(self.clone()),
		}
	}

	all_field_accessors!(ObjectHandle<'a>);

	fn scalar<const N: usize>(&self, expected: PrimitiveKind) -> Result<[u8; N]> {
		self.expect_primitive(expected)?;
		self.inspector.read_array(&self.locator)
	}

	fn expect_primitive(&self, expected: PrimitiveKind) -> Result<()> {
		if self.ty.kind == TypeKind::Primitive(expected) {
			Ok(())
		} else {
			Err(self.mismatch(expected.as_str()))
		}
	}

	fn mismatch(&self, expected: &'static str) -> ImageError {
		ImageError::TypeMismatch {
			expected,
			got: self.ty.describe(),
		}
	}

	fn not_addressable(&self) -> ImageError {
		ImageError::NotAddressable {
			type_name: self.ty.name.to_string(),
		}
	}
}

/// Child value for `field` inside the value or object whose bytes start at `container`.
pub(crate) fn field_value<'a>(inspector: Inspector<'a>, container: &ValueLocator, field: &FieldDescriptor) -> Result<TypedValue<'a>> {
	let ty = inspector.types().get(field.type_id)?;
	let slot = container.offset(field.offset, inspector.types().slot_size(ty))?;
	tracing::debug!(field = %field.name, offset = field.offset, ty = %ty.name, "field hop");

	if !ty.kind.is_reference() {
		return Ok(TypedValue::storage(inspector, slot, ty));
	}

	let address = inspector.read_pointer_at(&slot)?;
	Ok(TypedValue::referent(inspector, address, ty))
}

/// Decode the string object at `address` using the inspector's layout.
pub(crate) fn read_string(inspector: Inspector<'_>, address: u64) -> Result<String> {
	let layout = inspector.string_layout();
	let memory = inspector.memory();

	let length_at = address.checked_add(layout.length_offset as u64).ok_or(ImageError::OutOfRange { address, len: 4 })?;
	let mut raw = [0_u8; 4];
	memory.read_into(length_at, &mut raw)?;
	let len = u32::from_le_bytes(raw) as usize;

	let max = inspector.options().max_string_chars;
	if len > max {
		return Err(ImageError::StringTooLong { len, max });
	}

	let chars_at = address.checked_add(layout.chars_offset as u64).ok_or(ImageError::OutOfRange { address, len: len * 2 })?;
	let bytes = memory.read(chars_at, len * 2)?;
	let units: Vec<u16> = bytes.chunks_exact(2).map(|pair| u16::from_le_bytes([pair[0], pair[1]])).collect();
	tracing::debug!(address, len, "string decoded");
	Ok(U16Str::from_slice(&units).to_string_lossy())
}
