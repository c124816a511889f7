use std::fmt;
use std::hash::{Hash, Hasher};

use crate::image::value::{field_value, read_string};
use crate::image::{FieldPath, ImageError, Inspector, Result, TypeDescriptor, TypeKind, TypedValue, ValueLocator};


/// A heap object with its dynamically resolved type.
///
/// Null (`address == 0`) and unresolved handles are ordinary states: check
/// [`ObjectHandle::is_null`] / [`ObjectHandle::is_valid`] before navigating.
/// Equality and hashing use the address only.
#[derive(Clone, Copy)]
pub struct ObjectHandle<'a> {
	inspector: Inspector<'a>,
	address: u64,
	ty: Option<&'a TypeDescriptor>,
}

impl<'a> ObjectHandle<'a> {
	pub(crate) fn new(inspector: Inspector<'a>, address: u64, ty: Option<&'a TypeDescriptor>) -> Self {
		Self { inspector, address, ty }
	}

	/// Object identity.
	pub fn address(&self) -> u64 {
		self.address
	}

	/// Whether this is a null reference.
	pub fn is_null(&self) -> bool {
		self.address == 0
	}

	/// Whether the concrete type is known. Always `false` for null.
	pub fn is_valid(&self) -> bool {
		self.ty.is_some()
	}

	/// Concrete type, when resolved.
	pub fn ty(&self) -> Option<&'a TypeDescriptor> {
		self.ty
	}

	/// Concrete type name, when resolved.
	pub fn type_name(&self) -> Option<&'a str> {
		self.ty.map(|ty| ty.name.as_ref())
	}

	/// Navigate to a named field of the concrete type.
	pub fn get_field(&self, name: &str) -> Result<TypedValue<'a>> {
		let ty = self.require_type()?;
		let field = ty.field_by_name(name)?;
		field_value(self.inspector, &ValueLocator::address(self.address, ty.size), field)
	}

	/// Navigate a dotted path one field at a time.
	pub fn get_path(&self, path: &str) -> Result<TypedValue<'a>> {
		let parsed = FieldPath::parse(path)?;
		let (first, rest) = parsed.steps.split_first().ok_or_else(|| ImageError::InvalidFieldPath { path: path.to_owned() })?;
		rest.iter().try_fold(self.get_field(first)?, |current, step| current.get_field(step))
	}

	/// The object as a typed value rooted at its address.
	pub fn as_value(&self) -> Result<TypedValue<'a>> {
		let ty = self.require_type()?;
		if ty.kind.is_reference() {
			Ok(TypedValue::referent(self.inspector, self.address, ty))
		} else {
			Ok(TypedValue::storage(self.inspector, ValueLocator::address(self.address, ty.size), ty))
		}
	}

	/// Decode the object as a string.
	pub fn as_string(&self) -> Result<String> {
		let ty = self.require_type()?;
		if ty.kind != TypeKind::String {
			return Err(ImageError::TypeMismatch {
				expected: "string",
				got: ty.describe(),
			});
		}
		read_string(self.inspector, self.address)
	}

	all_field_accessors!(ObjectHandle<'a>);

	fn require_type(&self) -> Result<&'a TypeDescriptor> {
		if self.is_null() {
			return Err(ImageError::NullReference);
		}
		self.ty.ok_or(ImageError::InvalidObject { address: self.address })
	}
}

impl fmt::Debug for ObjectHandle<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ObjectHandle")
			.field("address", &format_args!("0x{:016x}", self.address))
			.field("ty", &self.type_name())
			.finish()
	}
}

impl PartialEq for ObjectHandle<'_> {
	fn eq(&self, other: &Self) -> bool {
		self.address == other.address
	}
}

impl Eq for ObjectHandle<'_> {}

impl Hash for ObjectHandle<'_> {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.address.hash(state);
	}
}
