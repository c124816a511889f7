use dumpview::image::{ObjectHandle, PrimitiveKind, Result, TypeKind, TypedValue};
use serde_json::{Map, Value as Json, json};

use crate::cmd::util::{ptr_hex, truncate};

/// Output truncation limits for rendered value trees.
#[derive(Debug, Clone, Copy)]
pub struct PrintOptions {
	/// Maximum nesting depth expanded before composites are elided.
	pub max_depth: u32,
	/// Maximum number of fields rendered for a single composite.
	pub max_fields: usize,
	/// Maximum number of Unicode scalar values printed for strings.
	pub max_string_len: usize,
}

impl Default for PrintOptions {
	fn default() -> Self {
		Self {
			max_depth: 4,
			max_fields: 64,
			max_string_len: 200,
		}
	}
}

/// Fully read value tree, detached from the snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum Rendered {
	/// Null reference.
	Null,
	/// Boolean scalar.
	Bool(bool),
	/// UTF-16 code unit.
	Char(char),
	/// Signed integer scalar.
	Int(i64),
	/// Unsigned integer scalar.
	UInt(u64),
	/// Floating-point scalar.
	Float(f64),
	/// Decoded (possibly truncated) string.
	String(String),
	/// Value type or heap object with its fields.
	Composite {
		/// Concrete type name.
		type_name: String,
		/// Object or storage address, when the value has one.
		address: Option<u64>,
		/// Rendered fields, or `None` when the depth limit was reached.
		fields: Option<Vec<(String, Rendered)>>,
		/// Fields skipped by the field limit.
		omitted: usize,
	},
	/// Non-null object whose type could not be resolved.
	Unresolved {
		/// Object address.
		address: u64,
	},
	/// Object already being rendered further up the tree.
	Cycle {
		/// Object address.
		address: u64,
	},
	/// Read failure for this node only.
	Error(String),
}

/// Walks typed values into [`Rendered`] trees under [`PrintOptions`] limits.
pub struct Renderer {
	options: PrintOptions,
	stack: Vec<u64>,
}

impl Renderer {
	/// Create a renderer.
	pub fn new(options: PrintOptions) -> Self {
		Self { options, stack: Vec::new() }
	}

	/// Render a typed value; read failures become [`Rendered::Error`] nodes.
	pub fn value(&mut self, value: &TypedValue<'_>, depth: u32) -> Rendered {
		self.try_value(value, depth).unwrap_or_else(|err| Rendered::Error(err.to_string()))
	}

	/// Render a heap object handle.
	pub fn object(&mut self, handle: &ObjectHandle<'_>, depth: u32) -> Rendered {
		self.try_object(handle, depth).unwrap_or_else(|err| Rendered::Error(err.to_string()))
	}

	fn try_value(&mut self, value: &TypedValue<'_>, depth: u32) -> Result<Rendered> {
		let ty = value.ty();
		match ty.kind {
			TypeKind::Primitive(kind) => primitive(value, kind),
			TypeKind::String => Ok(match value.as_string()? {
				Some(text) => Rendered::String(truncate(&text, self.options.max_string_len)),
				None => Rendered::Null,
			}),
			TypeKind::Value => {
				if depth >= self.options.max_depth {
					return Ok(composite(&ty.name, value.address(), None, 0));
				}
				let mut fields = Vec::new();
				for field in ty.fields().iter().take(self.options.max_fields) {
					let child = value.get_field(&field.name).map(|child| self.value(&child, depth + 1));
					fields.push((field.name.to_string(), child.unwrap_or_else(|err| Rendered::Error(err.to_string()))));
				}
				let omitted = ty.fields().len().saturating_sub(self.options.max_fields);
				Ok(composite(&ty.name, value.address(), Some(fields), omitted))
			}
			TypeKind::Reference => self.try_object(&value.as_object()?, depth),
		}
	}

	fn try_object(&mut self, handle: &ObjectHandle<'_>, depth: u32) -> Result<Rendered> {
		if handle.is_null() {
			return Ok(Rendered::Null);
		}
		let Some(ty) = handle.ty() else {
			return Ok(Rendered::Unresolved { address: handle.address() });
		};
		if ty.kind == TypeKind::String {
			return Ok(Rendered::String(truncate(&handle.as_string()?, self.options.max_string_len)));
		}
		if !ty.kind.is_reference() {
			return self.try_value(&handle.as_value()?, depth);
		}

		let address = handle.address();
		if self.stack.contains(&address) {
			return Ok(Rendered::Cycle { address });
		}
		if depth >= self.options.max_depth {
			return Ok(composite(&ty.name, Some(address), None, 0));
		}

		self.stack.push(address);
		let mut fields = Vec::new();
		for field in ty.fields().iter().take(self.options.max_fields) {
			let child = handle.get_field(&field.name).map(|child| self.value(&child, depth + 1));
			fields.push((field.name.to_string(), child.unwrap_or_else(|err| Rendered::Error(err.to_string()))));
		}
		self.stack.pop();

		let omitted = ty.fields().len().saturating_sub(self.options.max_fields);
		Ok(composite(&ty.name, Some(address), Some(fields), omitted))
	}
}

fn composite(type_name: &str, address: Option<u64>, fields: Option<Vec<(String, Rendered)>>, omitted: usize) -> Rendered {
	Rendered::Composite {
		type_name: type_name.to_owned(),
		address,
		fields,
		omitted,
	}
}

fn primitive(value: &TypedValue<'_>, kind: PrimitiveKind) -> Result<Rendered> {
	Ok(match kind {
		PrimitiveKind::Bool => Rendered::Bool(value.as_bool()?),
		PrimitiveKind::Char => Rendered::Char(value.as_char()?),
		PrimitiveKind::I8 => Rendered::Int(value.as_i8()?.into()),
		PrimitiveKind::U8 => Rendered::UInt(value.as_u8()?.into()),
		PrimitiveKind::I16 => Rendered::Int(value.as_i16()?.into()),
		PrimitiveKind::U16 => Rendered::UInt(value.as_u16()?.into()),
		PrimitiveKind::I32 => Rendered::Int(value.as_i32()?.into()),
		PrimitiveKind::U32 => Rendered::UInt(value.as_u32()?.into()),
		PrimitiveKind::I64 => Rendered::Int(value.as_i64()?),
		PrimitiveKind::U64 => Rendered::UInt(value.as_u64()?),
		PrimitiveKind::F32 => Rendered::Float(value.as_f32()?.into()),
		PrimitiveKind::F64 => Rendered::Float(value.as_f64()?),
		PrimitiveKind::IntPtr => Rendered::Int(value.as_isize()?),
		PrimitiveKind::UIntPtr => Rendered::UInt(value.as_usize()?),
	})
}

impl Rendered {
	/// JSON form: scalars map to JSON scalars, composites to `{type, address, fields}` objects.
	pub fn to_json(&self) -> Json {
		match self {
			Self::Null => Json::Null,
			Self::Bool(value) => json!(value),
			Self::Char(value) => json!(value.to_string()),
			Self::Int(value) => json!(value),
			Self::UInt(value) => json!(value),
			Self::Float(value) => json!(value),
			Self::String(value) => json!(value),
			Self::Composite {
				type_name,
				address,
				fields,
				omitted,
			} => {
				let elided = fields.is_none();
				let fields = fields.as_ref().map(|items| {
					let map: Map<String, Json> = items.iter().map(|(name, child)| (name.clone(), child.to_json())).collect();
					Json::Object(map)
				});
				json!({
					"type": type_name,
					"address": address.map(ptr_hex),
					"fields": fields,
					"elided": elided,
					"omitted_fields": omitted,
				})
			}
			Self::Unresolved { address } => json!({ "unresolved": ptr_hex(*address) }),
			Self::Cycle { address } => json!({ "cycle": ptr_hex(*address) }),
			Self::Error(message) => json!({ "error": message }),
		}
	}

	/// Indented text form, one field per line.
	pub fn to_text(&self) -> String {
		let mut out = String::new();
		self.write_text(&mut out, 0);
		out
	}

	fn write_text(&self, out: &mut String, indent: usize) {
		let line = match self {
			Self::Null => "null".to_owned(),
			Self::Bool(value) => value.to_string(),
			Self::Char(value) => format!("{value:?}"),
			Self::Int(value) => value.to_string(),
			Self::UInt(value) => value.to_string(),
			Self::Float(value) => value.to_string(),
			Self::String(value) => format!("{value:?}"),
			Self::Unresolved { address } => format!("<unresolved {}>", ptr_hex(*address)),
			Self::Cycle { address } => format!("<cycle {}>", ptr_hex(*address)),
			Self::Error(message) => format!("<error: {message}>"),
			Self::Composite {
				type_name,
				address,
				fields,
				omitted,
			} => {
				out.push_str(type_name);
				if let Some(address) = address {
					out.push_str(&format!(" @ {}", ptr_hex(*address)));
				}
				let Some(fields) = fields else {
					out.push_str(" { ... }\n");
					return;
				};
				out.push('\n');
				let pad = " ".repeat(indent + 2);
				for (name, child) in fields {
					out.push_str(&format!("{pad}{name}: "));
					child.write_text(out, indent + 2);
				}
				if *omitted > 0 {
					out.push_str(&format!("{pad}... {omitted} more\n"));
				}
				return;
			}
		};
		out.push_str(&line);
		out.push('\n');
	}
}
