use crate::image::{ImageError, Result, TypeId, ValueLocator};

/// Storage of one named local variable.
#[derive(Debug, Clone)]
pub struct Local {
	/// Variable name.
	pub name: Box<str>,
	/// Declared type.
	pub type_id: TypeId,
	/// Stack slot address, or inline bytes for register-resident values.
	pub locator: ValueLocator,
}

/// One captured stack frame.
#[derive(Debug, Clone)]
pub struct StackFrame {
	/// Method or frame name.
	pub name: Box<str>,
	locals: Vec<Local>,
}

impl StackFrame {
	/// Frame with the given locals.
	pub fn new(name: &str, locals: Vec<Local>) -> Self {
		Self { name: name.into(), locals }
	}

	/// Locals in declaration order.
	pub fn locals(&self) -> &[Local] {
		&self.locals
	}

	/// Local by exact name.
	pub fn local(&self, name: &str) -> Result<&Local> {
		self.locals
			.iter()
			.find(|local| local.name.as_ref() == name)
			.ok_or_else(|| ImageError::LocalNotFound {
				frame: self.name.to_string(),
				name: name.to_owned(),
			})
	}
}

/// One captured thread with its frames, innermost first.
#[derive(Debug, Clone)]
pub struct Thread {
	/// Thread id.
	pub id: u32,
	frames: Vec<StackFrame>,
}

impl Thread {
	/// Thread with the given frames.
	pub fn new(id: u32, frames: Vec<StackFrame>) -> Self {
		Self { id, frames }
	}

	/// Frames, innermost first.
	pub fn frames(&self) -> &[StackFrame] {
		&self.frames
	}

	/// Innermost frame with the given name.
	pub fn frame(&self, name: &str) -> Result<&StackFrame> {
		self.frames
			.iter()
			.find(|frame| frame.name.as_ref() == name)
			.ok_or_else(|| ImageError::FrameNotFound { name: name.to_owned() })
	}
}
