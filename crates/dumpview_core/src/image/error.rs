use thiserror::Error;

/// Crate-local result type.
pub type Result<T> = std::result::Result<T, ImageError>;

/// Errors produced while reading captured images and navigating typed values.
#[derive(Debug, Error)]
pub enum ImageError {
	/// Filesystem or stream IO failure.
	#[error("io: {0}")]
	Io(#[from] std::io::Error),
	/// Snapshot manifest was not valid JSON for the expected schema.
	#[error("manifest json: {0}")]
	Json(#[from] serde_json::Error),
	/// Requested range is not backed by image data.
	#[error("read out of range: address=0x{address:016x}, len={len}")]
	OutOfRange {
		/// First byte of the requested range.
		address: u64,
		/// Requested byte count.
		len: usize,
	},
	/// Image pointer width is neither 4 nor 8 bytes.
	#[error("unsupported pointer size {size} (expected 4 or 8)")]
	UnsupportedPointerSize {
		/// Offending pointer width.
		size: usize,
	},
	/// Memory accessor and type table disagree on the image pointer width.
	#[error("pointer size mismatch: image={image}, types={types}")]
	PointerSizeMismatch {
		/// Pointer width reported by the memory accessor.
		image: usize,
		/// Pointer width the type table was laid out for.
		types: usize,
	},
	/// Two image regions claim the same addresses.
	#[error("overlapping regions at 0x{base:016x}")]
	RegionOverlap {
		/// Base address of the later region.
		base: u64,
	},
	/// Field name lookup miss.
	#[error("field not found: {type_name}.{field}")]
	FieldNotFound {
		/// Type whose field table was searched.
		type_name: String,
		/// Requested field name.
		field: String,
	},
	/// Accessor invoked against an incompatible declared kind.
	#[error("type mismatch: expected {expected}, got {got}")]
	TypeMismatch {
		/// Kind required by the accessor.
		expected: &'static str,
		/// Declared type and kind of the value.
		got: String,
	},
	/// Inline bytes do not match the bound type's storage size.
	#[error("inline length mismatch for {type_name}: expected {expected}, got {got}")]
	InlineLengthMismatch {
		/// Bound type name.
		type_name: String,
		/// Storage size of the type.
		expected: usize,
		/// Supplied byte count.
		got: usize,
	},
	/// Sub-slice of inline bytes exceeded the parent's bytes.
	#[error("inline slice out of bounds: start={start}, size={size}, have={have}")]
	InlineSliceOob {
		/// Requested start offset.
		start: usize,
		/// Requested length.
		size: usize,
		/// Available inline bytes.
		have: usize,
	},
	/// Type name is not registered in the type table.
	#[error("type not found: {name}")]
	TypeNotFound {
		/// Requested type name.
		name: String,
	},
	/// Type id does not index the type table.
	#[error("type id out of range: {id}")]
	TypeIdOutOfRange {
		/// Offending id.
		id: u32,
	},
	/// Type name registered twice.
	#[error("duplicate type: {name}")]
	DuplicateType {
		/// Duplicated name.
		name: String,
	},
	/// Type handle registered for two types.
	#[error("duplicate type handle 0x{handle:016x}")]
	DuplicateTypeHandle {
		/// Duplicated handle value.
		handle: u64,
	},
	/// Field name registered twice on one type.
	#[error("duplicate field {type_name}.{field}")]
	DuplicateField {
		/// Owning type name.
		type_name: String,
		/// Duplicated field name.
		field: String,
	},
	/// Field storage extends past the owning type's size.
	#[error("field {type_name}.{field} at offset {offset} (size {size}) exceeds type size {type_size}")]
	FieldOutOfBounds {
		/// Owning type name.
		type_name: String,
		/// Field name.
		field: String,
		/// Field byte offset.
		offset: usize,
		/// Field storage size.
		size: usize,
		/// Owning type size.
		type_size: usize,
	},
	/// Two fields share bytes.
	#[error("fields {first} and {second} overlap in {type_name}")]
	FieldOverlap {
		/// Owning type name.
		type_name: String,
		/// Lower-offset field.
		first: String,
		/// Overlapping field.
		second: String,
	},
	/// Navigation through a null reference.
	#[error("null reference")]
	NullReference,
	/// Navigation through an object whose heap type could not be resolved.
	#[error("unresolved heap object at 0x{address:016x}")]
	InvalidObject {
		/// Object address.
		address: u64,
	},
	/// Value has no address in the image (it only exists as inline bytes).
	#[error("value of type {type_name} is not addressable")]
	NotAddressable {
		/// Type of the inline value.
		type_name: String,
	},
	/// String length exceeded the configured limit.
	#[error("string too long: len={len}, max={max}")]
	StringTooLong {
		/// Length read from the string object.
		len: usize,
		/// Configured maximum.
		max: usize,
	},
	/// Field path expression syntax is invalid.
	#[error("invalid field path: {path}")]
	InvalidFieldPath {
		/// Original path text.
		path: String,
	},
	/// Address literal could not be parsed.
	#[error("invalid address literal: {value}")]
	InvalidAddressLiteral {
		/// Original literal text.
		value: String,
	},
	/// Manifest content is structurally valid JSON but semantically wrong.
	#[error("invalid manifest: {reason}")]
	InvalidManifest {
		/// Human-readable cause.
		reason: String,
	},
	/// Decompression output exceeded configured safety limit.
	#[error("decompressed output exceeded limit {limit} bytes")]
	DecompressedTooLarge {
		/// Maximum allowed output bytes.
		limit: usize,
	},
	/// No thread with the requested id.
	#[error("thread not found: {id}")]
	ThreadNotFound {
		/// Requested thread id.
		id: u32,
	},
	/// No frame with the requested name on the thread.
	#[error("frame not found: {name}")]
	FrameNotFound {
		/// Requested frame name.
		name: String,
	},
	/// No local with the requested name in the frame.
	#[error("local {name} not found in frame {frame}")]
	LocalNotFound {
		/// Frame that was searched.
		frame: String,
		/// Requested local name.
		name: String,
	},
}
