#[macro_use]
mod macros;

mod compression;
mod error;
mod frame;
mod inspector;
mod locator;
mod memory;
mod object;
mod path;
mod resolver;
mod snapshot;
#[cfg(test)]
mod test_support;
mod types;
mod value;

/// Region file loading and compression detection.
pub use compression::{Compression, ZSTD_MAGIC, load_region_file};
/// Error and result aliases.
pub use error::{ImageError, Result};
/// Captured threads, frames and locals.
pub use frame::{Local, StackFrame, Thread};
/// Value context and read limits.
pub use inspector::{Inspector, ReadOptions, StringLayout};
/// Value storage locations.
pub use locator::{InlineBytes, ValueLocator};
/// Memory accessors over captured images.
pub use memory::{MemoryImage, MemoryReader, Region, RegionBytes, StreamExtent, StreamImage, check_pointer_size, decode_pointer};
/// Heap object handles.
pub use object::ObjectHandle;
/// Dotted field path parser.
pub use path::FieldPath;
/// Heap type resolution.
pub use resolver::{HeapTypeResolver, ObjectTable, TypeHandleResolver};
/// Snapshot container and its JSON manifest schema.
pub use snapshot::{FieldSpec, FrameSpec, KindSpec, LocalSpec, Manifest, ObjectSpec, RegionSpec, Snapshot, ThreadSpec, TypeSpec, parse_address};
/// Type metadata.
pub use types::{FieldDescriptor, OBJECT_TYPE_NAME, PrimitiveKind, STRING_TYPE_NAME, TypeDescriptor, TypeId, TypeKind, TypeTable, TypeTableBuilder};
/// Typed values.
pub use value::TypedValue;
