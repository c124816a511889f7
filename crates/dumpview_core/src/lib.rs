//! Public library API for reading typed values out of captured managed-process memory images.

/// Memory images, type metadata, typed values, and object navigation.
pub mod image;
