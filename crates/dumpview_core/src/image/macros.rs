/// Generate `get_<kind>_field` conveniences as `get_field` followed by the matching conversion.
macro_rules! field_accessors {
	($($(#[$meta:meta])* $name:ident => $conv:ident -> $out:ty;)*) => {
		$(
			$(#[$meta])*
			pub fn $name(&self, field: &str) -> Result<$out> {
				self.get_field(field)?.$conv()
			}
		)*
	};
}

/// Full convenience set shared by [`crate::image::TypedValue`] and [`crate::image::ObjectHandle`].
macro_rules! all_field_accessors {
	($object:ty) => {
		field_accessors! {
			/// `get_field(name)?.as_bool()`.
			get_bool_field => as_bool -> bool;
			/// `get_field(name)?.as_char()`.
			get_char_field => as_char -> char;
			/// `get_field(name)?.as_i8()`.
			get_i8_field => as_i8 -> i8;
			/// `get_field(name)?.as_u8()`.
			get_u8_field => as_u8 -> u8;
			/// `get_field(name)?.as_i16()`.
			get_i16_field => as_i16 -> i16;
			/// `get_field(name)?.as_u16()`.
			get_u16_field => as_u16 -> u16;
			/// `get_field(name)?.as_i32()`.
			get_i32_field => as_i32 -> i32;
			/// `get_field(name)?.as_u32()`.
			get_u32_field => as_u32 -> u32;
			/// `get_field(name)?.as_i64()`.
			get_i64_field => as_i64 -> i64;
			/// `get_field(name)?.as_u64()`.
			get_u64_field => as_u64 -> u64;
			/// `get_field(name)?.as_f32()`.
			get_f32_field => as_f32 -> f32;
			/// `get_field(name)?.as_f64()`.
			get_f64_field => as_f64 -> f64;
			/// `get_field(name)?.as_isize()`.
			get_isize_field => as_isize -> i64;
			/// `get_field(name)?.as_usize()`.
			get_usize_field => as_usize -> u64;
			/// `get_field(name)?.as_string()`.
			get_string_field => as_string -> Option<String>;
			/// `get_field(name)?.as_object()`.
			get_object_field => as_object -> $object;
		}
	};
}
