use dumpview_testkit::ImageBuilder;

use crate::image::test_support::{DERIVED, FOO, HELLO, LOCAL_ST, sample_snapshot};
use crate::image::{
	ImageError, Inspector, MemoryImage, MemoryReader, ObjectTable, PrimitiveKind, ReadOptions, STRING_TYPE_NAME, TypeKind, TypeTableBuilder,
	TypedValue, ValueLocator,
};

#[test]
fn primitive_locals_decode_through_their_declared_type() {
	let snapshot = sample_snapshot();

	assert!(snapshot.local(1, "Inner", "b").expect("b").as_bool().expect("bool"));
	assert_eq!(snapshot.local(1, "Inner", "i").expect("i").as_i32().expect("i32"), 0x4242_4242);
	assert_eq!(snapshot.local(1, "Inner", "s").expect("s").as_string().expect("string").as_deref(), Some("hello world"));
}

#[test]
fn accessor_on_wrong_kind_is_type_mismatch() {
	let snapshot = sample_snapshot();
	let b = snapshot.local(1, "Inner", "b").expect("b");

	let err = b.as_i32().expect_err("bool is not i32");
	assert!(matches!(err, ImageError::TypeMismatch { expected: "i32", .. }));
	assert!(matches!(b.as_string(), Err(ImageError::TypeMismatch { expected: "string", .. })));
	assert!(matches!(b.get_field("x"), Err(ImageError::FieldNotFound { .. })));
}

#[test]
fn every_primitive_kind_round_trips_on_both_pointer_sizes() {
	for pointer_size in [4_usize, 8] {
		let slot = |index: usize| 0x100 + 8 * index as u64;
		let surrogate = slot(PrimitiveKind::ALL.len());
		let mut image = ImageBuilder::new(pointer_size).region(0x100, 8 * (PrimitiveKind::ALL.len() + 1));
		for (index, kind) in PrimitiveKind::ALL.into_iter().enumerate() {
			let at = slot(index);
			image = match kind {
				PrimitiveKind::Bool => image.bool(at, true),
				PrimitiveKind::Char => image.u16(at, 0x263a),
				PrimitiveKind::I8 => image.u8(at, (-2_i8) as u8),
				PrimitiveKind::U8 => image.u8(at, 0xfe),
				PrimitiveKind::I16 => image.u16(at, (-300_i16) as u16),
				PrimitiveKind::U16 => image.u16(at, 0xbeef),
				PrimitiveKind::I32 => image.u32(at, (-7_i32) as u32),
				PrimitiveKind::U32 => image.u32(at, 0xdead_beef),
				PrimitiveKind::I64 => image.u64(at, (-9_000_000_000_i64) as u64),
				PrimitiveKind::U64 => image.u64(at, u64::MAX - 1),
				PrimitiveKind::F32 => image.f32(at, 1.5),
				PrimitiveKind::F64 => image.f64(at, -2.25),
				PrimitiveKind::IntPtr | PrimitiveKind::UIntPtr => image.ptr(at, 0xffff_fff0),
			};
		}
		let regions = image.u16(surrogate, 0xd800).build();
		let memory = MemoryImage::from_regions(pointer_size, regions).expect("image");
		let types = TypeTableBuilder::new(pointer_size).expect("builder").build().expect("table");
		let heap = ObjectTable::new();
		let inspector = Inspector::new(&memory, &types, &heap).expect("inspector");
		let at = |address: u64, kind: PrimitiveKind| inspector.value_by_name(ValueLocator::address(address, 0), kind.as_str()).expect("value");

		for (index, kind) in PrimitiveKind::ALL.into_iter().enumerate() {
			let value = at(slot(index), kind);
			assert_eq!(value.locator().len(), kind.size(pointer_size), "{kind:?} width");
			match kind {
				PrimitiveKind::Bool => assert!(value.as_bool().expect("bool")),
				PrimitiveKind::Char => assert_eq!(value.as_char().expect("char"), '\u{263a}'),
				PrimitiveKind::I8 => assert_eq!(value.as_i8().expect("i8"), -2),
				PrimitiveKind::U8 => assert_eq!(value.as_u8().expect("u8"), 0xfe),
				PrimitiveKind::I16 => assert_eq!(value.as_i16().expect("i16"), -300),
				PrimitiveKind::U16 => assert_eq!(value.as_u16().expect("u16"), 0xbeef),
				PrimitiveKind::I32 => assert_eq!(value.as_i32().expect("i32"), -7),
				PrimitiveKind::U32 => assert_eq!(value.as_u32().expect("u32"), 0xdead_beef),
				PrimitiveKind::I64 => assert_eq!(value.as_i64().expect("i64"), -9_000_000_000),
				PrimitiveKind::U64 => assert_eq!(value.as_u64().expect("u64"), u64::MAX - 1),
				PrimitiveKind::F32 => assert_eq!(value.as_f32().expect("f32"), 1.5),
				PrimitiveKind::F64 => assert_eq!(value.as_f64().expect("f64"), -2.25),
				PrimitiveKind::IntPtr => {
					let expected = if pointer_size == 4 { -16 } else { 0xffff_fff0 };
					assert_eq!(value.as_isize().expect("isize"), expected);
				}
				PrimitiveKind::UIntPtr => assert_eq!(value.as_usize().expect("usize"), 0xffff_fff0),
			}
		}

		assert_eq!(at(slot(0), PrimitiveKind::U8).as_u8().expect("bool byte"), 1);
		assert_eq!(at(surrogate, PrimitiveKind::Char).as_char().expect("lone surrogate"), char::REPLACEMENT_CHARACTER);
	}
}

#[test]
fn reference_fields_inside_value_types_read_through_every_locator() {
	const TEXT: u64 = 0x400;
	const PLAIN: u64 = 0x480;

	for pointer_size in [4_usize, 8] {
		let ptr = pointer_size as u64;
		let mut builder = TypeTableBuilder::new(pointer_size).expect("builder");
		let string = builder.id_of(STRING_TYPE_NAME).expect("string type");
		let object = builder.id_of("object").expect("object type");
		let int32 = builder.primitive(PrimitiveKind::I32);
		let holder = builder.declare("Holder", TypeKind::Value, 3 * pointer_size).expect("Holder");
		let outer = builder.declare("Outer", TypeKind::Value, 4 * pointer_size).expect("Outer");
		builder.add_field(holder, "i", int32, 0).expect("Holder.i");
		builder.add_field(holder, "s", string, pointer_size).expect("Holder.s");
		builder.add_field(holder, "o", object, 2 * pointer_size).expect("Holder.o");
		builder.add_field(outer, "tag", int32, 0).expect("Outer.tag");
		builder.add_field(outer, "holder", holder, pointer_size).expect("Outer.holder");
		let types = builder.build().expect("table");

		let regions = ImageBuilder::new(pointer_size)
			.region(0x100, 0x40)
			.u32(0x100, 5)
			.u32(0x100 + ptr, 9)
			.ptr(0x100 + 2 * ptr, TEXT)
			.ptr(0x100 + 3 * ptr, PLAIN)
			.region(0x400, 0x100)
			.string_object(TEXT, 0, "string")
			.build();
		let memory = MemoryImage::from_regions(pointer_size, regions).expect("image");
		let mut heap = ObjectTable::new();
		heap.insert(TEXT, string);
		heap.insert(PLAIN, object);
		let inspector = Inspector::new(&memory, &types, &heap).expect("inspector");

		let outer = inspector.value_by_name(ValueLocator::address(0x100, 0), "Outer").expect("Outer");
		assert_eq!(outer.get_i32_field("tag").expect("tag"), 5);
		assert_eq!(outer.get_path("holder.s").expect("holder.s").as_string().expect("string").as_deref(), Some("string"));
		assert_holder(&outer.get_field("holder").expect("nested holder"), PLAIN);

		let direct = inspector.value_by_name(ValueLocator::address(0x100 + ptr, 0), "Holder").expect("Holder");
		assert_holder(&direct, PLAIN);
		assert_holder(&outer.materialize().expect("materialize").get_field("holder").expect("copied holder"), PLAIN);

		let bytes = memory.read(0x100 + ptr, 3 * pointer_size).expect("holder bytes");
		let inline = inspector.value_by_name(ValueLocator::inline(bytes), "Holder").expect("inline Holder");
		assert_eq!(inline.address(), None);
		assert_holder(&inline, PLAIN);
	}
}

fn assert_holder(holder: &TypedValue<'_>, object: u64) {
	assert_eq!(holder.get_i32_field("i").expect("i"), 9);
	assert_eq!(holder.get_string_field("s").expect("s").as_deref(), Some("string"));

	let o = holder.get_field("o").expect("o");
	assert!(o.is_referent());
	assert_eq!(o.ty().name.as_ref(), "System.Object");
	let handle = holder.get_object_field("o").expect("o handle");
	assert_eq!(handle.address(), object);
	assert_eq!(handle.type_name(), Some("System.Object"));
}

#[test]
fn nested_value_fields_accumulate_offsets() {
	let snapshot = sample_snapshot();
	let st = snapshot.local(1, "Main", "st").expect("st");

	let middle = st.get_field("middle").expect("middle");
	let inner = middle.get_field("inner").expect("inner");
	let b = inner.get_field("b").expect("b");
	assert_eq!(middle.address(), Some(LOCAL_ST + 8));
	assert_eq!(inner.address(), Some(LOCAL_ST + 16));
	assert_eq!(b.address(), Some(LOCAL_ST + 16));
	assert_eq!(inner.get_field("i").expect("i").address(), Some(LOCAL_ST + 20));

	assert_eq!(st.get_i64_field("number").expect("number"), 7);
	assert_eq!(middle.get_i32_field("value").expect("value"), -5);
	assert!(inner.get_bool_field("b").expect("b"));
	assert_eq!(inner.get_i32_field("i").expect("i"), 99);
}

#[test]
fn dotted_path_matches_stepwise_navigation() {
	let snapshot = sample_snapshot();
	let st = snapshot.local(1, "Main", "st").expect("st");

	let stepwise = st.get_field("middle").and_then(|v| v.get_field("inner")).and_then(|v| v.get_field("i")).expect("stepwise");
	let dotted = st.get_path("middle.inner.i").expect("dotted");
	assert_eq!(stepwise.locator(), dotted.locator());
	assert_eq!(dotted.as_i32().expect("i32"), 99);
	assert!(matches!(st.get_path("middle..i"), Err(ImageError::InvalidFieldPath { .. })));
	assert!(matches!(st.get_path("middle.nope"), Err(ImageError::FieldNotFound { .. })));
}

#[test]
fn inline_values_navigate_without_memory() {
	let snapshot = sample_snapshot();
	let reg = snapshot.local(1, "Main", "reg").expect("reg");

	assert_eq!(reg.address(), None);
	assert!(reg.get_bool_field("b").expect("b"));
	assert_eq!(reg.get_i32_field("i").expect("i"), 42);
	assert!(matches!(reg.as_object(), Err(ImageError::NotAddressable { .. })));
}

#[test]
fn inline_locator_length_must_match_type() {
	let snapshot = sample_snapshot();
	let inspector = snapshot.inspector().expect("inspector");

	let err = inspector.value_by_name(ValueLocator::inline(vec![0; 3]), "Inner").expect_err("short inline value");
	assert!(matches!(err, ImageError::InlineLengthMismatch { expected: 8, got: 3, .. }));
}

#[test]
fn materialized_value_reads_from_its_copy() {
	let snapshot = sample_snapshot();
	let st = snapshot.local(1, "Main", "st").expect("st");

	let copy = st.materialize().expect("materialize");
	assert_eq!(copy.address(), None);
	assert_eq!(copy.get_path("middle.inner.i").expect("i").as_i32().expect("i32"), 99);
	assert_eq!(copy.get_i64_field("number").expect("number"), 7);
}

#[test]
fn reference_fields_are_rooted_at_their_object() {
	let snapshot = sample_snapshot();
	let foo = snapshot.local(1, "Main", "foo").expect("foo");

	assert!(!foo.is_referent());
	assert_eq!(foo.referent_address().expect("referent"), FOO);
	assert_eq!(foo.get_i32_field("i").expect("i"), 17);
	assert_eq!(foo.get_string_field("s").expect("s").as_deref(), Some("foo"));

	let next = foo.get_field("next").expect("next");
	assert!(next.is_referent());
	assert_eq!(next.address(), Some(DERIVED));
	assert_eq!(next.referent_address().expect("referent"), DERIVED);
}

#[test]
fn reference_field_of_reference_navigates_dynamic_type() {
	let snapshot = sample_snapshot();
	let foo = snapshot.local(1, "Main", "foo").expect("foo");

	let next = foo.get_field("next").expect("next");
	assert_eq!(next.ty().name.as_ref(), "System.Object");
	assert_eq!(next.get_i32_field("value").expect("Derived.value"), 1234);
	assert_eq!(next.get_path("name").expect("name").as_string().expect("string").as_deref(), Some("hello world"));
}

#[test]
fn null_string_decodes_to_none() {
	let snapshot = sample_snapshot();
	let nil = snapshot.local(1, "Main", "nil").expect("nil");

	assert_eq!(nil.as_string().expect("null string"), None);
	assert!(nil.as_object().expect("handle").is_null());
}

#[test]
fn string_length_limit_is_enforced() {
	let snapshot = sample_snapshot().with_options(ReadOptions {
		max_string_chars: 4,
		..ReadOptions::default()
	});
	let s = snapshot.local(1, "Inner", "s").expect("s");

	let err = s.as_string().expect_err("11 chars over limit");
	assert!(matches!(err, ImageError::StringTooLong { len: 11, max: 4 }));
}

#[test]
fn values_over_unmapped_memory_fail_on_read() {
	let snapshot = sample_snapshot();
	let inspector = snapshot.inspector().expect("inspector");
	let ty = snapshot.types().by_name("i32").expect("i32");
	assert_eq!(ty.kind, TypeKind::Primitive(PrimitiveKind::I32));

	let value = inspector.value(ValueLocator::address(0x9_0000, 0), ty.id).expect("binding is lazy");
	assert!(matches!(value.as_i32(), Err(ImageError::OutOfRange { address: 0x9_0000, .. })));
	assert!(inspector.value(ValueLocator::address(HELLO, 0), ty.id).is_ok());
}
