use dumpview_testkit::ImageBuilder;

use crate::image::{Local, MemoryImage, ObjectTable, PrimitiveKind, STRING_TYPE_NAME, Snapshot, StackFrame, Thread, TypeKind, TypeTableBuilder, ValueLocator};

pub(crate) const STRING_HANDLE: u64 = 0x7f00_0010;
pub(crate) const FOO_HANDLE: u64 = 0x7f00_0100;
pub(crate) const DERIVED_HANDLE: u64 = 0x7f00_0200;

pub(crate) const LOCAL_B: u64 = 0x1000;
pub(crate) const LOCAL_I: u64 = 0x1004;
pub(crate) const LOCAL_S: u64 = 0x1008;
pub(crate) const LOCAL_ST: u64 = 0x1010;
pub(crate) const LOCAL_FOO: u64 = 0x1028;
pub(crate) const LOCAL_NIL: u64 = 0x1030;
pub(crate) const LOCAL_NONE: u64 = 0x1038;

pub(crate) const FOO: u64 = 0x1_0000;
pub(crate) const HELLO: u64 = 0x1_0100;
pub(crate) const FOO_TEXT: u64 = 0x1_0180;
pub(crate) const DERIVED: u64 = 0x1_0200;
pub(crate) const UNKNOWN: u64 = 0x1_0300;

/// 64-bit snapshot with one thread.
///
/// Layouts: `Inner { b: bool @0, i: i32 @4 }` (8 bytes),
/// `Middle { value: i32 @0, inner: Inner @8 }` (16 bytes),
/// `Struct { number: i64 @0, middle: Middle @8 }` (24 bytes),
/// `Foo { i: i32 @8, b: bool @12, s: string @16, st: Struct @24, next: object @48 }` (56 bytes),
/// `Derived { value: i32 @8, name: string @16 }` (24 bytes).
pub(crate) fn sample_snapshot() -> Snapshot {
	let mut builder = TypeTableBuilder::new(8).expect("builder");
	let string = builder.id_of(STRING_TYPE_NAME).expect("string type");
	builder.set_type_handle(string, STRING_HANDLE).expect("string handle");
	let object = builder.id_of("object").expect("object type");
	let boolean = builder.primitive(PrimitiveKind::Bool);
	let int32 = builder.primitive(PrimitiveKind::I32);
	let int64 = builder.primitive(PrimitiveKind::I64);

	let inner = builder.declare("Inner", TypeKind::Value, 8).expect("Inner");
	let middle = builder.declare("Middle", TypeKind::Value, 16).expect("Middle");
	let structure = builder.declare("Struct", TypeKind::Value, 24).expect("Struct");
	let foo = builder.declare("Foo", TypeKind::Reference, 56).expect("Foo");
	let derived = builder.declare("Derived", TypeKind::Reference, 24).expect("Derived");
	builder.set_type_handle(foo, FOO_HANDLE).expect("Foo handle");
	builder.set_type_handle(derived, DERIVED_HANDLE).expect("Derived handle");

	builder.add_field(inner, "b", boolean, 0).expect("Inner.b");
	builder.add_field(inner, "i", int32, 4).expect("Inner.i");
	builder.add_field(middle, "value", int32, 0).expect("Middle.value");
	builder.add_field(middle, "inner", inner, 8).expect("Middle.inner");
	builder.add_field(structure, "number", int64, 0).expect("Struct.number");
	builder.add_field(structure, "middle", middle, 8).expect("Struct.middle");
	builder.add_field(foo, "i", int32, 8).expect("Foo.i");
	builder.add_field(foo, "b", boolean, 12).expect("Foo.b");
	builder.add_field(foo, "s", string, 16).expect("Foo.s");
	builder.add_field(foo, "st", structure, 24).expect("Foo.st");
	builder.add_field(foo, "next", object, 48).expect("Foo.next");
	builder.add_field(derived, "value", int32, 8).expect("Derived.value");
	builder.add_field(derived, "name", string, 16).expect("Derived.name");
	let types = builder.build().expect("table");

	let regions = ImageBuilder::new(8)
		.region(0x1000, 0x100)
		.bool(LOCAL_B, true)
		.u32(LOCAL_I, 0x4242_4242)
		.ptr(LOCAL_S, HELLO)
		.u64(LOCAL_ST, 7)
		.u32(LOCAL_ST + 8, (-5_i32) as u32)
		.bool(LOCAL_ST + 16, true)
		.u32(LOCAL_ST + 20, 99)
		.ptr(LOCAL_FOO, FOO)
		.ptr(LOCAL_NIL, 0)
		.ptr(LOCAL_NONE, UNKNOWN)
		.region(0x1_0000, 0x400)
		.ptr(FOO, FOO_HANDLE)
		.u32(FOO + 8, 17)
		.bool(FOO + 12, true)
		.ptr(FOO + 16, FOO_TEXT)
		.u64(FOO + 24, 1)
		.u32(FOO + 32, 2)
		.bool(FOO + 40, true)
		.u32(FOO + 44, 3)
		.ptr(FOO + 48, DERIVED)
		.string_object(HELLO, STRING_HANDLE, "hello world")
		.string_object(FOO_TEXT, STRING_HANDLE, "foo")
		.ptr(DERIVED, DERIVED_HANDLE)
		.u32(DERIVED + 8, 1234)
		.ptr(DERIVED + 16, HELLO)
		.ptr(UNKNOWN, 0xbad0_bad0)
		.build();
	let memory = MemoryImage::from_regions(8, regions).expect("image");

	let local = |name: &str, type_name: &str, locator: ValueLocator| Local {
		name: name.into(),
		type_id: types.by_name(type_name).expect("local type").id,
		locator,
	};
	let inner_frame = StackFrame::new(
		"Inner",
		vec![
			local("b", "bool", ValueLocator::address(LOCAL_B, 0)),
			local("i", "i32", ValueLocator::address(LOCAL_I, 0)),
			local("s", "string", ValueLocator::address(LOCAL_S, 0)),
		],
	);
	let main_frame = StackFrame::new(
		"Main",
		vec![
			local("st", "Struct", ValueLocator::address(LOCAL_ST, 0)),
			local("foo", "Foo", ValueLocator::address(LOCAL_FOO, 0)),
			local("nil", "string", ValueLocator::address(LOCAL_NIL, 0)),
			local("lost", "object", ValueLocator::address(LOCAL_NONE, 0)),
			local("reg", "Inner", ValueLocator::inline(vec![1, 0, 0, 0, 42, 0, 0, 0])),
		],
	);
	let threads = vec![Thread::new(1, vec![inner_frame, main_frame])];

	Snapshot::from_parts(memory, types, ObjectTable::new(), threads).expect("snapshot")
}
