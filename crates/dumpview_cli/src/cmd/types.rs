use std::path::PathBuf;

use dumpview::image::{Result, Snapshot, TypeDescriptor, TypeTable};

use crate::cmd::util::{emit_json, ptr_hex};

#[derive(clap::Args)]
pub struct Args {
	pub path: PathBuf,
	#[arg(long = "type")]
	pub type_name: Option<String>,
	#[arg(long)]
	pub json: bool,
}

/// Print type layouts, or one type's field table.
pub fn run(args: Args) -> Result<()> {
	let Args { path, type_name, json } = args;
	let snapshot = Snapshot::open(&path)?;
	let types = snapshot.types();

	let selected: Vec<&TypeDescriptor> = match &type_name {
		Some(name) => vec![types.by_name(name)?],
		None => types.iter().collect(),
	};
	let rows: Vec<TypeJson> = selected.into_iter().map(|ty| type_row(types, ty)).collect::<Result<_>>()?;

	if json {
		return emit_json(&rows);
	}

	for row in &rows {
		let handle = row.type_handle.as_deref().unwrap_or("-");
		println!("{} kind={} size={} handle={}", row.name, row.kind, row.size, handle);
		for field in &row.fields {
			println!("  +{:<4} {:<24} {} ({})", field.offset, field.name, field.type_name, field.storage);
		}
	}

	Ok(())
}

fn type_row(types: &TypeTable, ty: &TypeDescriptor) -> Result<TypeJson> {
	let mut fields = Vec::with_capacity(ty.fields().len());
	for field in ty.fields() {
		let field_ty = types.get(field.type_id)?;
		fields.push(FieldJson {
			name: field.name.to_string(),
			offset: field.offset,
			type_name: field_ty.name.to_string(),
			storage: if field.is_value_type { "inline" } else { "reference" },
			size: types.slot_size(field_ty),
		});
	}

	Ok(TypeJson {
		name: ty.name.to_string(),
		kind: ty.kind.as_str(),
		size: ty.size,
		type_handle: ty.type_handle.map(ptr_hex),
		fields,
	})
}

#[derive(serde::Serialize)]
struct FieldJson {
	name: String,
	offset: usize,
	#[serde(rename = "type")]
	type_name: String,
	storage: &'static str,
	size: usize,
}

#[derive(serde::Serialize)]
struct TypeJson {
	name: String,
	kind: &'static str,
	size: usize,
	type_handle: Option<String>,
	fields: Vec<FieldJson>,
}
