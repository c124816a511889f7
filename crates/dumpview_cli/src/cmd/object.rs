use std::path::PathBuf;

use dumpview::image::{Result, Snapshot, parse_address};

use crate::cmd::render::{PrintOptions, Rendered, Renderer};
use crate::cmd::util::{emit_json, ptr_hex};

#[derive(clap::Args)]
pub struct Args {
	pub path: PathBuf,
	pub address: String,
	#[arg(long = "path")]
	pub field_path: Option<String>,
	#[arg(long, default_value_t = PrintOptions::default().max_depth)]
	pub depth: u32,
	#[arg(long)]
	pub json: bool,
}

/// Render the heap object at an address with its resolved type.
pub fn run(args: Args) -> Result<()> {
	let Args {
		path,
		address,
		field_path,
		depth,
		json,
	} = args;

	let snapshot = Snapshot::open(&path)?;
	let address = parse_address(&address)?;
	let handle = snapshot.object(address)?;
	tracing::debug!(path = %path.display(), address, ty = ?handle.type_name(), "snapshot opened");
	let options = PrintOptions {
		max_depth: depth,
		..PrintOptions::default()
	};

	let (type_name, rendered): (Option<String>, Rendered) = match &field_path {
		Some(expr) => {
			let value = handle.get_path(expr)?;
			(Some(value.ty().name.to_string()), Renderer::new(options).value(&value, 0))
		}
		None => (handle.type_name().map(str::to_owned), Renderer::new(options).object(&handle, 0)),
	};

	if json {
		let payload = ObjectJson {
			address: ptr_hex(address),
			valid: handle.is_valid(),
			path: field_path,
			type_name,
			value: rendered.to_json(),
		};
		return emit_json(&payload);
	}

	println!("object: {} type={}", ptr_hex(address), type_name.as_deref().unwrap_or("<unresolved>"));
	if let Some(expr) = &field_path {
		print!("{expr} = ");
	}
	print!("{}", rendered.to_text());
	Ok(())
}

#[derive(serde::Serialize)]
struct ObjectJson {
	address: String,
	valid: bool,
	path: Option<String>,
	#[serde(rename = "type")]
	type_name: Option<String>,
	value: serde_json::Value,
}
