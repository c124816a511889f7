use std::path::PathBuf;

use dumpview::image::{ImageError, Result, Snapshot};

use crate::cmd::render::{PrintOptions, Renderer};
use crate::cmd::util::{emit_json, ptr_hex};

#[derive(clap::Args)]
pub struct Args {
	pub path: PathBuf,
	#[arg(long)]
	pub frame: String,
	#[arg(long)]
	pub name: String,
	#[arg(long)]
	pub thread: Option<u32>,
	#[arg(long = "path")]
	pub field_path: Option<String>,
	#[arg(long, default_value_t = PrintOptions::default().max_depth)]
	pub depth: u32,
	#[arg(long)]
	pub json: bool,
}

/// Render a local variable, optionally narrowed by a field path.
pub fn run(args: Args) -> Result<()> {
	let Args {
		path,
		frame,
		name,
		thread,
		field_path,
		depth,
		json,
	} = args;

	let snapshot = Snapshot::open(&path)?;
	let thread = match thread {
		Some(id) => id,
		None => snapshot.main_thread().map(|item| item.id).ok_or_else(|| ImageError::InvalidManifest {
			reason: "snapshot has no threads".to_owned(),
		})?,
	};

	tracing::debug!(path = %path.display(), thread, frame = %frame, local = %name, "snapshot opened");
	let local = snapshot.local(thread, &frame, &name)?;
	let value = match &field_path {
		Some(expr) => local.get_path(expr)?,
		None => local,
	};
	let options = PrintOptions {
		max_depth: depth,
		..PrintOptions::default()
	};
	let rendered = Renderer::new(options).value(&value, 0);

	if json {
		let payload = LocalJson {
			thread,
			frame,
			local: name,
			path: field_path,
			type_name: value.ty().name.to_string(),
			address: value.address().map(ptr_hex),
			value: rendered.to_json(),
		};
		return emit_json(&payload);
	}

	let label = match &field_path {
		Some(expr) => format!("{name}.{expr}"),
		None => name,
	};
	print!("{label}: {} = {}", value.ty().name, rendered.to_text());
	Ok(())
}

#[derive(serde::Serialize)]
struct LocalJson {
	thread: u32,
	frame: String,
	local: String,
	path: Option<String>,
	#[serde(rename = "type")]
	type_name: String,
	address: Option<String>,
	value: serde_json::Value,
}
