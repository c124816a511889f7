use std::path::PathBuf;

use dumpview::image::{Result, Snapshot};

use crate::cmd::util::{emit_json, ptr_hex};

#[derive(clap::Args)]
pub struct Args {
	pub path: PathBuf,
	#[arg(long)]
	pub json: bool,
}

/// Print image, type table, and thread statistics.
pub fn run(args: Args) -> Result<()> {
	let Args { path, json } = args;
	let snapshot = Snapshot::open(&path)?;
	let memory = snapshot.memory();

	let regions: Vec<RegionJson> = memory
		.regions()
		.iter()
		.map(|region| RegionJson {
			base: ptr_hex(region.base()),
			len: region.len(),
			mapped: region.is_mapped(),
		})
		.collect();
	let threads: Vec<ThreadJson> = snapshot
		.threads()
		.iter()
		.map(|thread| ThreadJson {
			id: thread.id,
			frames: thread
				.frames()
				.iter()
				.map(|frame| FrameJson {
					name: frame.name.to_string(),
					locals: frame.locals().iter().map(|local| local.name.to_string()).collect(),
				})
				.collect(),
		})
		.collect();

	if json {
		let payload = InfoJson {
			path: path.display().to_string(),
			pointer_size: snapshot.types().pointer_size(),
			total_bytes: memory.total_bytes(),
			regions,
			type_count: snapshot.types().len(),
			object_count: snapshot.objects().len(),
			threads,
		};
		return emit_json(&payload);
	}

	println!("path: {}", path.display());
	println!("pointer_size: {}", snapshot.types().pointer_size());
	println!("total_bytes: {}", memory.total_bytes());
	println!("regions:");
	for region in &regions {
		println!("  {} len={} mapped={}", region.base, region.len, region.mapped);
	}
	println!("type_count: {}", snapshot.types().len());
	println!("object_count: {}", snapshot.objects().len());
	println!("threads:");
	for thread in &threads {
		println!("  {}:", thread.id);
		for frame in &thread.frames {
			println!("    {} [{}]", frame.name, frame.locals.join(", "));
		}
	}

	Ok(())
}

#[derive(serde::Serialize)]
struct RegionJson {
	base: String,
	len: usize,
	mapped: bool,
}

#[derive(serde::Serialize)]
struct FrameJson {
	name: String,
	locals: Vec<String>,
}

#[derive(serde::Serialize)]
struct ThreadJson {
	id: u32,
	frames: Vec<FrameJson>,
}

#[derive(serde::Serialize)]
struct InfoJson {
	path: String,
	pointer_size: usize,
	total_bytes: usize,
	regions: Vec<RegionJson>,
	type_count: usize,
	object_count: usize,
	threads: Vec<ThreadJson>,
}
