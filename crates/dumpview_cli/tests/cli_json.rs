#![allow(missing_docs)]

use std::process::{Command, Output};

use dumpview_testkit::fixture_path;
use serde_json::Value;

#[test]
fn info_json_lists_regions_and_frames() {
	let json = run_json(&["info", &fixture("local_variables.json"), "--json"]);

	assert_eq!(json["pointer_size"], 8);
	assert_eq!(json["regions"].as_array().map(Vec::len), Some(2));
	assert!(json["regions"][0]["base"].as_str().is_some_and(|item| item.starts_with("0x")));
	let frames: Vec<&str> = json["threads"][0]["frames"]
		.as_array()
		.expect("frames array")
		.iter()
		.filter_map(|frame| frame["name"].as_str())
		.collect();
	assert_eq!(frames, vec!["Inner", "Middle", "Outer", "Main"]);
}

#[test]
fn types_json_reports_field_storage() {
	let json = run_json(&["types", &fixture("local_variables_x86.json"), "--type", "Foo", "--json"]);

	let foo = &json[0];
	assert_eq!(foo["name"], "Foo");
	assert_eq!(foo["kind"], "reference");
	let next = foo["fields"].as_array().expect("fields").iter().find(|field| field["name"] == "next").expect("next field");
	assert_eq!(next["storage"], "reference");
	assert_eq!(next["size"], 4);
}

#[test]
fn local_json_renders_primitives_and_strings() {
	let fixture = fixture("local_variables.json");

	let b = run_json(&["local", &fixture, "--frame", "Inner", "--name", "b", "--json"]);
	assert_eq!(b["value"], true);
	assert_eq!(b["type"], "System.Boolean");

	let i = run_json(&["local", &fixture, "--frame", "Inner", "--name", "i", "--json"]);
	assert_eq!(i["value"], 0x4242_4242);

	let s = run_json(&["local", &fixture, "--frame", "Inner", "--name", "s", "--json"]);
	assert_eq!(s["value"], "hello world");
}

#[test]
fn local_json_follows_field_paths() {
	let fixture = fixture("local_variables_x86.json");
	let json = run_json(&["local", &fixture, "--frame", "Outer", "--name", "foo", "--path", "st.middle.inner", "--json"]);

	assert_eq!(json["type"], "Inner");
	assert_eq!(json["value"]["fields"]["b"], true);
	assert_eq!(json["value"]["fields"]["i"], 3);
}

#[test]
fn object_json_resolves_dynamic_type() {
	let fixture = fixture("local_variables.json");
	let json = run_json(&["object", &fixture, "0x2000100", "--json"]);

	assert_eq!(json["valid"], true);
	assert_eq!(json["type"], "Derived");
	assert_eq!(json["value"]["fields"]["value"], 1234);
	assert_eq!(json["value"]["fields"]["name"], "hello world");
}

#[test]
fn missing_local_reports_error_and_exit_code() {
	let output = run(&["local", &fixture("local_variables.json"), "--frame", "Inner", "--name", "nope"]);

	assert_eq!(output.status.code(), Some(1));
	let stderr = String::from_utf8_lossy(&output.stderr);
	assert!(stderr.contains("error: local nope not found in frame Inner"), "unexpected stderr: {stderr}");
}

#[test]
fn debug_logging_goes_to_stderr_and_keeps_json_clean() {
	let output = Command::new(env!("CARGO_BIN_EXE_dumpview"))
		.args(["object", &fixture("local_variables.json"), "0x2000100", "--json"])
		.env("RUST_LOG", "debug")
		.output()
		.expect("dumpview command executes");

	assert!(output.status.success());
	let stderr = String::from_utf8_lossy(&output.stderr);
	assert!(stderr.contains("snapshot opened"), "unexpected stderr: {stderr}");
	let json: Value = serde_json::from_slice(&output.stdout).expect("stdout should be valid json");
	assert_eq!(json["type"], "Derived");
}

fn fixture(name: &str) -> String {
	fixture_path(name).display().to_string()
}

fn run(args: &[&str]) -> Output {
	Command::new(env!("CARGO_BIN_EXE_dumpview")).args(args).output().expect("dumpview command executes")
}

fn run_json(args: &[&str]) -> Value {
	let output = run(args);
	assert!(
		output.status.success(),
		"dumpview command failed with status={}: {}",
		output.status,
		String::from_utf8_lossy(&output.stderr)
	);
	serde_json::from_slice(&output.stdout).expect("stdout should be valid json")
}
