//! End-to-end CLI tests that exercise the `terramosaic` binary itself, as opposed to the
//! unit tests embedded in each module. Mirrors the teacher's `tests/convert.rs` shape:
//! drive the binary with `assert_cmd`, assert on exit status and stderr/stdout content.

use assert_cmd::Command;
use predicates::prelude::*;

fn terramosaic() -> Command {
	Command::cargo_bin("terramosaic").expect("binary built by cargo test harness")
}

#[test]
fn e2e_no_subcommand_prints_usage_and_fails() {
	terramosaic()
		.assert()
		.failure()
		.stderr(predicate::str::contains("Usage: terramosaic"));
}

#[test]
fn e2e_mosaic_requires_input_and_output() {
	terramosaic()
		.arg("mosaic")
		.assert()
		.failure()
		.stderr(predicate::str::contains("Usage: terramosaic mosaic"));
}

#[test]
fn e2e_mosaic_rejects_empty_input_list() {
	let dir = assert_fs::TempDir::new().unwrap();
	let list_path = dir.path().join("inputs.txt");
	std::fs::write(&list_path, "\n\n").unwrap();
	let output_path = dir.path().join("out.tif");

	terramosaic()
		.arg("mosaic")
		.arg(&list_path)
		.arg(&output_path)
		.assert()
		.failure()
		.stderr(predicate::str::contains("is empty"));
}

#[test]
fn e2e_mosaic_rejects_zero_num_threads() {
	let dir = assert_fs::TempDir::new().unwrap();
	let list_path = dir.path().join("inputs.txt");
	std::fs::write(&list_path, "a.tif\n").unwrap();
	let output_path = dir.path().join("out.tif");

	terramosaic()
		.arg("mosaic")
		.arg(&list_path)
		.arg(&output_path)
		.arg("--num-threads")
		.arg("0")
		.assert()
		.failure()
		.stderr(predicate::str::contains("--num-threads"));
}

#[test]
fn e2e_mosaic_surfaces_missing_input_file_as_error() {
	let dir = assert_fs::TempDir::new().unwrap();
	let list_path = dir.path().join("inputs.txt");
	std::fs::write(&list_path, "does-not-exist.tif\n").unwrap();
	let output_path = dir.path().join("out.tif");

	terramosaic()
		.arg("mosaic")
		.arg(&list_path)
		.arg(&output_path)
		.assert()
		.failure();
}

#[test]
fn e2e_mosaic_rejects_reprojection_flags() {
	let dir = assert_fs::TempDir::new().unwrap();
	let list_path = dir.path().join("inputs.txt");
	std::fs::write(&list_path, "a.tif\n").unwrap();
	let output_path = dir.path().join("out.tif");

	terramosaic()
		.arg("mosaic")
		.arg(&list_path)
		.arg(&output_path)
		.arg("--out-proj-epsg")
		.arg("4326")
		.assert()
		.failure()
		.stderr(predicate::str::contains("not implemented"));
}
