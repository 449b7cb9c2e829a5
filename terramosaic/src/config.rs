//! Validated, run-scoped mosaic configuration assembled from CLI arguments (§4.11).
//!
//! Mirrors the teacher's pattern of a dedicated config type built once from `clap::Args`
//! rather than threading the raw `Subcommand` struct deep into library code.

use anyhow::{Context, Result, ensure};
use std::fs;
use std::path::{Path, PathBuf};
use terramosaic_core::OrchestratorConfig;

use crate::tools::mosaic::Subcommand;

/// The fully validated configuration for one mosaic run.
#[derive(Debug, Clone)]
pub struct MosaicConfig {
	pub input_files: Vec<String>,
	pub output_path: String,
	pub num_threads: usize,
	pub block_size: u32,
	pub driver: String,
	pub null_value_override: Option<f64>,
	pub do_pyramids: bool,
	pub creation_options: Vec<String>,
	pub report_path: Option<PathBuf>,
}

impl MosaicConfig {
	/// Builds and validates a [`MosaicConfig`] from parsed CLI arguments.
	///
	/// Reads the input file list from disk (one path per line, blank-trimmed, no comments)
	/// but does not open any of the rasters it names — that happens later, at catalog build
	/// time, which is where the first real I/O belongs.
	pub fn from_args(args: &Subcommand) -> Result<Self> {
		ensure!(args.num_threads > 0, "--num-threads must be greater than zero");
		ensure!(args.block_size > 0, "--block-size must be greater than zero");

		let input_files = read_input_list(&args.input_list)
			.with_context(|| format!("reading input file list '{}'", args.input_list.display()))?;
		ensure!(!input_files.is_empty(), "input file list '{}' is empty", args.input_list.display());

		Ok(MosaicConfig {
			input_files,
			output_path: args.output.to_string_lossy().into_owned(),
			num_threads: args.num_threads,
			block_size: args.block_size,
			driver: args.driver.clone(),
			null_value_override: args.null_value,
			do_pyramids: args.pyramids,
			creation_options: args.creation_option.clone(),
			report_path: args.report.clone(),
		})
	}

	/// Converts into the library-level [`OrchestratorConfig`] the core engine consumes.
	#[must_use]
	pub fn into_orchestrator_config(self) -> OrchestratorConfig {
		OrchestratorConfig {
			input_files: self.input_files,
			output_path: self.output_path,
			num_threads: self.num_threads,
			block_size: self.block_size,
			driver: self.driver,
			null_value_override: self.null_value_override,
			creation_options: self.creation_options,
			do_pyramids: self.do_pyramids,
		}
	}
}

fn read_input_list(path: &Path) -> Result<Vec<String>> {
	let content = fs::read_to_string(path)?;
	Ok(content
		.lines()
		.map(str::trim)
		.filter(|line| !line.is_empty())
		.map(str::to_string)
		.collect())
}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;
	use std::io::Write;

	fn args_with_list(list_path: PathBuf) -> Subcommand {
		Subcommand {
			input_list: list_path,
			output: PathBuf::from("out.tif"),
			num_threads: 4,
			block_size: 1024,
			driver: "GTiff".to_string(),
			null_value: None,
			pyramids: false,
			creation_option: vec![],
			report: None,
			out_proj_epsg: None,
			out_proj_wkt_file: None,
			xres: None,
			yres: None,
			resample: None,
		}
	}

	#[test]
	fn rejects_empty_input_list() {
		let dir = tempfile::tempdir().unwrap();
		let list_path = dir.path().join("empty.txt");
		fs::write(&list_path, "\n\n").unwrap();
		let args = args_with_list(list_path);
		assert!(MosaicConfig::from_args(&args).is_err());
	}

	#[test]
	fn trims_blank_lines_and_whitespace() {
		let dir = tempfile::tempdir().unwrap();
		let list_path = dir.path().join("inputs.txt");
		let mut file = fs::File::create(&list_path).unwrap();
		writeln!(file, "  a.tif  ").unwrap();
		writeln!(file).unwrap();
		writeln!(file, "b.tif").unwrap();
		let args = args_with_list(list_path);
		let config = MosaicConfig::from_args(&args).unwrap();
		assert_eq!(config.input_files, vec!["a.tif".to_string(), "b.tif".to_string()]);
	}

	#[test]
	fn rejects_zero_num_threads() {
		let dir = tempfile::tempdir().unwrap();
		let list_path = dir.path().join("inputs.txt");
		fs::write(&list_path, "a.tif\n").unwrap();
		let mut args = args_with_list(list_path);
		args.num_threads = 0;
		assert!(MosaicConfig::from_args(&args).is_err());
	}
}
