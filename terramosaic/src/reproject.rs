//! Reprojection collaborator stub (§4.12).
//!
//! Real warping is out of scope; this module exists so the CLI's output-projection flags
//! have somewhere to go, and so a complete tool shape is preserved even though the warping
//! math itself is a non-goal.

use anyhow::{Result, bail};

use crate::tools::mosaic::Subcommand;

/// Output of the reprojection step: the (possibly unchanged) input file list to mosaic, and
/// an optional temporary directory the orchestrator should remove once the run completes.
pub struct ReprojectedInputs {
	pub input_files: Vec<String>,
	pub temp_dir: Option<std::path::PathBuf>,
}

/// If no output-projection flags are set, passes `input_files` through unchanged. If any are
/// set, returns a clear "not supported" error instead of silently ignoring the request.
pub fn handle_projections(args: &Subcommand, input_files: Vec<String>) -> Result<ReprojectedInputs> {
	let requested = args.out_proj_epsg.is_some()
		|| args.out_proj_wkt_file.is_some()
		|| args.xres.is_some()
		|| args.yres.is_some()
		|| args.resample.is_some();

	if requested {
		bail!(
			"reprojection of misaligned inputs is not implemented; pre-align inputs to a common \
			 grid before mosaicing, or omit --out-proj-epsg/--out-proj-wkt-file/--xres/--yres/--resample"
		);
	}

	Ok(ReprojectedInputs { input_files, temp_dir: None })
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::path::PathBuf;

	fn bare_args() -> Subcommand {
		Subcommand {
			input_list: PathBuf::from("inputs.txt"),
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
	fn passes_through_when_no_projection_flags_set() {
		let args = bare_args();
		let result = handle_projections(&args, vec!["a.tif".to_string()]).unwrap();
		assert_eq!(result.input_files, vec!["a.tif".to_string()]);
		assert!(result.temp_dir.is_none());
	}

	#[test]
	fn rejects_projection_flags_with_clear_error() {
		let mut args = bare_args();
		args.out_proj_epsg = Some(3857);
		let error = handle_projections(&args, vec!["a.tif".to_string()]).unwrap_err();
		assert!(error.to_string().contains("not implemented"));
	}
}
