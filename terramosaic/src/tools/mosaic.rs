//! The `mosaic` subcommand: parse arguments, build a config, run the orchestrator, write a
//! monitoring report (§4.10).

use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use terramosaic_raster::GdalDriver;

use crate::config::MosaicConfig;
use crate::report;
use crate::reproject;

#[derive(clap::Args, Debug)]
#[command(arg_required_else_help = true, disable_version_flag = true)]
pub struct Subcommand {
	/// text file listing one input raster path per line; order defines merge order
	#[arg(value_name = "INPUT_LIST")]
	pub input_list: PathBuf,

	/// path of the mosaic to create
	#[arg(value_name = "OUTPUT")]
	pub output: PathBuf,

	/// number of parallel reader threads
	#[arg(long, value_name = "int", default_value_t = 4, display_order = 1)]
	pub num_threads: usize,

	/// output tile side, in pixels
	#[arg(long, value_name = "int", default_value_t = 1024, display_order = 1)]
	pub block_size: u32,

	/// output raster driver
	#[arg(long, value_name = "NAME", default_value = "GTiff", display_order = 1)]
	pub driver: String,

	/// override the null/no-data value (defaults to the first input's)
	#[arg(long, value_name = "float", display_order = 2)]
	pub null_value: Option<f64>,

	/// build overview pyramids after mosaicing
	#[arg(long, display_order = 2)]
	pub pyramids: bool,

	/// creation option passed to the output driver, e.g. COMPRESS=LZW (repeatable; fully
	/// replaces the driver's defaults when present)
	#[arg(long = "creation-option", value_name = "KEY=VALUE", display_order = 2)]
	pub creation_option: Vec<String>,

	/// write a JSON monitoring report to this path
	#[arg(long, value_name = "PATH", display_order = 3)]
	pub report: Option<PathBuf>,

	/// reproject inputs to this EPSG code before mosaicing (not implemented)
	#[arg(long, value_name = "EPSG", display_order = 4)]
	pub out_proj_epsg: Option<u32>,

	/// reproject inputs to the projection in this WKT file before mosaicing (not implemented)
	#[arg(long, value_name = "PATH", display_order = 4)]
	pub out_proj_wkt_file: Option<PathBuf>,

	/// output pixel size in the x direction after reprojection (not implemented)
	#[arg(long, value_name = "float", display_order = 4)]
	pub xres: Option<f64>,

	/// output pixel size in the y direction after reprojection (not implemented)
	#[arg(long, value_name = "float", display_order = 4)]
	pub yres: Option<f64>,

	/// resampling algorithm used during reprojection (not implemented)
	#[arg(long, value_name = "NAME", display_order = 4)]
	pub resample: Option<String>,
}

pub fn run(args: &Subcommand) -> Result<()> {
	let rt = tokio::runtime::Runtime::new()?;
	rt.block_on(run_async(args))
}

async fn run_async(args: &Subcommand) -> Result<()> {
	let mut config = MosaicConfig::from_args(args)?;

	let reprojected = reproject::handle_projections(args, std::mem::take(&mut config.input_files))?;
	config.input_files = reprojected.input_files;

	log::info!(
		"mosaicing {} inputs into '{}'",
		config.input_files.len(),
		config.output_path
	);

	let report_path = config.report_path.clone();
	let driver = Arc::new(GdalDriver::new());
	let monitoring = terramosaic_core::run_mosaic(driver, &config.into_orchestrator_config()).await?;

	if let Some(temp_dir) = reprojected.temp_dir {
		let _ = std::fs::remove_dir_all(temp_dir);
	}

	if let Some(path) = report_path {
		std::fs::write(&path, report::stringify(&monitoring))?;
		log::info!("wrote monitoring report to '{}'", path.display());
	}

	log::info!("finished mosaicing");
	Ok(())
}
