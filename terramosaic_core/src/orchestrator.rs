//! Drives the per-band lifecycle, spawns/joins the reader pool, and finalizes output
//! metadata (§4.9).
//!
//! Bands are processed strictly sequentially — there is no cross-band parallelism by
//! design (§1 non-goals, §5): the output driver's per-band write API and the memory cost of
//! per-band buffering both favor it.

use crate::concurrency::{self, default_capacity};
use crate::driver::RasterDriver;
use crate::monitoring::Monitoring;
use crate::planner::{self, MosaicPlan};
use crate::reader_pool;
use crate::types::ImageInfo;
use crate::writer_loop::{self, ReaderHandles};
use anyhow::{Context, Result, ensure};
use std::collections::HashMap;
use std::sync::Arc;

/// The validated, run-scoped configuration the orchestrator needs. This is the library-level
/// counterpart of the CLI's `MosaicConfig` (the CLI layer is responsible for parsing flags
/// into this).
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
	pub input_files: Vec<String>,
	pub output_path: String,
	pub num_threads: usize,
	pub block_size: u32,
	pub driver: String,
	pub null_value_override: Option<f64>,
	pub creation_options: Vec<String>,
	pub do_pyramids: bool,
}

const PYRAMID_SCALES: [u32; 8] = [4, 8, 16, 32, 64, 128, 256, 512];

/// Runs a full mosaic: builds the catalog, plans the output grid, then processes every band
/// sequentially through the reader-pool/writer-loop pipeline, finally setting geotransform,
/// projection and (optionally) building overviews.
pub async fn run_mosaic(driver: Arc<dyn RasterDriver>, config: &OrchestratorConfig) -> Result<Monitoring> {
	ensure!(!config.input_files.is_empty(), "input file list must not be empty");
	ensure!(config.num_threads > 0, "num_threads must be > 0");
	ensure!(config.block_size > 0, "block_size must be > 0");

	let mut monitoring = Monitoring::new();
	monitoring.set_param("numThreads", config.num_threads);
	monitoring.set_param("blockSize", config.block_size);
	monitoring.set_param("cpuCount", num_cpus::get());
	monitoring.set_param("numInfiles", config.input_files.len());

	monitoring.start_phase("imginfodict");
	let catalog = build_catalog(driver.as_ref(), &config.input_files)?;
	monitoring.end_phase("imginfodict");

	monitoring.start_phase("analysis");
	let plan = planner::plan_mosaic(&catalog, &config.input_files, config.block_size, config.num_threads)?;
	monitoring.end_phase("analysis");

	let first = catalog.get(&config.input_files[0]).context("first input missing from catalog")?;
	let null_value = config.null_value_override.unwrap_or(first.null_value);
	let band_count = first.band_count;
	let pixel_type = first.pixel_type;
	let projection = first.projection.clone();

	driver.delete(&config.output_path).context("removing pre-existing output path")?;
	let mut output = driver
		.create(
			&config.output_path,
			&config.driver,
			plan.ncols,
			plan.nrows,
			band_count,
			pixel_type,
			&config.creation_options,
		)
		.context("creating output raster")?;

	monitoring.start_phase("domosaic");
	for band in 1..=band_count {
		log::debug!("starting band {band}/{band_count}, {} output tile(s)", plan.block_list.len());
		run_band(driver.clone(), &plan, output.as_mut(), band, null_value, &mut monitoring).await?;
	}
	monitoring.end_phase("domosaic");

	output.set_geo_transform(plan.transform)?;
	output.set_projection(&projection)?;

	if config.do_pyramids {
		monitoring.start_phase("pyramids");
		output.build_overviews(&PYRAMID_SCALES)?;
		monitoring.end_phase("pyramids");
	}

	Ok(monitoring)
}

/// Populates the image-info catalog by opening every input once (§4.2). Sequential by
/// design — see DESIGN.md open question (b): a parallel prefetch is a known possible
/// improvement, not implemented here.
fn build_catalog(driver: &dyn RasterDriver, input_files: &[String]) -> Result<HashMap<String, ImageInfo>> {
	let mut catalog = HashMap::with_capacity(input_files.len());
	for filename in input_files {
		let handle = driver
			.open_read(filename)
			.with_context(|| format!("opening '{filename}' to read its metadata"))?;
		let info = handle
			.image_info()
			.with_context(|| format!("reading metadata for '{filename}'"))?;
		catalog.insert(filename.clone(), info);
	}
	Ok(catalog)
}

async fn run_band(
	driver: Arc<dyn RasterDriver>,
	plan: &MosaicPlan,
	output: &mut dyn crate::driver::RasterHandle,
	band: u32,
	null_value: f64,
	monitoring: &mut Monitoring,
) -> Result<()> {
	let (tx, rx) = concurrency::bounded(default_capacity(plan.partitions.len()));
	let handles = reader_pool::spawn_readers(driver, plan.partitions.clone(), band, null_value, tx);
	let mut readers = ReaderHandles::new(handles);

	writer_loop::run(
		output,
		band,
		null_value,
		&plan.block_list,
		&plan.files_for_block,
		rx,
		&mut readers,
		monitoring,
	)
	.await
	.context("writer loop failed")?;

	readers.join_all().await.context("joining reader tasks")?;
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::{MockDriver, f32_data};
	use pretty_assertions::assert_eq;

	#[tokio::test]
	async fn single_input_passthrough() {
		let driver = Arc::new(MockDriver::new());
		driver.insert_flat_input("a.tif", 100, 100, 1.0, 0.0);

		let config = OrchestratorConfig {
			input_files: vec!["a.tif".to_string()],
			output_path: "out.tif".to_string(),
			num_threads: 2,
			block_size: 64,
			driver: "GTiff".to_string(),
			null_value_override: None,
			creation_options: vec![],
			do_pyramids: false,
		};

		run_mosaic(driver.clone(), &config).await.unwrap();
		let out = driver.get_raster("out.tif").unwrap();
		assert!(f32_data(&out.bands[0]).iter().all(|&v| v == 1.0));
	}

	#[tokio::test]
	async fn thread_count_does_not_change_output() {
		let make_driver = || {
			let driver = Arc::new(MockDriver::new());
			driver.insert_flat_input("a.tif", 20, 10, 1.0, 0.0);
			driver.insert_flat_input("b.tif", 20, 10, 2.0, 0.0);
			driver
		};

		let mut last: Option<Vec<f32>> = None;
		for num_threads in [1, 2, 4, 8] {
			let driver = make_driver();
			let config = OrchestratorConfig {
				input_files: vec!["a.tif".to_string(), "b.tif".to_string()],
				output_path: "out.tif".to_string(),
				num_threads,
				block_size: 8,
				driver: "GTiff".to_string(),
				null_value_override: Some(0.0),
				creation_options: vec![],
				do_pyramids: false,
			};
			run_mosaic(driver.clone(), &config).await.unwrap();
			let out = driver.get_raster("out.tif").unwrap();
			let data = f32_data(&out.bands[0]).to_vec();
			if let Some(prev) = &last {
				assert_eq!(prev, &data, "output differs for num_threads={num_threads}");
			}
			last = Some(data);
		}
	}

	#[tokio::test]
	async fn overlapping_inputs_last_one_wins_end_to_end() {
		let driver = Arc::new(MockDriver::new());
		driver.insert_raster_at("a.tif", 0.0, 10.0, 10, 10, 1.0, 0.0);
		driver.insert_raster_at("b.tif", 0.0, 10.0, 10, 10, 2.0, 0.0);

		let config = OrchestratorConfig {
			input_files: vec!["a.tif".to_string(), "b.tif".to_string()],
			output_path: "out.tif".to_string(),
			num_threads: 1,
			block_size: 5,
			driver: "GTiff".to_string(),
			null_value_override: Some(0.0),
			creation_options: vec![],
			do_pyramids: false,
		};

		run_mosaic(driver.clone(), &config).await.unwrap();
		let out = driver.get_raster("out.tif").unwrap();
		assert!(
			f32_data(&out.bands[0]).iter().all(|&v| v == 2.0),
			"every fully-overlapped tile must carry the value of the last listed input"
		);
	}

	#[tokio::test]
	async fn reader_fault_aborts_the_run_before_further_writes() {
		let driver = Arc::new(MockDriver::new());
		driver.insert_flat_input("a.tif", 20, 10, 1.0, 0.0);
		driver.fail_nth_read("a.tif", 2);

		let config = OrchestratorConfig {
			input_files: vec!["a.tif".to_string()],
			output_path: "out.tif".to_string(),
			num_threads: 1,
			block_size: 5,
			driver: "GTiff".to_string(),
			null_value_override: Some(0.0),
			creation_options: vec![],
			do_pyramids: false,
		};

		let result = run_mosaic(driver.clone(), &config).await;
		assert!(result.is_err(), "a reader fault must fail the whole run, not be swallowed");
	}
}
