//! Builds the output grid, tiles it, and computes per-tile input intersections and
//! per-reader work partitions (§4.3).

use crate::types::{BlockReadingSpec, BlockSpec, FilesForBlock, ImageInfo};
use anyhow::{Context, Result, ensure};
use std::collections::HashMap;

/// Everything the orchestrator needs to drive one run: the output grid geometry, the tile
/// list in row-major order, which files intersect which tile (merge order), and the reading
/// work pre-partitioned across `num_threads` readers by stride assignment.
#[derive(Debug, Clone)]
pub struct MosaicPlan {
	pub transform: [f64; 6],
	pub ncols: u32,
	pub nrows: u32,
	pub block_list: Vec<BlockSpec>,
	pub files_for_block: FilesForBlock,
	pub partitions: Vec<Vec<BlockReadingSpec>>,
}

/// Builds a [`MosaicPlan`] from the per-input catalog and the merge-order file list.
///
/// `file_order` defines merge order: later files in the list win over earlier ones wherever
/// they overlap and are non-null.
pub fn plan_mosaic(
	catalog: &HashMap<String, ImageInfo>,
	file_order: &[String],
	block_size: u32,
	num_threads: usize,
) -> Result<MosaicPlan> {
	ensure!(!file_order.is_empty(), "input file list must not be empty");
	ensure!(block_size > 0, "block_size must be > 0");

	let first = catalog
		.get(&file_order[0])
		.context("first input missing from catalog")?;
	let x_res = first.x_res();
	let y_res = first.y_res();
	ensure!(x_res > 0.0 && y_res > 0.0, "pixel size must be positive");

	let mut bbox = first.bbox()?;
	for name in &file_order[1..] {
		let info = catalog
			.get(name)
			.with_context(|| format!("missing catalog entry for '{name}'"))?;
		bbox = bbox.extended(&info.bbox()?);
	}

	let x_min = bbox.x_min;
	let y_max = bbox.y_max;
	let ncols = ((bbox.x_max - bbox.x_min) / x_res).round() as u32;
	let nrows = ((bbox.y_max - bbox.y_min) / y_res).round() as u32;
	ensure!(ncols > 0 && nrows > 0, "output grid must have positive area");

	let transform = [x_min, x_res, 0.0, y_max, 0.0, -y_res];
	let block_list = build_block_list(ncols, nrows, block_size);

	let mut files_for_block: FilesForBlock = HashMap::new();
	let mut reading_list: Vec<BlockReadingSpec> = Vec::new();

	for outblock in &block_list {
		for name in file_order {
			let info = catalog
				.get(name)
				.with_context(|| format!("missing catalog entry for '{name}'"))?;
			let inblock = project_block(outblock, &transform, &info.transform);
			if intersects(&inblock, info.ncols, info.nrows) {
				files_for_block.entry(*outblock).or_default().push(name.clone());
				reading_list.push(BlockReadingSpec {
					outblock: *outblock,
					filename: name.clone(),
					inblock,
				});
			}
		}
	}

	let partitions = partition_stride(reading_list, num_threads.max(1));

	Ok(MosaicPlan { transform, ncols, nrows, block_list, files_for_block, partitions })
}

/// Row-major tile list, tile size `block_size x block_size`, right/bottom tiles clipped to
/// the remainder.
fn build_block_list(ncols: u32, nrows: u32, block_size: u32) -> Vec<BlockSpec> {
	let mut list = Vec::new();
	let mut top = 0u32;
	while top < nrows {
		let ysize = block_size.min(nrows - top);
		let mut left = 0u32;
		while left < ncols {
			let xsize = block_size.min(ncols - left);
			list.push(BlockSpec::new(i64::from(top), i64::from(left), xsize, ysize));
			left += block_size;
		}
		top += block_size;
	}
	list
}

/// Projects an output-pixel rectangle into an input's pixel coordinate system via the
/// combined affine transforms. The result may have a negative `top`/`left` when the
/// rectangle extends past the input's origin.
fn project_block(outblock: &BlockSpec, out_t: &[f64; 6], in_t: &[f64; 6]) -> BlockSpec {
	let x_left = out_t[0] + outblock.left as f64 * out_t[1];
	let x_right = out_t[0] + outblock.right() as f64 * out_t[1];
	let y_top = out_t[3] + outblock.top as f64 * out_t[5];
	let y_bottom = out_t[3] + outblock.bottom() as f64 * out_t[5];

	let in_left = ((x_left - in_t[0]) / in_t[1]).round() as i64;
	let in_right = ((x_right - in_t[0]) / in_t[1]).round() as i64;
	let in_top = ((y_top - in_t[3]) / in_t[5]).round() as i64;
	let in_bottom = ((y_bottom - in_t[3]) / in_t[5]).round() as i64;

	BlockSpec::new(
		in_top,
		in_left,
		(in_right - in_left).max(0) as u32,
		(in_bottom - in_top).max(0) as u32,
	)
}

/// True iff `inblock` overlaps `[0, ncols] x [0, nrows]`, with a one-pixel inclusive
/// tolerance on the far edge (`right + 1 >= 0`). This tolerance isn't otherwise documented
/// upstream; it's preserved here for bit-compatibility rather than rationalized away (see
/// DESIGN.md open question (a)).
fn intersects(inblock: &BlockSpec, ncols: u32, nrows: u32) -> bool {
	inblock.right() + 1 >= 0
		&& inblock.left <= i64::from(ncols)
		&& inblock.bottom() + 1 >= 0
		&& inblock.top <= i64::from(nrows)
}

/// Partitions `specs` across `num_threads` readers by stride assignment: reader `k` gets
/// items at positions `k, k+N, 2N, ...`. Spreads each reader's footprint across the whole
/// output grid so the writer rarely starves waiting on one straggler reader.
fn partition_stride(specs: Vec<BlockReadingSpec>, num_threads: usize) -> Vec<Vec<BlockReadingSpec>> {
	let mut partitions: Vec<Vec<BlockReadingSpec>> = (0..num_threads).map(|_| Vec::new()).collect();
	for (i, spec) in specs.into_iter().enumerate() {
		partitions[i % num_threads].push(spec);
	}
	partitions
}
