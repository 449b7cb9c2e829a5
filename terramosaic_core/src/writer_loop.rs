//! Strict-order assembler: merges inputs for each output tile, writes, evicts (§4.8).
//!
//! One writer runs per band. It polls the block queue non-blockingly rather than doing a
//! blocking receive, because the next queue item is not necessarily for the next tile in
//! row-major order — a blocking dequeue would deadlock whenever the next tile's inputs
//! haven't arrived yet while some *other* tile's input sits in the queue.

use crate::concurrency::BlockQueueReceiver;
use crate::driver::RasterHandle;
use crate::monitoring::Monitoring;
use crate::pixel::PixelArray;
use crate::types::{BlockCache, BlockSpec, FilesForBlock};
use anyhow::{Result, anyhow, bail};
use tokio::sync::mpsc::error::TryRecvError;
use tokio::task::JoinHandle;

/// Wraps the reader join handles spawned for one band so the writer can check for faults
/// without blocking, and so the orchestrator can join whatever's left once the writer
/// finishes.
pub struct ReaderHandles(pub Vec<Option<JoinHandle<Result<()>>>>);

impl ReaderHandles {
	#[must_use]
	pub fn new(handles: Vec<JoinHandle<Result<()>>>) -> Self {
		Self(handles.into_iter().map(Some).collect())
	}

	/// Re-raises the first fault observed from any reader that has already finished.
	/// Fail-fast: called once per writer iteration (§4.8 step 3).
	pub async fn check_faults(&mut self) -> Result<()> {
		for slot in &mut self.0 {
			let finished = slot.as_ref().is_some_and(JoinHandle::is_finished);
			if !finished {
				continue;
			}
			let handle = slot.take().expect("checked is_some above");
			match handle.await {
				Ok(Ok(())) => {}
				Ok(Err(error)) => {
					log::error!("reader fault, aborting run: {error}");
					return Err(error);
				}
				Err(join_error) => return Err(anyhow!("reader task panicked: {join_error}")),
			}
		}
		Ok(())
	}

	/// Awaits every remaining reader. Called after the writer has emitted every tile.
	pub async fn join_all(&mut self) -> Result<()> {
		for slot in &mut self.0 {
			if let Some(handle) = slot.take() {
				match handle.await {
					Ok(Ok(())) => {}
					Ok(Err(error)) => return Err(error),
					Err(join_error) => return Err(anyhow!("reader task panicked: {join_error}")),
				}
			}
		}
		Ok(())
	}
}

/// Runs the writer loop to completion for one band: drains the queue, merges and writes each
/// output tile in row-major order, and fails fast on the first reader fault.
pub async fn run(
	output: &mut dyn RasterHandle,
	band: u32,
	null_value: f64,
	block_list: &[BlockSpec],
	files_for_block: &FilesForBlock,
	mut rx: BlockQueueReceiver,
	readers: &mut ReaderHandles,
	monitoring: &mut Monitoring,
) -> Result<()> {
	let mut cache = BlockCache::new();
	let mut next_index = 0usize;

	while next_index < block_list.len() {
		let mut progressed = false;

		match rx.try_recv() {
			Ok(item) => {
				cache.insert(item.spec.filename, item.spec.outblock, item.data);
				progressed = true;
			}
			Err(TryRecvError::Empty | TryRecvError::Disconnected) => {}
		}

		if try_emit_next(output, band, null_value, block_list, files_for_block, &mut cache, &mut next_index)? {
			progressed = true;
		}

		readers.check_faults().await?;

		monitoring.update_block_cache_size(cache.len());
		monitoring.update_block_queue_size(rx.len());

		if !progressed && next_index < block_list.len() {
			tokio::task::yield_now().await;
		}
	}

	output.set_null_value(band, null_value)?;
	Ok(())
}

/// Implements §4.8 step 2: emits `block_list[next_index]` if possible (no inputs, or cache
/// holds all of them), advancing `next_index`. Returns whether a tile was emitted.
fn try_emit_next(
	output: &mut dyn RasterHandle,
	band: u32,
	null_value: f64,
	block_list: &[BlockSpec],
	files_for_block: &FilesForBlock,
	cache: &mut BlockCache,
	next_index: &mut usize,
) -> Result<bool> {
	let outblock = block_list[*next_index];

	let Some(filenames) = files_for_block.get(&outblock) else {
		let empty = PixelArray::filled(output_pixel_type(output)?, outblock.ysize, outblock.xsize, null_value);
		output.write_block(band, outblock.left, outblock.top, &empty)?;
		*next_index += 1;
		return Ok(true);
	};

	if !filenames.iter().all(|filename| cache.contains(filename, &outblock)) {
		return Ok(false);
	}

	let mut merged: Option<PixelArray> = None;
	for filename in filenames {
		let array = cache.remove(filename, &outblock).expect("just checked contains");
		match &mut merged {
			None => merged = Some(array),
			Some(dst) => dst.merge_from(&array, null_value)?,
		}
	}
	let merged = merged.ok_or_else(|| anyhow!("tile {outblock:?} has an empty file list"))?;
	bail_on_shape_mismatch(&merged, outblock)?;

	output.write_block(band, outblock.left, outblock.top, &merged)?;
	*next_index += 1;
	Ok(true)
}

fn output_pixel_type(output: &dyn RasterHandle) -> Result<crate::pixel::PixelType> {
	Ok(output.image_info()?.pixel_type)
}

fn bail_on_shape_mismatch(array: &PixelArray, outblock: BlockSpec) -> Result<()> {
	let expected = (outblock.ysize, outblock.xsize);
	if array.shape() != expected {
		bail!(
			"block shape mismatch for tile {outblock:?}: expected {expected:?}, got {:?}",
			array.shape()
		);
	}
	Ok(())
}
