//! N reader workers, each draining one stride partition of the reading plan (§4.7).
//!
//! Each reader owns its own [`HandleCache`] and never shares state with the others. Readers
//! run as blocking tasks (`tokio::task::spawn_blocking`) since the underlying driver calls
//! are synchronous; backpressure comes from `blocking_send` on the bounded block queue.

use crate::concurrency::{BlockQueueItem, BlockQueueSender};
use crate::driver::RasterDriver;
use crate::handle_cache::HandleCache;
use crate::pixel::PixelArray;
use crate::types::BlockReadingSpec;
use anyhow::{Context, Result, bail};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Spawns one blocking task per partition. Returns the join handles so the writer loop can
/// poll them for completion/fault status (§4.8 step 3).
pub fn spawn_readers(
	driver: Arc<dyn RasterDriver>,
	partitions: Vec<Vec<BlockReadingSpec>>,
	band: u32,
	null_value: f64,
	tx: BlockQueueSender,
) -> Vec<JoinHandle<Result<()>>> {
	partitions
		.into_iter()
		.map(|partition| {
			let driver = driver.clone();
			let tx = tx.clone();
			tokio::task::spawn_blocking(move || run_reader(&driver, partition, band, null_value, &tx))
		})
		.collect()
}

fn run_reader(
	driver: &Arc<dyn RasterDriver>,
	partition: Vec<BlockReadingSpec>,
	band: u32,
	null_value: f64,
	tx: &BlockQueueSender,
) -> Result<()> {
	let mut remaining: HashMap<String, u32> = HashMap::new();
	for spec in &partition {
		*remaining.entry(spec.filename.clone()).or_insert(0) += 1;
	}
	let mut cache = HandleCache::new(driver.clone(), remaining);

	for spec in partition {
		let array = read_one_block(&mut cache, band, null_value, &spec)
			.with_context(|| format!("reading block {:?} of '{}'", spec.outblock, spec.filename))?;
		cache.release(&spec.filename);

		if tx.blocking_send(BlockQueueItem { spec, data: array }).is_err() {
			bail!("block queue closed (writer likely aborted); stopping reader");
		}
	}

	Ok(())
}

/// Implements §4.7 steps 1-4: acquire the handle, clip `inblock` to the input's valid
/// domain, read the clipped rectangle, then paste it into a full output-shaped array
/// pre-filled with the output null value.
fn read_one_block(
	cache: &mut HandleCache,
	band: u32,
	output_null_value: f64,
	spec: &BlockReadingSpec,
) -> Result<PixelArray> {
	let info = cache.open(&spec.filename)?.image_info()?;
	let (outsize_y, outsize_x) = spec.outblock.shape();
	let mut padded = PixelArray::filled(info.pixel_type, outsize_y, outsize_x, output_null_value);

	if let Some(clipped) = spec.inblock.clip_to_domain(info.ncols, info.nrows) {
		let handle = cache.open(&spec.filename)?;
		let data = handle.read_block(band, clipped)?;
		let (row_offset, col_offset) = clipped.offset_within(&spec.inblock);
		padded.paste_from(&data, row_offset, col_offset)?;
	}

	Ok(padded)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::MockDriver;
	use crate::types::BlockSpec;

	#[test]
	fn out_of_domain_inblock_yields_all_null_padding() {
		let driver = Arc::new(MockDriver::new());
		driver.insert_flat_input("a.tif", 4, 4, 5.0, 9.0);

		let mut remaining = HashMap::new();
		remaining.insert("a.tif".to_string(), 1);
		let mut cache = HandleCache::new(driver, remaining);

		let spec = BlockReadingSpec {
			outblock: BlockSpec::new(0, 0, 4, 4),
			filename: "a.tif".to_string(),
			inblock: BlockSpec::new(100, 100, 4, 4),
		};
		let array = read_one_block(&mut cache, 1, 9.0, &spec).unwrap();
		assert_eq!(array.shape(), (4, 4));
		if let PixelArray::F32(buf) = &array {
			assert!(buf.data.iter().all(|&v| v == 9.0), "out-of-domain block must be all output-null");
		} else {
			panic!("mock driver uses F32 by convention");
		}
	}

	#[test]
	fn negative_origin_inblock_pastes_at_offset() {
		let driver = Arc::new(MockDriver::new());
		driver.insert_flat_input("a.tif", 10, 10, 5.0, 0.0);

		let mut remaining = HashMap::new();
		remaining.insert("a.tif".to_string(), 1);
		let mut cache = HandleCache::new(driver, remaining);

		let spec = BlockReadingSpec {
			outblock: BlockSpec::new(0, 0, 4, 4),
			filename: "a.tif".to_string(),
			inblock: BlockSpec::new(-2, -2, 4, 4),
		};
		let array = read_one_block(&mut cache, 1, 0.0, &spec).unwrap();
		assert_eq!(array.shape(), (4, 4));
	}
}
