//! Bounded MPSC channel carrying `(BlockReadingSpec, array)` items from readers to the
//! writer (§4.5), plus the default reader/writer concurrency knobs for the mosaic pipeline.

use crate::pixel::PixelArray;
use crate::types::BlockReadingSpec;
use tokio::sync::mpsc;

/// One item flowing through the block queue: a reader's padded, output-shaped array for the
/// `BlockReadingSpec` it was read for.
#[derive(Debug)]
pub struct BlockQueueItem {
	pub spec: BlockReadingSpec,
	pub data: PixelArray,
}

pub type BlockQueueSender = mpsc::Sender<BlockQueueItem>;
pub type BlockQueueReceiver = mpsc::Receiver<BlockQueueItem>;

/// Creates a bounded channel. `capacity` should be a small multiple of `num_threads` (the
/// default is `2 * num_threads`, see [`default_capacity`]) so that readers outrunning the
/// writer block on enqueue instead of growing memory without bound.
#[must_use]
pub fn bounded(capacity: usize) -> (BlockQueueSender, BlockQueueReceiver) {
	mpsc::channel(capacity.max(1))
}

/// The default block-queue capacity for a pool of `num_threads` readers: `2 * num_threads`.
#[must_use]
pub fn default_capacity(num_threads: usize) -> usize {
	2 * num_threads.max(1)
}

/// Default number of reader threads when the caller doesn't override it.
pub const DEFAULT_NUM_THREADS: usize = 4;

/// Default output tile side, in pixels.
pub const DEFAULT_BLOCK_SIZE: u32 = 1024;
