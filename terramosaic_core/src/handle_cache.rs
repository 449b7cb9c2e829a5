//! Per-reader cache of opened input file handles with reference-count-driven close (§4.4).
//!
//! Owned by exactly one reader; never shared across threads. Seeded with the remaining-work
//! counts derived from that reader's partition of the reading plan, so a handle is closed the
//! moment the reader has read its last block from that file — important because inputs are
//! often large and remote, and keeping a handle open (and its network connection alive)
//! longer than necessary wastes file descriptors and bandwidth.

use crate::driver::{RasterDriver, RasterHandle};
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::sync::Arc;

pub struct HandleCache {
	driver: Arc<dyn RasterDriver>,
	handles: HashMap<String, Box<dyn RasterHandle>>,
	remaining: HashMap<String, u32>,
}

impl HandleCache {
	/// `remaining[filename]` is the number of output-tiles this reader will still read from
	/// `filename`, computed once from its assigned partition of [`BlockReadingSpec`]s.
	#[must_use]
	pub fn new(driver: Arc<dyn RasterDriver>, remaining: HashMap<String, u32>) -> Self {
		Self { driver, handles: HashMap::new(), remaining }
	}

	/// Returns the open handle for `filename`, opening it on first use.
	pub fn open(&mut self, filename: &str) -> Result<&mut (dyn RasterHandle + 'static)> {
		if !self.handles.contains_key(filename) {
			let handle = self
				.driver
				.open_read(filename)
				.with_context(|| format!("opening input raster '{filename}'"))?;
			log::debug!("reader opened '{filename}' ({} block(s) owed)", self.remaining.get(filename).copied().unwrap_or(0));
			self.handles.insert(filename.to_string(), handle);
		}
		Ok(self.handles.get_mut(filename).expect("just inserted").as_mut())
	}

	/// Call after a successful read of one block from `filename`. Decrements the
	/// remaining-work count and closes the handle once it reaches zero.
	pub fn release(&mut self, filename: &str) {
		if let Some(count) = self.remaining.get_mut(filename) {
			*count = count.saturating_sub(1);
			if *count == 0 {
				log::debug!("reader closing '{filename}', no blocks remaining");
				self.handles.remove(filename);
			}
		}
	}

	#[must_use]
	pub fn open_handle_count(&self) -> usize {
		self.handles.len()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::MockDriver;

	#[test]
	fn closes_handle_when_remaining_work_hits_zero() {
		let driver = Arc::new(MockDriver::new());
		driver.insert_flat_input("a.tif", 4, 4, 0.0, 0.0);

		let mut remaining = HashMap::new();
		remaining.insert("a.tif".to_string(), 2);
		let mut cache = HandleCache::new(driver, remaining);

		cache.open("a.tif").unwrap();
		assert_eq!(cache.open_handle_count(), 1);

		cache.release("a.tif");
		assert_eq!(cache.open_handle_count(), 1);

		cache.release("a.tif");
		assert_eq!(cache.open_handle_count(), 0);
	}
}
