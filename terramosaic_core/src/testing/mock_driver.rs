use crate::driver::{RasterDriver, RasterHandle};
use crate::pixel::{PixelArray, PixelType};
use crate::types::{BlockSpec, ImageInfo};
use anyhow::{Result, bail, ensure};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// One named synthetic raster: the geotransform/projection/null-value metadata plus a dense
/// [`PixelArray`] per band, all `F32` by convention (so tests never need to juggle multiple
/// pixel types unless they explicitly want to).
#[derive(Debug, Clone)]
pub struct MockRasterData {
	pub projection: String,
	pub transform: [f64; 6],
	pub null_value: f64,
	pub bands: Vec<PixelArray>,
}

impl MockRasterData {
	fn ncols(&self) -> u32 {
		self.bands.first().map_or(0, |b| b.shape().1)
	}

	fn nrows(&self) -> u32 {
		self.bands.first().map_or(0, |b| b.shape().0)
	}

	fn image_info(&self) -> ImageInfo {
		ImageInfo {
			projection: self.projection.clone(),
			transform: self.transform,
			ncols: self.ncols(),
			nrows: self.nrows(),
			band_count: self.bands.len() as u32,
			pixel_type: PixelType::F32,
			null_value: self.null_value,
		}
	}
}

/// In-memory [`RasterDriver`] backed by a registry of named synthetic rasters. Supports
/// every trait operation needed by the engine; `build_overviews` is a no-op.
#[derive(Clone)]
pub struct MockDriver {
	registry: Arc<Mutex<HashMap<String, MockRasterData>>>,
	fail_after: Arc<Mutex<HashMap<String, u32>>>,
}

impl MockDriver {
	#[must_use]
	pub fn new() -> Self {
		Self { registry: Arc::new(Mutex::new(HashMap::new())), fail_after: Arc::new(Mutex::new(HashMap::new())) }
	}

	/// Marks `name` to fail its `nth` (1-based) `read_block` call with an injected error,
	/// so tests can exercise the fail-fast path (§8 S6: a reader fault must abort the run
	/// before any further output tile is written) without a real I/O fault.
	pub fn fail_nth_read(&self, name: &str, nth: u32) {
		self.fail_after.lock().expect("mock registry poisoned").insert(name.to_string(), nth - 1);
	}

	/// Registers a synthetic single-band `F32` raster of `ncols x nrows`, filled with
	/// `value`, with its origin at `(0, 0)` and unit pixel size, for use as a test input.
	pub fn insert_flat_input(&self, name: &str, ncols: u32, nrows: u32, value: f64, null_value: f64) {
		self.insert_raster(
			name,
			MockRasterData {
				projection: "EPSG:3857".to_string(),
				transform: [0.0, 1.0, 0.0, f64::from(nrows), 0.0, -1.0],
				null_value,
				bands: vec![PixelArray::filled(PixelType::F32, nrows, ncols, value)],
			},
		);
	}

	/// Registers a synthetic raster at an arbitrary origin, so tests can build overlapping
	/// or disjoint input layouts.
	pub fn insert_raster_at(&self, name: &str, x_min: f64, y_max: f64, ncols: u32, nrows: u32, value: f64, null_value: f64) {
		self.insert_raster(
			name,
			MockRasterData {
				projection: "EPSG:3857".to_string(),
				transform: [x_min, 1.0, 0.0, y_max, 0.0, -1.0],
				null_value,
				bands: vec![PixelArray::filled(PixelType::F32, nrows, ncols, value)],
			},
		);
	}

	pub fn insert_raster(&self, name: &str, data: MockRasterData) {
		self.registry.lock().expect("mock registry poisoned").insert(name.to_string(), data);
	}

	/// Reads back a raster by name (input or output) for test assertions.
	#[must_use]
	pub fn get_raster(&self, name: &str) -> Option<MockRasterData> {
		self.registry.lock().expect("mock registry poisoned").get(name).cloned()
	}
}

impl Default for MockDriver {
	fn default() -> Self {
		Self::new()
	}
}

impl RasterDriver for MockDriver {
	fn open_read(&self, filename: &str) -> Result<Box<dyn RasterHandle>> {
		ensure!(
			self.registry.lock().expect("mock registry poisoned").contains_key(filename),
			"unknown mock input '{filename}'"
		);
		Ok(Box::new(MockHandle {
			name: filename.to_string(),
			registry: self.registry.clone(),
			fail_after: self.fail_after.clone(),
		}))
	}

	fn create(
		&self,
		path: &str,
		_driver_name: &str,
		ncols: u32,
		nrows: u32,
		band_count: u32,
		pixel_type: PixelType,
		_creation_options: &[String],
	) -> Result<Box<dyn RasterHandle>> {
		let bands = (0..band_count).map(|_| PixelArray::filled(pixel_type, nrows, ncols, 0.0)).collect();
		self.insert_raster(
			path,
			MockRasterData { projection: String::new(), transform: [0.0; 6], null_value: 0.0, bands },
		);
		Ok(Box::new(MockHandle { name: path.to_string(), registry: self.registry.clone(), fail_after: self.fail_after.clone() }))
	}

	fn delete(&self, path: &str) -> Result<()> {
		self.registry.lock().expect("mock registry poisoned").remove(path);
		Ok(())
	}
}

struct MockHandle {
	name: String,
	registry: Arc<Mutex<HashMap<String, MockRasterData>>>,
	fail_after: Arc<Mutex<HashMap<String, u32>>>,
}

impl RasterHandle for MockHandle {
	fn image_info(&self) -> Result<ImageInfo> {
		let registry = self.registry.lock().expect("mock registry poisoned");
		let data = registry.get(&self.name).ok_or_else(|| anyhow::anyhow!("mock raster '{}' vanished", self.name))?;
		Ok(data.image_info())
	}

	fn read_block(&mut self, band: u32, block: BlockSpec) -> Result<PixelArray> {
		{
			let mut fail_after = self.fail_after.lock().expect("mock registry poisoned");
			if let Some(remaining) = fail_after.get_mut(&self.name) {
				if *remaining == 0 {
					bail!("injected read fault for mock raster '{}'", self.name);
				}
				*remaining -= 1;
			}
		}
		let registry = self.registry.lock().expect("mock registry poisoned");
		let data = registry.get(&self.name).ok_or_else(|| anyhow::anyhow!("mock raster '{}' vanished", self.name))?;
		let band_array = data
			.bands
			.get(band as usize - 1)
			.ok_or_else(|| anyhow::anyhow!("mock raster '{}' has no band {band}", self.name))?;
		extract_rect(band_array, block)
	}

	fn write_block(&mut self, band: u32, left: i64, top: i64, data: &PixelArray) -> Result<()> {
		let mut registry = self.registry.lock().expect("mock registry poisoned");
		let raster = registry
			.get_mut(&self.name)
			.ok_or_else(|| anyhow::anyhow!("mock raster '{}' vanished", self.name))?;
		let band_array = raster
			.bands
			.get_mut(band as usize - 1)
			.ok_or_else(|| anyhow::anyhow!("mock raster '{}' has no band {band}", self.name))?;
		band_array.paste_from(data, top as u32, left as u32)
	}

	fn set_geo_transform(&mut self, transform: [f64; 6]) -> Result<()> {
		let mut registry = self.registry.lock().expect("mock registry poisoned");
		let raster = registry
			.get_mut(&self.name)
			.ok_or_else(|| anyhow::anyhow!("mock raster '{}' vanished", self.name))?;
		raster.transform = transform;
		Ok(())
	}

	fn set_projection(&mut self, projection: &str) -> Result<()> {
		let mut registry = self.registry.lock().expect("mock registry poisoned");
		let raster = registry
			.get_mut(&self.name)
			.ok_or_else(|| anyhow::anyhow!("mock raster '{}' vanished", self.name))?;
		raster.projection = projection.to_string();
		Ok(())
	}

	fn set_null_value(&mut self, _band: u32, value: f64) -> Result<()> {
		let mut registry = self.registry.lock().expect("mock registry poisoned");
		let raster = registry
			.get_mut(&self.name)
			.ok_or_else(|| anyhow::anyhow!("mock raster '{}' vanished", self.name))?;
		raster.null_value = value;
		Ok(())
	}

	fn build_overviews(&mut self, _scales: &[u32]) -> Result<()> {
		Ok(())
	}
}

fn extract_rect(array: &PixelArray, block: BlockSpec) -> Result<PixelArray> {
	match array {
		PixelArray::F32(buf) => {
			let mut out = vec![0.0f32; block.ysize as usize * block.xsize as usize];
			for r in 0..block.ysize {
				for c in 0..block.xsize {
					let src_row = block.top as u32 + r;
					let src_col = block.left as u32 + c;
					let src_index = (src_row * buf.cols + src_col) as usize;
					let dst_index = (r * block.xsize + c) as usize;
					out[dst_index] = buf.data[src_index];
				}
			}
			Ok(PixelArray::F32(crate::pixel::Buffer { rows: block.ysize, cols: block.xsize, data: out }))
		}
		other => bail!("mock driver only carries F32 rasters, found {:?}", other.pixel_type()),
	}
}

/// Test helper: extracts the `F32` data slice from a [`PixelArray`], panicking otherwise
/// (every mock raster is `F32` by convention, see [`MockRasterData`]).
#[must_use]
pub fn f32_data(array: &PixelArray) -> &[f32] {
	match array {
		PixelArray::F32(buf) => &buf.data,
		other => panic!("expected F32 mock data, found {:?}", other.pixel_type()),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn insert_and_read_rectangle() {
		let driver = MockDriver::new();
		driver.insert_flat_input("a.tif", 10, 10, 3.0, 0.0);
		let mut handle = driver.open_read("a.tif").unwrap();
		let rect = handle.read_block(1, BlockSpec::new(2, 2, 4, 4)).unwrap();
		assert_eq!(f32_data(&rect).len(), 16);
		assert!(f32_data(&rect).iter().all(|&v| v == 3.0));
	}

	#[test]
	fn open_unknown_input_fails() {
		let driver = MockDriver::new();
		assert!(driver.open_read("missing.tif").is_err());
	}
}
