//! Abstract raster I/O surface (§4.1 / §6 of the spec): the only way the engine touches disk.
//!
//! Kept as a plain, object-safe Rust trait so it can be shared as `Arc<dyn RasterDriver>`
//! between the per-band reader tasks and the writer. Two implementations exist: the
//! GDAL-backed driver in `terramosaic_raster`, used in production, and
//! [`crate::testing::MockDriver`], an in-memory implementation used by the test suite so the
//! planner/reader-pool/writer-loop/orchestrator logic can be exercised without a GDAL
//! installation.

use crate::pixel::PixelArray;
use crate::types::{BlockSpec, ImageInfo};
use anyhow::Result;

/// An open raster, for either reading or writing.
///
/// Implementations are reader-local: a `Box<dyn RasterHandle>` never crosses a thread
/// boundary once opened (it lives inside one reader's [`crate::handle_cache::HandleCache`],
/// or is the single output handle owned by the writer).
pub trait RasterHandle: Send {
	/// Metadata extracted at open time. Cheap: implementations compute this once and return
	/// an owned clone here rather than re-querying the underlying format on every call.
	fn image_info(&self) -> Result<ImageInfo>;

	/// Reads `block` of `band` (1-based) as a dense array of the band's native pixel type.
	///
	/// `block` must already be clipped to the valid pixel domain of this raster; the driver
	/// is not responsible for clipping or null-padding (that's the reader pool's job, §4.7).
	fn read_block(&mut self, band: u32, block: BlockSpec) -> Result<PixelArray>;

	/// Writes `data` to `band` (1-based) at `(left, top)` of this raster's pixel grid.
	fn write_block(&mut self, band: u32, left: i64, top: i64, data: &PixelArray) -> Result<()>;

	fn set_geo_transform(&mut self, transform: [f64; 6]) -> Result<()>;

	fn set_projection(&mut self, projection: &str) -> Result<()>;

	fn set_null_value(&mut self, band: u32, value: f64) -> Result<()>;

	/// Builds overview pyramids at the given scale factors. A no-op is an acceptable
	/// implementation for formats or test doubles that don't support overviews.
	fn build_overviews(&mut self, scales: &[u32]) -> Result<()>;
}

/// Factory for [`RasterHandle`]s, plus the output-path lifecycle operations of §4.1.
pub trait RasterDriver: Send + Sync {
	/// Opens `filename` for reading, extracting its [`ImageInfo`] up front.
	fn open_read(&self, filename: &str) -> Result<Box<dyn RasterHandle>>;

	/// Creates a new output raster at `path` using the named output driver (e.g. `GTiff`,
	/// `KEA`; §6's `driver` configuration option), with the given shape, pixel type and
	/// driver-specific creation options. Does not delete a pre-existing file at `path` —
	/// callers that need "pre-existing output paths are deleted before creation" (§7) call
	/// [`RasterDriver::delete`] first.
	fn create(
		&self,
		path: &str,
		driver_name: &str,
		ncols: u32,
		nrows: u32,
		band_count: u32,
		pixel_type: PixelType,
		creation_options: &[String],
	) -> Result<Box<dyn RasterHandle>>;

	/// Removes a pre-existing raster at `path`, if any. Succeeds (no-op) if nothing exists
	/// there.
	fn delete(&self, path: &str) -> Result<()>;
}
