use super::{BlockSpec, GeoBBox};
use crate::pixel::PixelType;
use std::collections::HashMap;

/// Per-input metadata, extracted once by opening the file through the raster driver.
///
/// Immutable after construction. The affine transform follows the usual GDAL convention
/// `(x_origin, x_res, 0, y_origin, 0, -y_res)`.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageInfo {
	pub projection: String,
	pub transform: [f64; 6],
	pub ncols: u32,
	pub nrows: u32,
	pub band_count: u32,
	pub pixel_type: PixelType,
	pub null_value: f64,
}

impl ImageInfo {
	#[must_use]
	pub fn x_res(&self) -> f64 {
		self.transform[1]
	}

	#[must_use]
	pub fn y_res(&self) -> f64 {
		-self.transform[5]
	}

	/// Bounding box `(xMin, xMax, yMin, yMax)` derived from the transform and pixel size.
	pub fn bbox(&self) -> anyhow::Result<GeoBBox> {
		let x_min = self.transform[0];
		let x_max = self.transform[0] + f64::from(self.ncols) * self.transform[1];
		let y_max = self.transform[3];
		let y_min = self.transform[3] + f64::from(self.nrows) * self.transform[5];
		GeoBBox::new(x_min, y_min, x_max, y_max)
	}
}

/// A read unit produced by the planner and consumed by a single reader: read `inblock` of
/// `filename` and deliver it for `outblock` of the output grid.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlockReadingSpec {
	pub outblock: BlockSpec,
	pub filename: String,
	pub inblock: BlockSpec,
}

/// Maps each output tile to the ordered list of filenames whose extents intersect it.
///
/// The order is the merge order (last entry wins) and matches the order inputs were
/// discovered during planning. Tiles with no intersecting inputs are absent from this map.
pub type FilesForBlock = HashMap<BlockSpec, Vec<String>>;
