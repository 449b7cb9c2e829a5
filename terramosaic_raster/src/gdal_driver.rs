use anyhow::{Context, Result, bail};
use gdal::cpl::CslStringList;
use gdal::raster::{Buffer as GdalBuffer, GdalDataType, GdalType, RasterBand};
use gdal::{Dataset, DriverManager};
use terramosaic_core::driver::{RasterDriver, RasterHandle};
use terramosaic_core::pixel::{Buffer, PixelArray, PixelType};
use terramosaic_core::types::{BlockSpec, ImageInfo};

/// Default creation options per output driver, carried verbatim from the original tool's
/// `defaultCreationOptions` table. Only `GTiff` is exercised by the test suite, but `KEA`/`HFA`
/// defaults are kept for parity since users may request either.
#[must_use]
pub fn creation_options_for(driver_name: &str) -> Vec<String> {
	match driver_name {
		"GTiff" => vec![
			"COMPRESS=DEFLATE".to_string(),
			"TILED=YES".to_string(),
			"BIGTIFF=IF_SAFER".to_string(),
			"INTERLEAVE=BAND".to_string(),
		],
		"KEA" => Vec::new(),
		"HFA" => vec!["COMPRESS=YES".to_string(), "IGNORE_UTM=TRUE".to_string()],
		_ => Vec::new(),
	}
}

fn pixel_type_from_gdal(dtype: GdalDataType) -> Result<PixelType> {
	Ok(match dtype {
		GdalDataType::UInt8 => PixelType::U8,
		GdalDataType::UInt16 => PixelType::U16,
		GdalDataType::Int16 => PixelType::I16,
		GdalDataType::UInt32 => PixelType::U32,
		GdalDataType::Int32 => PixelType::I32,
		GdalDataType::Float32 => PixelType::F32,
		GdalDataType::Float64 => PixelType::F64,
		other => bail!("unsupported GDAL pixel type {other:?}"),
	})
}

fn read_block_typed<T: GdalType + Copy>(band: &RasterBand, block: BlockSpec) -> Result<Buffer<T>> {
	let window = (block.left as isize, block.top as isize);
	let size = (block.xsize as usize, block.ysize as usize);
	let buf = band.read_as::<T>(window, size, size, None)?;
	Ok(Buffer { rows: block.ysize, cols: block.xsize, data: buf.data })
}

fn read_block_dispatch(band: &RasterBand, pixel_type: PixelType, block: BlockSpec) -> Result<PixelArray> {
	Ok(match pixel_type {
		PixelType::U8 => PixelArray::U8(read_block_typed::<u8>(band, block)?),
		PixelType::U16 => PixelArray::U16(read_block_typed::<u16>(band, block)?),
		PixelType::I16 => PixelArray::I16(read_block_typed::<i16>(band, block)?),
		PixelType::U32 => PixelArray::U32(read_block_typed::<u32>(band, block)?),
		PixelType::I32 => PixelArray::I32(read_block_typed::<i32>(band, block)?),
		PixelType::F32 => PixelArray::F32(read_block_typed::<f32>(band, block)?),
		PixelType::F64 => PixelArray::F64(read_block_typed::<f64>(band, block)?),
	})
}

fn write_block_typed<T: GdalType + Copy>(
	band: &mut RasterBand,
	left: i64,
	top: i64,
	buf: &Buffer<T>,
) -> Result<()> {
	let mut gdal_buf = GdalBuffer::new((buf.cols as usize, buf.rows as usize), buf.data.clone());
	band.write((left as isize, top as isize), (buf.cols as usize, buf.rows as usize), &mut gdal_buf)?;
	Ok(())
}

fn write_block_dispatch(band: &mut RasterBand, left: i64, top: i64, data: &PixelArray) -> Result<()> {
	match data {
		PixelArray::U8(buf) => write_block_typed(band, left, top, buf),
		PixelArray::U16(buf) => write_block_typed(band, left, top, buf),
		PixelArray::I16(buf) => write_block_typed(band, left, top, buf),
		PixelArray::U32(buf) => write_block_typed(band, left, top, buf),
		PixelArray::I32(buf) => write_block_typed(band, left, top, buf),
		PixelArray::F32(buf) => write_block_typed(band, left, top, buf),
		PixelArray::F64(buf) => write_block_typed(band, left, top, buf),
	}
}

fn create_with_band_type_dispatch(
	driver: &gdal::Driver,
	path: &str,
	ncols: u32,
	nrows: u32,
	band_count: u32,
	pixel_type: PixelType,
	options: &CslStringList,
) -> Result<Dataset> {
	let ncols = ncols as usize;
	let nrows = nrows as usize;
	let band_count = band_count as usize;
	Ok(match pixel_type {
		PixelType::U8 => driver.create_with_band_type_with_options::<u8, _>(path, ncols, nrows, band_count, options)?,
		PixelType::U16 => driver.create_with_band_type_with_options::<u16, _>(path, ncols, nrows, band_count, options)?,
		PixelType::I16 => driver.create_with_band_type_with_options::<i16, _>(path, ncols, nrows, band_count, options)?,
		PixelType::U32 => driver.create_with_band_type_with_options::<u32, _>(path, ncols, nrows, band_count, options)?,
		PixelType::I32 => driver.create_with_band_type_with_options::<i32, _>(path, ncols, nrows, band_count, options)?,
		PixelType::F32 => driver.create_with_band_type_with_options::<f32, _>(path, ncols, nrows, band_count, options)?,
		PixelType::F64 => driver.create_with_band_type_with_options::<f64, _>(path, ncols, nrows, band_count, options)?,
	})
}

/// [`RasterDriver`] implementation backed by the `gdal` crate. Stateless: every operation
/// opens or creates the dataset it needs on the spot.
#[derive(Debug, Clone, Copy, Default)]
pub struct GdalDriver;

impl GdalDriver {
	#[must_use]
	pub fn new() -> Self {
		Self
	}
}

impl RasterDriver for GdalDriver {
	fn open_read(&self, filename: &str) -> Result<Box<dyn RasterHandle>> {
		let dataset = Dataset::open(filename).with_context(|| format!("opening '{filename}' with GDAL"))?;
		log::debug!("opened '{filename}' for read");
		Ok(Box::new(GdalHandle { dataset }))
	}

	fn create(
		&self,
		path: &str,
		driver_name: &str,
		ncols: u32,
		nrows: u32,
		band_count: u32,
		pixel_type: PixelType,
		creation_options: &[String],
	) -> Result<Box<dyn RasterHandle>> {
		let driver = DriverManager::get_driver_by_name(driver_name)
			.with_context(|| format!("no GDAL driver named '{driver_name}'"))?;

		let options = if creation_options.is_empty() {
			creation_options_for(driver_name)
		} else {
			creation_options.to_vec()
		};
		let mut csl = CslStringList::new();
		for option in &options {
			csl.add_string(option)?;
		}

		let dataset = create_with_band_type_dispatch(&driver, path, ncols, nrows, band_count, pixel_type, &csl)
			.with_context(|| format!("creating output raster '{path}' via driver '{driver_name}'"))?;
		log::debug!("created '{path}' ({ncols}x{nrows}, {band_count} band(s)) via driver '{driver_name}'");
		Ok(Box::new(GdalHandle { dataset }))
	}

	fn delete(&self, path: &str) -> Result<()> {
		if std::path::Path::new(path).exists() {
			log::warn!("deleting pre-existing output '{path}'");
			let driver_name = driver_name_for_path(path);
			if let Ok(driver) = DriverManager::get_driver_by_name(driver_name) {
				driver.delete(path).with_context(|| format!("deleting pre-existing output '{path}'"))?;
			} else {
				std::fs::remove_file(path).with_context(|| format!("deleting pre-existing output '{path}'"))?;
			}
		}
		Ok(())
	}
}

/// Guesses the GDAL driver short name from a file extension, for locating the driver that
/// owns a pre-existing output path at delete time (the output driver actually used for
/// *creation* comes from the `driver` configuration option, not this guess — see
/// [`RasterDriver::create`]). Defaults to `GTiff`, matching the CLI's own default.
fn driver_name_for_path(path: &str) -> &'static str {
	let ext = std::path::Path::new(path)
		.extension()
		.and_then(|e| e.to_str())
		.unwrap_or("")
		.to_ascii_lowercase();
	match ext.as_str() {
		"kea" => "KEA",
		"img" => "HFA",
		_ => "GTiff",
	}
}

struct GdalHandle {
	dataset: Dataset,
}

impl RasterHandle for GdalHandle {
	fn image_info(&self) -> Result<ImageInfo> {
		let transform = self.dataset.geo_transform().context("reading geotransform")?;
		let (ncols, nrows) = self.dataset.raster_size();
		let band_count = self.dataset.raster_count();
		anyhow::ensure!(band_count > 0, "dataset has no bands");
		let band = self.dataset.rasterband(1).context("opening band 1 for metadata")?;
		let pixel_type = pixel_type_from_gdal(band.band_type())?;
		let null_value = band.no_data_value().unwrap_or(0.0);
		let projection = self.dataset.projection();
		Ok(ImageInfo {
			projection,
			transform,
			ncols: ncols as u32,
			nrows: nrows as u32,
			band_count: band_count as u32,
			pixel_type,
			null_value,
		})
	}

	fn read_block(&mut self, band: u32, block: BlockSpec) -> Result<PixelArray> {
		let raster_band = self.dataset.rasterband(band as usize).with_context(|| format!("opening band {band}"))?;
		let pixel_type = pixel_type_from_gdal(raster_band.band_type())?;
		read_block_dispatch(&raster_band, pixel_type, block)
			.with_context(|| format!("reading block {block:?} of band {band}"))
	}

	fn write_block(&mut self, band: u32, left: i64, top: i64, data: &PixelArray) -> Result<()> {
		let mut raster_band = self.dataset.rasterband(band as usize).with_context(|| format!("opening band {band}"))?;
		write_block_dispatch(&mut raster_band, left, top, data)
			.with_context(|| format!("writing block at ({left}, {top}) of band {band}"))
	}

	fn set_geo_transform(&mut self, transform: [f64; 6]) -> Result<()> {
		self.dataset.set_geo_transform(&transform).context("setting geotransform")
	}

	fn set_projection(&mut self, projection: &str) -> Result<()> {
		self.dataset.set_projection(projection).context("setting projection")
	}

	fn set_null_value(&mut self, band: u32, value: f64) -> Result<()> {
		let mut raster_band = self.dataset.rasterband(band as usize).with_context(|| format!("opening band {band}"))?;
		raster_band.set_no_data_value(value).context("setting null value")
	}

	fn build_overviews(&mut self, scales: &[u32]) -> Result<()> {
		let levels: Vec<i32> = scales.iter().map(|&s| s as i32).collect();
		self.dataset.build_overviews("NEAREST", &levels, &[]).context("building overviews")
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn default_creation_options_match_expected_table() {
		assert_eq!(
			creation_options_for("GTiff"),
			vec!["COMPRESS=DEFLATE", "TILED=YES", "BIGTIFF=IF_SAFER", "INTERLEAVE=BAND"]
		);
		assert!(creation_options_for("KEA").is_empty());
		assert_eq!(creation_options_for("HFA"), vec!["COMPRESS=YES", "IGNORE_UTM=TRUE"]);
		assert!(creation_options_for("PNG").is_empty());
	}

	#[test]
	fn driver_name_guessed_from_extension() {
		assert_eq!(driver_name_for_path("out.tif"), "GTiff");
		assert_eq!(driver_name_for_path("out.kea"), "KEA");
		assert_eq!(driver_name_for_path("out.img"), "HFA");
		assert_eq!(driver_name_for_path("out.weird"), "GTiff");
	}

	#[test]
	fn roundtrip_write_then_read_memory_driver() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("out.tif");
		let driver = GdalDriver::new();

		let mut handle = driver
			.create(path.to_str().unwrap(), "GTiff", 4, 4, 1, PixelType::F32, &[])
			.unwrap();
		let data = PixelArray::filled(PixelType::F32, 4, 4, 7.0);
		handle.write_block(1, 0, 0, &data).unwrap();
		handle.set_geo_transform([0.0, 1.0, 0.0, 4.0, 0.0, -1.0]).unwrap();
		handle.set_projection("EPSG:3857").unwrap();
		handle.set_null_value(1, -9999.0).unwrap();
		drop(handle);

		let mut read_back = driver.open_read(path.to_str().unwrap()).unwrap();
		let info = read_back.image_info().unwrap();
		assert_eq!((info.ncols, info.nrows), (4, 4));
		assert_eq!(info.pixel_type, PixelType::F32);

		let block = read_back.read_block(1, BlockSpec::new(0, 0, 4, 4)).unwrap();
		if let PixelArray::F32(buf) = block {
			assert!(buf.data.iter().all(|&v| v == 7.0));
		} else {
			panic!("expected F32");
		}
	}
}
