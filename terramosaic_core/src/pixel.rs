//! Runtime pixel dtype tag and the tagged dense buffer it dispatches over.
//!
//! The mosaic engine reads arrays of whatever dtype each input band declares, so pixel type
//! cannot be a compile-time generic parameter threaded through the whole pipeline. Instead it
//! is carried as a runtime tag ([`PixelType`]) and the per-block buffer is an enum of one
//! `Vec<T>` variant per supported numeric type ([`PixelArray`]); padding, clipping and merge
//! kernels dispatch on the tag once per block and then run monomorphized over `T`.

use anyhow::{Result, bail, ensure};
use num_traits::NumCast;

/// Tag for the concrete numeric type carried by one band of pixel data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelType {
	U8,
	U16,
	I16,
	U32,
	I32,
	F32,
	F64,
}

impl PixelType {
	#[must_use]
	pub fn bytes_per_pixel(self) -> usize {
		match self {
			PixelType::U8 => 1,
			PixelType::U16 | PixelType::I16 => 2,
			PixelType::U32 | PixelType::I32 | PixelType::F32 => 4,
			PixelType::F64 => 8,
		}
	}
}

/// A dense row-major buffer of `(rows, cols)` elements of one concrete numeric type.
#[derive(Debug, Clone, PartialEq)]
pub struct Buffer<T> {
	pub rows: u32,
	pub cols: u32,
	pub data: Vec<T>,
}

impl<T: Copy + PartialEq> Buffer<T> {
	pub fn filled(rows: u32, cols: u32, value: T) -> Self {
		let len = rows as usize * cols as usize;
		Self { rows, cols, data: vec![value; len] }
	}

	#[must_use]
	pub fn shape(&self) -> (u32, u32) {
		(self.rows, self.cols)
	}

	/// Pastes `src` into `self` with its top-left corner at `(row_offset, col_offset)`.
	///
	/// `src` must fit entirely within `self` at that offset; this always holds for the
	/// reader pool's usage, where `src` is a clip of the block being pasted into.
	pub fn paste_from(&mut self, src: &Buffer<T>, row_offset: u32, col_offset: u32) {
		for r in 0..src.rows {
			let dst_row = row_offset + r;
			if dst_row >= self.rows {
				continue;
			}
			for c in 0..src.cols {
				let dst_col = col_offset + c;
				if dst_col >= self.cols {
					continue;
				}
				let dst_index = (dst_row * self.cols + dst_col) as usize;
				let src_index = (r * src.cols + c) as usize;
				self.data[dst_index] = src.data[src_index];
			}
		}
	}

	/// Overwrites `self` wherever `src`'s pixel is not equal to `null`. Last-non-null-wins.
	fn merge_from(&mut self, src: &Buffer<T>, null: T) {
		for (dst, src) in self.data.iter_mut().zip(src.data.iter()) {
			if *src != null {
				*dst = *src;
			}
		}
	}
}

fn cast_null<T: NumCast>(value: f64) -> T {
	NumCast::from(value.round()).unwrap_or_else(|| NumCast::from(0.0).unwrap())
}

macro_rules! pixel_array {
	($($variant:ident => $ty:ty),+ $(,)?) => {
		/// A tagged dense pixel buffer: one `Buffer<T>` variant per supported [`PixelType`].
		#[derive(Debug, Clone, PartialEq)]
		pub enum PixelArray {
			$($variant(Buffer<$ty>)),+
		}

		impl PixelArray {
			#[must_use]
			pub fn pixel_type(&self) -> PixelType {
				match self {
					$(PixelArray::$variant(_) => PixelType::$variant),+
				}
			}

			#[must_use]
			pub fn shape(&self) -> (u32, u32) {
				match self {
					$(PixelArray::$variant(b) => b.shape()),+
				}
			}

			/// Allocates a `(rows, cols)` buffer of `pixel_type`, filled with `null_value`
			/// cast into the concrete element type.
			#[must_use]
			pub fn filled(pixel_type: PixelType, rows: u32, cols: u32, null_value: f64) -> PixelArray {
				match pixel_type {
					$(PixelType::$variant => PixelArray::$variant(Buffer::filled(rows, cols, cast_null::<$ty>(null_value)))),+
				}
			}

			/// Pastes `src` into `self` at `(row_offset, col_offset)`. Fails if the two
			/// buffers don't carry the same concrete pixel type.
			pub fn paste_from(&mut self, src: &PixelArray, row_offset: u32, col_offset: u32) -> Result<()> {
				match (self, src) {
					$((PixelArray::$variant(dst), PixelArray::$variant(s)) => {
						dst.paste_from(s, row_offset, col_offset);
						Ok(())
					})+
					(dst, s) => bail!("pixel type mismatch while pasting: {:?} into {:?}", s.pixel_type(), dst.pixel_type()),
				}
			}

			/// Overwrites `self` wherever `src` is not `null_value`. Requires identical
			/// shapes (the writer's invariant-violation fault, §7 of the spec).
			pub fn merge_from(&mut self, src: &PixelArray, null_value: f64) -> Result<()> {
				ensure!(
					self.shape() == src.shape(),
					"block shape mismatch during merge: {:?} vs {:?}",
					self.shape(),
					src.shape()
				);
				match (self, src) {
					$((PixelArray::$variant(dst), PixelArray::$variant(s)) => {
						dst.merge_from(s, cast_null::<$ty>(null_value));
						Ok(())
					})+
					(dst, s) => bail!("pixel type mismatch during merge: {:?} vs {:?}", s.pixel_type(), dst.pixel_type()),
				}
			}
		}
	};
}

pixel_array!(
	U8 => u8,
	U16 => u16,
	I16 => i16,
	U32 => u32,
	I32 => i32,
	F32 => f32,
	F64 => f64,
);

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn filled_has_requested_shape_and_value() {
		let arr = PixelArray::filled(PixelType::U8, 3, 5, 7.0);
		assert_eq!(arr.shape(), (3, 5));
		if let PixelArray::U8(buf) = arr {
			assert!(buf.data.iter().all(|&v| v == 7));
		} else {
			panic!("wrong variant");
		}
	}

	#[test]
	fn paste_places_source_at_offset() {
		let mut dst = PixelArray::filled(PixelType::I16, 4, 4, 0.0);
		let src = PixelArray::filled(PixelType::I16, 2, 2, 9.0);
		dst.paste_from(&src, 1, 1).unwrap();
		if let PixelArray::I16(buf) = dst {
			assert_eq!(buf.data[1 * 4 + 1], 9);
			assert_eq!(buf.data[2 * 4 + 2], 9);
			assert_eq!(buf.data[0], 0);
		} else {
			panic!("wrong variant");
		}
	}

	#[test]
	fn merge_last_non_null_wins() {
		let mut dst = PixelArray::U8(Buffer { rows: 1, cols: 3, data: vec![1, 0, 0] });
		let overlay = PixelArray::U8(Buffer { rows: 1, cols: 3, data: vec![0, 2, 0] });
		dst.merge_from(&overlay, 0.0).unwrap();
		if let PixelArray::U8(buf) = dst {
			assert_eq!(buf.data, vec![1, 2, 0]);
		} else {
			panic!("wrong variant");
		}
	}

	#[test]
	fn merge_rejects_shape_mismatch() {
		let mut dst = PixelArray::filled(PixelType::U8, 2, 2, 0.0);
		let other = PixelArray::filled(PixelType::U8, 3, 3, 0.0);
		assert!(dst.merge_from(&other, 0.0).is_err());
	}
}
