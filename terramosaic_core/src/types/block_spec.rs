/// A rectangle in pixel coordinates: `(top, left, xsize, ysize)`.
///
/// Used both for output tiles and for input sub-rectangles. Input sub-rectangles may have a
/// negative `top`/`left`, meaning the rectangle extends past the input's origin — the reader
/// clips against the input's valid domain and null-pads the rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockSpec {
	pub top: i64,
	pub left: i64,
	pub xsize: u32,
	pub ysize: u32,
}

impl BlockSpec {
	#[must_use]
	pub fn new(top: i64, left: i64, xsize: u32, ysize: u32) -> Self {
		Self { top, left, xsize, ysize }
	}

	/// `top + ysize` and `left + xsize`, i.e. the exclusive bottom-right corner.
	#[must_use]
	pub fn bottom(&self) -> i64 {
		self.top + i64::from(self.ysize)
	}

	#[must_use]
	pub fn right(&self) -> i64 {
		self.left + i64::from(self.xsize)
	}

	#[must_use]
	pub fn shape(&self) -> (u32, u32) {
		(self.ysize, self.xsize)
	}

	/// Clips this rectangle against the valid pixel domain `[0, ncols] x [0, nrows]`, returning
	/// `None` if the clipped rectangle has zero area.
	#[must_use]
	pub fn clip_to_domain(&self, ncols: u32, nrows: u32) -> Option<BlockSpec> {
		let left1 = self.left.max(0);
		let top1 = self.top.max(0);
		let right1 = self.right().min(i64::from(ncols));
		let bottom1 = self.bottom().min(i64::from(nrows));
		if right1 <= left1 || bottom1 <= top1 {
			return None;
		}
		Some(BlockSpec::new(top1, left1, (right1 - left1) as u32, (bottom1 - top1) as u32))
	}

	/// Offset of this (clipped) rectangle's origin within the unclipped rectangle `outer`, i.e.
	/// `(row_offset, col_offset)` where padding should start.
	#[must_use]
	pub fn offset_within(&self, outer: &BlockSpec) -> (u32, u32) {
		let row_offset = (self.top - outer.top).max(0) as u32;
		let col_offset = (self.left - outer.left).max(0) as u32;
		(row_offset, col_offset)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;
	use rstest::rstest;

	#[rstest]
	#[case::fully_inside(BlockSpec::new(10, 10, 50, 50), Some(BlockSpec::new(10, 10, 50, 50)))]
	#[case::negative_origin(BlockSpec::new(-5, -5, 20, 20), Some(BlockSpec::new(0, 0, 15, 15)))]
	#[case::past_far_edge(BlockSpec::new(90, 90, 20, 20), Some(BlockSpec::new(90, 90, 10, 10)))]
	#[case::entirely_outside(BlockSpec::new(200, 200, 10, 10), None)]
	fn clip_to_domain_matches_expected(#[case] block: BlockSpec, #[case] expected: Option<BlockSpec>) {
		assert_eq!(block.clip_to_domain(100, 100), expected);
	}

	#[test]
	fn offset_within_negative_origin() {
		let outer = BlockSpec::new(-5, -5, 20, 20);
		let inner = outer.clip_to_domain(100, 100).unwrap();
		assert_eq!(inner.offset_within(&outer), (5, 5));
	}

	#[test]
	fn offset_within_fully_inside_is_zero() {
		let outer = BlockSpec::new(10, 10, 20, 20);
		let inner = outer.clip_to_domain(100, 100).unwrap();
		assert_eq!(inner.offset_within(&outer), (0, 0));
	}
}
