use std::fmt;

/// Axis-aligned rectangle of pixel coordinates, inclusive on all sides.
///
/// Callers must keep `x_min <= x_max` and `y_min <= y_max`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Boundary {
	pub x_min: u32,
	pub y_min: u32,
	pub x_max: u32,
	pub y_max: u32,
}

impl Boundary {
	pub fn new(x_min: u32, y_min: u32, x_max: u32, y_max: u32) -> Self {
		debug_assert!(x_min <= x_max && y_min <= y_max);
		Boundary { x_min, y_min, x_max, y_max }
	}

	/// The boundary covering a whole `width` by `height` image.
	///
	/// Both dimensions must be nonzero.
	pub fn whole(width: u32, height: u32) -> Self {
		Boundary::new(0, 0, width - 1, height - 1)
	}

	pub fn in_range(&self, x: u32, y: u32) -> bool {
		x >= self.x_min && x <= self.x_max && y >= self.y_min && y <= self.y_max
	}

	pub fn width(&self) -> u32 {
		self.x_max - self.x_min + 1
	}

	pub fn height(&self) -> u32 {
		self.y_max - self.y_min + 1
	}

	pub fn pixel_count(&self) -> u64 {
		self.width() as u64 * self.height() as u64
	}

	/// Splits the boundary into its north-west, north-east, south-west and
	/// south-east quadrants, in that order.
	///
	/// Halving uses integer division, so when a side is odd the south/east
	/// quadrants get the extra row or column. Returns `None` if the boundary
	/// is one pixel wide or tall.
	pub fn quadrants(&self) -> Option<[Boundary; 4]> {
		if self.width() == 1 || self.height() == 1 {
			return None;
		}
		let x_off = self.width() / 2;
		let y_off = self.height() / 2;
		let (x_mid, y_mid) = (self.x_min + x_off, self.y_min + y_off);
		Some([
			Boundary::new(self.x_min, self.y_min, x_mid - 1, y_mid - 1),
			Boundary::new(x_mid, self.y_min, self.x_max, y_mid - 1),
			Boundary::new(self.x_min, y_mid, x_mid - 1, self.y_max),
			Boundary::new(x_mid, y_mid, self.x_max, self.y_max),
		])
	}

	/// Every coordinate inside the boundary, column by column.
	pub fn coords(&self) -> impl Iterator<Item = (u32, u32)> {
		let (y_min, y_max) = (self.y_min, self.y_max);
		(self.x_min..=self.x_max).flat_map(move |x| (y_min..=y_max).map(move |y| (x, y)))
	}
}

impl fmt::Display for Boundary {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "[x {}..={}, y {}..={}]", self.x_min, self.x_max, self.y_min, self.y_max)
	}
}

#[cfg(test)]
mod test {
	use super::Boundary;

	#[test]
	fn in_range_is_inclusive() {
		let b = Boundary::new(2, 3, 5, 7);
		assert!(b.in_range(2, 3));
		assert!(b.in_range(5, 7));
		assert!(!b.in_range(1, 3));
		assert!(!b.in_range(5, 8));
		assert_eq!((b.width(), b.height()), (4, 5));
	}

	#[test]
	fn odd_quadrants_favour_south_east() {
		let quads = Boundary::whole(5, 3).quadrants().unwrap();
		assert_eq!(quads[0], Boundary::new(0, 0, 1, 0));
		assert_eq!(quads[1], Boundary::new(2, 0, 4, 0));
		assert_eq!(quads[2], Boundary::new(0, 1, 1, 2));
		assert_eq!(quads[3], Boundary::new(2, 1, 4, 2));
	}

	#[test]
	fn quadrants_partition_parent() {
		for &(w, h) in &[(2, 2), (3, 7), (16, 9), (31, 32)] {
			let parent = Boundary::whole(w, h);
			let quads = parent.quadrants().unwrap();
			assert_eq!(quads.iter().map(Boundary::pixel_count).sum::<u64>(), parent.pixel_count());
			for (x, y) in parent.coords() {
				assert_eq!(quads.iter().filter(|q| q.in_range(x, y)).count(), 1);
			}
		}
	}

	#[test]
	fn thin_boundaries_do_not_split() {
		assert!(Boundary::whole(1, 8).quadrants().is_none());
		assert!(Boundary::whole(8, 1).quadrants().is_none());
	}
}
