pub mod boundary;
pub mod error;
pub mod qti;
pub mod render;

pub use boundary::Boundary;
pub use error::{Error, Result};

use std::fmt::Write;

pub type Rgb = image::Rgb<u8>;

/// Tuning for tree construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BuildParams {
	/// Nodes at this depth become leaves regardless of their error.
	pub max_depth: u32,
	/// Regions with an error score at or below this become leaves.
	pub error_threshold: u64,
}

impl Default for BuildParams {
	fn default() -> Self {
		BuildParams { max_depth: 100, error_threshold: 100 }
	}
}

/// What a node holds: one color for its whole region (leaf node), or four
/// subnodes (branch node) ordered north-west, north-east, south-west,
/// south-east.
#[derive(Clone, Debug, PartialEq)]
pub enum Content {
	Leaf(Rgb),
	Sections(Box<[QuadtreeNode; 4]>),
}

/// Node in a quadtree for storing an image.
#[derive(Clone, Debug, PartialEq)]
pub struct QuadtreeNode {
	pub boundary: Boundary,
	/// Color spread score computed while building. Always 0 for decoded trees.
	pub error: u64,
	pub content: Content,
}

/// A tree flattened in pre-order: one subdivision flag per node, and the
/// leaves in the order they were met.
#[derive(Debug)]
pub struct Linearized<'a> {
	pub flags: Vec<bool>,
	pub leaves: Vec<&'a QuadtreeNode>,
}

impl Linearized<'_> {
	pub fn colors(&self) -> impl Iterator<Item = Rgb> + '_ {
		self.leaves.iter().filter_map(|n| n.color())
	}
}

/// Per-channel integer mean over a region, truncating.
fn region_mean(pixels: &image::RgbImage, boundary: &Boundary) -> [u64; 3] {
	let mut sum = [0u64; 3];
	for (x, y) in boundary.coords() {
		let p = pixels.get_pixel(x, y);
		for c in 0..3 {
			sum[c] += p.0[c] as u64;
		}
	}
	let count = boundary.pixel_count();
	[sum[0] / count, sum[1] / count, sum[2] / count]
}

/// Sum of the per-channel sample standard deviations, scaled by the number
/// of pixels in the region.
///
/// Squared deviations leave out the region's last column and last row, while
/// the `n - 1` denominator and the scale use the full pixel count. Existing
/// thresholds are tuned against exactly this score.
fn region_error(pixels: &image::RgbImage, boundary: &Boundary, mean: &[u64; 3]) -> u64 {
	let count = boundary.pixel_count();
	if count < 2 {
		return 0;
	}
	let mut squares = [0f64; 3];
	for x in boundary.x_min..boundary.x_max {
		for y in boundary.y_min..boundary.y_max {
			let p = pixels.get_pixel(x, y);
			for c in 0..3 {
				let d = p.0[c] as f64 - mean[c] as f64;
				squares[c] += d * d;
			}
		}
	}
	let std_sum: f64 = squares.iter()
		.map(|s| (s / (count - 1) as f64).sqrt())
		.sum();
	(std_sum * count as f64) as u64
}

impl QuadtreeNode {
	pub fn leaf(boundary: Boundary, color: Rgb) -> Self {
		QuadtreeNode { boundary, error: 0, content: Content::Leaf(color) }
	}

	/// Decomposes an image into a quadtree whose root covers the whole image.
	///
	/// A region becomes a leaf colored with its mean when it is one pixel
	/// wide or tall, when its error score is at most `error_threshold`, or
	/// when it sits at `max_depth`. Otherwise it is split into quadrants and
	/// each is decomposed in turn.
	pub fn build(pixels: &image::RgbImage, params: &BuildParams) -> Result<Self> {
		let (width, height) = pixels.dimensions();
		if width == 0 || height == 0 {
			return Err(Error::InvalidDimensions { width, height });
		}
		let root = Self::grow(pixels, Boundary::whole(width, height), 0, params);
		log::debug!("built quadtree for {}x{} image: {} nodes, {} leaves, depth {}",
			width, height, root.node_count(), root.leaf_count(), root.depth());
		Ok(root)
	}

	fn grow(pixels: &image::RgbImage, boundary: Boundary, depth: u32, params: &BuildParams) -> Self {
		let mean = region_mean(pixels, &boundary);
		let error = region_error(pixels, &boundary, &mean);
		let quads = match boundary.quadrants() {
			Some(q) if error > params.error_threshold && depth < params.max_depth => q,
			_ => {
				let color = image::Rgb([mean[0] as u8, mean[1] as u8, mean[2] as u8]);
				return QuadtreeNode { boundary, error, content: Content::Leaf(color) };
			}
		};
		let sections = quads.map(|q| Self::grow(pixels, q, depth + 1, params));
		QuadtreeNode { boundary, error, content: Content::Sections(Box::new(sections)) }
	}

	pub fn is_subdivided(&self) -> bool {
		matches!(self.content, Content::Sections(_))
	}

	pub fn color(&self) -> Option<Rgb> {
		match self.content {
			Content::Leaf(c) => Some(c),
			Content::Sections(_) => None,
		}
	}

	pub fn sections(&self) -> Option<&[QuadtreeNode; 4]> {
		match &self.content {
			Content::Leaf(_) => None,
			Content::Sections(s) => Some(s),
		}
	}

	pub fn leaf_count(&self) -> usize {
		match self.sections() {
			None => 1,
			Some(s) => s.iter().map(QuadtreeNode::leaf_count).sum(),
		}
	}

	pub fn node_count(&self) -> usize {
		1 + self.sections().map_or(0, |s| s.iter().map(QuadtreeNode::node_count).sum())
	}

	/// Number of edges on the longest path down to a leaf.
	pub fn depth(&self) -> usize {
		self.sections().map_or(0, |s| 1 + s.iter().map(QuadtreeNode::depth).max().unwrap_or(0))
	}

	/// Flattens the tree in pre-order (north-west, north-east, south-west,
	/// south-east): every node contributes its subdivision flag, and leaves
	/// are collected in the order they are visited.
	pub fn linearize(&self) -> Linearized<'_> {
		let mut out = Linearized { flags: Vec::new(), leaves: Vec::new() };
		self.linearize_into(&mut out);
		out
	}

	fn linearize_into<'a>(&'a self, out: &mut Linearized<'a>) {
		out.flags.push(self.is_subdivided());
		match self.sections() {
			Some(sects) => sects.iter().for_each(|s| s.linearize_into(out)),
			None => out.leaves.push(self),
		}
	}

	/// Renders the tree as text, one node per line, indented by depth.
	pub fn dump(&self) -> String {
		let mut out = String::new();
		self.dump_into(0, &mut out);
		out
	}

	fn dump_into(&self, depth: usize, out: &mut String) {
		let indent = depth * 2;
		// Writing to a `String` can't fail.
		let _ = match self.color() {
			Some(c) => writeln!(out, "{:indent$}leaf {} error {} rgb({}, {}, {})",
				"", self.boundary, self.error, c.0[0], c.0[1], c.0[2], indent = indent),
			None => writeln!(out, "{:indent$}branch {} error {}",
				"", self.boundary, self.error, indent = indent),
		};
		if let Some(sects) = self.sections() {
			sects.iter().for_each(|s| s.dump_into(depth + 1, out));
		}
	}
}

#[cfg(test)]
mod test {
	use super::*;

	fn two_tone() -> image::RgbImage {
		let mut img = image::RgbImage::new(2, 2);
		img.put_pixel(0, 0, image::Rgb([10, 10, 10]));
		img.put_pixel(1, 0, image::Rgb([10, 10, 10]));
		img.put_pixel(0, 1, image::Rgb([250, 250, 250]));
		img.put_pixel(1, 1, image::Rgb([250, 250, 250]));
		img
	}

	fn assert_partitions(node: &QuadtreeNode) {
		if let Some(sects) = node.sections() {
			let total: u64 = sects.iter().map(|s| s.boundary.pixel_count()).sum();
			assert_eq!(total, node.boundary.pixel_count());
			for (x, y) in node.boundary.coords() {
				assert_eq!(sects.iter().filter(|s| s.boundary.in_range(x, y)).count(), 1);
			}
			sects.iter().for_each(assert_partitions);
		}
	}

	#[test]
	fn uniform_image_is_one_leaf() {
		let img = image::RgbImage::from_pixel(37, 21, image::Rgb([1, 2, 3]));
		let params = BuildParams { max_depth: 100, error_threshold: 0 };
		let tree = QuadtreeNode::build(&img, &params).unwrap();
		assert_eq!(tree.color(), Some(image::Rgb([1, 2, 3])));
		assert_eq!(tree.error, 0);
	}

	#[test]
	fn two_tone_splits_into_pixels() {
		let params = BuildParams { max_depth: 1, error_threshold: 0 };
		let tree = QuadtreeNode::build(&two_tone(), &params).unwrap();
		let lin = tree.linearize();
		assert_eq!(lin.flags, vec![true, false, false, false, false]);
		let colors: Vec<_> = lin.colors().map(|c| c.0[0]).collect();
		assert_eq!(colors, vec![10, 10, 250, 250]);
		assert_eq!(tree.depth(), 1);
	}

	#[test]
	fn max_depth_zero_gives_mean_leaf() {
		let params = BuildParams { max_depth: 0, error_threshold: 0 };
		let tree = QuadtreeNode::build(&two_tone(), &params).unwrap();
		assert_eq!(tree.color(), Some(image::Rgb([130, 130, 130])));
		assert!(tree.error > 0);
	}

	#[test]
	fn error_scales_with_region_size() {
		let img = two_tone();
		let b = Boundary::whole(2, 2);
		let mean = region_mean(&img, &b);
		// Only (0, 0) is summed: 120^2 per channel, sample std = sqrt(14400/3).
		let expected = ((14400f64 / 3.).sqrt() * 3. * 4.) as u64;
		assert_eq!(region_error(&img, &b, &mean), expected);
	}

	#[test]
	fn error_skips_last_row_and_column() {
		let mut img = image::RgbImage::new(2, 2);
		img.put_pixel(1, 1, image::Rgb([255, 255, 255]));
		let b = Boundary::whole(2, 2);
		let mean = region_mean(&img, &b);
		assert_eq!(mean, [63, 63, 63]);
		// (0 - 63)^2 = 3969 per channel, sqrt(3969 / 3) * 3 channels * 4 pixels.
		assert_eq!(region_error(&img, &b, &mean), 436);

		let calm = QuadtreeNode::build(&img, &BuildParams { max_depth: 100, error_threshold: 1000 }).unwrap();
		assert_eq!(calm.color(), Some(image::Rgb([63, 63, 63])));
		let busy = QuadtreeNode::build(&img, &BuildParams { max_depth: 100, error_threshold: 400 }).unwrap();
		assert!(busy.is_subdivided());
	}

	#[test]
	fn flags_match_leaves_and_children_partition() {
		let mut img = image::RgbImage::new(13, 10);
		for (x, y, p) in img.enumerate_pixels_mut() {
			*p = image::Rgb([(x * 19) as u8, (y * 23) as u8, ((x ^ y) * 7) as u8]);
		}
		let tree = QuadtreeNode::build(&img, &BuildParams { max_depth: 8, error_threshold: 50 }).unwrap();
		assert_partitions(&tree);
		let lin = tree.linearize();
		assert_eq!(lin.flags.iter().filter(|f| !**f).count(), lin.leaves.len());
		assert_eq!(lin.flags.len(), tree.node_count());
		assert_eq!(lin.leaves.len(), tree.leaf_count());
	}

	#[test]
	fn empty_image_is_rejected() {
		let img = image::RgbImage::new(0, 4);
		assert!(matches!(
			QuadtreeNode::build(&img, &BuildParams::default()),
			Err(Error::InvalidDimensions { width: 0, height: 4 })
		));
	}

	#[test]
	fn dump_lists_every_node() {
		let params = BuildParams { max_depth: 1, error_threshold: 0 };
		let tree = QuadtreeNode::build(&two_tone(), &params).unwrap();
		let dump = tree.dump();
		assert_eq!(dump.lines().count(), 5);
		assert!(dump.starts_with("branch [x 0..=1, y 0..=1]"));
		assert!(dump.contains("  leaf [x 1..=1, y 1..=1] error 0 rgb(250, 250, 250)"));
	}
}
