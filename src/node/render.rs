use super::error::*;
use super::{Boundary, Content, QuadtreeNode, Rgb};

/// Rebuilds a tree from decoded subdivision flags and leaf colors.
///
/// Both sequences are read through cursors, so the same decoded data can be
/// rebuilt again without decoding it twice.
#[derive(Debug)]
pub struct Rebuilder<'a> {
	flags: std::slice::Iter<'a, bool>,
	colors: std::slice::Iter<'a, Rgb>,
}

impl<'a> Rebuilder<'a> {
	pub fn new(flags: &'a [bool], colors: &'a [Rgb]) -> Self {
		Rebuilder { flags: flags.iter(), colors: colors.iter() }
	}

	/// Consumes one flag for the node covering `boundary`; a set flag splits
	/// the region exactly as tree construction does and recurses into the
	/// quadrants in north-west, north-east, south-west, south-east order,
	/// an unset one consumes one color and makes a leaf.
	pub fn reconstruct_tree(&mut self, boundary: Boundary) -> Result<QuadtreeNode> {
		let subdivided = *self.flags.next()
			.ok_or(Error::StructuralMismatch("flags ran out before the tree was complete"))?;
		if !subdivided {
			let color = *self.colors.next()
				.ok_or(Error::StructuralMismatch("leaf colors ran out before the tree was complete"))?;
			return Ok(QuadtreeNode::leaf(boundary, color));
		}
		let [nw, ne, sw, se] = boundary.quadrants()
			.ok_or(Error::StructuralMismatch("subdivision flag on a region one pixel wide or tall"))?;
		let sections = [
			self.reconstruct_tree(nw)?,
			self.reconstruct_tree(ne)?,
			self.reconstruct_tree(sw)?,
			self.reconstruct_tree(se)?,
		];
		Ok(QuadtreeNode { boundary, error: 0, content: Content::Sections(Box::new(sections)) })
	}

	/// Whether every flag and every color has been used.
	pub fn is_exhausted(&self) -> bool {
		self.flags.len() == 0 && self.colors.len() == 0
	}

	/// Rebuilds the tree for a whole `width` by `height` image, failing if
	/// any flags or colors are left over.
	pub fn rebuild(flags: &'a [bool], colors: &'a [Rgb], width: u32, height: u32) -> Result<QuadtreeNode> {
		if width == 0 || height == 0 {
			return Err(Error::InvalidDimensions { width, height });
		}
		let mut rebuilder = Rebuilder::new(flags, colors);
		let root = rebuilder.reconstruct_tree(Boundary::whole(width, height))?;
		if rebuilder.flags.len() > 0 {
			return Err(Error::StructuralMismatch("flags left over after the tree was complete"));
		}
		if rebuilder.colors.len() > 0 {
			return Err(Error::StructuralMismatch("leaf colors left over after the tree was complete"));
		}
		Ok(root)
	}
}

impl QuadtreeNode {
	/// Paints every leaf's color over its region of `img`.
	///
	/// Leaves never overlap, so the visiting order doesn't matter. The tree
	/// must fit inside the image.
	pub fn to_image(&self, img: &mut image::RgbImage) {
		match &self.content {
			Content::Leaf(color) => {
				for (x, y) in self.boundary.coords() {
					img.put_pixel(x, y, *color);
				}
			}
			Content::Sections(sects) => sects.iter().for_each(|s| s.to_image(img)),
		}
	}

	/// Renders the tree into a new image of the root's size.
	pub fn render(&self) -> image::RgbImage {
		let mut img = image::RgbImage::new(self.boundary.x_max + 1, self.boundary.y_max + 1);
		self.to_image(&mut img);
		img
	}
}
