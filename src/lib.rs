//! Lossy image compression by adaptive quadtree decomposition.
//!
//! Regions of an image with little color variance are stored as a single
//! color; busier regions are split into quadrants until they are calm
//! enough, small enough or deep enough. The tree is stored as a bitmap of
//! subdivision flags followed by the leaf colors (see [`node::qti`]).

pub mod file;
pub mod node;

pub use node::*;

use std::io::{Read, Write};

/// Serializes an already built tree; the root's boundary gives the image
/// dimensions.
pub fn encode_tree(tree: &QuadtreeNode) -> Result<Vec<u8>> {
	let lin = tree.linearize();
	qti::encode(tree.boundary.x_max + 1, tree.boundary.y_max + 1, &lin.flags, &lin.leaves)
}

/// Compresses an image into a new buffer.
pub fn compress_to_vec(pixels: &image::RgbImage, params: &BuildParams) -> Result<Vec<u8>> {
	encode_tree(&QuadtreeNode::build(pixels, params)?)
}

/// Compresses an image with the default [`BuildParams`] and writes it to
/// `sink`.
pub fn compress<W: Write>(pixels: &image::RgbImage, sink: &mut W) -> Result<()> {
	compress_with(pixels, &BuildParams::default(), sink)
}

/// Compresses an image and writes it to `sink`.
///
/// Nothing reaches `sink` unless encoding succeeds; the encoded data is then
/// written with a single `write_all` and flushed.
pub fn compress_with<W: Write>(pixels: &image::RgbImage, params: &BuildParams, sink: &mut W) -> Result<()> {
	let bytes = compress_to_vec(pixels, params)?;
	sink.write_all(&bytes)?;
	sink.flush()?;
	Ok(())
}

/// Decompresses an image held in memory.
pub fn decompress_bytes(source: &[u8]) -> Result<image::RgbImage> {
	let decoded = qti::decode(source)?;
	let tree = render::Rebuilder::rebuild(&decoded.flags, &decoded.colors, decoded.width, decoded.height)?;
	let mut img = image::RgbImage::new(decoded.width, decoded.height);
	tree.to_image(&mut img);
	Ok(img)
}

/// Reads all of `source` and decompresses it.
pub fn decompress<R: Read>(source: &mut R) -> Result<image::RgbImage> {
	let mut data = Vec::new();
	source.read_to_end(&mut data)?;
	decompress_bytes(&data)
}
