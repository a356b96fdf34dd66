//! Binary layout of a compressed image.
//!
//! ```text
//! i32 BE   width
//! i32 BE   height
//! i32 BE   flag count
//! u8 * ceil(flag count / 8)   subdivision flags, LSB first
//! u8 * 3 * leaf count         leaf colors (r, g, b) in pre-order
//! ```
//!
//! The leaf count isn't stored; it's the number of unset flags.

use bitvec::prelude::*;
use lebe::prelude::*;

use super::error::*;
use super::{QuadtreeNode, Rgb};

/// A `BitVec` variant matching the on-disk flag packing.
type FlagBitVec = BitVec<u8, Lsb0>;

/// Largest image, in pixels, that decoding will allocate: 512 MiB of RGB,
/// the same allocation budget `image::Limits` uses by default.
pub const MAX_PIXELS: u64 = 512 * 1024 * 1024 / 3;

fn header_field(value: usize, field: &'static str) -> Result<i32> {
	use std::convert::TryFrom;
	i32::try_from(value).map_err(|_| Error::MalformedHeader { field, value: value as i64 })
}

/// Serializes image dimensions, subdivision flags and leaf colors.
///
/// `leaves` must all be leaf nodes, in the order `flags` visits them.
pub fn encode(width: u32, height: u32, flags: &[bool], leaves: &[&QuadtreeNode]) -> Result<Vec<u8>> {
	if width == 0 || height == 0 || width > i32::MAX as u32 || height > i32::MAX as u32 {
		return Err(Error::InvalidDimensions { width, height });
	}
	let flag_count = header_field(flags.len(), "flag count")?;

	let mut ret = Vec::with_capacity(12 + (flags.len() + 7) / 8 + leaves.len() * 3);
	ret.write_as_big_endian(&(width as i32))?;
	ret.write_as_big_endian(&(height as i32))?;
	ret.write_as_big_endian(&flag_count)?;

	let mut bits: FlagBitVec = flags.iter().copied().collect();
	bits.set_uninitialized(false);
	ret.extend_from_slice(bits.as_raw_slice());

	for leaf in leaves {
		let color = leaf.color()
			.ok_or(Error::StructuralMismatch("branch node in leaf list"))?;
		ret.extend_from_slice(&color.0);
	}
	Ok(ret)
}

/// Subdivision flags read back from the bitmap.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedFlags {
	pub flags: Vec<bool>,
	/// How many flags are unset, which is how many leaf colors follow.
	pub false_count: usize,
}

/// Everything stored in a compressed image.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
	pub width: u32,
	pub height: u32,
	pub flags: Vec<bool>,
	pub colors: Vec<Rgb>,
}

/// Sequential reader over compressed data.
#[derive(Debug)]
pub struct Decoder<'a> {
	source: &'a [u8],
}

impl<'a> Decoder<'a> {
	pub fn new(source: &'a [u8]) -> Self {
		Decoder { source }
	}

	/// Bytes not yet consumed.
	pub fn remaining(&self) -> usize {
		self.source.len()
	}

	fn take(&mut self, count: usize) -> Result<&'a [u8]> {
		if self.source.len() < count {
			return Err(Error::TruncatedInput { needed: count, available: self.source.len() });
		}
		let (head, tail) = self.source.split_at(count);
		self.source = tail;
		Ok(head)
	}

	fn read_i32(&mut self) -> Result<i32> {
		let mut bytes = self.take(4)?;
		Ok(i32::read_from_big_endian(&mut bytes)?)
	}

	/// Reads the image width and height.
	pub fn read_header(&mut self) -> Result<(u32, u32)> {
		let width = self.read_i32()?;
		let height = self.read_i32()?;
		if width <= 0 {
			return Err(Error::MalformedHeader { field: "width", value: width as i64 });
		}
		if height <= 0 {
			return Err(Error::MalformedHeader { field: "height", value: height as i64 });
		}
		let pixels = width as u64 * height as u64;
		if pixels > MAX_PIXELS {
			return Err(Error::LimitExceeded { pixels, limit: MAX_PIXELS });
		}
		Ok((width as u32, height as u32))
	}

	/// Reads the flag count and unpacks that many flags.
	pub fn read_flags(&mut self) -> Result<DecodedFlags> {
		let count = self.read_i32()?;
		if count < 0 {
			return Err(Error::MalformedHeader { field: "flag count", value: count as i64 });
		}
		let count = count as usize;
		let bytes = self.take((count + 7) / 8)?;
		let flags: Vec<bool> = bytes.view_bits::<Lsb0>()[..count].iter().by_vals().collect();
		let false_count = flags.iter().filter(|f| !**f).count();
		Ok(DecodedFlags { flags, false_count })
	}

	/// Reads `count` leaf colors.
	pub fn read_colors(&mut self, count: usize) -> Result<Vec<Rgb>> {
		let needed = count.checked_mul(3)
			.ok_or(Error::TruncatedInput { needed: usize::MAX, available: self.source.len() })?;
		let bytes = self.take(needed)?;
		Ok(bytes.chunks_exact(3).map(|c| image::Rgb([c[0], c[1], c[2]])).collect())
	}
}

/// Reads a whole compressed image.
///
/// Trailing bytes after the last leaf color are ignored.
pub fn decode(source: &[u8]) -> Result<Decoded> {
	let mut decoder = Decoder::new(source);
	let (width, height) = decoder.read_header()?;
	let DecodedFlags { flags, false_count } = decoder.read_flags()?;
	let colors = decoder.read_colors(false_count)?;
	if decoder.remaining() > 0 {
		log::warn!("ignoring {} trailing bytes after leaf colors", decoder.remaining());
	}
	log::debug!("decoded {}x{} header, {} flags, {} leaves", width, height, flags.len(), colors.len());
	Ok(Decoded { width, height, flags, colors })
}
