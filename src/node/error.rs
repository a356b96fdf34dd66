use thiserror::Error;

/// Reason why an image couldn't be compressed, or compressed data couldn't
/// be turned back into an image.
#[derive(Error, Debug)]
pub enum Error {
	/// A header field is out of range: the width or height is not positive,
	/// or the flag count is negative.
	#[error("malformed header: {field} = {value}")]
	MalformedHeader { field: &'static str, value: i64 },

	/// The decoded image would need more pixels than decoding will allocate.
	#[error("image of {pixels} pixels exceeds the limit of {limit}")]
	LimitExceeded { pixels: u64, limit: u64 },

	/// The data ended before a declared field could be read.
	#[error("truncated input: needed {needed} bytes, {available} available")]
	TruncatedInput { needed: usize, available: usize },

	/// The subdivision flags and leaf colors don't describe a complete tree.
	#[error("structural mismatch: {0}")]
	StructuralMismatch(&'static str),

	/// The source image is empty or has sides too long for the header.
	#[error("invalid image dimensions: {width}x{height}")]
	InvalidDimensions { width: u32, height: u32 },

	/// The byte sink or source failed.
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	/// An image file couldn't be opened or saved.
	#[error("image error: {0}")]
	Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, Error>;
