//! Adapters between files on disk and the in-memory image and byte forms.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::node::Result;

/// Opens any image format `image` understands, as 8-bit RGB.
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<image::RgbImage> {
	Ok(image::open(path)?.into_rgb8())
}

/// Saves an image, with the format chosen by the file extension.
pub fn save_image<P: AsRef<Path>>(img: &image::RgbImage, path: P) -> Result<()> {
	img.save(path)?;
	Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
	let mut name = std::ffi::OsString::from(".");
	name.push(path.file_name().unwrap_or_else(|| std::ffi::OsStr::new("out")));
	name.push(".tmp");
	path.with_file_name(name)
}

/// Writes `data` to `path` so that `path` never holds a partial write.
///
/// The data goes to a sibling temporary file that is renamed over `path`
/// once it is complete.
pub fn write_atomic<P: AsRef<Path>>(path: P, data: &[u8]) -> Result<()> {
	let path = path.as_ref();
	let tmp = temp_path(path);
	let written = File::create(&tmp).and_then(|mut f| {
		f.write_all(data)?;
		f.sync_all()
	}).and_then(|_| fs::rename(&tmp, path));
	if written.is_err() {
		let _ = fs::remove_file(&tmp);
	}
	Ok(written?)
}

/// Compresses the image at `input` into `output`.
pub fn compress_file<P: AsRef<Path>, Q: AsRef<Path>>(
	input: P,
	output: Q,
	params: &crate::BuildParams
) -> Result<usize> {
	let pixels = load_image(input)?;
	let data = crate::compress_to_vec(&pixels, params)?;
	write_atomic(output, &data)?;
	Ok(data.len())
}

/// Decompresses the data at `input` into an image file at `output`.
pub fn decompress_file<P: AsRef<Path>, Q: AsRef<Path>>(input: P, output: Q) -> Result<image::RgbImage> {
	let data = fs::read(input)?;
	let img = crate::decompress_bytes(&data)?;
	save_image(&img, output)?;
	Ok(img)
}

#[cfg(test)]
mod test {
	use super::*;

	fn scratch(name: &str) -> PathBuf {
		let dir = std::env::temp_dir().join(format!("quadtree_compress_{}_{}", name, std::process::id()));
		fs::create_dir_all(&dir).unwrap();
		dir
	}

	#[test]
	fn atomic_write_replaces_and_cleans_up() {
		let dir = scratch("atomic");
		let out = dir.join("tree.qtc");
		write_atomic(&out, b"first").unwrap();
		write_atomic(&out, b"second").unwrap();
		assert_eq!(fs::read(&out).unwrap(), b"second");
		assert!(!temp_path(&out).exists());
		fs::remove_dir_all(&dir).unwrap();
	}

	#[test]
	fn atomic_write_into_missing_dir_fails() {
		let dir = scratch("missing");
		let out = dir.join("absent").join("tree.qtc");
		assert!(matches!(write_atomic(&out, b"x"), Err(crate::Error::Io(_))));
		assert!(!out.exists());
		fs::remove_dir_all(&dir).unwrap();
	}

	#[test]
	fn png_round_trip_through_files() {
		let dir = scratch("files");
		let src = dir.join("src.png");
		let packed = dir.join("src.qtc");
		let dst = dir.join("dst.png");
		let img = image::RgbImage::from_pixel(9, 6, image::Rgb([40, 80, 120]));
		save_image(&img, &src).unwrap();
		let size = compress_file(&src, &packed, &crate::BuildParams::default()).unwrap();
		assert_eq!(size as u64, fs::metadata(&packed).unwrap().len());
		let out = decompress_file(&packed, &dst).unwrap();
		assert_eq!(out, img);
		assert_eq!(load_image(&dst).unwrap(), img);
		fs::remove_dir_all(&dir).unwrap();
	}
}
