use image::error::ImageError;

use quadtree_compress::{BuildParams, Error, QuadtreeNode};
use quadtree_compress::file;

/// Helper function for `main`.
fn error_exit(msg: &str, code: i32) -> ! {
	eprintln!("{}", msg);
	std::process::exit(code)
}

/// Message and exit code for a failed conversion.
fn describe(e: &Error) -> (&'static str, i32) {
	match e {
		Error::Image(ImageError::Decoding(_)) => ("Invalid image data", 4),
		Error::Image(ImageError::Limits(_)) => ("Computation limits exceeded", 5),
		Error::Image(ImageError::IoError(_)) | Error::Io(_) => ("File could not be read or written", 3),
		Error::Image(ImageError::Unsupported(_)) => ("Unsupported image format", 4),
		Error::LimitExceeded { .. } => ("Computation limits exceeded", 5),
		Error::InvalidDimensions { .. } => ("Input image has invalid dimensions", 4),
		Error::MalformedHeader { .. } |
		Error::TruncatedInput { .. } |
		Error::StructuralMismatch(_) => ("Invalid compressed data", 4),
		_ => ("An error occurred", 10)
	}
}

/// Replaces the extension of `input` for the default output path.
fn default_output(input: &str, ext: &str) -> String {
	input.rsplitn(2, '.').last().unwrap_or(input).to_string() + ext
}

/// `clap`-based CLI for compressing images into quadtrees and back.
///
/// May exit process with status code if there are errors:
///
/// 1: `clap` error
///
/// 2: invalid arguments
///
/// 3: file I/O issues
///
/// 4: invalid image or compressed data
///
/// 5: computation limits exceeded
///
/// 10: other, potentially unknown error
fn main() {
	env_logger::init();

	let clap_matches = clap::App::new("quadtree_compress")
		.version("0.1.0")
		.author("vkcz")
		.about("Compresses images into variance-driven quadtrees (QTC) and back.")
		.arg_from_usage("-i, --into 'Compress the input image into QTC'")
		.arg_from_usage("-f, --from 'Decompress the input QTC file into an image'")
		.arg_from_usage("-d, --depth=[N] 'Maximum tree depth (--into only); defaults to 100'")
		.arg_from_usage("-t, --threshold=[N] 'Error score at or below which a region stops splitting (--into only); defaults to 100'")
		.arg_from_usage("--dump 'Print the constructed tree (--into only)'")
		.arg_from_usage("<INPUT> 'Path to input file'")
		.arg_from_usage("[OUTPUT] 'Path to output file; defaults to INPUT with a modified file extension'")
		.get_matches();

	let (into, from) = (clap_matches.is_present("into"), clap_matches.is_present("from"));
	let input_path = match clap_matches.value_of("INPUT") {
		Some(p) => p,
		None => error_exit("Missing input path", 2)
	};
	match (into, from) {
		(true, true) => error_exit("Only one of -i/--into and -f/--from must be present", 2),
		(true, false) => {
			let defaults = BuildParams::default();
			let params = BuildParams {
				max_depth: match clap_matches.value_of("depth").map(str::parse::<u32>).unwrap_or(Ok(defaults.max_depth)) {
					Ok(n) => n,
					Err(_) => error_exit("Non-numeric value for depth", 2)
				},
				error_threshold: match clap_matches.value_of("threshold").map(str::parse::<u64>).unwrap_or(Ok(defaults.error_threshold)) {
					Ok(n) => n,
					Err(_) => error_exit("Non-numeric value for threshold", 2)
				},
			};
			let output_path = clap_matches.value_of("OUTPUT")
				.map(str::to_string)
				.unwrap_or_else(|| default_output(input_path, ".qtc"));
			let dump = clap_matches.is_present("dump");
			let written = file::load_image(input_path).and_then(|pixels| {
				let tree = QuadtreeNode::build(&pixels, &params)?;
				if dump {
					print!("{}", tree.dump());
				}
				let data = quadtree_compress::encode_tree(&tree)?;
				file::write_atomic(&output_path, &data)?;
				Ok(data.len())
			});
			match written {
				Ok(size) => log::info!("wrote {} bytes to {}", size, output_path),
				Err(e) => {
					log::debug!("compression failed: {}", e);
					let (msg, code) = describe(&e);
					error_exit(msg, code)
				}
			}
		},
		(false, true) => {
			let output_path = clap_matches.value_of("OUTPUT")
				.map(str::to_string)
				.unwrap_or_else(|| default_output(input_path, ".png"));
			match file::decompress_file(input_path, &output_path) {
				Ok(img) => log::info!("wrote {}x{} image to {}", img.width(), img.height(), output_path),
				Err(e) => {
					log::debug!("decompression failed: {}", e);
					let (msg, code) = describe(&e);
					error_exit(msg, code)
				}
			}
		},
		(false, false) => error_exit("One of -i/--into and -f/--from must be present", 2)
	}
}
