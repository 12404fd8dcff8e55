//! Perceptual similarity for 24-bit bitmaps.
//!
//! Decode a BMP into a planar [`ImageBuffer`], reduce it to an 8x8 black and
//! white thumbnail and pack that into a 64-bit [`Fingerprint`]. Two images are
//! similar when their fingerprints differ in at most a handful of bits.
//!
//! ```no_run
//! let first = avghash::load("first.bmp")?;
//! let second = avghash::load("second.bmp")?;
//! let a = avghash::compute_fingerprint(&first)?;
//! let b = avghash::compute_fingerprint(&second)?;
//! if avghash::compare_fingerprints(a, b, avghash::DEFAULT_SIMILARITY_THRESHOLD) {
//!     println!("similar");
//! }
//! # Ok::<(), avghash::Error>(())
//! ```

pub mod bmp;
pub mod color;
pub mod error;
pub mod hash;
pub mod image;
pub mod resize;

pub use bmp::{load, save};
pub use error::{Error, ErrorKind, FormatError, Result};
pub use hash::{DEFAULT_SIMILARITY_THRESHOLD, Fingerprint, average_hash, hamming_distance};
pub use self::image::{ImageBuffer, Rgb};
pub use resize::{resize, resize_scalar};

/// Fingerprint an image with the average hash.
pub fn compute_fingerprint(image: &ImageBuffer) -> Result<Fingerprint> {
    average_hash(image)
}

/// Whether two fingerprints differ in at most `threshold` bits.
pub fn compare_fingerprints(a: Fingerprint, b: Fingerprint, threshold: u32) -> bool {
    a.is_similar(b, threshold)
}
