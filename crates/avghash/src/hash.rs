//! Average hash fingerprints and their comparison.
//!
//! The average hash algorithm:
//! 1. Resize the image to 8x8 (bilinear)
//! 2. Convert to grayscale, then to black and white
//! 3. Set bit `row * 8 + col` for every white pixel

use crate::color::{to_black_and_white, to_grayscale};
use crate::error::Result;
use crate::image::ImageBuffer;
use crate::resize::resize;
use std::fmt;
use tracing::debug;

/// Side of the reduced image the hash is built from.
pub const HASH_DIM: usize = 8;

/// Maximum Hamming distance at which two fingerprints count as similar.
pub const DEFAULT_SIMILARITY_THRESHOLD: u32 = 3;

/// 64-bit average hash. Bit `row * 8 + col` belongs to pixel `(row, col)`
/// of the 8x8 reduced image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Fingerprint(pub u64);

impl Fingerprint {
    pub fn bits(self) -> u64 {
        self.0
    }

    /// Whether the pixel at `(row, col)` of the reduced image was white.
    pub fn bit(self, row: usize, col: usize) -> bool {
        debug_assert!(row < HASH_DIM && col < HASH_DIM);
        (self.0 >> (row * HASH_DIM + col)) & 1 == 1
    }

    pub fn hamming_distance(self, other: Fingerprint) -> u32 {
        hamming_distance(self.0, other.0)
    }

    pub fn is_similar(self, other: Fingerprint, threshold: u32) -> bool {
        self.hamming_distance(other) <= threshold
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}

impl From<Fingerprint> for u64 {
    fn from(fp: Fingerprint) -> u64 {
        fp.0
    }
}

/// Compute the average hash of `image`.
pub fn average_hash(image: &ImageBuffer) -> Result<Fingerprint> {
    let mut reduced = resize(image, HASH_DIM, HASH_DIM)?;
    to_grayscale(&mut reduced);
    to_black_and_white(&mut reduced);

    let red = reduced.red();
    let mut hash = 0u64;
    for (row, line) in red.chunks_exact(HASH_DIM).enumerate() {
        let mut byte = 0u8;
        for (col, &v) in line.iter().enumerate() {
            byte |= u8::from(v != 0) << col;
        }
        hash |= u64::from(byte) << (row * 8);
    }

    let fp = Fingerprint(hash);
    debug!(
        "Average hash of {}x{} image: {}",
        image.width(),
        image.height(),
        fp
    );
    Ok(fp)
}

/// Compute Hamming distance between two hashes.
///
/// Returns the number of bits that differ between the two hashes.
pub fn hamming_distance(hash1: u64, hash2: u64) -> u32 {
    (hash1 ^ hash2).count_ones()
}
