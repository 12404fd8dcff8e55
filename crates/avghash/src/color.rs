//! In-place color reduction: grayscale and black/white.

use crate::image::ImageBuffer;

/// Rec. 709 luma coefficients.
const LUMA_RED: f64 = 0.2126;
const LUMA_GREEN: f64 = 0.7152;
const LUMA_BLUE: f64 = 0.0722;

/// Gray levels above this become white, the rest black.
pub const BW_THRESHOLD: u8 = 127;

#[inline]
fn intensity(r: u8, g: u8, b: u8) -> u8 {
    (LUMA_RED * r as f64 + LUMA_GREEN * g as f64 + LUMA_BLUE * b as f64) as u8
}

/// Replace every pixel by its luma, written to all three channels.
///
/// The weighted sum is truncated, so converting an already gray image can
/// lower some levels by one.
pub fn to_grayscale(image: &mut ImageBuffer) {
    let (red, green, blue) = image.channels_mut();
    for ((r, g), b) in red.iter_mut().zip(green.iter_mut()).zip(blue.iter_mut()) {
        let v = intensity(*r, *g, *b);
        *r = v;
        *g = v;
        *b = v;
    }
}

/// Convert to grayscale, then threshold every pixel to 0 or 255.
pub fn to_black_and_white(image: &mut ImageBuffer) {
    to_grayscale(image);

    let (red, green, blue) = image.channels_mut();
    for ((r, g), b) in red.iter_mut().zip(green.iter_mut()).zip(blue.iter_mut()) {
        let v = if *r > BW_THRESHOLD { u8::MAX } else { 0 };
        *r = v;
        *g = v;
        *b = v;
    }
}
