//! Bilinear resampling.
//!
//! The interpolation is written once, generically over [`Lanes`]: `f32` runs
//! one destination column at a time and `wide::f32x8` runs eight. Every lane
//! performs the same sequence of IEEE operations as the scalar path, so both
//! produce byte-identical images.

use crate::error::{FormatError, Result};
use crate::image::ImageBuffer;
use std::ops::{Add, Mul, Sub};
use tracing::debug;
use wide::f32x8;

const MAX_LANES: usize = 8;

/// A batch of `WIDTH` single-precision values processed together.
pub trait Lanes: Copy + Add<Output = Self> + Sub<Output = Self> + Mul<Output = Self> {
    const WIDTH: usize;

    fn splat(value: f32) -> Self;

    /// Build a batch from `f(lane)` for every lane.
    fn gather(f: impl FnMut(usize) -> f32) -> Self;

    /// Write the lanes to the front of `out`.
    fn store(self, out: &mut [f32]);
}

impl Lanes for f32 {
    const WIDTH: usize = 1;

    #[inline(always)]
    fn splat(value: f32) -> Self {
        value
    }

    #[inline(always)]
    fn gather(mut f: impl FnMut(usize) -> f32) -> Self {
        f(0)
    }

    #[inline(always)]
    fn store(self, out: &mut [f32]) {
        out[0] = self;
    }
}

impl Lanes for f32x8 {
    const WIDTH: usize = 8;

    #[inline(always)]
    fn splat(value: f32) -> Self {
        f32x8::splat(value)
    }

    #[inline(always)]
    fn gather(f: impl FnMut(usize) -> f32) -> Self {
        let lanes: [f32; 8] = std::array::from_fn(f);
        f32x8::from(lanes)
    }

    #[inline(always)]
    fn store(self, out: &mut [f32]) {
        let lanes: [f32; 8] = self.into();
        out[..8].copy_from_slice(&lanes);
    }
}

/// Base sample index and fractional offset for destination index `index`.
///
/// The base is clamped to `max_base` so the `+1` neighbour stays in bounds;
/// past the clamp the offset grows beyond 1 and the blend extrapolates.
#[inline(always)]
fn source_coord(index: usize, scale: f32, max_base: usize) -> (usize, f32) {
    let pos = index as f32 * scale;
    // pos is never negative, so truncation is floor
    let base = (pos as usize).min(max_base);
    (base, pos - base as f32)
}

struct Source<'a> {
    planes: [&'a [u8]; 3],
    width: usize,
    col_scale: f32,
}

#[derive(Clone, Copy)]
struct SourceRow {
    base: usize,
    delta: f32,
}

/// Interpolate `V::WIDTH` consecutive destination columns starting at
/// `first_col`, writing them at `dst_offset` in every output plane.
#[inline(always)]
fn interpolate_span<V: Lanes>(
    src: &Source<'_>,
    row: SourceRow,
    first_col: usize,
    dst: &mut [&mut [u8]; 3],
    dst_offset: usize,
) {
    debug_assert!(V::WIDTH <= MAX_LANES);

    let mut base = [0usize; MAX_LANES];
    let mut delta = [0f32; MAX_LANES];
    for (lane, (c, dc)) in base
        .iter_mut()
        .zip(delta.iter_mut())
        .take(V::WIDTH)
        .enumerate()
    {
        (*c, *dc) = source_coord(first_col + lane, src.col_scale, src.width - 2);
    }

    let one = V::splat(1.0);
    let dr = V::splat(row.delta);
    let dc = V::gather(|lane| delta[lane]);
    let one_minus_dr = one - dr;
    let one_minus_dc = one - dc;
    let w1 = one_minus_dr * one_minus_dc;
    let w2 = dr * one_minus_dc;
    let w3 = one_minus_dr * dc;
    let w4 = dr * dc;

    let top = row.base * src.width;
    let bottom = top + src.width;
    let mut values = [0f32; MAX_LANES];
    for (plane, out) in src.planes.iter().zip(dst.iter_mut()) {
        let s00 = V::gather(|lane| plane[top + base[lane]] as f32);
        let s10 = V::gather(|lane| plane[bottom + base[lane]] as f32);
        let s01 = V::gather(|lane| plane[top + base[lane] + 1] as f32);
        let s11 = V::gather(|lane| plane[bottom + base[lane] + 1] as f32);

        (s00 * w1 + s10 * w2 + s01 * w3 + s11 * w4).store(&mut values);
        let span = &mut out[dst_offset..dst_offset + V::WIDTH];
        for (px, value) in span.iter_mut().zip(&values) {
            // float -> u8 truncates toward zero and saturates out of range
            *px = *value as u8;
        }
    }
}

/// Resize with `V::WIDTH` destination columns per step, finishing each row's
/// remainder one column at a time.
pub fn resize_with<V: Lanes>(
    image: &ImageBuffer,
    new_width: usize,
    new_height: usize,
) -> Result<ImageBuffer> {
    if new_width <= 1 || new_height <= 1 {
        return Err(FormatError::ResizeTarget {
            width: new_width,
            height: new_height,
        }
        .into());
    }
    let (width, height) = (image.width(), image.height());
    if width < 2 || height < 2 {
        return Err(FormatError::ResizeSource { width, height }.into());
    }

    let mut resized = ImageBuffer::new(new_width, new_height)?;

    let row_scale = height as f32 / new_height as f32;
    let source = Source {
        planes: [image.red(), image.green(), image.blue()],
        width,
        col_scale: width as f32 / new_width as f32,
    };
    debug!(
        "Resizing {}x{} -> {}x{} ({} lanes)",
        width,
        height,
        new_width,
        new_height,
        V::WIDTH
    );

    let batched_end = new_width - new_width % V::WIDTH;
    let (red, green, blue) = resized.channels_mut();
    let mut dst = [red, green, blue];

    for r_new in 0..new_height {
        let (base, delta) = source_coord(r_new, row_scale, height - 2);
        let row = SourceRow { base, delta };
        let row_offset = r_new * new_width;

        for col in (0..batched_end).step_by(V::WIDTH) {
            interpolate_span::<V>(&source, row, col, &mut dst, row_offset + col);
        }
        for col in batched_end..new_width {
            interpolate_span::<f32>(&source, row, col, &mut dst, row_offset + col);
        }
    }

    Ok(resized)
}

/// Bilinear resize using eight SIMD lanes per step.
pub fn resize(image: &ImageBuffer, new_width: usize, new_height: usize) -> Result<ImageBuffer> {
    resize_with::<f32x8>(image, new_width, new_height)
}

/// Bilinear resize one column at a time. Reference for [`resize`].
pub fn resize_scalar(
    image: &ImageBuffer,
    new_width: usize,
    new_height: usize,
) -> Result<ImageBuffer> {
    resize_with::<f32>(image, new_width, new_height)
}
