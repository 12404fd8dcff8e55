//! In-memory planar RGB image.
//!
//! All three channels live in one allocation of `width * height * 3` bytes,
//! laid out as the red plane, then green, then blue. Each plane is row-major.

use crate::error::{Error, FormatError, Result};
use std::fmt;

/// A single pixel value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::gray(0);
    pub const WHITE: Rgb = Rgb::gray(255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const fn gray(v: u8) -> Self {
        Self { r: v, g: v, b: v }
    }
}

/// Planar 8-bit RGB image owning a single backing buffer.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageBuffer {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl ImageBuffer {
    /// Allocate a zero-filled image.
    ///
    /// Both dimensions must be non-zero. Allocation failure is reported as
    /// [`Error::Allocation`] instead of aborting.
    pub fn new(width: usize, height: usize) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(FormatError::EmptyImage { width, height }.into());
        }

        let len = width
            .checked_mul(height)
            .and_then(|n| n.checked_mul(3))
            .ok_or(Error::Allocation { bytes: usize::MAX })?;

        let mut data = Vec::new();
        data.try_reserve_exact(len)
            .map_err(|_| Error::Allocation { bytes: len })?;
        data.resize(len, 0);

        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Build an image by evaluating `f(row, col)` for every pixel.
    pub fn from_fn<F>(width: usize, height: usize, mut f: F) -> Result<Self>
    where
        F: FnMut(usize, usize) -> Rgb,
    {
        let mut image = Self::new(width, height)?;
        for row in 0..height {
            for col in 0..width {
                image.set_pixel(row, col, f(row, col));
            }
        }
        Ok(image)
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of samples in one channel.
    #[inline]
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    /// Always false for a constructed image.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    fn index(&self, row: usize, col: usize) -> usize {
        debug_assert!(row < self.height && col < self.width);
        row * self.width + col
    }

    #[inline]
    pub fn red(&self) -> &[u8] {
        &self.data[..self.len()]
    }

    #[inline]
    pub fn green(&self) -> &[u8] {
        let n = self.len();
        &self.data[n..2 * n]
    }

    #[inline]
    pub fn blue(&self) -> &[u8] {
        let n = self.len();
        &self.data[2 * n..]
    }

    /// Mutable views of the red, green and blue planes.
    pub fn channels_mut(&mut self) -> (&mut [u8], &mut [u8], &mut [u8]) {
        let n = self.len();
        let (red, rest) = self.data.split_at_mut(n);
        let (green, blue) = rest.split_at_mut(n);
        (red, green, blue)
    }

    #[inline]
    pub fn pixel(&self, row: usize, col: usize) -> Rgb {
        let i = self.index(row, col);
        let n = self.len();
        Rgb {
            r: self.data[i],
            g: self.data[n + i],
            b: self.data[2 * n + i],
        }
    }

    #[inline]
    pub fn set_pixel(&mut self, row: usize, col: usize, px: Rgb) {
        let i = self.index(row, col);
        let n = self.len();
        self.data[i] = px.r;
        self.data[n + i] = px.g;
        self.data[2 * n + i] = px.b;
    }
}

impl fmt::Debug for ImageBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_new_is_zeroed() {
        let img = ImageBuffer::new(3, 2).unwrap();
        assert_eq!(img.len(), 6);
        assert_eq!(img.red(), &[0; 6]);
        assert_eq!(img.green(), &[0; 6]);
        assert_eq!(img.blue(), &[0; 6]);
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        let err = ImageBuffer::new(0, 4).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
        let err = ImageBuffer::new(4, 0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
    }

    #[test]
    fn test_overflowing_size_is_allocation_error() {
        let err = ImageBuffer::new(usize::MAX, 2).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Allocation);
    }

    #[test]
    fn test_pixel_row_major_layout() {
        let mut img = ImageBuffer::new(3, 2).unwrap();
        img.set_pixel(1, 2, Rgb::new(10, 20, 30));

        // row 1, col 2 -> index 5 in each plane
        assert_eq!(img.red()[5], 10);
        assert_eq!(img.green()[5], 20);
        assert_eq!(img.blue()[5], 30);
        assert_eq!(img.pixel(1, 2), Rgb::new(10, 20, 30));
        assert_eq!(img.pixel(0, 0), Rgb::BLACK);
    }

    #[test]
    fn test_channels_mut_are_disjoint() {
        let mut img = ImageBuffer::new(2, 2).unwrap();
        {
            let (r, g, b) = img.channels_mut();
            r.fill(1);
            g.fill(2);
            b.fill(3);
        }
        assert_eq!(img.pixel(1, 1), Rgb::new(1, 2, 3));
    }

    #[test]
    fn test_from_fn() {
        let img = ImageBuffer::from_fn(4, 3, |r, c| Rgb::gray((r * 4 + c) as u8)).unwrap();
        assert_eq!(img.red(), &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11]);
    }
}
