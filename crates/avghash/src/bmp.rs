//! 24-bit uncompressed BMP decoding and encoding.
//!
//! Only the classic layout is handled: a 14-byte file header, a 40-byte
//! `BITMAPINFOHEADER`, and a BGR pixel array starting at byte 54 with every
//! row padded to a multiple of 4 bytes. Header fields are little-endian on
//! disk regardless of the host.
//!
//! Rows are kept in storage order. The format says a positive height means
//! bottom-up rows; this codec does not flip them on read or on write, so a
//! decode/encode round trip is lossless and the hash pipeline sees the rows
//! exactly as stored.

use crate::error::{Error, FormatError, Result};
use crate::image::ImageBuffer;
use bytes::{Buf, BufMut, BytesMut};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;
use tracing::{debug, trace};

pub const MAGIC: u16 = 0x4D42;

const FILE_HEADER_SIZE: usize = 14;
const INFO_HEADER_SIZE: usize = 40;
const PIXEL_ARRAY_OFFSET: usize = FILE_HEADER_SIZE + INFO_HEADER_SIZE;
const BITS_PER_PIXEL: u16 = 24;
const BYTES_PER_PIXEL: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
struct FileHeader {
    magic: u16,
    file_size: u32,
    reserved1: u16,
    reserved2: u16,
    pixel_offset: u32,
}

impl FileHeader {
    fn new(image_size: u32) -> Self {
        Self {
            magic: MAGIC,
            file_size: image_size + PIXEL_ARRAY_OFFSET as u32,
            reserved1: 0,
            reserved2: 0,
            pixel_offset: PIXEL_ARRAY_OFFSET as u32,
        }
    }

    fn parse(mut buf: &[u8]) -> Self {
        Self {
            magic: buf.get_u16_le(),
            file_size: buf.get_u32_le(),
            reserved1: buf.get_u16_le(),
            reserved2: buf.get_u16_le(),
            pixel_offset: buf.get_u32_le(),
        }
    }

    fn put(&self, out: &mut BytesMut) {
        out.put_u16_le(self.magic);
        out.put_u32_le(self.file_size);
        out.put_u16_le(self.reserved1);
        out.put_u16_le(self.reserved2);
        out.put_u32_le(self.pixel_offset);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct InfoHeader {
    header_size: u32,
    width: i32,
    height: i32,
    planes: u16,
    bits_per_pixel: u16,
    compression: u32,
    image_size: u32,
    h_resolution: u32,
    v_resolution: u32,
    colors: u32,
    important_colors: u32,
}

impl InfoHeader {
    fn new(width: i32, height: i32, image_size: u32) -> Self {
        Self {
            header_size: INFO_HEADER_SIZE as u32,
            width,
            height,
            planes: 1,
            bits_per_pixel: BITS_PER_PIXEL,
            compression: 0,
            image_size,
            h_resolution: 0,
            v_resolution: 0,
            colors: 0,
            important_colors: 0,
        }
    }

    fn parse(mut buf: &[u8]) -> Self {
        Self {
            header_size: buf.get_u32_le(),
            width: buf.get_i32_le(),
            height: buf.get_i32_le(),
            planes: buf.get_u16_le(),
            bits_per_pixel: buf.get_u16_le(),
            compression: buf.get_u32_le(),
            image_size: buf.get_u32_le(),
            h_resolution: buf.get_u32_le(),
            v_resolution: buf.get_u32_le(),
            colors: buf.get_u32_le(),
            important_colors: buf.get_u32_le(),
        }
    }

    fn put(&self, out: &mut BytesMut) {
        out.put_u32_le(self.header_size);
        out.put_i32_le(self.width);
        out.put_i32_le(self.height);
        out.put_u16_le(self.planes);
        out.put_u16_le(self.bits_per_pixel);
        out.put_u32_le(self.compression);
        out.put_u32_le(self.image_size);
        out.put_u32_le(self.h_resolution);
        out.put_u32_le(self.v_resolution);
        out.put_u32_le(self.colors);
        out.put_u32_le(self.important_colors);
    }

    /// Check the header describes a layout we can decode and return its
    /// dimensions.
    fn validate(&self) -> Result<(usize, usize), FormatError> {
        if self.planes != 1 {
            return Err(FormatError::UnsupportedPlanes(self.planes));
        }
        if self.compression != 0 {
            return Err(FormatError::UnsupportedCompression(self.compression));
        }
        if self.bits_per_pixel != BITS_PER_PIXEL {
            return Err(FormatError::UnsupportedBitDepth(self.bits_per_pixel));
        }
        if self.width < 0 || self.height < 0 {
            return Err(FormatError::NegativeDimensions {
                width: self.width,
                height: self.height,
            });
        }
        if self.header_size != INFO_HEADER_SIZE as u32 {
            return Err(FormatError::UnsupportedHeaderSize(self.header_size));
        }
        Ok((self.width as usize, self.height as usize))
    }
}

/// Zero bytes appended to each stored row so it spans a multiple of 4 bytes.
#[inline]
pub fn row_padding(width: usize) -> usize {
    (4 - (width * BYTES_PER_PIXEL) % 4) % 4
}

/// Decode a 24bpp bitmap from `reader`.
///
/// The reader is consumed up to the end of the pixel array; trailing bytes
/// are left unread.
pub fn decode<R: Read>(mut reader: R) -> Result<ImageBuffer> {
    let mut raw = [0u8; FILE_HEADER_SIZE];
    reader.read_exact(&mut raw)?;
    let file_header = FileHeader::parse(&raw);
    trace!("BMP file header: {:?}", file_header);
    if file_header.magic != MAGIC {
        return Err(FormatError::BadMagic(file_header.magic).into());
    }

    let mut raw = [0u8; INFO_HEADER_SIZE];
    reader.read_exact(&mut raw)?;
    let info = InfoHeader::parse(&raw);
    trace!("BMP info header: {:?}", info);
    let (width, height) = info.validate()?;

    let stride = width * BYTES_PER_PIXEL + row_padding(width);
    let len = stride
        .checked_mul(height)
        .ok_or(Error::Allocation { bytes: usize::MAX })?;
    let mut pixels = Vec::new();
    pixels
        .try_reserve_exact(len)
        .map_err(|_| Error::Allocation { bytes: len })?;
    // Only bytes actually present in the stream are written, so a header
    // claiming a huge image fails on the short read without touching memory.
    reader.take(len as u64).read_to_end(&mut pixels)?;
    if pixels.len() != len {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("pixel array truncated: {} of {} bytes", pixels.len(), len),
        )
        .into());
    }

    let mut image = ImageBuffer::new(width, height)?;
    let (red, green, blue) = image.channels_mut();
    for (row, line) in pixels.chunks_exact(stride).enumerate() {
        let base = row * width;
        for (col, bgr) in line[..width * BYTES_PER_PIXEL]
            .chunks_exact(BYTES_PER_PIXEL)
            .enumerate()
        {
            blue[base + col] = bgr[0];
            green[base + col] = bgr[1];
            red[base + col] = bgr[2];
        }
    }

    debug!("Decoded {}x{} bitmap", width, height);
    Ok(image)
}

/// Encode `image` as a 24bpp bitmap into `writer`.
pub fn encode<W: Write>(image: &ImageBuffer, mut writer: W) -> Result<()> {
    let (width, height) = (image.width(), image.height());
    let too_large = || FormatError::TooLarge { width, height };

    let padding = row_padding(width);
    let stride = width
        .checked_mul(BYTES_PER_PIXEL)
        .map(|n| n + padding)
        .ok_or_else(too_large)?;
    let image_size = stride
        .checked_mul(height)
        .and_then(|n| u32::try_from(n).ok())
        .filter(|n| n.checked_add(PIXEL_ARRAY_OFFSET as u32).is_some())
        .ok_or_else(too_large)?;
    let header_width = i32::try_from(width).map_err(|_| too_large())?;
    let header_height = i32::try_from(height).map_err(|_| too_large())?;

    let mut header = BytesMut::with_capacity(PIXEL_ARRAY_OFFSET);
    FileHeader::new(image_size).put(&mut header);
    InfoHeader::new(header_width, header_height, image_size).put(&mut header);
    writer.write_all(&header)?;

    let (red, green, blue) = (image.red(), image.green(), image.blue());
    let mut line = vec![0u8; stride];
    for row in 0..height {
        let base = row * width;
        for (col, bgr) in line[..width * BYTES_PER_PIXEL]
            .chunks_exact_mut(BYTES_PER_PIXEL)
            .enumerate()
        {
            bgr[0] = blue[base + col];
            bgr[1] = green[base + col];
            bgr[2] = red[base + col];
        }
        writer.write_all(&line)?;
    }

    debug!("Encoded {}x{} bitmap ({} pixel bytes)", width, height, image_size);
    Ok(())
}

/// Read a bitmap file from disk.
pub fn load<P: AsRef<Path>>(path: P) -> Result<ImageBuffer> {
    let path = path.as_ref();
    debug!("Loading bitmap {:?}", path);
    let file = File::open(path)?;
    decode(BufReader::new(file))
}

/// Write `image` to disk as a bitmap file, replacing any existing file.
pub fn save<P: AsRef<Path>>(image: &ImageBuffer, path: P) -> Result<()> {
    let path = path.as_ref();
    debug!("Saving bitmap {:?}", path);
    let mut writer = BufWriter::new(File::create(path)?);
    encode(image, &mut writer)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::image::Rgb;
    use pretty_assertions::assert_eq;

    fn gradient(width: usize, height: usize) -> ImageBuffer {
        ImageBuffer::from_fn(width, height, |r, c| {
            Rgb::new((r * 16 + c) as u8, (c * 7) as u8, 255 - (r * 3) as u8)
        })
        .unwrap()
    }

    fn encoded(image: &ImageBuffer) -> Vec<u8> {
        let mut out = Vec::new();
        encode(image, &mut out).unwrap();
        out
    }

    /// Headers for a `width`x`height` image, with `edit` applied to the info header.
    fn headers_with(width: i32, height: i32, edit: impl FnOnce(&mut InfoHeader)) -> BytesMut {
        let mut info = InfoHeader::new(width, height, 0);
        edit(&mut info);
        let mut out = BytesMut::new();
        FileHeader::new(0).put(&mut out);
        info.put(&mut out);
        out
    }

    #[test]
    fn test_row_padding() {
        assert_eq!(row_padding(1), 1);
        assert_eq!(row_padding(2), 2);
        assert_eq!(row_padding(3), 3);
        assert_eq!(row_padding(4), 0);
        assert_eq!(row_padding(5), 1);
    }

    #[test]
    fn test_encode_layout() {
        let mut image = ImageBuffer::new(2, 2).unwrap();
        image.set_pixel(0, 0, Rgb::new(1, 2, 3));
        image.set_pixel(0, 1, Rgb::new(4, 5, 6));
        image.set_pixel(1, 0, Rgb::new(7, 8, 9));
        image.set_pixel(1, 1, Rgb::new(10, 11, 12));

        let bytes = encoded(&image);
        // 2 rows of 6 pixel bytes + 2 padding bytes
        assert_eq!(bytes.len(), 54 + 16);
        assert_eq!(&bytes[0..2], b"BM");
        assert_eq!(&bytes[2..6], &70u32.to_le_bytes());
        assert_eq!(&bytes[10..14], &54u32.to_le_bytes());
        assert_eq!(&bytes[14..18], &40u32.to_le_bytes());
        assert_eq!(&bytes[18..22], &2i32.to_le_bytes());
        assert_eq!(&bytes[22..26], &2i32.to_le_bytes());
        assert_eq!(&bytes[26..28], &1u16.to_le_bytes());
        assert_eq!(&bytes[28..30], &24u16.to_le_bytes());
        assert_eq!(&bytes[30..34], &0u32.to_le_bytes());
        assert_eq!(&bytes[34..38], &16u32.to_le_bytes());
        assert!(bytes[38..54].iter().all(|&b| b == 0));
        assert_eq!(
            &bytes[54..],
            &[3, 2, 1, 6, 5, 4, 0, 0, 9, 8, 7, 12, 11, 10, 0, 0]
        );
    }

    #[test]
    fn test_round_trip_with_padding() {
        for width in [2, 3, 5, 8] {
            let image = gradient(width, 3);
            let decoded = decode(encoded(&image).as_slice()).unwrap();
            assert_eq!(decoded, image);
        }
    }

    #[test]
    fn test_rows_are_not_flipped() {
        // The first stored row must come back as row 0.
        let mut bytes = headers_with(1, 2, |_| {});
        bytes.put_slice(&[10, 20, 30, 0]);
        bytes.put_slice(&[40, 50, 60, 0]);

        let image = decode(&bytes[..]).unwrap();
        assert_eq!(image.pixel(0, 0), Rgb::new(30, 20, 10));
        assert_eq!(image.pixel(1, 0), Rgb::new(60, 50, 40));
    }

    #[test]
    fn test_bad_magic() {
        let mut bytes = encoded(&gradient(4, 4));
        bytes[0] = 0x4D;
        bytes[1] = 0x4D;
        let err = decode(bytes.as_slice()).unwrap_err();
        assert!(matches!(err, Error::Format(FormatError::BadMagic(0x4D4D))));
    }

    #[test]
    fn test_unsupported_headers() {
        let cases: [(fn(&mut InfoHeader), FormatError); 5] = [
            (
                |h: &mut InfoHeader| h.bits_per_pixel = 8,
                FormatError::UnsupportedBitDepth(8),
            ),
            (
                |h: &mut InfoHeader| h.compression = 1,
                FormatError::UnsupportedCompression(1),
            ),
            (
                |h: &mut InfoHeader| h.planes = 2,
                FormatError::UnsupportedPlanes(2),
            ),
            (
                |h: &mut InfoHeader| h.height = -4,
                FormatError::NegativeDimensions {
                    width: 4,
                    height: -4,
                },
            ),
            (
                |h: &mut InfoHeader| h.header_size = 108,
                FormatError::UnsupportedHeaderSize(108),
            ),
        ];

        for (edit, expected) in cases {
            let mut bytes = headers_with(4, 4, edit);
            bytes.put_bytes(0, 4 * 4 * 3);
            match decode(&bytes[..]) {
                Err(Error::Format(actual)) => assert_eq!(actual, expected),
                other => panic!("expected {:?}, got {:?}", expected, other),
            }
        }
    }

    #[test]
    fn test_zero_width_rejected() {
        let bytes = headers_with(0, 4, |_| {});
        let err = decode(&bytes[..]).unwrap_err();
        assert!(matches!(
            err,
            Error::Format(FormatError::EmptyImage {
                width: 0,
                height: 4
            })
        ));
    }

    #[test]
    fn test_short_pixel_array_is_io_error() {
        let bytes = encoded(&gradient(5, 5));
        let err = decode(&bytes[..bytes.len() - 1]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[test]
    fn test_truncated_header_is_io_error() {
        let bytes = encoded(&gradient(2, 2));
        let err = decode(&bytes[..20]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[test]
    fn test_huge_header_without_pixels_is_io_error() {
        // 30000x30000 declared, but only the 54 header bytes are present
        let bytes = headers_with(30_000, 30_000, |_| {});
        assert_eq!(bytes.len(), PIXEL_ARRAY_OFFSET);
        let err = decode(&bytes[..]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[test]
    fn test_short_write_is_io_error() {
        // 5x5 needs 54 + 5 * 16 bytes
        let mut buf = [0u8; 60];
        let err = encode(&gradient(5, 5), &mut buf[..]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }
}
