//! Error taxonomy shared by every stage of the pipeline.

use std::io;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Coarse classification of an [`Error`], for callers that only need to
/// decide how to report a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Io,
    Format,
    Allocation,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error("failed to allocate {bytes} bytes of pixel storage")]
    Allocation { bytes: usize },
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Io(_) => ErrorKind::Io,
            Error::Format(_) => ErrorKind::Format,
            Error::Allocation { .. } => ErrorKind::Allocation,
        }
    }
}

/// Input that is well-formed bytes but not something this crate can handle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("not a bitmap: magic number {0:#06x}")]
    BadMagic(u16),

    #[error("unsupported DIB header size {0}, only BITMAPINFOHEADER (40) is supported")]
    UnsupportedHeaderSize(u32),

    #[error("corrupted DIB header: {0} color planes")]
    UnsupportedPlanes(u16),

    #[error("unsupported compression method {0}")]
    UnsupportedCompression(u32),

    #[error("unsupported bit depth {0}, only 24bpp bitmaps are supported")]
    UnsupportedBitDepth(u16),

    #[error("negative dimensions {width}x{height} are not supported")]
    NegativeDimensions { width: i32, height: i32 },

    #[error("image dimensions {width}x{height} are empty")]
    EmptyImage { width: usize, height: usize },

    #[error("image {width}x{height} does not fit in a bitmap header")]
    TooLarge { width: usize, height: usize },

    #[error("cannot resize to {width}x{height}, both dimensions must be at least 2")]
    ResizeTarget { width: usize, height: usize },

    #[error("cannot resize a {width}x{height} image, both dimensions must be at least 2")]
    ResizeSource { width: usize, height: usize },
}
