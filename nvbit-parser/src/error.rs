// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

//! Error type shared by every stage of the parser.

use alloc::string::String;
use thiserror::Error;

/// Result alias used throughout nvbit-parser.
pub type Result<T> = core::result::Result<T, Error>;

/// Everything that can go wrong while locating and decoding a BIT table.
///
/// Only [`Error::NoData`] and [`Error::BitHeaderNotFound`] are fatal to a
/// report.  The bounds related variants are caught by the renderer and shown
/// inline against the token that caused them.
#[derive(Debug, Error)]
pub enum Error {
    /// The caller supplied an empty image.
    #[error("No ROM data loaded")]
    NoData,

    /// No `0xB8FF` + `"BIT\0"` candidate had a valid checksum.
    #[error("BIT Header not found")]
    BitHeaderNotFound,

    /// A read of `len` bytes at `offset` would pass the end of the image.
    #[error("read of {len} byte(s) at 0x{offset:x} exceeds image size {available}")]
    OutOfBounds {
        offset: usize,
        len: usize,
        available: usize,
    },

    /// A token record in the directory does not fit in the image.
    #[error("Token {index} extends beyond ROM boundary")]
    TokenTruncated { index: usize, offset: usize },

    /// deku rejected a record slice.
    #[error("failed to decode record: {0}")]
    Decode(String),

    /// The report sink refused a write.
    #[error("failed to write report: {0}")]
    Format(#[from] core::fmt::Error),
}
