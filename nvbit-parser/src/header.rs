// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

//! The BIT header record.

use alloc::string::String;
use deku::prelude::*;
use static_assertions::const_assert_eq;

use crate::rom::{Record, RomImage};

/// Anchor id preceding the `"BIT\0"` signature.
pub const BIT_HEADER_ID: u16 = 0xB8FF;

/// `"BIT\0"`
pub const BIT_SIGNATURE: [u8; 4] = *b"BIT\0";

/// Size of the fixed part of the BIT header.  Also the minimum number of
/// bytes the header search needs at a candidate offset.
pub const BIT_HEADER_SIZE: usize = 12;
const_assert_eq!(core::mem::size_of::<BitHeader>(), BIT_HEADER_SIZE);

/// BIOS Information Table header.
///
/// `header_size` covers the whole header including this fixed part, and is
/// the region the checksum is calculated over.  The token directory starts
/// immediately after it.
#[derive(Debug, Clone, PartialEq, Eq, DekuRead)]
#[deku(endian = "little")]
pub struct BitHeader {
    pub id: u16,
    pub signature: [u8; 4],
    pub bcd_version: u16,
    pub header_size: u8,
    pub token_size: u8,
    pub token_entries: u8,
    pub checksum: u8,
}

impl Record for BitHeader {
    const SIZE: usize = BIT_HEADER_SIZE;
}

impl BitHeader {
    /// The signature as text, with NUL padding removed.
    pub fn signature_str(&self) -> String {
        self.signature
            .iter()
            .filter(|&&b| b != 0)
            .map(|&b| char::from(b))
            .collect()
    }

    /// Offset of the first token record for a header located at
    /// `header_offset`.
    pub fn first_token_offset(&self, header_offset: usize) -> usize {
        header_offset.saturating_add(usize::from(self.header_size))
    }
}

/// Checks the BIT header checksum: the bytes of the `header_size` long
/// region starting at `offset` must sum to zero, modulo 256.
///
/// A region that runs past the end of the image never validates.
pub fn checksum_valid(rom: &RomImage<'_>, offset: usize, header_size: u8) -> bool {
    rom.bytes(offset, usize::from(header_size))
        .map(|region| region.iter().fold(0u8, |sum, &b| sum.wrapping_add(b)) == 0)
        .unwrap_or(false)
}
