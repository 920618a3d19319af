// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

//! BIT token records, token kinds and the token directory walker.

use core::fmt;
use deku::prelude::*;
use log::warn;
use static_assertions::const_assert_eq;

use crate::error::{Error, Result};
use crate::header::BitHeader;
use crate::rom::{Record, RomImage};

/// Size of a BIT token record.
pub const BIT_TOKEN_SIZE: usize = 6;
const_assert_eq!(core::mem::size_of::<BitToken>(), BIT_TOKEN_SIZE);

/// A single entry in the BIT token directory.
///
/// `data_pointer` is an absolute offset into the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, DekuRead)]
#[deku(endian = "little")]
pub struct BitToken {
    pub id: u8,
    pub data_version: u8,
    pub data_size: u16,
    pub data_pointer: u16,
}

impl Record for BitToken {
    const SIZE: usize = BIT_TOKEN_SIZE;
}

impl BitToken {
    pub fn kind(&self) -> TokenKind {
        TokenKind::from_id(self.id)
    }

    /// Returns `false` for a null pointer or zero size, regardless of id.
    pub fn has_data(&self) -> bool {
        self.data_pointer != 0 && self.data_size != 0
    }
}

/// Type of a BIT token, from its id byte.
///
/// Unrecognised ids are preserved in [`TokenKind::Unknown`] rather than
/// treated as an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    I2cPtrs,
    DacPtrs,
    BiosData,
    ClockPtrs,
    DfpPtrs,
    NvInitPtrs,
    LvdsPtrs,
    MemoryPtrs,
    Nop,
    PerfPtrs,
    BridgeFwData,
    StringPtrs,
    TmdsPtrs,
    DisplayPtrs,
    VirtualPtrs,
    Ptrs32Bit,
    DpPtrs,
    FalconData,
    UefiData,
    MxmData,
    Unknown(u8),
}

impl TokenKind {
    pub fn from_id(id: u8) -> Self {
        match id {
            0x32 => TokenKind::I2cPtrs,
            0x41 => TokenKind::DacPtrs,
            0x42 => TokenKind::BiosData,
            0x43 => TokenKind::ClockPtrs,
            0x44 => TokenKind::DfpPtrs,
            0x49 => TokenKind::NvInitPtrs,
            0x4C => TokenKind::LvdsPtrs,
            0x4D => TokenKind::MemoryPtrs,
            0x4E => TokenKind::Nop,
            0x50 => TokenKind::PerfPtrs,
            0x52 => TokenKind::BridgeFwData,
            0x53 => TokenKind::StringPtrs,
            0x54 => TokenKind::TmdsPtrs,
            0x55 => TokenKind::DisplayPtrs,
            0x56 => TokenKind::VirtualPtrs,
            0x63 => TokenKind::Ptrs32Bit,
            0x64 => TokenKind::DpPtrs,
            0x70 => TokenKind::FalconData,
            0x75 => TokenKind::UefiData,
            0x78 => TokenKind::MxmData,
            other => TokenKind::Unknown(other),
        }
    }

    pub fn id(&self) -> u8 {
        match self {
            TokenKind::I2cPtrs => 0x32,
            TokenKind::DacPtrs => 0x41,
            TokenKind::BiosData => 0x42,
            TokenKind::ClockPtrs => 0x43,
            TokenKind::DfpPtrs => 0x44,
            TokenKind::NvInitPtrs => 0x49,
            TokenKind::LvdsPtrs => 0x4C,
            TokenKind::MemoryPtrs => 0x4D,
            TokenKind::Nop => 0x4E,
            TokenKind::PerfPtrs => 0x50,
            TokenKind::BridgeFwData => 0x52,
            TokenKind::StringPtrs => 0x53,
            TokenKind::TmdsPtrs => 0x54,
            TokenKind::DisplayPtrs => 0x55,
            TokenKind::VirtualPtrs => 0x56,
            TokenKind::Ptrs32Bit => 0x63,
            TokenKind::DpPtrs => 0x64,
            TokenKind::FalconData => 0x70,
            TokenKind::UefiData => 0x75,
            TokenKind::MxmData => 0x78,
            TokenKind::Unknown(id) => *id,
        }
    }

    /// Symbolic name, as used in the report.
    pub fn name(&self) -> &'static str {
        match self {
            TokenKind::I2cPtrs => "BIT_TOKEN_I2C_PTRS",
            TokenKind::DacPtrs => "BIT_TOKEN_DAC_PTRS",
            TokenKind::BiosData => "BIT_TOKEN_BIOSDATA",
            TokenKind::ClockPtrs => "BIT_TOKEN_CLOCK_PTRS",
            TokenKind::DfpPtrs => "BIT_TOKEN_DFP_PTRS",
            TokenKind::NvInitPtrs => "BIT_TOKEN_NVINIT_PTRS",
            TokenKind::LvdsPtrs => "BIT_TOKEN_LVDS_PTRS",
            TokenKind::MemoryPtrs => "BIT_TOKEN_MEMORY_PTRS",
            TokenKind::Nop => "BIT_TOKEN_NOP",
            TokenKind::PerfPtrs => "BIT_TOKEN_PERF_PTRS",
            TokenKind::BridgeFwData => "BIT_TOKEN_BRIDGE_FW_DATA",
            TokenKind::StringPtrs => "BIT_TOKEN_STRING_PTRS",
            TokenKind::TmdsPtrs => "BIT_TOKEN_TMDS_PTRS",
            TokenKind::DisplayPtrs => "BIT_TOKEN_DISPLAY_PTRS",
            TokenKind::VirtualPtrs => "BIT_TOKEN_VIRTUAL_PTRS",
            TokenKind::Ptrs32Bit => "BIT_TOKEN_32BIT_PTRS",
            TokenKind::DpPtrs => "BIT_TOKEN_DP_PTRS",
            TokenKind::FalconData => "BIT_TOKEN_FALCON_DATA",
            TokenKind::UefiData => "BIT_TOKEN_UEFI_DATA",
            TokenKind::MxmData => "BIT_TOKEN_MXM_DATA",
            TokenKind::Unknown(_) => "UNKNOWN_TOKEN",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A token together with its position in the directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub index: usize,
    pub offset: usize,
    pub token: BitToken,
}

/// Iterates the token directory following a BIT header.
///
/// Yields `header.token_entries` entries at a stride of `header.token_size`.
/// If a record would run past the end of the image, yields a single
/// [`Error::TokenTruncated`] for that index and then stops.
#[derive(Debug, Clone)]
pub struct TokenWalker<'a> {
    rom: RomImage<'a>,
    offset: usize,
    stride: usize,
    index: usize,
    count: usize,
    done: bool,
}

impl<'a> TokenWalker<'a> {
    pub fn new(rom: RomImage<'a>, header_offset: usize, header: &BitHeader) -> Self {
        Self {
            rom,
            offset: header.first_token_offset(header_offset),
            stride: usize::from(header.token_size),
            index: 0,
            count: usize::from(header.token_entries),
            done: false,
        }
    }
}

impl Iterator for TokenWalker<'_> {
    type Item = Result<DirectoryEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.index >= self.count {
            return None;
        }

        let (index, offset) = (self.index, self.offset);
        if !self.rom.contains(offset, BIT_TOKEN_SIZE) {
            warn!(
                "Token {} at 0x{:x} extends beyond end of image ({} bytes)",
                index,
                offset,
                self.rom.len()
            );
            self.done = true;
            return Some(Err(Error::TokenTruncated { index, offset }));
        }

        self.index += 1;
        self.offset = offset.saturating_add(self.stride);

        let entry = self.rom.read_record::<BitToken>(offset).map(|token| DirectoryEntry {
            index,
            offset,
            token,
        });
        if entry.is_err() {
            self.done = true;
        }
        Some(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locate::tests::put_bit_header;
    use alloc::vec;
    use alloc::vec::Vec;

    fn header_at(data: &[u8], offset: usize) -> BitHeader {
        RomImage::new(data).read_record(offset).unwrap()
    }

    #[test]
    fn test_token_kind_table() {
        let known: Vec<u8> = (0..=255u8)
            .filter(|&id| !matches!(TokenKind::from_id(id), TokenKind::Unknown(_)))
            .collect();
        assert_eq!(known.len(), 20);
        for id in 0..=255u8 {
            assert_eq!(TokenKind::from_id(id).id(), id);
        }
        assert_eq!(TokenKind::from_id(0x42).name(), "BIT_TOKEN_BIOSDATA");
        assert_eq!(TokenKind::from_id(0x63).name(), "BIT_TOKEN_32BIT_PTRS");
        assert_eq!(TokenKind::from_id(0x01).name(), "UNKNOWN_TOKEN");
    }

    #[test]
    fn test_walk_all_tokens() {
        let mut data = vec![0u8; 64];
        put_bit_header(&mut data, 0, 12, 6, 2);
        data[12..18].copy_from_slice(&[0x42, 0x01, 0x12, 0x00, 0x30, 0x00]);
        data[18..24].copy_from_slice(&[0x4E, 0x00, 0x00, 0x00, 0x00, 0x00]);

        let header = header_at(&data, 0);
        let entries: Vec<_> = TokenWalker::new(RomImage::new(&data), 0, &header)
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].index, 0);
        assert_eq!(entries[0].offset, 12);
        assert_eq!(
            entries[0].token,
            BitToken {
                id: 0x42,
                data_version: 1,
                data_size: 0x12,
                data_pointer: 0x30,
            }
        );
        assert_eq!(entries[1].offset, 18);
        assert_eq!(entries[1].token.kind(), TokenKind::Nop);
        assert!(!entries[1].token.has_data());
    }

    #[test]
    fn test_walk_uses_token_stride() {
        let mut data = vec![0u8; 64];
        put_bit_header(&mut data, 0, 12, 8, 2);
        data[12] = 0x53;
        data[20] = 0x70;
        let header = header_at(&data, 0);
        let ids: Vec<u8> = TokenWalker::new(RomImage::new(&data), 0, &header)
            .map(|e| e.unwrap().token.id)
            .collect();
        assert_eq!(ids, [0x53, 0x70]);
    }

    #[test]
    fn test_walk_truncated_directory() {
        // Room for 2 complete tokens after the header, 4 declared
        let mut data = vec![0u8; 12 + 6 * 2 + 3];
        put_bit_header(&mut data, 0, 12, 6, 4);
        let header = header_at(&data, 0);
        let entries: Vec<_> = TokenWalker::new(RomImage::new(&data), 0, &header).collect();
        assert_eq!(entries.len(), 3);
        assert!(entries[0].is_ok());
        assert!(entries[1].is_ok());
        assert!(matches!(
            entries[2],
            Err(Error::TokenTruncated {
                index: 2,
                offset: 24
            })
        ));
    }

    #[test]
    fn test_walk_token_ending_at_image_end() {
        let mut data = vec![0u8; 12 + 6];
        put_bit_header(&mut data, 0, 12, 6, 1);
        let header = header_at(&data, 0);
        let entries: Vec<_> = TokenWalker::new(RomImage::new(&data), 0, &header).collect();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].is_ok());
    }

    #[test]
    fn test_walk_empty_directory() {
        let mut data = vec![0u8; 12];
        put_bit_header(&mut data, 0, 12, 6, 0);
        let header = header_at(&data, 0);
        assert_eq!(TokenWalker::new(RomImage::new(&data), 0, &header).count(), 0);
    }
}
