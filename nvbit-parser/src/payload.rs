// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

//! Decoders for the data each BIT token points at.
//!
//! BIOSDATA and STRING_PTRS tokens have versioned layouts.  A version/size
//! combination that isn't recognised decodes to an explicit `Unrecognized`
//! variant so the token is still reported, just without fields.  Any other
//! token with data is returned as raw bytes.

use alloc::string::String;
use alloc::vec::Vec;
use deku::prelude::*;
use log::warn;

use crate::error::Result;
use crate::rom::{Record, RomImage};
use crate::token::{BitToken, TokenKind};

/// Rendered for a string pointer that is null, out of range or empty.
pub const NULL_STRING: &str = "NULL";

/// The BIOSMOD date occupies the low 24 bits of a 32-bit word.
const BIOSMOD_DATE_MASK: u32 = 0x00FF_FFFF;

// Packed layout sizes.  None of these structs can be asserted against
// size_of, as Rust pads them to their field alignment.
pub const BIOS_DATA_V1_SIZE: usize = 18;
pub const BIOS_DATA_V2_SIZE: usize = 33;
pub const STRING_PTRS_V1_SIZE: usize = 15;
pub const STRING_PTRS_V2_SIZE: usize = 21;

/// BIOSDATA token, version 1.
#[derive(Debug, Clone, PartialEq, Eq, DekuRead)]
#[deku(endian = "little")]
pub struct BiosDataV1 {
    pub bios_version: u32,
    pub oem_version: u8,
    pub checksum: u8,
    pub int15_post_callbacks: u16,
    pub int15_system_callbacks: u16,
    pub board_id: u16,
    pub frame_count: u16,
    biosmod_word: u32,
}

impl Record for BiosDataV1 {
    const SIZE: usize = BIOS_DATA_V1_SIZE;
}

impl BiosDataV1 {
    /// BIOSMOD date, the low 24 bits of the final word.
    pub fn biosmod_date(&self) -> u32 {
        self.biosmod_word & BIOSMOD_DATE_MASK
    }
}

/// BIOSDATA token, version 2.
#[derive(Debug, Clone, PartialEq, Eq, DekuRead)]
#[deku(endian = "little")]
pub struct BiosDataV2 {
    pub bios_version: u32,
    pub oem_version: u8,
    pub checksum: u8,
    pub int15_post_callbacks: u16,
    pub int15_system_callbacks: u16,
    pub frame_count: u16,
    pub reserved: u32,
    pub max_heads_at_post: u8,
    pub memory_size_report: u8,
    pub h_scale_factor: u8,
    pub v_scale_factor: u8,
    pub data_table_pointer: u16,
    pub rompacks_pointer: u16,
    pub applied_rompacks_pointer: u16,
    pub applied_rompack_max: u8,
    pub applied_rompack_count: u8,
    pub module_map_external_0: u8,
    pub compression_info_pointer: u32,
}

impl Record for BiosDataV2 {
    const SIZE: usize = BIOS_DATA_V2_SIZE;
}

/// A string pointer and the maximum length of the string it points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, DekuRead)]
#[deku(endian = "endian", ctx = "endian: deku::ctx::Endian")]
pub struct StringPtr {
    pub pointer: u16,
    pub max_len: u8,
}

/// STRING_PTRS token, version 1.
#[derive(Debug, Clone, PartialEq, Eq, DekuRead)]
#[deku(endian = "little")]
pub struct StringPtrsV1 {
    pub sign_on_message: StringPtr,
    pub oem_string: StringPtr,
    pub oem_vendor_name: StringPtr,
    pub oem_product_name: StringPtr,
    pub oem_product_revision: StringPtr,
}

impl Record for StringPtrsV1 {
    const SIZE: usize = STRING_PTRS_V1_SIZE;
}

impl StringPtrsV1 {
    fn labelled(&self) -> [(&'static str, StringPtr); 5] {
        [
            ("Sign On Message", self.sign_on_message),
            ("OEM String", self.oem_string),
            ("OEM Vendor Name", self.oem_vendor_name),
            ("OEM Product Name", self.oem_product_name),
            ("OEM Product Revision", self.oem_product_revision),
        ]
    }
}

/// STRING_PTRS token, version 2.
#[derive(Debug, Clone, PartialEq, Eq, DekuRead)]
#[deku(endian = "little")]
pub struct StringPtrsV2 {
    pub sign_on_message: StringPtr,
    pub version_string: StringPtr,
    pub copyright_string: StringPtr,
    pub oem_string: StringPtr,
    pub oem_vendor_name: StringPtr,
    pub oem_product_name: StringPtr,
    pub oem_product_revision: StringPtr,
}

impl Record for StringPtrsV2 {
    const SIZE: usize = STRING_PTRS_V2_SIZE;
}

impl StringPtrsV2 {
    fn labelled(&self) -> [(&'static str, StringPtr); 7] {
        [
            ("Sign On Message", self.sign_on_message),
            ("Version String", self.version_string),
            ("Copyright String", self.copyright_string),
            ("OEM String", self.oem_string),
            ("OEM Vendor Name", self.oem_vendor_name),
            ("OEM Product Name", self.oem_product_name),
            ("OEM Product Revision", self.oem_product_revision),
        ]
    }
}

/// A string resolved from a [`StringPtr`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RomString {
    pub label: &'static str,
    pub pointer: u16,
    pub max_len: u8,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BiosData {
    V1(BiosDataV1),
    V2(BiosDataV2),
    /// Version and size don't match a known layout.
    Unrecognized,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StringTable {
    V1(Vec<RomString>),
    V2(Vec<RomString>),
    /// Version and size don't match a known layout.
    Unrecognized,
}

/// Decoded data for one token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload<'a> {
    /// Null data pointer or zero data size.
    NoData,
    Nop,
    BiosData { version: u8, data: BiosData },
    StringPtrs { version: u8, table: StringTable },
    /// Any other token, as the bytes it points at.
    Raw { kind: TokenKind, bytes: &'a [u8] },
    /// The data the token points at extends past the end of the image.
    OutOfBounds {
        kind: TokenKind,
        pointer: u16,
        size: u16,
    },
}

/// Decodes the data a token points at.
///
/// Never fails: out of bounds data is reported as
/// [`Payload::OutOfBounds`].
pub fn decode_payload<'a>(rom: &RomImage<'a>, token: &BitToken) -> Payload<'a> {
    if !token.has_data() {
        return Payload::NoData;
    }

    let kind = token.kind();
    let decoded = match kind {
        TokenKind::BiosData => decode_bios_data(rom, token).map(|data| Payload::BiosData {
            version: token.data_version,
            data,
        }),
        TokenKind::StringPtrs => decode_string_ptrs(rom, token).map(|table| Payload::StringPtrs {
            version: token.data_version,
            table,
        }),
        TokenKind::Nop => Ok(Payload::Nop),
        _ => rom
            .bytes(usize::from(token.data_pointer), usize::from(token.data_size))
            .map(|bytes| Payload::Raw { kind, bytes }),
    };

    decoded.unwrap_or_else(|e| {
        warn!("{} data at 0x{:x}: {}", kind, token.data_pointer, e);
        Payload::OutOfBounds {
            kind,
            pointer: token.data_pointer,
            size: token.data_size,
        }
    })
}

fn decode_bios_data(rom: &RomImage<'_>, token: &BitToken) -> Result<BiosData> {
    let offset = usize::from(token.data_pointer);
    let size = usize::from(token.data_size);
    match token.data_version {
        1 if size >= BIOS_DATA_V1_SIZE => rom.read_record(offset).map(BiosData::V1),
        2 if size >= BIOS_DATA_V2_SIZE => rom.read_record(offset).map(BiosData::V2),
        _ => Ok(BiosData::Unrecognized),
    }
}

fn decode_string_ptrs(rom: &RomImage<'_>, token: &BitToken) -> Result<StringTable> {
    let offset = usize::from(token.data_pointer);
    let size = usize::from(token.data_size);
    match token.data_version {
        1 if size >= STRING_PTRS_V1_SIZE => {
            let ptrs: StringPtrsV1 = rom.read_record(offset)?;
            Ok(StringTable::V1(resolve_strings(rom, &ptrs.labelled())))
        }
        2 if size >= STRING_PTRS_V2_SIZE => {
            let ptrs: StringPtrsV2 = rom.read_record(offset)?;
            Ok(StringTable::V2(resolve_strings(rom, &ptrs.labelled())))
        }
        _ => Ok(StringTable::Unrecognized),
    }
}

fn resolve_strings(rom: &RomImage<'_>, ptrs: &[(&'static str, StringPtr)]) -> Vec<RomString> {
    ptrs.iter()
        .map(|&(label, ptr)| RomString {
            label,
            pointer: ptr.pointer,
            max_len: ptr.max_len,
            value: read_string(rom, ptr.pointer, ptr.max_len),
        })
        .collect()
}

/// Reads a NUL terminated string of at most `max_len` bytes.
///
/// Stops at the first NUL, after `max_len` bytes or at the end of the image,
/// whichever comes first.  Returns [`NULL_STRING`] if `offset` is 0, lies
/// outside the image, or the string is empty.  Bytes are mapped to chars
/// one-to-one.
pub fn read_string(rom: &RomImage<'_>, offset: u16, max_len: u8) -> String {
    let offset = usize::from(offset);
    if offset == 0 || offset >= rom.len() {
        return NULL_STRING.into();
    }

    let value: String = rom
        .tail(offset)
        .unwrap_or_default()
        .iter()
        .take(usize::from(max_len))
        .take_while(|&&b| b != 0)
        .map(|&b| char::from(b))
        .collect();

    if value.is_empty() {
        NULL_STRING.into()
    } else {
        value
    }
}
