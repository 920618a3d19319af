// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

//! Locates the PCI expansion ROM and the BIT header within an image.

use log::{debug, trace};

use crate::error::{Error, Result};
use crate::header::{BIT_HEADER_ID, BIT_HEADER_SIZE, BIT_SIGNATURE, checksum_valid};
use crate::rom::RomImage;

/// PCI expansion ROM boot signature.
pub const PCI_ROM_SIGNATURE: [u8; 2] = [0x55, 0xAA];

/// PCI expansion ROM images start on 512 byte boundaries.
pub const PCI_ROM_ALIGN: usize = 512;

/// Location of the 16-bit pointer to the PCI data structure, relative to the
/// start of the expansion ROM.
const PCIR_POINTER_OFFSET: usize = 0x18;

/// PCI data structure signature.
pub const PCIR_SIGNATURE: [u8; 4] = *b"PCIR";

/// Finds the first PCI expansion ROM in the image.
///
/// A candidate must carry the `55 AA` signature on a 512 byte boundary and
/// point at a `"PCIR"` structure that lies entirely inside the image.
/// Returns `None` if there isn't one, in which case callers treat offset 0 as
/// the ROM base.
pub fn find_pci_expansion_rom(rom: &RomImage<'_>) -> Option<usize> {
    let found = (0..rom.len())
        .step_by(PCI_ROM_ALIGN)
        .take_while(|&offset| offset + 1 < rom.len())
        .find(|&offset| is_pci_expansion_rom(rom, offset));

    match found {
        Some(offset) => debug!("PCI expansion ROM at 0x{:x}", offset),
        None => debug!("No PCI expansion ROM signature found"),
    }
    found
}

fn is_pci_expansion_rom(rom: &RomImage<'_>, offset: usize) -> bool {
    if !rom
        .bytes(offset, PCI_ROM_SIGNATURE.len())
        .is_ok_and(|sig| sig == &PCI_ROM_SIGNATURE[..])
    {
        return false;
    }

    let Ok(pcir) = rom.read_u16(offset + PCIR_POINTER_OFFSET) else {
        return false;
    };
    rom.bytes(offset + usize::from(pcir), PCIR_SIGNATURE.len())
        .is_ok_and(|sig| sig == &PCIR_SIGNATURE[..])
}

/// Finds the BIT header, scanning every byte offset from `start`.
///
/// A structural match (`0xB8FF` followed by `"BIT\0"`) is only accepted if
/// its checksum validates, so a stray signature with a bad checksum does not
/// hide a genuine header later in the image.  The checksum region must lie
/// within the image.
pub fn find_bit_header(rom: &RomImage<'_>, start: usize) -> Result<usize> {
    let Some(last) = rom.len().checked_sub(BIT_HEADER_SIZE) else {
        return Err(Error::BitHeaderNotFound);
    };

    for offset in start..=last {
        if !is_bit_signature(rom, offset) {
            continue;
        }

        // Bounds already established by the loop limit
        let header_size = rom.read_u8(offset + 8)?;
        if !checksum_valid(rom, offset, header_size) {
            trace!("BIT signature at 0x{:x} failed checksum", offset);
            continue;
        }

        debug!("BIT header at 0x{:x}", offset);
        return Ok(offset);
    }

    Err(Error::BitHeaderNotFound)
}

fn is_bit_signature(rom: &RomImage<'_>, offset: usize) -> bool {
    rom.read_u16(offset).is_ok_and(|id| id == BIT_HEADER_ID)
        && rom
            .bytes(offset + 2, BIT_SIGNATURE.len())
            .is_ok_and(|sig| sig == &BIT_SIGNATURE[..])
}
