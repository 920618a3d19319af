// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

//! Renders the text report for a ROM image.
//!
//! Output order is fixed: image identity, ROM base, BIT header, then one
//! block per token in directory order.

use core::fmt::Write;

use crate::error::{Error, Result};
use crate::header::BitHeader;
use crate::locate::{find_bit_header, find_pci_expansion_rom};
use crate::payload::{BiosData, BiosDataV1, BiosDataV2, Payload, StringTable, decode_payload};
use crate::rom::RomImage;
use crate::token::{DirectoryEntry, TokenKind, TokenWalker};

const HEX_BYTES_PER_LINE: usize = 16;

/// Writes the full report for `rom` to `out`.
///
/// `name` identifies the image in the report, typically its file name.
///
/// Returns [`Error::NoData`] for an empty image, and
/// [`Error::BitHeaderNotFound`] if no valid BIT header exists.  In the
/// latter case everything up to and including the error line has already
/// been written.  Truncated directories and out of bounds token data are
/// reported inline and do not fail the report.
pub fn render_report<W: Write>(out: &mut W, name: &str, rom: &RomImage<'_>) -> Result<()> {
    if rom.is_empty() {
        return Err(Error::NoData);
    }

    writeln!(out, "NVIDIA ROM File Analysis")?;
    writeln!(out, "========================")?;
    writeln!(out)?;
    writeln!(out, "File: {}", name)?;
    writeln!(out, "Size: {} bytes", rom.len())?;
    writeln!(out)?;

    let rom_base = find_pci_expansion_rom(rom).unwrap_or(0);
    writeln!(out, "PCI Expansion ROM found at offset: 0x{:x}", rom_base)?;
    writeln!(out)?;

    let header_offset = match find_bit_header(rom, rom_base) {
        Ok(offset) => offset,
        Err(e) => {
            writeln!(out, "Error: {}", e)?;
            return Err(e);
        }
    };
    writeln!(out, "BIT Header found at offset: 0x{:x}", header_offset)?;
    writeln!(out)?;

    let header: BitHeader = rom.read_record(header_offset)?;
    write_bit_header(out, &header)?;

    writeln!(out, "BIT Tokens:")?;
    for entry in TokenWalker::new(*rom, header_offset, &header) {
        match entry {
            Ok(entry) => write_token(out, rom, &entry)?,
            Err(e) => {
                writeln!(out, "Error: {}", e)?;
                break;
            }
        }
    }

    Ok(())
}

fn write_bit_header<W: Write>(out: &mut W, header: &BitHeader) -> Result<()> {
    writeln!(out, "BIT Header:")?;
    writeln!(out, "  ID: 0x{:x}", header.id)?;
    writeln!(out, "  Signature: \"{}\"", header.signature_str())?;
    writeln!(out, "  BCD Version: 0x{:x}", header.bcd_version)?;
    writeln!(out, "  Header Size: {} bytes", header.header_size)?;
    writeln!(out, "  Token Size: {} bytes", header.token_size)?;
    writeln!(out, "  Token Entries: {}", header.token_entries)?;
    writeln!(out, "  Checksum: 0x{:x}", header.checksum)?;
    writeln!(out)?;
    Ok(())
}

fn write_token<W: Write>(out: &mut W, rom: &RomImage<'_>, entry: &DirectoryEntry) -> Result<()> {
    let token = &entry.token;
    writeln!(
        out,
        "  Token {}: {} (0x{:x})",
        entry.index,
        token.kind(),
        token.id
    )?;
    writeln!(out, "    Data Version: {}", token.data_version)?;
    writeln!(out, "    Data Size: {} bytes", token.data_size)?;
    writeln!(out, "    Data Pointer: 0x{:x}", token.data_pointer)?;

    match decode_payload(rom, token) {
        Payload::NoData => writeln!(out, "    NULL pointer or zero size - no data")?,
        Payload::Nop => writeln!(out, "    No Operation Token (NOP)")?,
        Payload::BiosData { version, data } => {
            writeln!(out, "    BIOS Data (Version {}):", version)?;
            match data {
                BiosData::V1(bios) => write_bios_data_v1(out, &bios)?,
                BiosData::V2(bios) => write_bios_data_v2(out, &bios)?,
                BiosData::Unrecognized => {}
            }
        }
        Payload::StringPtrs { version, table } => {
            writeln!(out, "    String Pointers (Version {}):", version)?;
            match table {
                StringTable::V1(strings) | StringTable::V2(strings) => {
                    for s in strings {
                        writeln!(out, "      {}: \"{}\"", s.label, s.value)?;
                    }
                }
                StringTable::Unrecognized => {}
            }
        }
        Payload::Raw { kind, bytes } => {
            write_data_heading(out, kind)?;
            writeln!(out, "      Raw Data (hex):")?;
            write_hex_dump(out, bytes, "        ")?;
        }
        Payload::OutOfBounds { kind, .. } => {
            write_data_heading(out, kind)?;
            writeln!(out, "      Error: Data extends beyond ROM boundary")?;
        }
    }

    writeln!(out)?;
    Ok(())
}

fn write_data_heading<W: Write>(out: &mut W, kind: TokenKind) -> Result<()> {
    writeln!(out, "    {} Data:", kind)?;
    Ok(())
}

fn write_bios_data_v1<W: Write>(out: &mut W, bios: &BiosDataV1) -> Result<()> {
    writeln!(out, "      BIOS Version: {:x}", bios.bios_version)?;
    writeln!(out, "      BIOS OEM Version: {}", bios.oem_version)?;
    writeln!(out, "      BIOS Checksum: 0x{:x}", bios.checksum)?;
    writeln!(out, "      INT15 POST Callbacks: 0x{:x}", bios.int15_post_callbacks)?;
    writeln!(out, "      INT15 System Callbacks: 0x{:x}", bios.int15_system_callbacks)?;
    writeln!(out, "      BIOS Board ID: 0x{:x}", bios.board_id)?;
    writeln!(out, "      Frame Count: {}", bios.frame_count)?;
    writeln!(out, "      BIOSMOD Date: {:x}", bios.biosmod_date())?;
    Ok(())
}

fn write_bios_data_v2<W: Write>(out: &mut W, bios: &BiosDataV2) -> Result<()> {
    writeln!(out, "      BIOS Version: {:x}", bios.bios_version)?;
    writeln!(out, "      BIOS OEM Version: {}", bios.oem_version)?;
    writeln!(out, "      BIOS Checksum: 0x{:x}", bios.checksum)?;
    writeln!(out, "      INT15 POST Callbacks: 0x{:x}", bios.int15_post_callbacks)?;
    writeln!(out, "      INT15 System Callbacks: 0x{:x}", bios.int15_system_callbacks)?;
    writeln!(out, "      Frame Count: {}", bios.frame_count)?;
    writeln!(out, "      Max Heads at POST: {}", bios.max_heads_at_post)?;
    writeln!(out, "      Memory Size Report: {}", bios.memory_size_report)?;
    writeln!(out, "      H Scale Factor: {}", bios.h_scale_factor)?;
    writeln!(out, "      V Scale Factor: {}", bios.v_scale_factor)?;
    writeln!(out, "      Data Table Pointer: 0x{:x}", bios.data_table_pointer)?;
    writeln!(out, "      ROMpacks Pointer: 0x{:x}", bios.rompacks_pointer)?;
    writeln!(
        out,
        "      Applied ROMpacks Pointer: 0x{:x}",
        bios.applied_rompacks_pointer
    )?;
    writeln!(out, "      Applied ROMpack Max: {}", bios.applied_rompack_max)?;
    writeln!(out, "      Applied ROMpack Count: {}", bios.applied_rompack_count)?;
    writeln!(
        out,
        "      Module Map External 0: 0x{:x}",
        bios.module_map_external_0
    )?;
    writeln!(
        out,
        "      Compression Info Pointer: 0x{:x}",
        bios.compression_info_pointer
    )?;
    Ok(())
}

/// Two digit hex bytes, 16 to a line, each line starting with `prefix`.
fn write_hex_dump<W: Write>(out: &mut W, bytes: &[u8], prefix: &str) -> Result<()> {
    for line in bytes.chunks(HEX_BYTES_PER_LINE) {
        write!(out, "{}", prefix)?;
        for (ii, byte) in line.iter().enumerate() {
            if ii > 0 {
                write!(out, " ")?;
            }
            write!(out, "{:02x}", byte)?;
        }
        writeln!(out)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locate::tests::{put_bit_header, put_pci_rom};
    use crate::payload::BIOS_DATA_V1_SIZE;
    use crate::payload::tests::bios_data_v1_bytes;
    use alloc::string::String;
    use alloc::vec;
    use alloc::vec::Vec;

    fn render(name: &str, data: &[u8]) -> (Result<()>, String) {
        let mut out = String::new();
        let result = render_report(&mut out, name, &RomImage::new(data));
        (result, out)
    }

    fn put_token(data: &mut [u8], offset: usize, id: u8, version: u8, size: u16, ptr: u16) {
        data[offset] = id;
        data[offset + 1] = version;
        data[offset + 2..offset + 4].copy_from_slice(&size.to_le_bytes());
        data[offset + 4..offset + 6].copy_from_slice(&ptr.to_le_bytes());
    }

    #[test]
    fn test_full_report() {
        let mut data = vec![0u8; 2048];
        put_pci_rom(&mut data, 512, 0x1C);
        put_bit_header(&mut data, 600, 12, 6, 2);
        put_token(&mut data, 612, 0x42, 1, 18, 0x300);
        put_token(&mut data, 618, 0x4E, 0, 1, 0x10);
        data[0x300..0x300 + BIOS_DATA_V1_SIZE].copy_from_slice(&bios_data_v1_bytes());

        let (result, out) = render("scenario.rom", &data);
        assert!(result.is_ok());

        let expected = [
            "NVIDIA ROM File Analysis",
            "========================",
            "",
            "File: scenario.rom",
            "Size: 2048 bytes",
            "",
            "PCI Expansion ROM found at offset: 0x200",
            "",
            "BIT Header found at offset: 0x258",
            "",
            "BIT Header:",
            "  ID: 0xb8ff",
            "  Signature: \"BIT\"",
            "  BCD Version: 0x100",
            "  Header Size: 12 bytes",
            "  Token Size: 6 bytes",
            "  Token Entries: 2",
            "  Checksum: 0x55",
            "",
            "BIT Tokens:",
            "  Token 0: BIT_TOKEN_BIOSDATA (0x42)",
            "    Data Version: 1",
            "    Data Size: 18 bytes",
            "    Data Pointer: 0x300",
            "    BIOS Data (Version 1):",
            "      BIOS Version: 1020304",
            "      BIOS OEM Version: 5",
            "      BIOS Checksum: 0x66",
            "      INT15 POST Callbacks: 0x1234",
            "      INT15 System Callbacks: 0x5678",
            "      BIOS Board ID: 0xabcd",
            "      Frame Count: 60",
            "      BIOSMOD Date: 191231",
            "",
            "  Token 1: BIT_TOKEN_NOP (0x4e)",
            "    Data Version: 0",
            "    Data Size: 1 bytes",
            "    Data Pointer: 0x10",
            "    No Operation Token (NOP)",
            "",
        ];
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines, expected);
        assert!(out.ends_with("(NOP)\n\n"));
    }

    #[test]
    fn test_empty_image() {
        let (result, out) = render("empty.rom", &[]);
        assert!(matches!(result, Err(Error::NoData)));
        assert!(out.is_empty());
    }

    #[test]
    fn test_header_not_found() {
        let data = vec![0u8; 256];
        let (result, out) = render("blank.rom", &data);
        assert!(matches!(result, Err(Error::BitHeaderNotFound)));
        assert!(out.contains("PCI Expansion ROM found at offset: 0x0\n"));
        assert!(out.ends_with("Error: BIT Header not found\n"));
        assert!(!out.contains("BIT Tokens:"));
    }

    #[test]
    fn test_no_data_token_skips_decode() {
        let mut data = vec![0u8; 64];
        put_bit_header(&mut data, 0, 12, 6, 1);
        put_token(&mut data, 12, 0x42, 1, 0, 0);

        let (result, out) = render("t.rom", &data);
        assert!(result.is_ok());
        assert!(out.contains("  Token 0: BIT_TOKEN_BIOSDATA (0x42)\n"));
        assert!(out.contains("    NULL pointer or zero size - no data\n"));
        assert!(!out.contains("BIOS Data (Version"));
    }

    #[test]
    fn test_truncated_directory() {
        let mut data = vec![0u8; 12 + 6 + 4];
        put_bit_header(&mut data, 0, 12, 6, 3);
        put_token(&mut data, 12, 0x4E, 0, 0, 0);

        let (result, out) = render("t.rom", &data);
        assert!(result.is_ok());
        assert!(out.contains("  Token 0: BIT_TOKEN_NOP (0x4e)\n"));
        assert!(out.ends_with("Error: Token 1 extends beyond ROM boundary\n"));
        assert!(!out.contains("Token 2"));
    }

    #[test]
    fn test_raw_and_out_of_bounds_tokens() {
        let mut data: Vec<u8> = (0..64).collect();
        data[..30].fill(0);
        put_bit_header(&mut data, 0, 12, 6, 3);
        put_token(&mut data, 12, 0x43, 1, 18, 46);
        put_token(&mut data, 18, 0x99, 1, 19, 46);
        put_token(&mut data, 24, 0x42, 7, 4, 46);

        let (result, out) = render("t.rom", &data);
        assert!(result.is_ok());
        assert!(out.contains(concat!(
            "    BIT_TOKEN_CLOCK_PTRS Data:\n",
            "      Raw Data (hex):\n",
            "        2e 2f 30 31 32 33 34 35 36 37 38 39 3a 3b 3c 3d\n",
            "        3e 3f\n",
        )));
        assert!(out.contains(concat!(
            "  Token 1: UNKNOWN_TOKEN (0x99)\n",
            "    Data Version: 1\n",
            "    Data Size: 19 bytes\n",
            "    Data Pointer: 0x2e\n",
            "    UNKNOWN_TOKEN Data:\n",
            "      Error: Data extends beyond ROM boundary\n",
        )));
        assert!(out.contains(concat!(
            "    BIOS Data (Version 7):\n",
            "\n",
        )));
    }

    #[test]
    fn test_string_pointer_report() {
        let mut data = vec![0u8; 128];
        put_bit_header(&mut data, 0, 12, 6, 1);
        put_token(&mut data, 12, 0x53, 1, 15, 0x20);
        data[0x20..0x23].copy_from_slice(&[0x40, 0x00, 0x20]);
        data[0x40..0x48].copy_from_slice(b"GeForce\0");

        let (result, out) = render("t.rom", &data);
        assert!(result.is_ok());
        assert!(out.contains(concat!(
            "    String Pointers (Version 1):\n",
            "      Sign On Message: \"GeForce\"\n",
            "      OEM String: \"NULL\"\n",
        )));
    }
}
