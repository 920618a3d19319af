// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

//! nvbit-parser
//!
//! Parses NVIDIA video BIOS images (PCI expansion ROM dumps) and describes
//! the BIOS Information Table (BIT) embedded in them.
//!
//! This is a `no_std` compatible library, which can be used in both `std`
//! and `no_std` environments.  It never reads outside the image it is given:
//! all offsets found in the firmware are bounds-checked before use, so
//! corrupt or truncated dumps produce as much of the report as their valid
//! structure allows.
//!
//! This is used by:
//! - `nvbit-info` - PC based tool to print the BIT structure of a ROM file
//!
//! Typically used like this:
//!
//! ```rust ignore
//! use nvbit_parser::{RomImage, render_report};
//! let mut report = String::new();
//! render_report(&mut report, "gpu.rom", &RomImage::new(&rom_bytes))?;
//! ```
//!
//! The individual stages are also exposed: [`find_pci_expansion_rom`],
//! [`find_bit_header`], [`TokenWalker`] and [`decode_payload`].

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod error;
pub mod header;
pub mod locate;
pub mod payload;
pub mod report;
pub mod rom;
pub mod token;

pub use error::{Error, Result};
pub use header::{BIT_HEADER_SIZE, BitHeader, checksum_valid};
pub use locate::{find_bit_header, find_pci_expansion_rom};
pub use payload::{BiosData, Payload, RomString, StringTable, decode_payload, read_string};
pub use report::render_report;
pub use rom::RomImage;
pub use token::{BIT_TOKEN_SIZE, BitToken, DirectoryEntry, TokenKind, TokenWalker};
