// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

//! nvbit-info
//!
//! This tool prints the BIOS Information Table (BIT) of an NVIDIA video BIOS
//! image, as dumped from a graphics card or extracted from a firmware update.
//!
//! It works by:
//! - Loading the provided file
//! - Looking for a PCI expansion ROM (55 AA + "PCIR") on 512 byte boundaries
//! - Scanning from there for the BIT header, validated by its checksum
//! - Walking the BIT token directory and decoding the data each token points
//!   at (BIOS data and string tables are decoded, other tokens hex dumped)
//!
//! The report is written to stdout and, optionally, to a text file.

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, warn};

use nvbit_parser::{RomImage, render_report};

mod args;
use args::Args;
mod load;
use load::{ReportOutput, load_rom};
mod logger;
use logger::StderrLogger;

fn main() -> Result<()> {
    let args = Args::parse();
    StderrLogger::new(args.log_level())
        .init()
        .context("Failed to initialise logging")?;

    if !args.has_rom_extension() {
        warn!("File does not have .rom extension");
    }

    // Open the output file first, so the report is captured even if parsing
    // fails part way through.
    let mut output = ReportOutput::open(args.output.as_deref());

    let data = load_rom(&args.rom)?;
    let name = args.rom.display().to_string();

    let mut report = String::new();
    let result = render_report(&mut report, &name, &RomImage::new(&data));
    output.write(&report)?;
    if let Some(path) = args.output.as_deref().filter(|_| output.has_file()) {
        debug!("Report also written to {}", path.display());
    }
    result.with_context(|| format!("Failed to parse {}", name))?;

    println!();
    println!("Parsing completed successfully!");

    Ok(())
}
