// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

use clap::{ArgAction, Parser};
use log::LevelFilter;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "nvbit-info")]
#[command(about = "NVIDIA video BIOS Information Table (BIT) parser")]
#[command(version)]
pub struct Args {
    /// Path to the .rom file to parse
    pub rom: PathBuf,

    /// Optional text file to also write the report to
    pub output: Option<PathBuf>,

    /// Log more detail to stderr (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    pub fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }

    /// ROM dumps are expected to be named `*.rom`, but any file is parsed.
    pub fn has_rom_extension(&self) -> bool {
        self.rom
            .extension()
            .is_some_and(|ext| ext == "rom")
    }
}
