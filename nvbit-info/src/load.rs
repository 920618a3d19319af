// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

use anyhow::{Context, Result};
use log::{debug, warn};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Reads the whole ROM image into memory.
pub fn load_rom<P: AsRef<Path>>(path: P) -> Result<Vec<u8>> {
    let path = path.as_ref();
    let data =
        fs::read(path).with_context(|| format!("Could not open file {}", path.display()))?;
    debug!("Loaded {} bytes from {}", data.len(), path.display());
    Ok(data)
}

/// Where the report goes: always stdout, plus an optional text file.
///
/// Failing to create the file is not fatal; the report is still written to
/// stdout.
pub struct ReportOutput {
    file: Option<(PathBuf, File)>,
}

impl ReportOutput {
    pub fn open(path: Option<&Path>) -> Self {
        let file = path.and_then(|path| match File::create(path) {
            Ok(file) => Some((path.to_path_buf(), file)),
            Err(e) => {
                warn!("Could not open output file {}: {}", path.display(), e);
                None
            }
        });
        Self { file }
    }

    pub fn has_file(&self) -> bool {
        self.file.is_some()
    }

    pub fn write(&mut self, text: &str) -> Result<()> {
        io::stdout()
            .write_all(text.as_bytes())
            .context("Failed to write report to stdout")?;
        if let Some((path, file)) = &mut self.file {
            file.write_all(text.as_bytes())
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
        }
        Ok(())
    }
}
