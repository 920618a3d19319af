// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

//! Bounds-checked access to a loaded ROM image.
//!
//! Every read the parser makes goes through [`RomImage`].  A read succeeds
//! only if `offset + width <= len()`, computed without overflow, so corrupt
//! offsets in the firmware can never index past the buffer.

use deku::prelude::*;

use crate::error::{Error, Result};

/// A fixed-layout little-endian record that can be decoded from the image.
pub trait Record: Sized + for<'a> DekuContainerRead<'a> {
    /// Size of the packed on-disk layout, in bytes.
    const SIZE: usize;
}

/// Immutable view over the raw bytes of a ROM image.
#[derive(Debug, Clone, Copy)]
pub struct RomImage<'a> {
    data: &'a [u8],
}

impl<'a> RomImage<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns `true` if `len` bytes starting at `offset` lie within the
    /// image.
    pub fn contains(&self, offset: usize, len: usize) -> bool {
        offset
            .checked_add(len)
            .is_some_and(|end| end <= self.data.len())
    }

    /// Returns the `len` bytes at `offset`.
    pub fn bytes(&self, offset: usize, len: usize) -> Result<&'a [u8]> {
        if !self.contains(offset, len) {
            return Err(Error::OutOfBounds {
                offset,
                len,
                available: self.data.len(),
            });
        }
        Ok(&self.data[offset..offset + len])
    }

    /// Returns the bytes from `offset` to the end of the image.  An offset at
    /// exactly `len()` yields an empty slice.
    pub fn tail(&self, offset: usize) -> Result<&'a [u8]> {
        self.data.get(offset..).ok_or(Error::OutOfBounds {
            offset,
            len: 0,
            available: self.data.len(),
        })
    }

    pub fn read_u8(&self, offset: usize) -> Result<u8> {
        Ok(self.bytes(offset, 1)?[0])
    }

    pub fn read_u16(&self, offset: usize) -> Result<u16> {
        let b = self.bytes(offset, 2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub fn read_u32(&self, offset: usize) -> Result<u32> {
        let b = self.bytes(offset, 4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Decodes a [`Record`] from exactly `T::SIZE` bytes at `offset`.
    pub fn read_record<T: Record>(&self, offset: usize) -> Result<T> {
        let bytes = self.bytes(offset, T::SIZE)?;
        T::from_bytes((bytes, 0))
            .map(|(_, record)| record)
            .map_err(|e| Error::Decode(alloc::format!("{}", e)))
    }
}
