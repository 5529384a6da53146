// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Private metadata sector: image length and checksum.
//!
//! Fields are smaller than the erase unit, so every field write is
//! read-sector, erase-sector, patch, reprogram-sector. A power loss between
//! erase and reprogram loses every field, not only the one being written.
//! Keeping the layout of a single sector means this is not fixed here.

use crate::device::FlashDevice;
use crate::error::Error;
use crate::layout::{
    FlashRegion, APP_CHECKSUM_OFFSET, APP_LENGTH_OFFSET, META_SECTOR_SIZE, WORD_SIZE,
};

/// Persisted image description.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PrivateMetadata {
    pub app_length: u32,
    pub app_checksum: u32,
}

#[derive(Clone, Copy, Debug)]
pub struct MetadataStore {
    /// Usable bytes, starting at the sector base.
    region: FlashRegion,
}

impl MetadataStore {
    pub fn new(region: FlashRegion) -> Self {
        debug_assert!(region.size() as usize <= META_SECTOR_SIZE);
        Self { region }
    }

    pub fn region(&self) -> FlashRegion {
        self.region
    }

    /// Overwrite `bytes.len()` bytes at `offset`, keeping every other field.
    pub fn write_field<F: FlashDevice>(
        &self,
        flash: &mut F,
        offset: u32,
        bytes: &[u8],
    ) -> Result<(), Error> {
        self.check_field(offset, bytes.len())?;

        let base = self.region.start;
        let mut sector = [0xFFu8; META_SECTOR_SIZE];
        flash.read(base, &mut sector);

        flash.erase(base, base + META_SECTOR_SIZE as u32)?;

        let start = offset as usize;
        sector[start..start + bytes.len()].copy_from_slice(bytes);

        for (i, chunk) in sector.chunks_exact(WORD_SIZE).enumerate() {
            // Erased words already read back as 0xFF.
            if chunk.iter().all(|&b| b == 0xFF) {
                continue;
            }
            let mut word = [0u8; WORD_SIZE];
            word.copy_from_slice(chunk);
            flash.program_word(base + (i * WORD_SIZE) as u32, word)?;
        }

        boot_log!(debug, "metadata: wrote {} bytes at offset {}", bytes.len(), offset);
        Ok(())
    }

    pub fn read_field<F: FlashDevice>(
        &self,
        flash: &mut F,
        offset: u32,
        buf: &mut [u8],
    ) -> Result<(), Error> {
        self.check_field(offset, buf.len())?;
        flash.read(self.region.start + offset, buf);
        Ok(())
    }

    pub fn write_u32<F: FlashDevice>(&self, flash: &mut F, offset: u32, value: u32) -> Result<(), Error> {
        self.write_field(flash, offset, &value.to_le_bytes())
    }

    pub fn read_u32<F: FlashDevice>(&self, flash: &mut F, offset: u32) -> Result<u32, Error> {
        let mut bytes = [0u8; 4];
        self.read_field(flash, offset, &mut bytes)?;
        Ok(u32::from_le_bytes(bytes))
    }

    pub fn set_app_length<F: FlashDevice>(&self, flash: &mut F, length: u32) -> Result<(), Error> {
        self.write_u32(flash, APP_LENGTH_OFFSET, length)
    }

    pub fn set_app_checksum<F: FlashDevice>(&self, flash: &mut F, checksum: u32) -> Result<(), Error> {
        self.write_u32(flash, APP_CHECKSUM_OFFSET, checksum)
    }

    /// Read both fields. After an erase they read `0xFFFF_FFFF`.
    pub fn load<F: FlashDevice>(&self, flash: &mut F) -> Result<PrivateMetadata, Error> {
        Ok(PrivateMetadata {
            app_length: self.read_u32(flash, APP_LENGTH_OFFSET)?,
            app_checksum: self.read_u32(flash, APP_CHECKSUM_OFFSET)?,
        })
    }

    fn check_field(&self, offset: u32, len: usize) -> Result<(), Error> {
        if offset as u64 + len as u64 > self.region.size() as u64 {
            return Err(Error::MetadataOverflow {
                offset,
                len: len as u32,
            });
        }
        Ok(())
    }
}
