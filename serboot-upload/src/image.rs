// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Application image preparation.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serboot_common::checksum::CHECKSUM_WORD;
use serboot_common::image_checksum;
use serboot_common::layout::APP_MAX;
use serboot_common::protocol::END_OF_STREAM;

/// An image ready to stream: padded so every byte is covered by the checksum.
pub struct Image {
    pub bytes: Vec<u8>,
    pub checksum: u32,
    /// Bytes added to reach a whole checksum word.
    pub padding: usize,
}

impl Image {
    pub fn from_bytes(mut bytes: Vec<u8>) -> Result<Self> {
        if bytes.is_empty() {
            bail!("Image is empty");
        }

        let padding = (CHECKSUM_WORD - bytes.len() % CHECKSUM_WORD) % CHECKSUM_WORD;
        bytes.resize(bytes.len() + padding, 0xFF);

        if bytes.len() as u64 > APP_MAX as u64 {
            bail!(
                "Image is {} bytes, the application region holds {}",
                bytes.len(),
                APP_MAX
            );
        }

        let checksum = image_checksum(&bytes);
        Ok(Self {
            bytes,
            checksum,
            padding,
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_bytes(bytes).with_context(|| format!("Invalid image {}", path.display()))
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Offset of the first end-of-stream marker inside the image, if any. A
    /// marker at the end of a frame would cut the stream short.
    pub fn end_marker_offset(&self) -> Option<usize> {
        self.bytes
            .windows(END_OF_STREAM.len())
            .position(|w| w == END_OF_STREAM)
    }
}
