// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Software stand-in for the STM32 CRC unit.
//!
//! The peripheral computes CRC-32/MPEG-2 (poly 0x04C11DB7, init 0xFFFFFFFF,
//! no reflection, no final xor) over 32-bit words, most significant byte
//! first. Words are loaded little-endian from flash, so every word is fed as
//! its big-endian bytes. Images stamped by either implementation verify on
//! the other.

use crc::{Crc, Digest, CRC_32_MPEG_2};

use crate::device::HardwareChecksum;

static CRC32_MPEG2: Crc<u32> = Crc::<u32>::new(&CRC_32_MPEG_2);

/// Bytes per checksum word.
pub const CHECKSUM_WORD: usize = 4;

pub struct SoftwareCrc {
    digest: Digest<'static, u32>,
}

impl SoftwareCrc {
    pub fn new() -> Self {
        Self {
            digest: CRC32_MPEG2.digest(),
        }
    }
}

impl Default for SoftwareCrc {
    fn default() -> Self {
        Self::new()
    }
}

impl HardwareChecksum for SoftwareCrc {
    fn reset(&mut self) {
        self.digest = CRC32_MPEG2.digest();
    }

    fn accumulate(&mut self, words: &[u32]) {
        for word in words {
            self.digest.update(&word.to_be_bytes());
        }
    }

    fn finish(&mut self) -> u32 {
        core::mem::replace(&mut self.digest, CRC32_MPEG2.digest()).finalize()
    }
}

/// Checksum of an image as the verifier computes it: `len / 4` whole words,
/// a trailing partial word is not covered.
pub fn image_checksum(image: &[u8]) -> u32 {
    let mut digest = CRC32_MPEG2.digest();
    for chunk in image.chunks_exact(CHECKSUM_WORD) {
        let word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        digest.update(&word.to_be_bytes());
    }
    digest.finalize()
}

/// Pack little-endian bytes into checksum words; `bytes.len()` must be a
/// multiple of 4 and `words` long enough.
pub fn words_from_le(bytes: &[u8], words: &mut [u32]) -> usize {
    let mut count = 0;
    for (chunk, word) in bytes.chunks_exact(CHECKSUM_WORD).zip(words.iter_mut()) {
        *word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        count += 1;
    }
    count
}
