// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Integrity check of the stored application image.

use crate::checksum::{words_from_le, CHECKSUM_WORD};
use crate::device::{FlashDevice, HardwareChecksum};
use crate::layout::FlashRegion;
use crate::metadata::MetadataStore;

const READ_CHUNK: usize = 256;

/// Outcome of an integrity check. Only `Valid` allows an autonomous launch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Verdict {
    Valid,
    /// Stored length is zero: nothing was ever programmed.
    Empty,
    /// Stored length does not fit the application region (e.g. erased metadata).
    LengthOutOfRange { length: u32 },
    /// Metadata could not be read.
    Unreadable,
    Mismatch { stored: u32, computed: u32 },
}

impl Verdict {
    pub fn is_valid(&self) -> bool {
        matches!(self, Verdict::Valid)
    }
}

#[derive(Clone, Copy, Debug)]
pub struct IntegrityVerifier {
    app: FlashRegion,
    store: MetadataStore,
}

impl IntegrityVerifier {
    pub fn new(app: FlashRegion, store: MetadataStore) -> Self {
        Self { app, store }
    }

    pub fn verify<B: FlashDevice + HardwareChecksum>(&self, board: &mut B) -> bool {
        self.check(board).is_valid()
    }

    /// Recompute the checksum over `app_length / 4` words of the application
    /// region and compare it with the stamped one.
    pub fn check<B: FlashDevice + HardwareChecksum>(&self, board: &mut B) -> Verdict {
        let meta = match self.store.load(board) {
            Ok(meta) => meta,
            Err(_) => return Verdict::Unreadable,
        };

        if meta.app_length == 0 {
            return Verdict::Empty;
        }
        if meta.app_length > self.app.size() {
            boot_log!(warn, "verify: stored length {} exceeds region", meta.app_length);
            return Verdict::LengthOutOfRange {
                length: meta.app_length,
            };
        }

        let computed = self.compute(board, meta.app_length);
        if computed != meta.app_checksum {
            boot_log!(
                warn,
                "verify: checksum mismatch: expected 0x{:08x}, got 0x{:08x}",
                meta.app_checksum,
                computed
            );
            return Verdict::Mismatch {
                stored: meta.app_checksum,
                computed,
            };
        }

        Verdict::Valid
    }

    fn compute<B: FlashDevice + HardwareChecksum>(&self, board: &mut B, length: u32) -> u32 {
        let covered = (length as usize / CHECKSUM_WORD) * CHECKSUM_WORD;
        let mut chunk = [0u8; READ_CHUNK];
        let mut words = [0u32; READ_CHUNK / CHECKSUM_WORD];
        let mut addr = self.app.start;
        let mut remaining = covered;

        board.reset();
        while remaining > 0 {
            let n = remaining.min(READ_CHUNK);
            board.read(addr, &mut chunk[..n]);
            let count = words_from_le(&chunk[..n], &mut words);
            board.accumulate(&words[..count]);
            addr += n as u32;
            remaining -= n;
        }
        board.finish()
    }
}
