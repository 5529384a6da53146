// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Double-word alignment of an arbitrarily chunked image stream.
//!
//! The program primitive accepts aligned 8-byte words only, the link hands
//! over chunks of any size. Each `feed` completes the pending partial word,
//! programs the chunk's whole words in place, and keeps the tail for the
//! next call. `finish` programs the last partial word; the bytes past the
//! received data are written as `0xFF`, which leaves erased flash untouched.

use crate::device::FlashDevice;
use crate::error::Error;
use crate::layout::{FlashRegion, WORD_SIZE};

const WORD: u32 = WORD_SIZE as u32;

pub struct AlignmentWriter {
    region: FlashRegion,
    pending: [u8; WORD_SIZE],
    pending_len: usize,
    /// Bytes already programmed, relative to `region.start`.
    offset: u32,
}

impl AlignmentWriter {
    pub fn new(region: FlashRegion) -> Self {
        Self {
            region,
            pending: [0xFF; WORD_SIZE],
            pending_len: 0,
            offset: 0,
        }
    }

    /// Start a new image at the beginning of the region.
    pub fn reset(&mut self) {
        self.pending = [0xFF; WORD_SIZE];
        self.pending_len = 0;
        self.offset = 0;
    }

    /// Bytes programmed so far.
    pub fn written(&self) -> u32 {
        self.offset
    }

    /// Bytes waiting for the rest of their word.
    pub fn pending(&self) -> usize {
        self.pending_len
    }

    /// Accept the next chunk of the stream. Returns the bytes programmed so far.
    pub fn feed<F: FlashDevice>(&mut self, flash: &mut F, bytes: &[u8]) -> Result<u32, Error> {
        let mut rest = bytes;

        if self.pending_len > 0 {
            let take = (WORD_SIZE - self.pending_len).min(rest.len());
            self.pending[self.pending_len..self.pending_len + take].copy_from_slice(&rest[..take]);
            self.pending_len += take;
            rest = &rest[take..];

            if self.pending_len < WORD_SIZE {
                return Ok(self.offset);
            }
            let word = self.pending;
            self.program(flash, &word)?;
            self.pending = [0xFF; WORD_SIZE];
            self.pending_len = 0;
        }

        let whole = rest.len() - rest.len() % WORD_SIZE;
        if whole > 0 {
            self.program(flash, &rest[..whole])?;
        }

        let tail = &rest[whole..];
        self.pending[..tail.len()].copy_from_slice(tail);
        self.pending_len = tail.len();

        Ok(self.offset)
    }

    /// Flush the trailing partial word. Returns the total image length.
    pub fn finish<F: FlashDevice>(&mut self, flash: &mut F) -> Result<u32, Error> {
        if self.pending_len > 0 {
            let tail = self.pending_len as u32;
            let mut word = [0xFF; WORD_SIZE];
            word[..self.pending_len].copy_from_slice(&self.pending[..self.pending_len]);

            let addr = self.region.start + self.offset;
            self.check_bounds(addr, WORD)?;
            flash.program_word(addr, word)?;

            self.offset += tail;
            self.pending = [0xFF; WORD_SIZE];
            self.pending_len = 0;
        }
        Ok(self.offset)
    }

    fn program<F: FlashDevice>(&mut self, flash: &mut F, data: &[u8]) -> Result<(), Error> {
        let addr = self.region.start + self.offset;
        let len = data.len() as u32;
        self.check_bounds(addr, len)?;
        flash.program_words(addr, data)?;
        self.offset += len;
        Ok(())
    }

    fn check_bounds(&self, addr: u32, len: u32) -> Result<(), Error> {
        if self.region.contains(addr, len) {
            Ok(())
        } else {
            Err(Error::OutOfRegion { addr, len })
        }
    }
}
