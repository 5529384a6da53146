// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Capability traits the engine consumes. A board implements them over its
//! flash controller, checksum unit, byte link and core peripherals; tests
//! implement them over RAM.

use crate::error::Error;
use crate::inbox::Frame;
use crate::layout::WORD_SIZE;

/// Memory-mapped flash with double-word programming.
pub trait FlashDevice {
    /// Copy `buf.len()` bytes starting at absolute address `addr`.
    fn read(&mut self, addr: u32, buf: &mut [u8]);

    /// Program one double-word. `addr` must be `WORD_SIZE`-aligned and the
    /// target erased.
    fn program_word(&mut self, addr: u32, word: [u8; WORD_SIZE]) -> Result<(), Error>;

    /// Program consecutive whole double-words starting at `addr`.
    ///
    /// `data.len()` must be a multiple of `WORD_SIZE`. Boards with a wider
    /// native program unit override this.
    fn program_words(&mut self, addr: u32, data: &[u8]) -> Result<(), Error> {
        let mut at = addr;
        for chunk in data.chunks_exact(WORD_SIZE) {
            let mut word = [0u8; WORD_SIZE];
            word.copy_from_slice(chunk);
            self.program_word(at, word)?;
            at += WORD_SIZE as u32;
        }
        Ok(())
    }

    /// Erase every erase unit in `[start, end)`; erased bytes read `0xFF`.
    fn erase(&mut self, start: u32, end: u32) -> Result<(), Error>;
}

/// 32-bit checksum unit fed with whole words (STM32 CRC semantics).
pub trait HardwareChecksum {
    /// Restart the computation from the initial value.
    fn reset(&mut self);

    fn accumulate(&mut self, words: &[u32]);

    /// Checksum of every word accumulated since the last `reset`.
    fn finish(&mut self) -> u32;

    fn checksum32(&mut self, words: &[u32]) -> u32 {
        self.reset();
        self.accumulate(words);
        self.finish()
    }
}

/// Outgoing half of the byte link to the host.
pub trait Transport {
    fn send(&mut self, bytes: &[u8]);

    /// Stop the link peripheral before handing the core to the application.
    fn close(&mut self) {}
}

/// Core-level controls.
pub trait SystemControl {
    /// Request a system reset. Never returns on hardware.
    fn system_reset(&mut self);

    /// Mask every interrupt source and clear pending ones.
    fn disable_interrupts(&mut self);

    /// Load the stack pointer and branch to `entry`. Never returns on hardware.
    ///
    /// # Safety
    /// `initial_sp` and `entry` must come from a validated vector table;
    /// nothing of the bootloader survives the call.
    unsafe fn start_app(&mut self, initial_sp: u32, entry: u32);
}

/// Consumer side of the receive path.
pub trait FrameSource {
    /// Take the pending frame, clearing the availability signal.
    fn poll(&mut self) -> Option<Frame>;
}

/// Everything the command dispatcher drives.
pub trait Board: FlashDevice + HardwareChecksum + Transport + SystemControl {}

impl<T: FlashDevice + HardwareChecksum + Transport + SystemControl> Board for T {}
