// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! RP2040 implementation of the engine's capability traits.

use serboot_common::layout::WORD_SIZE;
use serboot_common::{
    Error, FlashDevice, HardwareChecksum, SoftwareCrc, SystemControl, Transport,
};

use crate::boot;
use crate::flash::RpFlash;
use crate::usb_transport;

pub struct Rp2040Board {
    flash: RpFlash,
    /// RP2040 has no CRC unit with STM32 semantics.
    crc: SoftwareCrc,
    /// Where the application's vector table lives.
    vector_base: u32,
}

impl Rp2040Board {
    pub fn new(vector_base: u32) -> Self {
        Self {
            flash: RpFlash::new(),
            crc: SoftwareCrc::new(),
            vector_base,
        }
    }
}

impl FlashDevice for Rp2040Board {
    fn read(&mut self, addr: u32, buf: &mut [u8]) {
        self.flash.read(addr, buf);
    }

    fn program_word(&mut self, addr: u32, word: [u8; WORD_SIZE]) -> Result<(), Error> {
        self.flash.program_word(addr, word)
    }

    fn program_words(&mut self, addr: u32, data: &[u8]) -> Result<(), Error> {
        self.flash.program_words(addr, data)
    }

    fn erase(&mut self, start: u32, end: u32) -> Result<(), Error> {
        self.flash.erase(start, end)
    }
}

impl HardwareChecksum for Rp2040Board {
    fn reset(&mut self) {
        self.crc.reset();
    }

    fn accumulate(&mut self, words: &[u32]) {
        self.crc.accumulate(words);
    }

    fn finish(&mut self) -> u32 {
        self.crc.finish()
    }
}

impl Transport for Rp2040Board {
    fn send(&mut self, bytes: &[u8]) {
        usb_transport::send(bytes);
    }

    fn close(&mut self) {
        usb_transport::close();
    }
}

impl SystemControl for Rp2040Board {
    fn system_reset(&mut self) {
        defmt::info!("board: reset requested");
        cortex_m::peripheral::SCB::sys_reset();
    }

    fn disable_interrupts(&mut self) {
        boot::quiesce_interrupts();
    }

    unsafe fn start_app(&mut self, initial_sp: u32, entry: u32) {
        boot::start_app(self.vector_base, initial_sp, entry);
    }
}
