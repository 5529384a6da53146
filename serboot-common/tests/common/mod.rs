// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! In-memory board shared by the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;

use serboot_common::layout::{BootLayout, FlashRegion, StackWindow, WORD_SIZE};
use serboot_common::{
    Error, FlashDevice, Frame, FrameSource, HardwareChecksum, SoftwareCrc, SystemControl,
    Transport,
};

pub const MEM_BASE: u32 = 0x0800_0000;
pub const MEM_SIZE: usize = 0x8000;
pub const SECTOR: u32 = 4096;

pub const APP_START: u32 = 0x0800_4000;
pub const APP_END: u32 = 0x0800_5000;
pub const META_START: u32 = 0x0800_6000;
pub const META_USABLE: u32 = 64;

pub const GOOD_SP: u32 = 0x2000_5000;
pub const GOOD_ENTRY: u32 = 0x0800_4101;

pub fn test_layout() -> BootLayout {
    BootLayout {
        app: FlashRegion::new(APP_START, APP_END),
        meta: FlashRegion::new(META_START, META_START + META_USABLE),
        stack: StackWindow {
            mask: 0x2FFE_0000,
            pattern: 0x2000_0000,
        },
    }
}

/// NOR-like flash: programming only clears bits, erase sets whole sectors to 0xFF.
pub struct MockBoard {
    pub mem: Vec<u8>,
    pub reads: usize,
    pub program_calls: Vec<(u32, [u8; WORD_SIZE])>,
    pub erase_calls: Vec<(u32, u32)>,
    pub fail_program_at: Option<u32>,
    pub fail_erase: bool,
    pub sent: Vec<Vec<u8>>,
    pub resets: u32,
    pub interrupts_disabled: bool,
    pub closed: bool,
    pub jumps: Vec<(u32, u32)>,
    crc: SoftwareCrc,
}

impl MockBoard {
    pub fn new() -> Self {
        Self {
            mem: vec![0xFF; MEM_SIZE],
            reads: 0,
            program_calls: Vec::new(),
            erase_calls: Vec::new(),
            fail_program_at: None,
            fail_erase: false,
            sent: Vec::new(),
            resets: 0,
            interrupts_disabled: false,
            closed: false,
            jumps: Vec::new(),
            crc: SoftwareCrc::new(),
        }
    }

    fn index(addr: u32) -> usize {
        assert!(addr >= MEM_BASE, "address 0x{:08x} below mock flash", addr);
        (addr - MEM_BASE) as usize
    }

    pub fn bytes(&self, addr: u32, len: usize) -> &[u8] {
        let i = Self::index(addr);
        &self.mem[i..i + len]
    }

    /// Place raw bytes as if a previous session had programmed them.
    pub fn preload(&mut self, addr: u32, data: &[u8]) {
        let i = Self::index(addr);
        self.mem[i..i + data.len()].copy_from_slice(data);
    }

    pub fn clear_counters(&mut self) {
        self.reads = 0;
        self.program_calls.clear();
        self.erase_calls.clear();
    }
}

impl FlashDevice for MockBoard {
    fn read(&mut self, addr: u32, buf: &mut [u8]) {
        self.reads += 1;
        let i = Self::index(addr);
        buf.copy_from_slice(&self.mem[i..i + buf.len()]);
    }

    fn program_word(&mut self, addr: u32, word: [u8; WORD_SIZE]) -> Result<(), Error> {
        if addr % WORD_SIZE as u32 != 0 || self.fail_program_at == Some(addr) {
            return Err(Error::FlashProgram { addr });
        }
        self.program_calls.push((addr, word));
        let i = Self::index(addr);
        for (cell, byte) in self.mem[i..i + WORD_SIZE].iter_mut().zip(word) {
            *cell &= byte;
        }
        Ok(())
    }

    fn erase(&mut self, start: u32, end: u32) -> Result<(), Error> {
        if self.fail_erase || start % SECTOR != 0 || end % SECTOR != 0 || end <= start {
            return Err(Error::FlashErase { start, end });
        }
        self.erase_calls.push((start, end));
        let (i, j) = (Self::index(start), Self::index(end));
        self.mem[i..j].fill(0xFF);
        Ok(())
    }
}

impl HardwareChecksum for MockBoard {
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

impl Transport for MockBoard {
    fn send(&mut self, bytes: &[u8]) {
        self.sent.push(bytes.to_vec());
    }

    fn close(&mut self) {
        self.closed = true;
    }
}

impl SystemControl for MockBoard {
    fn system_reset(&mut self) {
        self.resets += 1;
    }

    fn disable_interrupts(&mut self) {
        self.interrupts_disabled = true;
    }

    unsafe fn start_app(&mut self, initial_sp: u32, entry: u32) {
        self.jumps.push((initial_sp, entry));
    }
}

/// Frames handed out one per poll, in order.
#[derive(Default)]
pub struct ScriptedSource {
    pub frames: VecDeque<Frame>,
}

impl ScriptedSource {
    pub fn new(frames: &[&[u8]]) -> Self {
        let mut source = Self::default();
        for f in frames {
            source.push(f);
        }
        source
    }

    pub fn push(&mut self, bytes: &[u8]) {
        self.frames.push_back(frame(bytes));
    }
}

impl FrameSource for ScriptedSource {
    fn poll(&mut self) -> Option<Frame> {
        self.frames.pop_front()
    }
}

pub fn frame(bytes: &[u8]) -> Frame {
    Frame::from_slice(bytes).expect("frame too large")
}

/// An image of `len` bytes (len >= 8) with a valid vector table up front.
pub fn app_image(len: usize) -> Vec<u8> {
    let mut image: Vec<u8> = (0..len).map(|i| (i * 7 + 3) as u8).collect();
    image[..4].copy_from_slice(&GOOD_SP.to_le_bytes());
    image[4..8].copy_from_slice(&GOOD_ENTRY.to_le_bytes());
    image
}
