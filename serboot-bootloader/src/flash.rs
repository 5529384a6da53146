// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Flash access through the RP2040 ROM routines.
//!
//! On RP2040, flash operations (erase/program) require disabling XIP first.
//! The full sequence is:
//!   1. connect_internal_flash()
//!   2. flash_exit_xip()
//!   3. flash_range_erase() or flash_range_program()
//!   4. flash_flush_cache()
//!   5. flash_enter_cmd_xip()
//!
//! All code executing during steps 1-5 must run from RAM, not flash.
//! We use `#[link_section = ".data"]` to place critical functions in RAM,
//! and pre-resolve all ROM function pointers at init time. Interrupts are
//! masked by the flash-resident callers, so no handler can fetch from XIP
//! while it is down.
//!
//! The ROM programs whole 256-byte pages. A double-word is programmed as a
//! page of `0xFF` with the word in place; NOR programming only clears bits,
//! so the rest of the page is left as it was.

use serboot_common::layout::{FLASH_BASE, FLASH_SECTOR_SIZE, WORD_SIZE};
use serboot_common::{Error, FlashDevice};

const FLASH_PAGE_SIZE: u32 = 256;
const PAGE: usize = FLASH_PAGE_SIZE as usize;

/// 4K sector erase command passed to `flash_range_erase`.
const SECTOR_ERASE_CMD: u8 = 0x20;

// ROM function pointer types
type RomFnVoid = unsafe extern "C" fn();
type RomFnErase = unsafe extern "C" fn(u32, usize, u32, u8);
type RomFnProgram = unsafe extern "C" fn(u32, *const u8, usize);

/// ROM function pointers, resolved once at init from the ROM table.
/// Stored in static RAM so RAM-resident functions can call them without
/// accessing flash-based code.
static mut ROM_CONNECT_INTERNAL_FLASH: RomFnVoid = dummy_void;
static mut ROM_FLASH_EXIT_XIP: RomFnVoid = dummy_void;
static mut ROM_FLASH_RANGE_ERASE: RomFnErase = dummy_erase;
static mut ROM_FLASH_RANGE_PROGRAM: RomFnProgram = dummy_program;
static mut ROM_FLASH_FLUSH_CACHE: RomFnVoid = dummy_void;
static mut ROM_FLASH_ENTER_CMD_XIP: RomFnVoid = dummy_void;

unsafe extern "C" fn dummy_void() {}
unsafe extern "C" fn dummy_erase(_: u32, _: usize, _: u32, _: u8) {}
unsafe extern "C" fn dummy_program(_: u32, _: *const u8, _: usize) {}

/// Look up a ROM function by its two-character tag.
/// ROM table pointer at 0x14 and lookup function at 0x18 are 16-bit halfword pointers.
unsafe fn rom_func_lookup(tag: &[u8; 2]) -> usize {
    let fn_table = *(0x14 as *const u16) as *const u16;
    let lookup: unsafe extern "C" fn(*const u16, u32) -> usize =
        core::mem::transmute::<usize, unsafe extern "C" fn(*const u16, u32) -> usize>(
            *(0x18 as *const u16) as usize,
        );
    let code = u16::from_le_bytes(*tag) as u32;
    lookup(fn_table, code)
}

/// Initialize ROM flash function pointers. Must be called once before any flash operations.
/// This performs ROM table lookups which require XIP to be active.
pub fn init() {
    unsafe {
        ROM_CONNECT_INTERNAL_FLASH =
            core::mem::transmute::<usize, RomFnVoid>(rom_func_lookup(b"IF"));
        ROM_FLASH_EXIT_XIP = core::mem::transmute::<usize, RomFnVoid>(rom_func_lookup(b"EX"));
        ROM_FLASH_RANGE_ERASE =
            core::mem::transmute::<usize, RomFnErase>(rom_func_lookup(b"RE"));
        ROM_FLASH_RANGE_PROGRAM =
            core::mem::transmute::<usize, RomFnProgram>(rom_func_lookup(b"RP"));
        ROM_FLASH_FLUSH_CACHE = core::mem::transmute::<usize, RomFnVoid>(rom_func_lookup(b"FC"));
        ROM_FLASH_ENTER_CMD_XIP =
            core::mem::transmute::<usize, RomFnVoid>(rom_func_lookup(b"CX"));
    }
}

#[link_section = ".data"]
#[inline(never)]
unsafe fn ram_erase(offset: u32, size: u32) {
    ROM_CONNECT_INTERNAL_FLASH();
    ROM_FLASH_EXIT_XIP();
    ROM_FLASH_RANGE_ERASE(offset, size as usize, FLASH_SECTOR_SIZE, SECTOR_ERASE_CMD);
    ROM_FLASH_FLUSH_CACHE();
    ROM_FLASH_ENTER_CMD_XIP();
}

#[link_section = ".data"]
#[inline(never)]
unsafe fn ram_program(offset: u32, data: *const u8, len: usize) {
    ROM_CONNECT_INTERNAL_FLASH();
    ROM_FLASH_EXIT_XIP();
    ROM_FLASH_RANGE_PROGRAM(offset, data, len);
    ROM_FLASH_FLUSH_CACHE();
    ROM_FLASH_ENTER_CMD_XIP();
}

/// Run `f` with interrupts masked, restoring the previous PRIMASK state.
fn with_xip_down<F: FnOnce()>(f: F) {
    let primask = cortex_m::register::primask::read();
    cortex_m::interrupt::disable();
    f();
    if primask.is_active() {
        // SAFETY: interrupts were enabled on entry.
        unsafe { cortex_m::interrupt::enable() };
    }
}

/// Read bytes from an absolute XIP flash address via volatile reads.
pub fn flash_read(abs_addr: u32, buf: &mut [u8]) {
    for (i, byte) in buf.iter_mut().enumerate() {
        *byte = unsafe { ((abs_addr + i as u32) as *const u8).read_volatile() };
    }
}

/// Internal QSPI flash behind XIP.
pub struct RpFlash {
    _private: (),
}

impl RpFlash {
    /// `init()` must have run before the first erase or program.
    pub fn new() -> Self {
        Self { _private: () }
    }

    /// Program `data` inside the page holding `addr`, then read it back.
    fn program_in_page(&mut self, addr: u32, data: &[u8]) -> Result<(), Error> {
        let page_base = addr & !(FLASH_PAGE_SIZE - 1);
        let at = (addr - page_base) as usize;

        let mut page = [0xFFu8; PAGE];
        page[at..at + data.len()].copy_from_slice(data);

        let offset = page_base - FLASH_BASE;
        with_xip_down(|| unsafe { ram_program(offset, page.as_ptr(), page.len()) });

        self.check_programmed(addr, data)
    }

    /// A word that reads back differently was not erased or failed to program.
    fn check_programmed(&mut self, addr: u32, data: &[u8]) -> Result<(), Error> {
        let mut actual = [0u8; WORD_SIZE];
        for (i, expected) in data.chunks_exact(WORD_SIZE).enumerate() {
            let word_addr = addr + (i * WORD_SIZE) as u32;
            flash_read(word_addr, &mut actual);
            if &actual[..] != expected {
                return Err(Error::FlashProgram { addr: word_addr });
            }
        }
        Ok(())
    }

    fn check_program_target(addr: u32, len: usize) -> Result<(), Error> {
        if addr < FLASH_BASE || addr % WORD_SIZE as u32 != 0 || len % WORD_SIZE != 0 {
            return Err(Error::FlashProgram { addr });
        }
        Ok(())
    }
}

impl FlashDevice for RpFlash {
    fn read(&mut self, addr: u32, buf: &mut [u8]) {
        flash_read(addr, buf);
    }

    fn program_word(&mut self, addr: u32, word: [u8; WORD_SIZE]) -> Result<(), Error> {
        Self::check_program_target(addr, WORD_SIZE)?;
        self.program_in_page(addr, &word)
    }

    /// One ROM call per touched page instead of one per word.
    fn program_words(&mut self, addr: u32, data: &[u8]) -> Result<(), Error> {
        Self::check_program_target(addr, data.len())?;

        let mut at = addr;
        let mut rest = data;
        while !rest.is_empty() {
            let room = (FLASH_PAGE_SIZE - at % FLASH_PAGE_SIZE) as usize;
            let n = rest.len().min(room);
            self.program_in_page(at, &rest[..n])?;
            at += n as u32;
            rest = &rest[n..];
        }
        Ok(())
    }

    fn erase(&mut self, start: u32, end: u32) -> Result<(), Error> {
        if start < FLASH_BASE
            || end <= start
            || start % FLASH_SECTOR_SIZE != 0
            || end % FLASH_SECTOR_SIZE != 0
        {
            return Err(Error::FlashErase { start, end });
        }

        let offset = start - FLASH_BASE;
        with_xip_down(|| unsafe { ram_erase(offset, end - start) });

        let mut probe = [0u8; WORD_SIZE];
        flash_read(start, &mut probe);
        if probe.iter().any(|&b| b != 0xFF) {
            defmt::error!("flash: erase 0x{:08x}..0x{:08x} did not stick", start, end);
            return Err(Error::FlashErase { start, end });
        }
        Ok(())
    }
}
