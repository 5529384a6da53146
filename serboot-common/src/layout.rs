// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Flash layout: regions, granularity and the default board map.

// --- Flash layout constants ---

pub const FLASH_BASE: u32 = 0x1000_0000;
pub const APP_BASE: u32 = 0x1001_0000;
pub const APP_MAX: u32 = 256 * 1024;

/// Private metadata lives in its own sector right after the application.
pub const META_BASE: u32 = APP_BASE + APP_MAX;
/// Usable bytes of the metadata sector; the rest is headroom.
pub const META_MAX: u32 = 256;

pub const FLASH_SECTOR_SIZE: u32 = 4096;
pub const META_SECTOR_SIZE: usize = FLASH_SECTOR_SIZE as usize;

/// Flash program granularity (one double-word).
pub const WORD_SIZE: usize = 8;

pub const APP_LENGTH_OFFSET: u32 = 0;
pub const APP_CHECKSUM_OFFSET: u32 = 4;

// Initial SP of a linked image must land in on-chip SRAM (0x2000_0000..0x2008_0000).
pub const STACK_MASK: u32 = 0x2FF8_0000;
pub const STACK_PATTERN: u32 = 0x2000_0000;

const _: () = assert!(META_MAX as usize <= META_SECTOR_SIZE);
const _: () = assert!(META_BASE % FLASH_SECTOR_SIZE == 0);

/// Half-open address range `[start, end)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FlashRegion {
    pub start: u32,
    pub end: u32,
}

impl FlashRegion {
    /// Panics (at compile time in const context) unless `end > start`.
    pub const fn new(start: u32, end: u32) -> Self {
        assert!(end > start, "flash region must not be empty");
        Self { start, end }
    }

    pub const fn size(&self) -> u32 {
        self.end - self.start
    }

    /// True when `[addr, addr + len)` lies inside the region.
    pub fn contains(&self, addr: u32, len: u32) -> bool {
        addr >= self.start && addr as u64 + len as u64 <= self.end as u64
    }
}

/// Plausibility test for an image's initial stack pointer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StackWindow {
    pub mask: u32,
    pub pattern: u32,
}

impl StackWindow {
    pub fn admits(&self, initial_sp: u32) -> bool {
        initial_sp & self.mask == self.pattern
    }
}

/// Everything the engine needs to know about where things live.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BootLayout {
    pub app: FlashRegion,
    /// Usable part of the metadata sector; starts on a sector boundary.
    pub meta: FlashRegion,
    pub stack: StackWindow,
}

impl BootLayout {
    pub const DEFAULT: BootLayout = BootLayout {
        app: FlashRegion::new(APP_BASE, APP_BASE + APP_MAX),
        meta: FlashRegion::new(META_BASE, META_BASE + META_MAX),
        stack: StackWindow {
            mask: STACK_MASK,
            pattern: STACK_PATTERN,
        },
    };
}

impl Default for BootLayout {
    fn default() -> Self {
        Self::DEFAULT
    }
}
