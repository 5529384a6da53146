// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Error kinds reported by the update engine.

use core::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Address not double-word aligned, or the program primitive failed.
    FlashProgram { addr: u32 },
    /// The erase primitive failed or the range is not erasable.
    FlashErase { start: u32, end: u32 },
    /// A write would leave its declared flash region.
    OutOfRegion { addr: u32, len: u32 },
    /// Field does not fit in the metadata sector's usable size.
    MetadataOverflow { offset: u32, len: u32 },
    /// The word at the application base is not a plausible stack pointer.
    NoApplicationFound { initial_sp: u32 },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Error::FlashProgram { addr } => write!(f, "flash program failed at 0x{:08x}", addr),
            Error::FlashErase { start, end } => {
                write!(f, "flash erase failed for 0x{:08x}..0x{:08x}", start, end)
            }
            Error::OutOfRegion { addr, len } => {
                write!(f, "{} bytes at 0x{:08x} leave the flash region", len, addr)
            }
            Error::MetadataOverflow { offset, len } => {
                write!(f, "metadata field {}+{} exceeds usable size", offset, len)
            }
            Error::NoApplicationFound { initial_sp } => {
                write!(f, "no application found (initial SP 0x{:08x})", initial_sp)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}
