// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Handoff to the application image.
//!
//! `AppLauncher::jump` is the only place that hands the core to another
//! image. The vector table is checked first; the transfer itself is the
//! board's `SystemControl::start_app`.

use crate::device::{FlashDevice, SystemControl, Transport};
use crate::error::Error;
use crate::layout::StackWindow;

/// First two words of a Cortex-M vector table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct VectorTable {
    pub initial_sp: u32,
    pub reset_vector: u32,
}

impl VectorTable {
    pub fn read_from<F: FlashDevice>(flash: &mut F, base: u32) -> Self {
        let mut raw = [0u8; 8];
        flash.read(base, &mut raw);
        Self {
            initial_sp: u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]),
            reset_vector: u32::from_le_bytes([raw[4], raw[5], raw[6], raw[7]]),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct AppLauncher {
    stack: StackWindow,
}

impl AppLauncher {
    pub fn new(stack: StackWindow) -> Self {
        Self { stack }
    }

    /// Read the vector table at `base` and check its initial stack pointer.
    pub fn probe<F: FlashDevice>(&self, flash: &mut F, base: u32) -> Result<VectorTable, Error> {
        let vt = VectorTable::read_from(flash, base);
        if self.stack.admits(vt.initial_sp) {
            Ok(vt)
        } else {
            Err(Error::NoApplicationFound {
                initial_sp: vt.initial_sp,
            })
        }
    }

    /// Transfer control to the image at `base`.
    ///
    /// On hardware a successful call does not return. `Err` means the image
    /// was rejected and nothing was touched.
    pub fn jump<B>(&self, board: &mut B, base: u32) -> Result<(), Error>
    where
        B: FlashDevice + Transport + SystemControl,
    {
        let vt = match self.probe(board, base) {
            Ok(vt) => vt,
            Err(e) => {
                boot_log!(error, "launch: no application at 0x{:08x}", base);
                return Err(e);
            }
        };

        boot_log!(
            info,
            "launch: SP=0x{:08x} entry=0x{:08x}",
            vt.initial_sp,
            vt.reset_vector
        );

        board.close();
        board.disable_interrupts();
        // SAFETY: the stack pointer passed the RAM window check above.
        unsafe { board.start_app(vt.initial_sp, vt.reset_vector) };
        Ok(())
    }
}
