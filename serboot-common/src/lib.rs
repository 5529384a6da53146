// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Firmware-update engine for serboot.
//!
//! Everything the bootloader decides lives here, independent of the board:
//! - `protocol`: the `FE A5` byte protocol
//! - `inbox`: single-slot frame handoff from the receive interrupt
//! - `writer`: double-word alignment of the image stream
//! - `metadata`: image length / checksum sector
//! - `verify`: integrity check of the stored image
//! - `launch`: reset-vector validation and control transfer
//! - `dispatch`: command state machine
//! - `boot_fsm`: command window and launch decision
//!
//! Hardware is reached only through the capability traits in `device`.
//!
//! This crate supports both `no_std` (embedded) and `std` (host) environments:
//! - Default: `no_std` mode for embedded targets
//! - `std` feature: `std::error::Error` for host tools
//! - `defmt` feature: route `boot_log!` to defmt

#![cfg_attr(not(feature = "std"), no_std)]

#[macro_use]
pub mod log;

pub mod boot_fsm;
pub mod checksum;
pub mod device;
pub mod dispatch;
pub mod error;
pub mod inbox;
pub mod launch;
pub mod layout;
pub mod metadata;
pub mod protocol;
pub mod verify;
pub mod writer;

// Re-export commonly used types
pub use boot_fsm::{BootDecision, BootPhase, BootSequencer, Tick};
pub use checksum::{image_checksum, SoftwareCrc};
pub use device::{FlashDevice, FrameSource, HardwareChecksum, SystemControl, Transport};
pub use dispatch::{CommandDispatcher, DispatchState, Event};
pub use error::Error;
pub use inbox::{Frame, FrameProducer, FrameReceiver, Inbox, FRAME_CAPACITY};
pub use launch::{AppLauncher, VectorTable};
pub use layout::{BootLayout, FlashRegion, StackWindow, WORD_SIZE};
pub use metadata::{MetadataStore, PrivateMetadata};
pub use protocol::BootCommand;
pub use verify::{IntegrityVerifier, Verdict};
pub use writer::AlignmentWriter;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

/// Blink an LED a specified number of times.
pub fn blink(led: &mut impl OutputPin, timer: &mut impl DelayNs, count: u32, period_ms: u32) {
    for _ in 0..count {
        led.set_high().ok();
        timer.delay_ms(period_ms);
        led.set_low().ok();
        timer.delay_ms(period_ms);
    }
}
