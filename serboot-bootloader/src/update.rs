// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Tick loop: one dispatcher step per tick, 100 ms between ticks unless a
//! multi-frame command is in flight. The LED toggles on every waited tick.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::StatefulOutputPin;
use serboot_common::boot_fsm::TICK_MS;
use serboot_common::{BootPhase, BootSequencer, Tick};

use crate::board::Rp2040Board;
use crate::peripherals::Peripherals;
use crate::usb_transport::UsbFrames;

pub fn run(p: &mut Peripherals, mut sequencer: BootSequencer<Rp2040Board, UsbFrames>) -> ! {
    defmt::println!("Listening for host commands");

    let mut announced_stay = false;
    loop {
        let tick = sequencer.tick();

        match tick {
            Tick::Rearmed => defmt::println!("No valid application, listening again"),
            Tick::Stay if !announced_stay => {
                defmt::println!("Host seen, staying in update mode");
                announced_stay = true;
            }
            Tick::Launched => {
                // Only reached if the handoff returned.
                defmt::error!("Application returned to the bootloader");
            }
            _ => {}
        }

        if tick.wants_delay() {
            p.led_pin.toggle().ok();
            p.timer.delay_ms(TICK_MS);
        }

        if sequencer.phase() == BootPhase::Launch {
            cortex_m::peripheral::SCB::sys_reset();
        }
    }
}
