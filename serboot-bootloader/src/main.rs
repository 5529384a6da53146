// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! serboot: serial second-stage bootloader for RP2040 with a USB CDC link.

#![no_std]
#![no_main]

mod board;
mod boot;
mod flash;
mod peripherals;
mod update;
mod usb_transport;

use defmt_rtt as _;
use panic_probe as _;

defmt::timestamp!("{=u64:us}", { 0 });

use cortex_m_rt::entry;
use serboot_common::{BootLayout, BootSequencer, CommandDispatcher, Inbox};

#[unsafe(link_section = ".boot2")]
#[used]
pub static BOOT2: [u8; 256] = rp2040_boot2::BOOT_LOADER_GENERIC_03H;

#[entry]
fn main() -> ! {
    defmt::println!("Bootloader init");

    let mut p = peripherals::init();

    serboot_common::blink(&mut p.led_pin, &mut p.timer, 3, 200);
    flash::init();

    let inbox = cortex_m::singleton!(: Inbox = Inbox::new()).expect("inbox already taken");
    let (producer, receiver) = inbox.split();
    let usb = p.usb.take().expect("USB peripherals already taken");
    let frames = usb_transport::start(usb, producer, receiver);

    let layout = BootLayout::DEFAULT;
    defmt::println!(
        "App region 0x{:08x}..0x{:08x}, metadata at 0x{:08x}",
        layout.app.start,
        layout.app.end,
        layout.meta.start
    );

    let board = board::Rp2040Board::new(layout.app.start);
    let sequencer = BootSequencer::new(CommandDispatcher::new(board, layout), frames);

    update::run(&mut p, sequencer)
}
