// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Firmware upload tool for the serboot bootloader.
//!
//! Usage:
//!   serboot-upload --port /dev/ttyACM0 connect
//!   serboot-upload --port /dev/ttyACM0 flash firmware.bin
//!   serboot-upload --port /dev/ttyACM0 restart

mod cli;
mod commands;
mod image;
mod transport;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let args = cli::Cli::parse();
    cli::run(args)
}
