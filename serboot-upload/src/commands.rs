// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Command implementations for bootloader operations.
//!
//! Only `Connect` is answered by the device; every other command is fire and
//! forget, so the tool paces itself with fixed waits.

use std::io::Write;
use std::path::Path;
use std::thread;
use std::time::Duration;

use anyhow::{bail, Result};
use indicatif::{ProgressBar, ProgressStyle};

use serboot_common::protocol::{CONNECT_ACK, END_OF_STREAM};
use serboot_common::BootCommand;

use crate::image::Image;
use crate::transport::Transport;

/// Time the device may spend answering `Connect`.
const CONNECT_TIMEOUT: Duration = Duration::from_millis(1000);

/// Time to let a full application-region erase finish before streaming.
const ERASE_SETTLE: Duration = Duration::from_millis(4000);

/// Time to let the metadata sector rewrite finish.
const METADATA_SETTLE: Duration = Duration::from_millis(300);

/// Check that the bootloader is listening.
pub fn connect(transport: &mut Transport) -> Result<()> {
    print!("Connecting... ");
    std::io::stdout().flush()?;

    transport.drain_rx();
    transport.send_command(BootCommand::Connect)?;
    let reply = transport.receive_exact(CONNECT_ACK.len(), CONNECT_TIMEOUT)?;

    if reply != CONNECT_ACK {
        bail!("Unexpected connect reply: {:02x?}", reply);
    }

    println!("OK ({})", transport.port_name());
    Ok(())
}

/// Erase the application region.
pub fn erase(transport: &mut Transport) -> Result<()> {
    print!("Erasing application region... ");
    std::io::stdout().flush()?;

    transport.send_command(BootCommand::EraseApp)?;
    thread::sleep(ERASE_SETTLE);

    println!("OK");
    Ok(())
}

fn announce(image: &Image, path: &Path) {
    println!(
        "Image: {} ({} bytes, checksum 0x{:08x})",
        path.display(),
        image.size(),
        image.checksum
    );
    if image.padding > 0 {
        println!("  padded with {} x 0xFF to a whole word", image.padding);
    }
    if let Some(offset) = image.end_marker_offset() {
        println!(
            "Warning: image contains the end-of-stream marker at offset {}; \
             a frame ending there would cut the upload short",
            offset
        );
    }
}

/// Stream `image` after a `ProgramApp`/`UpdateApp` frame, then end the stream.
fn stream(transport: &mut Transport, image: &Image, chunk_size: usize) -> Result<()> {
    let pb = ProgressBar::new(image.size() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})",
            )?
            .progress_chars("#>-"),
    );

    let mut sent = 0usize;
    for chunk in image.bytes.chunks(chunk_size) {
        if let Err(e) = transport.send_frame(chunk) {
            pb.abandon();
            return Err(e.context(format!("Upload failed at offset {}", sent)));
        }
        sent += chunk.len();
        pb.set_position(sent as u64);
    }

    // On its own so that no link can split it.
    transport.send_frame(&END_OF_STREAM)?;
    pb.finish_with_message("Upload complete");
    Ok(())
}

/// Program an image into the erased application region.
pub fn program(transport: &mut Transport, file: &Path, chunk_size: usize) -> Result<()> {
    let image = Image::load(file)?;
    announce(&image, file);

    transport.send_command(BootCommand::ProgramApp)?;
    stream(transport, &image, chunk_size)?;
    thread::sleep(METADATA_SETTLE);

    println!("Programmed {} bytes", image.size());
    Ok(())
}

/// Stamp the checksum of `file` into the metadata sector.
pub fn checksum(transport: &mut Transport, file: &Path) -> Result<()> {
    let image = Image::load(file)?;
    print!("Writing checksum 0x{:08x}... ", image.checksum);
    std::io::stdout().flush()?;

    transport.send_command(BootCommand::WriteChecksum)?;
    transport.send_frame(&image.checksum.to_le_bytes())?;
    thread::sleep(METADATA_SETTLE);

    println!("OK");
    Ok(())
}

/// Ask the device to start the application if it verifies.
pub fn verify_jump(transport: &mut Transport) -> Result<()> {
    transport.send_command(BootCommand::VerifyAndJump)?;
    println!("Verify-and-jump sent; the device stays in the bootloader if the image is invalid.");
    Ok(())
}

/// Start the application without verification.
pub fn jump(transport: &mut Transport) -> Result<()> {
    transport.send_command(BootCommand::JumpToApp)?;
    println!("Jump sent.");
    Ok(())
}

/// Reset the device.
pub fn restart(transport: &mut Transport) -> Result<()> {
    transport.send_command(BootCommand::Restart)?;
    println!("Restart sent.");
    Ok(())
}

/// Erase, program and start an image. The checksum is not updated, so the
/// image will not start by itself after the next reset.
pub fn update(transport: &mut Transport, file: &Path, chunk_size: usize) -> Result<()> {
    let image = Image::load(file)?;
    announce(&image, file);

    print!("Erasing application region... ");
    std::io::stdout().flush()?;
    transport.send_command(BootCommand::UpdateApp)?;
    thread::sleep(ERASE_SETTLE);
    println!("OK");

    stream(transport, &image, chunk_size)?;
    println!("Update sent; the device starts the image now.");
    println!(
        "Run 'serboot-upload --port {} checksum <FILE>' from the bootloader to make it start on reset.",
        transport.port_name()
    );
    Ok(())
}

/// Full sequence: connect, erase, program, checksum, verify-and-jump.
pub fn flash(transport: &mut Transport, file: &Path, chunk_size: usize) -> Result<()> {
    connect(transport)?;
    erase(transport)?;
    program(transport, file, chunk_size)?;
    checksum(transport, file)?;
    verify_jump(transport)?;

    println!();
    println!("Firmware flashed successfully!");
    Ok(())
}
