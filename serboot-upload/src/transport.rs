// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Serial transport layer for bootloader communication.
//!
//! The protocol has no framing bytes: the device treats every burst it
//! receives as one frame. Each `send_frame` is a single write followed by a
//! pause long enough for the device to see the burst end.

use anyhow::{bail, Context, Result};
use serialport::SerialPort;
use std::io::{Read, Write};
use std::thread;
use std::time::Duration;

use serboot_common::BootCommand;

/// Default timeout for serial operations in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 2000;

pub struct Transport {
    port: Box<dyn SerialPort>,
    frame_delay: Duration,
}

impl Transport {
    /// Open `port_name` at `baud`.
    pub fn new(port_name: &str, baud: u32, frame_delay: Duration) -> Result<Self> {
        let port = serialport::new(port_name, baud)
            .timeout(Duration::from_millis(DEFAULT_TIMEOUT_MS))
            .open()
            .with_context(|| format!("Failed to open serial port {}", port_name))?;

        Ok(Self { port, frame_delay })
    }

    /// Get the port name.
    pub fn port_name(&self) -> String {
        self.port.name().unwrap_or_else(|| "?".to_string())
    }

    /// Write one frame.
    pub fn send_frame(&mut self, bytes: &[u8]) -> Result<()> {
        self.port
            .write_all(bytes)
            .context("Failed to write to serial port")?;
        self.port.flush()?;
        thread::sleep(self.frame_delay);
        Ok(())
    }

    /// Send a bare `FE A5 <code>` command frame.
    pub fn send_command(&mut self, cmd: BootCommand) -> Result<()> {
        self.send_frame(&cmd.frame())
    }

    /// Read exactly `len` bytes or fail after `timeout`.
    pub fn receive_exact(&mut self, len: usize, timeout: Duration) -> Result<Vec<u8>> {
        let old_timeout = self.port.timeout();
        self.port
            .set_timeout(timeout)
            .context("Failed to set timeout")?;

        let mut buf = vec![0u8; len];
        let result = self.port.read_exact(&mut buf);
        let _ = self.port.set_timeout(old_timeout);

        match result {
            Ok(()) => Ok(buf),
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => {
                bail!("Timeout waiting for {} byte response", len)
            }
            Err(e) => bail!("Serial read error: {}", e),
        }
    }

    /// Discard anything the device sent before the next request.
    pub fn drain_rx(&mut self) {
        let mut buf = [0u8; 64];
        let old_timeout = self.port.timeout();
        let _ = self.port.set_timeout(Duration::from_millis(10));
        while self.port.read(&mut buf).unwrap_or(0) > 0 {}
        let _ = self.port.set_timeout(old_timeout);
    }
}
