// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Command-line interface definitions.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use serboot_common::FRAME_CAPACITY;

use crate::commands;
use crate::transport::Transport;

/// Default image bytes per frame.
pub const DEFAULT_CHUNK_SIZE: usize = 256;

/// Default pause after each frame, so the device sees frame boundaries.
pub const DEFAULT_CHUNK_DELAY_MS: u64 = 20;

/// Command-line arguments.
#[derive(Parser)]
#[command(name = "serboot-upload")]
#[command(about = "Firmware upload tool for the serboot bootloader")]
pub struct Cli {
    /// Serial port (e.g., /dev/ttyACM0)
    #[arg(short, long)]
    pub port: String,

    /// Baud rate (ignored by USB CDC links)
    #[arg(short, long, default_value_t = 115_200)]
    pub baud: u32,

    /// Image bytes per frame
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    pub chunk_size: usize,

    /// Pause after each frame in milliseconds
    #[arg(long, default_value_t = DEFAULT_CHUNK_DELAY_MS)]
    pub chunk_delay_ms: u64,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
pub enum Commands {
    /// Check that the bootloader answers
    Connect,

    /// Erase the application region
    Erase,

    /// Program an image into the (erased) application region
    Program {
        /// Application binary
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Stamp the checksum of an image already programmed
    Checksum {
        /// Application binary
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Start the application if its checksum matches
    VerifyJump,

    /// Start the application without checking it
    Jump,

    /// Reset the device
    Restart,

    /// Erase, program and start an image in one command (no checksum)
    Update {
        /// Application binary
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Connect, erase, program, stamp the checksum and start the image
    Flash {
        /// Application binary
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

fn check_chunk_size(chunk_size: usize) -> Result<()> {
    if chunk_size == 0 || chunk_size > FRAME_CAPACITY {
        bail!(
            "Chunk size must be between 1 and {} bytes, got {}",
            FRAME_CAPACITY,
            chunk_size
        );
    }
    Ok(())
}

/// Execute the parsed CLI command.
pub fn run(cli: Cli) -> Result<()> {
    check_chunk_size(cli.chunk_size)?;

    let mut transport = Transport::new(
        &cli.port,
        cli.baud,
        Duration::from_millis(cli.chunk_delay_ms),
    )?;
    let chunk = cli.chunk_size;

    match cli.command {
        Commands::Connect => commands::connect(&mut transport),
        Commands::Erase => commands::erase(&mut transport),
        Commands::Program { file } => commands::program(&mut transport, &file, chunk),
        Commands::Checksum { file } => commands::checksum(&mut transport, &file),
        Commands::VerifyJump => commands::verify_jump(&mut transport),
        Commands::Jump => commands::jump(&mut transport),
        Commands::Restart => commands::restart(&mut transport),
        Commands::Update { file } => commands::update(&mut transport, &file, chunk),
        Commands::Flash { file } => commands::flash(&mut transport, &file, chunk),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["serboot-upload", "--port", "/dev/ttyACM0", "connect"]);
        assert_eq!(cli.baud, 115_200);
        assert_eq!(cli.chunk_size, DEFAULT_CHUNK_SIZE);
        assert_eq!(cli.chunk_delay_ms, DEFAULT_CHUNK_DELAY_MS);
        assert!(matches!(cli.command, Commands::Connect));
    }

    #[test]
    fn test_flash_takes_file_and_options() {
        let cli = Cli::parse_from([
            "serboot-upload",
            "-p",
            "COM3",
            "--chunk-size",
            "64",
            "--chunk-delay-ms",
            "5",
            "flash",
            "app.bin",
        ]);
        assert_eq!(cli.chunk_size, 64);
        assert_eq!(cli.chunk_delay_ms, 5);
        match cli.command {
            Commands::Flash { file } => assert_eq!(file, PathBuf::from("app.bin")),
            _ => panic!("expected flash"),
        }
    }

    #[test]
    fn test_verify_jump_subcommand_name() {
        let cli = Cli::parse_from(["serboot-upload", "-p", "x", "verify-jump"]);
        assert!(matches!(cli.command, Commands::VerifyJump));
    }

    #[test]
    fn test_chunk_size_bounds() {
        assert!(check_chunk_size(0).is_err());
        assert!(check_chunk_size(1).is_ok());
        assert!(check_chunk_size(FRAME_CAPACITY).is_ok());
        assert!(check_chunk_size(FRAME_CAPACITY + 1).is_err());
    }
}
