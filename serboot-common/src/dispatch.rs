// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Command state machine over received frames.
//!
//! In `Idle` every frame is checked for the `FE A5` marker and its command
//! byte; anything else is dropped without a reply. `ProgramApp`,
//! `UpdateApp` and `WriteChecksum` need the frames that follow them, so they
//! park the machine in `AwaitingMore` until their payload is complete. Each
//! call consumes exactly one frame; the caller decides how to wait between
//! frames.

use crate::device::{Board, FrameSource};
use crate::error::Error;
use crate::launch::AppLauncher;
use crate::layout::BootLayout;
use crate::metadata::MetadataStore;
use crate::protocol::{self, BootCommand, CONNECT_ACK};
use crate::verify::{IntegrityVerifier, Verdict};
use crate::writer::AlignmentWriter;

/// Payload a multi-frame command is waiting for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Awaiting {
    /// Image bytes until the end-of-stream marker; `UpdateApp` jumps afterwards.
    Image { jump_after: bool },
    /// Four-byte little-endian checksum.
    Checksum,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DispatchState {
    Idle,
    AwaitingMore(Awaiting),
}

/// What one dispatch step did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    /// No frame was pending.
    NoFrame,
    /// Frame was not a command, an unknown command, or a too-short payload.
    Ignored,
    /// A command was recognized and executed or started.
    Accepted(BootCommand),
    /// Part of an image stream was consumed.
    ImageChunk { written: u32 },
    /// The image stream ended and its length was recorded.
    ImageStored { length: u32 },
    ChecksumStored { checksum: u32 },
    /// Control was handed to the application (only observable off-target).
    Launched,
}

impl Event {
    /// True for everything that means a host is talking to us.
    pub fn is_command_traffic(&self) -> bool {
        !matches!(self, Event::NoFrame | Event::Ignored)
    }
}

pub struct CommandDispatcher<B> {
    board: B,
    layout: BootLayout,
    writer: AlignmentWriter,
    store: MetadataStore,
    verifier: IntegrityVerifier,
    launcher: AppLauncher,
    state: DispatchState,
}

impl<B: Board> CommandDispatcher<B> {
    pub fn new(board: B, layout: BootLayout) -> Self {
        let store = MetadataStore::new(layout.meta);
        Self {
            board,
            layout,
            writer: AlignmentWriter::new(layout.app),
            store,
            verifier: IntegrityVerifier::new(layout.app, store),
            launcher: AppLauncher::new(layout.stack),
            state: DispatchState::Idle,
        }
    }

    pub fn state(&self) -> DispatchState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == DispatchState::Idle
    }

    pub fn layout(&self) -> &BootLayout {
        &self.layout
    }

    pub fn board(&self) -> &B {
        &self.board
    }

    pub fn board_mut(&mut self) -> &mut B {
        &mut self.board
    }

    pub fn metadata(&self) -> &MetadataStore {
        &self.store
    }

    /// Check the stored image.
    pub fn verify(&mut self) -> Verdict {
        self.verifier.check(&mut self.board)
    }

    /// Jump to the application region without an integrity check.
    pub fn launch(&mut self) -> Result<(), Error> {
        self.launcher.jump(&mut self.board, self.layout.app.start)
    }

    /// Take at most one frame from `source` and dispatch it.
    pub fn poll<S: FrameSource>(&mut self, source: &mut S) -> Result<Event, Error> {
        match source.poll() {
            Some(frame) => self.handle(&frame),
            None => Ok(Event::NoFrame),
        }
    }

    /// Dispatch one frame according to the current state.
    pub fn handle(&mut self, frame: &[u8]) -> Result<Event, Error> {
        match self.state {
            DispatchState::Idle => match protocol::parse_command(frame) {
                Some(BootCommand::Unknown(code)) => {
                    boot_log!(debug, "dispatch: unknown command 0x{:02x}", code);
                    Ok(Event::Ignored)
                }
                Some(cmd) => self.execute(cmd),
                None => Ok(Event::Ignored),
            },
            DispatchState::AwaitingMore(Awaiting::Image { jump_after }) => {
                self.stream_image(frame, jump_after)
            }
            DispatchState::AwaitingMore(Awaiting::Checksum) => self.take_checksum(frame),
        }
    }

    fn execute(&mut self, cmd: BootCommand) -> Result<Event, Error> {
        boot_log!(info, "dispatch: {}", cmd);

        match cmd {
            BootCommand::Connect => {
                self.board.send(&CONNECT_ACK);
            }
            BootCommand::EraseApp => {
                self.erase_app()?;
            }
            BootCommand::ProgramApp => {
                self.begin_image(false);
            }
            BootCommand::WriteChecksum => {
                self.state = DispatchState::AwaitingMore(Awaiting::Checksum);
            }
            BootCommand::VerifyAndJump => {
                let verdict = self.verify();
                if !verdict.is_valid() {
                    boot_log!(warn, "dispatch: image rejected: {}", verdict);
                    return Ok(Event::Accepted(cmd));
                }
                self.launch()?;
                return Ok(Event::Launched);
            }
            BootCommand::JumpToApp => {
                self.launch()?;
                return Ok(Event::Launched);
            }
            BootCommand::UpdateApp => {
                self.erase_app()?;
                self.begin_image(true);
            }
            BootCommand::Restart => {
                self.board.system_reset();
            }
            BootCommand::Unknown(_) => return Ok(Event::Ignored),
        }

        Ok(Event::Accepted(cmd))
    }

    fn erase_app(&mut self) -> Result<(), Error> {
        let app = self.layout.app;
        self.board.erase(app.start, app.end).map_err(|e| {
            boot_log!(error, "dispatch: erase failed: {}", e);
            e
        })
    }

    fn begin_image(&mut self, jump_after: bool) {
        self.writer.reset();
        self.state = DispatchState::AwaitingMore(Awaiting::Image { jump_after });
    }

    fn stream_image(&mut self, frame: &[u8], jump_after: bool) -> Result<Event, Error> {
        let (data, ended) = protocol::split_end_of_stream(frame);

        let written = match self.writer.feed(&mut self.board, data) {
            Ok(written) => written,
            Err(e) => return Err(self.abort(e)),
        };
        if !ended {
            return Ok(Event::ImageChunk { written });
        }

        self.state = DispatchState::Idle;
        let length = self.writer.finish(&mut self.board).map_err(|e| self.abort(e))?;
        self.store.set_app_length(&mut self.board, length)?;
        boot_log!(info, "dispatch: image stored, {} bytes", length);

        if jump_after {
            self.launch()?;
            return Ok(Event::Launched);
        }
        Ok(Event::ImageStored { length })
    }

    fn take_checksum(&mut self, frame: &[u8]) -> Result<Event, Error> {
        let Some(checksum) = protocol::parse_checksum(frame) else {
            return Ok(Event::Ignored);
        };

        self.state = DispatchState::Idle;
        self.store.set_app_checksum(&mut self.board, checksum)?;
        boot_log!(info, "dispatch: checksum 0x{:08x} stored", checksum);
        Ok(Event::ChecksumStored { checksum })
    }

    fn abort(&mut self, e: Error) -> Error {
        boot_log!(error, "dispatch: image stream aborted: {}", e);
        self.state = DispatchState::Idle;
        e
    }
}
