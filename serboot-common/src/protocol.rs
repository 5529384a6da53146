// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Byte protocol shared by the bootloader and host tools.
//!
//! Every command frame starts with the marker `FE A5`; the third byte is the
//! command code. Payloads (image bytes, checksum) travel in the frames that
//! follow the command frame. The image stream ends with a frame whose last
//! three bytes are `FE A5 F1`.

/// Leading bytes of every command frame.
pub const MARKER: [u8; 2] = [0xFE, 0xA5];

/// Suffix that terminates a ProgramApp / UpdateApp image stream.
pub const END_OF_STREAM: [u8; 3] = [0xFE, 0xA5, 0xF1];

/// Reply to `Connect`.
pub const CONNECT_ACK: [u8; 8] = [0xFE, 0xA5, 0x01, 0x03, 0xFF, 0x03, 0x00, 0x01];

/// Size in bytes of the `WriteChecksum` payload.
pub const CHECKSUM_PAYLOAD_LEN: usize = 4;

pub const CMD_CONNECT: u8 = 0x01;
pub const CMD_ERASE_APP: u8 = 0x02;
pub const CMD_PROGRAM_APP: u8 = 0x04;
pub const CMD_WRITE_CHECKSUM: u8 = 0x05;
pub const CMD_RESTART: u8 = 0xF2;
pub const CMD_JUMP_TO_APP: u8 = 0xF3;
pub const CMD_VERIFY_AND_JUMP: u8 = 0xF4;
pub const CMD_UPDATE_APP: u8 = 0xF5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BootCommand {
    Connect,
    EraseApp,
    ProgramApp,
    WriteChecksum,
    VerifyAndJump,
    Restart,
    JumpToApp,
    UpdateApp,
    Unknown(u8),
}

impl From<u8> for BootCommand {
    fn from(code: u8) -> Self {
        match code {
            CMD_CONNECT => BootCommand::Connect,
            CMD_ERASE_APP => BootCommand::EraseApp,
            CMD_PROGRAM_APP => BootCommand::ProgramApp,
            CMD_WRITE_CHECKSUM => BootCommand::WriteChecksum,
            CMD_RESTART => BootCommand::Restart,
            CMD_JUMP_TO_APP => BootCommand::JumpToApp,
            CMD_VERIFY_AND_JUMP => BootCommand::VerifyAndJump,
            CMD_UPDATE_APP => BootCommand::UpdateApp,
            other => BootCommand::Unknown(other),
        }
    }
}

impl BootCommand {
    pub fn code(self) -> u8 {
        match self {
            BootCommand::Connect => CMD_CONNECT,
            BootCommand::EraseApp => CMD_ERASE_APP,
            BootCommand::ProgramApp => CMD_PROGRAM_APP,
            BootCommand::WriteChecksum => CMD_WRITE_CHECKSUM,
            BootCommand::Restart => CMD_RESTART,
            BootCommand::JumpToApp => CMD_JUMP_TO_APP,
            BootCommand::VerifyAndJump => CMD_VERIFY_AND_JUMP,
            BootCommand::UpdateApp => CMD_UPDATE_APP,
            BootCommand::Unknown(code) => code,
        }
    }

    /// The three-byte frame a host sends to issue this command.
    pub fn frame(self) -> [u8; 3] {
        [MARKER[0], MARKER[1], self.code()]
    }
}

/// Decode a command frame. `None` if the frame does not carry the marker.
///
/// Bytes after the command code are not part of the command and are ignored.
pub fn parse_command(frame: &[u8]) -> Option<BootCommand> {
    match frame {
        [m0, m1, code, ..] if [*m0, *m1] == MARKER => Some(BootCommand::from(*code)),
        _ => None,
    }
}

/// Split an image-stream frame into its data part and whether it ended the stream.
pub fn split_end_of_stream(frame: &[u8]) -> (&[u8], bool) {
    match frame.strip_suffix(&END_OF_STREAM) {
        Some(data) => (data, true),
        None => (frame, false),
    }
}

/// Decode a `WriteChecksum` payload frame. `None` while the frame is too short.
pub fn parse_checksum(frame: &[u8]) -> Option<u32> {
    let bytes: [u8; CHECKSUM_PAYLOAD_LEN] = frame.get(..CHECKSUM_PAYLOAD_LEN)?.try_into().ok()?;
    Some(u32::from_le_bytes(bytes))
}
