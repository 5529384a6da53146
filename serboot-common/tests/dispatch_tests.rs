// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Command handling over an in-memory board.

mod common;

use common::{app_image, test_layout, MockBoard, APP_END, APP_START, GOOD_ENTRY, GOOD_SP};
use serboot_common::dispatch::Awaiting;
use serboot_common::protocol::{BootCommand, CONNECT_ACK, END_OF_STREAM};
use serboot_common::{
    image_checksum, CommandDispatcher, DispatchState, Error, Event, PrivateMetadata,
};

type Dispatcher = CommandDispatcher<MockBoard>;

fn dispatcher() -> Dispatcher {
    CommandDispatcher::new(MockBoard::new(), test_layout())
}

fn stored(d: &mut Dispatcher) -> PrivateMetadata {
    let store = *d.metadata();
    store.load(d.board_mut()).unwrap()
}

fn with_end(data: &[u8]) -> Vec<u8> {
    let mut frame = data.to_vec();
    frame.extend_from_slice(&END_OF_STREAM);
    frame
}

/// Program `image` in one frame and stamp its checksum.
fn install(d: &mut Dispatcher, image: &[u8]) {
    d.handle(&BootCommand::ProgramApp.frame()).unwrap();
    d.handle(&with_end(image)).unwrap();
    d.handle(&BootCommand::WriteChecksum.frame()).unwrap();
    d.handle(&image_checksum(image).to_le_bytes()).unwrap();
    d.board_mut().clear_counters();
}

// =============================================================================
// Single-frame commands
// =============================================================================

#[test]
fn test_connect_replies_with_ack() {
    let mut d = dispatcher();
    assert_eq!(
        d.handle(&[0xFE, 0xA5, 0x01]),
        Ok(Event::Accepted(BootCommand::Connect))
    );
    assert_eq!(d.board().sent, vec![CONNECT_ACK.to_vec()]);
    assert!(d.is_idle());
}

#[test]
fn test_erase_clears_app_region() {
    let mut d = dispatcher();
    d.board_mut().preload(APP_START, &[0u8; 32]);

    assert_eq!(
        d.handle(&[0xFE, 0xA5, 0x02]),
        Ok(Event::Accepted(BootCommand::EraseApp))
    );
    assert_eq!(d.board().erase_calls, vec![(APP_START, APP_END)]);
    assert!(d.board().bytes(APP_START, 32).iter().all(|&b| b == 0xFF));
    assert!(d.board().sent.is_empty());
}

#[test]
fn test_erase_failure_is_reported() {
    let mut d = dispatcher();
    d.board_mut().fail_erase = true;
    assert!(matches!(
        d.handle(&BootCommand::EraseApp.frame()),
        Err(Error::FlashErase { .. })
    ));
    assert!(d.is_idle());
}

#[test]
fn test_restart_requests_reset() {
    let mut d = dispatcher();
    assert_eq!(
        d.handle(&BootCommand::Restart.frame()),
        Ok(Event::Accepted(BootCommand::Restart))
    );
    assert_eq!(d.board().resets, 1);
}

#[test]
fn test_unknown_command_is_ignored() {
    let mut d = dispatcher();
    assert_eq!(d.handle(&[0xFE, 0xA5, 0x77]), Ok(Event::Ignored));
    assert!(d.board().sent.is_empty());
    assert!(d.board().erase_calls.is_empty());
    assert!(d.is_idle());
}

#[test]
fn test_frame_without_marker_is_ignored() {
    let mut d = dispatcher();
    assert_eq!(d.handle(&[0x01, 0x02, 0x03]), Ok(Event::Ignored));
    assert_eq!(d.handle(&[0xFE]), Ok(Event::Ignored));
    assert!(d.board().sent.is_empty());
}

#[test]
fn test_trailing_bytes_after_command_are_ignored() {
    let mut d = dispatcher();
    assert_eq!(
        d.handle(&[0xFE, 0xA5, 0x01, 0x99, 0x98]),
        Ok(Event::Accepted(BootCommand::Connect))
    );
    assert_eq!(d.board().sent.len(), 1);
}

// =============================================================================
// Image stream
// =============================================================================

#[test]
fn test_program_single_frame_image() {
    let mut d = dispatcher();
    assert_eq!(
        d.handle(&BootCommand::ProgramApp.frame()),
        Ok(Event::Accepted(BootCommand::ProgramApp))
    );
    assert_eq!(
        d.state(),
        DispatchState::AwaitingMore(Awaiting::Image { jump_after: false })
    );

    // 8 data bytes followed by the end marker: 11 bytes on the wire.
    let data = [1, 2, 3, 4, 5, 6, 7, 8];
    let frame = with_end(&data);
    assert_eq!(frame.len(), 11);
    assert_eq!(d.handle(&frame), Ok(Event::ImageStored { length: 8 }));

    assert!(d.is_idle());
    assert_eq!(d.board().bytes(APP_START, 8), &data);
    assert_eq!(stored(&mut d).app_length, 8);
}

#[test]
fn test_program_multi_frame_image() {
    let mut d = dispatcher();
    let image = app_image(100);
    d.handle(&BootCommand::ProgramApp.frame()).unwrap();

    assert_eq!(d.handle(&image[..30]), Ok(Event::ImageChunk { written: 24 }));
    assert_eq!(d.handle(&image[30..60]), Ok(Event::ImageChunk { written: 56 }));
    assert_eq!(
        d.handle(&with_end(&image[60..])),
        Ok(Event::ImageStored { length: 100 })
    );

    assert_eq!(d.board().bytes(APP_START, 100), &image[..]);
    assert_eq!(stored(&mut d).app_length, 100);
}

#[test]
fn test_end_marker_alone_closes_stream() {
    let mut d = dispatcher();
    d.handle(&BootCommand::ProgramApp.frame()).unwrap();
    d.handle(&[9; 12]).unwrap();
    assert_eq!(
        d.handle(&END_OF_STREAM),
        Ok(Event::ImageStored { length: 12 })
    );
}

#[test]
fn test_command_bytes_inside_stream_are_data() {
    let mut d = dispatcher();
    d.handle(&BootCommand::ProgramApp.frame()).unwrap();

    let connect = BootCommand::Connect.frame();
    assert!(matches!(d.handle(&connect), Ok(Event::ImageChunk { .. })));
    assert!(d.board().sent.is_empty());
    assert_eq!(d.handle(&END_OF_STREAM), Ok(Event::ImageStored { length: 3 }));
    assert_eq!(d.board().bytes(APP_START, 3), &connect);
}

#[test]
fn test_program_failure_aborts_stream() {
    let mut d = dispatcher();
    d.board_mut().fail_program_at = Some(APP_START + 8);
    d.handle(&BootCommand::ProgramApp.frame()).unwrap();

    assert_eq!(
        d.handle(&[0u8; 16]),
        Err(Error::FlashProgram { addr: APP_START + 8 })
    );
    assert!(d.is_idle());
    assert_eq!(
        d.handle(&BootCommand::Connect.frame()),
        Ok(Event::Accepted(BootCommand::Connect))
    );
}

#[test]
fn test_new_program_restarts_at_base() {
    let mut d = dispatcher();
    d.handle(&BootCommand::ProgramApp.frame()).unwrap();
    d.handle(&with_end(&[0xAA; 16])).unwrap();
    d.handle(&BootCommand::EraseApp.frame()).unwrap();

    d.handle(&BootCommand::ProgramApp.frame()).unwrap();
    assert_eq!(
        d.handle(&with_end(&[0x55; 4])),
        Ok(Event::ImageStored { length: 4 })
    );
    assert_eq!(d.board().bytes(APP_START, 4), &[0x55; 4]);
}

// =============================================================================
// Checksum
// =============================================================================

#[test]
fn test_write_checksum_waits_for_four_bytes() {
    let mut d = dispatcher();
    assert_eq!(
        d.handle(&BootCommand::WriteChecksum.frame()),
        Ok(Event::Accepted(BootCommand::WriteChecksum))
    );
    assert_eq!(d.handle(&[1, 2, 3]), Ok(Event::Ignored));
    assert_eq!(
        d.state(),
        DispatchState::AwaitingMore(Awaiting::Checksum)
    );

    assert_eq!(
        d.handle(&[0x62, 0xDB, 0x5D, 0x39]),
        Ok(Event::ChecksumStored {
            checksum: 0x395D_DB62
        })
    );
    assert!(d.is_idle());
    assert_eq!(stored(&mut d).app_checksum, 0x395D_DB62);
}

#[test]
fn test_checksum_keeps_stored_length() {
    let mut d = dispatcher();
    let image = app_image(40);
    install(&mut d, &image);
    let meta = stored(&mut d);
    assert_eq!(meta.app_length, 40);
    assert_eq!(meta.app_checksum, image_checksum(&image));
}

// =============================================================================
// Launch commands
// =============================================================================

#[test]
fn test_verify_and_jump_with_valid_image() {
    let mut d = dispatcher();
    install(&mut d, &app_image(64));

    assert_eq!(
        d.handle(&BootCommand::VerifyAndJump.frame()),
        Ok(Event::Launched)
    );
    let board = d.board();
    assert_eq!(board.jumps, vec![(GOOD_SP, GOOD_ENTRY)]);
    assert!(board.closed);
    assert!(board.interrupts_disabled);
}

#[test]
fn test_verify_and_jump_rejects_bad_checksum() {
    let mut d = dispatcher();
    let image = app_image(64);
    install(&mut d, &image);
    d.handle(&BootCommand::WriteChecksum.frame()).unwrap();
    d.handle(&(image_checksum(&image) ^ 1).to_le_bytes()).unwrap();

    assert_eq!(
        d.handle(&BootCommand::VerifyAndJump.frame()),
        Ok(Event::Accepted(BootCommand::VerifyAndJump))
    );
    assert!(d.board().jumps.is_empty());
    assert!(!d.board().closed);
}

#[test]
fn test_jump_without_application() {
    let mut d = dispatcher();
    assert_eq!(
        d.handle(&BootCommand::JumpToApp.frame()),
        Err(Error::NoApplicationFound {
            initial_sp: 0xFFFF_FFFF
        })
    );
    assert!(d.board().jumps.is_empty());
    assert!(!d.board().interrupts_disabled);
}

#[test]
fn test_jump_skips_integrity_check() {
    let mut d = dispatcher();
    d.board_mut().preload(APP_START, &app_image(16));
    assert_eq!(d.handle(&BootCommand::JumpToApp.frame()), Ok(Event::Launched));
    assert_eq!(d.board().jumps, vec![(GOOD_SP, GOOD_ENTRY)]);
}

#[test]
fn test_update_erases_programs_and_jumps() {
    let mut d = dispatcher();
    d.board_mut().preload(APP_START, &[0u8; 64]);
    let image = app_image(24);

    assert_eq!(
        d.handle(&BootCommand::UpdateApp.frame()),
        Ok(Event::Accepted(BootCommand::UpdateApp))
    );
    assert_eq!(d.board().erase_calls, vec![(APP_START, APP_END)]);
    assert_eq!(
        d.state(),
        DispatchState::AwaitingMore(Awaiting::Image { jump_after: true })
    );

    assert_eq!(d.handle(&with_end(&image)), Ok(Event::Launched));
    assert_eq!(d.board().bytes(APP_START, 24), &image[..]);
    assert_eq!(d.board().jumps, vec![(GOOD_SP, GOOD_ENTRY)]);
    assert_eq!(stored(&mut d).app_length, 24);
}
