// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

mod common;

use common::{test_layout, MockBoard, META_START, META_USABLE};
use serboot_common::layout::{APP_CHECKSUM_OFFSET, APP_LENGTH_OFFSET};
use serboot_common::{Error, MetadataStore, PrivateMetadata};

fn store() -> MetadataStore {
    MetadataStore::new(test_layout().meta)
}

#[test]
fn test_erased_metadata_reads_all_ones() {
    let mut board = MockBoard::new();
    let meta = store().load(&mut board).unwrap();
    assert_eq!(
        meta,
        PrivateMetadata {
            app_length: 0xFFFF_FFFF,
            app_checksum: 0xFFFF_FFFF,
        }
    );
}

#[test]
fn test_fields_round_trip() {
    let mut board = MockBoard::new();
    let store = store();
    store.set_app_length(&mut board, 20).unwrap();
    store.set_app_checksum(&mut board, 0x395D_DB62).unwrap();

    assert_eq!(store.read_u32(&mut board, APP_LENGTH_OFFSET).unwrap(), 20);
    assert_eq!(
        store.read_u32(&mut board, APP_CHECKSUM_OFFSET).unwrap(),
        0x395D_DB62
    );
    assert_eq!(board.bytes(META_START, 4), &20u32.to_le_bytes());
}

#[test]
fn test_write_preserves_other_fields() {
    let mut board = MockBoard::new();
    let store = store();
    store.set_app_checksum(&mut board, 0xCAFE_F00D).unwrap();
    store.write_field(&mut board, 40, &[1, 2, 3]).unwrap();
    store.set_app_length(&mut board, 1234).unwrap();

    let meta = store.load(&mut board).unwrap();
    assert_eq!(meta.app_length, 1234);
    assert_eq!(meta.app_checksum, 0xCAFE_F00D);

    let mut buf = [0u8; 3];
    store.read_field(&mut board, 40, &mut buf).unwrap();
    assert_eq!(buf, [1, 2, 3]);
}

#[test]
fn test_write_erases_the_sector_once() {
    let mut board = MockBoard::new();
    store().set_app_length(&mut board, 8).unwrap();
    assert_eq!(board.erase_calls, vec![(META_START, META_START + 4096)]);
}

#[test]
fn test_rewrite_skips_erased_words() {
    let mut board = MockBoard::new();
    store().set_app_length(&mut board, 8).unwrap();
    // Length and checksum share the first word.
    assert_eq!(board.program_calls.len(), 1);
    assert_eq!(board.program_calls[0].0, META_START);
}

#[test]
fn test_overflow_touches_nothing() {
    let mut board = MockBoard::new();
    let store = store();

    let err = store
        .write_field(&mut board, META_USABLE - 2, &[0; 4])
        .unwrap_err();
    assert_eq!(
        err,
        Error::MetadataOverflow {
            offset: META_USABLE - 2,
            len: 4,
        }
    );

    let mut buf = [0u8; 8];
    assert!(store.read_field(&mut board, META_USABLE, &mut buf).is_err());

    assert_eq!(board.reads, 0);
    assert!(board.erase_calls.is_empty());
    assert!(board.program_calls.is_empty());
}

#[test]
fn test_field_at_end_of_region() {
    let mut board = MockBoard::new();
    let store = store();
    store.write_u32(&mut board, META_USABLE - 4, 7).unwrap();
    assert_eq!(store.read_u32(&mut board, META_USABLE - 4).unwrap(), 7);
}

#[test]
fn test_erase_failure_propagates() {
    let mut board = MockBoard::new();
    board.fail_erase = true;
    let err = store().set_app_length(&mut board, 8).unwrap_err();
    assert!(matches!(err, Error::FlashErase { .. }));
}
