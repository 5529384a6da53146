// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Checksum vectors and integrity verdicts.

mod common;

use common::{app_image, test_layout, MockBoard, APP_END, APP_START, META_START};
use serboot_common::{
    image_checksum, HardwareChecksum, IntegrityVerifier, MetadataStore, SoftwareCrc, Verdict,
};

fn verifier() -> IntegrityVerifier {
    let layout = test_layout();
    IntegrityVerifier::new(layout.app, MetadataStore::new(layout.meta))
}

fn stamp(board: &mut MockBoard, length: u32, checksum: u32) {
    board.preload(META_START, &length.to_le_bytes());
    board.preload(META_START + 4, &checksum.to_le_bytes());
}

// =============================================================================
// CRC-32/MPEG-2 word vectors
// =============================================================================

#[test]
fn test_single_word_vector() {
    let mut crc = SoftwareCrc::new();
    assert_eq!(crc.checksum32(&[0x1234_5678]), 0xDF8A_8A2B);
    assert_eq!(image_checksum(&0x1234_5678u32.to_le_bytes()), 0xDF8A_8A2B);
}

#[test]
fn test_zero_word_vector() {
    assert_eq!(image_checksum(&[0, 0, 0, 0]), 0xC704_DD7B);
}

#[test]
fn test_twenty_byte_vector() {
    let data: Vec<u8> = (0..20).collect();
    assert_eq!(image_checksum(&data), 0x395D_DB62);
}

#[test]
fn test_partial_trailing_word_not_covered() {
    // "123456789": two whole words, the ninth byte is ignored.
    assert_eq!(image_checksum(b"123456789"), 0xFEFC_54F9);
    assert_eq!(image_checksum(b"12345678"), 0xFEFC_54F9);
}

#[test]
fn test_software_crc_matches_image_checksum() {
    let image = app_image(64);
    let words: Vec<u32> = image
        .chunks_exact(4)
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();

    let mut crc = SoftwareCrc::new();
    crc.reset();
    crc.accumulate(&words[..5]);
    crc.accumulate(&words[5..]);
    assert_eq!(crc.finish(), image_checksum(&image));
}

#[test]
fn test_finish_restarts_computation() {
    let mut crc = SoftwareCrc::new();
    crc.accumulate(&[1, 2, 3]);
    crc.finish();
    crc.accumulate(&[0x1234_5678]);
    assert_eq!(crc.finish(), 0xDF8A_8A2B);
}

// =============================================================================
// Verdicts
// =============================================================================

#[test]
fn test_valid_image() {
    let mut board = MockBoard::new();
    let image = app_image(300);
    board.preload(APP_START, &image);
    stamp(&mut board, 300, image_checksum(&image));

    assert_eq!(verifier().check(&mut board), Verdict::Valid);
    assert!(verifier().verify(&mut board));
}

#[test]
fn test_single_flipped_bit_is_detected() {
    let mut board = MockBoard::new();
    let mut image = app_image(300);
    let good = image_checksum(&image);
    image[150] ^= 0x01;
    board.preload(APP_START, &image);
    stamp(&mut board, 300, good);

    assert!(matches!(
        verifier().check(&mut board),
        Verdict::Mismatch { stored, .. } if stored == good
    ));
    assert!(!verifier().verify(&mut board));
}

#[test]
fn test_erased_metadata_is_out_of_range() {
    let mut board = MockBoard::new();
    board.preload(APP_START, &app_image(64));
    assert_eq!(
        verifier().check(&mut board),
        Verdict::LengthOutOfRange {
            length: 0xFFFF_FFFF
        }
    );
}

#[test]
fn test_length_larger_than_region() {
    let mut board = MockBoard::new();
    stamp(&mut board, APP_END - APP_START + 4, 0);
    assert!(matches!(
        verifier().check(&mut board),
        Verdict::LengthOutOfRange { .. }
    ));
}

#[test]
fn test_length_equal_to_region_is_checked() {
    let mut board = MockBoard::new();
    let size = (APP_END - APP_START) as usize;
    let image = app_image(size);
    board.preload(APP_START, &image);
    stamp(&mut board, size as u32, image_checksum(&image));
    assert_eq!(verifier().check(&mut board), Verdict::Valid);
}

#[test]
fn test_zero_length_is_empty() {
    let mut board = MockBoard::new();
    stamp(&mut board, 0, image_checksum(&[]));
    assert_eq!(verifier().check(&mut board), Verdict::Empty);
}

#[test]
fn test_odd_length_covers_whole_words_only() {
    let mut board = MockBoard::new();
    let image = app_image(23);
    board.preload(APP_START, &image);
    stamp(&mut board, 23, image_checksum(&image[..20]));
    assert_eq!(verifier().check(&mut board), Verdict::Valid);
}
