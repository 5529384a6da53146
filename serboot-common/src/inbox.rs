// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Single-slot frame handoff between the receive interrupt and the tick loop.
//!
//! The slot holds at most one unconsumed frame. A producer that finds the
//! slot occupied drops the new data (drop-newest) and counts the loss; it
//! never blocks and never overwrites a frame the consumer has not taken.

use heapless::spsc::{Consumer, Producer, Queue};
use heapless::Vec;

use crate::device::FrameSource;

/// Largest frame the receive path hands over in one piece.
pub const FRAME_CAPACITY: usize = 2048;

pub type Frame = Vec<u8, FRAME_CAPACITY>;

// heapless queues hold N - 1 items: one slot.
const SLOT: usize = 2;

pub struct Inbox {
    queue: Queue<Frame, SLOT>,
}

impl Inbox {
    pub const fn new() -> Self {
        Self {
            queue: Queue::new(),
        }
    }

    /// Split into the interrupt-side producer and the loop-side receiver.
    pub fn split(&mut self) -> (FrameProducer<'_>, FrameReceiver<'_>) {
        let (tx, rx) = self.queue.split();
        (FrameProducer { tx, dropped: 0 }, FrameReceiver { rx })
    }
}

impl Default for Inbox {
    fn default() -> Self {
        Self::new()
    }
}

pub struct FrameProducer<'a> {
    tx: Producer<'a, Frame, SLOT>,
    dropped: u32,
}

impl FrameProducer<'_> {
    /// True when the consumer has taken the previous frame.
    pub fn is_free(&self) -> bool {
        self.tx.ready()
    }

    /// Publish `head` followed by `tail` as one frame.
    ///
    /// Returns false when the data was dropped: slot occupied or frame larger
    /// than `FRAME_CAPACITY`. Empty input publishes nothing and returns false.
    pub fn offer(&mut self, head: &[u8], tail: &[u8]) -> bool {
        if head.is_empty() && tail.is_empty() {
            return false;
        }
        if !self.tx.ready() {
            self.dropped = self.dropped.wrapping_add(1);
            return false;
        }

        let mut frame = Frame::new();
        if frame.extend_from_slice(head).is_err() || frame.extend_from_slice(tail).is_err() {
            self.dropped = self.dropped.wrapping_add(1);
            return false;
        }

        match self.tx.enqueue(frame) {
            Ok(()) => true,
            Err(_) => {
                self.dropped = self.dropped.wrapping_add(1);
                false
            }
        }
    }

    /// Frames lost to a full slot or oversize data since start-up.
    pub fn dropped(&self) -> u32 {
        self.dropped
    }
}

pub struct FrameReceiver<'a> {
    rx: Consumer<'a, Frame, SLOT>,
}

impl FrameReceiver<'_> {
    pub fn is_pending(&self) -> bool {
        self.rx.ready()
    }
}

impl FrameSource for FrameReceiver<'_> {
    fn poll(&mut self) -> Option<Frame> {
        self.rx.dequeue()
    }
}

/// Bytes written into a circular receive buffer between two write positions,
/// as (first, second) segments in arrival order. `second` is empty unless
/// the writer wrapped. Equal positions mean nothing new.
pub fn ring_segments(ring: &[u8], last: usize, current: usize) -> (&[u8], &[u8]) {
    if current >= last {
        (&ring[last..current], &ring[..0])
    } else {
        (&ring[last..], &ring[..current])
    }
}
