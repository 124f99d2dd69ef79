//! Interrupt-to-thread hand-off for NMEA sentences.
//!
//! The UART receive interrupt owns a [`FrameProducer`] and pushes one byte at
//! a time. Completed sentences are published to the [`FrameConsumer`] held by
//! the driver, which reads them from thread context. Two buffers are used: the
//! producer always fills one while the other holds the sentence waiting to be
//! read. A sentence completing while the previous one has not been read yet
//! is dropped and counted, never written over the buffer being read.

use core::{
    cell::UnsafeCell,
    ptr,
    sync::atomic::{
        AtomicBool, AtomicPtr, AtomicUsize,
        Ordering::{Acquire, Relaxed, Release},
    },
};

use crate::nmea::{NMEA_END, NMEA_FRAME_SIZE};

pub const FRAME_DEPTH: usize = 2;

struct Slot {
    len: usize,
    bytes: [u8; NMEA_FRAME_SIZE],
}

impl Slot {
    const EMPTY: Self = Self {
        len: 0,
        bytes: [0; NMEA_FRAME_SIZE],
    };
}

// Published frames are counted by HEAD, released frames by TAIL. At most
// FRAME_DEPTH - 1 frames are published at once, so the slot the producer
// fills (HEAD % FRAME_DEPTH) is never the one being read.
pub struct FrameRing {
    is_split: AtomicBool,
    head: AtomicUsize,
    tail: AtomicUsize,
    dropped: AtomicUsize,
    truncated: AtomicUsize,
    trigger: AtomicPtr<()>,
    buf: [UnsafeCell<Slot>; FRAME_DEPTH],
}

// SAFETY: A slot is only written by the single Producer while it is not
// published, and only read by the single Consumer between publication (HEAD
// Release) and release (TAIL Release).
unsafe impl Sync for FrameRing {}

impl Default for FrameRing {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameRing {
    #[allow(clippy::declare_interior_mutable_const)]
    const SLOT: UnsafeCell<Slot> = UnsafeCell::new(Slot::EMPTY);

    pub const fn new() -> Self {
        Self {
            is_split: AtomicBool::new(false),
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
            dropped: AtomicUsize::new(0),
            truncated: AtomicUsize::new(0),
            trigger: AtomicPtr::new(ptr::null_mut()),
            buf: [Self::SLOT; FRAME_DEPTH],
        }
    }

    /// Hands out the two ends of the ring. Returns `None` after the first call.
    pub fn try_split(&'static self) -> Option<(FrameProducer, FrameConsumer)> {
        if self.is_split.fetch_or(true, Relaxed) {
            None
        } else {
            Some((
                FrameProducer {
                    ring: self,
                    offset: 0,
                },
                FrameConsumer(self),
            ))
        }
    }

    fn pending(&self) -> usize {
        self.head.load(Acquire).wrapping_sub(self.tail.load(Acquire))
    }

    fn fire_trigger(&self) {
        let trigger = self.trigger.load(Acquire);
        if !trigger.is_null() {
            // SAFETY: Only `set_trigger` stores into this pointer, and it only
            // ever stores a `fn()` cast to a raw pointer.
            let trigger = unsafe { core::mem::transmute::<*mut (), fn()>(trigger) };
            trigger();
        }
    }
}

pub struct FrameProducer {
    ring: &'static FrameRing,
    offset: usize,
}

impl FrameProducer {
    /// Feeds one received byte. Call from the UART receive interrupt.
    ///
    /// On the line terminator the sentence is published (or dropped if the
    /// previous one is still unread) and the process trigger is fired. A
    /// sentence that fills the buffer without a terminator is discarded.
    pub fn on_byte(&mut self, b: u8) {
        let ring = self.ring;
        let slot = ring.head.load(Relaxed) % FRAME_DEPTH;
        // SAFETY: `slot` is not published, so the Consumer never touches it,
        // and only one Producer exists.
        let frame = unsafe { &mut *ring.buf[slot].get() };
        frame.bytes[self.offset] = b;
        self.offset += 1;

        if b == NMEA_END {
            if ring.pending() < FRAME_DEPTH - 1 {
                frame.len = self.offset;
                ring.head.fetch_add(1, Release);
            } else {
                ring.dropped.fetch_add(1, Relaxed);
                trace!("nmea frame dropped, previous one still unread");
            }
            self.offset = 0;
            ring.fire_trigger();
        } else if self.offset >= NMEA_FRAME_SIZE {
            ring.truncated.fetch_add(1, Relaxed);
            trace!("nmea frame truncated at {=usize} bytes", NMEA_FRAME_SIZE);
            self.offset = 0;
        }
    }

    pub fn is_full(&self) -> bool {
        self.ring.pending() >= FRAME_DEPTH - 1
    }
}

pub struct FrameConsumer(&'static FrameRing);

impl FrameConsumer {
    pub fn is_ready(&self) -> bool {
        self.0.pending() != 0
    }

    /// Runs `f` on the oldest published sentence (terminator included), then
    /// gives its buffer back to the producer.
    pub fn read<R>(&mut self, f: impl FnOnce(&[u8]) -> R) -> Option<R> {
        let tail = self.0.tail.load(Relaxed);
        if self.0.head.load(Acquire) == tail {
            return None;
        }
        // SAFETY: The slot is published and can't be written until TAIL moves
        // past it, which only this (single) Consumer does.
        let frame = unsafe { &*self.0.buf[tail % FRAME_DEPTH].get() };
        let result = f(&frame.bytes[..frame.len]);
        self.0.tail.store(tail.wrapping_add(1), Release);
        Some(result)
    }

    /// Drops every published sentence.
    pub fn clear(&mut self) {
        self.0.tail.store(self.0.head.load(Acquire), Release);
    }

    /// Installs the callback the producer fires after each line terminator.
    /// It runs in interrupt context and should only schedule `process`.
    pub fn set_trigger(&mut self, trigger: Option<fn()>) {
        let ptr = trigger.map_or(ptr::null_mut(), |f| f as *mut ());
        self.0.trigger.store(ptr, Release);
    }

    /// Sentences lost because the previous one had not been read yet
    pub fn dropped(&self) -> usize {
        self.0.dropped.load(Relaxed)
    }

    /// Sentences lost because they did not fit in a buffer
    pub fn truncated(&self) -> usize {
        self.0.truncated.load(Relaxed)
    }
}
