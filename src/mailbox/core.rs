//! # Coalescing reconcile mailbox.
//!
//! Per controller, a mailbox of capacity one: any number of signals between
//! two consumer pulls collapse into a single pending reconcile. Controllers
//! must treat a delivery as "something changed, reread" and never as a
//! change diff.
//!
//! ## Rules
//! - `signal()` on an empty mailbox fills it and wakes the consumer.
//! - `signal()` on a full mailbox is a no-op (coalesced).
//! - `recv()` clears the mailbox and returns; at most one consumer at a time.
//! - The full/empty cell is a single atomic; no lock is held on either path.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Notify;

/// Capacity-one coalescing cell with an async consumer wakeup.
#[derive(Debug)]
pub struct Mailbox {
    full: AtomicBool,
    attached: AtomicBool,
    notify: Notify,
}

impl Mailbox {
    /// Creates an empty, unattached mailbox.
    pub fn new() -> Self {
        Self {
            full: AtomicBool::new(false),
            attached: AtomicBool::new(false),
            notify: Notify::new(),
        }
    }

    /// Marks the mailbox full and wakes the consumer.
    ///
    /// Returns `true` if the mailbox transitioned from empty to full,
    /// `false` if the signal coalesced into an already-pending one.
    pub fn signal(&self) -> bool {
        if self.full.swap(true, Ordering::AcqRel) {
            return false;
        }
        // `notify_one` stores a permit when no consumer is parked, so a
        // signal racing the consumer's empty-check is never lost.
        self.notify.notify_one();
        true
    }

    /// Waits until a signal is pending, then clears it.
    pub async fn recv(&self) {
        loop {
            if self.full.swap(false, Ordering::AcqRel) {
                return;
            }
            self.notify.notified().await;
        }
    }

    /// True if a signal is pending.
    pub fn is_full(&self) -> bool {
        self.full.load(Ordering::Acquire)
    }

    /// Claims the single consumer slot. Returns `false` if a stream is
    /// already attached.
    pub fn try_attach(&self) -> bool {
        !self.attached.swap(true, Ordering::AcqRel)
    }

    /// Releases the consumer slot (stream closed or dropped).
    pub fn detach(&self) {
        self.attached.store(false, Ordering::Release);
    }
}

impl Default for Mailbox {
    fn default() -> Self {
        Self::new()
    }
}
