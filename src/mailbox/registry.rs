//! # Per-controller mailbox table.
//!
//! One [`Mailbox`] per registered controller, created at registration and
//! shared between the watch multiplexer (producer side) and reconcile
//! streams (consumer side).

use std::sync::Arc;

use dashmap::DashMap;

use super::core::Mailbox;

/// Concurrent map of controller name to mailbox.
pub struct Mailboxes {
    cells: DashMap<String, Arc<Mailbox>>,
}

impl Mailboxes {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self {
            cells: DashMap::new(),
        }
    }

    /// Ensures a mailbox exists for the controller and returns it.
    pub fn register(&self, controller: &str) -> Arc<Mailbox> {
        self.cells
            .entry(controller.to_string())
            .or_insert_with(|| Arc::new(Mailbox::new()))
            .clone()
    }

    /// The controller's mailbox, if registered.
    pub fn get(&self, controller: &str) -> Option<Arc<Mailbox>> {
        self.cells.get(controller).map(|e| e.clone())
    }

    /// Signals the controller's mailbox.
    ///
    /// Returns `true` if the mailbox transitioned from empty to full;
    /// `false` if the signal coalesced or the controller is unknown.
    pub fn signal(&self, controller: &str) -> bool {
        match self.cells.get(controller) {
            Some(mailbox) => mailbox.signal(),
            None => false,
        }
    }

    /// Signals every registered mailbox (the `Start` initial kick).
    pub fn signal_all(&self) {
        for entry in self.cells.iter() {
            entry.value().signal();
        }
    }
}

impl Default for Mailboxes {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_is_idempotent() {
        let mailboxes = Mailboxes::new();
        let a = mailboxes.register("ctrl");
        let b = mailboxes.register("ctrl");
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn signal_unknown_controller_is_noop() {
        let mailboxes = Mailboxes::new();
        assert!(!mailboxes.signal("ghost"));
    }

    #[test]
    fn signal_all_kicks_every_mailbox() {
        let mailboxes = Mailboxes::new();
        let a = mailboxes.register("a");
        let b = mailboxes.register("b");
        mailboxes.signal_all();
        assert!(a.is_full());
        assert!(b.is_full());
    }
}
