//! # Watch multiplexer: store events in, reconcile signals out.
//!
//! Maintains one reference-counted store watch per subscription key and
//! fans incoming events out to subscribed controllers' mailboxes, filtered
//! by input kind.
//!
//! ## Architecture
//! ```text
//! Store ──watch(ns,ty,id?)──► watch task (one per key)
//!                                  │  snapshot prefix + live events
//!                                  ▼
//!                             fan_out(event)
//!                                  ├─► WEAK/STRONG  → mailbox.signal()
//!                                  └─► DESTROY_READY → signal only when
//!                                      tearing down ∧ finalizers == ∅
//!                                      ∧ subscriber is the owner
//! ```
//!
//! ## Rules
//! - First subscriber for a key opens the store watch; the last one to
//!   leave closes it.
//! - Watch failures are retried with bounded exponential backoff; the watch
//!   never dies silently.
//! - Fan-out reads a snapshot of the subscriber list; no lock is held while
//!   signaling mailboxes.
//! - The multiplexer passes no resource identities to controllers: a signal
//!   means "something changed, reread".

use std::sync::{Arc, RwLock};

use dashmap::DashMap;
use tokio_util::sync::CancellationToken;

use crate::events::{Bus, RuntimeEvent, RuntimeEventKind};
use crate::mailbox::Mailboxes;
use crate::policies::BackoffPolicy;
use crate::registry::{ControllerDescriptor, Input, InputKind};
use crate::resource::Phase;
use crate::store::{Store, StoreEvent, StoreEventKind};

use super::key::{SubscriptionKey, Subscriber};

/// Live state of one subscription key.
struct WatchEntry {
    subscribers: Arc<RwLock<Vec<Subscriber>>>,
    cancel: CancellationToken,
}

/// Maps subscription keys to controller sets and keeps one store watch per
/// key alive.
pub(crate) struct Multiplexer {
    store: Arc<dyn Store>,
    mailboxes: Arc<Mailboxes>,
    bus: Bus<RuntimeEvent>,
    backoff: BackoffPolicy,
    entries: DashMap<SubscriptionKey, WatchEntry>,
    cancel: CancellationToken,
}

impl Multiplexer {
    pub(crate) fn new(
        store: Arc<dyn Store>,
        mailboxes: Arc<Mailboxes>,
        bus: Bus<RuntimeEvent>,
        backoff: BackoffPolicy,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            store,
            mailboxes,
            bus,
            backoff,
            entries: DashMap::new(),
            cancel,
        }
    }

    /// Activates subscriptions for a registry snapshot (called at `Start`).
    pub(crate) fn activate(&self, descriptors: &[ControllerDescriptor]) {
        for descriptor in descriptors {
            for input in &descriptor.inputs {
                self.subscribe(&descriptor.name, input);
            }
        }
    }

    /// Adds a `(controller, kind)` pair under the input's key, opening the
    /// store watch if this is the first subscriber.
    pub(crate) fn subscribe(&self, controller: &str, input: &Input) {
        let key = SubscriptionKey::from(input);
        let subscriber = Subscriber {
            controller: controller.to_string(),
            kind: input.kind,
        };

        let entry = self.entries.entry(key.clone()).or_insert_with(|| {
            let subscribers = Arc::new(RwLock::new(Vec::new()));
            let cancel = self.cancel.child_token();
            self.spawn_watch(key, Arc::clone(&subscribers), cancel.clone());
            WatchEntry {
                subscribers,
                cancel,
            }
        });

        let mut subscribers = entry
            .subscribers
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if !subscribers.contains(&subscriber) {
            subscribers.push(subscriber);
        }
    }

    /// Removes a `(controller, kind)` pair; the last removal under a key
    /// cancels the watch task.
    pub(crate) fn unsubscribe(&self, controller: &str, input: &Input) {
        let key = SubscriptionKey::from(input);
        {
            let Some(entry) = self.entries.get(&key) else {
                return;
            };
            let mut subscribers = entry
                .subscribers
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            subscribers.retain(|s| !(s.controller == controller && s.kind == input.kind));
        }

        // Drop the entry only if it is still empty; `remove_if` holds the
        // shard lock, so a concurrent subscribe cannot slip in between the
        // check and the removal.
        let removed = self.entries.remove_if(&key, |_, entry| {
            entry
                .subscribers
                .read()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .is_empty()
        });
        if let Some((_, entry)) = removed {
            entry.cancel.cancel();
            self.bus.publish(RuntimeEvent::now(RuntimeEventKind::WatchClosed));
        }
    }

    /// Cancels every watch task and clears the table (called at `Stop`).
    pub(crate) fn shutdown(&self) {
        self.entries.clear();
        // Child tokens die with the root.
        self.cancel.cancel();
    }

    fn spawn_watch(
        &self,
        key: SubscriptionKey,
        subscribers: Arc<RwLock<Vec<Subscriber>>>,
        cancel: CancellationToken,
    ) {
        let store = Arc::clone(&self.store);
        let mailboxes = Arc::clone(&self.mailboxes);
        let bus = self.bus.clone();
        let backoff = self.backoff;

        tokio::spawn(async move {
            let mut prev_delay = None;
            loop {
                if cancel.is_cancelled() {
                    return;
                }

                match store.watch(&key.namespace, &key.ty, key.id.as_deref()).await {
                    Ok(mut stream) => {
                        prev_delay = None;
                        bus.publish(RuntimeEvent::now(RuntimeEventKind::WatchOpened));
                        loop {
                            tokio::select! {
                                _ = cancel.cancelled() => return,
                                ev = stream.next() => match ev {
                                    Some(ev) => {
                                        fan_out(&ev, &subscribers, &mailboxes, &bus);
                                    }
                                    // Feed closed: the store went away; retry.
                                    None => break,
                                }
                            }
                        }
                    }
                    Err(e) => {
                        let delay = backoff.next(prev_delay);
                        prev_delay = Some(delay);
                        bus.publish(
                            RuntimeEvent::now(RuntimeEventKind::WatchRetry)
                                .with_error(e.to_string())
                                .with_delay(delay),
                        );
                        tokio::select! {
                            _ = cancel.cancelled() => return,
                            _ = tokio::time::sleep(delay) => {}
                        }
                    }
                }
            }
        });
    }
}

/// Applies the per-kind delivery filter and signals matching mailboxes.
fn fan_out(
    ev: &StoreEvent,
    subscribers: &Arc<RwLock<Vec<Subscriber>>>,
    mailboxes: &Mailboxes,
    bus: &Bus<RuntimeEvent>,
) {
    let snapshot: Vec<Subscriber> = subscribers
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .clone();

    for subscriber in snapshot {
        let deliver = match subscriber.kind {
            // Any create/update/destroy (and lag bookmarks) warrants a reread.
            InputKind::Weak | InputKind::Strong => true,
            InputKind::DestroyReady => destroy_ready(ev, &subscriber.controller),
        };
        if deliver && mailboxes.signal(&subscriber.controller) {
            bus.publish(
                RuntimeEvent::now(RuntimeEventKind::ReconcileSignaled)
                    .with_controller(subscriber.controller.clone()),
            );
        }
    }
}

/// Destroy-ready delivery: the resource is tearing down with no finalizers
/// left, and the subscriber is its owner. Destruction itself emits nothing
/// (the resource is already gone).
fn destroy_ready(ev: &StoreEvent, controller: &str) -> bool {
    if !matches!(ev.kind, StoreEventKind::Created | StoreEventKind::Updated) {
        return false;
    }
    ev.metadata().is_some_and(|md| {
        md.phase == Phase::TearingDown && md.finalizers_empty() && md.owner == controller
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::Resource;

    fn tearing_down(owner: &str, finalizers: &[&str]) -> StoreEvent {
        let mut r = Resource::new("default", "configs", "x", "v1");
        r.metadata_mut().phase = Phase::TearingDown;
        r.metadata_mut().owner = owner.to_string();
        for f in finalizers {
            r.metadata_mut().add_finalizer(*f);
        }
        StoreEvent::updated(r)
    }

    #[test]
    fn destroy_ready_requires_all_conditions() {
        // Owner, tearing down, empty finalizers: deliver.
        assert!(destroy_ready(&tearing_down("a", &[]), "a"));
        // Wrong controller: skip.
        assert!(!destroy_ready(&tearing_down("a", &[]), "b"));
        // Finalizers still attached: skip.
        assert!(!destroy_ready(&tearing_down("a", &["f"]), "a"));
        // Still running: skip.
        let running = StoreEvent::created(Resource::new("default", "configs", "x", "v1"));
        assert!(!destroy_ready(&running, ""));
        // Destruction emits nothing.
        let mut r = Resource::new("default", "configs", "x", "v1");
        r.metadata_mut().phase = Phase::TearingDown;
        r.metadata_mut().owner = "a".to_string();
        assert!(!destroy_ready(&StoreEvent::destroyed(r), "a"));
        // Bookmarks carry no resource.
        assert!(!destroy_ready(&StoreEvent::bookmark(), "a"));
    }
}
