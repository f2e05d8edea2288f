// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fan-out of device events to live subscribers.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use super::{DeliveryError, DeviceEvent, Subscriber, SubscriberId};

type SubscriberMap = HashMap<SubscriberId, Box<dyn Subscriber>>;

/// Registry of live subscribers with best-effort delivery.
///
/// Each event is serialized once and handed to every subscriber under a
/// single lock. A subscriber whose connection is closed is removed once the
/// pass over the set is complete; one that is merely full loses that event
/// and stays registered. Nothing is buffered on the broadcaster's side.
///
/// Clones share the same subscriber set.
///
/// # Examples
///
/// ```
/// use climate_sync::event::{Broadcaster, DeviceEvent};
/// use tokio::sync::mpsc;
///
/// let broadcaster = Broadcaster::new();
/// let (tx, mut rx) = mpsc::unbounded_channel::<String>();
/// broadcaster.register(tx);
///
/// assert_eq!(broadcaster.broadcast(&DeviceEvent::error("boom")), 1);
/// assert!(rx.try_recv().unwrap().contains("boom"));
/// ```
#[derive(Clone, Default)]
pub struct Broadcaster {
    subscribers: Arc<Mutex<SubscriberMap>>,
}

impl Broadcaster {
    /// Creates a broadcaster with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a subscriber and returns its identifier.
    pub fn register(&self, subscriber: impl Subscriber + 'static) -> SubscriberId {
        let id = SubscriberId::new();
        self.subscribers.lock().insert(id, Box::new(subscriber));
        tracing::debug!(subscriber = %id, "Subscriber registered");
        id
    }

    /// Adds a subscriber after handing it a first event.
    ///
    /// `first` is built and delivered under the same lock as the insertion.
    /// A broadcast is therefore either reflected in the first event or
    /// delivered after it, never lost in between. A subscriber that is
    /// already closed is not registered.
    ///
    /// `first` must not call back into this broadcaster.
    pub fn register_with(
        &self,
        subscriber: impl Subscriber + 'static,
        first: impl FnOnce() -> DeviceEvent,
    ) -> SubscriberId {
        let id = SubscriberId::new();
        let mut subscribers = self.subscribers.lock();

        let first = first();
        if let Some(payload) = encode(&first) {
            match subscriber.deliver(&payload) {
                Err(DeliveryError::Closed) => {
                    tracing::debug!(subscriber = %id, "Subscriber closed before registration");
                    return id;
                }
                Err(DeliveryError::Full) => {
                    tracing::warn!(subscriber = %id, kind = first.kind(), "Subscriber lagging, event dropped");
                }
                Ok(()) => {}
            }
        }

        subscribers.insert(id, Box::new(subscriber));
        tracing::debug!(subscriber = %id, "Subscriber registered");
        id
    }

    /// Removes a subscriber.
    ///
    /// Returns `true` if it was registered.
    pub fn unregister(&self, id: SubscriberId) -> bool {
        let removed = self.subscribers.lock().remove(&id).is_some();
        if removed {
            tracing::debug!(subscriber = %id, "Subscriber unregistered");
        }
        removed
    }

    /// Returns the number of registered subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }

    /// Returns `true` if the subscriber is registered.
    #[must_use]
    pub fn contains(&self, id: SubscriberId) -> bool {
        self.subscribers.lock().contains_key(&id)
    }

    /// Delivers an event to every subscriber.
    ///
    /// Returns the number of subscribers that accepted it. Failures never
    /// propagate; closed subscribers are pruned.
    pub fn broadcast(&self, event: &DeviceEvent) -> usize {
        let Some(payload) = encode(event) else {
            return 0;
        };

        let mut subscribers = self.subscribers.lock();
        let mut delivered = 0;
        let mut closed = Vec::new();

        for (id, subscriber) in subscribers.iter() {
            match subscriber.deliver(&payload) {
                Ok(()) => delivered += 1,
                Err(DeliveryError::Closed) => closed.push(*id),
                Err(DeliveryError::Full) => {
                    tracing::warn!(subscriber = %id, kind = event.kind(), "Subscriber lagging, event dropped");
                }
            }
        }

        for id in closed {
            subscribers.remove(&id);
            tracing::debug!(subscriber = %id, "Pruned closed subscriber");
        }

        delivered
    }
}

fn encode(event: &DeviceEvent) -> Option<String> {
    match serde_json::to_string(event) {
        Ok(payload) => Some(payload),
        Err(e) => {
            tracing::error!(kind = event.kind(), error = %e, "Failed to encode event");
            None
        }
    }
}

impl fmt::Debug for Broadcaster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Broadcaster")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
