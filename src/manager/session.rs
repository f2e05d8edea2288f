// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Subscriber sessions.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::event::{DeviceEvent, SubscriberId};
use crate::link::DeviceLink;
use crate::state::DeviceUpdate;
use crate::types::MacAddress;

use super::command;
use super::shared::Shared;

const INVALID_JSON: &str = "Invalid JSON format";
const INVALID_MAC: &str = "Invalid or missing MAC address";

/// One connected subscriber.
///
/// Created by [`ClimateManager::connect`](super::ClimateManager::connect).
/// The session turns incoming text messages into device updates and
/// unregisters its subscriber when dropped.
///
/// Incoming messages look like:
///
/// ```json
/// {"type": "update", "mac": "aabbccddeeff", "data": {"target_temperature": 26}}
/// ```
pub struct Session<L: DeviceLink> {
    id: SubscriberId,
    shared: Arc<Shared<L>>,
}

impl<L: DeviceLink> Session<L> {
    pub(super) fn new(id: SubscriberId, shared: Arc<Shared<L>>) -> Self {
        Self { id, shared }
    }

    /// Returns the subscriber identifier.
    #[must_use]
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Returns `true` while the subscriber still receives broadcasts.
    ///
    /// Turns `false` once a delivery found its connection closed.
    #[must_use]
    pub fn is_registered(&self) -> bool {
        self.shared.broadcaster.contains(self.id)
    }

    /// Handles one text message from the subscriber.
    ///
    /// Returns the event to send back, if any:
    ///
    /// - `error` for malformed JSON, an unknown or missing address, or a
    ///   failed update;
    /// - `not_changed` when the update left the device as it was;
    /// - nothing when the device changed (the next poll reports it) or the
    ///   message is not an update.
    pub async fn handle_message(&self, text: &str) -> Option<DeviceEvent> {
        let Ok(message) = serde_json::from_str::<Value>(text) else {
            return Some(DeviceEvent::error(INVALID_JSON));
        };

        if message.get("type").and_then(Value::as_str) != Some("update") {
            tracing::debug!(subscriber = %self.id, "Ignoring message");
            return None;
        }

        let Some(mac) = message
            .get("mac")
            .and_then(Value::as_str)
            .and_then(|mac| mac.parse::<MacAddress>().ok())
            .filter(|mac| self.shared.registry.contains(*mac))
        else {
            return Some(DeviceEvent::error(INVALID_MAC));
        };

        let data = message
            .get("data")
            .cloned()
            .unwrap_or_else(|| Value::Object(serde_json::Map::new()));
        let update = match DeviceUpdate::from_json(data) {
            Ok(update) => update,
            Err(e) => return Some(DeviceEvent::error(e.to_string())),
        };

        match command::apply(&self.shared, mac, &update).await {
            Ok(true) => None,
            Ok(false) => Some(DeviceEvent::not_changed(mac)),
            Err(e) => {
                tracing::warn!(subscriber = %self.id, %mac, error = %e, "Update from subscriber failed");
                Some(DeviceEvent::error(e.to_string()))
            }
        }
    }
}

impl<L: DeviceLink> Drop for Session<L> {
    fn drop(&mut self) {
        self.shared.broadcaster.unregister(self.id);
    }
}

impl<L: DeviceLink> fmt::Debug for Session<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session").field("id", &self.id).finish()
    }
}
