// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device event types.

use crate::state::{ChangeSet, DeviceView};
use crate::types::MacAddress;

/// Events delivered to subscribers.
///
/// Every event serializes to one JSON object with a `type` discriminator.
///
/// # Examples
///
/// ```
/// use climate_sync::event::DeviceEvent;
///
/// let event = DeviceEvent::error("Invalid JSON format");
/// assert_eq!(
///     serde_json::to_string(&event).unwrap(),
///     r#"{"type":"error","message":"Invalid JSON format"}"#
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeviceEvent {
    /// A device's state changed.
    Report {
        /// The device that changed.
        mac: MacAddress,
        /// What changed, keyed by field name.
        changes: ChangeSet,
    },

    /// Every known device, sent once to each new subscriber.
    List {
        /// Current views of all registered devices.
        data: Vec<DeviceView>,
    },

    /// A request from the subscriber failed.
    Error {
        /// Human readable reason.
        message: String,
    },

    /// An update request left the device as it was.
    NotChanged {
        /// The addressed device.
        mac: MacAddress,
        /// Human readable explanation.
        message: String,
    },
}

impl DeviceEvent {
    /// Creates a report event.
    #[must_use]
    pub fn report(mac: MacAddress, changes: ChangeSet) -> Self {
        Self::Report { mac, changes }
    }

    /// Creates a list event.
    #[must_use]
    pub fn list(data: Vec<DeviceView>) -> Self {
        Self::List { data }
    }

    /// Creates an error event.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Creates a not-changed acknowledgment.
    #[must_use]
    pub fn not_changed(mac: MacAddress) -> Self {
        Self::NotChanged {
            mac,
            message: "No changes made to the device by last command".to_string(),
        }
    }

    /// Returns the event's type discriminator.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Report { .. } => "report",
            Self::List { .. } => "list",
            Self::Error { .. } => "error",
            Self::NotChanged { .. } => "not_changed",
        }
    }
}
