// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Subscriber connections and their identifiers.

use std::fmt;

use thiserror::Error;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Unique identifier for a registered subscriber.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(Uuid);

impl SubscriberId {
    /// Creates a new unique subscriber identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Show only first 8 characters for readability
        let short = &self.0.to_string()[..8];
        write!(f, "SubscriberId({short}...)")
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Why a payload could not be handed to a subscriber.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryError {
    /// The connection is gone. The subscriber is pruned.
    #[error("subscriber connection closed")]
    Closed,

    /// The subscriber is not keeping up. The payload is dropped for it.
    #[error("subscriber buffer full")]
    Full,
}

/// A live connection that receives serialized events.
///
/// Delivery must not block: implementations hand the payload to a buffer
/// or fail immediately.
pub trait Subscriber: Send + Sync {
    /// Hands one JSON payload to the connection.
    ///
    /// # Errors
    ///
    /// Returns `DeliveryError::Closed` if the connection is gone, or
    /// `DeliveryError::Full` if its buffer is exhausted.
    fn deliver(&self, payload: &str) -> Result<(), DeliveryError>;
}

impl Subscriber for mpsc::Sender<String> {
    fn deliver(&self, payload: &str) -> Result<(), DeliveryError> {
        self.try_send(payload.to_string()).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => DeliveryError::Full,
            mpsc::error::TrySendError::Closed(_) => DeliveryError::Closed,
        })
    }
}

impl Subscriber for mpsc::UnboundedSender<String> {
    fn deliver(&self, payload: &str) -> Result<(), DeliveryError> {
        self.send(payload.to_string())
            .map_err(|_| DeliveryError::Closed)
    }
}
