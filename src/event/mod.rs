// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Event system for device state changes.
//!
//! The [`Broadcaster`] keeps the set of live [`Subscriber`]s and hands each
//! [`DeviceEvent`] to all of them without waiting on any one. Subscribers
//! are anything that can take a JSON payload without blocking; tokio
//! `mpsc` senders work out of the box.
//!
//! # Examples
//!
//! ```
//! use climate_sync::event::{Broadcaster, DeviceEvent};
//! use tokio::sync::mpsc;
//!
//! let broadcaster = Broadcaster::new();
//!
//! let (tx, mut rx) = mpsc::channel::<String>(16);
//! let id = broadcaster.register(tx);
//!
//! broadcaster.broadcast(&DeviceEvent::error("device offline"));
//! assert!(rx.try_recv().is_ok());
//!
//! broadcaster.unregister(id);
//! ```

mod broadcaster;
mod device_event;
mod subscriber;

pub use broadcaster::Broadcaster;
pub use device_event::DeviceEvent;
pub use subscriber::{DeliveryError, Subscriber, SubscriberId};
