// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The device state synchronization engine.
//!
//! # Overview
//!
//! The [`ClimateManager`] is the service object applications construct once
//! and share. It provides:
//!
//! - **Discovery**: scan the network, bind every device and seed its view
//! - **Polling**: one cancellable task per device that reports changes
//! - **Commands**: partial updates with a single rebind-and-retry
//! - **Subscriptions**: [`Session`]s that receive a device list followed by
//!   change reports, and may send update requests
//!
//! # Examples
//!
//! ## Serving a subscriber
//!
//! ```no_run
//! use climate_sync::link::MemoryLink;
//! use climate_sync::manager::{ClimateManager, SyncConfig};
//! use tokio::sync::mpsc;
//!
//! #[tokio::main]
//! async fn main() -> climate_sync::Result<()> {
//!     let manager = ClimateManager::new(MemoryLink::new(), SyncConfig::default());
//!     manager.start().await;
//!
//!     // Outbound events for this subscriber arrive on `events`.
//!     let (tx, mut events) = mpsc::channel::<String>(manager.config().subscriber_buffer);
//!     let session = manager.connect(tx);
//!
//!     // Incoming text from the subscriber goes through the session.
//!     if let Some(reply) = session
//!         .handle_message(r#"{"type":"update","mac":"aabbccddeeff","data":{"power":true}}"#)
//!         .await
//!     {
//!         println!("reply: {}", serde_json::to_string(&reply)?);
//!     }
//!
//!     while let Some(event) = events.recv().await {
//!         println!("{event}");
//!     }
//!     Ok(())
//! }
//! ```

mod climate_manager;
mod command;
mod discovery;
mod polling;
mod registry;
mod session;
mod shared;
mod sync_config;

pub use climate_manager::{ApiInfo, ClimateManager};
pub use session::Session;
pub use sync_config::SyncConfig;
