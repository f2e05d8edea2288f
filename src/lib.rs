// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `climate_sync` - live state synchronization for networked climate units.
//!
//! This library keeps an in-memory view of every air conditioner reachable
//! through a [`DeviceLink`](link::DeviceLink), reports state changes to any
//! number of subscribers and applies update commands to the devices.
//!
//! # Supported Features
//!
//! - **Discovery**: network scan, bind and initial read of every device
//! - **Polling**: one independent loop per device with change detection
//! - **Commands**: partial updates with validation and one rebind-retry
//! - **Subscriptions**: JSON events fanned out without waiting on any
//!   subscriber
//!
//! The wire protocol itself lives behind the [`DeviceLink`](link::DeviceLink)
//! trait. [`MemoryLink`](link::MemoryLink) simulates devices in memory.
//!
//! # Quick Start
//!
//! ```no_run
//! use climate_sync::link::MemoryLink;
//! use climate_sync::manager::{ClimateManager, SyncConfig};
//! use climate_sync::state::DeviceUpdate;
//! use climate_sync::vocabulary::Mode;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> climate_sync::Result<()> {
//!     let config = SyncConfig::new().with_polling_interval(Duration::from_secs(5));
//!     let manager = ClimateManager::new(MemoryLink::new(), config);
//!
//!     for mac in manager.start().await {
//!         let view = manager.get_device(mac)?;
//!         println!("{mac}: {:?} at {}", view.mode, view.target_temperature);
//!
//!         let update = DeviceUpdate::new().with_power(true).with_mode(Mode::Heat);
//!         if !manager.update_device(mac, &update).await? {
//!             println!("{mac} was already heating");
//!         }
//!     }
//!
//!     manager.shutdown().await;
//!     Ok(())
//! }
//! ```

mod capabilities;
pub mod error;
pub mod event;
pub mod link;
pub mod manager;
pub mod state;
pub mod types;
pub mod vocabulary;

pub use capabilities::{Capabilities, CapabilitiesBuilder, Feature};
pub use error::{Error, ErrorClass, LinkError, Result, ValueError};
pub use event::{Broadcaster, DeviceEvent, Subscriber, SubscriberId};
pub use link::{DeviceInfo, DeviceLink, RawState};
pub use manager::{ClimateManager, Session, SyncConfig};
pub use state::{ChangeSet, DeviceUpdate, DeviceView};
pub use types::{MacAddress, TargetHumidity, TargetTemperature};
pub use vocabulary::{FanSpeed, HorizontalSwing, Mode, VerticalSwing};
