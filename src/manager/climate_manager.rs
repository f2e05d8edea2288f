// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The synchronization service object.

use std::fmt;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::error::{Error, Result};
use crate::event::{DeviceEvent, Subscriber};
use crate::link::DeviceLink;
use crate::state::{DeviceUpdate, DeviceView};
use crate::types::MacAddress;

use super::polling::PollingScheduler;
use super::session::Session;
use super::shared::Shared;
use super::sync_config::SyncConfig;
use super::{command, discovery};

/// Keeps a live view of every device reachable through a [`DeviceLink`].
///
/// The manager owns the device registry, one polling task per device and
/// the set of subscribers that receive change reports.
///
/// # Lifecycle
///
/// 1. [`new`](Self::new) builds an idle manager.
/// 2. [`start`](Self::start) runs the first discovery pass and spawns the
///    polling tasks. [`discover_devices`](Self::discover_devices) repeats
///    that on demand, replacing every device.
/// 3. [`shutdown`](Self::shutdown) cancels every polling task and waits for
///    them to finish.
///
/// Clones share the same devices, tasks and subscribers. Dropping the last
/// clone without calling `shutdown` still stops the polling tasks, but does
/// not wait for them.
///
/// # Examples
///
/// ```
/// use std::net::Ipv4Addr;
/// use climate_sync::link::{attr, DeviceInfo, MemoryLink, RawState};
/// use climate_sync::manager::{ClimateManager, SyncConfig};
/// use climate_sync::state::DeviceUpdate;
/// use climate_sync::types::{MacAddress, TargetTemperature};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> climate_sync::Result<()> {
/// let link = MemoryLink::new();
/// let mac: MacAddress = "aabbccddeeff".parse()?;
/// link.add_device(
///     DeviceInfo::new(mac, Ipv4Addr::new(192, 168, 1, 40), "bedroom"),
///     RawState::new()
///         .with(attr::POWER, 1)
///         .with(attr::MODE, 1)
///         .with(attr::TARGET_TEMPERATURE, 24)
///         .with(attr::FAN_SPEED, 0)
///         .with(attr::HORIZONTAL_SWING, 0)
///         .with(attr::VERTICAL_SWING, 0),
/// );
///
/// let manager = ClimateManager::new(link, SyncConfig::default());
/// let devices = manager.start().await;
/// assert_eq!(devices, vec![mac]);
///
/// let update = DeviceUpdate::new().with_target_temperature(TargetTemperature::new(26)?);
/// assert!(manager.update_device(mac, &update).await?);
///
/// manager.shutdown().await;
/// # Ok(())
/// # }
/// ```
pub struct ClimateManager<L: DeviceLink> {
    shared: Arc<Shared<L>>,
    polling: Arc<PollingScheduler>,
    /// Serializes discovery passes and shutdown.
    lifecycle: Arc<Mutex<()>>,
}

impl<L: DeviceLink> ClimateManager<L> {
    /// Creates an idle manager. No device is discovered until
    /// [`start`](Self::start).
    #[must_use]
    pub fn new(link: L, config: SyncConfig) -> Self {
        Self {
            shared: Arc::new(Shared::new(link, config)),
            polling: Arc::new(PollingScheduler::new()),
            lifecycle: Arc::new(Mutex::new(())),
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &SyncConfig {
        &self.shared.config
    }

    /// Returns the device link.
    #[must_use]
    pub fn link(&self) -> &L {
        &self.shared.link
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Runs the first discovery pass and returns the registered devices.
    pub async fn start(&self) -> Vec<MacAddress> {
        tracing::info!(
            polling_interval = ?self.shared.config.polling_interval,
            "Starting climate manager"
        );
        self.discover_devices().await
    }

    /// Cancels every polling task and waits for all of them.
    ///
    /// Registered devices stay readable; they are no longer refreshed.
    pub async fn shutdown(&self) {
        let _guard = self.lifecycle.lock().await;
        self.polling.stop_all().await;
        tracing::info!("Climate manager stopped");
    }

    /// Returns the service name, its version and the registered devices.
    #[must_use]
    pub fn info(&self) -> ApiInfo {
        ApiInfo {
            app: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            devices: self.shared.registry.identities(),
        }
    }

    // =========================================================================
    // Devices
    // =========================================================================

    /// Replaces every device with those currently on the network.
    ///
    /// Polling for the previous devices is cancelled and awaited first.
    /// Devices that fail to bind are skipped. If the network scan itself
    /// fails, the failure is logged and the registry is left empty.
    pub async fn discover_devices(&self) -> Vec<MacAddress> {
        let _guard = self.lifecycle.lock().await;
        discovery::discover(&self.shared, &self.polling).await
    }

    /// Returns the views of every registered device, ordered by address.
    #[must_use]
    pub fn list_devices(&self) -> Vec<DeviceView> {
        self.shared.registry.list()
    }

    /// Returns the view of one device.
    ///
    /// # Errors
    ///
    /// Returns `Error::DeviceNotFound` if no such device is registered.
    pub fn get_device(&self, mac: MacAddress) -> Result<DeviceView> {
        self.shared
            .registry
            .get(mac)
            .ok_or(Error::DeviceNotFound(mac))
    }

    /// Returns the number of registered devices.
    #[must_use]
    pub fn device_count(&self) -> usize {
        self.shared.registry.len()
    }

    /// Returns `true` if a polling task is running for the device.
    #[must_use]
    pub fn is_polling(&self, mac: MacAddress) -> bool {
        self.polling.is_running(mac)
    }

    /// Applies a partial update to a device.
    ///
    /// Returns `true` if any field differed from the device's last known
    /// value. Subscribers learn about the change from the next poll.
    ///
    /// # Errors
    ///
    /// - `Error::DeviceNotFound` if no such device is registered; the link is
    ///   not touched.
    /// - `Error::InvalidCommandValue` if a value has no device counterpart;
    ///   the device is left as it was.
    /// - `Error::DeviceCommunication` if the rebind or the retried push failed.
    /// - `Error::InternalCommand` for any other failure of the first push.
    pub async fn update_device(&self, mac: MacAddress, update: &DeviceUpdate) -> Result<bool> {
        command::apply(&self.shared, mac, update).await
    }

    // =========================================================================
    // Subscriptions
    // =========================================================================

    /// Registers a subscriber and sends it the list of every device.
    ///
    /// The list is taken while registration holds the subscriber lock, so
    /// every later change reaches the subscriber as a report. Change reports
    /// follow as they happen. The subscription lasts until the
    /// returned [`Session`] is dropped or the subscriber's connection closes.
    pub fn connect(&self, sink: impl Subscriber + 'static) -> Session<L> {
        let registry = &self.shared.registry;
        let id = self
            .shared
            .broadcaster
            .register_with(sink, || DeviceEvent::list(registry.list()));
        Session::new(id, Arc::clone(&self.shared))
    }

    /// Returns the number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.shared.broadcaster.subscriber_count()
    }
}

impl<L: DeviceLink> Clone for ClimateManager<L> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            polling: Arc::clone(&self.polling),
            lifecycle: Arc::clone(&self.lifecycle),
        }
    }
}

impl<L: DeviceLink> fmt::Debug for ClimateManager<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClimateManager")
            .field("devices", &self.shared.registry)
            .field("polling", &self.polling.running_count())
            .field("subscribers", &self.subscriber_count())
            .field("config", &self.shared.config)
            .finish_non_exhaustive()
    }
}

/// Service identification.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ApiInfo {
    /// Crate name.
    pub app: String,
    /// Crate version.
    pub version: String,
    /// Addresses of the registered devices.
    pub devices: Vec<MacAddress>,
}
