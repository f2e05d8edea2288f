// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-memory device link.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use super::{DeviceInfo, DeviceLink, RawState};
use crate::error::LinkError;
use crate::types::MacAddress;

/// Number of calls made to each [`DeviceLink`] operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkCalls {
    /// Calls to `discover`.
    pub discover: usize,
    /// Calls to `bind`.
    pub bind: usize,
    /// Calls to `read_state`.
    pub read: usize,
    /// Calls to `write_state`.
    pub write: usize,
}

impl LinkCalls {
    /// Total number of calls across all operations.
    #[must_use]
    pub fn total(&self) -> usize {
        self.discover + self.bind + self.read + self.write
    }
}

/// A device simulated by [`MemoryLink`].
#[derive(Debug)]
struct SimulatedDevice {
    info: DeviceInfo,
    state: RawState,
    /// Sessions from older generations are no longer bound.
    generation: u64,
    writes: Vec<RawState>,
}

#[derive(Debug, Default)]
struct Inner {
    devices: BTreeMap<MacAddress, SimulatedDevice>,
    bind_failures: HashMap<MacAddress, VecDeque<LinkError>>,
    read_failures: HashMap<MacAddress, VecDeque<LinkError>>,
    write_failures: HashMap<MacAddress, VecDeque<LinkError>>,
    discover_failure: Option<LinkError>,
    read_delay: Option<Duration>,
    calls: LinkCalls,
}

/// Session handed out by [`MemoryLink::bind`](DeviceLink::bind).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemorySession {
    mac: MacAddress,
    generation: u64,
}

impl MemorySession {
    /// Returns the address of the bound device.
    #[must_use]
    pub fn mac(&self) -> MacAddress {
        self.mac
    }
}

/// A [`DeviceLink`] backed by simulated devices held in memory.
///
/// Clones share the same simulated network, so a test can keep one clone
/// to drive device state and inject failures while the engine owns another.
///
/// # Examples
///
/// ```
/// use std::net::Ipv4Addr;
/// use climate_sync::link::{attr, DeviceInfo, MemoryLink, RawState};
///
/// let link = MemoryLink::new();
/// let mac = "aabbccddeeff".parse().unwrap();
/// link.add_device(
///     DeviceInfo::new(mac, Ipv4Addr::new(192, 168, 1, 20), "living room"),
///     RawState::new().with(attr::POWER, 1),
/// );
/// assert_eq!(link.state(mac).unwrap().get(attr::POWER), Some(1));
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryLink {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryLink {
    /// Creates a link with no devices.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) a simulated device.
    pub fn add_device(&self, info: DeviceInfo, state: RawState) {
        let mac = info.mac;
        self.inner.lock().devices.insert(
            mac,
            SimulatedDevice {
                info,
                state,
                generation: 0,
                writes: Vec::new(),
            },
        );
    }

    /// Removes a simulated device. Existing sessions stop answering.
    pub fn remove_device(&self, mac: MacAddress) {
        self.inner.lock().devices.remove(&mac);
    }

    /// Returns the current attributes of a device.
    #[must_use]
    pub fn state(&self, mac: MacAddress) -> Option<RawState> {
        self.inner.lock().devices.get(&mac).map(|d| d.state.clone())
    }

    /// Changes one attribute, as a remote control would.
    pub fn set_attr(&self, mac: MacAddress, key: &str, value: i64) {
        if let Some(device) = self.inner.lock().devices.get_mut(&mac) {
            device.state.set(key, value);
        }
    }

    /// Removes one attribute from what the device reports.
    pub fn clear_attr(&self, mac: MacAddress, key: &str) {
        if let Some(device) = self.inner.lock().devices.get_mut(&mac) {
            device.state = device
                .state
                .iter()
                .filter(|(k, _)| *k != key)
                .collect();
        }
    }

    /// Returns every attribute set written to a device, oldest first.
    #[must_use]
    pub fn writes(&self, mac: MacAddress) -> Vec<RawState> {
        self.inner
            .lock()
            .devices
            .get(&mac)
            .map(|d| d.writes.clone())
            .unwrap_or_default()
    }

    /// Drops the device's binding; sessions issued so far fail with
    /// [`LinkError::NotBound`] until the next bind.
    pub fn unbind(&self, mac: MacAddress) {
        if let Some(device) = self.inner.lock().devices.get_mut(&mac) {
            device.generation += 1;
        }
    }

    /// Makes the next bind of `mac` fail with `error`.
    pub fn fail_next_bind(&self, mac: MacAddress, error: LinkError) {
        self.inner
            .lock()
            .bind_failures
            .entry(mac)
            .or_default()
            .push_back(error);
    }

    /// Makes the next read of `mac` fail with `error`.
    pub fn fail_next_read(&self, mac: MacAddress, error: LinkError) {
        self.inner
            .lock()
            .read_failures
            .entry(mac)
            .or_default()
            .push_back(error);
    }

    /// Makes the next write to `mac` fail with `error`.
    pub fn fail_next_write(&self, mac: MacAddress, error: LinkError) {
        self.inner
            .lock()
            .write_failures
            .entry(mac)
            .or_default()
            .push_back(error);
    }

    /// Makes the next scan fail with `error`.
    pub fn fail_next_discover(&self, error: LinkError) {
        self.inner.lock().discover_failure = Some(error);
    }

    /// Delays every read by `delay`.
    pub fn set_read_delay(&self, delay: Option<Duration>) {
        self.inner.lock().read_delay = delay;
    }

    /// Returns the call counters.
    #[must_use]
    pub fn calls(&self) -> LinkCalls {
        self.inner.lock().calls
    }

    fn check_session(inner: &Inner, session: &MemorySession) -> Result<(), LinkError> {
        match inner.devices.get(&session.mac) {
            Some(device) if device.generation == session.generation => Ok(()),
            Some(_) => Err(LinkError::NotBound),
            None => Err(LinkError::Timeout),
        }
    }

    fn take_failure(
        failures: &mut HashMap<MacAddress, VecDeque<LinkError>>,
        mac: MacAddress,
    ) -> Option<LinkError> {
        failures.get_mut(&mac).and_then(VecDeque::pop_front)
    }
}

impl DeviceLink for MemoryLink {
    type Session = MemorySession;

    async fn discover(&self, _timeout: Duration) -> Result<Vec<DeviceInfo>, LinkError> {
        let mut inner = self.inner.lock();
        inner.calls.discover += 1;
        if let Some(error) = inner.discover_failure.take() {
            return Err(error);
        }
        Ok(inner.devices.values().map(|d| d.info.clone()).collect())
    }

    async fn bind(&self, info: &DeviceInfo) -> Result<MemorySession, LinkError> {
        let mut inner = self.inner.lock();
        inner.calls.bind += 1;
        if let Some(error) = Self::take_failure(&mut inner.bind_failures, info.mac) {
            return Err(error);
        }
        let device = inner.devices.get(&info.mac).ok_or(LinkError::Timeout)?;
        Ok(MemorySession {
            mac: info.mac,
            generation: device.generation,
        })
    }

    async fn read_state(&self, session: &MemorySession) -> Result<RawState, LinkError> {
        let delay = {
            let mut inner = self.inner.lock();
            inner.calls.read += 1;
            inner.read_delay
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut inner = self.inner.lock();
        if let Some(error) = Self::take_failure(&mut inner.read_failures, session.mac) {
            return Err(error);
        }
        Self::check_session(&inner, session)?;
        inner
            .devices
            .get(&session.mac)
            .map(|d| d.state.clone())
            .ok_or(LinkError::Timeout)
    }

    async fn write_state(&self, session: &MemorySession, state: &RawState) -> Result<(), LinkError> {
        let mut inner = self.inner.lock();
        inner.calls.write += 1;
        if let Some(error) = Self::take_failure(&mut inner.write_failures, session.mac) {
            return Err(error);
        }
        Self::check_session(&inner, session)?;
        let device = inner
            .devices
            .get_mut(&session.mac)
            .ok_or(LinkError::Timeout)?;
        for (key, value) in state.iter() {
            device.state.set(key, value);
        }
        device.writes.push(state.clone());
        Ok(())
    }
}
