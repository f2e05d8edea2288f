// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The device link seam.
//!
//! A [`DeviceLink`] owns everything below the synchronization engine:
//! network scans, the bind handshake, encryption and the wire protocol.
//! The engine only ever asks it to discover devices, bind one, read its raw
//! attributes and write them back.
//!
//! - [`MemoryLink`]: in-memory link with failure injection, for tests and
//!   simulations

pub mod attr;
mod memory;

pub use memory::{LinkCalls, MemoryLink, MemorySession};

use std::collections::BTreeMap;
use std::future::Future;
use std::net::Ipv4Addr;
use std::time::Duration;

use crate::error::LinkError;
use crate::types::MacAddress;

/// A device found by a network scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Hardware address of the device.
    pub mac: MacAddress,
    /// IPv4 address the device answered from.
    pub ip: Ipv4Addr,
    /// Name the device advertises.
    pub name: String,
}

impl DeviceInfo {
    /// Creates device info.
    #[must_use]
    pub fn new(mac: MacAddress, ip: Ipv4Addr, name: impl Into<String>) -> Self {
        Self {
            mac,
            ip,
            name: name.into(),
        }
    }
}

/// The raw attribute set of a device, keyed by native attribute name.
///
/// Values are the integer codes the device uses on the wire. See [`attr`]
/// for the keys the engine understands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawState(BTreeMap<String, i64>);

impl RawState {
    /// Creates an empty attribute set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the raw value of an attribute.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<i64> {
        self.0.get(key).copied()
    }

    /// Returns a `0`/`1` attribute as a boolean.
    #[must_use]
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).map(|v| v != 0)
    }

    /// Returns `true` if the device reports this attribute.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Sets an attribute.
    pub fn set(&mut self, key: impl Into<String>, value: i64) {
        self.0.insert(key.into(), value);
    }

    /// Sets a boolean attribute as `0`/`1`.
    pub fn set_bool(&mut self, key: impl Into<String>, value: bool) {
        self.set(key, i64::from(value));
    }

    /// Builder-style [`set`](Self::set).
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: i64) -> Self {
        self.set(key, value);
        self
    }

    /// Returns the number of attributes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if no attribute is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over `(key, value)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl<K: Into<String>> FromIterator<(K, i64)> for RawState {
    fn from_iter<I: IntoIterator<Item = (K, i64)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// Access to devices over their native protocol.
///
/// Every operation may fail with [`LinkError::NotBound`] or
/// [`LinkError::Timeout`]. Implementations bound their own I/O; the engine
/// adds no timeouts except around [`discover`](Self::discover).
pub trait DeviceLink: Send + Sync + 'static {
    /// Bound connection to one device. Replaced wholesale on rebind.
    type Session: Send + Sync + 'static;

    /// Scans the network for devices, waiting at most `timeout` for answers.
    fn discover(
        &self,
        timeout: Duration,
    ) -> impl Future<Output = Result<Vec<DeviceInfo>, LinkError>> + Send;

    /// Performs the bind handshake with a device.
    fn bind(
        &self,
        info: &DeviceInfo,
    ) -> impl Future<Output = Result<Self::Session, LinkError>> + Send;

    /// Reads every attribute the device reports.
    fn read_state(
        &self,
        session: &Self::Session,
    ) -> impl Future<Output = Result<RawState, LinkError>> + Send;

    /// Writes an attribute set to the device.
    fn write_state(
        &self,
        session: &Self::Session,
        state: &RawState,
    ) -> impl Future<Output = Result<(), LinkError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_state_accessors() {
        let mut state = RawState::new().with(attr::POWER, 1).with(attr::MODE, 4);
        assert_eq!(state.get(attr::MODE), Some(4));
        assert_eq!(state.get_bool(attr::POWER), Some(true));
        assert_eq!(state.get(attr::TURBO), None);
        assert!(!state.contains(attr::TURBO));

        state.set_bool(attr::TURBO, false);
        assert_eq!(state.get_bool(attr::TURBO), Some(false));
        assert_eq!(state.len(), 3);
    }

    #[test]
    fn raw_state_from_iter() {
        let state: RawState = [(attr::POWER, 0), (attr::TARGET_TEMPERATURE, 22)]
            .into_iter()
            .collect();
        let keys: Vec<_> = state.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![attr::POWER, attr::TARGET_TEMPERATURE]);
    }
}
