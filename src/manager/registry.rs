// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Registry of bound devices.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::Mutex;

use crate::Capabilities;
use crate::link::{DeviceInfo, RawState};
use crate::state::{ChangeSet, DeviceView, diff};
use crate::types::MacAddress;

/// A bound device: the link session plus what the engine knows about it.
pub(crate) struct DeviceHandle<S> {
    /// Discovery information.
    pub info: DeviceInfo,
    /// Link session. Replaced wholesale on rebind.
    pub session: S,
    /// Capabilities detected at bind time.
    pub capabilities: Capabilities,
    /// Last attributes read from the device, with staged command values.
    pub attributes: RawState,
}

impl<S> DeviceHandle<S> {
    /// Creates a handle from a fresh bind and its first read.
    pub fn new(info: DeviceInfo, session: S, attributes: RawState) -> Self {
        let capabilities = Capabilities::detect(&attributes);
        Self {
            info,
            session,
            capabilities,
            attributes,
        }
    }

    /// Builds the exposed view of the current attributes.
    pub fn view(&self) -> Result<DeviceView, crate::error::ValueError> {
        DeviceView::from_raw(&self.info, &self.capabilities, &self.attributes)
    }
}

/// One registry entry.
///
/// `handle` is the exclusive-use lock for device I/O: a poll and a command
/// for the same device never interleave. `view` is kept apart so readers
/// never wait on device I/O and always see a complete view.
pub(crate) struct DeviceSlot<S> {
    mac: MacAddress,
    pub handle: Mutex<DeviceHandle<S>>,
    view: RwLock<DeviceView>,
}

impl<S> DeviceSlot<S> {
    pub fn mac(&self) -> MacAddress {
        self.mac
    }

    /// Returns a copy of the cached view.
    pub fn view(&self) -> DeviceView {
        self.view.read().clone()
    }

    /// Replaces the cached view if it differs and returns what changed.
    pub fn replace_view(&self, new: DeviceView) -> ChangeSet {
        let mut view = self.view.write();
        let changes = diff(&view, &new);
        if !changes.is_empty() {
            *view = new;
        }
        changes
    }
}

/// The set of currently bound devices, keyed by hardware address.
///
/// All mutation and iteration is internally synchronized.
pub(crate) struct Registry<S> {
    devices: RwLock<BTreeMap<MacAddress, Arc<DeviceSlot<S>>>>,
}

impl<S> Registry<S> {
    pub fn new() -> Self {
        Self {
            devices: RwLock::new(BTreeMap::new()),
        }
    }

    /// Adds a device, replacing any entry with the same address.
    pub fn register(&self, handle: DeviceHandle<S>, view: DeviceView) -> Arc<DeviceSlot<S>> {
        let mac = handle.info.mac;
        let slot = Arc::new(DeviceSlot {
            mac,
            handle: Mutex::new(handle),
            view: RwLock::new(view),
        });
        self.devices.write().insert(mac, Arc::clone(&slot));
        slot
    }

    /// Returns the cached view of a device.
    pub fn get(&self, mac: MacAddress) -> Option<DeviceView> {
        self.devices.read().get(&mac).map(|slot| slot.view())
    }

    /// Returns the entry of a device.
    pub fn slot(&self, mac: MacAddress) -> Option<Arc<DeviceSlot<S>>> {
        self.devices.read().get(&mac).cloned()
    }

    /// Replaces the cached view of a device and returns what changed.
    ///
    /// Returns `None` for an unregistered device, which happens when a poll
    /// outlives the entry it was polling.
    pub fn update_view(&self, mac: MacAddress, view: DeviceView) -> Option<ChangeSet> {
        self.slot(mac).map(|slot| slot.replace_view(view))
    }

    /// Returns `true` if this exact entry is still registered.
    pub fn is_current(&self, slot: &Arc<DeviceSlot<S>>) -> bool {
        self.devices
            .read()
            .get(&slot.mac)
            .is_some_and(|current| Arc::ptr_eq(current, slot))
    }

    /// Returns the cached views of every device, ordered by address.
    pub fn list(&self) -> Vec<DeviceView> {
        self.devices.read().values().map(|slot| slot.view()).collect()
    }

    /// Returns every registered address, in order.
    pub fn identities(&self) -> Vec<MacAddress> {
        self.devices.read().keys().copied().collect()
    }

    pub fn contains(&self, mac: MacAddress) -> bool {
        self.devices.read().contains_key(&mac)
    }

    pub fn len(&self) -> usize {
        self.devices.read().len()
    }

    /// Removes every device.
    pub fn remove_all(&self) {
        self.devices.write().clear();
    }
}

impl<S> fmt::Debug for Registry<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("devices", &self.identities())
            .finish()
    }
}
