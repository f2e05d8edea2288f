// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! State shared between the manager and its polling tasks.

use crate::event::Broadcaster;
use crate::link::DeviceLink;

use super::registry::Registry;
use super::sync_config::SyncConfig;

/// Everything a polling task needs.
///
/// Polling tasks hold this through an `Arc`; the task bookkeeping lives
/// outside it so a dropped manager does not keep its own tasks alive.
pub(crate) struct Shared<L: DeviceLink> {
    pub link: L,
    pub registry: Registry<L::Session>,
    pub broadcaster: Broadcaster,
    pub config: SyncConfig,
}

impl<L: DeviceLink> Shared<L> {
    pub fn new(link: L, config: SyncConfig) -> Self {
        Self {
            link,
            registry: Registry::new(),
            broadcaster: Broadcaster::new(),
            config,
        }
    }
}
