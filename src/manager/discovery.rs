// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Full (re)discovery passes.

use std::sync::Arc;

use crate::error::{LinkError, Result};
use crate::link::{DeviceInfo, DeviceLink};
use crate::state::DeviceView;
use crate::types::MacAddress;

use super::polling::PollingScheduler;
use super::registry::DeviceHandle;
use super::shared::Shared;

/// Replaces the registry with the devices currently on the network.
///
/// Every polling loop is cancelled and awaited before the scan. Devices
/// that fail to bind or to answer their first read are skipped. Returns the
/// addresses that ended up registered, in scan order; a failed scan leaves
/// the registry empty and returns nothing.
///
/// The link is given the discovery timeout; the engine stops waiting for it
/// at twice that.
pub(crate) async fn discover<L: DeviceLink>(
    shared: &Arc<Shared<L>>,
    polling: &PollingScheduler,
) -> Vec<MacAddress> {
    let timeout = shared.config.discovery_timeout;
    tracing::info!(?timeout, "Discovering devices");

    polling.stop_all().await;
    shared.registry.remove_all();

    let scan = tokio::time::timeout(timeout.saturating_mul(2), shared.link.discover(timeout))
        .await
        .map_err(|_| LinkError::Timeout)
        .and_then(|found| found);
    let found = match scan {
        Ok(found) => found,
        Err(e) => {
            tracing::error!(error = %e, "Discovery scan failed");
            return Vec::new();
        }
    };
    tracing::debug!(count = found.len(), "Scan finished");

    let mut registered = Vec::with_capacity(found.len());
    for info in found {
        let mac = info.mac;
        if shared.registry.contains(mac) {
            tracing::debug!(%mac, "Device answered twice, ignoring duplicate");
            continue;
        }

        match bind_device(shared, info).await {
            Ok((handle, view)) => {
                tracing::info!(%mac, ip = %handle.info.ip, name = %handle.info.name, "Device bound");
                let slot = shared.registry.register(handle, view);
                polling.start(Arc::clone(shared), slot).await;
                registered.push(mac);
            }
            Err(e) => {
                tracing::warn!(%mac, error = %e, "Skipping device");
            }
        }
    }

    tracing::info!(count = registered.len(), "Discovery finished");
    registered
}

/// Binds one device and seeds its view from a first read.
async fn bind_device<L: DeviceLink>(
    shared: &Shared<L>,
    info: DeviceInfo,
) -> Result<(DeviceHandle<L::Session>, DeviceView)> {
    let session = shared.link.bind(&info).await?;
    tokio::time::sleep(shared.config.bind_settle_delay).await;
    let attributes = shared.link.read_state(&session).await?;

    let handle = DeviceHandle::new(info, session, attributes);
    let view = handle.view()?;
    Ok((handle, view))
}
