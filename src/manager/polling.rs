// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-device polling loops.
//!
//! Each registered device gets one task that reads its raw state, rebuilds
//! the view, diffs it against the cached one and broadcasts a `report` when
//! something changed. Loops are cancelled through a `watch` channel and
//! always awaited before a new loop for the same device is spawned.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::error::{Error, Result};
use crate::event::DeviceEvent;
use crate::link::DeviceLink;
use crate::types::MacAddress;

use super::registry::DeviceSlot;
use super::shared::Shared;

/// A running polling loop.
struct PollTask {
    cancel: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl PollTask {
    /// Signals the loop and waits for it to finish.
    async fn cancel(self, mac: MacAddress) {
        // The loop may already have exited on its own.
        let _ = self.cancel.send(true);
        if let Err(e) = self.handle.await
            && e.is_panic()
        {
            tracing::error!(%mac, "Polling task panicked");
        }
    }
}

/// Owner of every polling task.
///
/// Dropping the scheduler drops the cancel senders, which stops every loop
/// at its next suspension point.
#[derive(Default)]
pub(crate) struct PollingScheduler {
    tasks: Mutex<HashMap<MacAddress, PollTask>>,
}

impl PollingScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts polling a registered device.
    ///
    /// A loop already running for the same address is cancelled and awaited
    /// first.
    pub async fn start<L: DeviceLink>(&self, shared: Arc<Shared<L>>, slot: Arc<DeviceSlot<L::Session>>) {
        let mac = slot.mac();
        self.stop(mac).await;

        let (cancel, cancelled) = watch::channel(false);
        let handle = tokio::spawn(poll_loop(shared, slot, cancelled));

        let previous = self.tasks.lock().insert(mac, PollTask { cancel, handle });
        if let Some(previous) = previous {
            previous.cancel(mac).await;
        }
    }

    /// Cancels the loop of one device and waits for it.
    ///
    /// Returns `true` if a loop was running.
    pub async fn stop(&self, mac: MacAddress) -> bool {
        let task = self.tasks.lock().remove(&mac);
        match task {
            Some(task) => {
                task.cancel(mac).await;
                true
            }
            None => false,
        }
    }

    /// Cancels every loop and waits for all of them.
    pub async fn stop_all(&self) {
        let tasks: Vec<_> = self.tasks.lock().drain().collect();
        if !tasks.is_empty() {
            tracing::debug!(count = tasks.len(), "Stopping polling tasks");
        }
        for (mac, task) in tasks {
            task.cancel(mac).await;
        }
    }

    pub fn is_running(&self, mac: MacAddress) -> bool {
        self.tasks
            .lock()
            .get(&mac)
            .is_some_and(|task| !task.handle.is_finished())
    }

    pub fn running_count(&self) -> usize {
        self.tasks
            .lock()
            .values()
            .filter(|task| !task.handle.is_finished())
            .count()
    }
}

/// Body of one polling task.
///
/// A device that does not answer is read again after the normal interval;
/// any other failure waits the error backoff. Exits when cancelled or when its registry entry is gone or superseded.
async fn poll_loop<L: DeviceLink>(
    shared: Arc<Shared<L>>,
    slot: Arc<DeviceSlot<L::Session>>,
    mut cancelled: watch::Receiver<bool>,
) {
    let mac = slot.mac();
    let interval = shared.config.polling_interval;
    let backoff = shared.config.error_backoff();
    tracing::debug!(%mac, ?interval, "Polling started");

    loop {
        if !shared.registry.is_current(&slot) {
            tracing::debug!(%mac, "Device no longer registered, polling stopped");
            return;
        }

        let delay = tokio::select! {
            biased;
            _ = cancelled.changed() => break,
            result = poll_once(&shared, &slot) => match result {
                Ok(()) => interval,
                Err(Error::Link(e)) if e.is_communication() => {
                    tracing::warn!(%mac, error = %e, retry_in = ?interval, "Device did not answer");
                    interval
                }
                Err(e) => {
                    tracing::warn!(%mac, error = %e, retry_in = ?backoff, "Polling failed");
                    backoff
                }
            },
        };

        tokio::select! {
            biased;
            _ = cancelled.changed() => break,
            () = tokio::time::sleep(delay) => {}
        }
    }

    tracing::debug!(%mac, "Polling cancelled");
}

/// Reads the device once and reports what changed.
async fn poll_once<L: DeviceLink>(shared: &Shared<L>, slot: &Arc<DeviceSlot<L::Session>>) -> Result<()> {
    let mut handle = slot.handle.lock().await;
    let raw = shared.link.read_state(&handle.session).await?;
    handle.attributes = raw;
    let view = handle.view()?;

    // A superseded entry must not report.
    if !shared.registry.is_current(slot) {
        return Ok(());
    }

    let mac = slot.mac();
    let Some(changes) = shared.registry.update_view(mac, view) else {
        return Ok(());
    };
    drop(handle);

    if !changes.is_empty() {
        tracing::info!(
            %mac,
            fields = ?changes.fields().collect::<Vec<_>>(),
            "Device state changed"
        );
        shared
            .broadcaster
            .broadcast(&DeviceEvent::report(mac, changes));
    }
    Ok(())
}
