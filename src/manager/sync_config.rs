// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Configuration for the climate manager.

use std::time::Duration;

/// Timing and buffering settings for a [`ClimateManager`](super::ClimateManager).
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use climate_sync::manager::SyncConfig;
///
/// let config = SyncConfig::new()
///     .with_polling_interval(Duration::from_secs(5))
///     .with_discovery_timeout(Duration::from_secs(10));
///
/// assert_eq!(config.error_backoff(), Duration::from_secs(10));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Pause between two reads of one device.
    pub polling_interval: Duration,
    /// How long a discovery scan waits for answers.
    pub discovery_timeout: Duration,
    /// Pause between binding a device and its first read.
    pub bind_settle_delay: Duration,
    /// Outbound buffer of each subscriber session, in events.
    pub subscriber_buffer: usize,
}

impl SyncConfig {
    /// Default polling interval.
    pub const DEFAULT_POLLING_INTERVAL: Duration = Duration::from_secs(2);
    /// Default discovery timeout.
    pub const DEFAULT_DISCOVERY_TIMEOUT: Duration = Duration::from_secs(3);
    /// Default settle delay after binding.
    pub const DEFAULT_BIND_SETTLE_DELAY: Duration = Duration::from_secs(1);
    /// Default subscriber buffer.
    pub const DEFAULT_SUBSCRIBER_BUFFER: usize = 64;

    /// Creates a configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the polling interval.
    #[must_use]
    pub fn with_polling_interval(mut self, interval: Duration) -> Self {
        self.polling_interval = interval;
        self
    }

    /// Sets the discovery timeout.
    #[must_use]
    pub fn with_discovery_timeout(mut self, timeout: Duration) -> Self {
        self.discovery_timeout = timeout;
        self
    }

    /// Sets the settle delay after binding.
    #[must_use]
    pub fn with_bind_settle_delay(mut self, delay: Duration) -> Self {
        self.bind_settle_delay = delay;
        self
    }

    /// Sets the subscriber buffer. Clamped to at least one event.
    #[must_use]
    pub fn with_subscriber_buffer(mut self, events: usize) -> Self {
        self.subscriber_buffer = events.max(1);
        self
    }

    /// Delay before retrying a device whose state could not be decoded.
    ///
    /// Always twice the polling interval; the backoff does not grow. A device
    /// that simply did not answer is retried after the normal interval.
    #[must_use]
    pub fn error_backoff(&self) -> Duration {
        self.polling_interval.saturating_mul(2)
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            polling_interval: Self::DEFAULT_POLLING_INTERVAL,
            discovery_timeout: Self::DEFAULT_DISCOVERY_TIMEOUT,
            bind_settle_delay: Self::DEFAULT_BIND_SETTLE_DELAY,
            subscriber_buffer: Self::DEFAULT_SUBSCRIBER_BUFFER,
        }
    }
}
