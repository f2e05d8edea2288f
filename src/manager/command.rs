// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Applying update requests to devices.

use crate::error::{Error, LinkError, Result, ValueError};
use crate::link::{DeviceLink, RawState, attr};
use crate::state::DeviceUpdate;
use crate::types::MacAddress;
use crate::vocabulary::Vocabulary;

use super::registry::DeviceHandle;
use super::shared::Shared;

/// Applies an update to one device and reports whether anything changed.
///
/// Every field of the update is staged on a copy of the device's attributes
/// first, so a value that cannot be translated leaves the device untouched.
/// The full staged attribute set is then pushed even when nothing changed.
/// A communication failure gets exactly one rebind and one retried push.
///
/// The cached view is not updated and nothing is broadcast; the next poll
/// observes the change.
pub(crate) async fn apply<L: DeviceLink>(
    shared: &Shared<L>,
    mac: MacAddress,
    update: &DeviceUpdate,
) -> Result<bool> {
    let slot = shared
        .registry
        .slot(mac)
        .ok_or(Error::DeviceNotFound(mac))?;
    let mut handle = slot.handle.lock().await;

    let mut staged = Staging::new(handle.attributes.clone());
    staged.apply(update).map_err(Error::InvalidCommandValue)?;
    let Staging {
        attributes,
        modified,
    } = staged;

    push(&shared.link, &mut handle, &attributes).await?;
    handle.attributes = attributes;

    tracing::debug!(%mac, modified, "Update applied");
    Ok(modified)
}

/// Pushes attributes, rebinding once on a communication failure.
///
/// Any failure of the rebind or of the retried push is a
/// `DeviceCommunication` error.
async fn push<L: DeviceLink>(
    link: &L,
    handle: &mut DeviceHandle<L::Session>,
    attributes: &RawState,
) -> Result<()> {
    let mac = handle.info.mac;
    match link.write_state(&handle.session, attributes).await {
        Ok(()) => Ok(()),
        Err(e) if e.is_communication() => {
            tracing::warn!(%mac, error = %e, "Push failed, rebinding");
            retry(link, handle, attributes).await.map_err(|e| {
                tracing::error!(%mac, error = %e, "Push failed after rebind");
                Error::DeviceCommunication(e)
            })
        }
        Err(e) => {
            tracing::error!(%mac, error = %e, "Push failed");
            Err(Error::InternalCommand(e.to_string()))
        }
    }
}

async fn retry<L: DeviceLink>(
    link: &L,
    handle: &mut DeviceHandle<L::Session>,
    attributes: &RawState,
) -> std::result::Result<(), LinkError> {
    handle.session = link.bind(&handle.info).await?;
    link.write_state(&handle.session, attributes).await
}

/// Attributes being staged, and whether any of them differ from before.
struct Staging {
    attributes: RawState,
    modified: bool,
}

impl Staging {
    fn new(attributes: RawState) -> Self {
        Self {
            attributes,
            modified: false,
        }
    }

    fn set(&mut self, key: &str, value: i64) {
        if self.attributes.get(key) != Some(value) {
            self.modified = true;
            self.attributes.set(key, value);
        }
    }

    fn apply(&mut self, update: &DeviceUpdate) -> std::result::Result<(), ValueError> {
        if let Some(power) = update.power {
            self.set(attr::POWER, i64::from(power));
        }
        if let Some(mode) = update.mode {
            self.set(attr::MODE, mode.to_native()?.code());
        }
        if let Some(temperature) = update.target_temperature {
            self.set(attr::TARGET_TEMPERATURE, i64::from(temperature.value()));
        }
        if let Some(humidity) = update.target_humidity {
            self.set(attr::TARGET_HUMIDITY, i64::from(humidity.value()));
        }
        if let Some(speed) = update.fan_speed {
            self.set(attr::FAN_SPEED, speed.to_native()?.code());
        }
        if let Some(swing) = update.horizontal_swing {
            self.set(attr::HORIZONTAL_SWING, swing.to_native()?.code());
        }
        if let Some(swing) = update.vertical_swing {
            self.set(attr::VERTICAL_SWING, swing.to_native()?.code());
        }
        for (feature, on) in update.features() {
            self.set(feature.key(), i64::from(on));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::capabilities::Feature;
    use crate::link::{MemoryLink, MemorySession};
    use crate::manager::SyncConfig;
    use crate::manager::registry::DeviceSlot;
    use crate::state::fixtures::{info, raw};
    use crate::types::TargetTemperature;
    use crate::vocabulary::{FanSpeed, Mode};

    async fn setup() -> (MemoryLink, Shared<MemoryLink>, Arc<DeviceSlot<MemorySession>>) {
        let link = MemoryLink::new();
        link.add_device(info(), raw());
        let shared = Shared::new(link.clone(), SyncConfig::default());

        let session = shared.link.bind(&info()).await.unwrap();
        let handle = DeviceHandle::new(info(), session, raw());
        let view = handle.view().unwrap();
        let slot = shared.registry.register(handle, view);
        (link, shared, slot)
    }

    fn to_26() -> DeviceUpdate {
        DeviceUpdate::new().with_target_temperature(TargetTemperature::new(26).unwrap())
    }

    #[tokio::test]
    async fn modified_then_not_modified() {
        let (link, shared, _slot) = setup().await;

        assert!(apply(&shared, info().mac, &to_26()).await.unwrap());
        assert!(!apply(&shared, info().mac, &to_26()).await.unwrap());

        // Both calls push the full attribute set.
        assert_eq!(link.writes(info().mac).len(), 2);
        assert_eq!(
            link.state(info().mac).unwrap().get(attr::TARGET_TEMPERATURE),
            Some(26)
        );
    }

    #[tokio::test]
    async fn unknown_device_touches_no_link() {
        let (link, shared, _slot) = setup().await;
        let calls = link.calls();
        let other: MacAddress = "001122334455".parse().unwrap();

        let err = apply(&shared, other, &to_26()).await.unwrap_err();

        assert!(matches!(err, Error::DeviceNotFound(mac) if mac == other));
        assert_eq!(link.calls(), calls);
    }

    #[tokio::test]
    async fn untranslatable_value_leaves_device_unmodified() {
        let (link, shared, slot) = setup().await;
        let update = to_26().with_mode(Mode::Unknown);

        let err = apply(&shared, info().mac, &update).await.unwrap_err();

        assert!(matches!(err, Error::InvalidCommandValue(_)));
        assert!(link.writes(info().mac).is_empty());
        assert_eq!(slot.handle.lock().await.attributes, raw());
    }

    #[tokio::test]
    async fn setting_current_values_is_not_a_change() {
        let (_link, shared, _slot) = setup().await;
        let update = DeviceUpdate::new()
            .with_power(true)
            .with_mode(Mode::Cool)
            .with_fan_speed(FanSpeed::Auto)
            .with_feature(Feature::Light, true);

        assert!(!apply(&shared, info().mac, &update).await.unwrap());
    }

    #[tokio::test]
    async fn rebinds_once_on_lost_binding() {
        let (link, shared, _slot) = setup().await;
        link.unbind(info().mac);
        let binds = link.calls().bind;

        assert!(apply(&shared, info().mac, &to_26()).await.unwrap());
        assert_eq!(link.calls().bind, binds + 1);
        assert_eq!(link.writes(info().mac).len(), 1);
    }

    #[tokio::test]
    async fn second_failure_is_communication_error() {
        let (link, shared, slot) = setup().await;
        link.fail_next_write(info().mac, LinkError::Timeout);
        link.fail_next_write(info().mac, LinkError::Timeout);

        let err = apply(&shared, info().mac, &to_26()).await.unwrap_err();

        assert!(matches!(err, Error::DeviceCommunication(LinkError::Timeout)));
        assert_eq!(link.calls().write, 2);
        // Staged values are only kept once pushed.
        assert_eq!(slot.handle.lock().await.attributes, raw());
    }

    #[tokio::test]
    async fn failed_rebind_is_communication_error() {
        let (link, shared, _slot) = setup().await;
        link.fail_next_write(info().mac, LinkError::NotBound);
        link.fail_next_bind(info().mac, LinkError::Other("refused".into()));

        let err = apply(&shared, info().mac, &to_26()).await.unwrap_err();

        assert!(matches!(err, Error::DeviceCommunication(LinkError::Other(_))));
        assert_eq!(err.class(), crate::ErrorClass::Unavailable);
        assert_eq!(link.calls().write, 1);
    }

    #[tokio::test]
    async fn other_link_failure_is_internal() {
        let (link, shared, _slot) = setup().await;
        link.fail_next_write(info().mac, LinkError::Other("checksum".into()));

        let err = apply(&shared, info().mac, &to_26()).await.unwrap_err();

        assert!(matches!(err, Error::InternalCommand(_)));
        assert_eq!(link.calls().write, 1);
    }
}
