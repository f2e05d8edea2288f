// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Integration tests for the synchronization engine using the in-memory link.

use std::net::Ipv4Addr;
use std::time::Duration;

use climate_sync::link::{DeviceInfo, MemoryLink, RawState, attr};
use climate_sync::manager::{ClimateManager, SyncConfig};
use climate_sync::state::DeviceUpdate;
use climate_sync::types::{MacAddress, TargetTemperature};
use climate_sync::vocabulary::Mode;
use climate_sync::{Error, ErrorClass, LinkError};
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tokio::time::sleep;

fn bedroom_mac() -> MacAddress {
    "aabbccddeeff".parse().unwrap()
}

fn office_mac() -> MacAddress {
    "001122334455".parse().unwrap()
}

/// Power on, cooling to 24, auto fan, turbo off, light on.
fn cooling_at_24() -> RawState {
    RawState::new()
        .with(attr::POWER, 1)
        .with(attr::MODE, 1)
        .with(attr::TARGET_TEMPERATURE, 24)
        .with(attr::CURRENT_TEMPERATURE, 65)
        .with(attr::FAN_SPEED, 0)
        .with(attr::HORIZONTAL_SWING, 0)
        .with(attr::VERTICAL_SWING, 0)
        .with(attr::TURBO, 0)
        .with(attr::LIGHT, 1)
}

fn network() -> MemoryLink {
    let link = MemoryLink::new();
    link.add_device(
        DeviceInfo::new(bedroom_mac(), Ipv4Addr::new(192, 168, 1, 40), "bedroom"),
        cooling_at_24(),
    );
    link
}

async fn started(link: &MemoryLink) -> ClimateManager<MemoryLink> {
    let manager = ClimateManager::new(link.clone(), SyncConfig::default());
    manager.start().await;
    manager
}

fn drain(rx: &mut mpsc::UnboundedReceiver<String>) -> Vec<Value> {
    let mut events = Vec::new();
    while let Ok(text) = rx.try_recv() {
        events.push(serde_json::from_str(&text).unwrap());
    }
    events
}

fn reports(events: &[Value]) -> Vec<&Value> {
    events.iter().filter(|e| e["type"] == "report").collect()
}

fn to_26() -> DeviceUpdate {
    DeviceUpdate::new().with_target_temperature(TargetTemperature::new(26).unwrap())
}

// ============================================================================
// Polling
// ============================================================================

mod polling {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn mode_change_is_reported_once() {
        let link = network();
        let manager = started(&link).await;
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _session = manager.connect(tx);

        link.set_attr(bedroom_mac(), attr::MODE, 4);
        sleep(Duration::from_secs(7)).await;

        let events = drain(&mut rx);
        assert_eq!(events[0]["type"], "list");
        assert_eq!(
            reports(&events),
            vec![&json!({
                "type": "report",
                "mac": "aabbccddeeff",
                "changes": {"mode": {"old": "cool", "new": "heat"}}
            })]
        );
        assert_eq!(manager.get_device(bedroom_mac()).unwrap().mode, Mode::Heat);

        manager.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn vanished_feature_is_a_change() {
        let link = network();
        let manager = started(&link).await;
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _session = manager.connect(tx);

        link.clear_attr(bedroom_mac(), attr::TURBO);
        sleep(Duration::from_secs(3)).await;

        let events = drain(&mut rx);
        assert_eq!(
            reports(&events)[0]["changes"],
            json!({"turbo": {"old": false, "new": null}})
        );

        manager.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn read_failure_is_retried_after_interval() {
        let link = network();
        let manager = started(&link).await;
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _session = manager.connect(tx);

        link.fail_next_read(bedroom_mac(), LinkError::Timeout);
        link.set_attr(bedroom_mac(), attr::MODE, 4);

        // The first tick times out; the next one, one interval later, reports.
        sleep(Duration::from_secs(1)).await;
        assert!(reports(&drain(&mut rx)).is_empty());

        sleep(Duration::from_millis(1500)).await;
        assert_eq!(reports(&drain(&mut rx)).len(), 1);
        assert!(manager.is_polling(bedroom_mac()));

        manager.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn undecodable_state_is_backed_off() {
        let link = network();
        let manager = started(&link).await;
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _session = manager.connect(tx);

        link.set_attr(bedroom_mac(), attr::MODE, 99);
        sleep(Duration::from_millis(100)).await;
        link.set_attr(bedroom_mac(), attr::MODE, 4);

        // Mode 99 fails the first tick; the retry comes twice the interval later.
        sleep(Duration::from_secs(3)).await;
        assert!(reports(&drain(&mut rx)).is_empty());

        sleep(Duration::from_secs(1)).await;
        assert_eq!(reports(&drain(&mut rx)).len(), 1);
        assert!(manager.is_polling(bedroom_mac()));

        manager.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn unreachable_device_keeps_its_last_view() {
        let link = network();
        let manager = started(&link).await;
        let before = manager.get_device(bedroom_mac()).unwrap();

        link.remove_device(bedroom_mac());
        sleep(Duration::from_secs(20)).await;

        assert!(manager.is_polling(bedroom_mac()));
        assert_eq!(manager.get_device(bedroom_mac()).unwrap(), before);

        manager.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_stops_reading() {
        let link = network();
        let manager = started(&link).await;
        sleep(Duration::from_secs(5)).await;

        manager.shutdown().await;
        let reads = link.calls().read;
        sleep(Duration::from_secs(20)).await;

        assert_eq!(link.calls().read, reads);
        assert!(!manager.is_polling(bedroom_mac()));
    }
}

// ============================================================================
// Discovery
// ============================================================================

mod discovery {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn rediscovery_never_duplicates_reports() {
        let link = network();
        let manager = started(&link).await;
        manager.discover_devices().await;
        manager.discover_devices().await;

        let (tx, mut rx) = mpsc::unbounded_channel();
        let _session = manager.connect(tx);

        link.set_attr(bedroom_mac(), attr::MODE, 4);
        sleep(Duration::from_secs(10)).await;

        assert_eq!(reports(&drain(&mut rx)).len(), 1);
        assert_eq!(manager.device_count(), 1);

        manager.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn one_bad_device_does_not_abort_the_pass() {
        let link = network();
        link.add_device(
            DeviceInfo::new(office_mac(), Ipv4Addr::new(192, 168, 1, 41), "office"),
            cooling_at_24(),
        );
        link.fail_next_bind(office_mac(), LinkError::Timeout);

        let manager = ClimateManager::new(link.clone(), SyncConfig::default());
        let macs = manager.start().await;

        assert_eq!(macs, vec![bedroom_mac()]);
        assert!(manager.get_device(office_mac()).is_err());

        // The next pass picks it up.
        let macs = manager.discover_devices().await;
        assert_eq!(macs.len(), 2);

        manager.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn failed_scan_leaves_no_devices() {
        let link = network();
        let manager = started(&link).await;
        assert_eq!(manager.device_count(), 1);

        link.fail_next_discover(LinkError::Timeout);
        assert!(manager.discover_devices().await.is_empty());
        assert_eq!(manager.device_count(), 0);
        assert!(!manager.is_polling(bedroom_mac()));

        // The next scan recovers.
        assert_eq!(manager.discover_devices().await, vec![bedroom_mac()]);

        manager.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn views_carry_discovery_details() {
        let link = network();
        let manager = started(&link).await;

        let view = serde_json::to_value(manager.get_device(bedroom_mac()).unwrap()).unwrap();
        assert_eq!(view["mac"], "aabbccddeeff");
        assert_eq!(view["ip"], "192.168.1.40");
        assert_eq!(view["current_temperature"], 25);
        assert_eq!(view["target_humidity"], Value::Null);
        assert_eq!(view["quiet"], Value::Null);
        assert_eq!(view["light"], true);

        assert_eq!(
            serde_json::to_value(manager.info()).unwrap()["devices"],
            json!(["aabbccddeeff"])
        );

        manager.shutdown().await;
    }
}

// ============================================================================
// Commands
// ============================================================================

mod commands {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn modified_then_unmodified_then_reported_by_poll() {
        let link = network();
        let manager = started(&link).await;
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _session = manager.connect(tx);
        drain(&mut rx);

        assert!(manager.update_device(bedroom_mac(), &to_26()).await.unwrap());
        assert!(!manager.update_device(bedroom_mac(), &to_26()).await.unwrap());

        // Commands do not broadcast themselves.
        assert!(drain(&mut rx).is_empty());

        sleep(Duration::from_secs(3)).await;
        let events = drain(&mut rx);
        assert_eq!(
            reports(&events)[0]["changes"],
            json!({"target_temperature": {"old": 24, "new": 26}})
        );

        manager.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_device_makes_no_link_calls() {
        let link = network();
        let manager = started(&link).await;
        manager.shutdown().await;
        let calls = link.calls();

        let err = manager
            .update_device(office_mac(), &to_26())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::DeviceNotFound(_)));
        assert_eq!(link.calls(), calls);
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_mode_is_rejected_without_writing() {
        let link = network();
        let manager = started(&link).await;

        let update = to_26().with_mode(Mode::Unknown);
        let err = manager.update_device(bedroom_mac(), &update).await.unwrap_err();

        assert_eq!(err.class(), ErrorClass::Validation);
        assert!(link.writes(bedroom_mac()).is_empty());
        assert_eq!(
            link.state(bedroom_mac()).unwrap().get(attr::TARGET_TEMPERATURE),
            Some(24)
        );

        manager.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn lost_binding_is_recovered_once() {
        let link = network();
        let manager = started(&link).await;
        manager.shutdown().await;
        link.unbind(bedroom_mac());

        assert!(manager.update_device(bedroom_mac(), &to_26()).await.unwrap());
        assert_eq!(
            link.state(bedroom_mac()).unwrap().get(attr::TARGET_TEMPERATURE),
            Some(26)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn unreachable_device_is_unavailable() {
        let link = network();
        let manager = started(&link).await;
        manager.shutdown().await;
        link.fail_next_write(bedroom_mac(), LinkError::Timeout);
        link.fail_next_bind(bedroom_mac(), LinkError::Timeout);

        let err = manager
            .update_device(bedroom_mac(), &to_26())
            .await
            .unwrap_err();

        assert_eq!(err.class(), ErrorClass::Unavailable);
        assert_eq!(err.class().http_status(), 503);
        assert_eq!(link.calls().write, 1);
    }
}

// ============================================================================
// Subscribers
// ============================================================================

mod subscribers {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn broken_subscriber_is_pruned() {
        let link = network();
        let manager = started(&link).await;

        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        let (tx3, rx3) = mpsc::unbounded_channel::<String>();
        let _s1 = manager.connect(tx1);
        let _s2 = manager.connect(tx2);
        let s3 = manager.connect(tx3);
        assert_eq!(manager.subscriber_count(), 3);

        drop(rx3);
        link.set_attr(bedroom_mac(), attr::POWER, 0);
        sleep(Duration::from_secs(3)).await;

        assert_eq!(reports(&drain(&mut rx1)).len(), 1);
        assert_eq!(reports(&drain(&mut rx2)).len(), 1);
        assert!(!s3.is_registered());
        assert_eq!(manager.subscriber_count(), 2);

        manager.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn lagging_subscriber_stays_registered() {
        let link = network();
        let manager = started(&link).await;

        let (tx, mut rx) = mpsc::channel::<String>(1);
        let session = manager.connect(tx);

        // The list fills the buffer; this report is dropped.
        link.set_attr(bedroom_mac(), attr::MODE, 4);
        sleep(Duration::from_secs(3)).await;
        assert!(session.is_registered());
        assert!(rx.recv().await.unwrap().contains(r#""type":"list""#));

        link.set_attr(bedroom_mac(), attr::MODE, 2);
        sleep(Duration::from_secs(3)).await;
        let report: Value = serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
        assert_eq!(report["changes"]["mode"], json!({"old": "heat", "new": "dry"}));

        manager.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn session_update_round_trip() {
        let link = network();
        let manager = started(&link).await;
        let (tx, mut rx) = mpsc::unbounded_channel();
        let session = manager.connect(tx);
        drain(&mut rx);

        let message = json!({
            "type": "update",
            "mac": "aabbccddeeff",
            "data": {"power": false, "xfan": true}
        })
        .to_string();

        assert_eq!(session.handle_message(&message).await, None);
        let reply = session.handle_message(&message).await.unwrap();
        assert_eq!(
            serde_json::to_value(&reply).unwrap(),
            json!({
                "type": "not_changed",
                "mac": "aabbccddeeff",
                "message": "No changes made to the device by last command"
            })
        );

        sleep(Duration::from_secs(3)).await;
        let events = drain(&mut rx);
        assert_eq!(
            reports(&events)[0]["changes"],
            json!({"power": {"old": true, "new": false}})
        );

        drop(session);
        assert_eq!(manager.subscriber_count(), 0);
        manager.shutdown().await;
    }
}
