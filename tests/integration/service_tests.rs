//! AppService start-up and tick orchestration against [`MockDevice`].

use stationlink::app::events::{AppEvent, UpdateEvent};
use stationlink::app::mailbox::RequestMailbox;
use stationlink::app::service::AppService;
use stationlink::config::DeviceConfig;
use stationlink::connection::LinkState;
use stationlink::update_gate::{UpdateErrorKind, UpdateTarget};

use crate::mock_device::{CONFIG_DOC, MockDevice};

const DEVICE_ID: &str = "SL-TEST01";

fn make_app(config: &DeviceConfig, dev: &mut MockDevice) -> AppService {
    let mut app = AppService::new(config, DEVICE_ID);
    app.start(0, dev);
    app
}

/// Configured device that is associated after its first tick.
fn online() -> (AppService, MockDevice, RequestMailbox) {
    let mut dev = MockDevice::with_network("Lab", "pw123456");
    dev.auto_connect = true;
    let mut app = make_app(&DeviceConfig::default(), &mut dev);
    let mailbox = RequestMailbox::new();
    app.tick(10, &mut dev, &mailbox);
    assert_eq!(app.link().state(), LinkState::Connected);
    dev.take_events();
    (app, dev, mailbox)
}

fn uplink_events(dev: &MockDevice) -> Vec<(u32, bool)> {
    dev.events
        .iter()
        .filter_map(|e| match e {
            AppEvent::Uplink { sequence, ok } => Some((*sequence, *ok)),
            _ => None,
        })
        .collect()
}

// ── Start-up ──────────────────────────────────────────────────

#[test]
fn start_without_document_creates_empty_config() {
    let mut dev = MockDevice::new();
    let app = make_app(&DeviceConfig::default(), &mut dev);

    assert_eq!(app.link().state(), LinkState::Unconfigured);
    assert!(dev.connect_requests.is_empty());
    assert_eq!(dev.events, vec![AppEvent::Started { configured: false }]);
    assert_eq!(
        dev.config_doc(),
        Some(serde_json::json!({ "ssid": "", "password": "" }))
    );
}

#[test]
fn start_with_empty_document_stays_unconfigured() {
    let mut dev = MockDevice::with_network("", "");
    let app = make_app(&DeviceConfig::default(), &mut dev);

    assert_eq!(app.link().state(), LinkState::Unconfigured);
    assert!(dev.connect_requests.is_empty());
}

#[test]
fn start_with_stored_network_connects() {
    let mut dev = MockDevice::with_network("Lab", "pw123456");
    let app = make_app(&DeviceConfig::default(), &mut dev);

    assert_eq!(app.link().state(), LinkState::Connecting);
    assert_eq!(dev.connect_requests, vec!["Lab".to_owned()]);
    assert_eq!(
        dev.events,
        vec![
            AppEvent::Started { configured: true },
            AppEvent::LinkChanged {
                from: LinkState::Unconfigured,
                to: LinkState::Connecting,
            },
        ]
    );
}

#[test]
fn start_with_corrupt_document_leaves_it_in_place() {
    let mut dev = MockDevice::new();
    dev.docs.insert(CONFIG_DOC.into(), b"{not json".to_vec());
    let app = make_app(&DeviceConfig::default(), &mut dev);

    assert_eq!(app.link().state(), LinkState::Unconfigured);
    assert_eq!(dev.docs.get(CONFIG_DOC).unwrap(), b"{not json");
    assert_eq!(dev.events, vec![AppEvent::Started { configured: false }]);
}

#[test]
fn credentials_document_name_follows_config() {
    let config = DeviceConfig {
        credentials_document: "/net.json".into(),
        ..Default::default()
    };
    let mut dev = MockDevice::new();
    make_app(&config, &mut dev);

    assert!(dev.docs.contains_key("/net.json"));
    assert!(!dev.docs.contains_key(CONFIG_DOC));
}

// ── Link supervision ──────────────────────────────────────────

#[test]
fn connected_signal_brings_link_up() {
    let mut dev = MockDevice::with_network("Lab", "pw123456");
    let mut app = make_app(&DeviceConfig::default(), &mut dev);
    let mailbox = RequestMailbox::new();

    dev.signal_connected();
    app.tick(100, &mut dev, &mailbox);

    assert_eq!(app.link().state(), LinkState::Connected);
    assert_eq!(app.link().retry_count(), 0);
    assert_eq!(
        dev.link_changes(),
        vec![("unconfigured", "connecting"), ("connecting", "connected")]
    );
    assert_eq!(app.tick_count(), 1);
}

#[test]
fn link_loss_retries_after_interval() {
    let mut dev = MockDevice::with_network("Lab", "pw123456");
    let mut app = make_app(&DeviceConfig::default(), &mut dev);
    let mailbox = RequestMailbox::new();

    dev.signal_connected();
    app.tick(100, &mut dev, &mailbox);
    dev.signal_disconnected();
    app.tick(200, &mut dev, &mailbox);
    assert_eq!(app.link().state(), LinkState::Reconnecting);
    assert_eq!(dev.connect_requests.len(), 1);

    app.tick(4_999, &mut dev, &mailbox);
    assert_eq!(dev.connect_requests.len(), 1);

    app.tick(5_000, &mut dev, &mailbox);
    assert_eq!(dev.connect_requests.len(), 2);
    assert_eq!(app.link().retry_count(), 1);
    assert!(dev.link_changes().contains(&("connected", "reconnecting")));
}

#[test]
fn retries_exhaust_then_cool_down() {
    let config = DeviceConfig {
        reconnect_interval_ms: 1_000,
        max_retry: 3,
        exhausted_cooldown_ms: 10_000,
        ..Default::default()
    };
    let mut dev = MockDevice::with_network("Lab", "pw123456");
    let mut app = make_app(&config, &mut dev);
    let mailbox = RequestMailbox::new();

    for now in [1_000, 2_000, 3_000] {
        app.tick(now, &mut dev, &mailbox);
    }
    assert_eq!(dev.connect_requests.len(), 4);
    assert_eq!(app.link().retry_count(), 3);

    app.tick(4_000, &mut dev, &mailbox);
    assert_eq!(app.link().state(), LinkState::Exhausted);
    assert_eq!(app.link().retry_count(), 0);
    assert_eq!(dev.connect_requests.len(), 4);

    app.tick(13_999, &mut dev, &mailbox);
    assert_eq!(app.link().state(), LinkState::Exhausted);

    app.tick(14_000, &mut dev, &mailbox);
    assert_eq!(app.link().state(), LinkState::Reconnecting);
    assert_eq!(dev.connect_requests.len(), 5);
    assert!(dev.link_changes().contains(&("exhausted", "reconnecting")));
}

#[test]
fn driver_refusal_still_counts_as_attempt() {
    let config = DeviceConfig {
        reconnect_interval_ms: 1_000,
        ..Default::default()
    };
    let mut dev = MockDevice::with_network("Lab", "pw123456");
    dev.refuse_connect = true;
    let mut app = make_app(&config, &mut dev);
    let mailbox = RequestMailbox::new();

    app.tick(500, &mut dev, &mailbox);
    assert_eq!(dev.connect_requests.len(), 1);
    app.tick(1_000, &mut dev, &mailbox);
    assert_eq!(dev.connect_requests.len(), 2);
    assert_eq!(app.link().retry_count(), 1);
}

#[test]
fn signals_ignored_while_unconfigured() {
    let mut dev = MockDevice::new();
    let mut app = make_app(&DeviceConfig::default(), &mut dev);
    let mailbox = RequestMailbox::new();

    dev.signal_connected();
    app.tick(10, &mut dev, &mailbox);
    assert_eq!(app.link().state(), LinkState::Unconfigured);
    assert!(dev.link_changes().is_empty());
}

// ── Uplink ────────────────────────────────────────────────────

#[test]
fn uplink_fires_once_per_interval_while_connected() {
    let (mut app, mut dev, mailbox) = online();

    app.tick(59_999, &mut dev, &mailbox);
    assert!(dev.uplinks.is_empty());

    app.tick(60_000, &mut dev, &mailbox);
    app.tick(60_010, &mut dev, &mailbox);
    assert_eq!(dev.uplinks.len(), 1);
    let report = &dev.uplinks[0];
    assert_eq!(report.device_id, DEVICE_ID);
    assert_eq!(report.sequence, 1);
    assert_eq!(report.uptime_ms, 60_000);
    assert_eq!(report.signal_strength, -58);
    assert_eq!(report.free_heap, 180_000);

    app.tick(120_000, &mut dev, &mailbox);
    assert_eq!(uplink_events(&dev), vec![(1, true), (2, true)]);
    assert_eq!(app.uplink().fires(), 2);
}

#[test]
fn no_uplink_while_disconnected() {
    let mut dev = MockDevice::with_network("Lab", "pw123456");
    let mut app = make_app(&DeviceConfig::default(), &mut dev);
    let mailbox = RequestMailbox::new();

    app.tick(60_000, &mut dev, &mailbox);
    assert!(dev.uplinks.is_empty());

    // The held window opens on the first connected tick.
    dev.signal_connected();
    app.tick(70_000, &mut dev, &mailbox);
    assert_eq!(dev.uplinks.len(), 1);
    assert_eq!(dev.uplinks[0].uptime_ms, 70_000);
}

#[test]
fn failed_uplink_waits_for_next_interval() {
    let (mut app, mut dev, mailbox) = online();
    dev.fail_uplink = true;

    app.tick(60_000, &mut dev, &mailbox);
    app.tick(60_010, &mut dev, &mailbox);
    assert_eq!(uplink_events(&dev), vec![(1, false)]);

    dev.fail_uplink = false;
    app.tick(119_999, &mut dev, &mailbox);
    assert!(dev.uplinks.is_empty());
    app.tick(120_000, &mut dev, &mailbox);
    assert_eq!(dev.uplinks[0].sequence, 2);
}

// ── Update sessions ───────────────────────────────────────────

#[test]
fn uplink_held_during_update_session() {
    let (mut app, mut dev, mailbox) = online();

    dev.push_update(UpdateEvent::Started(UpdateTarget::Firmware));
    app.tick(1_000, &mut dev, &mailbox);
    assert!(app.gate().is_busy());
    assert_eq!(
        dev.events,
        vec![AppEvent::UpdateStarted(UpdateTarget::Firmware)]
    );

    app.tick(60_000, &mut dev, &mailbox);
    dev.push_update(UpdateEvent::Progress {
        written: 50,
        total: 100,
    });
    app.tick(61_000, &mut dev, &mailbox);
    assert!(dev.uplinks.is_empty());
    assert_eq!(app.gate().percent(), Some(50));
    assert!(app.status(61_000, &dev).update_in_progress);

    // The session ends before the uplink check of the same tick.
    dev.push_update(UpdateEvent::Finished);
    app.tick(62_000, &mut dev, &mailbox);
    assert!(!app.gate().is_busy());
    assert_eq!(dev.uplinks.len(), 1);
    assert_eq!(dev.uplinks[0].sequence, 1);
    assert!(dev.events.contains(&AppEvent::UpdateCompleted));
}

#[test]
fn update_events_wait_while_offline() {
    let mut dev = MockDevice::with_network("Lab", "pw123456");
    let mut app = make_app(&DeviceConfig::default(), &mut dev);
    let mailbox = RequestMailbox::new();

    dev.push_update(UpdateEvent::Started(UpdateTarget::Firmware));
    app.tick(10, &mut dev, &mailbox);
    assert!(!app.gate().is_busy());
    assert_eq!(dev.update_events.len(), 1);

    dev.signal_connected();
    app.tick(20, &mut dev, &mailbox);
    assert!(app.gate().is_busy());
    assert!(dev.update_events.is_empty());
}

#[test]
fn open_session_finishes_after_link_drop() {
    let (mut app, mut dev, mailbox) = online();

    dev.push_update(UpdateEvent::Started(UpdateTarget::Firmware));
    app.tick(1_000, &mut dev, &mailbox);
    dev.signal_disconnected();
    dev.push_update(UpdateEvent::Failed(UpdateErrorKind::Receive));
    app.tick(2_000, &mut dev, &mailbox);

    assert_eq!(app.link().state(), LinkState::Reconnecting);
    assert!(!app.gate().is_busy());
    assert!(dev
        .events
        .contains(&AppEvent::UpdateFailed(UpdateErrorKind::Receive)));
}

#[test]
fn auth_failure_does_not_open_session() {
    let (mut app, mut dev, mailbox) = online();

    dev.push_update(UpdateEvent::Failed(UpdateErrorKind::Auth));
    app.tick(1_000, &mut dev, &mailbox);
    assert!(!app.gate().is_busy());

    app.tick(60_000, &mut dev, &mailbox);
    assert_eq!(dev.uplinks.len(), 1);
}
