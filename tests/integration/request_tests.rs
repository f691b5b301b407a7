//! Request interface: config read/write and status, both called directly
//! and through the cross-task mailbox.

use futures_lite::future::block_on;

use stationlink::app::commands::{ConfigUpdate, Request, Response};
use stationlink::app::events::AppEvent;
use stationlink::app::mailbox::RequestMailbox;
use stationlink::app::service::AppService;
use stationlink::config::DeviceConfig;
use stationlink::connection::LinkState;

use crate::mock_device::{CONFIG_DOC, MockDevice};

fn started(mut dev: MockDevice) -> (AppService, MockDevice) {
    let mut app = AppService::new(&DeviceConfig::default(), "SL-TEST01");
    app.start(0, &mut dev);
    dev.take_events();
    (app, dev)
}

fn set_config(ssid: &str, password: &str) -> Request {
    Request::SetConfig(ConfigUpdate {
        ssid: ssid.into(),
        password: password.into(),
    })
}

fn json(resp: &Response) -> serde_json::Value {
    serde_json::from_slice(&resp.body()).unwrap()
}

// ── GET config ────────────────────────────────────────────────

#[test]
fn get_config_without_document_is_404() {
    let mut app = AppService::new(&DeviceConfig::default(), "SL-TEST01");
    let mut dev = MockDevice::new();

    let resp = app.handle_request(Request::GetConfig, 0, &mut dev);
    assert_eq!(resp, Response::NotFound);
    assert_eq!(resp.status_code(), 404);
    assert_eq!(json(&resp)["error"], "Config file not found");
}

#[test]
fn get_config_returns_raw_document() {
    let (mut app, mut dev) = started(MockDevice::with_network("Lab", "pw123456"));
    let stored = dev.docs.get(CONFIG_DOC).unwrap().clone();

    let resp = app.handle_request(Request::GetConfig, 10, &mut dev);
    assert_eq!(resp.status_code(), 200);
    assert_eq!(resp, Response::Config(stored));
}

#[test]
fn get_config_after_first_boot_is_empty_document() {
    let (mut app, mut dev) = started(MockDevice::new());

    let resp = app.handle_request(Request::GetConfig, 10, &mut dev);
    assert_eq!(resp.status_code(), 200);
    assert_eq!(json(&resp), serde_json::json!({ "ssid": "", "password": "" }));
}

#[test]
fn get_config_read_failure_is_404() {
    let (mut app, mut dev) = started(MockDevice::with_network("Lab", "pw123456"));
    dev.fail_reads = true;

    let resp = app.handle_request(Request::GetConfig, 10, &mut dev);
    assert_eq!(resp, Response::NotFound);
}

// ── POST config ───────────────────────────────────────────────

#[test]
fn set_config_persists_and_connects() {
    let (mut app, mut dev) = started(MockDevice::new());

    let resp = app.handle_request(set_config("Lab", "pw123456"), 10, &mut dev);
    assert_eq!(resp, Response::Applied { persisted: true });
    assert_eq!(resp.status_code(), 200);
    assert_eq!(json(&resp)["success"], true);

    assert_eq!(
        dev.config_doc(),
        Some(serde_json::json!({ "ssid": "Lab", "password": "pw123456" }))
    );
    assert_eq!(app.link().state(), LinkState::Connecting);
    assert_eq!(dev.connect_requests, vec!["Lab".to_owned()]);
    assert_eq!(dev.events, vec![AppEvent::ConfigChanged { persisted: true }]);
}

#[test]
fn set_config_accepts_open_network() {
    let (mut app, mut dev) = started(MockDevice::new());

    let resp = app.handle_request(set_config("Cafe", ""), 10, &mut dev);
    assert_eq!(resp, Response::Applied { persisted: true });
    assert_eq!(dev.config_doc().unwrap()["password"], "");
}

#[test]
fn set_config_requires_ssid() {
    let (mut app, mut dev) = started(MockDevice::new());
    let before = dev.docs.clone();

    let resp = app.handle_request(set_config("", "pw123456"), 10, &mut dev);
    assert_eq!(resp, Response::Invalid("SSID is required"));
    assert_eq!(resp.status_code(), 400);
    assert_eq!(dev.docs, before);
    assert_eq!(app.link().state(), LinkState::Unconfigured);
    assert!(dev.events.is_empty());
}

#[test]
fn set_config_rejects_overlong_fields() {
    let (mut app, mut dev) = started(MockDevice::new());

    let resp = app.handle_request(set_config(&"s".repeat(33), ""), 10, &mut dev);
    assert_eq!(resp, Response::Invalid("SSID too long"));

    let resp = app.handle_request(set_config("Lab", &"p".repeat(65)), 10, &mut dev);
    assert_eq!(resp, Response::Invalid("Password too long"));

    assert!(dev.connect_requests.is_empty());
}

#[test]
fn set_config_storage_failure_still_applies() {
    let (mut app, mut dev) = started(MockDevice::new());
    dev.fail_writes = true;

    let resp = app.handle_request(set_config("Lab", "pw123456"), 10, &mut dev);
    assert_eq!(resp, Response::Applied { persisted: false });
    assert_eq!(resp.status_code(), 500);
    assert_eq!(json(&resp)["success"], false);

    assert_eq!(app.link().state(), LinkState::Connecting);
    assert_eq!(dev.events, vec![AppEvent::ConfigChanged { persisted: false }]);
}

#[test]
fn set_config_replaces_previous_network() {
    let (mut app, mut dev) = started(MockDevice::with_network("Lab", "pw123456"));
    let mailbox = RequestMailbox::new();
    dev.signal_connected();
    app.tick(10, &mut dev, &mailbox);

    app.handle_request(set_config("Cafe", "latte123"), 20, &mut dev);
    assert_eq!(dev.connect_requests, vec!["Lab".to_owned(), "Cafe".to_owned()]);
    assert_eq!(app.link().state(), LinkState::Connecting);
    assert_eq!(app.link().retry_count(), 0);
    assert_eq!(app.link().identity().unwrap().name(), "Cafe");
}

// ── Link control ──────────────────────────────────────────────

#[test]
fn disconnect_keeps_stored_document() {
    let (mut app, mut dev) = started(MockDevice::with_network("Lab", "pw123456"));
    let mailbox = RequestMailbox::new();
    dev.signal_connected();
    app.tick(10, &mut dev, &mailbox);
    assert!(app.link().is_connected());
    let before = dev.docs.clone();

    let resp = app.handle_request(Request::Disconnect, 20, &mut dev);
    assert_eq!(resp, Response::Link(LinkState::Unconfigured));
    assert_eq!(json(&resp)["link_state"], "unconfigured");
    assert_eq!(dev.disconnects, 1);
    assert_eq!(dev.docs, before);
    assert!(app.link().identity().is_none());

    // No further connect requests until reconfigured or rebooted.
    app.tick(1_000_000, &mut dev, &mailbox);
    assert_eq!(dev.connect_requests, vec!["Lab".to_owned()]);

    let (rebooted, dev) = started(dev);
    assert_eq!(rebooted.link().state(), LinkState::Connecting);
    assert_eq!(dev.connect_requests.len(), 2);
}

#[test]
fn disconnect_through_mailbox_reports_transition() {
    let (mut app, mut dev) = started(MockDevice::with_network("Lab", "pw123456"));
    let mailbox = RequestMailbox::new();

    let resp = std::thread::scope(|s| {
        let caller = s.spawn(|| block_on(mailbox.call(Request::Disconnect)));

        let mut now = 10;
        while !caller.is_finished() {
            app.tick(now, &mut dev, &mailbox);
            now += 10;
            std::thread::yield_now();
        }
        caller.join().unwrap()
    });

    assert_eq!(resp, Response::Link(LinkState::Unconfigured));
    assert_eq!(dev.link_changes(), vec![("connecting", "unconfigured")]);
}

#[test]
fn retry_while_reconnecting_attempts_immediately() {
    let (mut app, mut dev) = started(MockDevice::with_network("Lab", "pw123456"));
    let mailbox = RequestMailbox::new();
    dev.signal_connected();
    app.tick(10, &mut dev, &mailbox);
    dev.signal_disconnected();
    app.tick(20, &mut dev, &mailbox);
    assert_eq!(app.link().state(), LinkState::Reconnecting);
    assert_eq!(dev.connect_requests.len(), 1);

    let resp = app.handle_request(Request::Retry, 30, &mut dev);
    assert_eq!(resp, Response::Link(LinkState::Reconnecting));
    assert_eq!(resp.status_code(), 200);
    assert_eq!(dev.connect_requests.len(), 2);
    assert_eq!(app.link().retry_count(), 0);
}

#[test]
fn retry_leaves_exhausted() {
    let (mut app, mut dev) = started(MockDevice::with_network("Lab", "pw123456"));
    let mailbox = RequestMailbox::new();
    // Default policy: 20 retries at 5 s, the 21st due tick exhausts.
    for n in 1..=21u64 {
        app.tick(n * 5_000, &mut dev, &mailbox);
    }
    assert_eq!(app.link().state(), LinkState::Exhausted);
    let before = dev.connect_requests.len();

    let resp = app.handle_request(Request::Retry, 105_010, &mut dev);
    assert_eq!(resp, Response::Link(LinkState::Reconnecting));
    assert_eq!(dev.connect_requests.len(), before + 1);
}

#[test]
fn retry_while_connected_is_noop() {
    let mut dev = MockDevice::with_network("Lab", "pw123456");
    dev.auto_connect = true;
    let (mut app, mut dev) = started(dev);
    app.tick(10, &mut dev, &RequestMailbox::new());

    let resp = app.handle_request(Request::Retry, 20, &mut dev);
    assert_eq!(resp, Response::Link(LinkState::Connected));
    assert_eq!(dev.connect_requests.len(), 1);
}

#[test]
fn retry_without_network_is_rejected() {
    let (mut app, mut dev) = started(MockDevice::new());

    let resp = app.handle_request(Request::Retry, 10, &mut dev);
    assert_eq!(resp, Response::Invalid("No network configured"));
    assert_eq!(resp.status_code(), 400);
    assert!(dev.connect_requests.is_empty());
}

// ── GET status ────────────────────────────────────────────────

#[test]
fn status_when_disconnected_uses_placeholders() {
    let (mut app, mut dev) = started(MockDevice::new());

    let Response::Status(report) = app.handle_request(Request::GetStatus, 1_234, &mut dev) else {
        panic!("expected a status report");
    };
    assert_eq!(report.device_id, "SL-TEST01");
    assert_eq!(report.device_name, "ESP32-Device");
    assert_eq!(report.uptime_ms, 1_234);
    assert!(!report.wifi_connected);
    assert_eq!(report.link_state, "unconfigured");
    assert_eq!(report.ssid, "Not connected");
    assert_eq!(report.ip_address, "N/A");
    assert_eq!(report.signal_strength, 0);
    assert!(!report.update_in_progress);
}

#[test]
fn status_when_connected_reports_network() {
    let mut dev = MockDevice::with_network("Lab", "pw123456");
    dev.auto_connect = true;
    let (mut app, mut dev) = started(dev);
    let mailbox = RequestMailbox::new();
    app.tick(10, &mut dev, &mailbox);

    let resp = app.handle_request(Request::GetStatus, 20, &mut dev);
    assert_eq!(resp.status_code(), 200);
    let v = json(&resp);
    assert_eq!(v["wifi_connected"], true);
    assert_eq!(v["link_state"], "connected");
    assert_eq!(v["ssid"], "Lab");
    assert_eq!(v["ip_address"], "10.0.0.42");
    assert_eq!(v["signal_strength"], -58);
    assert_eq!(v["free_heap"], 180_000);
    assert_eq!(v["chip_model"], "ESP32");
    assert_eq!(v["chip_cores"], 2);
    assert_eq!(v["sdk_version"], "v5.2.2");
}

#[test]
fn status_never_contains_secret() {
    let mut dev = MockDevice::with_network("Lab", "pw123456");
    dev.auto_connect = true;
    let (mut app, mut dev) = started(dev);
    app.tick(10, &mut dev, &RequestMailbox::new());

    let body = app.handle_request(Request::GetStatus, 20, &mut dev).body();
    let text = String::from_utf8(body).unwrap();
    assert!(!text.contains("pw123456"));
}

// ── Through the mailbox ───────────────────────────────────────

#[test]
fn mailbox_request_is_answered_by_tick() {
    let (mut app, mut dev) = started(MockDevice::new());
    let mailbox = RequestMailbox::new();

    let resp = std::thread::scope(|s| {
        let caller = s.spawn(|| block_on(mailbox.call(set_config("Lab", "pw123456"))));

        let mut now = 10;
        while !caller.is_finished() {
            app.tick(now, &mut dev, &mailbox);
            now += 10;
            std::thread::yield_now();
        }
        caller.join().unwrap()
    });

    assert_eq!(resp, Response::Applied { persisted: true });
    assert_eq!(app.link().state(), LinkState::Connecting);
    // The tick that served the request reports the transition it caused.
    assert_eq!(dev.link_changes(), vec![("unconfigured", "connecting")]);
}

#[test]
fn mailbox_status_reflects_tick_state() {
    let mut dev = MockDevice::with_network("Lab", "pw123456");
    dev.auto_connect = true;
    let (mut app, mut dev) = started(dev);
    let mailbox = RequestMailbox::new();

    let resp = std::thread::scope(|s| {
        let caller = s.spawn(|| block_on(mailbox.call(Request::GetStatus)));

        let mut now = 10;
        while !caller.is_finished() {
            app.tick(now, &mut dev, &mailbox);
            now += 10;
            std::thread::yield_now();
        }
        caller.join().unwrap()
    });

    let Response::Status(report) = resp else {
        panic!("expected a status report");
    };
    assert!(report.wifi_connected);
    assert_eq!(report.ssid, "Lab");
}
