// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Integration tests against a mock ISY using wiremock.

use std::time::{Duration, Instant};

use isy_snapshot::snapshot::{FileBackend, MemoryBackend, SnapshotBackend};
use isy_snapshot::{
    ConnectionError, ControllerClient, ControllerConfig, Error, ParseError, Snapshot,
    SnapshotService, StoreError,
};
use wiremock::matchers::{basic_auth, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

const USER: &str = "admin";
const PASSWORD: &str = "secret";

fn config_for(mock_server: &MockServer) -> ControllerConfig {
    ControllerConfig::new(mock_server.uri().replace("http://", ""), USER, PASSWORD)
}

/// One Insteon dimmer and one motion sensor.
fn lamp_and_sensor() -> &'static str {
    r#"<?xml version="1.0" encoding="UTF-8"?>
<nodes>
    <root>Network</root>
    <node flag="128" nodeDefId="DimmerLampSwitch">
        <address>1A 2B 3C 1</address>
        <name>Porch Light</name>
        <type>2.0</type>
        <enabled>true</enabled>
        <property id="ST" value="255" formatted="On" uom="100"/>
    </node>
    <node flag="0" nodeDefId="MotionSensor">
        <address>44 55 66 1</address>
        <name>Hall Motion</name>
        <type>16.1.65.0</type>
        <enabled>true</enabled>
        <property id="ST" value="1" formatted="On" uom="1"/>
    </node>
</nodes>"#
}

/// One Z-Wave switch reported off.
fn zwave_off() -> &'static str {
    r#"<nodes>
    <node flag="128" nodeDefId="ZWaveBinarySwitch">
        <address>ZW002_1</address>
        <name>Garage Outlet</name>
        <family>4</family>
        <type>4.16.1.0</type>
        <property id="ST" value="0" formatted="Off" uom="51"/>
    </node>
</nodes>"#
}

async fn mount_nodes(mock_server: &MockServer, body: &str) {
    Mock::given(method("GET"))
        .and(path("/rest/nodes"))
        .and(basic_auth(USER, PASSWORD))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(mock_server)
        .await;
}

/// Reads like `MemoryBackend` but rejects every write.
#[derive(Debug, Clone)]
struct ReadOnlyBackend(MemoryBackend);

impl SnapshotBackend for ReadOnlyBackend {
    fn load(&self) -> Result<Option<Snapshot>, StoreError> {
        self.0.load()
    }

    fn save(&self, _snapshot: &Snapshot) -> Result<(), StoreError> {
        Err(StoreError::Io(std::io::Error::other("read-only store")))
    }
}

fn single(address: &str, name: &str, value: &str) -> Snapshot {
    let mut snapshot = Snapshot::new();
    snapshot.insert(address, name, value);
    snapshot
}

// ============================================================================
// ControllerClient Tests
// ============================================================================

mod controller_client {
    use super::*;

    #[tokio::test]
    async fn fetch_device_list_returns_raw_body() {
        let mock_server = MockServer::start().await;
        mount_nodes(&mock_server, lamp_and_sensor()).await;

        let client = ControllerClient::new(&config_for(&mock_server)).unwrap();
        let body = client.fetch_device_list().await.unwrap();

        assert_eq!(body, lamp_and_sensor().as_bytes());
    }

    #[tokio::test]
    async fn fetch_device_list_unauthorized() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/nodes"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&mock_server)
            .await;

        let client = ControllerClient::new(&config_for(&mock_server)).unwrap();
        let err = client.fetch_device_list().await.unwrap_err();

        assert!(matches!(err, ConnectionError::AuthenticationFailed));
    }

    #[tokio::test]
    async fn fetch_device_list_server_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/nodes"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;

        let client = ControllerClient::new(&config_for(&mock_server)).unwrap();
        let err = client.fetch_device_list().await.unwrap_err();

        assert!(matches!(err, ConnectionError::Status { status: 503, .. }));
    }

    #[tokio::test]
    async fn fetch_device_list_times_out() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/nodes"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(lamp_and_sensor())
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&mock_server)
            .await;

        let config = config_for(&mock_server).with_timeout(Duration::from_millis(50));
        let client = ControllerClient::new(&config).unwrap();
        let err = client.fetch_device_list().await.unwrap_err();

        assert!(matches!(err, ConnectionError::Timeout(50)));
    }

    #[tokio::test]
    async fn send_command_on_with_level() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/nodes/1A%202B%203C%201/cmd/DON/255"))
            .and(basic_auth(USER, PASSWORD))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = ControllerClient::new(&config_for(&mock_server)).unwrap();
        client.send_command("1A 2B 3C 1", "255").await.unwrap();
    }

    #[tokio::test]
    async fn send_command_off() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/nodes/ZW002_1/cmd/DOF"))
            .and(basic_auth(USER, PASSWORD))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = ControllerClient::new(&config_for(&mock_server)).unwrap();
        client.send_command("ZW002_1", "0").await.unwrap();
    }

    #[tokio::test]
    async fn send_command_unknown_node() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let client = ControllerClient::new(&config_for(&mock_server)).unwrap();
        let err = client.send_command("99 99 99 1", "128").await.unwrap_err();

        assert!(matches!(err, ConnectionError::Status { status: 404, .. }));
    }
}

// ============================================================================
// Discover Tests
// ============================================================================

mod discover {
    use super::*;

    #[tokio::test]
    async fn records_in_scope_devices_only() {
        let mock_server = MockServer::start().await;
        mount_nodes(&mock_server, lamp_and_sensor()).await;

        let backend = MemoryBackend::new();
        let service = SnapshotService::new(&config_for(&mock_server), backend.clone()).unwrap();

        let report = service.discover().await.unwrap();

        assert_eq!(report.processed, 1);
        assert_eq!(report.ignored, 1);
        assert_eq!(report.to_string(), "1 devices processed");

        let stored = backend.stored().unwrap();
        assert_eq!(stored.len(), 1);
        let entry = stored.get("1A 2B 3C 1").unwrap();
        assert_eq!(entry.value, "255");
        assert_eq!(entry.name, "Porch Light");
        assert!(stored.get("44 55 66 1").is_none());
    }

    #[tokio::test]
    async fn save_is_discover() {
        let mock_server = MockServer::start().await;
        mount_nodes(&mock_server, zwave_off()).await;

        let backend = MemoryBackend::new();
        let service = SnapshotService::new(&config_for(&mock_server), backend.clone()).unwrap();

        let report = service.save().await.unwrap();

        assert_eq!(report.processed, 1);
        assert_eq!(
            backend.stored(),
            Some(single("ZW002_1", "Garage Outlet", "0"))
        );
    }

    #[tokio::test]
    async fn discover_twice_is_idempotent() {
        let mock_server = MockServer::start().await;
        mount_nodes(&mock_server, lamp_and_sensor()).await;

        let backend = MemoryBackend::new();
        let service = SnapshotService::new(&config_for(&mock_server), backend.clone()).unwrap();

        service.discover().await.unwrap();
        let first = backend.stored().unwrap();
        service.discover().await.unwrap();
        let second = backend.stored().unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn unauthorized_leaves_snapshot_untouched() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/nodes"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&mock_server)
            .await;

        let prior = single("11 22 33 1", "Den Lamp", "128");
        let backend = MemoryBackend::with_snapshot(prior.clone());
        let service = SnapshotService::new(&config_for(&mock_server), backend.clone()).unwrap();

        let err = service.discover().await.unwrap_err();

        assert!(matches!(
            err,
            Error::Connection(ConnectionError::AuthenticationFailed)
        ));
        assert_eq!(backend.stored(), Some(prior));
    }

    #[tokio::test]
    async fn unparseable_document_aborts() {
        let mock_server = MockServer::start().await;
        mount_nodes(&mock_server, "<nodes><node><address>").await;

        let prior = single("11 22 33 1", "Den Lamp", "128");
        let backend = MemoryBackend::with_snapshot(prior.clone());
        let service = SnapshotService::new(&config_for(&mock_server), backend.clone()).unwrap();

        let err = service.discover().await.unwrap_err();

        assert!(matches!(err, Error::Parse(ParseError::Xml(_))));
        assert_eq!(backend.stored(), Some(prior));
    }

    #[tokio::test]
    async fn malformed_node_does_not_abort() {
        let mock_server = MockServer::start().await;
        mount_nodes(
            &mock_server,
            r#"<nodes>
                <node><name>Orphan</name><type>1.0</type><property id="ST" value="10" uom="100"/></node>
                <node><address>AA BB CC 1</address><name>Kitchen</name><type>1.32.65.0</type><property id="ST" value="77" uom="100"/></node>
            </nodes>"#,
        )
        .await;

        let backend = MemoryBackend::new();
        let service = SnapshotService::new(&config_for(&mock_server), backend.clone()).unwrap();

        let report = service.discover().await.unwrap();

        assert_eq!(report.processed, 1);
        assert_eq!(report.record_errors.len(), 1);
        assert_eq!(
            backend.stored(),
            Some(single("AA BB CC 1", "Kitchen", "77"))
        );
    }

    #[tokio::test]
    async fn replaces_saved_snapshot() {
        let mock_server = MockServer::start().await;
        mount_nodes(&mock_server, lamp_and_sensor()).await;

        let mut prior = single("99 99 99 1", "Removed Lamp", "128");
        prior.insert("1A 2B 3C 1", "Porch Light", "0");
        let backend = MemoryBackend::with_snapshot(prior);
        let service = SnapshotService::new(&config_for(&mock_server), backend.clone()).unwrap();

        service.discover().await.unwrap();

        let expected = single("1A 2B 3C 1", "Porch Light", "255");
        assert_eq!(backend.stored(), Some(expected.clone()));
        assert_eq!(service.snapshot(), expected);
    }

    #[tokio::test]
    async fn duplicate_address_last_one_wins() {
        let mock_server = MockServer::start().await;
        mount_nodes(
            &mock_server,
            r#"<nodes>
                <node><address>AA BB CC 1</address><name>Kitchen</name><type>1.32.65.0</type><property id="ST" value="10" uom="100"/></node>
                <node><address>AA BB CC 1</address><name>Kitchen Pendant</name><type>1.32.65.0</type><property id="ST" value="200" uom="100"/></node>
            </nodes>"#,
        )
        .await;

        let backend = MemoryBackend::new();
        let service = SnapshotService::new(&config_for(&mock_server), backend.clone()).unwrap();

        service.discover().await.unwrap();

        assert_eq!(
            backend.stored(),
            Some(single("AA BB CC 1", "Kitchen Pendant", "200"))
        );
    }

    #[tokio::test]
    async fn persist_failure_is_reported_and_rolled_back() {
        let mock_server = MockServer::start().await;
        mount_nodes(&mock_server, lamp_and_sensor()).await;

        let prior = single("11 22 33 1", "Den Lamp", "128");
        let stored = MemoryBackend::with_snapshot(prior.clone());
        let service = SnapshotService::new(
            &config_for(&mock_server),
            ReadOnlyBackend(stored.clone()),
        )
        .unwrap();

        let err = service.discover().await.unwrap_err();

        assert!(matches!(err, Error::Store(StoreError::Io(_))));
        assert_eq!(service.snapshot(), prior);
        assert_eq!(stored.stored(), Some(prior));
    }

    #[tokio::test]
    async fn unreadable_store_aborts_without_writing() {
        let mock_server = MockServer::start().await;
        mount_nodes(&mock_server, lamp_and_sensor()).await;

        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("state.json");
        std::fs::create_dir(&target).unwrap();
        std::fs::write(target.join("child"), "x").unwrap();

        let service =
            SnapshotService::new(&config_for(&mock_server), FileBackend::new(&target)).unwrap();

        let err = service.discover().await.unwrap_err();

        assert!(matches!(err, Error::Store(StoreError::Io(_))));
        assert!(service.snapshot().is_empty());
        assert!(target.join("child").exists());
    }

    #[test]
    fn unready_config_rejected() {
        let config = ControllerConfig::new("192.168.1.20", "set me", PASSWORD);
        let err = SnapshotService::new(&config, MemoryBackend::new()).unwrap_err();

        assert!(matches!(err, Error::Config(_)));
        assert_eq!(
            err.to_string(),
            "configuration error: ISY Username must be set"
        );
    }
}

// ============================================================================
// Restore Tests
// ============================================================================

mod restore {
    use super::*;

    #[tokio::test]
    async fn restores_discovered_level() {
        let mock_server = MockServer::start().await;
        mount_nodes(&mock_server, lamp_and_sensor()).await;

        Mock::given(method("GET"))
            .and(path("/rest/nodes/1A%202B%203C%201/cmd/DON/255"))
            .and(basic_auth(USER, PASSWORD))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;

        let service =
            SnapshotService::new(&config_for(&mock_server), MemoryBackend::new()).unwrap();
        service.discover().await.unwrap();

        let report = service.restore().await;

        assert_eq!(report.restored, 1);
        assert!(report.is_success());
        assert_eq!(report.to_string(), "1 devices restored, 0 failed");
    }

    #[tokio::test]
    async fn zero_value_sends_off() {
        let mock_server = MockServer::start().await;
        mount_nodes(&mock_server, zwave_off()).await;

        Mock::given(method("GET"))
            .and(path("/rest/nodes/ZW002_1/cmd/DOF"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path_regex(r"/cmd/DON"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let service =
            SnapshotService::new(&config_for(&mock_server), MemoryBackend::new()).unwrap();
        service.discover().await.unwrap();

        let report = service.restore().await;

        assert_eq!(report.restored, 1);
        assert_eq!(report.failed(), 0);
    }

    #[tokio::test]
    async fn empty_snapshot_issues_no_commands() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let service =
            SnapshotService::new(&config_for(&mock_server), MemoryBackend::new()).unwrap();

        let report = service.restore().await;

        assert_eq!(report.restored, 0);
        assert_eq!(report.failed(), 0);
        assert_eq!(report.to_string(), "0 devices restored, 0 failed");
    }

    #[tokio::test]
    async fn failures_do_not_stop_other_devices() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/nodes/22%2022%2022%201/cmd/DON/128"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/rest/nodes/11%2011%2011%201/cmd/DON/255"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/rest/nodes/33%2033%2033%201/cmd/DOF"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;

        let mut saved = single("11 11 11 1", "Hall", "255");
        saved.insert("22 22 22 1", "Stairs", "128");
        saved.insert("33 33 33 1", "Porch", "0");

        let config = config_for(&mock_server).with_restore_concurrency(1);
        let service = SnapshotService::new(&config, MemoryBackend::with_snapshot(saved)).unwrap();

        let report = service.restore().await;

        assert_eq!(report.restored, 2);
        assert_eq!(report.failed_addresses(), vec!["22 22 22 1"]);
        assert_eq!(report.failures[0].name, "Stairs");
        assert!(matches!(
            report.failures[0].error,
            ConnectionError::Status { status: 500, .. }
        ));
        assert_eq!(
            report.to_string(),
            "2 devices restored, 1 failed: 22 22 22 1"
        );
    }

    #[tokio::test]
    async fn every_failure_is_reported() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&mock_server)
            .await;

        let mut saved = Snapshot::new();
        for i in 0..10 {
            saved.insert(format!("0{i} 00 00 1"), format!("Device {i}"), "255");
        }

        let service =
            SnapshotService::new(&config_for(&mock_server), MemoryBackend::with_snapshot(saved))
                .unwrap();

        let report = service.restore().await;

        assert_eq!(report.restored, 0);
        assert_eq!(report.failed(), 10);
        let mut expected: Vec<String> = (0..10).map(|i| format!("0{i} 00 00 1")).collect();
        expected.sort();
        assert_eq!(report.failed_addresses(), expected);
    }

    #[tokio::test]
    async fn restores_after_restart_from_file() {
        let mock_server = MockServer::start().await;
        mount_nodes(&mock_server, lamp_and_sensor()).await;

        Mock::given(method("GET"))
            .and(path("/rest/nodes/1A%202B%203C%201/cmd/DON/255"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("state.json");

        {
            let service =
                SnapshotService::new(&config_for(&mock_server), FileBackend::new(&file)).unwrap();
            service.discover().await.unwrap();
        }

        let restarted =
            SnapshotService::new(&config_for(&mock_server), FileBackend::new(&file)).unwrap();
        let report = restarted.restore().await;

        assert_eq!(report.restored, 1);
        assert_eq!(
            restarted.snapshot(),
            single("1A 2B 3C 1", "Porch Light", "255")
        );
    }

    async fn timed_restore(mock_server: &MockServer, limit: usize) -> Duration {
        let mut saved = Snapshot::new();
        for i in 0..8 {
            saved.insert(format!("0{i} 00 00 1"), format!("Device {i}"), "255");
        }

        let config = config_for(mock_server).with_restore_concurrency(limit);
        let service = SnapshotService::new(&config, MemoryBackend::with_snapshot(saved)).unwrap();

        let started = Instant::now();
        let report = service.restore().await;
        let elapsed = started.elapsed();

        assert_eq!(report.restored, 8);
        elapsed
    }

    #[tokio::test]
    async fn restore_concurrency_bounds_in_flight_commands() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path_regex(r"/cmd/DON/255$"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(200)))
            .expect(16)
            .mount(&mock_server)
            .await;

        // One at a time: eight back-to-back delays.
        let serial = timed_restore(&mock_server, 1).await;
        assert!(serial >= Duration::from_millis(1600), "serial took {serial:?}");

        // Four at a time: two waves.
        let bounded = timed_restore(&mock_server, 4).await;
        assert!(bounded >= Duration::from_millis(400), "bounded took {bounded:?}");
        assert!(bounded < Duration::from_millis(1200), "bounded took {bounded:?}");
    }

    #[tokio::test]
    async fn unreadable_store_restores_nothing() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("state.json");
        std::fs::create_dir(&target).unwrap();

        let service =
            SnapshotService::new(&config_for(&mock_server), FileBackend::new(&target)).unwrap();

        let report = service.restore().await;

        assert_eq!(report.restored, 0);
        assert!(report.is_success());
    }
}
