//! Bundled scenario files and command handlers.

#![allow(clippy::unwrap_used, clippy::expect_used, missing_docs)]

use std::io::Write;
use std::path::PathBuf;
use vguard_cli::commands::{
    check_config::{handle_check_config_command, CheckConfigCommand},
    inspect::{handle_inspect_command, InspectCommand},
    simulate::{handle_simulate_command, SimulateCommand},
};
use vguard_cli::Scenario;
use vguard_core::{ConfigError, EpochMarker, PeerId};

fn bundled(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("scenarios")
        .join(name)
}

#[tokio::test]
async fn updated_world_notifies_everyone() {
    let report = Scenario::load(&bundled("updated_world.toml"))
        .unwrap()
        .run()
        .await
        .unwrap();

    assert!(report.mismatch());
    assert_eq!(report.coordinator, Some(PeerId::new(1)));
    assert_eq!(report.peers.len(), 4);
    for peer in &report.peers {
        assert!(peer.notifications >= 1);
        assert_eq!(peer.marker, Some(EpochMarker::Mismatch));
    }
    assert_eq!(report.peers[0].fetches, 1);
    assert_eq!(report.peers[3].fetches, 0);
}

#[tokio::test]
async fn blocked_coordinator_hands_over() {
    let report = Scenario::load(&bundled("blocked_coordinator.toml"))
        .unwrap()
        .run()
        .await
        .unwrap();

    assert!(report.mismatch());
    assert_eq!(report.coordinator, Some(PeerId::new(2)));
    assert!(report.peers[0].fetch_disabled);
    assert!(!report.peers[1].fetch_disabled);
}

#[tokio::test]
async fn successor_announces_known_mismatch() {
    let report = handle_simulate_command(SimulateCommand {
        scenario: bundled("coordinator_departs.toml"),
        seed: None,
    })
    .await
    .unwrap();

    assert_eq!(report.coordinator, Some(PeerId::new(2)));
    let departed = &report.peers[0];
    assert!(!departed.present);
    assert_eq!(departed.marker, None);

    let late = &report.peers[2];
    assert_eq!(late.peer, PeerId::new(3));
    assert_eq!(late.notifications, 1);
    assert_eq!(late.fetches, 0);
}

#[test]
fn bundled_guard_config_is_valid() {
    let problems = handle_check_config_command(&CheckConfigCommand {
        config: bundled("guard.toml"),
    })
    .unwrap();
    assert!(problems.is_empty());
}

#[test]
fn check_config_reports_every_problem() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "remote_source = \"https://example.invalid/world\"").unwrap();

    let problems = handle_check_config_command(&CheckConfigCommand {
        config: file.path().to_path_buf(),
    })
    .unwrap();
    assert_eq!(problems.len(), 2);
    assert!(matches!(problems[0], ConfigError::InvalidSource { .. }));
    assert_eq!(problems[1], ConfigError::MissingNotifyTarget);
}

#[test]
fn inspect_reads_custom_field() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{"publishedAt":"2024-05-01T21:00:00+09:00"}}"#).unwrap();

    let instant = handle_inspect_command(&InspectCommand {
        body: file.path().to_path_buf(),
        field: "publishedAt".to_string(),
    })
    .unwrap();
    assert_eq!(instant.as_unix_ms(), 1_714_564_800_000);
}

#[test]
fn inspect_rejects_missing_field() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{"id":"wrld_1"}}"#).unwrap();

    let err = handle_inspect_command(&InspectCommand {
        body: file.path().to_path_buf(),
        field: "updated_at".to_string(),
    })
    .unwrap_err();
    assert!(format!("{err:#}").contains("missing field"));
}
