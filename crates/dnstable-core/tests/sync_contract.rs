//! Contract Test: Table & File Synchronization
//!
//! This test verifies that updates are minimal and policies are honored.
//!
//! Constraints verified:
//! - Identical file content means no write (byte-for-byte)
//! - Empty result + never-flush touches neither file nor table
//! - Preserve appends instead of replacing and never flushes
//! - File failures do not block the table step
//! - Dry run writes nothing and runs nothing
//!
//! If this test fails, idempotency is broken.

mod common;

use common::*;
use dnstable_core::sync::{FileOutcome, SyncOutcome, TableOutcome, TableSynchronizer};
use dnstable_core::traits::TableCommand;
use dnstable_core::{UpdateConfig, UpdatePolicy};
use std::fs;
use std::time::{Duration, SystemTime};
use tempfile::tempdir;

fn report(outcome: SyncOutcome) -> dnstable_core::SyncReport {
    match outcome {
        SyncOutcome::Synced(report) => report,
        SyncOutcome::Skipped => panic!("expected a synced outcome"),
    }
}

#[tokio::test]
async fn identical_file_content_is_not_rewritten() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("hosts.txt");
    fs::write(&path, "192.0.2.1\n2001:db8::1\n").unwrap();

    // push the mtime into the past so a rewrite would be visible
    let past = SystemTime::now() - Duration::from_secs(3600);
    fs::File::options()
        .write(true)
        .open(&path)
        .unwrap()
        .set_modified(past)
        .unwrap();

    let table = RecordingTable::new();
    let config = UpdateConfig::new("web").with_output_file(&path);
    let outcome = TableSynchronizer::new(&table, &config)
        .sync(&addrs(&["192.0.2.1", "2001:db8::1"]))
        .await;

    let report = report(outcome);
    assert_eq!(report.file, Some(FileOutcome::Unchanged));
    assert_eq!(fs::metadata(&path).unwrap().modified().unwrap(), past);
    // the table is still brought in line
    assert_eq!(table.command_count(), 1);
}

#[tokio::test]
async fn missing_trailing_newline_counts_as_different() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("hosts.txt");
    fs::write(&path, "192.0.2.1").unwrap();

    let table = RecordingTable::new();
    let config = UpdateConfig::new("web").with_output_file(&path);
    let outcome = TableSynchronizer::new(&table, &config)
        .sync(&addrs(&["192.0.2.1"]))
        .await;

    assert_eq!(report(outcome).file, Some(FileOutcome::Written));
    assert_eq!(fs::read_to_string(&path).unwrap(), "192.0.2.1\n");
}

#[tokio::test]
async fn changed_list_is_written() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("hosts.txt");

    let table = RecordingTable::new();
    let config = UpdateConfig::new("web").with_output_file(&path);
    let outcome = TableSynchronizer::new(&table, &config)
        .sync(&addrs(&["198.51.100.5", "203.0.113.9", "2001:db8::1"]))
        .await;

    assert_eq!(report(outcome).file, Some(FileOutcome::Written));
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "198.51.100.5\n203.0.113.9\n2001:db8::1\n"
    );
    assert_eq!(
        table.commands(),
        vec![(
            "web".to_string(),
            TableCommand::Replace(addrs(&["198.51.100.5", "203.0.113.9", "2001:db8::1"]))
        )]
    );
}

#[tokio::test]
async fn empty_with_never_flush_touches_nothing() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("hosts.txt");
    fs::write(&path, "192.0.2.1\n").unwrap();

    let table = RecordingTable::new();
    let config = UpdateConfig::new("web")
        .with_output_file(&path)
        .with_policy(UpdatePolicy {
            never_flush: true,
            preserve: false,
        });
    let outcome = TableSynchronizer::new(&table, &config).sync(&[]).await;

    assert_eq!(outcome, SyncOutcome::Skipped);
    assert_eq!(fs::read_to_string(&path).unwrap(), "192.0.2.1\n");
    assert_eq!(table.command_count(), 0);
}

#[tokio::test]
async fn empty_with_preserve_touches_nothing() {
    let table = RecordingTable::new();
    let config = UpdateConfig::new("web").with_policy(UpdatePolicy {
        never_flush: false,
        preserve: true,
    });
    let outcome = TableSynchronizer::new(&table, &config).sync(&[]).await;

    assert_eq!(outcome, SyncOutcome::Skipped);
    assert_eq!(table.command_count(), 0);
}

#[tokio::test]
async fn empty_without_policy_flushes_table_and_empties_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("hosts.txt");
    fs::write(&path, "192.0.2.1\n").unwrap();

    let table = RecordingTable::new();
    let config = UpdateConfig::new("web").with_output_file(&path);
    let outcome = TableSynchronizer::new(&table, &config).sync(&[]).await;

    let report = report(outcome);
    assert_eq!(report.file, Some(FileOutcome::Written));
    assert_eq!(fs::read_to_string(&path).unwrap(), "");
    assert_eq!(table.commands(), vec![("web".to_string(), TableCommand::Flush)]);
}

#[tokio::test]
async fn preserve_adds_instead_of_replacing() {
    let table = RecordingTable::new();
    let config = UpdateConfig::new("web").with_policy(UpdatePolicy {
        never_flush: false,
        preserve: true,
    });
    TableSynchronizer::new(&table, &config)
        .sync(&addrs(&["192.0.2.1"]))
        .await;

    assert_eq!(
        table.commands(),
        vec![("web".to_string(), TableCommand::Add(addrs(&["192.0.2.1"])))]
    );
}

#[tokio::test]
async fn file_failure_does_not_block_table() {
    let dir = tempdir().unwrap();
    // a non-empty directory where the file should be: rename over it fails
    let path = dir.path().join("hosts.txt");
    fs::create_dir(&path).unwrap();
    fs::write(path.join("inner"), "x").unwrap();

    let table = RecordingTable::new();
    // built directly: validate() would reject a directory path up front
    let mut config = UpdateConfig::new("web");
    config.output_file = Some(path.clone());
    let outcome = TableSynchronizer::new(&table, &config)
        .sync(&addrs(&["192.0.2.1"]))
        .await;

    let report = report(outcome);
    assert!(matches!(report.file, Some(FileOutcome::Failed(_))));
    assert_eq!(table.command_count(), 1);
    // no temporary file is left next to the target
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[tokio::test]
async fn dry_run_writes_and_runs_nothing() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("hosts.txt");

    let table = RecordingTable::new();
    let config = UpdateConfig::new("web")
        .with_output_file(&path)
        .with_dry_run(true);
    let outcome = TableSynchronizer::new(&table, &config)
        .sync(&addrs(&["192.0.2.1"]))
        .await;

    let report = report(outcome);
    assert_eq!(report.file, Some(FileOutcome::WouldWrite));
    assert_eq!(
        report.table,
        TableOutcome::WouldRun(TableCommand::Replace(addrs(&["192.0.2.1"])))
    );
    assert!(!path.exists());
    assert_eq!(table.command_count(), 0);
}

#[tokio::test]
async fn collaborator_exit_status_is_passed_through() {
    let table = RecordingTable::new().exiting_with(1);
    let config = UpdateConfig::new("web");
    let outcome = TableSynchronizer::new(&table, &config)
        .sync(&addrs(&["192.0.2.1"]))
        .await;

    match report(outcome).table {
        TableOutcome::Applied { status, .. } => assert_eq!(status.exit_code, Some(1)),
        other => panic!("unexpected table outcome: {:?}", other),
    }
}

#[tokio::test]
async fn unavailable_collaborator_is_reported() {
    let table = RecordingTable::new().unavailable();
    let config = UpdateConfig::new("web");
    let outcome = TableSynchronizer::new(&table, &config)
        .sync(&addrs(&["192.0.2.1"]))
        .await;

    assert!(matches!(report(outcome).table, TableOutcome::Failed(_)));
}
