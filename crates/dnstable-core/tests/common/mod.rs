//! Test doubles and common utilities for contract tests
//!
//! This module provides minimal test doubles for the two collaborators:
//! a scripted DNS zone and a table control that records commands.

#![allow(dead_code)]

use dnstable_core::error::{Error, Result};
use dnstable_core::traits::{
    DnsLookup, QueryType, RecordData, ResourceRecord, TableCommand, TableControl, TableStatus,
};
use std::collections::{HashMap, HashSet};
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// An in-memory zone answering from scripted records
///
/// Clones share records and counters, so a test can keep one handle while
/// the engine owns another.
#[derive(Clone, Default)]
pub struct MockZone {
    /// Records by owner name
    records: Arc<Mutex<HashMap<String, Vec<ResourceRecord>>>>,
    /// (name, type) pairs that fail with a lookup error
    failing: Arc<Mutex<HashSet<(String, QueryType)>>>,
    /// Every query received, in order
    queries: Arc<Mutex<Vec<(String, QueryType)>>>,
    /// Total query count
    query_count: Arc<AtomicUsize>,
}

impl MockZone {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, record: ResourceRecord) -> &Self {
        self.records
            .lock()
            .unwrap()
            .entry(record.owner.clone())
            .or_default()
            .push(record);
        self
    }

    /// Add an A or AAAA record
    pub fn address(&self, owner: &str, addr: &str) -> &Self {
        let addr: IpAddr = addr.parse().expect("valid test address");
        self.push(ResourceRecord::address(owner, addr))
    }

    /// Add a CNAME record
    pub fn cname(&self, owner: &str, target: &str) -> &Self {
        self.push(ResourceRecord::cname(owner, target))
    }

    /// Add an SRV record
    pub fn srv(&self, owner: &str, target: &str, port: u16) -> &Self {
        self.push(ResourceRecord::service_target(owner, target, port, 10, 5))
    }

    /// Make every query of `query_type` for `name` fail
    pub fn fail(&self, name: &str, query_type: QueryType) -> &Self {
        self.failing
            .lock()
            .unwrap()
            .insert((name.to_string(), query_type));
        self
    }

    /// Total number of queries received
    pub fn query_count(&self) -> usize {
        self.query_count.load(Ordering::SeqCst)
    }

    /// Number of queries received for one (name, type)
    pub fn queries_for(&self, name: &str, query_type: QueryType) -> usize {
        self.queries
            .lock()
            .unwrap()
            .iter()
            .filter(|(n, t)| n == name && *t == query_type)
            .count()
    }

    /// Number of queries received for a name, all types
    pub fn queries_for_name(&self, name: &str) -> usize {
        self.queries
            .lock()
            .unwrap()
            .iter()
            .filter(|(n, _)| n == name)
            .count()
    }
}

/// Like a recursive resolver, an alias answers every query type
fn answers(record: &ResourceRecord, query_type: QueryType) -> bool {
    match (&record.data, query_type) {
        (RecordData::Cname(_), _) => true,
        (RecordData::Address(IpAddr::V4(_)), QueryType::A) => true,
        (RecordData::Address(IpAddr::V6(_)), QueryType::Aaaa) => true,
        (RecordData::ServiceTarget { .. }, QueryType::Srv) => true,
        _ => false,
    }
}

#[async_trait::async_trait]
impl DnsLookup for MockZone {
    async fn query(&self, name: &str, query_type: QueryType) -> Result<Vec<ResourceRecord>> {
        self.query_count.fetch_add(1, Ordering::SeqCst);
        self.queries
            .lock()
            .unwrap()
            .push((name.to_string(), query_type));

        if self
            .failing
            .lock()
            .unwrap()
            .contains(&(name.to_string(), query_type))
        {
            return Err(Error::lookup(format!("{} {}: timed out", name, query_type)));
        }

        let records = self.records.lock().unwrap();
        Ok(records
            .get(name)
            .map(|list| {
                list.iter()
                    .filter(|r| answers(r, query_type))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn lookup_name(&self) -> &'static str {
        "mock"
    }
}

/// A table control that records every command
#[derive(Clone)]
pub struct RecordingTable {
    /// Commands received, with the table name
    commands: Arc<Mutex<Vec<(String, TableCommand)>>>,
    /// Exit code reported for every command
    exit_code: Option<i32>,
    /// Fail to "spawn" instead of running
    unavailable: bool,
}

impl RecordingTable {
    pub fn new() -> Self {
        Self {
            commands: Arc::new(Mutex::new(Vec::new())),
            exit_code: Some(0),
            unavailable: false,
        }
    }

    /// Report this exit code for every command
    pub fn exiting_with(mut self, code: i32) -> Self {
        self.exit_code = Some(code);
        self
    }

    /// Behave like a missing binary
    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    /// Commands received so far
    pub fn commands(&self) -> Vec<(String, TableCommand)> {
        self.commands.lock().unwrap().clone()
    }

    /// Number of commands received
    pub fn command_count(&self) -> usize {
        self.commands.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl TableControl for RecordingTable {
    async fn apply(&self, table: &str, command: &TableCommand) -> Result<TableStatus> {
        if self.unavailable {
            return Err(Error::table_control("recording", "No such file or directory"));
        }
        self.commands
            .lock()
            .unwrap()
            .push((table.to_string(), command.clone()));
        Ok(TableStatus {
            exit_code: self.exit_code,
        })
    }

    fn control_name(&self) -> &'static str {
        "recording"
    }
}

/// Shorthand for an owned address list
pub fn addrs(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}
