//! Core traits for the dnstable system
//!
//! This module defines the abstract interfaces to the two external
//! collaborators.
//!
//! - [`DnsLookup`]: Issue single DNS queries against a resolver
//! - [`TableControl`]: Send commands to a firewall address table

pub mod dns_lookup;
pub mod table_control;

pub use dns_lookup::{DnsLookup, QueryType, RecordData, ResourceRecord, normalize_name};
pub use table_control::{TableCommand, TableControl, TableStatus};
