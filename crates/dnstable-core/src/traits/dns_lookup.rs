// # DNS Lookup Trait
//
// Defines the interface for issuing single DNS queries against a resolver.
//
// ## Implementations
//
// - Hickory: `dnstable-resolver-hickory` crate
// - Tests: scripted in-memory zones
//
// ## Usage
//
// ```rust,ignore
// use dnstable_core::traits::{DnsLookup, QueryType};
//
// let records = lookup.query("example.com", QueryType::Cname).await?;
// for record in records {
//     println!("{} -> {:?}", record.owner, record.data);
// }
// ```

use async_trait::async_trait;
use std::fmt;
use std::net::IpAddr;

/// Record types the resolver pipeline asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryType {
    /// IPv4 address record
    A,
    /// IPv6 address record
    Aaaa,
    /// Alias record
    Cname,
    /// Service location record
    Srv,
}

impl QueryType {
    /// Wire name of the record type
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryType::A => "A",
            QueryType::Aaaa => "AAAA",
            QueryType::Cname => "CNAME",
            QueryType::Srv => "SRV",
        }
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed payload of an answer record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordData {
    /// CNAME: the canonical name the owner points to
    Cname(String),
    /// A or AAAA: a concrete address
    Address(IpAddr),
    /// SRV: the host providing the service
    ServiceTarget {
        /// Target host name
        target: String,
        /// Service port
        port: u16,
        /// Priority (lower is preferred)
        priority: u16,
        /// Relative weight among equal priorities
        weight: u16,
    },
}

/// One DNS answer entry
///
/// Names are stored lower-cased without the trailing root dot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRecord {
    /// Owner name of the record
    pub owner: String,
    /// Typed record payload
    pub data: RecordData,
}

impl ResourceRecord {
    /// Create a new record, normalizing the owner name
    pub fn new(owner: impl AsRef<str>, data: RecordData) -> Self {
        Self {
            owner: normalize_name(owner.as_ref()),
            data,
        }
    }

    /// CNAME record
    pub fn cname(owner: impl AsRef<str>, target: impl AsRef<str>) -> Self {
        Self::new(owner, RecordData::Cname(normalize_name(target.as_ref())))
    }

    /// A or AAAA record, depending on the address family
    pub fn address(owner: impl AsRef<str>, addr: IpAddr) -> Self {
        Self::new(owner, RecordData::Address(addr))
    }

    /// SRV record
    pub fn service_target(
        owner: impl AsRef<str>,
        target: impl AsRef<str>,
        port: u16,
        priority: u16,
        weight: u16,
    ) -> Self {
        Self::new(
            owner,
            RecordData::ServiceTarget {
                target: normalize_name(target.as_ref()),
                port,
                priority,
                weight,
            },
        )
    }
}

/// Lower-case a DNS name and strip the trailing root dot
///
/// The root name itself (`.`) normalizes to the empty string.
pub fn normalize_name(name: &str) -> String {
    name.strip_suffix('.').unwrap_or(name).to_ascii_lowercase()
}

/// Trait for DNS resolver adapters
///
/// One call issues exactly one query of the given type. Implementations
/// must not cache, retry beyond their library's own policy, or follow
/// CNAME chains on behalf of the caller: recursion and memoization are
/// owned by [`crate::resolver::ResolverContext`].
///
/// # Failure Semantics
///
/// - An authoritative "no such record" or "no such name" should be
///   returned as `Ok(vec![])`.
/// - Timeouts and transport errors should be returned as
///   [`crate::Error::Lookup`]. The caller treats both the same way
///   (zero answers) but logs the difference.
#[async_trait]
pub trait DnsLookup: Send + Sync {
    /// Issue one query of type `query_type` for `name`
    async fn query(
        &self,
        name: &str,
        query_type: QueryType,
    ) -> Result<Vec<ResourceRecord>, crate::Error>;

    /// Get the adapter name (for logging/debugging)
    fn lookup_name(&self) -> &'static str;
}
