// # Hickory DNS Lookup
//
// This crate provides the [`DnsLookup`] adapter backed by hickory-resolver.
//
// ## Behavior
//
// - One `query` call is one lookup of one record type
// - Names are sent fully qualified, so search domains never apply
// - "No such name" and "no records of this type" are empty answers
// - Timeouts and transport failures are [`Error::Lookup`]
// - Answer records of other types (e.g. the CNAME in front of an A answer)
//   are passed through; the core resolver knows what to do with them
//
// ## Not Done Here
//
// - CNAME chasing across calls (owned by `ResolverContext`)
// - Caching beyond hickory's own per-resolver cache
// - Retries beyond the configured attempt count
//
// ## Configuration
//
// With no explicit nameservers the system configuration
// (`/etc/resolv.conf`) is used. Explicit nameservers are queried over
// plain UDP/TCP on port 53.

use async_trait::async_trait;
use dnstable_core::traits::{DnsLookup, QueryType, RecordData, ResourceRecord};
use dnstable_core::{Error, ResolverSettings, Result};
use hickory_resolver::Resolver;
use hickory_resolver::config::{NameServerConfigGroup, ResolverConfig, ResolverOpts};
use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::proto::rr::{Name, RData, Record, RecordType};
use std::net::IpAddr;

/// Port used for explicitly configured nameservers
const NAMESERVER_PORT: u16 = 53;

/// DNS lookup adapter backed by a hickory stub resolver
pub struct HickoryLookup {
    resolver: Resolver<TokioConnectionProvider>,
}

impl std::fmt::Debug for HickoryLookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HickoryLookup").finish_non_exhaustive()
    }
}

impl HickoryLookup {
    /// Build a resolver from the given settings
    ///
    /// # Errors
    ///
    /// [`Error::Lookup`] if the system resolver configuration cannot be
    /// read (only when no explicit nameservers are given). This is an
    /// environment failure, not a validation error.
    pub fn from_settings(settings: &ResolverSettings) -> Result<Self> {
        let mut opts = ResolverOpts::default();
        opts.timeout = settings.timeout;
        opts.attempts = settings.attempts;

        let builder = if settings.nameservers.is_empty() {
            Resolver::builder_tokio().map_err(|e| {
                Error::lookup(format!("Failed to read system resolver configuration: {}", e))
            })?
        } else {
            let group = NameServerConfigGroup::from_ips_clear(
                &settings.nameservers,
                NAMESERVER_PORT,
                true,
            );
            Resolver::builder_with_config(
                ResolverConfig::from_parts(None, vec![], group),
                TokioConnectionProvider::default(),
            )
        };

        tracing::debug!(
            "Hickory resolver: nameservers={}, timeout={:?}, attempts={}",
            describe_nameservers(&settings.nameservers),
            settings.timeout,
            settings.attempts
        );

        Ok(Self {
            resolver: builder.with_options(opts).build(),
        })
    }
}

#[async_trait]
impl DnsLookup for HickoryLookup {
    async fn query(&self, name: &str, query_type: QueryType) -> Result<Vec<ResourceRecord>> {
        let fqdn = to_fqdn(name)?;

        match self.resolver.lookup(fqdn, record_type(query_type)).await {
            Ok(lookup) => Ok(lookup.record_iter().filter_map(convert_record).collect()),
            Err(e) if e.is_no_records_found() => {
                tracing::trace!("{} {}: no records", name, query_type);
                Ok(Vec::new())
            }
            Err(e) => Err(Error::lookup(format!("{} {}: {}", name, query_type, e))),
        }
    }

    fn lookup_name(&self) -> &'static str {
        "hickory"
    }
}

/// Parse a name and mark it fully qualified
fn to_fqdn(name: &str) -> Result<Name> {
    let mut fqdn = Name::from_ascii(name)
        .map_err(|e| Error::lookup(format!("Invalid DNS name '{}': {}", name, e)))?;
    fqdn.set_fqdn(true);
    Ok(fqdn)
}

/// Map a pipeline query type to the wire record type
fn record_type(query_type: QueryType) -> RecordType {
    match query_type {
        QueryType::A => RecordType::A,
        QueryType::Aaaa => RecordType::AAAA,
        QueryType::Cname => RecordType::CNAME,
        QueryType::Srv => RecordType::SRV,
    }
}

/// Convert a hickory answer record; unrelated record types are dropped
fn convert_record(record: &Record) -> Option<ResourceRecord> {
    let owner = record.name().to_string();

    let data = match record.data() {
        RData::A(a) => RecordData::Address(IpAddr::V4(a.0)),
        RData::AAAA(aaaa) => RecordData::Address(IpAddr::V6(aaaa.0)),
        RData::CNAME(cname) => return Some(ResourceRecord::cname(owner, cname.0.to_string())),
        RData::SRV(srv) => {
            return Some(ResourceRecord::service_target(
                owner,
                srv.target().to_string(),
                srv.port(),
                srv.priority(),
                srv.weight(),
            ));
        }
        _ => return None,
    };

    Some(ResourceRecord::new(owner, data))
}

fn describe_nameservers(nameservers: &[IpAddr]) -> String {
    if nameservers.is_empty() {
        return "system".to_string();
    }
    nameservers
        .iter()
        .map(|ip| ip.to_string())
        .collect::<Vec<_>>()
        .join(",")
}
