//! Recursive address resolution
//!
//! [`ResolverContext`] turns a domain name into the set of concrete
//! addresses it ends up at, following CNAME chains to any depth.
//!
//! ## Per-run state
//!
//! The context is created once per run and owns:
//! - the **cache**: name → final address set, written once a name has been
//!   fully resolved; a cached name is never queried again
//! - the **in-progress set**: names whose resolution has started but not
//!   finished; re-entering one of them is a CNAME cycle
//!
//! Nothing here outlives the run.
//!
//! ## Query order
//!
//! For a cache miss: CNAME, then A (if IPv4 is wanted), then AAAA (if IPv6
//! is wanted). A failed query counts as "no answer" for that type only.

mod srv;

pub use srv::srv_query_name;

use std::collections::{BTreeSet, HashMap, HashSet};
use std::future::Future;
use std::net::IpAddr;
use std::pin::Pin;

use tracing::{debug, trace};

use crate::config::IpVersion;
use crate::error::{Error, Result};
use crate::target::parse_literal;
use crate::traits::{DnsLookup, QueryType, RecordData, ResourceRecord, normalize_name};

/// Boxed future returned by the recursive resolver
pub type ResolveFuture<'s> = Pin<Box<dyn Future<Output = Result<BTreeSet<IpAddr>>> + Send + 's>>;

/// Resolution state for a single run
pub struct ResolverContext<'a> {
    /// Resolver adapter used for every query
    lookup: &'a dyn DnsLookup,

    /// Address families to keep
    version: IpVersion,

    /// Fully resolved names
    cache: HashMap<String, BTreeSet<IpAddr>>,

    /// Names currently being resolved
    in_progress: HashSet<String>,

    /// Number of queries sent to the adapter
    queries_issued: usize,
}

impl<'a> ResolverContext<'a> {
    /// Create a fresh context with an empty cache
    pub fn new(lookup: &'a dyn DnsLookup, version: IpVersion) -> Self {
        Self {
            lookup,
            version,
            cache: HashMap::new(),
            in_progress: HashSet::new(),
            queries_issued: 0,
        }
    }

    /// Number of queries sent to the adapter so far
    pub fn queries_issued(&self) -> usize {
        self.queries_issued
    }

    /// Number of names in the cache
    pub fn cached_names(&self) -> usize {
        self.cache.len()
    }

    /// Resolve `name` to its final addresses
    ///
    /// A literal address resolves to itself without a query. Otherwise the
    /// cache is consulted first; on a miss, CNAME targets are resolved
    /// recursively and unioned with the name's own A/AAAA answers.
    ///
    /// # Errors
    ///
    /// [`Error::CnameCycle`] when a CNAME chain leads back to a name that
    /// is still being resolved. DNS failures are never errors.
    pub fn resolve<'s>(&'s mut self, name: &'s str) -> ResolveFuture<'s> {
        Box::pin(async move {
            if let Some(addr) = parse_literal(name) {
                return Ok(BTreeSet::from([addr]));
            }

            let key = normalize_name(name);
            if let Some(cached) = self.cache.get(&key) {
                trace!("Cache hit for {} ({} addresses)", key, cached.len());
                return Ok(cached.clone());
            }

            if !self.in_progress.insert(key.clone()) {
                return Err(Error::cname_cycle(key));
            }

            let result = self.resolve_uncached(&key).await;
            self.in_progress.remove(&key);
            let addrs = result?;

            debug!("Resolved {} to {} address(es)", key, addrs.len());
            self.cache.insert(key, addrs.clone());
            Ok(addrs)
        })
    }

    /// Query a name that is neither cached nor literal
    async fn resolve_uncached(&mut self, name: &str) -> Result<BTreeSet<IpAddr>> {
        let mut query_types = vec![QueryType::Cname];
        if self.version.includes_v4() {
            query_types.push(QueryType::A);
        }
        if self.version.includes_v6() {
            query_types.push(QueryType::Aaaa);
        }

        let mut aliases = BTreeSet::new();
        let mut addrs = BTreeSet::new();

        for query_type in query_types {
            for record in self.query(name, query_type).await {
                match record.data {
                    RecordData::Cname(target) if !target.is_empty() => {
                        aliases.insert(target);
                    }
                    RecordData::Address(addr) if self.version.accepts(&addr) => {
                        addrs.insert(addr);
                    }
                    _ => {}
                }
            }
        }

        for alias in aliases {
            trace!("Following CNAME {} -> {}", name, alias);
            addrs.extend(self.resolve(&alias).await?);
        }

        Ok(addrs)
    }

    /// Issue one query, degrading failures to an empty answer
    pub(crate) async fn query(&mut self, name: &str, query_type: QueryType) -> Vec<ResourceRecord> {
        self.queries_issued += 1;

        match self.lookup.query(name, query_type).await {
            Ok(records) => {
                debug!(
                    "{} {} query via {}: {} answer(s)",
                    name,
                    query_type,
                    self.lookup.lookup_name(),
                    records.len()
                );
                records
            }
            Err(e) => {
                debug!(
                    "{} {} query via {} failed, treating as no answer: {}",
                    name,
                    query_type,
                    self.lookup.lookup_name(),
                    e
                );
                Vec::new()
            }
        }
    }
}
