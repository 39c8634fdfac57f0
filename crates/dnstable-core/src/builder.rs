//! Address set construction
//!
//! [`AddressSetBuilder`] walks the classified targets, resolves each one
//! through a shared [`ResolverContext`] and collects the results in an
//! [`AddressSet`]. The final list is ordered so that identical DNS data
//! always produces byte-identical output: IPv4 addresses first, then IPv6,
//! each group sorted lexicographically by its text form.

use std::collections::BTreeSet;
use std::net::IpAddr;

use tracing::debug;

use crate::config::IpVersion;
use crate::error::Result;
use crate::resolver::ResolverContext;
use crate::target::Target;
use crate::traits::DnsLookup;

/// Deduplicated set of resolved addresses, kept per family
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressSet {
    v4: BTreeSet<String>,
    v6: BTreeSet<String>,
}

impl AddressSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an address, returning `false` if it was already present
    pub fn insert(&mut self, addr: IpAddr) -> bool {
        match addr {
            IpAddr::V4(v4) => self.v4.insert(v4.to_string()),
            IpAddr::V6(v6) => self.v6.insert(v6.to_string()),
        }
    }

    /// Number of addresses
    pub fn len(&self) -> usize {
        self.v4.len() + self.v6.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.v4.is_empty() && self.v6.is_empty()
    }

    /// Finalize into the canonical order
    pub fn into_ordered(self) -> Vec<String> {
        self.v4.into_iter().chain(self.v6).collect()
    }
}

impl Extend<IpAddr> for AddressSet {
    fn extend<I: IntoIterator<Item = IpAddr>>(&mut self, iter: I) {
        for addr in iter {
            self.insert(addr);
        }
    }
}

impl FromIterator<IpAddr> for AddressSet {
    fn from_iter<I: IntoIterator<Item = IpAddr>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

/// Resolves targets into one ordered address list
pub struct AddressSetBuilder<'a> {
    resolver: ResolverContext<'a>,
    addresses: AddressSet,
}

impl<'a> AddressSetBuilder<'a> {
    /// Create a builder with a fresh resolver context
    pub fn new(lookup: &'a dyn DnsLookup, version: IpVersion) -> Self {
        Self {
            resolver: ResolverContext::new(lookup, version),
            addresses: AddressSet::new(),
        }
    }

    /// The resolver context (cache and query statistics)
    pub fn resolver(&self) -> &ResolverContext<'a> {
        &self.resolver
    }

    /// Addresses collected so far
    pub fn addresses(&self) -> &AddressSet {
        &self.addresses
    }

    /// Resolve one target and add its addresses
    pub async fn add_target(&mut self, target: &Target) -> Result<()> {
        match target {
            Target::Literal(addr) => {
                self.addresses.insert(*addr);
            }
            Target::Domain(name) => {
                let addrs = self.resolver.resolve(name).await?;
                self.addresses.extend(addrs);
            }
            Target::Service(spec) => {
                for (service, transport) in spec.pairs() {
                    let hosts = self
                        .resolver
                        .resolve_srv(&spec.name, service, transport)
                        .await;
                    for host in hosts {
                        let addrs = self.resolver.resolve(&host).await?;
                        self.addresses.extend(addrs);
                    }
                }

                // the base name is always included, whatever SRV returned
                let addrs = self.resolver.resolve(&spec.name).await?;
                self.addresses.extend(addrs);
            }
        }

        debug!(
            "After {}: {} address(es) collected",
            target,
            self.addresses.len()
        );
        Ok(())
    }

    /// Finalize the collected addresses into the canonical order
    pub fn finish(self) -> Vec<String> {
        self.addresses.into_ordered()
    }

    /// Resolve every target and return the ordered address list
    pub async fn build(mut self, targets: &[Target]) -> Result<Vec<String>> {
        for target in targets {
            self.add_target(target).await?;
        }
        Ok(self.finish())
    }
}
