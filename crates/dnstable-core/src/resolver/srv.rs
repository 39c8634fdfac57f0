//! SRV target lookup

use std::collections::BTreeSet;

use tracing::debug;

use super::ResolverContext;
use crate::target::Transport;
use crate::traits::{QueryType, RecordData};

/// Build the owner name of an SRV record set: `_<service>._<transport>.<name>`
pub fn srv_query_name(name: &str, service: &str, transport: Transport) -> String {
    format!("_{}._{}.{}", service, transport, name)
}

impl ResolverContext<'_> {
    /// Resolve a service to the host names that provide it
    ///
    /// Collects the target of every SRV answer and of every CNAME answer.
    /// A failed or empty lookup yields an empty set; the caller is expected
    /// to fall back to the base name. Targets of `.` ("service decidedly
    /// not available") are dropped.
    pub async fn resolve_srv(
        &mut self,
        name: &str,
        service: &str,
        transport: Transport,
    ) -> BTreeSet<String> {
        let query_name = srv_query_name(name, service, transport);
        let mut hosts = BTreeSet::new();

        for record in self.query(&query_name, QueryType::Srv).await {
            match record.data {
                RecordData::ServiceTarget { target, .. } | RecordData::Cname(target)
                    if !target.is_empty() =>
                {
                    hosts.insert(target);
                }
                _ => {}
            }
        }

        debug!("{} has {} SRV target(s)", query_name, hosts.len());
        hosts
    }
}
