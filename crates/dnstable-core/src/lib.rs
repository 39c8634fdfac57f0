// # dnstable-core
//
// Core library for resolving DNS-derived targets into a firewall address
// table.
//
// ## Architecture Overview
//
// - **Target**: Classifies input tokens (literal address, domain, service spec)
// - **ResolverContext**: Recursive CNAME/A/AAAA resolution with a per-run cache,
//   plus SRV target lookup
// - **AddressSetBuilder**: Deduplicated, deterministically ordered address list
// - **TableSynchronizer**: Minimal update of the output file and the table
// - **UpdateEngine**: One-shot orchestration of the above
// - **DnsLookup** / **TableControl**: Traits for the two external collaborators
//
// ## Design Principles
//
// 1. **Fail Fast**: Every token is validated before the first query
// 2. **Graceful Degradation**: A failed DNS query is an empty answer
// 3. **Determinism**: Identical DNS data gives byte-identical output
// 4. **Idempotency**: Unchanged output means no file write
// 5. **Library-First**: The binary only parses flags and wires collaborators

pub mod builder;
pub mod config;
pub mod engine;
pub mod error;
pub mod resolver;
pub mod sync;
pub mod target;
pub mod traits;

// Re-export core types for convenience
pub use builder::{AddressSet, AddressSetBuilder};
pub use config::{IpVersion, ResolverSettings, UpdateConfig, UpdatePolicy};
pub use engine::{RunSummary, UpdateEngine};
pub use error::{Error, Result, TargetField};
pub use resolver::ResolverContext;
pub use sync::{FileOutcome, SyncOutcome, SyncReport, TableOutcome, TableSynchronizer};
pub use target::{ServiceSpec, Target, Transport};
pub use traits::{
    DnsLookup, QueryType, RecordData, ResourceRecord, TableCommand, TableControl, TableStatus,
};
