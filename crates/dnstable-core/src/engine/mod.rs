//! One-shot update engine
//!
//! The UpdateEngine is responsible for:
//! - Validating configuration and every target before anything happens
//! - Resolving targets into the ordered address list
//! - Synchronizing the output file and the firewall table
//!
//! ## Architecture
//!
//! ```text
//!  tokens ──► classify_all ──► AddressSetBuilder ──► TableSynchronizer
//!                 │                    │                   │        │
//!            (fail fast)          ┌────▼─────┐        ┌────▼───┐ ┌──▼──────────┐
//!                                 │ DnsLookup│        │  file  │ │TableControl │
//!                                 └──────────┘        └────────┘ └─────────────┘
//! ```
//!
//! ## Run Flow
//!
//! 1. Classify all tokens; any invalid token aborts the run
//! 2. Build the address list (a CNAME cycle aborts the run)
//! 3. Synchronize file and table
//! 4. Return a summary for the caller to report

use crate::builder::AddressSetBuilder;
use crate::config::UpdateConfig;
use crate::error::{Error, Result};
use crate::sync::{SyncOutcome, TableSynchronizer};
use crate::target::classify_all;
use crate::traits::{DnsLookup, TableControl};
use tracing::{debug, info};

/// What a run did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Final ordered address list
    pub addresses: Vec<String>,
    /// Number of DNS queries issued
    pub queries_issued: usize,
    /// Synchronization result
    pub outcome: SyncOutcome,
}

/// Core update engine
///
/// Owns the two collaborators and the configuration. Each call to
/// [`UpdateEngine::run`] starts with an empty DNS cache.
pub struct UpdateEngine {
    /// Resolver adapter
    lookup: Box<dyn DnsLookup>,

    /// Firewall table collaborator
    control: Box<dyn TableControl>,

    /// Update configuration
    config: UpdateConfig,
}

impl UpdateEngine {
    /// Create a new engine
    ///
    /// # Errors
    ///
    /// [`Error::Config`] if the table name or output path is invalid.
    pub fn new(
        lookup: Box<dyn DnsLookup>,
        control: Box<dyn TableControl>,
        config: UpdateConfig,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            lookup,
            control,
            config,
        })
    }

    /// Engine configuration
    pub fn config(&self) -> &UpdateConfig {
        &self.config
    }

    /// Resolve `tokens` and synchronize the table
    ///
    /// # Errors
    ///
    /// Validation errors only: no tokens, an invalid token, or a CNAME
    /// cycle. All of them are raised before the file or table is touched.
    pub async fn run<S: AsRef<str>>(&self, tokens: &[S]) -> Result<RunSummary> {
        if tokens.is_empty() {
            return Err(Error::config("At least one target is required"));
        }

        let targets = classify_all(tokens)?;
        debug!("Classified {} target(s)", targets.len());

        let mut builder = AddressSetBuilder::new(&*self.lookup, self.config.version);
        for target in &targets {
            builder.add_target(target).await?;
        }
        let queries_issued = builder.resolver().queries_issued();
        let addresses = builder.finish();

        info!(
            "Resolved {} target(s) to {} address(es) with {} DNS quer{}",
            targets.len(),
            addresses.len(),
            queries_issued,
            if queries_issued == 1 { "y" } else { "ies" }
        );

        let outcome = TableSynchronizer::new(&*self.control, &self.config)
            .sync(&addresses)
            .await;

        Ok(RunSummary {
            addresses,
            queries_issued,
            outcome,
        })
    }
}
