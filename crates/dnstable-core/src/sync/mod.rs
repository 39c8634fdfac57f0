//! Table and file synchronization
//!
//! [`TableSynchronizer`] takes the final address list and makes the
//! output file and the firewall table match it, doing as little as
//! possible:
//!
//! ```text
//!              addresses empty && flush forbidden?
//!                 │yes                     │no
//!                 ▼                        ▼
//!             Skipped            file configured? ── read, compare ──┐
//!                                                   equal: Unchanged │
//!                                                   else:  temp+rename
//!                                                          │
//!                                                          ▼
//!                                    table: replace | add | flush | skip
//! ```
//!
//! File failures are warnings and never stop the table step. In dry-run
//! mode nothing is written and no command is run; the outcomes describe
//! what would have happened.

pub mod file;

pub use file::{OutputFile, render};

use tracing::{error, info, warn};

use crate::config::UpdateConfig;
use crate::traits::{TableCommand, TableControl, TableStatus};

/// Result of one synchronization
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Nothing resolved and flushing is forbidden; nothing was touched
    Skipped,
    /// File and table steps ran
    Synced(SyncReport),
}

/// Per-step results of a synchronization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    /// File step result, `None` if no file is configured
    pub file: Option<FileOutcome>,
    /// Table step result
    pub table: TableOutcome,
}

/// Output file step result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// New content was written
    Written,
    /// Existing content already matched
    Unchanged,
    /// Dry run: content differs and would be written
    WouldWrite,
    /// Reading or writing failed (reported as a warning)
    Failed(String),
}

/// Table step result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableOutcome {
    /// The command was run; the collaborator's status is passed through
    Applied {
        /// Command that was run
        command: TableCommand,
        /// What the collaborator reported
        status: TableStatus,
    },
    /// Nothing to add and the table must be preserved
    Skipped,
    /// Dry run: this command would have been run
    WouldRun(TableCommand),
    /// The collaborator could not be run at all
    Failed(String),
}

impl TableOutcome {
    /// Command that was (or would have been) sent, if any
    pub fn command(&self) -> Option<&TableCommand> {
        match self {
            TableOutcome::Applied { command, .. } | TableOutcome::WouldRun(command) => {
                Some(command)
            }
            TableOutcome::Skipped | TableOutcome::Failed(_) => None,
        }
    }
}

/// Applies an address list to the output file and the firewall table
pub struct TableSynchronizer<'a> {
    control: &'a dyn TableControl,
    config: &'a UpdateConfig,
}

impl<'a> TableSynchronizer<'a> {
    /// Create a synchronizer for the configured table
    pub fn new(control: &'a dyn TableControl, config: &'a UpdateConfig) -> Self {
        Self { control, config }
    }

    /// Make file and table match `addresses`
    pub async fn sync(&self, addresses: &[String]) -> SyncOutcome {
        if addresses.is_empty() && self.config.policy.forbids_flush() {
            info!(
                "No addresses resolved for table {}, leaving table and file untouched",
                self.config.table
            );
            return SyncOutcome::Skipped;
        }

        let file = match &self.config.output_file {
            Some(path) => Some(self.sync_file(&OutputFile::new(path), addresses).await),
            None => None,
        };

        let table = self.sync_table(addresses).await;

        SyncOutcome::Synced(SyncReport { file, table })
    }

    /// File step: compare, then write atomically if different
    async fn sync_file(&self, output: &OutputFile, addresses: &[String]) -> FileOutcome {
        let candidate = render(addresses);

        let existing = match output.read().await {
            Ok(content) => content.unwrap_or_default(),
            Err(e) => {
                warn!("{}; rewriting it", e);
                if self.config.dry_run {
                    return FileOutcome::WouldWrite;
                }
                return self.write_file(output, &candidate).await;
            }
        };

        if existing == candidate {
            info!(
                "Output file {} already up to date ({} address(es))",
                output.path().display(),
                addresses.len()
            );
            return FileOutcome::Unchanged;
        }

        if self.config.dry_run {
            info!(
                "Dry run: would write {} address(es) to {}",
                addresses.len(),
                output.path().display()
            );
            return FileOutcome::WouldWrite;
        }

        self.write_file(output, &candidate).await
    }

    async fn write_file(&self, output: &OutputFile, candidate: &str) -> FileOutcome {
        match output.write_atomic(candidate).await {
            Ok(()) => {
                info!("Output file {} updated", output.path().display());
                FileOutcome::Written
            }
            Err(e) => {
                warn!("{}", e);
                FileOutcome::Failed(e.to_string())
            }
        }
    }

    /// Table step: pick the command and run it
    async fn sync_table(&self, addresses: &[String]) -> TableOutcome {
        let table = &self.config.table;

        let command = match (addresses.is_empty(), self.config.policy.preserve) {
            (false, false) => TableCommand::Replace(addresses.to_vec()),
            (false, true) => TableCommand::Add(addresses.to_vec()),
            (true, true) => {
                info!("Nothing to add to table {}, preserving it", table);
                return TableOutcome::Skipped;
            }
            (true, false) => TableCommand::Flush,
        };

        if self.config.dry_run {
            info!("Dry run: would run '{}' on table {}", command, table);
            return TableOutcome::WouldRun(command);
        }

        match self.control.apply(table, &command).await {
            Ok(status) => {
                if status.success() {
                    info!(
                        "Table {}: {} ({} address(es))",
                        table,
                        command.verb(),
                        command.addresses().len()
                    );
                } else {
                    warn!(
                        "{} {} on table {} exited with {:?}",
                        self.control.control_name(),
                        command.verb(),
                        table,
                        status.exit_code
                    );
                }
                TableOutcome::Applied { command, status }
            }
            Err(e) => {
                error!("Failed to update table {}: {}", table, e);
                TableOutcome::Failed(e.to_string())
            }
        }
    }
}
