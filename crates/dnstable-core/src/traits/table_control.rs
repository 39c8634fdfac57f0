// # Table Control Trait
//
// Defines the interface to the packet filter's named address tables.
//
// ## Implementations
//
// - pfctl: `dnstable-table-pfctl` crate
//
// The table itself is never read. Its state only matters through the
// semantics of the command sent: `replace` makes the table equal to the
// given list, `add` only grows it, `flush` empties it.

use async_trait::async_trait;
use std::fmt;

/// Command sent to a named address table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableCommand {
    /// Make the table contain exactly these addresses
    Replace(Vec<String>),
    /// Add these addresses, keeping existing entries
    Add(Vec<String>),
    /// Remove every address from the table
    Flush,
}

impl TableCommand {
    /// Command verb as understood by the firewall utility
    pub fn verb(&self) -> &'static str {
        match self {
            TableCommand::Replace(_) => "replace",
            TableCommand::Add(_) => "add",
            TableCommand::Flush => "flush",
        }
    }

    /// Addresses carried by the command
    pub fn addresses(&self) -> &[String] {
        match self {
            TableCommand::Replace(addrs) | TableCommand::Add(addrs) => addrs,
            TableCommand::Flush => &[],
        }
    }
}

impl fmt::Display for TableCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.verb())?;
        for addr in self.addresses() {
            write!(f, " {}", addr)?;
        }
        Ok(())
    }
}

/// What the collaborator reported after running a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableStatus {
    /// Process exit code, `None` if terminated by a signal
    pub exit_code: Option<i32>,
}

impl TableStatus {
    /// Whether the collaborator exited with status 0
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Trait for firewall table collaborators
///
/// # Contract
///
/// - One call runs one command against one table.
/// - The exit status is passed through untouched; output is not parsed.
/// - `Err` is reserved for failing to run the collaborator at all
///   (missing binary, permission denied on exec).
#[async_trait]
pub trait TableControl: Send + Sync {
    /// Run `command` against `table`
    async fn apply(
        &self,
        table: &str,
        command: &TableCommand,
    ) -> Result<TableStatus, crate::Error>;

    /// Get the collaborator name (for logging/debugging)
    fn control_name(&self) -> &'static str;
}
