// # pfctl Table Control
//
// This crate drives the packet filter's named address tables through the
// `pfctl` utility.
//
// ## Invocation
//
// ```text
// pfctl [-q] -t <table> -T replace <addr>...
// pfctl [-q] -t <table> -T add <addr>...
// pfctl [-q] -t <table> -T flush
// ```
//
// `-q` is passed unless verbose mode is on, so pfctl's own chatter only
// shows up when asked for. Standard streams are inherited and the exit
// status is handed back untouched; pfctl's output is never parsed.

use async_trait::async_trait;
use dnstable_core::traits::{TableCommand, TableControl, TableStatus};
use dnstable_core::{Error, Result};
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// Default location of the pfctl binary
pub const DEFAULT_PFCTL_PATH: &str = "/sbin/pfctl";

/// Table control that spawns pfctl once per command
#[derive(Debug, Clone)]
pub struct PfctlTable {
    /// pfctl binary
    path: PathBuf,

    /// Let pfctl print its own output (drops `-q`)
    verbose: bool,
}

impl PfctlTable {
    /// Use the pfctl binary at `path`
    pub fn new(path: impl Into<PathBuf>, verbose: bool) -> Self {
        Self {
            path: path.into(),
            verbose,
        }
    }

    /// Binary that will be spawned
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for PfctlTable {
    fn default() -> Self {
        Self::new(DEFAULT_PFCTL_PATH, false)
    }
}

/// Build the pfctl argument vector for one command
pub fn build_args(table: &str, command: &TableCommand, verbose: bool) -> Vec<String> {
    let mut args = Vec::with_capacity(5 + command.addresses().len());
    if !verbose {
        args.push("-q".to_string());
    }
    args.push("-t".to_string());
    args.push(table.to_string());
    args.push("-T".to_string());
    args.push(command.verb().to_string());
    args.extend(command.addresses().iter().cloned());
    args
}

#[async_trait]
impl TableControl for PfctlTable {
    async fn apply(&self, table: &str, command: &TableCommand) -> Result<TableStatus> {
        let args = build_args(table, command, self.verbose);
        tracing::debug!("Running {} {}", self.path.display(), args.join(" "));

        let status = Command::new(&self.path)
            .args(&args)
            .status()
            .await
            .map_err(|e| {
                Error::table_control(
                    "pfctl",
                    format!("Failed to run {}: {}", self.path.display(), e),
                )
            })?;

        Ok(TableStatus {
            exit_code: status.code(),
        })
    }

    fn control_name(&self) -> &'static str {
        "pfctl"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addrs(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_replace_args() {
        let cmd = TableCommand::Replace(addrs(&["198.51.100.5", "2001:db8::1"]));
        assert_eq!(
            build_args("web", &cmd, false),
            addrs(&["-q", "-t", "web", "-T", "replace", "198.51.100.5", "2001:db8::1"])
        );
    }

    #[test]
    fn test_verbose_drops_quiet_flag() {
        let cmd = TableCommand::Add(addrs(&["192.0.2.1"]));
        assert_eq!(
            build_args("web", &cmd, true),
            addrs(&["-t", "web", "-T", "add", "192.0.2.1"])
        );
    }

    #[test]
    fn test_flush_args() {
        assert_eq!(
            build_args("web", &TableCommand::Flush, false),
            addrs(&["-q", "-t", "web", "-T", "flush"])
        );
    }

    #[test]
    fn test_default_path() {
        assert_eq!(PfctlTable::default().path(), Path::new("/sbin/pfctl"));
    }

    #[tokio::test]
    async fn test_exit_status_is_passed_through() {
        let ok = PfctlTable::new("true", false);
        let status = ok.apply("web", &TableCommand::Flush).await.unwrap();
        assert_eq!(status.exit_code, Some(0));

        let failing = PfctlTable::new("false", false);
        let status = failing.apply("web", &TableCommand::Flush).await.unwrap();
        assert_eq!(status.exit_code, Some(1));
        assert!(!status.success());
    }

    #[tokio::test]
    async fn test_missing_binary_is_an_error() {
        let missing = PfctlTable::new("/nonexistent/pfctl", false);
        let err = missing.apply("web", &TableCommand::Flush).await.unwrap_err();
        assert!(matches!(err, Error::TableControl { .. }));
    }
}
