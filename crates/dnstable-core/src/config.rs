//! Configuration types for the dnstable system
//!
//! This module defines all configuration structures used throughout the crate.

use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Longest table name the packet filter accepts (PF_TABLE_NAME_SIZE - 1)
pub const MAX_TABLE_NAME_LEN: usize = 31;

/// Main update configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateConfig {
    /// Name of the firewall address table to synchronize
    pub table: String,

    /// Optional flat file mirroring the table contents
    pub output_file: Option<PathBuf>,

    /// Address families to resolve
    pub version: IpVersion,

    /// Update policy (flush and append behavior)
    pub policy: UpdatePolicy,

    /// Resolve and compare but do not write or run anything
    pub dry_run: bool,

    /// Let the firewall utility print its own output
    pub verbose: bool,
}

impl UpdateConfig {
    /// Create a new configuration with defaults for the given table
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            output_file: None,
            version: IpVersion::Both,
            policy: UpdatePolicy::default(),
            dry_run: false,
            verbose: false,
        }
    }

    /// Mirror the address list into a file
    pub fn with_output_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_file = Some(path.into());
        self
    }

    /// Restrict the address families
    pub fn with_version(mut self, version: IpVersion) -> Self {
        self.version = version;
        self
    }

    /// Set the update policy
    pub fn with_policy(mut self, policy: UpdatePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Enable or disable dry-run mode
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Enable or disable verbose mode
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        validate_table_name(&self.table)?;

        if let Some(path) = &self.output_file {
            validate_output_path(path)?;
        }

        Ok(())
    }
}

/// Validate a firewall table name
fn validate_table_name(table: &str) -> Result<(), crate::Error> {
    if table.is_empty() {
        return Err(crate::Error::config("Table name cannot be empty"));
    }

    if table.len() > MAX_TABLE_NAME_LEN {
        return Err(crate::Error::config(format!(
            "Table name too long: {} chars (max {}). Got: {}",
            table.len(),
            MAX_TABLE_NAME_LEN,
            table
        )));
    }

    if table.starts_with('-') {
        return Err(crate::Error::config(format!(
            "Table name cannot start with '-'. Got: {}",
            table
        )));
    }

    if !table.chars().all(|c| c.is_ascii_graphic()) {
        return Err(crate::Error::config(format!(
            "Table name contains invalid characters. Got: '{}'. \
            Valid: printable ASCII without whitespace.",
            table
        )));
    }

    Ok(())
}

/// Validate the output file path
fn validate_output_path(path: &Path) -> Result<(), crate::Error> {
    let raw = path.as_os_str();
    if raw.is_empty() {
        return Err(crate::Error::config("Output file path cannot be empty"));
    }

    if raw.to_string_lossy().ends_with('/') || path.is_dir() {
        return Err(crate::Error::config(format!(
            "Output file path must name a file, not a directory: {}",
            path.display()
        )));
    }

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.is_dir()
    {
        return Err(crate::Error::config(format!(
            "Output file parent directory does not exist: {}",
            parent.display()
        )));
    }

    Ok(())
}

/// IP version to resolve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IpVersion {
    /// IPv4 only (A records)
    V4,
    /// IPv6 only (AAAA records)
    V6,
    /// Both IPv4 and IPv6
    #[default]
    Both,
}

impl IpVersion {
    /// Derive the version from the `-4` / `-6` command line switches
    ///
    /// Giving neither or both switches selects both families.
    pub fn from_flags(v4: bool, v6: bool) -> Self {
        match (v4, v6) {
            (true, false) => IpVersion::V4,
            (false, true) => IpVersion::V6,
            _ => IpVersion::Both,
        }
    }

    /// Whether A records are queried
    pub fn includes_v4(&self) -> bool {
        matches!(self, IpVersion::V4 | IpVersion::Both)
    }

    /// Whether AAAA records are queried
    pub fn includes_v6(&self) -> bool {
        matches!(self, IpVersion::V6 | IpVersion::Both)
    }

    /// Whether an address of this family is wanted
    pub fn accepts(&self, addr: &IpAddr) -> bool {
        match addr {
            IpAddr::V4(_) => self.includes_v4(),
            IpAddr::V6(_) => self.includes_v6(),
        }
    }
}

/// How the table and file may be changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UpdatePolicy {
    /// Never empty the table or file because nothing resolved
    pub never_flush: bool,

    /// Only add addresses, never remove existing table entries
    ///
    /// Implies `never_flush`.
    pub preserve: bool,
}

impl UpdatePolicy {
    /// Whether an empty result must leave everything untouched
    pub fn forbids_flush(&self) -> bool {
        self.never_flush || self.preserve
    }
}

/// Settings for the DNS resolver adapter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverSettings {
    /// Explicit nameservers; empty means use the system configuration
    pub nameservers: Vec<IpAddr>,

    /// Per-query timeout
    pub timeout: Duration,

    /// Attempts per query before giving up
    pub attempts: usize,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            nameservers: Vec::new(),
            timeout: default_timeout(),
            attempts: default_attempts(),
        }
    }
}

fn default_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_attempts() -> usize {
    2
}
