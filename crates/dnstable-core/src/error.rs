//! Error types for the dnstable system
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for dnstable operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the dnstable system
#[derive(Error, Debug)]
pub enum Error {
    /// A target token could not be classified
    #[error("Invalid target '{token}': bad {field} ({reason})")]
    InvalidTarget {
        /// The raw token as given on the command line
        token: String,
        /// Which part of the token was rejected (name, service, transport)
        field: TargetField,
        /// Human readable reason
        reason: String,
    },

    /// Configuration errors (table name, output file)
    #[error("Configuration error: {0}")]
    Config(String),

    /// A CNAME chain loops back onto a name still being resolved
    #[error("CNAME cycle detected at {name}")]
    CnameCycle {
        /// The name that was re-entered
        name: String,
    },

    /// A single DNS query failed (timeout, SERVFAIL, transport error)
    #[error("DNS lookup error: {0}")]
    Lookup(String),

    /// Output file errors
    #[error("Output file error: {0}")]
    OutputFile(String),

    /// The firewall table collaborator could not be run
    #[error("Table control error ({control}): {message}")]
    TableControl {
        /// Collaborator name
        control: String,
        /// Error message
        message: String,
    },

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

/// Field of a target token that failed validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetField {
    /// The host or domain part
    Name,
    /// The comma-separated service list
    Services,
    /// The comma-separated transport list
    Transports,
}

impl std::fmt::Display for TargetField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            TargetField::Name => "name",
            TargetField::Services => "service list",
            TargetField::Transports => "transport list",
        })
    }
}

impl Error {
    /// Create an invalid target error
    pub fn invalid_target(
        token: impl Into<String>,
        field: TargetField,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidTarget {
            token: token.into(),
            field,
            reason: reason.into(),
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a CNAME cycle error
    pub fn cname_cycle(name: impl Into<String>) -> Self {
        Self::CnameCycle { name: name.into() }
    }

    /// Create a lookup error
    pub fn lookup(msg: impl Into<String>) -> Self {
        Self::Lookup(msg.into())
    }

    /// Create an output file error
    pub fn output_file(msg: impl Into<String>) -> Self {
        Self::OutputFile(msg.into())
    }

    /// Create a table control error
    pub fn table_control(control: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TableControl {
            control: control.into(),
            message: message.into(),
        }
    }

    /// Whether this error must abort the run before any side effect
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidTarget { .. } | Self::Config(_) | Self::CnameCycle { .. }
        )
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
