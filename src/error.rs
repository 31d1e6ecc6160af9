//! Error types for loading, deploying and reloading dialplans.
//!
//! Generation itself never fails: unresolvable references degrade to
//! diagnostic `NoOp` lines. Everything around it (reading snapshots and
//! configuration, installing the file, talking to the manager interface)
//! returns [`DialplanResult<T>`]. AMI failures are classified on two axes:
//!
//! - **Connection errors** ([`DialplanError::is_connection_error`]) mean the
//!   manager session is dead and the caller should reconnect.
//! - **Recoverable errors** ([`DialplanError::is_recoverable`]) mean the action
//!   failed but the session is still usable.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for dialplan operations
pub type DialplanResult<T> = Result<T, DialplanError>;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum DialplanError {
    /// IO error from the socket or the filesystem
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// Snapshot file could not be read
    #[error("cannot read snapshot {}: {source}", path.display())]
    Snapshot {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Configuration file could not be read or is invalid
    #[error("invalid configuration {}: {message}", path.display())]
    Config { path: PathBuf, message: String },

    /// Generated dialplan could not be installed
    #[error("cannot install dialplan at {}: {source}", path.display())]
    Install {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Not connected to the manager interface
    #[error("Not connected to Asterisk manager")]
    NotConnected,

    /// Login rejected
    #[error("Authentication failed: {reason}")]
    AuthenticationFailed { reason: String },

    /// Malformed manager message or banner
    #[error("Protocol error: {message}")]
    ProtocolError { message: String },

    /// Action answered with `Response: Error`
    #[error("Action {action} failed: {message}")]
    ActionFailed { action: String, message: String },

    /// Timeout waiting for the manager
    #[error("Operation timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// Header line without a `:` separator
    #[error("Invalid header format: {header}")]
    InvalidHeader { header: String },

    /// Receive buffer grew past its limit
    #[error("Buffer overflow: message size {size} exceeds limit {limit}")]
    BufferOverflow { size: usize, limit: usize },

    /// Connection closed by the remote side
    #[error("Connection closed by Asterisk")]
    ConnectionClosed,
}

impl DialplanError {
    pub fn protocol_error(message: impl Into<String>) -> Self {
        Self::ProtocolError {
            message: message.into(),
        }
    }

    pub fn auth_failed(reason: impl Into<String>) -> Self {
        Self::AuthenticationFailed {
            reason: reason.into(),
        }
    }

    pub fn config(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Config {
            path: path.into(),
            message: message.into(),
        }
    }

    /// `true` if the manager session is still usable and the caller can retry.
    ///
    /// Recoverable: `Timeout`, `ActionFailed`.
    pub fn is_recoverable(&self) -> bool {
        match self {
            DialplanError::Timeout { .. } => true,
            DialplanError::ActionFailed { .. } => true,
            DialplanError::Io(_) => false,
            DialplanError::NotConnected => false,
            DialplanError::ConnectionClosed => false,
            DialplanError::AuthenticationFailed { .. } => false,
            _ => false,
        }
    }

    /// `true` if the manager session is dead and the caller should reconnect.
    ///
    /// Matches: `Io`, `NotConnected`, `ConnectionClosed`.
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            DialplanError::Io(_) | DialplanError::NotConnected | DialplanError::ConnectionClosed
        )
    }
}
