//! Error types for skycp-core
//!
//! Every failure a copy can hit is one variant of [`Error`], and every variant
//! maps to a process exit code.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for skycp-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for skycp-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed `s3:` or `gs://` address
    #[error("Invalid address: {0}")]
    InvalidAddressFormat(String),

    /// Remote-to-remote or local-to-local copy
    #[error("Unsupported direction: {0}")]
    UnsupportedDirection(String),

    /// Valid addresses that cannot be combined into a transfer
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Unknown region, permission or storage class
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Local file could not be opened, created or inspected
    #[error("Cannot access {}: {source}", path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Blob store put/get failure
    #[error("Transfer failed: {0}")]
    TransferFailure(String),

    /// Configuration file error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

impl Error {
    /// Build a [`Error::FileAccess`] for `path`
    pub fn file_access(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::FileAccess {
            path: path.into(),
            source,
        }
    }

    /// Get the appropriate exit code for this error
    pub const fn exit_code(&self) -> i32 {
        match self {
            Error::InvalidAddressFormat(_)
            | Error::UnsupportedDirection(_)
            | Error::InvalidOperation(_)
            | Error::InvalidParameter(_)
            | Error::Config(_)
            | Error::TomlParse(_) => 2, // UsageError
            Error::TransferFailure(_) => 3, // TransferError
            Error::FileAccess { .. } => 4, // FileAccessError
            _ => 1, // GeneralError
        }
    }

    /// Whether a batch upload may skip the file and keep going
    pub const fn is_skippable(&self) -> bool {
        matches!(self, Error::FileAccess { .. })
    }
}
