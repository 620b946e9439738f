//! Transfer direction resolution
//!
//! Two path strings become one [`TransferOperation`]: exactly one side must be
//! remote, and the side that is local decides between upload and download.
//! Every check here runs before any transfer I/O.

use serde::Serialize;

use crate::config::TransferConfig;
use crate::error::{Error, Result};
use crate::params::{TransferParams, normalize};
use crate::path::{Address, LocalAddress, RemoteAddress, classify};

/// Copy direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Local to remote
    Upload,
    /// Remote to local
    Download,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Upload => f.write_str("upload"),
            Direction::Download => f.write_str("download"),
        }
    }
}

/// One resolved copy intent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferOperation {
    pub direction: Direction,
    pub local: LocalAddress,
    pub remote: RemoteAddress,
    pub params: TransferParams,
}

impl TransferOperation {
    pub fn permission(&self) -> &str {
        &self.params.permission
    }

    pub fn storage_class(&self) -> &str {
        &self.params.storage_class
    }
}

/// Resolve a source and destination path into a transfer operation
pub fn resolve(first: &str, second: &str, config: &TransferConfig) -> Result<TransferOperation> {
    let source = classify(first)?;
    let destination = classify(second)?;

    let (direction, local, remote) = match (source, destination) {
        (Address::Local(local), Address::Remote(remote)) => (Direction::Upload, local, remote),
        (Address::Remote(remote), Address::Local(local)) => (Direction::Download, local, remote),
        (Address::Remote(_), Address::Remote(_)) => {
            return Err(Error::UnsupportedDirection(
                "remote-to-remote copy not supported".into(),
            ));
        }
        (Address::Local(_), Address::Local(_)) => {
            return Err(Error::UnsupportedDirection(
                "one of the paths must be an s3: or gs:// address".into(),
            ));
        }
    };

    match direction {
        Direction::Upload => check_upload(&local, &remote)?,
        Direction::Download => check_download(&remote)?,
    }

    let params = normalize(config, &remote)?;

    tracing::debug!(%direction, local = %local.path.display(), %remote, "Resolved transfer");

    Ok(TransferOperation {
        direction,
        local,
        remote,
        params,
    })
}

fn check_upload(local: &LocalAddress, remote: &RemoteAddress) -> Result<()> {
    std::fs::metadata(&local.path).map_err(|e| Error::file_access(&local.path, e))?;

    if local.is_directory && !remote.is_prefix {
        return Err(Error::InvalidOperation(format!(
            "source is a directory, so the destination must be a prefix ending with '/' (got '{remote}')"
        )));
    }
    Ok(())
}

fn check_download(remote: &RemoteAddress) -> Result<()> {
    if remote.is_prefix {
        return Err(Error::InvalidOperation(format!(
            "remote source must be a single file (got '{remote}')"
        )));
    }
    Ok(())
}
