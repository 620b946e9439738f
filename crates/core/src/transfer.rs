//! Transfer driver
//!
//! Feeds file mappings to a [`BlobStore`] one at a time. The directory walk
//! runs on a blocking task and hands mappings over a bounded channel, so
//! traversal overlaps with the first uploads; transfers themselves never
//! overlap.
//!
//! Failure policy:
//! - upload: an entry the walk could not read, or a file that cannot be
//!   opened, is skipped with a warning; a failed put aborts the batch
//! - download: a failed fetch leaves the local path alone; a failure while
//!   writing removes the partially written file

use std::path::{Path, PathBuf};

use futures::TryStreamExt;
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;

use crate::direction::{Direction, TransferOperation};
use crate::error::{Error, Result};
use crate::mapping::{FileMapping, MappedFile, SkippedItem};
use crate::traits::{BlobStore, ByteStream, PutOptions, UploadBody};

/// Mappings buffered between the walk and the driver
const WALK_QUEUE_DEPTH: usize = 64;

/// Receives per-file progress from the driver
pub trait TransferObserver {
    /// A file transfer is about to begin
    fn started(&mut self, _direction: Direction, _mapping: &FileMapping) {}

    /// A file transfer finished
    fn completed(&mut self, _direction: Direction, _item: &TransferredItem) {}

    /// A file was skipped and the batch continues
    fn skipped(&mut self, _item: &SkippedItem) {}
}

/// Observer that ignores every event
#[derive(Debug, Default)]
pub struct NoopObserver;

impl TransferObserver for NoopObserver {}

/// A file that made it across
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferredItem {
    pub local: PathBuf,
    pub key: String,
    pub size_bytes: u64,
    /// Provider location, uploads only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
}

/// Outcome of a whole invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferSummary {
    pub direction: Direction,
    pub remote: String,
    pub transferred: Vec<TransferredItem>,
    pub skipped: Vec<SkippedItem>,
    pub total_bytes: u64,
}

impl TransferSummary {
    fn new(operation: &TransferOperation) -> Self {
        Self {
            direction: operation.direction,
            remote: operation.remote.to_string(),
            transferred: Vec::new(),
            skipped: Vec::new(),
            total_bytes: 0,
        }
    }

    fn record(&mut self, item: TransferredItem) {
        self.total_bytes += item.size_bytes;
        self.transferred.push(item);
    }
}

/// Run every mapping of `operation` against `store`
pub async fn execute<I>(
    store: &dyn BlobStore,
    operation: &TransferOperation,
    mappings: I,
    observer: &mut dyn TransferObserver,
) -> Result<TransferSummary>
where
    I: IntoIterator<Item = MappedFile>,
    I::IntoIter: Send + 'static,
{
    match operation.direction {
        Direction::Upload => upload(store, operation, mappings.into_iter(), observer).await,
        Direction::Download => {
            let mapping = match mappings.into_iter().next() {
                Some(Ok(mapping)) => mapping,
                Some(Err(skipped)) => return Err(Error::InvalidOperation(skipped.reason)),
                None => {
                    return Err(Error::InvalidOperation(format!(
                        "nothing to download from '{}'",
                        operation.remote
                    )));
                }
            };
            let mut summary = TransferSummary::new(operation);
            let item = download(store, operation, mapping, observer).await?;
            summary.record(item);
            Ok(summary)
        }
    }
}

fn spawn_walk<I>(mappings: I) -> mpsc::Receiver<MappedFile>
where
    I: Iterator<Item = MappedFile> + Send + 'static,
{
    let (tx, rx) = mpsc::channel(WALK_QUEUE_DEPTH);
    tokio::task::spawn_blocking(move || {
        for mapping in mappings {
            // Receiver dropped: the driver hit a fatal error
            if tx.blocking_send(mapping).is_err() {
                break;
            }
        }
    });
    rx
}

async fn upload<I>(
    store: &dyn BlobStore,
    operation: &TransferOperation,
    mappings: I,
    observer: &mut dyn TransferObserver,
) -> Result<TransferSummary>
where
    I: Iterator<Item = MappedFile> + Send + 'static,
{
    let mut summary = TransferSummary::new(operation);
    let mut queue = spawn_walk(mappings);

    while let Some(next) = queue.recv().await {
        let mapping = match next {
            Ok(mapping) => mapping,
            Err(item) => {
                observer.skipped(&item);
                summary.skipped.push(item);
                continue;
            }
        };
        observer.started(Direction::Upload, &mapping);

        let body = match open_upload(&mapping.local).await {
            Ok(body) => body,
            Err(e) if e.is_skippable() => {
                tracing::warn!("Failed opening file, skipping: {e}");
                let item = SkippedItem {
                    local: mapping.local,
                    key: mapping.key,
                    reason: e.to_string(),
                };
                observer.skipped(&item);
                summary.skipped.push(item);
                continue;
            }
            Err(e) => return Err(e),
        };

        let options = PutOptions {
            permission: operation.permission().to_string(),
            storage_class: operation.storage_class().to_string(),
            content_type: mime_guess::from_path(&mapping.local)
                .first()
                .map(|m| m.essence_str().to_string()),
        };

        let receipt = store
            .put(&operation.remote.bucket, &mapping.key, body, &options)
            .await?;

        let item = TransferredItem {
            local: mapping.local,
            key: mapping.key,
            size_bytes: receipt.size_bytes,
            location: Some(receipt.location),
            etag: receipt.etag,
        };
        observer.completed(Direction::Upload, &item);
        summary.record(item);
    }

    Ok(summary)
}

async fn open_upload(path: &Path) -> Result<UploadBody> {
    let file = tokio::fs::File::open(path)
        .await
        .map_err(|e| Error::file_access(path, e))?;
    let len = file
        .metadata()
        .await
        .map_err(|e| Error::file_access(path, e))?
        .len();
    Ok(UploadBody { file, len })
}

async fn download(
    store: &dyn BlobStore,
    operation: &TransferOperation,
    mapping: FileMapping,
    observer: &mut dyn TransferObserver,
) -> Result<TransferredItem> {
    observer.started(Direction::Download, &mapping);

    // The local file is only touched once the object is known to exist
    let stream = store.get(&operation.remote.bucket, &mapping.key).await?;

    let mut file = tokio::fs::File::create(&mapping.local)
        .await
        .map_err(|e| Error::file_access(&mapping.local, e))?;

    let written = write_object(stream, &mapping.local, &mut file).await;
    drop(file);

    let size_bytes = match written {
        Ok(n) => n,
        Err(e) => {
            if let Err(rm) = tokio::fs::remove_file(&mapping.local).await {
                tracing::warn!(
                    path = %mapping.local.display(),
                    "Failed to remove partial download: {rm}"
                );
            }
            return Err(e);
        }
    };

    tracing::debug!(
        bucket = %operation.remote.bucket,
        key = %mapping.key,
        size_bytes,
        "Object downloaded"
    );

    let item = TransferredItem {
        local: mapping.local,
        key: mapping.key,
        size_bytes,
        location: None,
        etag: None,
    };
    observer.completed(Direction::Download, &item);
    Ok(item)
}

async fn write_object(
    mut stream: ByteStream,
    path: &Path,
    file: &mut tokio::fs::File,
) -> Result<u64> {
    let mut written = 0u64;
    while let Some(chunk) = stream.try_next().await? {
        file.write_all(&chunk)
            .await
            .map_err(|e| Error::file_access(path, e))?;
        written += chunk.len() as u64;
    }
    file.flush().await.map_err(|e| Error::file_access(path, e))?;
    Ok(written)
}
