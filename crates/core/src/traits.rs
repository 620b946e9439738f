//! BlobStore trait definition
//!
//! The only two things skycp asks of a provider: store a file under a key,
//! and stream an object back. Retries, authentication and multipart chunking
//! are the adapter's business.

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use serde::Serialize;

use crate::error::Result;

/// Object contents as a stream of chunks
pub type ByteStream = BoxStream<'static, Result<Bytes>>;

/// An opened local file ready to upload
#[derive(Debug)]
pub struct UploadBody {
    pub file: tokio::fs::File,
    /// Size in bytes at open time
    pub len: u64,
}

/// Per-object upload settings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PutOptions {
    /// Canned permission name in the provider's vocabulary
    pub permission: String,
    /// Storage class name in the provider's vocabulary
    pub storage_class: String,
    pub content_type: Option<String>,
}

/// What the provider reports back after a successful put
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PutReceipt {
    /// Provider-assigned location of the object
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    pub size_bytes: u64,
}

/// Object storage collaborator
///
/// Implemented by the S3 and GCS adapters and mocked in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Upload `body` to `bucket`/`key`
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        body: UploadBody,
        options: &PutOptions,
    ) -> Result<PutReceipt>;

    /// Stream the object at `bucket`/`key`
    async fn get(&self, bucket: &str, key: &str) -> Result<ByteStream>;
}
