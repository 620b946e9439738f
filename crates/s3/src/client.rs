//! S3 client implementation
//!
//! Wraps aws-sdk-s3 and implements the BlobStore trait from skycp-core.
//! Credentials come from the default AWS provider chain.

use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream as SdkByteStream;
use aws_sdk_s3::types::{ObjectCannedAcl, StorageClass};
use futures::StreamExt;

use skycp_core::{BlobStore, ByteStream, Error, PutOptions, PutReceipt, Result, UploadBody};

/// S3 client bound to one region
pub struct S3Store {
    inner: aws_sdk_s3::Client,
    region: String,
}

impl S3Store {
    /// Create a client for `region` using ambient credentials
    pub async fn new(region: impl Into<String>) -> Self {
        let region = region.into();

        let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(region.clone()))
            .load()
            .await;

        tracing::debug!(%region, "Created S3 client");

        Self {
            inner: aws_sdk_s3::Client::new(&config),
            region,
        }
    }

    /// Virtual-hosted URL of an object
    pub fn location(&self, bucket: &str, key: &str) -> String {
        object_url(bucket, &self.region, key)
    }
}

fn object_url(bucket: &str, region: &str, key: &str) -> String {
    let base = format!("https://{bucket}.s3.{region}.amazonaws.com/");
    match url::Url::parse(&base) {
        Ok(mut url) => {
            if let Ok(mut segments) = url.path_segments_mut() {
                segments.pop_if_empty().extend(key.split('/'));
            }
            url.to_string()
        }
        Err(_) => format!("{base}{key}"),
    }
}

fn transfer_error<E>(action: &str, bucket: &str, key: &str, err: E) -> Error
where
    E: std::error::Error,
{
    Error::TransferFailure(format!(
        "{action} s3://{bucket}/{key}: {}",
        DisplayErrorContext(err)
    ))
}

#[async_trait]
impl BlobStore for S3Store {
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        body: UploadBody,
        options: &PutOptions,
    ) -> Result<PutReceipt> {
        let size = body.len;
        let stream = SdkByteStream::read_from()
            .file(body.file)
            .build()
            .await
            .map_err(|e| transfer_error("read body for", bucket, key, e))?;

        let request = self
            .inner
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(stream)
            .content_length(size as i64)
            .acl(ObjectCannedAcl::from(options.permission.as_str()))
            .storage_class(StorageClass::from(options.storage_class.as_str()))
            .set_content_type(options.content_type.clone());

        let response = request
            .send()
            .await
            .map_err(|e| transfer_error("upload to", bucket, key, e))?;

        tracing::debug!(bucket, key, size, "PutObject complete");

        Ok(PutReceipt {
            location: self.location(bucket, key),
            etag: response.e_tag().map(|e| e.trim_matches('"').to_string()),
            size_bytes: size,
        })
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<ByteStream> {
        let response = self
            .inner
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| transfer_error("download from", bucket, key, e))?;

        let source = format!("s3://{bucket}/{key}");
        let stream = futures::stream::try_unfold(response.body, move |mut body| {
            let source = source.clone();
            async move {
                let chunk = body.try_next().await.map_err(|e| {
                    Error::TransferFailure(format!("read {source}: {}", DisplayErrorContext(e)))
                })?;
                Ok::<_, Error>(chunk.map(|bytes| (bytes, body)))
            }
        });

        Ok(stream.boxed())
    }
}
