//! GCS client implementation
//!
//! Uploads go through the XML API, which takes the predefined ACL and storage
//! class as `x-goog-*` request headers. Those are attached as default headers
//! on a store built for the upload.

use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use http::{HeaderMap, HeaderName, HeaderValue};
use object_store::gcp::{GoogleCloudStorage, GoogleCloudStorageBuilder};
use object_store::path::Path as ObjectPath;
use object_store::{
    Attribute, Attributes, ClientOptions, ObjectStore, PutMultipartOptions, PutPayload,
    PutResult, WriteMultipart,
};
use tokio::io::AsyncReadExt;

use skycp_core::{BlobStore, ByteStream, Error, PutOptions, PutReceipt, Result, UploadBody};

const ACL_HEADER: &str = "x-goog-acl";
const STORAGE_CLASS_HEADER: &str = "x-goog-storage-class";
const CACHE_CONTROL: &str = "max-age=86400";
const PUBLIC_ENDPOINT: &str = "https://storage.googleapis.com/";

/// Files up to this size go up in a single request
const SINGLE_PUT_LIMIT: u64 = 10 * 1024 * 1024;
/// Part size for larger files
const PART_SIZE: usize = 10 * 1024 * 1024;
/// Parts in flight at once
const MAX_IN_FLIGHT_PARTS: usize = 4;
const READ_BUFFER: usize = 1024 * 1024;

/// Google Cloud Storage client
#[derive(Debug, Default)]
pub struct GcsStore {}

impl GcsStore {
    pub fn new() -> Self {
        Self {}
    }

    fn store(&self, bucket: &str, headers: HeaderMap) -> Result<GoogleCloudStorage> {
        GoogleCloudStorageBuilder::from_env()
            .with_bucket_name(bucket)
            .with_client_options(ClientOptions::new().with_default_headers(headers))
            .build()
            .map_err(|e| Error::TransferFailure(format!("connect to gs://{bucket}: {e}")))
    }

    /// Public URL of an object
    pub fn location(&self, bucket: &str, key: &str) -> String {
        object_url(bucket, key)
    }
}

/// Object path that names exactly `key`
///
/// `ObjectPath::from` would percent-encode characters such as `#` and `%`;
/// `parse` keeps them, and anything it would still rewrite is rejected.
fn object_path(key: &str) -> Result<ObjectPath> {
    let path = ObjectPath::parse(key).map_err(|e| {
        Error::InvalidParameter(format!("'{key}' is not a valid GCS object name: {e}"))
    })?;
    if path.as_ref() != key {
        return Err(Error::InvalidParameter(format!(
            "'{key}' is not a valid GCS object name: leading or trailing '/'"
        )));
    }
    Ok(path)
}

fn object_url(bucket: &str, key: &str) -> String {
    match url::Url::parse(PUBLIC_ENDPOINT) {
        Ok(mut url) => {
            if let Ok(mut segments) = url.path_segments_mut() {
                segments
                    .pop_if_empty()
                    .push(bucket)
                    .extend(key.split('/'));
            }
            url.to_string()
        }
        Err(_) => format!("{PUBLIC_ENDPOINT}{bucket}/{key}"),
    }
}

/// Storage class as the XML API spells it (`multi_regional` -> `MULTI_REGIONAL`)
fn wire_storage_class(name: &str) -> String {
    name.to_ascii_uppercase()
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|_| Error::InvalidParameter(format!("'{value}' is not a valid header value")))
}

fn upload_headers(options: &PutOptions) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(
        HeaderName::from_static(ACL_HEADER),
        header_value(&options.permission)?,
    );
    headers.insert(
        HeaderName::from_static(STORAGE_CLASS_HEADER),
        header_value(&wire_storage_class(&options.storage_class))?,
    );
    Ok(headers)
}

fn upload_attributes(options: &PutOptions) -> Attributes {
    let mut attributes = Attributes::new();
    attributes.insert(Attribute::CacheControl, CACHE_CONTROL.into());
    if let Some(content_type) = &options.content_type {
        attributes.insert(Attribute::ContentType, content_type.clone().into());
    }
    attributes
}

/// Failure inside an upload: reading the local file or talking to GCS
#[derive(Debug, thiserror::Error)]
enum UploadError {
    #[error("read local file: {0}")]
    Read(#[from] std::io::Error),
    #[error(transparent)]
    Store(#[from] object_store::Error),
}

async fn put_whole(
    store: &dyn ObjectStore,
    path: &ObjectPath,
    file: &mut tokio::fs::File,
    attributes: Attributes,
) -> std::result::Result<(PutResult, u64), UploadError> {
    let mut data = Vec::new();
    file.read_to_end(&mut data).await?;
    let size = data.len() as u64;

    let put_options = object_store::PutOptions {
        attributes,
        ..Default::default()
    };
    let result = store
        .put_opts(path, PutPayload::from(data), put_options)
        .await?;
    Ok((result, size))
}

/// Streams `file` as a multipart upload; at most a few parts are held in memory
async fn put_parts(
    store: &dyn ObjectStore,
    path: &ObjectPath,
    file: &mut tokio::fs::File,
    attributes: Attributes,
) -> std::result::Result<(PutResult, u64), UploadError> {
    let upload = store
        .put_multipart_opts(
            path,
            PutMultipartOptions {
                attributes,
                ..Default::default()
            },
        )
        .await?;
    let mut writer = WriteMultipart::new_with_chunk_size(upload, PART_SIZE);

    let mut buf = vec![0u8; READ_BUFFER];
    let mut size = 0u64;
    loop {
        let n = match file.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) => {
                abort(writer).await;
                return Err(e.into());
            }
        };
        if let Err(e) = writer.wait_for_capacity(MAX_IN_FLIGHT_PARTS).await {
            abort(writer).await;
            return Err(e.into());
        }
        writer.write(&buf[..n]);
        size += n as u64;
    }

    let result = writer.finish().await?;
    Ok((result, size))
}

async fn abort(writer: WriteMultipart) {
    if let Err(e) = writer.abort().await {
        tracing::warn!("Failed to abort multipart upload: {e}");
    }
}

#[async_trait]
impl BlobStore for GcsStore {
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        mut body: UploadBody,
        options: &PutOptions,
    ) -> Result<PutReceipt> {
        let path = object_path(key)?;
        let store = self.store(bucket, upload_headers(options)?)?;
        let target = format!("gs://{bucket}/{key}");

        let uploaded = if body.len <= SINGLE_PUT_LIMIT {
            put_whole(&store, &path, &mut body.file, upload_attributes(options)).await
        } else {
            put_parts(&store, &path, &mut body.file, upload_attributes(options)).await
        };
        let (result, size) =
            uploaded.map_err(|e| Error::TransferFailure(format!("upload to {target}: {e}")))?;

        tracing::debug!(bucket, key, size, "GCS upload complete");

        Ok(PutReceipt {
            location: self.location(bucket, key),
            etag: result.e_tag,
            size_bytes: size,
        })
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<ByteStream> {
        let path = object_path(key)?;
        let store = self.store(bucket, HeaderMap::new())?;
        let source = format!("gs://{bucket}/{key}");

        let result = store
            .get(&path)
            .await
            .map_err(|e| Error::TransferFailure(format!("download from {source}: {e}")))?;

        let stream = result
            .into_stream()
            .map_err(move |e| Error::TransferFailure(format!("read {source}: {e}")));

        Ok(stream.boxed())
    }
}

#[cfg(test)]
mod tests {
    use object_store::memory::InMemory;

    use super::*;

    fn options() -> PutOptions {
        PutOptions {
            permission: "public-read".into(),
            storage_class: "multi_regional".into(),
            content_type: Some("text/plain".into()),
        }
    }

    #[test]
    fn test_upload_headers() {
        let headers = upload_headers(&options()).unwrap();
        assert_eq!(headers.get(ACL_HEADER).unwrap(), "public-read");
        assert_eq!(headers.get(STORAGE_CLASS_HEADER).unwrap(), "MULTI_REGIONAL");
    }

    #[test]
    fn test_upload_headers_reject_control_chars() {
        let mut opts = options();
        opts.permission = "bad\nvalue".into();
        assert!(matches!(
            upload_headers(&opts),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_upload_attributes() {
        let attributes = upload_attributes(&options());
        assert_eq!(
            attributes.get(&Attribute::ContentType).map(|v| AsRef::<str>::as_ref(v)),
            Some("text/plain")
        );
        assert_eq!(
            attributes.get(&Attribute::CacheControl).map(|v| AsRef::<str>::as_ref(v)),
            Some(CACHE_CONTROL)
        );
    }

    #[test]
    fn test_object_path_keeps_key_literal() {
        for key in ["reports/q#1.csv", "50%/x.txt", "a [b] <c>.txt", "dest/b/y.txt"] {
            assert_eq!(object_path(key).unwrap().as_ref(), key);
        }
    }

    #[test]
    fn test_object_path_rejects_rewritten_keys() {
        for key in ["a//b.txt", "dir/./x.txt", "dir/../x.txt", "/abs.txt", "bad\nname"] {
            assert!(
                matches!(object_path(key), Err(Error::InvalidParameter(_))),
                "{key} should be rejected"
            );
        }
    }

    /// Distinct bytes so a misplaced part shows up in the comparison
    fn sample_file(len: usize) -> (tempfile::NamedTempFile, Vec<u8>) {
        let data: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), &data).unwrap();
        (file, data)
    }

    #[tokio::test]
    async fn test_put_whole_uploads_file() {
        let store = InMemory::new();
        let (local, data) = sample_file(4096);
        let path = object_path("small/x.txt").unwrap();

        let mut file = tokio::fs::File::open(local.path()).await.unwrap();
        let (result, size) = put_whole(&store, &path, &mut file, upload_attributes(&options()))
            .await
            .unwrap();

        assert_eq!(size, 4096);
        assert!(result.e_tag.is_some());
        let stored = store.get(&path).await.unwrap();
        assert_eq!(
            stored.attributes.get(&Attribute::CacheControl).map(|v| AsRef::<str>::as_ref(v)),
            Some(CACHE_CONTROL)
        );
        assert_eq!(stored.bytes().await.unwrap().as_ref(), data.as_slice());
    }

    #[tokio::test]
    async fn test_put_parts_streams_large_file() {
        let store = InMemory::new();
        let (local, data) = sample_file(2 * PART_SIZE + 12_345);
        let path = object_path("big/archive #1.tar").unwrap();

        let mut file = tokio::fs::File::open(local.path()).await.unwrap();
        let (result, size) = put_parts(&store, &path, &mut file, upload_attributes(&options()))
            .await
            .unwrap();

        assert_eq!(size, data.len() as u64);
        assert!(result.e_tag.is_some());
        let stored = store.get(&path).await.unwrap();
        assert_eq!(
            stored.attributes.get(&Attribute::ContentType).map(|v| AsRef::<str>::as_ref(v)),
            Some("text/plain")
        );
        assert_eq!(stored.bytes().await.unwrap().as_ref(), data.as_slice());
    }

    #[test]
    fn test_object_url() {
        assert_eq!(
            object_url("bucket", "dest/b/y.txt"),
            "https://storage.googleapis.com/bucket/dest/b/y.txt"
        );
        assert_eq!(
            object_url("bucket", "a b.txt"),
            "https://storage.googleapis.com/bucket/a%20b.txt"
        );
    }
}
