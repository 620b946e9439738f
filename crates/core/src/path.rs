//! Path classification
//!
//! Remote addresses come in two short notations:
//! - `s3:<region>:<bucket>:<key>` for Amazon S3
//! - `gs://<bucket>/<key...>` for Google Cloud Storage
//!
//! Anything else is a local path. A remote address whose string ends with `/`
//! is a prefix (folder-like) rather than an exact object key.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{Error, Result};

const S3_SCHEME: &str = "s3";
const S3_PREFIX: &str = "s3:";
const GCS_SCHEME: &str = "gs://";

/// Object storage provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    S3,
    Gcs,
}

impl Provider {
    /// Short lowercase name
    pub const fn as_str(self) -> &'static str {
        match self {
            Provider::S3 => "s3",
            Provider::Gcs => "gcs",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed remote address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteAddress {
    pub provider: Provider,
    /// Region, always set for S3 and never for GCS
    pub region: Option<String>,
    pub bucket: String,
    /// Object key or key prefix (may be empty)
    pub key: String,
    /// Whether the address names a prefix instead of one object
    pub is_prefix: bool,
}

impl RemoteAddress {
    /// Create an S3 address
    pub fn s3(
        region: impl Into<String>,
        bucket: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        Self::new(Provider::S3, Some(region.into()), bucket.into(), key.into())
    }

    /// Create a GCS address
    pub fn gcs(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self::new(Provider::Gcs, None, bucket.into(), key.into())
    }

    fn new(provider: Provider, region: Option<String>, bucket: String, key: String) -> Self {
        let is_prefix = key.is_empty() || key.ends_with('/');
        Self {
            provider,
            region,
            bucket,
            key,
            is_prefix,
        }
    }

    /// Last `/`-separated segment of the key
    pub fn base_name(&self) -> &str {
        base_name(&self.key)
    }
}

impl std::fmt::Display for RemoteAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.provider {
            Provider::S3 => write!(
                f,
                "{S3_SCHEME}:{}:{}:{}",
                self.region.as_deref().unwrap_or_default(),
                self.bucket,
                self.key
            ),
            Provider::Gcs => write!(f, "{GCS_SCHEME}{}/{}", self.bucket, self.key),
        }
    }
}

/// A local filesystem location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalAddress {
    pub path: PathBuf,
    /// Set from a filesystem check at classification time
    pub is_directory: bool,
}

impl LocalAddress {
    /// Classify `path` by asking the filesystem whether it is a directory
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let is_directory = path.is_dir();
        Self { path, is_directory }
    }
}

/// Parsed address that can be either local or remote
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Address {
    Local(LocalAddress),
    Remote(RemoteAddress),
}

/// Classify a path string as a local or remote address
pub fn classify(path: &str) -> Result<Address> {
    if path.is_empty() {
        return Err(Error::InvalidAddressFormat("Path cannot be empty".into()));
    }

    if path.starts_with(S3_PREFIX) {
        return parse_s3(path).map(Address::Remote);
    }

    if path.starts_with(GCS_SCHEME) {
        return parse_gcs(path).map(Address::Remote);
    }

    Ok(Address::Local(LocalAddress::new(path)))
}

/// Parse `s3:<region>:<bucket>:<key>`; colons past the third belong to the key
fn parse_s3(path: &str) -> Result<RemoteAddress> {
    let parts: Vec<&str> = path.splitn(4, ':').collect();
    let &[_, region, bucket, key] = parts.as_slice() else {
        return Err(Error::InvalidAddressFormat(format!(
            "'{path}': S3 path must be in format s3:region:bucket:key"
        )));
    };

    if region.is_empty() {
        return Err(Error::InvalidAddressFormat(format!(
            "'{path}': region cannot be empty"
        )));
    }
    if bucket.is_empty() {
        return Err(Error::InvalidAddressFormat(format!(
            "'{path}': bucket cannot be empty"
        )));
    }

    Ok(RemoteAddress::s3(region, bucket, key))
}

/// Parse `gs://<bucket>/<key...>`
fn parse_gcs(path: &str) -> Result<RemoteAddress> {
    let rest = &path[GCS_SCHEME.len()..];
    let Some((bucket, key)) = rest.split_once('/') else {
        return Err(Error::InvalidAddressFormat(format!(
            "'{path}': GCS path must be in format gs://bucket/key"
        )));
    };

    if bucket.is_empty() {
        return Err(Error::InvalidAddressFormat(format!(
            "'{path}': bucket cannot be empty"
        )));
    }

    Ok(RemoteAddress::gcs(bucket, key))
}

/// Join a key prefix and a relative name with exactly one `/` between them
pub fn join_key(prefix: &str, name: &str) -> String {
    let base = prefix.trim_end_matches('/');
    let name = name.trim_start_matches('/');
    if base.is_empty() {
        name.to_string()
    } else {
        format!("{base}/{name}")
    }
}

/// Last `/`-separated segment of a key
pub fn base_name(key: &str) -> &str {
    key.rsplit('/').next().unwrap_or(key)
}

/// Convert a relative filesystem path into `/`-separated key form
pub fn relative_key(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote(path: &str) -> RemoteAddress {
        match classify(path).unwrap() {
            Address::Remote(remote) => remote,
            other => panic!("expected a remote address, got {other:?}"),
        }
    }

    fn local(path: &str) -> LocalAddress {
        match classify(path).unwrap() {
            Address::Local(local) => local,
            other => panic!("expected a local address, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_s3_address() {
        let remote = remote("s3:ap-southeast-1:bucket:path/file.zip");
        assert_eq!(remote.provider, Provider::S3);
        assert_eq!(remote.region.as_deref(), Some("ap-southeast-1"));
        assert_eq!(remote.bucket, "bucket");
        assert_eq!(remote.key, "path/file.zip");
        assert!(!remote.is_prefix);
    }

    #[test]
    fn test_parse_s3_prefix() {
        assert!(remote("s3:us-east-1:bucket:dest/").is_prefix);

        let remote = remote("s3:us-east-1:bucket:");
        assert_eq!(remote.key, "");
        assert!(remote.is_prefix);
    }

    #[test]
    fn test_parse_s3_too_few_segments() {
        for path in ["s3:bucket:path", "s3:path", "s3:"] {
            let err = classify(path).unwrap_err();
            assert!(matches!(err, Error::InvalidAddressFormat(_)), "{path}");
        }
    }

    #[test]
    fn test_parse_s3_empty_parts() {
        assert!(matches!(
            classify("s3::bucket:key"),
            Err(Error::InvalidAddressFormat(_))
        ));
        assert!(matches!(
            classify("s3:us-east-1::key"),
            Err(Error::InvalidAddressFormat(_))
        ));
    }

    #[test]
    fn test_s3_round_trip() {
        for path in [
            "s3:us-east-1:bucket:key",
            "s3:eu-west-1:my-bucket:a/b/c.txt",
            "s3:us-west-2:bucket:folder/",
            "s3:us-west-2:bucket:",
            "s3:sa-east-1:bucket:key:with:colons",
            "s3:us-east-1:bucket:path with spaces/file",
        ] {
            assert_eq!(remote(path).to_string(), path);
        }
    }

    #[test]
    fn test_other_scheme_is_local() {
        let local = local("whatever:region:bucket:path");
        assert_eq!(local.path, PathBuf::from("whatever:region:bucket:path"));
    }

    #[test]
    fn test_parse_gcs_address() {
        let remote = remote("gs://bucket/path/google/file.zip");
        assert_eq!(remote.provider, Provider::Gcs);
        assert_eq!(remote.region, None);
        assert_eq!(remote.bucket, "bucket");
        assert_eq!(remote.key, "path/google/file.zip");
        assert!(!remote.is_prefix);
        assert_eq!(remote.to_string(), "gs://bucket/path/google/file.zip");
    }

    #[test]
    fn test_parse_gcs_prefix() {
        assert!(remote("gs://bucket/dir/").is_prefix);
        assert!(remote("gs://bucket/").is_prefix);
    }

    #[test]
    fn test_parse_gcs_bucket_only() {
        assert!(matches!(
            classify("gs://bucket"),
            Err(Error::InvalidAddressFormat(_))
        ));
        assert!(matches!(
            classify("gs:///key"),
            Err(Error::InvalidAddressFormat(_))
        ));
    }

    #[test]
    fn test_gcs_lookalike_is_local() {
        assert!(matches!(classify("GCS:path"), Ok(Address::Local(_))));
    }

    #[test]
    fn test_local_directory_from_filesystem() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().to_str().unwrap();

        assert!(local(path).is_directory);

        let file = dir.path().join("x.txt");
        std::fs::write(&file, b"x").unwrap();
        assert!(!local(file.to_str().unwrap()).is_directory);
    }

    #[test]
    fn test_local_missing_path() {
        assert!(!local("./definitely/not/here").is_directory);
    }

    #[test]
    fn test_empty_path() {
        assert!(classify("").is_err());
    }

    #[test]
    fn test_join_key() {
        assert_eq!(join_key("dest/", "x.txt"), "dest/x.txt");
        assert_eq!(join_key("dest", "b/y.txt"), "dest/b/y.txt");
        assert_eq!(join_key("", "x.txt"), "x.txt");
        assert_eq!(join_key("a//", "/x"), "a/x");
    }

    #[test]
    fn test_base_name() {
        assert_eq!(base_name("path/to/report.csv"), "report.csv");
        assert_eq!(base_name("report.csv"), "report.csv");
    }

    #[test]
    fn test_relative_key() {
        let rel = Path::new("b").join("y.txt");
        assert_eq!(relative_key(&rel), "b/y.txt");
    }
}
