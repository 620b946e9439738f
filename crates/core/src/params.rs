//! Permission and storage-class normalization
//!
//! Each provider has its own vocabulary of canned permissions, storage classes
//! and regions. [`normalize`] resolves what the user asked for against that
//! vocabulary, filling in defaults and rejecting unknown names.

use serde::Serialize;

use crate::config::TransferConfig;
use crate::error::{Error, Result};
use crate::path::{Provider, RemoteAddress};

/// AWS regions accepted in `s3:` addresses
pub const S3_REGIONS: &[&str] = &[
    "us-east-1",
    "us-east-2",
    "us-west-1",
    "us-west-2",
    "ca-central-1",
    "eu-west-1",
    "eu-west-2",
    "eu-west-3",
    "eu-central-1",
    "eu-north-1",
    "eu-south-1",
    "ap-south-1",
    "ap-east-1",
    "ap-southeast-1",
    "ap-southeast-2",
    "ap-northeast-1",
    "ap-northeast-2",
    "ap-northeast-3",
    "sa-east-1",
    "me-south-1",
    "af-south-1",
];

const S3_PERMISSIONS: &[&str] = &[
    "private",
    "public-read",
    "public-read-write",
    "authenticated-read",
    "aws-exec-read",
    "bucket-owner-read",
    "bucket-owner-full-control",
];

const S3_STORAGE_CLASSES: &[&str] = &[
    "STANDARD",
    "REDUCED_REDUNDANCY",
    "STANDARD_IA",
    "ONEZONE_IA",
    "INTELLIGENT_TIERING",
    "GLACIER",
    "GLACIER_IR",
    "DEEP_ARCHIVE",
];

const GCS_PERMISSIONS: &[&str] = &[
    "private",
    "project-private",
    "authenticated-read",
    "public-read",
    "public-read-write",
    "bucket-owner-read",
    "bucket-owner-full-control",
];

const GCS_STORAGE_CLASSES: &[&str] = &[
    "standard",
    "multi_regional",
    "regional",
    "nearline",
    "coldline",
    "archive",
];

/// Provider-specific names for permissions, storage classes and regions
pub trait ProviderVocabulary: Send + Sync {
    /// Permission forced by `--public`
    fn public_permission(&self) -> &'static str;

    /// Permission used when none is requested
    fn default_permission(&self) -> &'static str;

    /// Storage class used when none is requested
    fn default_storage_class(&self) -> &'static str;

    fn permissions(&self) -> &'static [&'static str];

    fn storage_classes(&self) -> &'static [&'static str];

    /// Known regions; empty when addresses carry no region
    fn regions(&self) -> &'static [&'static str];

    /// Canonical spelling of a storage class
    fn canonical_storage_class(&self, name: &str) -> String;
}

/// Amazon S3 canned ACLs and storage classes
#[derive(Debug, Clone, Copy, Default)]
pub struct S3Vocabulary;

impl ProviderVocabulary for S3Vocabulary {
    fn public_permission(&self) -> &'static str {
        "public-read"
    }

    fn default_permission(&self) -> &'static str {
        "private"
    }

    fn default_storage_class(&self) -> &'static str {
        "STANDARD"
    }

    fn permissions(&self) -> &'static [&'static str] {
        S3_PERMISSIONS
    }

    fn storage_classes(&self) -> &'static [&'static str] {
        S3_STORAGE_CLASSES
    }

    fn regions(&self) -> &'static [&'static str] {
        S3_REGIONS
    }

    fn canonical_storage_class(&self, name: &str) -> String {
        name.to_ascii_uppercase()
    }
}

/// Google Cloud Storage predefined ACLs and storage classes
#[derive(Debug, Clone, Copy, Default)]
pub struct GcsVocabulary;

impl ProviderVocabulary for GcsVocabulary {
    fn public_permission(&self) -> &'static str {
        "public-read"
    }

    fn default_permission(&self) -> &'static str {
        "authenticated-read"
    }

    fn default_storage_class(&self) -> &'static str {
        "multi_regional"
    }

    fn permissions(&self) -> &'static [&'static str] {
        GCS_PERMISSIONS
    }

    fn storage_classes(&self) -> &'static [&'static str] {
        GCS_STORAGE_CLASSES
    }

    fn regions(&self) -> &'static [&'static str] {
        &[]
    }

    fn canonical_storage_class(&self, name: &str) -> String {
        name.to_ascii_lowercase()
    }
}

impl Provider {
    /// Vocabulary for this provider
    pub fn vocabulary(self) -> &'static dyn ProviderVocabulary {
        match self {
            Provider::S3 => &S3Vocabulary,
            Provider::Gcs => &GcsVocabulary,
        }
    }
}

/// Permission and storage class resolved for one provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferParams {
    pub permission: String,
    pub storage_class: String,
}

/// Resolve permission and storage class for `remote`, validating its region
///
/// Precedence: `public` flag, then the requested value, then the provider
/// default from the config file, then the built-in provider default. Empty
/// strings count as "not requested".
pub fn normalize(config: &TransferConfig, remote: &RemoteAddress) -> Result<TransferParams> {
    let vocabulary = remote.provider.vocabulary();
    let file_defaults = config.provider_defaults(remote.provider);

    validate_region(vocabulary, remote)?;

    let permission = if config.public {
        vocabulary.public_permission().to_string()
    } else {
        let requested = non_empty(config.permission.as_deref())
            .or_else(|| non_empty(file_defaults.permission.as_deref()))
            .unwrap_or(vocabulary.default_permission());
        let permission = requested.to_ascii_lowercase();
        if !vocabulary.permissions().contains(&permission.as_str()) {
            return Err(Error::InvalidParameter(format!(
                "unknown {} permission '{requested}' (expected one of: {})",
                remote.provider,
                vocabulary.permissions().join(", ")
            )));
        }
        permission
    };

    let requested = non_empty(config.storage_class.as_deref())
        .or_else(|| non_empty(file_defaults.storage_class.as_deref()))
        .unwrap_or(vocabulary.default_storage_class());
    let storage_class = vocabulary.canonical_storage_class(requested);
    if !vocabulary.storage_classes().contains(&storage_class.as_str()) {
        return Err(Error::InvalidParameter(format!(
            "unknown {} storage class '{requested}' (expected one of: {})",
            remote.provider,
            vocabulary.storage_classes().join(", ")
        )));
    }

    tracing::debug!(
        provider = %remote.provider,
        %permission,
        %storage_class,
        "Normalized transfer parameters"
    );

    Ok(TransferParams {
        permission,
        storage_class,
    })
}

fn validate_region(vocabulary: &dyn ProviderVocabulary, remote: &RemoteAddress) -> Result<()> {
    match remote.region.as_deref() {
        Some(region) if !vocabulary.regions().contains(&region) => {
            Err(Error::InvalidParameter(format!(
                "unknown {} region '{region}' (run `skycp region` for the list)",
                remote.provider
            )))
        }
        None if !vocabulary.regions().is_empty() => Err(Error::InvalidParameter(format!(
            "{} addresses require a region",
            remote.provider
        ))),
        _ => Ok(()),
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
