//! skycp-core: Core library for the skycp copy tool
//!
//! This crate provides everything that does not talk to a provider SDK:
//! - Path classification (`s3:` and `gs://` short notations vs local paths)
//! - Direction resolution (upload, download, or rejection)
//! - Tree mapping from a local directory to remote keys
//! - Permission and storage-class normalization per provider
//! - The transfer driver, written against the [`BlobStore`] trait
//! - Configuration management
//!
//! Provider adapters live in `skycp-s3` and `skycp-gcs`.

pub mod config;
pub mod direction;
pub mod error;
pub mod mapping;
pub mod params;
pub mod path;
pub mod traits;
pub mod transfer;

pub use config::{Config, ConfigManager, ProviderDefaults, TransferConfig};
pub use direction::{Direction, TransferOperation, resolve};
pub use error::{Error, Result};
pub use mapping::{FileMapping, FileMappings, MappedFile, SkippedItem, map_files};
pub use params::{ProviderVocabulary, S3_REGIONS, TransferParams, normalize};
pub use path::{Address, LocalAddress, Provider, RemoteAddress, classify};
pub use traits::{BlobStore, ByteStream, PutOptions, PutReceipt, UploadBody};
pub use transfer::{NoopObserver, TransferObserver, TransferSummary, TransferredItem, execute};
