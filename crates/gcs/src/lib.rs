//! skycp-gcs: Google Cloud Storage adapter for skycp
//!
//! Implements the BlobStore trait on top of the `object_store` crate's GCS
//! backend. Credentials are read from the environment
//! (`GOOGLE_APPLICATION_CREDENTIALS`, `GOOGLE_SERVICE_ACCOUNT`, or the
//! application default credentials).

pub mod client;

pub use client::GcsStore;
