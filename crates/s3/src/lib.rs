//! skycp-s3: Amazon S3 adapter for skycp
//!
//! This crate provides the implementation of the BlobStore trait
//! using the aws-sdk-s3 crate. It is the only crate that directly
//! depends on the AWS SDK.

pub mod client;

pub use client::S3Store;
