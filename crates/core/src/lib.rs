//! s3t-core: Core library for the s3t tree sync client
//!
//! This crate provides the core functionality for s3t, including:
//! - Configuration management
//! - Address parsing and key/path mapping
//! - Local tree walking
//! - ObjectStore trait for S3 operations
//! - The tree sync engine and multipart session maintenance
//!
//! This crate is designed to be independent of any specific S3 SDK,
//! so the engine can be tested against in-memory and mock stores.

pub mod config;
pub mod error;
pub mod mapper;
pub mod multipart;
pub mod path;
pub mod sync;
pub mod traits;
pub mod transfer;
pub mod walker;

#[cfg(test)]
mod memory;

pub use config::{Config, ConfigManager, StoreSettings, TransferSettings};
pub use error::{Error, Result};
pub use multipart::{MultipartManager, validate_session};
pub use path::{REMOTE_SCHEME, ParsedPath, RemotePath, parse_path, parse_remote};
pub use sync::{SyncDirection, SyncOptions, SyncReport, TreeSync};
pub use traits::{
    CannedAcl, Grant, ListOptions, ListResult, MultipartUpload, ObjectInfo, ObjectReader,
    ObjectStore, PartInfo,
};
pub use transfer::TransferResult;
pub use walker::TreeWalker;
