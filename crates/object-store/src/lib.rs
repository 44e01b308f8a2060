//! Bucket storage client and content hashing for Whatsy media.
//!
//! Media files are content-addressed: the SHA-256 of the bytes is the dedup
//! key, computed locally with [`hash::sha256_file`] before any upload
//! happens. [`ObjectStoreClient`] implements
//! [`assistant_core::MediaStore`] against a bucket-style storage HTTP API
//! (upload by key, time-bounded signed GET URLs).

mod client;
mod config;
pub mod hash;

pub use client::ObjectStoreClient;
pub use config::ObjectStoreConfig;
