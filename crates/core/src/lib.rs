//! Storage core for the file server.
//!
//! This crate contains the storage logic, free of routing and server code:
//! key derivation, the backend capability trait and its two variants.
//!
//! # Modules
//!
//! - `storage` - Key layout, local directory and S3-compatible backends

pub mod storage;
