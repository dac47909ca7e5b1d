//! Shared types, validation and configuration for the file server.
//!
//! This crate provides the vocabulary used by the server and the client:
//! - File identifiers and filenames with their path-parameter validation
//! - Expire tags used for retention classification
//! - Parameter error types
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::{AppConfig, ServerConfig, StorageSettings};
pub use error::ParameterError;
pub use types::{ExpireTag, FileId, Filename};
