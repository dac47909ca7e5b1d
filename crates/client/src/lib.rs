//! Client for the file server.
//!
//! Wraps the HTTP surface in typed calls:
//!
//! ```text
//! GET    {id}/{filename}                       retrieve_response / retrieve_file
//! PUT    {id}/{filename}?expires={tag}         write / write_json
//! PUT    copy/{source}/{dest}/{filename}       copy
//! DELETE {id}                                  delete_files_for_id
//! ```

mod client;
mod error;
mod file;

pub use client::{ByteStream, ClientConfig, FileServerClient, create_id};
pub use error::ClientError;
pub use file::FileServerFile;
pub use fileserver_shared::ExpireTag;
