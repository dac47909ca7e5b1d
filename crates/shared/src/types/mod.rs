//! Common types used by the server and the client.

pub mod expire;
pub mod filename;
pub mod id;

pub use expire::{ExpireTag, UnknownExpireTag};
pub use filename::Filename;
pub use id::FileId;
