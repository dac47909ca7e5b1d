//! Storage key layout.
//!
//! Keys take the form `{partition}/{id}/{filename}`. The partition is the
//! first character of the id when it is a hex digit, which spreads canonical
//! UUIDs over 16 partitions. Prefixed ids start with a free-form tag
//! character and all land in [`FALLBACK_PARTITION`].

use fileserver_shared::{FileId, Filename};

/// Partition for ids that do not start with a hex digit.
pub const FALLBACK_PARTITION: char = 'z';

/// Returns the partition of an id.
#[must_use]
pub fn partition(id: &FileId) -> char {
    let first = id.leading_char();
    if first.is_ascii_hexdigit() {
        first
    } else {
        FALLBACK_PARTITION
    }
}

/// Returns the prefix shared by every key of an id: `{partition}/{id}/`.
#[must_use]
pub fn prefix(id: &FileId) -> String {
    format!("{}/{id}/", partition(id))
}

/// Returns the key of a file: `{partition}/{id}/{filename}`.
#[must_use]
pub fn key(id: &FileId, filename: &Filename) -> String {
    format!("{}{filename}", prefix(id))
}
