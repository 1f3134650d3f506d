//! Scanner Types
//!
//! Shared types used throughout the scanner module.

use gix::ObjectId;
use serde::Serialize;

/// One `ext-<priority>-<name>` line of a pointer file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PointerExtension {
    pub name: String,
    pub priority: u8,
    pub oid: String,
}

/// Decoded contents of a large-file pointer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pointer {
    /// Content identifier of the stored object (hex sha256)
    pub oid: String,
    /// Size in bytes of the stored object
    pub size: u64,
    /// Extensions, ordered by priority
    pub extensions: Vec<PointerExtension>,
}

/// A pointer discovered during a scan, together with where it was found
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrappedPointer {
    /// Path the pointer was seen at (first observed path in object-level scans)
    pub name: String,
    /// Git blob holding the pointer text
    pub blob: ObjectId,
    /// Size of the pointer blob itself
    pub pointer_size: u64,
    pub pointer: Pointer,
}

impl WrappedPointer {
    pub fn oid(&self) -> &str {
        &self.pointer.oid
    }

    pub fn size(&self) -> u64 {
        self.pointer.size
    }
}

/// Serializable view of a [`WrappedPointer`] for machine-readable output
#[derive(Debug, Serialize)]
pub struct PointerSummary<'a> {
    pub name: &'a str,
    pub blob: String,
    pub oid: &'a str,
    pub size: u64,
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    pub extensions: &'a [PointerExtension],
}

impl<'a> From<&'a WrappedPointer> for PointerSummary<'a> {
    fn from(p: &'a WrappedPointer) -> Self {
        PointerSummary {
            name: &p.name,
            blob: p.blob.to_string(),
            oid: &p.pointer.oid,
            size: p.pointer.size,
            extensions: &p.pointer.extensions,
        }
    }
}
