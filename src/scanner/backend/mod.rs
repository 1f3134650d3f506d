//! Version-control backend interface
//!
//! Everything the traversal strategies need from git goes through
//! [`GitBackend`]. The production implementation is [`GixBackend`]; tests use
//! an in-memory implementation.

mod gix_backend;

pub use gix_backend::GixBackend;

use crate::scanner::error::ScanResult;
use gix::ObjectId;
use std::time::SystemTime;

/// How far back a reachability query walks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkDepth {
    /// Every commit reachable from the include tips
    History,
    /// Only the include tips themselves
    TipsOnly,
}

/// Reachability query: commits reachable from `include` but not from `exclude`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevListQuery {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub depth: WalkDepth,
}

/// A blob seen in the tree of one commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobEvent {
    pub path: String,
    pub blob: ObjectId,
    /// Root tree the blob was found in
    pub tree: ObjectId,
}

/// A `(path, blob)` pair from a tree, the index, or a stash
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TreeEntry {
    pub path: String,
    pub blob: ObjectId,
}

impl TreeEntry {
    pub fn new(path: impl Into<String>, blob: ObjectId) -> Self {
        Self {
            path: path.into(),
            blob,
        }
    }
}

/// One path changed between a commit and its first parent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathChange {
    pub path: String,
    /// Blob before the commit, `None` when the path was added
    pub old: Option<ObjectId>,
    /// Blob after the commit, `None` when the path was deleted
    pub new: Option<ObjectId>,
}

/// Changes a single commit made relative to its first parent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitDiff {
    pub commit: ObjectId,
    /// Commit time, seconds since the unix epoch
    pub time: i64,
    pub changes: Vec<PathChange>,
}

/// A remote-tracking ref and the commit it points at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRef {
    /// Full name, e.g. `refs/remotes/origin/main`
    pub name: String,
    pub target: ObjectId,
}

/// Queries the scanner issues against the repository.
///
/// Every method may fail with [`ScanError::Backend`](crate::scanner::error::ScanError::Backend);
/// strategies propagate that error unchanged as the scan's terminal error.
pub trait GitBackend: Send + Sync {
    /// Resolve a revision to a commit id; `Ok(None)` when it does not exist
    fn resolve(&self, reference: &str) -> ScanResult<Option<ObjectId>>;

    /// Blobs in the trees of the commits selected by `query`, in walk order.
    ///
    /// Blobs contained in the trees of the exclude tips are never returned.
    fn reachable(&self, query: &RevListQuery) -> ScanResult<Vec<BlobEvent>>;

    /// Blob entries of the tree at `reference`
    fn tree_entries(&self, reference: &str) -> ScanResult<Vec<TreeEntry>>;

    /// Blob entries of the index
    fn index_entries(&self) -> ScanResult<Vec<TreeEntry>>;

    /// Blobs each stash entry introduces relative to the commit it was taken on,
    /// minus blobs in the trees of ordinary ref tips (not their history)
    fn stash_entries(&self) -> ScanResult<Vec<TreeEntry>>;

    /// Commits reachable from `reference` with commit time at or after
    /// `since`, newest first, each diffed against its first parent
    fn commit_log_since(&self, reference: &str, since: SystemTime)
        -> ScanResult<Vec<CommitDiff>>;

    /// Tracking refs of `remote`, or of every remote when `remote` is empty
    fn remote_tracking_refs(&self, remote: &str) -> ScanResult<Vec<RemoteRef>>;

    /// Local branches and tags
    fn local_refs(&self) -> ScanResult<Vec<String>>;

    /// Every ref in the repository
    fn all_refs(&self) -> ScanResult<Vec<String>>;

    /// Size of a blob without reading its content
    fn blob_size(&self, blob: &ObjectId) -> ScanResult<u64>;

    fn read_blob(&self, blob: &ObjectId) -> ScanResult<Vec<u8>>;
}
