//! gix implementation of [`GitBackend`]
//!
//! Holds a `ThreadSafeRepository` and opens a thread-local handle per query so
//! that scan workers can read blobs concurrently.

use super::{
    BlobEvent, CommitDiff, GitBackend, PathChange, RemoteRef, RevListQuery, TreeEntry, WalkDepth,
};
use crate::scanner::error::{ScanError, ScanResult};
use gix::ObjectId;
use std::collections::{BinaryHeap, HashMap, HashSet, VecDeque};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

const STASH_REF: &str = "refs/stash";

pub struct GixBackend {
    repo: gix::ThreadSafeRepository,
}

impl std::fmt::Debug for GixBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GixBackend").finish_non_exhaustive()
    }
}

impl GixBackend {
    /// Discover the repository containing `path`
    pub fn discover(path: impl AsRef<Path>) -> ScanResult<Self> {
        let path = path.as_ref();
        let repo = gix::discover(path).map_err(|e| {
            ScanError::backend(format!(
                "Failed to open repository '{}': {}",
                path.display(),
                e
            ))
        })?;
        Ok(Self::from_repository(repo))
    }

    pub fn from_repository(repo: gix::Repository) -> Self {
        Self {
            repo: repo.into_sync(),
        }
    }

    fn local(&self) -> gix::Repository {
        self.repo.to_thread_local()
    }
}

/// Resolve `spec` and peel it to a commit id
fn peel_commit(repo: &gix::Repository, spec: &str) -> ScanResult<ObjectId> {
    let id = repo
        .rev_parse_single(spec)
        .map_err(|e| ScanError::backend(format!("Failed to resolve reference '{}': {}", spec, e)))?;
    let commit = id
        .object()
        .map_err(|e| ScanError::backend(format!("Failed to read object for '{}': {}", spec, e)))?
        .peel_to_commit()
        .map_err(|e| ScanError::backend(format!("'{}' does not name a commit: {}", spec, e)))?;
    Ok(commit.id)
}

fn parents_of(repo: &gix::Repository, commit: ObjectId) -> ScanResult<Vec<ObjectId>> {
    let commit = repo
        .find_commit(commit)
        .map_err(|e| ScanError::backend(format!("Failed to read commit {}: {}", commit, e)))?;
    Ok(commit.parent_ids().map(|id| id.detach()).collect())
}

fn tree_of(repo: &gix::Repository, commit: ObjectId) -> ScanResult<ObjectId> {
    let commit = repo
        .find_commit(commit)
        .map_err(|e| ScanError::backend(format!("Failed to read commit {}: {}", commit, e)))?;
    let tree = commit
        .tree_id()
        .map_err(|e| ScanError::backend(format!("Failed to read tree of {}: {}", commit.id, e)))?;
    Ok(tree.detach())
}

/// Every blob in `tree`, with full paths
fn flatten_tree(repo: &gix::Repository, tree: ObjectId) -> ScanResult<Vec<TreeEntry>> {
    let tree = repo
        .find_tree(tree)
        .map_err(|e| ScanError::backend(format!("Failed to read tree {}: {}", tree, e)))?;
    let mut recorder = gix::traverse::tree::Recorder::default();
    tree.traverse()
        .breadthfirst(&mut recorder)
        .map_err(|e| ScanError::backend(format!("Failed to walk tree {}: {}", tree.id, e)))?;
    Ok(recorder
        .records
        .into_iter()
        .filter(|entry| entry.mode.is_blob())
        .map(|entry| TreeEntry::new(entry.filepath.to_string(), entry.oid))
        .collect())
}

fn tree_map(entries: Vec<TreeEntry>) -> HashMap<String, ObjectId> {
    entries.into_iter().map(|e| (e.path, e.blob)).collect()
}

/// All commits reachable from `tips`, excluding (and not walking past) `hidden`
fn walk_commits(
    repo: &gix::Repository,
    tips: &[ObjectId],
    hidden: &HashSet<ObjectId>,
) -> ScanResult<Vec<ObjectId>> {
    let mut seen: HashSet<ObjectId> = HashSet::new();
    let mut queue: VecDeque<ObjectId> = tips.iter().copied().collect();
    let mut order = Vec::new();

    while let Some(id) = queue.pop_front() {
        if hidden.contains(&id) || !seen.insert(id) {
            continue;
        }
        order.push(id);
        queue.extend(parents_of(repo, id)?);
    }
    Ok(order)
}

/// Names of every ref, optionally filtered by prefix
fn ref_names(repo: &gix::Repository, keep: impl Fn(&str) -> bool) -> ScanResult<Vec<String>> {
    let platform = repo
        .references()
        .map_err(|e| ScanError::backend(format!("Failed to list references: {}", e)))?;
    let iter = platform
        .all()
        .map_err(|e| ScanError::backend(format!("Failed to list references: {}", e)))?;

    let mut names = Vec::new();
    for reference in iter {
        let reference =
            reference.map_err(|e| ScanError::backend(format!("Failed to read reference: {}", e)))?;
        let name = reference.name().as_bstr().to_string();
        if keep(&name) {
            names.push(name);
        }
    }
    Ok(names)
}

/// Commit of every stash entry, oldest first.
///
/// Read through the ref store so that linked worktrees see the stash of the
/// common repository.
fn stash_commits(repo: &gix::Repository) -> ScanResult<Vec<ObjectId>> {
    let stash = repo
        .try_find_reference(STASH_REF)
        .map_err(|e| ScanError::backend(format!("Failed to look up {}: {}", STASH_REF, e)))?;
    let Some(stash) = stash else {
        return Ok(Vec::new());
    };

    let mut platform = stash.log_iter();
    let lines = platform
        .all()
        .map_err(|e| ScanError::backend(format!("Failed to read stash reflog: {}", e)))?;
    let Some(lines) = lines else {
        return Ok(Vec::new());
    };

    let mut commits = Vec::new();
    for line in lines {
        let line = line
            .map_err(|e| ScanError::backend(format!("Malformed stash reflog entry: {}", e)))?;
        let id = line.new_oid();
        if !id.is_null() && !commits.contains(&id) {
            commits.push(id);
        }
    }
    Ok(commits)
}

fn is_local_ref(name: &str) -> bool {
    name.starts_with("refs/heads/") || name.starts_with("refs/tags/")
}

impl GitBackend for GixBackend {
    fn resolve(&self, reference: &str) -> ScanResult<Option<ObjectId>> {
        let repo = self.local();
        Ok(peel_commit(&repo, reference).ok())
    }

    fn reachable(&self, query: &RevListQuery) -> ScanResult<Vec<BlobEvent>> {
        let repo = self.local();

        let include = query
            .include
            .iter()
            .map(|r| peel_commit(&repo, r))
            .collect::<ScanResult<Vec<_>>>()?;
        let exclude = query
            .exclude
            .iter()
            .map(|r| peel_commit(&repo, r))
            .collect::<ScanResult<Vec<_>>>()?;

        let hidden_commits: HashSet<ObjectId> = walk_commits(&repo, &exclude, &HashSet::new())?
            .into_iter()
            .collect();
        let mut hidden_blobs: HashSet<ObjectId> = HashSet::new();
        for tip in &exclude {
            let tree = tree_of(&repo, *tip)?;
            hidden_blobs.extend(flatten_tree(&repo, tree)?.into_iter().map(|e| e.blob));
        }

        let commits = match query.depth {
            WalkDepth::History => walk_commits(&repo, &include, &hidden_commits)?,
            WalkDepth::TipsOnly => {
                let mut tips = Vec::new();
                for id in include {
                    if !hidden_commits.contains(&id) && !tips.contains(&id) {
                        tips.push(id);
                    }
                }
                tips
            }
        };
        log::debug!(
            "rev-list: {} commits to visit ({} hidden)",
            commits.len(),
            hidden_commits.len()
        );

        let mut seen_trees = HashSet::new();
        let mut events = Vec::new();
        for commit in commits {
            let tree = tree_of(&repo, commit)?;
            if !seen_trees.insert(tree) {
                continue;
            }
            for entry in flatten_tree(&repo, tree)? {
                if hidden_blobs.contains(&entry.blob) {
                    continue;
                }
                events.push(BlobEvent {
                    path: entry.path,
                    blob: entry.blob,
                    tree,
                });
            }
        }
        Ok(events)
    }

    fn tree_entries(&self, reference: &str) -> ScanResult<Vec<TreeEntry>> {
        let repo = self.local();
        let commit = peel_commit(&repo, reference)?;
        let tree = tree_of(&repo, commit)?;
        flatten_tree(&repo, tree)
    }

    fn index_entries(&self) -> ScanResult<Vec<TreeEntry>> {
        use gix::index::entry::Mode;

        let repo = self.local();
        let index = repo
            .index_or_empty()
            .map_err(|e| ScanError::backend(format!("Failed to read index: {}", e)))?;
        Ok(index
            .entries()
            .iter()
            .filter(|entry| entry.mode == Mode::FILE || entry.mode == Mode::FILE_EXECUTABLE)
            .map(|entry| TreeEntry::new(entry.path(&index).to_string(), entry.id))
            .collect())
    }

    fn stash_entries(&self) -> ScanResult<Vec<TreeEntry>> {
        let repo = self.local();
        let stashes = stash_commits(&repo)?;
        if stashes.is_empty() {
            return Ok(Vec::new());
        }

        // Blobs visible at the tip of any ordinary ref are not stash-only
        let mut visible = HashSet::new();
        for name in ref_names(&repo, |n| n != STASH_REF)? {
            if let Ok(commit) = peel_commit(&repo, &name) {
                let tree = tree_of(&repo, commit)?;
                visible.extend(flatten_tree(&repo, tree)?.into_iter().map(|e| e.blob));
            }
        }

        let mut seen = HashSet::new();
        let mut entries = Vec::new();
        for stash in stashes {
            let parents = parents_of(&repo, stash)?;
            let Some(base) = parents.first().copied() else {
                continue;
            };
            let base_tree = tree_map(flatten_tree(&repo, tree_of(&repo, base)?)?);

            // Working tree and index commits are diffed against the base;
            // the untracked-files commit has no base and counts in full.
            let mut candidates = vec![(stash, true)];
            if let Some(index_commit) = parents.get(1) {
                candidates.push((*index_commit, true));
            }
            if let Some(untracked) = parents.get(2) {
                candidates.push((*untracked, false));
            }

            for (commit, diff_against_base) in candidates {
                for entry in flatten_tree(&repo, tree_of(&repo, commit)?)? {
                    let unchanged =
                        diff_against_base && base_tree.get(&entry.path) == Some(&entry.blob);
                    if unchanged || visible.contains(&entry.blob) {
                        continue;
                    }
                    if seen.insert(entry.clone()) {
                        entries.push(entry);
                    }
                }
            }
        }
        Ok(entries)
    }

    fn commit_log_since(
        &self,
        reference: &str,
        since: SystemTime,
    ) -> ScanResult<Vec<CommitDiff>> {
        let repo = self.local();
        let since_secs = since
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);

        let commit_time = |id: ObjectId| -> ScanResult<i64> {
            let commit = repo
                .find_commit(id)
                .map_err(|e| ScanError::backend(format!("Failed to read commit {}: {}", id, e)))?;
            let time = commit
                .time()
                .map_err(|e| ScanError::backend(format!("Failed to read time of {}: {}", id, e)))?;
            Ok(time.seconds)
        };

        // Newest first; commits older than `since` end their line of history
        let start = peel_commit(&repo, reference)?;
        let mut heap = BinaryHeap::new();
        let mut seen = HashSet::new();
        heap.push((commit_time(start)?, start));
        seen.insert(start);

        let mut diffs = Vec::new();
        while let Some((time, id)) = heap.pop() {
            if time < since_secs {
                continue;
            }
            let parents = parents_of(&repo, id)?;
            let new_tree = tree_map(flatten_tree(&repo, tree_of(&repo, id)?)?);
            let old_tree = match parents.first() {
                Some(parent) => tree_map(flatten_tree(&repo, tree_of(&repo, *parent)?)?),
                None => HashMap::new(),
            };

            let mut changes: Vec<PathChange> = Vec::new();
            for (path, old) in &old_tree {
                match new_tree.get(path) {
                    Some(new) if new == old => {}
                    new => changes.push(PathChange {
                        path: path.clone(),
                        old: Some(*old),
                        new: new.copied(),
                    }),
                }
            }
            for (path, new) in &new_tree {
                if !old_tree.contains_key(path) {
                    changes.push(PathChange {
                        path: path.clone(),
                        old: None,
                        new: Some(*new),
                    });
                }
            }
            changes.sort_by(|a, b| a.path.cmp(&b.path));

            diffs.push(CommitDiff {
                commit: id,
                time,
                changes,
            });

            for parent in parents {
                if seen.insert(parent) {
                    heap.push((commit_time(parent)?, parent));
                }
            }
        }
        Ok(diffs)
    }

    fn remote_tracking_refs(&self, remote: &str) -> ScanResult<Vec<RemoteRef>> {
        let repo = self.local();
        let prefix = if remote.is_empty() {
            "refs/remotes/".to_string()
        } else {
            format!("refs/remotes/{}/", remote)
        };

        let platform = repo
            .references()
            .map_err(|e| ScanError::backend(format!("Failed to list references: {}", e)))?;
        let iter = platform
            .all()
            .map_err(|e| ScanError::backend(format!("Failed to list references: {}", e)))?;

        let mut refs = Vec::new();
        for reference in iter {
            let reference =
                reference.map_err(|e| ScanError::backend(format!("Failed to read reference: {}", e)))?;
            let name = reference.name().as_bstr().to_string();
            if !name.starts_with(&prefix) {
                continue;
            }
            if let gix::refs::TargetRef::Object(id) = reference.target() {
                refs.push(RemoteRef {
                    name,
                    target: id.to_owned(),
                });
            }
        }
        Ok(refs)
    }

    fn local_refs(&self) -> ScanResult<Vec<String>> {
        ref_names(&self.local(), is_local_ref)
    }

    fn all_refs(&self) -> ScanResult<Vec<String>> {
        ref_names(&self.local(), |_| true)
    }

    fn blob_size(&self, blob: &ObjectId) -> ScanResult<u64> {
        let header = self
            .local()
            .find_header(*blob)
            .map_err(|e| ScanError::backend(format!("Failed to read header of {}: {}", blob, e)))?;
        Ok(header.size())
    }

    fn read_blob(&self, blob: &ObjectId) -> ScanResult<Vec<u8>> {
        let repo = self.local();
        let object = repo
            .find_object(*blob)
            .map_err(|e| ScanError::backend(format!("Failed to read blob {}: {}", blob, e)))?;
        Ok(object.data.clone())
    }
}
