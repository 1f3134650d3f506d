//! Traversal strategies
//!
//! Every strategy has the same two phases: ask the backend for the blob
//! events relevant to its mode, then run them through [`process`], which
//! filters, deduplicates, parses and reports them.

mod index;
mod previous;
mod rev_list;
mod stash;
mod tree;
mod unpushed;

pub(crate) use index::scan_index;
pub(crate) use previous::scan_previous_versions;
pub(crate) use rev_list::scan_rev_list;
pub(crate) use stash::scan_stashed;
pub(crate) use tree::scan_tree;
pub(crate) use unpushed::scan_unpushed;

use crate::scanner::backend::GitBackend;
use crate::scanner::error::{ScanError, ScanResult};
use crate::scanner::filter::{LockableSet, PathFilter};
use crate::scanner::name_cache::NameCache;
use crate::scanner::options::Dedup;
use crate::scanner::pointer::{PointerParser, MAX_POINTER_SIZE};
use crate::scanner::sink::{LockableSink, PointerSink};
use crate::scanner::types::WrappedPointer;
use gix::ObjectId;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

/// Collaborators shared by all strategies of one scan call
#[derive(Clone, Copy)]
pub(crate) struct ScanContext<'a> {
    pub backend: &'a dyn GitBackend,
    pub filter: &'a dyn PathFilter,
    pub parser: &'a dyn PointerParser,
    pub lockables: Option<Lockables<'a>>,
    pub workers: usize,
}

#[derive(Clone, Copy)]
pub(crate) struct Lockables<'a> {
    pub set: &'a dyn LockableSet,
    pub sink: &'a dyn LockableSink,
}

/// A blob that might be a pointer
#[derive(Debug, Clone)]
pub(crate) struct Candidate {
    pub path: String,
    pub blob: ObjectId,
    /// Root tree the blob was seen in, for per-tree dedup
    pub tree: Option<ObjectId>,
    /// Further paths folded into this candidate by dedup
    pub also_at: Vec<String>,
}

impl Candidate {
    pub fn new(path: impl Into<String>, blob: ObjectId) -> Self {
        Self {
            path: path.into(),
            blob,
            tree: None,
            also_at: Vec::new(),
        }
    }

    pub fn in_tree(mut self, tree: ObjectId) -> Self {
        self.tree = Some(tree);
        self
    }
}

/// How often one blob may be reported within a call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Granularity {
    Object,
    PerTree,
    /// Every path is reported, even when several share content
    PerPath,
}

impl From<Dedup> for Granularity {
    fn from(dedup: Dedup) -> Self {
        match dedup {
            Dedup::Object => Granularity::Object,
            Dedup::PerTree => Granularity::PerTree,
        }
    }
}

/// Whether lockable candidates should be reported for this pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LockableReporting {
    On,
    Off,
}

/// Filter, dedup, parse and report `candidates`.
///
/// Dedup applies to pointers only: when lockables are reported, the paths of
/// dropped duplicates are kept on the surviving candidate so each of them is
/// still checked. Backend failures abort the whole pass and are returned;
/// malformed pointers are reported to `sink` and the pass continues.
pub(crate) fn process(
    ctx: &ScanContext<'_>,
    candidates: impl IntoIterator<Item = Candidate>,
    granularity: Granularity,
    lockable_reporting: LockableReporting,
    names: &NameCache,
    sink: &dyn PointerSink,
) -> ScanResult<()> {
    let lockables = match lockable_reporting {
        LockableReporting::On => ctx.lockables,
        LockableReporting::Off => None,
    };

    let mut first_seen: HashMap<(ObjectId, Option<ObjectId>), usize> = HashMap::new();
    let mut filtered_out = 0usize;
    let mut queue: Vec<Candidate> = Vec::new();

    for candidate in candidates {
        if !ctx.filter.matches(&candidate.path) {
            filtered_out += 1;
            continue;
        }
        let key = match granularity {
            Granularity::Object => (candidate.blob, None),
            Granularity::PerTree => (candidate.blob, candidate.tree),
            Granularity::PerPath => {
                queue.push(candidate);
                continue;
            }
        };
        match first_seen.entry(key) {
            Entry::Occupied(first) => {
                if lockables.is_some() {
                    queue[*first.get()].also_at.push(candidate.path);
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(queue.len());
                queue.push(candidate);
            }
        }
    }

    log::debug!(
        "{} candidate blob(s) to inspect, {} filtered out",
        queue.len(),
        filtered_out
    );
    if queue.is_empty() {
        return Ok(());
    }

    let workers = ctx.workers.clamp(1, queue.len());
    let chunk_size = queue.len().div_ceil(workers);
    let aborted = AtomicBool::new(false);

    std::thread::scope(|scope| {
        let handles: Vec<_> = queue
            .chunks(chunk_size)
            .map(|chunk| {
                let aborted = &aborted;
                scope.spawn(move || -> ScanResult<()> {
                    for candidate in chunk {
                        if aborted.load(Ordering::Relaxed) {
                            break;
                        }
                        let outcome =
                            inspect(ctx, candidate, granularity, lockables, names, sink);
                        if outcome.is_err() {
                            aborted.store(true, Ordering::Relaxed);
                            return outcome;
                        }
                    }
                    Ok(())
                })
            })
            .collect();

        let mut result = Ok(());
        for handle in handles {
            let outcome = handle.join().unwrap_or_else(|_| {
                Err(ScanError::Internal {
                    message: "scan worker panicked".to_string(),
                })
            });
            if result.is_ok() {
                result = outcome;
            }
        }
        result
    })
}

/// Read and classify a single candidate
fn inspect(
    ctx: &ScanContext<'_>,
    candidate: &Candidate,
    granularity: Granularity,
    lockables: Option<Lockables<'_>>,
    names: &NameCache,
    sink: &dyn PointerSink,
) -> ScanResult<()> {
    let size = ctx.backend.blob_size(&candidate.blob)?;
    let parsed = if size > MAX_POINTER_SIZE {
        log::trace!("{} is {} bytes, too large for a pointer", candidate.path, size);
        Ok(None)
    } else {
        let data = ctx.backend.read_blob(&candidate.blob)?;
        ctx.parser.parse(&data)
    };

    match parsed {
        Ok(Some(pointer)) => {
            let first_name = names.set_if_absent(candidate.blob, &candidate.path)?;
            let name = match granularity {
                Granularity::Object => first_name,
                Granularity::PerTree | Granularity::PerPath => candidate.path.clone(),
            };
            log::trace!("pointer {} at {}", pointer.oid, name);
            sink.found(Ok(WrappedPointer {
                name,
                blob: candidate.blob,
                pointer_size: size,
                pointer,
            }));
        }
        Ok(None) => {
            if let Some(lockables) = lockables {
                std::iter::once(&candidate.path)
                    .chain(&candidate.also_at)
                    .filter(|path| lockables.set.contains(path))
                    .for_each(|path| lockables.sink.found(path));
            }
        }
        Err(err) => {
            log::warn!("malformed pointer at {}: {}", candidate.path, err);
            sink.found(Err(ScanError::Pointer {
                path: candidate.path.clone(),
                blob: candidate.blob.to_string(),
                message: err.to_string(),
            }));
        }
    }
    Ok(())
}
