//! Scan of staged content

use super::{process, Candidate, Granularity, LockableReporting, ScanContext};
use crate::scanner::error::ScanResult;
use crate::scanner::name_cache::NameCache;
use crate::scanner::sink::PointerSink;
use std::collections::HashMap;

/// Report pointers staged in the index that differ from `reference`.
///
/// When `reference` does not resolve (no commits yet) every index entry is a
/// candidate.
pub(crate) fn scan_index(
    ctx: &ScanContext<'_>,
    reference: &str,
    sink: &dyn PointerSink,
) -> ScanResult<()> {
    let committed: HashMap<String, _> = match ctx.backend.resolve(reference)? {
        Some(_) => ctx
            .backend
            .tree_entries(reference)?
            .into_iter()
            .map(|entry| (entry.path, entry.blob))
            .collect(),
        None => {
            log::debug!("{} does not resolve; treating every index entry as new", reference);
            HashMap::new()
        }
    };

    let staged: Vec<Candidate> = ctx
        .backend
        .index_entries()?
        .into_iter()
        .filter(|entry| committed.get(&entry.path) != Some(&entry.blob))
        .map(|entry| Candidate::new(entry.path, entry.blob))
        .collect();
    log::debug!("{} index entries differ from {}", staged.len(), reference);

    let names = NameCache::new();
    process(
        ctx,
        staged,
        Granularity::Object,
        LockableReporting::On,
        &names,
        sink,
    )
}
