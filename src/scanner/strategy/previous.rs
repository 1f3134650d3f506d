//! Scan of superseded content within a time window

use super::{process, Candidate, Granularity, LockableReporting, ScanContext};
use crate::scanner::error::ScanResult;
use crate::scanner::name_cache::NameCache;
use crate::scanner::sink::PointerSink;
use std::collections::HashSet;
use std::time::SystemTime;

/// Report the previous versions of content changed by commits reachable from
/// `reference` since `since`.
///
/// For each such commit the old side of every modified or deleted path is a
/// candidate. Content still present in the tree at `reference` is not a
/// previous version and is skipped.
pub(crate) fn scan_previous_versions(
    ctx: &ScanContext<'_>,
    reference: &str,
    since: SystemTime,
    sink: &dyn PointerSink,
) -> ScanResult<()> {
    let log = ctx.backend.commit_log_since(reference, since)?;
    let current: HashSet<_> = ctx
        .backend
        .tree_entries(reference)?
        .into_iter()
        .map(|entry| entry.blob)
        .collect();
    log::debug!("{} commit(s) since cutoff on {}", log.len(), reference);

    let superseded: Vec<Candidate> = log
        .into_iter()
        .flat_map(|diff| diff.changes)
        .filter_map(|change| match change.old {
            Some(old) if change.new != Some(old) && !current.contains(&old) => {
                Some(Candidate::new(change.path, old))
            }
            _ => None,
        })
        .collect();

    let names = NameCache::new();
    process(
        ctx,
        superseded,
        Granularity::Object,
        LockableReporting::Off,
        &names,
        sink,
    )
}
