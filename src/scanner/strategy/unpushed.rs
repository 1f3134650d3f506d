//! Scan of local history no remote has yet

use super::{process, Candidate, Granularity, LockableReporting, ScanContext};
use crate::scanner::backend::{RevListQuery, WalkDepth};
use crate::scanner::error::ScanResult;
use crate::scanner::name_cache::NameCache;
use crate::scanner::sink::PointerSink;

/// Report pointers reachable from local branches and tags but not from the
/// tracking refs of `remote` (of any remote when `remote` is empty).
pub(crate) fn scan_unpushed(
    ctx: &ScanContext<'_>,
    remote: &str,
    sink: &dyn PointerSink,
) -> ScanResult<()> {
    let include = ctx.backend.local_refs()?;
    let exclude: Vec<String> = ctx
        .backend
        .remote_tracking_refs(remote)?
        .into_iter()
        .map(|tracking| tracking.target.to_string())
        .collect();
    log::debug!(
        "unpushed to {:?}: {} local ref(s), {} tracking ref(s)",
        remote,
        include.len(),
        exclude.len()
    );
    if include.is_empty() {
        return Ok(());
    }

    let events = ctx.backend.reachable(&RevListQuery {
        include,
        exclude,
        depth: WalkDepth::History,
    })?;

    let names = NameCache::new();
    process(
        ctx,
        events
            .into_iter()
            .map(|event| Candidate::new(event.path, event.blob).in_tree(event.tree)),
        Granularity::Object,
        LockableReporting::Off,
        &names,
        sink,
    )
}
