//! Direct scan of one tree, without history

use super::{process, Candidate, Granularity, LockableReporting, ScanContext};
use crate::scanner::error::ScanResult;
use crate::scanner::name_cache::NameCache;
use crate::scanner::sink::PointerSink;

/// Report every pointer path in the tree at `reference`.
///
/// Paths sharing content are all reported. Non-pointer paths that are lock
/// candidates go to the lockable sink.
pub(crate) fn scan_tree(
    ctx: &ScanContext<'_>,
    reference: &str,
    sink: &dyn PointerSink,
) -> ScanResult<()> {
    log::debug!("scanning tree at {}", reference);
    let entries = ctx.backend.tree_entries(reference)?;
    let names = NameCache::new();

    process(
        ctx,
        entries
            .into_iter()
            .map(|entry| Candidate::new(entry.path, entry.blob)),
        Granularity::PerPath,
        LockableReporting::On,
        &names,
        sink,
    )
}
