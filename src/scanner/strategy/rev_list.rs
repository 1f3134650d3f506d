//! Reachability scans over ref ranges (refs, all, range-to-remote)

use super::{process, Candidate, Granularity, LockableReporting, ScanContext};
use crate::scanner::error::ScanResult;
use crate::scanner::options::ScanOptions;
use crate::scanner::sink::PointerSink;

/// Scan every blob in the commits selected by `opts.mode`.
///
/// With `opts.include_deleted` the whole range is walked, so content that a
/// later commit replaced or removed is still found; otherwise only the trees
/// of the include tips are visited.
pub(crate) fn scan_rev_list(
    ctx: &ScanContext<'_>,
    opts: &ScanOptions,
    sink: &dyn PointerSink,
) -> ScanResult<()> {
    let query = opts.rev_list_query(ctx.backend)?;
    log::debug!(
        "scanning {} mode: include={:?} exclude={} ref(s) dedup={} deleted={}",
        opts.mode,
        query.include,
        query.exclude.len(),
        opts.dedup,
        opts.include_deleted
    );
    if query.include.is_empty() {
        return Ok(());
    }

    let events = ctx.backend.reachable(&query)?;
    let candidates = events
        .into_iter()
        .map(|event| Candidate::new(event.path, event.blob).in_tree(event.tree));

    process(
        ctx,
        candidates,
        Granularity::from(opts.dedup),
        LockableReporting::Off,
        &opts.names,
        sink,
    )
}
