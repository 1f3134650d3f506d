//! Scan of content that only exists in stashes

use super::{process, Candidate, Granularity, LockableReporting, ScanContext};
use crate::scanner::error::ScanResult;
use crate::scanner::name_cache::NameCache;
use crate::scanner::sink::PointerSink;

pub(crate) fn scan_stashed(ctx: &ScanContext<'_>, sink: &dyn PointerSink) -> ScanResult<()> {
    let entries = ctx.backend.stash_entries()?;
    log::debug!("{} blob(s) introduced by stash entries", entries.len());

    let names = NameCache::new();
    process(
        ctx,
        entries
            .into_iter()
            .map(|entry| Candidate::new(entry.path, entry.blob)),
        Granularity::Object,
        LockableReporting::Off,
        &names,
        sink,
    )
}
