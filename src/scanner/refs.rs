//! Ref exclusion for push scans
//!
//! When scanning for what still has to be pushed to a remote, history the
//! remote already has can be skipped. The remote-tracking refs record what the
//! remote held at the last fetch; those commits, and everything behind them,
//! are excluded.

use crate::scanner::backend::GitBackend;
use crate::scanner::error::ScanResult;
use std::collections::HashSet;

/// Names of the refs a remote is currently known to hold
///
/// Lets callers that have talked to the remote (e.g. after `ls-remote`)
/// restrict exclusion to refs that still exist there. Without one, every
/// local tracking ref is trusted.
pub trait RemoteRefSource: Send + Sync {
    /// Short branch names (e.g. `main`) the remote holds
    fn remote_refs(&self, remote: &str) -> ScanResult<Vec<String>>;
}

/// Commit ids to exclude from a push scan against `remote`.
///
/// Symbolic `HEAD` tracking refs are skipped. Order follows the backend's ref
/// order with duplicates removed; empty when nothing has been fetched from
/// the remote yet.
pub fn calc_skipped_refs(
    backend: &dyn GitBackend,
    remote: &str,
    advertised: Option<&dyn RemoteRefSource>,
) -> ScanResult<Vec<String>> {
    let tracking = backend.remote_tracking_refs(remote)?;
    let prefix = format!("refs/remotes/{}/", remote);

    let still_on_remote: Option<HashSet<String>> = match advertised {
        Some(source) => Some(source.remote_refs(remote)?.into_iter().collect()),
        None => None,
    };

    let mut seen = HashSet::new();
    let mut skipped = Vec::new();
    for tracking_ref in tracking {
        let short = tracking_ref
            .name
            .strip_prefix(&prefix)
            .unwrap_or(&tracking_ref.name);
        if short == "HEAD" {
            continue;
        }
        if let Some(known) = &still_on_remote {
            if !known.contains(short) {
                log::debug!("not skipping {}: no longer on {}", tracking_ref.name, remote);
                continue;
            }
        }
        if seen.insert(tracking_ref.target) {
            skipped.push(tracking_ref.target.to_string());
        }
    }

    log::debug!("{} ref(s) skipped for remote {:?}", skipped.len(), remote);
    Ok(skipped)
}
