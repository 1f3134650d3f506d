//! Traversal strategy tests

use super::mock::{pointer_oid, pointer_text, MockBackend};
use super::{builder, collect};
use crate::core::pattern_parser::FilePatternMatcher;
use crate::scanner::backend::GitBackend;
use crate::scanner::error::ErrorKind;
use crate::scanner::filter::LockablePatterns;
use crate::scanner::options::{ScanMode, ScanOptions};
use crate::scanner::pointer::LfsPointerParser;
use crate::scanner::sink::{CollectingSink, LockableSink};
use crate::scanner::strategy::{scan_rev_list, ScanContext};
use std::sync::{Arc, Mutex};
use std::time::{Duration, UNIX_EPOCH};

fn names(pointers: &[crate::scanner::types::WrappedPointer]) -> Vec<&str> {
    pointers.iter().map(|p| p.name.as_str()).collect()
}

#[test]
fn test_object_level_scan_reports_each_blob_once() {
    let mut repo = MockBackend::new();
    let shared = repo.blob(pointer_text(1, 10));
    let c1 = repo.commit(&[], &[("first.bin", shared)], 1);
    let c2 = repo.commit(&[c1], &[("first.bin", shared), ("copy.bin", shared)], 2);
    repo.set_ref("refs/heads/main", c2);

    let (_, builder) = builder(repo);
    let scanner = builder.build();
    let (pointers, errors) = collect(|sink| scanner.scan_ref_with_deleted("main", Some(sink)));

    assert!(errors.is_empty());
    assert_eq!(pointers.len(), 1);
    assert_eq!(pointers[0].oid(), pointer_oid(1));
    assert_eq!(pointers[0].blob, shared);
}

#[test]
fn test_per_tree_scan_reports_blob_once_per_tree() {
    let mut repo = MockBackend::new();
    let shared = repo.blob(pointer_text(1, 10));
    let other = repo.blob("plain text\n");
    let c1 = repo.commit(&[], &[("a.bin", shared), ("b.bin", shared)], 1);
    let c2 = repo.commit(&[c1], &[("a.bin", shared), ("notes.txt", other)], 2);
    repo.set_ref("refs/heads/main", c2);

    let (_, builder) = builder(repo);
    let scanner = builder.build();
    let (pointers, _) = collect(|sink| scanner.scan_ref_range_by_tree("main", "", Some(sink)));

    // Two distinct trees contain the blob
    assert_eq!(pointers.len(), 2);
    assert!(pointers.iter().all(|p| p.blob == shared));

    let (tip_only, _) = collect(|sink| scanner.scan_ref_by_tree("main", Some(sink)));
    assert_eq!(names(&tip_only), vec!["a.bin"]);
}

#[test]
fn test_whole_repository_scan_counts_unique_blobs() {
    let mut repo = MockBackend::new();
    let blobs: Vec<_> = (1..=5).map(|seed| repo.blob(pointer_text(seed, 64))).collect();
    let readme = repo.blob("# readme\n");
    let c1 = repo.commit(
        &[],
        &[("one.bin", blobs[0]), ("dup/one.bin", blobs[0]), ("README.md", readme)],
        1,
    );
    let c2 = repo.commit(&[c1], &[("two.bin", blobs[1]), ("three.bin", blobs[2])], 2);
    let side = repo.commit(&[c1], &[("four.bin", blobs[3]), ("again/two.bin", blobs[1])], 3);
    let tagged = repo.commit(&[side], &[("five.bin", blobs[4])], 4);
    repo.set_ref("refs/heads/main", c2);
    repo.set_ref("refs/heads/side", side);
    repo.set_ref("refs/tags/v1", tagged);

    let backend = Arc::new(repo);
    let filter = FilePatternMatcher::default();
    let ctx = ScanContext {
        backend: backend.as_ref(),
        filter: &filter,
        parser: &LfsPointerParser,
        lockables: None,
        workers: 3,
    };
    let opts = ScanOptions::new(ScanMode::All);
    let sink = CollectingSink::new();
    scan_rev_list(&ctx, &opts, &sink).unwrap();

    let (pointers, errors) = sink.into_parts();
    assert!(errors.is_empty());
    assert_eq!(pointers.len(), 5);
    assert_eq!(opts.names.len().unwrap(), 5);
    for pointer in &pointers {
        assert_eq!(
            opts.names.get(&pointer.blob).unwrap().as_deref(),
            Some(pointer.name.as_str())
        );
    }
}

#[test]
fn test_identical_include_and_exclude_yields_nothing() {
    let mut repo = MockBackend::new();
    let p1 = repo.blob(pointer_text(1, 10));
    let c1 = repo.commit(&[], &[("a.bin", p1)], 1);
    repo.set_ref("refs/heads/main", c1);

    let (_, builder) = builder(repo);
    let scanner = builder.build();
    let (pointers, errors) = collect(|sink| scanner.scan_ref_range("main", "main", Some(sink)));

    assert!(pointers.is_empty());
    assert!(errors.is_empty());
}

#[test]
fn test_ref_scan_without_deleted_only_sees_tip() {
    let mut repo = MockBackend::new();
    let old = repo.blob(pointer_text(1, 10));
    let new = repo.blob(pointer_text(2, 20));
    let c1 = repo.commit(&[], &[("a.bin", old)], 1);
    let c2 = repo.commit(&[c1], &[("a.bin", new)], 2);
    repo.set_ref("refs/heads/main", c2);

    let (_, builder) = builder(repo);
    let scanner = builder.build();

    let (tip, _) = collect(|sink| scanner.scan_ref("main", Some(sink)));
    assert_eq!(tip.len(), 1);
    assert_eq!(tip[0].size(), 20);

    let (history, _) = collect(|sink| scanner.scan_ref_with_deleted("main", Some(sink)));
    assert_eq!(history.len(), 2);
}

#[test]
fn test_path_filter_applies_to_every_strategy() {
    let mut repo = MockBackend::new();
    let p1 = repo.blob(pointer_text(1, 10));
    let p2 = repo.blob(pointer_text(2, 10));
    let c1 = repo.commit(&[], &[("media/a.bin", p1), ("docs/b.bin", p2)], 1);
    repo.set_ref("refs/heads/main", c1);
    repo.stage("media/c.bin", p2);

    let (_, builder) = builder(repo);
    let filter = FilePatternMatcher::new(&["media".to_string()], &[]).unwrap();
    let scanner = builder.with_filter(filter).build();

    let (pointers, _) = collect(|sink| scanner.scan_all(Some(sink)));
    assert_eq!(names(&pointers), vec!["media/a.bin"]);

    let (tree, _) = collect(|sink| scanner.scan_tree("main", Some(sink)));
    assert_eq!(names(&tree), vec!["media/a.bin"]);
}

#[test]
fn test_index_scan_with_path_filtered_out_yields_nothing() {
    let mut repo = MockBackend::new();
    let p1 = repo.blob(pointer_text(1, 10));
    repo.stage("staged.bin", p1);

    let (_, builder) = builder(repo);
    let scanner = builder
        .with_filter(|path: &str| path != "staged.bin")
        .build();
    let (pointers, errors) = collect(|sink| scanner.scan_index("HEAD", Some(sink)));

    assert!(pointers.is_empty());
    assert!(errors.is_empty());
}

#[test]
fn test_index_scan_reports_changes_against_ref() {
    let mut repo = MockBackend::new();
    let committed = repo.blob(pointer_text(1, 10));
    let edited = repo.blob(pointer_text(2, 10));
    let added = repo.blob(pointer_text(3, 10));
    let c1 = repo.commit(&[], &[("kept.bin", committed), ("edit.bin", committed)], 1);
    repo.set_ref("HEAD", c1);
    repo.stage("kept.bin", committed);
    repo.stage("edit.bin", edited);
    repo.stage("new.bin", added);

    let (_, builder) = builder(repo);
    let scanner = builder.build();
    let (pointers, _) = collect(|sink| scanner.scan_index("HEAD", Some(sink)));

    assert_eq!(names(&pointers), vec!["edit.bin", "new.bin"]);
}

#[test]
fn test_index_scan_without_commits_reports_everything_staged() {
    let mut repo = MockBackend::new();
    let p1 = repo.blob(pointer_text(1, 10));
    let p2 = repo.blob(pointer_text(2, 10));
    repo.stage("a.bin", p1);
    repo.stage("b.bin", p2);

    let (_, builder) = builder(repo);
    let scanner = builder.build();
    let (pointers, _) = collect(|sink| scanner.scan_index("HEAD", Some(sink)));

    assert_eq!(names(&pointers), vec!["a.bin", "b.bin"]);
}

#[test]
fn test_unpushed_without_remotes_returns_all_history() {
    let mut repo = MockBackend::new();
    let p1 = repo.blob(pointer_text(1, 10));
    let p2 = repo.blob(pointer_text(2, 10));
    let p3 = repo.blob(pointer_text(3, 10));
    let c1 = repo.commit(&[], &[("a.bin", p1)], 1);
    let c2 = repo.commit(&[c1], &[("a.bin", p2)], 2);
    let t1 = repo.commit(&[c1], &[("a.bin", p1), ("t.bin", p3)], 3);
    repo.set_ref("refs/heads/main", c2);
    repo.set_ref("refs/tags/v1", t1);

    let (_, builder) = builder(repo);
    let scanner = builder.build();
    let (pointers, _) = collect(|sink| scanner.scan_unpushed("", Some(sink)));

    assert_eq!(pointers.len(), 3);
}

#[test]
fn test_unpushed_excludes_tracking_refs() {
    let mut repo = MockBackend::new();
    let p1 = repo.blob(pointer_text(1, 10));
    let p2 = repo.blob(pointer_text(2, 10));
    let p3 = repo.blob(pointer_text(3, 10));
    let c1 = repo.commit(&[], &[("a.bin", p1)], 1);
    let c2 = repo.commit(&[c1], &[("a.bin", p2)], 2);
    let c3 = repo.commit(&[c2], &[("a.bin", p3)], 3);
    repo.set_ref("refs/heads/main", c3);
    repo.set_ref("refs/remotes/origin/main", c1);
    repo.set_ref("refs/remotes/backup/main", c2);

    let (_, builder) = builder(repo);
    let scanner = builder.build();

    let (to_origin, _) = collect(|sink| scanner.scan_unpushed("origin", Some(sink)));
    assert_eq!(to_origin.len(), 2);

    let (to_any, _) = collect(|sink| scanner.scan_unpushed("", Some(sink)));
    assert_eq!(to_any.len(), 1);
    assert_eq!(to_any[0].oid(), pointer_oid(3));
}

#[test]
fn test_malformed_pointer_is_reported_without_aborting() {
    let mut repo = MockBackend::new();
    let good = repo.blob(pointer_text(1, 10));
    let bad = repo.blob("version https://git-lfs.github.com/spec/v1\noid sha256:nope\nsize 1\n");
    let c1 = repo.commit(&[], &[("good.bin", good), ("bad.bin", bad)], 1);
    repo.set_ref("refs/heads/main", c1);

    let (_, builder) = builder(repo);
    let scanner = builder.build();
    let (pointers, errors) = collect(|sink| scanner.scan_all(Some(sink)));

    assert_eq!(names(&pointers), vec!["good.bin"]);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind(), ErrorKind::Pointer);
    assert!(errors[0].to_string().contains("bad.bin"));
}

#[test]
fn test_backend_read_failure_aborts_scan() {
    let mut repo = MockBackend::new();
    let good = repo.blob(pointer_text(1, 10));
    let broken = repo.broken_blob();
    let c1 = repo.commit(&[], &[("good.bin", good), ("broken.bin", broken)], 1);
    repo.set_ref("refs/heads/main", c1);

    let (_, builder) = builder(repo);
    let scanner = builder.build();
    let sink = CollectingSink::new();
    let err = scanner.scan_all(Some(&sink)).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Backend);
    assert!(err.to_string().contains("corrupt object"));
}

#[test]
fn test_oversized_blobs_are_not_read() {
    let mut repo = MockBackend::new();
    let large = repo.blob(vec![b'x'; 4096]);
    let c1 = repo.commit(&[], &[("large.bin", large)], 1);
    repo.set_ref("refs/heads/main", c1);

    let (_, builder) = builder(repo);
    let scanner = builder.build();
    let (pointers, errors) = collect(|sink| scanner.scan_all(Some(sink)));

    assert!(pointers.is_empty());
    assert!(errors.is_empty());
}

#[derive(Default)]
struct LockableRecorder(Mutex<Vec<String>>);

impl LockableSink for LockableRecorder {
    fn found(&self, path: &str) {
        self.0.lock().unwrap().push(path.to_string());
    }
}

#[test]
fn test_tree_scan_reports_every_path_and_lockables() {
    let mut repo = MockBackend::new();
    let pointer = repo.blob(pointer_text(1, 10));
    let psd = repo.blob("raw photoshop bytes");
    let c1 = repo.commit(
        &[],
        &[
            ("art/a.psd", psd),
            ("art/b.psd", psd),
            ("art/cover.psd", pointer),
            ("copy/cover.psd", pointer),
            ("src/lib.rs", psd),
        ],
        1,
    );
    repo.set_ref("refs/heads/main", c1);

    let recorder = Arc::new(LockableRecorder::default());
    let lockables = Arc::new(LockablePatterns::new(&["*.psd".to_string()]).unwrap());
    let (_, builder) = builder(repo);
    let scanner = builder.with_lockables(lockables, recorder.clone()).build();

    let (pointers, _) = collect(|sink| scanner.scan_tree("main", Some(sink)));
    assert_eq!(names(&pointers), vec!["art/cover.psd", "copy/cover.psd"]);

    let mut locked = recorder.0.lock().unwrap().clone();
    locked.sort();
    assert_eq!(locked, vec!["art/a.psd", "art/b.psd"]);

    // History scans never report lockables
    recorder.0.lock().unwrap().clear();
    collect(|sink| scanner.scan_all(Some(sink)));
    assert!(recorder.0.lock().unwrap().is_empty());
}

#[test]
fn test_index_scan_reports_every_lockable_path_sharing_a_blob() {
    let mut repo = MockBackend::new();
    let psd = repo.blob("raw photoshop bytes");
    let pointer = repo.blob(pointer_text(1, 10));
    repo.stage("art/a.psd", psd);
    repo.stage("art/b.psd", psd);
    repo.stage("art/cover.psd", pointer);
    repo.stage("copy/cover.psd", pointer);

    let recorder = Arc::new(LockableRecorder::default());
    let lockables = Arc::new(LockablePatterns::new(&["*.psd".to_string()]).unwrap());
    let (_, builder) = builder(repo);
    let scanner = builder.with_lockables(lockables, recorder.clone()).build();

    let (pointers, _) = collect(|sink| scanner.scan_index("HEAD", Some(sink)));
    // pointers stay deduplicated by content
    assert_eq!(pointers.len(), 1);

    let mut locked = recorder.0.lock().unwrap().clone();
    locked.sort();
    assert_eq!(locked, vec!["art/a.psd", "art/b.psd"]);
}

#[test]
fn test_whole_repository_scan_skips_refs_without_history() {
    let mut repo = MockBackend::new();
    let p1 = repo.blob(pointer_text(1, 10));
    let c1 = repo.commit(&[], &[("a.bin", p1)], 1);
    repo.set_ref("refs/heads/main", c1);
    repo.set_ref("refs/tags/blob-tag", p1);

    let (_, builder) = builder(repo);
    let scanner = builder.build();
    let (pointers, errors) = collect(|sink| scanner.scan_all(Some(sink)));

    assert_eq!(names(&pointers), vec!["a.bin"]);
    assert!(errors.is_empty());
}

#[test]
fn test_stash_scan_reports_stashed_pointers() {
    let mut repo = MockBackend::new();
    let stashed = repo.blob(pointer_text(7, 70));
    let plain = repo.blob("work in progress");
    repo.stash("wip.bin", stashed);
    repo.stash("again/wip.bin", stashed);
    repo.stash("notes.txt", plain);

    let (_, builder) = builder(repo);
    let scanner = builder.build();
    let (pointers, _) = collect(|sink| scanner.scan_stashed(Some(sink)));

    assert_eq!(names(&pointers), vec!["wip.bin"]);
    assert_eq!(pointers[0].size(), 70);
}

#[test]
fn test_previous_versions_since_cutoff() {
    let mut repo = MockBackend::new();
    let v1 = repo.blob(pointer_text(1, 10));
    let v2 = repo.blob(pointer_text(2, 20));
    let gone = repo.blob(pointer_text(3, 30));
    let c1 = repo.commit(&[], &[("a.bin", v1), ("b.bin", gone)], 100);
    let c2 = repo.commit(&[c1], &[("a.bin", v2), ("b.bin", gone)], 200);
    let c3 = repo.commit(&[c2], &[("a.bin", v2)], 300);
    repo.set_ref("refs/heads/main", c3);

    let (_, builder) = builder(repo);
    let scanner = builder.build();

    let (both, _) = collect(|sink| {
        scanner.scan_previous_versions("main", UNIX_EPOCH + Duration::from_secs(150), Some(sink))
    });
    assert_eq!(names(&both), vec!["a.bin", "b.bin"]);
    assert_eq!(both[0].oid(), pointer_oid(1));

    let (recent, _) = collect(|sink| {
        scanner.scan_previous_versions("main", UNIX_EPOCH + Duration::from_secs(250), Some(sink))
    });
    assert_eq!(names(&recent), vec!["b.bin"]);
    assert_eq!(recent[0].oid(), pointer_oid(3));

    // Content current at the ref is never a previous version
    let (none, _) = collect(|sink| {
        scanner.scan_previous_versions("main", UNIX_EPOCH + Duration::from_secs(400), Some(sink))
    });
    assert!(none.is_empty());
}

#[test]
fn test_backend_is_shared_read_only() {
    let repo = MockBackend::new();
    let backend: Arc<dyn GitBackend> = Arc::new(repo);
    assert!(backend.all_refs().unwrap().is_empty());
    assert_eq!(backend.resolve("HEAD").unwrap(), None);
}
