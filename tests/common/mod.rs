//! Shared fixtures for integration tests
//!
//! Repositories are built with the git CLI inside a temporary directory, the
//! same way a user would create them.

#![allow(dead_code)]

use lfscan::scanner::api::{CollectingSink, GitBackend, GixBackend, ScanError, WrappedPointer};
use std::path::Path;
use std::process::Command;
use std::sync::Arc;
use tempfile::TempDir;

/// Valid pointer text whose oid is derived from `seed`
pub fn pointer_text(seed: u8, size: u64) -> String {
    format!(
        "version https://git-lfs.github.com/spec/v1\noid sha256:{}\nsize {}\n",
        pointer_oid(seed),
        size
    )
}

pub fn pointer_oid(seed: u8) -> String {
    format!("{:02x}", seed).repeat(32)
}

pub struct TestRepo {
    dir: TempDir,
}

impl TestRepo {
    /// Empty repository on branch `main`
    pub fn new() -> Self {
        let repo = Self {
            dir: TempDir::new().unwrap(),
        };
        repo.git(&["init", "-q"]);
        repo.git(&["symbolic-ref", "HEAD", "refs/heads/main"]);
        repo.git(&["config", "user.name", "Test User"]);
        repo.git(&["config", "user.email", "test@example.com"]);
        repo.git(&["config", "commit.gpgsign", "false"]);
        repo
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Run git in the repository and return trimmed stdout
    pub fn git(&self, args: &[&str]) -> String {
        self.git_with_env(args, &[])
    }

    fn git_with_env(&self, args: &[&str], env: &[(&str, String)]) -> String {
        let output = Command::new("git")
            .args(args)
            .current_dir(self.path())
            .envs(env.iter().map(|(k, v)| (*k, v.as_str())))
            .output()
            .unwrap();
        assert!(
            output.status.success(),
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    }

    pub fn write(&self, path: &str, content: impl AsRef<[u8]>) {
        let full = self.path().join(path);
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(full, content).unwrap();
    }

    pub fn remove(&self, path: &str) {
        std::fs::remove_file(self.path().join(path)).unwrap();
    }

    /// Stage everything and commit; returns the new commit id
    pub fn commit(&self, message: &str) -> String {
        self.git(&["add", "-A"]);
        self.git(&["commit", "-q", "-m", message]);
        self.git(&["rev-parse", "HEAD"])
    }

    /// Like [`commit`](Self::commit) with author and committer time `epoch_secs`
    pub fn commit_at(&self, message: &str, epoch_secs: i64) -> String {
        let date = format!("@{} +0000", epoch_secs);
        self.git(&["add", "-A"]);
        self.git_with_env(
            &["commit", "-q", "-m", message],
            &[
                ("GIT_AUTHOR_DATE", date.clone()),
                ("GIT_COMMITTER_DATE", date),
            ],
        );
        self.git(&["rev-parse", "HEAD"])
    }

    pub fn backend(&self) -> Arc<dyn GitBackend> {
        Arc::new(GixBackend::discover(self.path()).unwrap())
    }
}

/// Run `scan` with a fresh collecting sink; pointers come back sorted by name
pub fn collect(
    scan: impl FnOnce(&CollectingSink) -> Result<(), ScanError>,
) -> (Vec<WrappedPointer>, Vec<ScanError>) {
    let sink = CollectingSink::new();
    scan(&sink).expect("scan failed");
    let (mut pointers, errors) = sink.into_parts();
    pointers.sort_by(|a, b| a.name.cmp(&b.name).then(a.oid().cmp(b.oid())));
    (pointers, errors)
}

pub fn names(pointers: &[WrappedPointer]) -> Vec<&str> {
    pointers.iter().map(|p| p.name.as_str()).collect()
}
