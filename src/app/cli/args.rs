//! Command line arguments
//!
//! Global options configure the scanner and logging; the subcommand picks the
//! scan. Options marked * can be given multiple times or as a comma-separated
//! list.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "lfscan")]
#[command(about = "Find large-file pointers and lockable paths in a git repository")]
#[command(version)]
#[command(after_help = " * can be specified multiple times or as a comma-separated list")]
pub struct Args {
    /// Repository to scan (any path inside the work tree)
    #[arg(short = 'r', long = "repo", value_name = "PATH", default_value = ".")]
    pub repository: PathBuf,

    /// Configuration file path
    #[arg(short = 'c', long = "config-file", value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Force colored output on
    #[arg(short = 'g', long = "color", conflicts_with = "no_color")]
    pub color: bool,

    /// Force colored output off
    #[arg(long = "no-color")]
    pub no_color: bool,

    /// Log level
    #[arg(short = 'l', long = "log-level", value_name = "LEVEL", value_parser = ["trace", "debug", "info", "warn", "error", "off"])]
    pub log_level: Option<String>,

    /// Log file path (use 'none' to log to stderr)
    #[arg(short = 'f', long = "log-file", value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Log output format
    #[arg(short = 'o', long = "log-format", value_name = "FORMAT", value_parser = ["text", "ext", "json"])]
    pub log_format: Option<String>,

    /// Path patterns to include*
    #[arg(short = 'I', long = "include", value_name = "PATTERNS", action = ArgAction::Append)]
    pub include: Vec<String>,

    /// Path patterns to exclude*
    #[arg(short = 'X', long = "exclude", value_name = "PATTERNS", action = ArgAction::Append)]
    pub exclude: Vec<String>,

    /// Patterns of paths that are lock candidates*
    #[arg(short = 'L', long = "lockable", value_name = "PATTERNS", action = ArgAction::Append)]
    pub lockable: Vec<String>,

    /// Remote that push scans are relative to
    #[arg(long = "remote", value_name = "NAME")]
    pub remote: Option<String>,

    /// Number of blob-reading workers (default: available parallelism)
    #[arg(short = 'j', long = "workers", value_name = "COUNT")]
    pub workers: Option<usize>,

    /// Print one JSON object per result instead of text
    #[arg(long = "json")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// History reachable from the given refs and not from the excluded ones
    Refs {
        #[arg(required = true, value_name = "REF")]
        include: Vec<String>,

        /// Refs whose history is skipped*
        #[arg(short = 'x', long = "not", value_name = "REF", action = ArgAction::Append)]
        exclude: Vec<String>,
    },

    /// History in EXCLUDE..INCLUDE
    Range {
        include: String,

        #[arg(default_value = "")]
        exclude: String,

        /// Report a pointer once per tree it appears in
        #[arg(long = "by-tree")]
        by_tree: bool,
    },

    /// A single ref, by default only its current tree
    Ref {
        reference: String,

        /// Walk the whole history, including replaced and deleted content
        #[arg(long = "with-deleted", conflicts_with = "by_tree")]
        with_deleted: bool,

        /// Report a pointer once per tree it appears in
        #[arg(long = "by-tree")]
        by_tree: bool,
    },

    /// History of every ref
    All,

    /// Every pointer path in one tree, plus lockable paths
    Tree {
        #[arg(default_value = "HEAD")]
        reference: String,
    },

    /// What pushing INCLUDE to the bound remote would send
    Push {
        include: String,

        /// Refs whose history is skipped*
        #[arg(short = 'x', long = "not", value_name = "REF", action = ArgAction::Append)]
        exclude: Vec<String>,
    },

    /// Local history not on REMOTE (any remote when omitted)
    Unpushed { remote: Option<String> },

    /// Content only present in stashes
    Stash,

    /// Content replaced or deleted on REF since a date
    Previous {
        #[arg(default_value = "HEAD")]
        reference: String,

        /// ISO 8601 date, @unix-seconds, or relative ('2 weeks ago')
        #[arg(short = 'S', long = "since", value_name = "DATE_TIME", default_value = "1 week ago")]
        since: String,
    },

    /// Staged pointers that differ from REF, plus lockable paths
    Index {
        #[arg(default_value = "HEAD")]
        reference: String,
    },
}

impl Command {
    /// Short name used in log messages
    pub fn name(&self) -> &'static str {
        match self {
            Command::Refs { .. } => "refs",
            Command::Range { .. } => "range",
            Command::Ref { .. } => "ref",
            Command::All => "all",
            Command::Tree { .. } => "tree",
            Command::Push { .. } => "push",
            Command::Unpushed { .. } => "unpushed",
            Command::Stash => "stash",
            Command::Previous { .. } => "previous",
            Command::Index { .. } => "index",
        }
    }
}

impl Args {
    /// Color override from the command line; `None` means decide from the terminal
    pub fn color_override(&self) -> Option<bool> {
        match (self.color, self.no_color) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("lfscan").chain(argv.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults() {
        let args = parse(&["all"]);
        assert_eq!(args.repository, PathBuf::from("."));
        assert_eq!(args.command, Command::All);
        assert_eq!(args.color_override(), None);
        assert!(!args.json);
    }

    #[test]
    fn test_global_options() {
        let args = parse(&[
            "-r", "/tmp/repo", "--include", "*.bin,*.psd", "-X", "vendor", "--lockable", "*.psd",
            "-j", "2", "--no-color", "--json", "tree",
        ]);
        assert_eq!(args.repository, PathBuf::from("/tmp/repo"));
        assert_eq!(args.include, vec!["*.bin,*.psd"]);
        assert_eq!(args.exclude, vec!["vendor"]);
        assert_eq!(args.workers, Some(2));
        assert_eq!(args.color_override(), Some(false));
        assert_eq!(
            args.command,
            Command::Tree {
                reference: "HEAD".to_string()
            }
        );
    }

    #[test]
    fn test_refs_subcommand() {
        let args = parse(&["refs", "main", "topic", "--not", "origin/main"]);
        assert_eq!(
            args.command,
            Command::Refs {
                include: vec!["main".to_string(), "topic".to_string()],
                exclude: vec!["origin/main".to_string()],
            }
        );
    }

    #[test]
    fn test_ref_flags_conflict() {
        let result = Args::try_parse_from(["lfscan", "ref", "main", "--with-deleted", "--by-tree"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_previous_defaults() {
        let args = parse(&["previous"]);
        assert_eq!(
            args.command,
            Command::Previous {
                reference: "HEAD".to_string(),
                since: "1 week ago".to_string(),
            }
        );
        assert_eq!(args.command.name(), "previous");
    }

    #[test]
    fn test_color_flags_conflict() {
        assert!(Args::try_parse_from(["lfscan", "--color", "--no-color", "all"]).is_err());
    }
}
