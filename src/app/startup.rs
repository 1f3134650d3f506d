//! Application startup
//!
//! Parses arguments, loads configuration, initialises logging, then runs the
//! selected scan on a blocking worker of a tokio runtime.

use super::cli::{Args, Command, ConfigError, ScannerConfig};
use super::output::{OutputFormat, Reporter, ScanSummary};
use crate::core::date_parser::parse_date;
use crate::core::error_handling::{log_error_with_context, ContextualError};
use crate::core::logging::init_logging;
use crate::core::pattern_parser::FilePatternMatcher;
use crate::scanner::api::{
    GitBackend, GitScanner, GixBackend, LockablePatterns, PointerSink, ScanError,
};
use clap::{CommandFactory, FromArgMatches};
use std::io::IsTerminal;
use std::sync::Arc;

/// Exit status when the scan ran but some candidates held malformed pointers
const EXIT_OBJECT_ERRORS: i32 = 2;

/// Failures that stop `lfscan` before or during a scan
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error("Scan task failed: {0}")]
    Join(String),
}

impl ContextualError for StartupError {
    fn is_user_actionable(&self) -> bool {
        match self {
            StartupError::Config(e) => e.is_user_actionable(),
            StartupError::Scan(e) => e.is_user_actionable(),
            StartupError::Join(_) => false,
        }
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            StartupError::Config(e) => e.user_message(),
            StartupError::Scan(e) => e.user_message(),
            StartupError::Join(_) => None,
        }
    }
}

fn long_version() -> String {
    format!(
        "{} (built {}, commit {})",
        env!("CARGO_PKG_VERSION"),
        crate::BUILD_TIME,
        crate::GIT_HASH
    )
}

/// Entry point of the `lfscan` binary
pub fn startup() {
    let matches = Args::command().long_version(long_version()).get_matches();
    let args = Args::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());

    // Logging is not up yet, so configuration errors go straight to stderr
    let config = match ScannerConfig::load(args.config_file.as_deref()) {
        Ok(config) => config.merge_args(&args),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let use_color = config
        .logging
        .color
        .unwrap_or_else(|| std::io::stdout().is_terminal());
    colored::control::set_override(use_color);

    let log_file = config
        .logging
        .file
        .as_ref()
        .map(|p| p.to_string_lossy().to_string());
    if let Err(e) = init_logging(
        config.logging.level.as_deref(),
        config.logging.format.as_deref(),
        log_file.as_deref(),
        use_color,
    ) {
        eprintln!("Error: failed to initialise logging: {}", e);
        std::process::exit(1);
    }

    log::debug!("lfscan {} starting", long_version());
    log::debug!("effective configuration: {:?}", config);

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            log::error!("FATAL: failed to start runtime: {}", e);
            std::process::exit(1);
        }
    };

    match runtime.block_on(run(args, config)) {
        Ok(summary) => {
            log::info!(
                "{} pointer(s), {} lockable path(s), {} error(s)",
                summary.pointers,
                summary.lockables,
                summary.errors
            );
            if summary.errors > 0 {
                std::process::exit(EXIT_OBJECT_ERRORS);
            }
        }
        Err(e) => {
            log_error_with_context(&e, "Scanning repository");
            std::process::exit(1);
        }
    }
}

/// Build the scanner from `config` and run `args.command` to completion
pub async fn run(args: Args, config: ScannerConfig) -> Result<ScanSummary, StartupError> {
    let format = if args.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };
    let reporter = Arc::new(Reporter::new(format));
    let repository = args.repository.clone();
    let command = args.command.clone();

    let task_reporter = Arc::clone(&reporter);
    let outcome = tokio::task::spawn_blocking(move || -> Result<(), StartupError> {
        let backend: Arc<dyn GitBackend> = Arc::new(GixBackend::discover(&repository)?);
        let mut scanner = build_scanner(backend, &config, Arc::clone(&task_reporter))?;
        let result = execute(&mut scanner, &command, &config, task_reporter.as_ref());
        scanner.close();
        result
    })
    .await
    .map_err(|e| StartupError::Join(e.to_string()))?;

    outcome?;
    Ok(reporter.summary())
}

/// Scanner with the configured filters, lockables and worker count
pub fn build_scanner(
    backend: Arc<dyn GitBackend>,
    config: &ScannerConfig,
    reporter: Arc<Reporter>,
) -> Result<GitScanner, ConfigError> {
    let filter = FilePatternMatcher::new(&config.include, &config.exclude)
        .map_err(|e| ConfigError::invalid("path pattern", e))?;

    let mut builder = GitScanner::builder(backend)
        .with_filter(filter)
        .with_workers(config.workers.unwrap_or(0))
        .with_callback(reporter.clone());

    if !config.lockable.is_empty() {
        let lockables = LockablePatterns::new(&config.lockable)
            .map_err(|e| ConfigError::invalid("lockable pattern", e))?;
        builder = builder.with_lockables(Arc::new(lockables), reporter);
    }
    Ok(builder.build())
}

/// Dispatch one subcommand to the matching scan
pub fn execute(
    scanner: &mut GitScanner,
    command: &Command,
    config: &ScannerConfig,
    sink: &dyn PointerSink,
) -> Result<(), StartupError> {
    log::debug!("running {} scan", command.name());
    let sink = Some(sink);
    match command {
        Command::Refs { include, exclude } => scanner.scan_refs(include, exclude, sink)?,
        Command::Range {
            include,
            exclude,
            by_tree: false,
        } => scanner.scan_ref_range(include, exclude, sink)?,
        Command::Range {
            include,
            exclude,
            by_tree: true,
        } => scanner.scan_ref_range_by_tree(include, exclude, sink)?,
        Command::Ref {
            reference,
            with_deleted: true,
            ..
        } => scanner.scan_ref_with_deleted(reference, sink)?,
        Command::Ref {
            reference,
            by_tree: true,
            ..
        } => scanner.scan_ref_by_tree(reference, sink)?,
        Command::Ref { reference, .. } => scanner.scan_ref(reference, sink)?,
        Command::All => scanner.scan_all(sink)?,
        Command::Tree { reference } => scanner.scan_tree(reference, sink)?,
        Command::Push { include, exclude } => {
            if let Some(remote) = config.remote.as_deref() {
                scanner.remote_for_push(remote)?;
            }
            scanner.scan_multi_range_to_remote(include, exclude, sink)?
        }
        Command::Unpushed { remote } => {
            let remote = remote
                .as_deref()
                .or(config.remote.as_deref())
                .unwrap_or_default();
            scanner.scan_unpushed(remote, sink)?
        }
        Command::Stash => scanner.scan_stashed(sink)?,
        Command::Previous { reference, since } => {
            let since = parse_date(since).map_err(|e| ConfigError::invalid("--since", e))?;
            scanner.scan_previous_versions(reference, since, sink)?
        }
        Command::Index { reference } => scanner.scan_index(reference, sink)?,
    }
    Ok(())
}
