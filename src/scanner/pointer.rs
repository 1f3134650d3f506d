//! Pointer file parsing
//!
//! A pointer is a short text blob:
//!
//! ```text
//! version https://git-lfs.github.com/spec/v1
//! ext-0-foo sha256:<64 hex>
//! oid sha256:<64 hex>
//! size 12345
//! ```
//!
//! Blobs that do not start with a `version` line naming one of the pointer
//! specs (`git-lfs`, `hawser`, `git-media`) are simply not pointers; a plain
//! `version 1.4.2` file is ordinary content. Blobs that do, but are malformed,
//! are reported as [`PointerError`]s so that the scanner can surface them as
//! per-object errors.

use crate::scanner::types::{Pointer, PointerExtension};
use once_cell::sync::Lazy;
use regex::Regex;

/// Pointers are never larger than this; bigger blobs are skipped unread.
pub const MAX_POINTER_SIZE: u64 = 1024;

const VERSION_LATEST: &str = "https://git-lfs.github.com/spec/v1";
const VERSION_ALIASES: &[&str] = &[
    "http://git-media.io/v/2",
    "https://hawser.github.com/spec/v1",
    VERSION_LATEST,
];

/// Any version URL mentioning one of these is treated as a pointer attempt
const SPEC_MARKERS: &[&str] = &["git-lfs", "hawser", "git-media"];

static OID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^sha256:([0-9a-f]{64})$").unwrap());
static EXT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^ext-([0-9])-([a-z0-9]+)$").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PointerError {
    #[error("unsupported pointer version {0:?}")]
    UnsupportedVersion(String),

    #[error("missing required key {0:?}")]
    MissingKey(&'static str),

    #[error("invalid oid {0:?}")]
    InvalidOid(String),

    #[error("invalid size {0:?}")]
    InvalidSize(String),

    #[error("invalid extension {0:?}")]
    InvalidExtension(String),

    #[error("unexpected line {0:?}")]
    UnexpectedLine(String),
}

/// Decodes raw blob bytes into a [`Pointer`]
pub trait PointerParser: Send + Sync {
    /// `Ok(None)` when the blob is not a pointer at all.
    fn parse(&self, data: &[u8]) -> Result<Option<Pointer>, PointerError>;
}

/// Parser for the version 1 pointer format
#[derive(Debug, Default, Clone, Copy)]
pub struct LfsPointerParser;

impl PointerParser for LfsPointerParser {
    fn parse(&self, data: &[u8]) -> Result<Option<Pointer>, PointerError> {
        if data.len() as u64 > MAX_POINTER_SIZE {
            return Ok(None);
        }
        let text = match std::str::from_utf8(data) {
            Ok(text) => text,
            Err(_) => return Ok(None),
        };
        if !text.starts_with("version ") {
            return Ok(None);
        }

        let mut lines = text.lines().filter(|l| !l.trim().is_empty());

        // First line is guaranteed to start with "version "
        let version = lines
            .next()
            .and_then(|l| l.strip_prefix("version "))
            .unwrap_or_default()
            .trim();
        if !SPEC_MARKERS.iter().any(|marker| version.contains(marker)) {
            return Ok(None);
        }
        if !VERSION_ALIASES.contains(&version) {
            return Err(PointerError::UnsupportedVersion(version.to_string()));
        }

        let mut oid = None;
        let mut size = None;
        let mut extensions = Vec::new();

        for line in lines {
            let (key, value) = line
                .split_once(' ')
                .ok_or_else(|| PointerError::UnexpectedLine(line.to_string()))?;
            match key {
                "oid" => oid = Some(parse_oid(value)?),
                "size" => {
                    let parsed = value
                        .trim()
                        .parse::<u64>()
                        .map_err(|_| PointerError::InvalidSize(value.to_string()))?;
                    size = Some(parsed);
                }
                k if k.starts_with("ext-") => extensions.push(parse_extension(k, value)?),
                _ => return Err(PointerError::UnexpectedLine(line.to_string())),
            }
        }

        extensions.sort_by_key(|e| e.priority);
        if extensions
            .windows(2)
            .any(|pair| pair[0].priority == pair[1].priority)
        {
            return Err(PointerError::InvalidExtension(
                "duplicate extension priority".to_string(),
            ));
        }

        Ok(Some(Pointer {
            oid: oid.ok_or(PointerError::MissingKey("oid"))?,
            size: size.ok_or(PointerError::MissingKey("size"))?,
            extensions,
        }))
    }
}

fn parse_oid(value: &str) -> Result<String, PointerError> {
    OID_RE
        .captures(value.trim())
        .map(|c| c[1].to_string())
        .ok_or_else(|| PointerError::InvalidOid(value.to_string()))
}

fn parse_extension(key: &str, value: &str) -> Result<PointerExtension, PointerError> {
    let caps = EXT_RE
        .captures(key)
        .ok_or_else(|| PointerError::InvalidExtension(key.to_string()))?;
    let priority = caps[1]
        .parse::<u8>()
        .map_err(|_| PointerError::InvalidExtension(key.to_string()))?;
    Ok(PointerExtension {
        name: caps[2].to_string(),
        priority,
        oid: parse_oid(value)?,
    })
}
