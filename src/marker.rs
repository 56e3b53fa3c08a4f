//! Marker file format
//!
//! A marker file's bytes are its original relative path in ISO-8859-1: one
//! byte per character, no terminator required. Readers trim surrounding
//! whitespace, so a trailing newline is harmless. Characters outside
//! Latin-1 are written as `?`.
//!
//! Content that starts with the literal token `content` was produced by an
//! older generator and is not a path; restore and report skip it.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Component, Path, PathBuf};

use crate::error::Result;

/// Content prefix reserved for legacy files that must be skipped
pub const IGNORE_PREFIX: &str = "content";

/// Parsed content of a marker file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Marker {
    /// A legacy file that is not ours
    Ignore,
    /// No content after trimming, or nothing that names a file (`/`, `.`)
    Empty,
    /// The recorded original relative path
    Path(PathBuf),
}

impl Marker {
    /// Classify already-trimmed content using `ignore_prefix`
    pub fn parse_with(content: &str, ignore_prefix: &str) -> Self {
        if content.starts_with(ignore_prefix) {
            Marker::Ignore
        } else if !names_something(content) {
            Marker::Empty
        } else {
            Marker::Path(PathBuf::from(content))
        }
    }

    /// Classify already-trimmed content using [`IGNORE_PREFIX`]
    pub fn parse(content: &str) -> Self {
        Self::parse_with(content, IGNORE_PREFIX)
    }
}

/// Whether `content` has at least one plain name segment
fn names_something(content: &str) -> bool {
    Path::new(content)
        .components()
        .any(|c| matches!(c, Component::Normal(_)))
}

/// Whether trimmed `content` carries the legacy ignore prefix
pub fn is_ignore_content(content: &str) -> bool {
    content.starts_with(IGNORE_PREFIX)
}

/// Encode `text` as ISO-8859-1
pub fn encode_latin1(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect()
}

/// Decode ISO-8859-1 bytes
pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Trim control characters and spaces from both ends
pub fn trim_content(content: &str) -> &str {
    content.trim_matches(|c: char| c <= ' ')
}

/// Read the trimmed text content of a marker file
pub fn read_content(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(trim_content(&decode_latin1(&bytes)).to_string())
}

/// Read and classify a marker file
pub fn read_marker(path: &Path) -> Result<Marker> {
    Ok(Marker::parse(&read_content(path)?))
}

/// Write a marker at `path` recording `relative`
///
/// Refuses to replace an existing file: a second writer for the same
/// destination gets an `AlreadyExists` error instead of silently winning.
/// The parent directory must already exist.
pub fn write_marker(path: &Path, relative: &Path) -> Result<()> {
    let content = encode_latin1(&relative.to_string_lossy());
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)?;
    file.write_all(&content)?;
    Ok(())
}
