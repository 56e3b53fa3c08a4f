//! Reports on moved and renamed marker files
//!
//! A report reads every marker under a base directory without moving
//! anything and classifies it against the path it records:
//!
//! - **renamed** when its current file name differs from the recorded one
//! - **moved** when its current directory, taken relative to the parent of
//!   the base directory, does not end with the recorded directory
//!
//! A file still sitting exactly at its recorded path is neither. Legacy
//! files are flagged as ignored, and files that cannot be read are flagged
//! as errors and counted.
//!
//! Three renderings are provided: [`text_report`] emits one `info` event per
//! line through `tracing`, [`write_html_report`] writes a two-row-per-file
//! HTML table, and [`ReportSet::to_json`] serializes the whole set.

use std::fmt::Write as _;
use std::fs;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::error::Result;
use crate::marker::{self, Marker};
use crate::paths::{basename, dirname};
use crate::utils;
use crate::walker::{TreeVisitor, TreeWalker};

/// File name of the HTML report
pub const HTML_REPORT: &str = "dummy-report.html";

/// Classification of one marker file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileReport {
    /// Trimmed content, absent if the file could not be read
    pub content: Option<String>,
    /// Current file name
    pub current_name: String,
    /// Current directory, relative to the parent of the base directory
    pub current_location: String,
    /// Recorded file name
    pub original_name: String,
    /// Recorded directory
    pub original_location: String,
    /// Legacy content that is not a recorded path
    pub is_ignore: bool,
    /// The file could not be read
    pub has_error: bool,
    /// Current directory no longer matches the recorded one
    pub has_been_moved: bool,
    /// Current name no longer matches the recorded one
    pub has_been_renamed: bool,
}

impl FileReport {
    /// Classify `file`, found somewhere below `base`
    pub fn classify(base: &Path, file: &Path, ignore_prefix: &str) -> Self {
        let mut report = FileReport {
            current_name: basename(file),
            ..Default::default()
        };
        let content = match marker::read_content(file) {
            Ok(content) => content,
            Err(e) => {
                warn!("I/O error reporting on {:?}: {}", file, e);
                report.has_error = true;
                return report;
            }
        };

        match Marker::parse_with(&content, ignore_prefix) {
            Marker::Ignore => report.is_ignore = true,
            Marker::Empty => {
                warn!("{:?} records no path", file);
                report.has_error = true;
            }
            Marker::Path(recorded) => {
                report.original_location = dirname(&recorded);
                report.original_name = basename(&recorded);
                if file.ends_with(&recorded) {
                    report.current_location = report.original_location.clone();
                } else {
                    report.has_been_renamed = report.current_name != report.original_name;
                    let current = match base.parent() {
                        Some(parent) => file.strip_prefix(parent).unwrap_or(file),
                        None => file,
                    };
                    report.current_location = dirname(current);
                    report.has_been_moved =
                        !Path::new(&report.current_location).ends_with(&report.original_location);
                }
            }
        }
        report.content = Some(content);
        report
    }

    /// Whether the file has moved, been renamed, or both
    pub fn is_displaced(&self) -> bool {
        self.has_been_moved || self.has_been_renamed
    }
}

/// Reports for every file under one base directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSet {
    /// Directory that was scanned
    pub base: PathBuf,
    /// When the scan finished
    pub generated_at: DateTime<Utc>,
    /// One entry per file, in walk order
    pub files: Vec<FileReport>,
    /// Files that could not be read
    pub errors: usize,
    /// Directories that could not be listed
    pub descend_errors: usize,
}

impl ReportSet {
    /// Pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Number of files that moved or were renamed
    pub fn displaced(&self) -> usize {
        self.files.iter().filter(|f| f.is_displaced()).count()
    }
}

/// Classify every file under `base`
///
/// # Errors
///
/// - [`crate::MirrorError::UnreadableDirectory`] if `base` is not a listable
///   directory
/// - [`crate::MirrorError::InvalidConfiguration`] if the configuration is
///   invalid
pub fn make_file_report(base: impl AsRef<Path>, config: &EngineConfig) -> Result<ReportSet> {
    config.validate()?;
    let base = utils::readable_directory(base.as_ref())?;

    let mut collector = ReportCollector {
        base: &base,
        ignore_prefix: &config.ignore_prefix,
        files: Vec::with_capacity(config.files_hint),
    };
    let mut walker = TreeWalker::with_capacity(&base, config.dirs_hint);
    let summary = walker.walk(&mut collector);

    let files = collector.files;
    let errors = files.iter().filter(|f| f.has_error).count();
    debug!("Classified {} files under {:?}", files.len(), base);
    Ok(ReportSet {
        base,
        generated_at: Utc::now(),
        files,
        errors,
        descend_errors: summary.descend_errors,
    })
}

struct ReportCollector<'a> {
    base: &'a Path,
    ignore_prefix: &'a str,
    files: Vec<FileReport>,
}

impl TreeVisitor for ReportCollector<'_> {
    fn visit_file(&mut self, file: &Path) -> ControlFlow<()> {
        self.files
            .push(FileReport::classify(self.base, file, self.ignore_prefix));
        ControlFlow::Continue(())
    }
}

/// Log a human-readable line pair for every recorded file
pub fn text_report(reports: &[FileReport]) {
    for report in reports {
        if report.is_ignore {
            info!("ignoring \"{}\"", report.current_name);
            continue;
        }
        if report.has_error {
            info!("unable to read \"{}\"", report.current_name);
            continue;
        }
        if report.has_been_renamed {
            info!(
                "the file \"{}\" has been renamed to \"{}\"",
                report.original_name, report.current_name
            );
        } else {
            info!("\"{}\" has not been renamed", report.original_name);
        }
        if report.has_been_moved {
            info!(
                "  it was moved from \"{}\" to \"{}\"",
                report.original_location, report.current_location
            );
        } else {
            info!("  it has not been moved from {}", report.original_location);
        }
    }
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn html_row(html: &mut String, cells: [&str; 2]) {
    html.push_str("      <tr>\n");
    for cell in cells {
        // Writing to a String cannot fail
        let _ = writeln!(html, "        <td>{}</td>", escape_html(cell));
    }
    html.push_str("      </tr>\n");
}

/// Render the HTML table
///
/// Each file takes two rows: where it is now, then where it came from. The
/// second row only names the parts that changed.
pub fn render_html(reports: &[FileReport], generated_at: DateTime<Utc>) -> String {
    let mut html = String::from("<!DOCTYPE html>\n<html>\n");
    html.push_str("  <head>\n    <style>\n");
    html.push_str("      tr:nth-child(even) {background: #DBFAD8; text-indent: 50px;\n");
    html.push_str("                          font-style: italic;\n");
    html.push_str("                          border-bottom: 1pt solid black;}\n");
    html.push_str("      tr:nth-child(odd) {background: #FFF}\n");
    html.push_str("    </style>\n  </head>\n");
    let _ = writeln!(html, "  <!-- generated {} -->", generated_at.to_rfc3339());
    html.push_str("  <body>\n    <table>\n");
    for report in reports {
        html_row(
            &mut html,
            [report.current_location.as_str(), report.current_name.as_str()],
        );
        let original_location = if report.has_been_moved {
            report.original_location.as_str()
        } else {
            ""
        };
        let original_name = if report.has_been_renamed {
            report.original_name.as_str()
        } else {
            ""
        };
        html_row(&mut html, [original_location, original_name]);
    }
    html.push_str("    </table>\n  </body>\n</html>\n");
    html
}

/// Write [`HTML_REPORT`] into `dir`, creating the directory if needed
///
/// Returns the path of the written file.
pub fn write_html_report(set: &ReportSet, dir: impl AsRef<Path>) -> Result<PathBuf> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;
    let path = dir.join(HTML_REPORT);
    let html = render_html(&set.files, set.generated_at);
    fs::write(&path, marker::encode_latin1(&html))?;
    info!("Wrote HTML report to {:?}", path);
    Ok(path)
}
