//! # Treemirror CLI - Stand-in trees that remember their shape
//!
//! Command-line front end for the treemirror library.
//!
//! ## Features
//! - Build a content-free mirror of a directory tree
//! - Flatten a tree, simulating an external tool that moves and renames files
//! - Restore markers to their recorded locations
//! - Report which markers moved or were renamed (text, HTML or JSON)
//! - Verify that two trees have the same shape
//!
//! ## Usage
//! ```bash
//! # Mirror a tree
//! treemirror mirror ./music ./music-mirror
//!
//! # Scramble it, then put it back
//! treemirror flatten ./music-mirror
//! treemirror restore ./music-mirror
//!
//! # Compare shapes
//! treemirror verify ./music ./music-mirror
//! ```
//!
//! ## Exit status
//!
//! Zero on success, otherwise one of the negative codes in
//! `treemirror::status`, truncated to a byte by the operating system.

use anyhow::Context;
use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use colored::*;
use humantime::format_duration;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;
use treemirror::config::DEFAULT_FLATTEN_BASE_NAME;
use treemirror::report::{text_report, write_html_report};
use treemirror::{
    make_file_report, status, EngineConfig, Flattener, MirrorBuilder, MirrorError, Restorer,
    TreeComparator,
};

/// Treemirror CLI - content-free mirrors of directory trees
#[derive(Parser)]
#[command(name = "treemirror")]
#[command(version)]
#[command(about = "Mirror a directory tree as marker files, then restore or verify it")]
#[command(long_about = None)]
struct Cli {
    /// Enable debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only show errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Show a spinner while working
    #[arg(long, global = true)]
    progress: bool,

    /// Expected number of files, used to pre-size work lists
    #[arg(long, global = true)]
    files_hint: Option<usize>,

    /// Expected number of directories, used to pre-size work lists
    #[arg(long, global = true)]
    dirs_hint: Option<usize>,

    /// Content prefix of legacy files to skip
    #[arg(long, global = true)]
    ignore_prefix: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a mirror of a tree
    Mirror {
        /// Tree to mirror
        source: PathBuf,

        /// Where to create the mirror; must be missing or empty
        dest: PathBuf,
    },

    /// Move markers back to their recorded locations
    Restore {
        /// Directory holding the markers
        source: PathBuf,

        /// Root to restore under (defaults to the source)
        target: Option<PathBuf>,
    },

    /// Report moved and renamed markers
    Report {
        /// Directory holding the markers
        source: PathBuf,

        /// Also write an HTML report into this directory
        #[arg(long)]
        html: Option<PathBuf>,

        /// Print the report as JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Check that two trees have the same shape
    Verify {
        /// First tree
        left: PathBuf,

        /// Second tree
        right: PathBuf,
    },

    /// Move every file of a tree to its top level under synthetic names
    Flatten {
        /// Tree to flatten
        dir: PathBuf,

        /// Name stem for the moved files
        #[arg(long, default_value = DEFAULT_FLATTEN_BASE_NAME)]
        base_name: String,
    },
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = parse_error_status(e.kind());
            // Nowhere left to report a failed write of the usage text
            let _ = e.print();
            std::process::exit(code);
        }
    };

    init_logging(cli.verbose, cli.quiet);

    // Disable colors if needed
    if std::env::var("NO_COLOR").is_ok() {
        colored::control::set_override(false);
    }

    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("{}: {:#}", "Error".red().bold(), e);
            std::process::exit(error_status(&e));
        }
    }
}

/// Exit status for a command line clap refused
fn parse_error_status(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => status::SUCCESS,
        ErrorKind::MissingSubcommand | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
            status::NO_APP_SPECIFIED
        }
        ErrorKind::InvalidSubcommand => status::UNKNOWN_APP_SPECIFIED,
        _ => status::BAD_ARGUMENTS,
    }
}

/// Exit status for a failed command
fn error_status(error: &anyhow::Error) -> i32 {
    error
        .downcast_ref::<MirrorError>()
        .map(MirrorError::status_code)
        .unwrap_or(status::BAD_ARGUMENTS)
}

/// Install the stderr subscriber
///
/// `--verbose` and `--quiet` override `RUST_LOG`; without either, `RUST_LOG`
/// applies and defaults to `info`, which is where per-file detail and the
/// text report go.
fn init_logging(verbose: bool, quiet: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else if quiet {
        EnvFilter::new("error")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Main command runner
fn run(cli: Cli) -> anyhow::Result<i32> {
    let mut config = EngineConfig::new();
    if let Some(files) = cli.files_hint {
        config = config.with_files_hint(files);
    }
    if let Some(dirs) = cli.dirs_hint {
        config = config.with_dirs_hint(dirs);
    }
    if let Some(prefix) = cli.ignore_prefix {
        config = config.with_ignore_prefix(prefix);
    }

    match cli.command {
        Commands::Mirror { source, dest } => cmd_mirror(&source, &dest, config, cli.progress),
        Commands::Restore { source, target } => {
            cmd_restore(&source, target.as_deref(), config, cli.progress)
        }
        Commands::Report { source, html, json } => {
            cmd_report(&source, html.as_deref(), json, &config)
        }
        Commands::Verify { left, right } => cmd_verify(&left, &right),
        Commands::Flatten { dir, base_name } => {
            cmd_flatten(&dir, &base_name, config, cli.progress)
        }
    }
}

/// Spinner shown while a long operation runs, if asked for
fn spinner(enabled: bool, message: &'static str) -> anyhow::Result<Option<ProgressBar>> {
    if !enabled {
        return Ok(None);
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(Some(pb))
}

/// Build a mirror
///
/// Every directory of the source is recreated, and every file becomes a
/// marker holding its relative path.
fn cmd_mirror(
    source: &Path,
    dest: &Path,
    config: EngineConfig,
    show_progress: bool,
) -> anyhow::Result<i32> {
    println!("{}", "Creating mirror...".blue().bold());

    let start = Instant::now();
    let progress = spinner(show_progress, "Walking source tree...")?;
    let result = MirrorBuilder::new().with_config(config).create(source, dest);
    if let Some(pb) = progress {
        pb.finish_and_clear();
    }
    let report = result.with_context(|| {
        format!("unable to mirror {} into {}", source.display(), dest.display())
    })?;

    if report.is_complete() {
        println!("{} Created mirror", "✓".green().bold());
    } else {
        println!("{} Mirror is incomplete", "⚠".yellow().bold());
    }
    println!("  Source: {}", source.display().to_string().cyan());
    println!("  Mirror: {}", dest.display().to_string().cyan());
    println!("  Files: {}", report.files_written.to_string().cyan());
    println!("  Directories: {}", report.directories_created.to_string().cyan());
    if report.errors > 0 {
        println!("  Errors: {}", report.errors.to_string().red());
    }
    println!("  Time: {}", format_duration(start.elapsed()).to_string().cyan());

    Ok(report.status_code())
}

/// Restore markers to their recorded locations
fn cmd_restore(
    source: &Path,
    target: Option<&Path>,
    config: EngineConfig,
    show_progress: bool,
) -> anyhow::Result<i32> {
    let mut restorer = Restorer::new(source).with_config(config);
    if let Some(target) = target {
        restorer = restorer.with_target(target);
    }
    println!(
        "{} {}",
        "Restoring into".blue().bold(),
        restorer.target().display().to_string().yellow()
    );

    let start = Instant::now();
    let progress = spinner(show_progress, "Restoring files...")?;
    let result = restorer.restore();
    if let Some(pb) = progress {
        pb.finish_and_clear();
    }
    let report = result.with_context(|| format!("unable to restore {}", source.display()))?;

    if report.is_clean() {
        println!("{} Restoration complete", "✓".green().bold());
    } else {
        println!("{} Restoration finished with problems", "⚠".yellow().bold());
    }
    println!("  Files restored: {}", report.files_restored.to_string().cyan());
    println!("  Already in place: {}", report.already_in_place.to_string().cyan());
    if report.ignored > 0 {
        println!("  Ignored: {}", report.ignored.to_string().yellow());
    }
    if report.conflicts > 0 {
        println!("  Conflicts: {}", report.conflicts.to_string().red());
    }
    if report.errors > 0 {
        println!("  Errors: {}", report.errors.to_string().red());
    }
    if report.descend_errors > 0 {
        println!(
            "  Unreadable directories: {}",
            report.descend_errors.to_string().red()
        );
    }
    println!(
        "  Directories removed: {}",
        report.directories_removed.to_string().cyan()
    );
    println!("  Time: {}", format_duration(start.elapsed()).to_string().cyan());

    Ok(report.status_code())
}

/// Report on moved and renamed markers
fn cmd_report(
    source: &Path,
    html: Option<&Path>,
    json: bool,
    config: &EngineConfig,
) -> anyhow::Result<i32> {
    let set = make_file_report(source, config)
        .with_context(|| format!("unable to report on {}", source.display()))?;

    if json {
        println!("{}", set.to_json()?);
    } else {
        text_report(&set.files);
        println!(
            "{} {} files, {} moved or renamed",
            "Report:".bold(),
            set.files.len(),
            set.displaced().to_string().yellow()
        );
        if set.errors > 0 {
            println!("  Unreadable files: {}", set.errors.to_string().red());
        }
    }

    if let Some(dir) = html {
        let path = write_html_report(&set, dir)
            .with_context(|| format!("unable to write HTML report into {}", dir.display()))?;
        println!("  HTML report: {}", path.display().to_string().cyan());
    }

    if set.descend_errors > 0 {
        Ok(status::EXCEPTION_DESCENDING)
    } else {
        Ok(status::SUCCESS)
    }
}

/// Compare the shapes of two trees
fn cmd_verify(left: &Path, right: &Path) -> anyhow::Result<i32> {
    match TreeComparator::new().first_divergence(left, right) {
        None => {
            println!("{} Trees have the same shape", "✓".green().bold());
            Ok(status::SUCCESS)
        }
        Some(divergence) => {
            println!("{} Trees differ", "✗".red().bold());
            println!("  At: {}", divergence.to_string().yellow());
            Ok(status::TREES_DIFFER)
        }
    }
}

/// Flatten a tree in place
fn cmd_flatten(
    dir: &Path,
    base_name: &str,
    config: EngineConfig,
    show_progress: bool,
) -> anyhow::Result<i32> {
    println!("{}", "Flattening...".blue().bold());

    let progress = spinner(show_progress, "Moving files...")?;
    let result = Flattener::new().with_config(config).flatten(base_name, dir);
    if let Some(pb) = progress {
        pb.finish_and_clear();
    }
    let report = result.with_context(|| format!("unable to flatten {}", dir.display()))?;

    println!("{} Flattened {}", "✓".green().bold(), dir.display());
    println!("  Files moved: {}", report.files_moved.to_string().cyan());
    println!(
        "  Directories removed: {}",
        report.directories_removed.to_string().cyan()
    );
    Ok(status::SUCCESS)
}
