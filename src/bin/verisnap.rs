//! # Verisnap CLI - Versioned directory snapshots
//!
//! Command-line interface for the Verisnap snapshot library.
//!
//! ## Usage
//! ```bash
//! # Snapshot a project, linking anything above 20 MB
//! verisnap snapshot ./project --snapshots ./snapshots --threshold 20
//!
//! # Show the version the next snapshot will get
//! verisnap next-version --snapshots ./snapshots
//!
//! # List snapshots
//! verisnap list --snapshots ./snapshots
//!
//! # Compare a snapshot with its source
//! verisnap verify ./snapshots/V1_2024_01_01_10_30 ./project
//! ```

use clap::{Parser, Subcommand};
use colored::*;
use humantime::format_duration;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use verisnap::engine::snapshot_name;
use verisnap::version::{allocate_version, list_versions, parse_version};
use verisnap::{
    format_bytes, verify_snapshot, LogLevel, Result, SnapshotBuilder, SnapshotConfig,
    ThresholdInput, VerisnapError,
};

/// Verisnap CLI - Versioned, space-bounded directory snapshots
#[derive(Parser)]
#[command(name = "verisnap")]
#[command(author, version)]
#[command(about = "Snapshot a directory into numbered versions, linking large files instead of copying them")]
#[command(long_about = None)]
struct Cli {
    /// Directory holding the version folders (defaults to ./snapshots)
    #[arg(short, long, global = true)]
    snapshots: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only report errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new snapshot
    #[command(alias = "snap")]
    Snapshot {
        /// Directory to snapshot (defaults to `source_root` from the config)
        source: Option<PathBuf>,

        /// Threshold in megabytes, (0, 100]; anything else falls back to 50
        #[arg(short, long)]
        threshold: Option<String>,

        /// JSON config file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Show progress
        #[arg(long)]
        progress: bool,
    },

    /// Print the version the next snapshot will get
    NextVersion,

    /// List snapshots
    #[command(alias = "ls")]
    List,

    /// Compare a snapshot with its source
    Verify {
        /// Version folder, or the mirrored root inside it
        snapshot: PathBuf,

        /// Source directory the snapshot was taken from
        source: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    // Disable colors if needed
    let no_color = std::env::var("NO_COLOR").is_ok();
    if no_color {
        colored::control::set_override(false);
    }

    if let Err(e) = run(cli, no_color) {
        eprintln!("{}: {}", "Error".red().bold(), e.user_message());
        std::process::exit(1);
    }
}

/// Main command runner
fn run(cli: Cli, no_color: bool) -> Result<()> {
    let mut config = match &cli.command {
        Commands::Snapshot { config: Some(path), .. } => SnapshotConfig::from_json_file(path)?,
        _ => SnapshotConfig::default(),
    };

    // Set up logging
    let mut log = config.log.clone();
    if cli.verbose {
        log.level = LogLevel::Debug;
    } else if cli.quiet {
        log.level = LogLevel::Error;
    }
    log.ansi = log.ansi && !no_color;
    if let Err(e) = log.install() {
        eprintln!("{}: {}", "Warning".yellow().bold(), e);
    }

    if let Some(snapshots) = cli.snapshots {
        config.snapshots_root = snapshots;
    }

    match cli.command {
        Commands::Snapshot { source, threshold, progress, .. } => {
            if let Some(source) = source {
                config.source_root = Some(source);
            }
            if let Some(threshold) = threshold {
                config.threshold_mb = ThresholdInput::Text(threshold);
            }
            cmd_snapshot(&config, progress, cli.quiet)
        }
        Commands::NextVersion => cmd_next_version(&config.snapshots_root),
        Commands::List => cmd_list(&config.snapshots_root),
        Commands::Verify { snapshot, source } => cmd_verify(&snapshot, &source),
    }
}

/// Create a snapshot
fn cmd_snapshot(config: &SnapshotConfig, show_progress: bool, quiet: bool) -> Result<()> {
    let source = config
        .source_root
        .as_deref()
        .ok_or_else(|| VerisnapError::invalid_configuration("no source directory given"))?;

    let snapshotter = SnapshotBuilder::from_config(config).build()?;

    if !quiet {
        println!(
            "{} {} {}",
            "Snapshotting".blue().bold(),
            source.display(),
            format!("(threshold {})", snapshotter.threshold()).dimmed()
        );
    }

    let start = Instant::now();
    let progress = if show_progress {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .map_err(|e| VerisnapError::internal(e.to_string()))?,
        );
        pb.set_message("Copying files...");
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    } else {
        None
    };

    let summary = snapshotter.snapshot(source, &config.snapshots_root);

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    let summary = summary?;
    let duration = start.elapsed();

    if quiet {
        return Ok(());
    }

    println!(
        "{} Created snapshot {}",
        "✓".green().bold(),
        format!("V{}", summary.version).yellow().bold()
    );
    println!("  Output: {}", summary.output_dir.display().to_string().cyan());
    println!(
        "  Copied: {} files, {}",
        summary.stats.files_copied.to_string().cyan(),
        format_bytes(summary.bytes_copied()).cyan()
    );
    println!(
        "  Linked: {} files, {} directories",
        summary.stats.files_linked.to_string().cyan(),
        summary.stats.dirs_linked.to_string().cyan()
    );
    if summary.stats.shortcuts > 0 {
        println!("  Shortcuts: {}", summary.stats.shortcuts.to_string().yellow());
    }
    if summary.stats.failures() > 0 {
        println!(
            "  Failed: {} copies, {} links",
            summary.stats.copy_failures.to_string().red(),
            summary.stats.link_failures.to_string().red()
        );
    }
    println!("  Time: {}", format_duration(duration).to_string().cyan());

    Ok(())
}

/// Print the next version number
fn cmd_next_version(snapshots_root: &Path) -> Result<()> {
    println!("{}", allocate_version(snapshots_root)?);
    Ok(())
}

/// List version folders
fn cmd_list(snapshots_root: &Path) -> Result<()> {
    let versions = list_versions(snapshots_root)?;

    if versions.is_empty() {
        println!("No snapshots found in {}", snapshots_root.display());
        return Ok(());
    }

    println!("{}", "Snapshots:".blue().bold());
    for folder in &versions {
        let created = folder
            .created_at
            .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {:>6}  {}  {}",
            format!("V{}", folder.version).yellow().bold(),
            created.cyan(),
            folder.name.dimmed()
        );
    }

    Ok(())
}

/// Verify a snapshot against its source
fn cmd_verify(snapshot: &Path, source: &Path) -> Result<()> {
    // A version folder holds the mirrored root under the source's name
    let is_version_folder = snapshot
        .file_name()
        .and_then(|name| name.to_str())
        .and_then(parse_version)
        .is_some();
    let snapshot_root = if is_version_folder {
        snapshot.join(snapshot_name(source)?)
    } else {
        snapshot.to_path_buf()
    };

    println!(
        "{} {}",
        "Verifying snapshot".blue().bold(),
        snapshot_root.display().to_string().yellow()
    );

    let report = verify_snapshot(&snapshot_root, source)?;

    println!("\n{}", "Verification Report:".bold());
    println!(
        "  Files: {}/{} identical",
        report.files_valid.to_string().green(),
        report.files_checked
    );
    println!(
        "  Links: {}/{} resolved",
        report.links_valid.to_string().green(),
        report.links_checked
    );
    println!("  Directories: {}", report.directories_checked);
    println!("  Verification time: {}ms", report.verification_time_ms);

    if report.is_valid() {
        println!("\n{} Snapshot is valid", "✓".green().bold());
        Ok(())
    } else {
        println!("\n{}", "Errors:".red().bold());
        for error in &report.errors {
            println!("  {} {}", "✗".red(), error);
        }
        Err(VerisnapError::custom(format!(
            "{} mismatches found",
            report.errors.len()
        )))
    }
}
