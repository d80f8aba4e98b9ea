//! Command-line interface module for treetidy.
//!
//! This module handles all CLI-related functionality including:
//! - Argument parsing (clap)
//! - Layering flags over the settings file
//! - Driving the organizer and presenting its outcomes

use crate::config::{OrganizerConfig, SettingsFile, TransferMode};
use crate::conflict::ConflictStrategy;
use crate::error::OrganizeResult;
use crate::file_category::ClassificationMode;
use crate::file_organizer::{NoProgress, Organizer, RunReport};
use crate::output::{ConsoleReporter, OutputFormatter};
use clap::{ArgAction, Parser, ValueEnum};
use std::path::PathBuf;

/// Sort the files of a directory tree into extension, date, or type folders.
#[derive(Parser, Debug, Clone)]
#[command(name = "treetidy", version, about)]
pub struct Args {
    /// Directory to organize
    #[arg(long, value_name = "PATH")]
    pub source: PathBuf,

    /// Root for the destination folders [default: the source]
    #[arg(long, value_name = "PATH")]
    pub target: Option<PathBuf>,

    /// Classification scheme [default: by-extension]
    #[arg(long, value_enum)]
    pub mode: Option<ClassificationMode>,

    /// Move files (default)
    #[arg(long = "move", overrides_with = "copy")]
    pub move_files: bool,

    /// Copy files instead of moving them
    #[arg(long, overrides_with = "move_files")]
    pub copy: bool,

    /// Show what would happen without touching anything
    #[arg(long)]
    pub dry_run: bool,

    /// Also process hidden files and directories
    #[arg(long)]
    pub include_hidden: bool,

    /// Descend into subdirectories (default)
    #[arg(long, overrides_with = "no_recursive")]
    pub recursive: bool,

    /// Only process files directly inside the source
    #[arg(long, overrides_with = "recursive")]
    pub no_recursive: bool,

    /// Deepest directory level to enter below the source
    #[arg(long, value_name = "N")]
    pub max_depth: Option<u32>,

    /// What to do when the destination exists [default: rename]
    #[arg(long, value_enum)]
    pub conflict: Option<ConflictStrategy>,

    /// Only process file names matching this glob (case-insensitive)
    #[arg(long, value_name = "GLOB")]
    pub pattern: Option<String>,

    /// Settings file [default: ./.treetidy.toml or ~/.config/treetidy/config.toml]
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Print the run report as JSON
    #[arg(long)]
    pub json: bool,

    /// Do not show a progress bar
    #[arg(long)]
    pub no_progress: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

/// Builds the run configuration: built-in defaults, then the settings file,
/// then command-line flags.
pub fn build_config(args: &Args, settings: &SettingsFile) -> OrganizerConfig {
    let mut config = OrganizerConfig::new(&args.source)
        .with_settings(&settings.organize)
        .with_exclude(settings.filters.exclude.clone());

    if let Some(target) = &args.target {
        config = config.with_target(target);
    }
    if let Some(mode) = args.mode {
        config = config.with_mode(mode);
    }
    if args.copy {
        config = config.with_transfer(TransferMode::Copy);
    } else if args.move_files {
        config = config.with_transfer(TransferMode::Move);
    }
    if args.include_hidden {
        config = config.with_include_hidden(true);
    }
    if args.no_recursive {
        config = config.with_recursive(false);
    } else if args.recursive {
        config = config.with_recursive(true);
    }
    if args.max_depth.is_some() {
        config = config.with_max_depth(args.max_depth);
    }
    if let Some(conflict) = args.conflict {
        config = config.with_conflict(conflict);
    }
    if args.pattern.is_some() {
        config = config.with_pattern(args.pattern.clone());
    }

    config.with_dry_run(args.dry_run)
}

/// Runs the CLI application with already-parsed arguments.
///
/// # Examples
///
/// ```no_run
/// use clap::Parser;
/// use treetidy::cli::{Args, run_cli};
///
/// let args = Args::parse_from(["treetidy", "--source", "/path/to/directory", "--dry-run"]);
/// match run_cli(&args) {
///     Ok(report) => println!("{} files moved", report.moved),
///     Err(e) => eprintln!("Error: {}", e),
/// }
/// ```
pub fn run_cli(args: &Args) -> OrganizeResult<RunReport> {
    let settings = SettingsFile::load(args.config.as_deref())?;
    let organizer = Organizer::new(build_config(args, &settings))?;
    let config = organizer.config();

    if args.json {
        let report = organizer.run_with(&mut NoProgress)?;
        println!("{}", OutputFormatter::report_json(&report)?);
        return Ok(report);
    }

    if config.dry_run {
        OutputFormatter::dry_run_notice("No files will be changed.");
    }
    OutputFormatter::info(&run_banner(config));

    let mut reporter = ConsoleReporter::new(!args.no_progress && !config.dry_run);
    organizer.run_with(&mut reporter)
}

/// One-line description of the run, using the flag spelling of the mode.
fn run_banner(config: &OrganizerConfig) -> String {
    format!(
        "Organizing {} into {} ({}, {})",
        config.source.display(),
        config.target.display(),
        value_name(&config.mode),
        config.transfer.verb()
    )
}

fn value_name<T: ValueEnum>(value: &T) -> String {
    value
        .to_possible_value()
        .map(|v| v.get_name().to_string())
        .unwrap_or_default()
}
