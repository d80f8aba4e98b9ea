//! Run configuration and the optional settings file.
//!
//! `OrganizerConfig` is the validated, immutable input of one run. It is usually
//! built by the CLI from command-line flags layered over a TOML settings file:
//!
//! ```toml
//! [organize]
//! mode = "by-type"
//! transfer = "copy"
//! conflict = "skip"
//! include_hidden = false
//! recursive = true
//! max_depth = 2
//!
//! [filters.exclude]
//! filenames = ["Thumbs.db", ".DS_Store"]
//! extensions = ["part", "crdownload"]
//! patterns = ["~$*"]
//! regex = []
//! ```

use crate::conflict::ConflictStrategy;
use crate::error::{OrganizeError, OrganizeResult};
use crate::file_category::ClassificationMode;
use crate::file_filter::CompiledFilters;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the settings file looked up in the working directory.
pub const LOCAL_SETTINGS_FILE: &str = ".treetidy.toml";

/// Whether files leave their original location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransferMode {
    #[default]
    Move,
    Copy,
}

impl TransferMode {
    /// Lowercase verb, as used in dry-run lines.
    pub fn verb(&self) -> &'static str {
        match self {
            TransferMode::Move => "move",
            TransferMode::Copy => "copy",
        }
    }
}

/// Settings for a single organizer run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrganizerConfig {
    pub source: PathBuf,
    /// Root for destination folders. Defaults to `source`.
    pub target: PathBuf,
    pub mode: ClassificationMode,
    pub transfer: TransferMode,
    pub dry_run: bool,
    pub include_hidden: bool,
    pub recursive: bool,
    /// Deepest directory level entered below `source`. Ignored when not recursive.
    pub max_depth: Option<u32>,
    pub conflict: ConflictStrategy,
    /// Case-insensitive glob the file name must match.
    pub pattern: Option<String>,
    pub exclude: ExcludeRules,
}

impl OrganizerConfig {
    /// Creates a config with default settings, organizing `source` in place.
    pub fn new(source: impl Into<PathBuf>) -> Self {
        let source = source.into();
        Self {
            target: source.clone(),
            source,
            mode: ClassificationMode::default(),
            transfer: TransferMode::default(),
            dry_run: false,
            include_hidden: false,
            recursive: true,
            max_depth: None,
            conflict: ConflictStrategy::default(),
            pattern: None,
            exclude: ExcludeRules::default(),
        }
    }

    pub fn with_target(mut self, target: impl Into<PathBuf>) -> Self {
        self.target = target.into();
        self
    }

    pub fn with_mode(mut self, mode: ClassificationMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_transfer(mut self, transfer: TransferMode) -> Self {
        self.transfer = transfer;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_include_hidden(mut self, include_hidden: bool) -> Self {
        self.include_hidden = include_hidden;
        self
    }

    pub fn with_recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn with_max_depth(mut self, max_depth: Option<u32>) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_conflict(mut self, conflict: ConflictStrategy) -> Self {
        self.conflict = conflict;
        self
    }

    pub fn with_pattern(mut self, pattern: Option<String>) -> Self {
        self.pattern = pattern;
        self
    }

    pub fn with_exclude(mut self, exclude: ExcludeRules) -> Self {
        self.exclude = exclude;
        self
    }

    /// Applies the `[organize]` defaults of a settings file.
    pub fn with_settings(mut self, settings: &OrganizeSettings) -> Self {
        if let Some(mode) = settings.mode {
            self.mode = mode;
        }
        if let Some(transfer) = settings.transfer {
            self.transfer = transfer;
        }
        if let Some(conflict) = settings.conflict {
            self.conflict = conflict;
        }
        if let Some(include_hidden) = settings.include_hidden {
            self.include_hidden = include_hidden;
        }
        if let Some(recursive) = settings.recursive {
            self.recursive = recursive;
        }
        if settings.max_depth.is_some() {
            self.max_depth = settings.max_depth;
        }
        if settings.pattern.is_some() {
            self.pattern = settings.pattern.clone();
        }
        self
    }

    /// Depth limit actually applied by the walk. `None` means unlimited.
    pub fn effective_max_depth(&self) -> Option<u32> {
        if self.recursive { self.max_depth } else { Some(0) }
    }

    /// Checks the settings and compiles the file filters.
    ///
    /// # Errors
    ///
    /// Returns `OrganizeError::Configuration` for an empty source or target,
    /// or an invalid pattern or exclude rule.
    pub fn validate(&self) -> OrganizeResult<CompiledFilters> {
        if self.source.as_os_str().is_empty() {
            return Err(OrganizeError::configuration("source path is required"));
        }
        if self.target.as_os_str().is_empty() {
            return Err(OrganizeError::configuration("target path must not be empty"));
        }
        CompiledFilters::new(self.include_hidden, self.pattern.as_deref(), &self.exclude)
    }
}

/// Contents of a settings file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SettingsFile {
    #[serde(default)]
    pub organize: OrganizeSettings,
    #[serde(default)]
    pub filters: FilterRules,
}

/// Defaults for command-line options. Unset fields keep the built-in default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrganizeSettings {
    pub mode: Option<ClassificationMode>,
    pub transfer: Option<TransferMode>,
    pub conflict: Option<ConflictStrategy>,
    pub include_hidden: Option<bool>,
    pub recursive: Option<bool>,
    pub max_depth: Option<u32>,
    pub pattern: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterRules {
    #[serde(default)]
    pub exclude: ExcludeRules,
}

/// Rules for leaving files out of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExcludeRules {
    /// Exact file names (e.g. "Thumbs.db").
    #[serde(default)]
    pub filenames: Vec<String>,

    /// Extensions without the dot, case-insensitive (e.g. "part").
    #[serde(default)]
    pub extensions: Vec<String>,

    /// Globs matched against the file name (e.g. "~$*").
    #[serde(default)]
    pub patterns: Vec<String>,

    /// Regexes matched against the file name.
    #[serde(default)]
    pub regex: Vec<String>,
}

impl SettingsFile {
    /// Load settings, falling back to defaults.
    ///
    /// Lookup order:
    /// 1. `settings_path`, if provided (must exist)
    /// 2. `.treetidy.toml` in the current directory
    /// 3. `~/.config/treetidy/config.toml`
    /// 4. Built-in defaults
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a file is found but cannot be read or parsed,
    /// or if an explicitly given file does not exist.
    pub fn load(settings_path: Option<&Path>) -> OrganizeResult<Self> {
        if let Some(path) = settings_path {
            return Self::load_from_file(path);
        }

        let local = PathBuf::from(LOCAL_SETTINGS_FILE);
        if local.is_file() {
            return Self::load_from_file(&local);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_settings = PathBuf::from(home)
                .join(".config")
                .join("treetidy")
                .join("config.toml");
            if home_settings.is_file() {
                return Self::load_from_file(&home_settings);
            }
        }

        Ok(Self::default())
    }

    /// Load settings from a specific file.
    pub fn load_from_file(path: &Path) -> OrganizeResult<Self> {
        if !path.exists() {
            return Err(OrganizeError::configuration(format!(
                "settings file not found: {}",
                path.display()
            )));
        }

        let content = fs::read_to_string(path).map_err(|e| {
            OrganizeError::configuration(format!("cannot read {}: {}", path.display(), e))
        })?;
        let settings = Self::parse(&content).map_err(|e| match e {
            OrganizeError::Configuration { message } => {
                OrganizeError::configuration(format!("{}: {}", path.display(), message))
            }
            other => other,
        })?;

        tracing::debug!(path = %path.display(), "loaded settings file");
        Ok(settings)
    }

    /// Parse settings from TOML text.
    pub fn parse(content: &str) -> OrganizeResult<Self> {
        toml::from_str(content).map_err(|e| OrganizeError::configuration(e.to_string()))
    }
}
