//! treetidy - sort a directory tree into destination folders
//!
//! This library walks a source tree, classifies each file (by extension,
//! modification month, or coarse type), resolves name collisions at the
//! destination, and moves or copies the file there. Runs can be previewed with
//! a dry run and return a structured report of what happened to every file.

pub mod cli;
pub mod config;
pub mod conflict;
pub mod error;
pub mod file_category;
pub mod file_filter;
pub mod file_organizer;
pub mod logging;
pub mod output;

pub use config::{ExcludeRules, OrganizerConfig, SettingsFile, TransferMode};
pub use conflict::{ConflictStrategy, Resolution};
pub use error::{FileError, FileErrorKind, OrganizeError, OrganizeResult};
pub use file_category::{Category, ClassificationMode, TypeTable};
pub use file_organizer::{FileEntry, Organizer, Outcome, OutcomeResult, RunReport};

pub use cli::{Args, run_cli};
