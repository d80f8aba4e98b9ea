//! File qualification rules.
//!
//! Decides which visited files take part in a run:
//! - Hidden files and directories (platform attribute or leading dot)
//! - The `--pattern` glob, matched case-insensitively against the whole name
//! - Exclude rules from the settings file (exact names, extensions, globs, regex)

use crate::config::ExcludeRules;
use crate::error::{OrganizeError, OrganizeResult};
use crate::file_category::extension_of;
use glob::Pattern;
use regex::{Regex, RegexBuilder};
use std::collections::HashSet;
use std::fs::Metadata;
use std::path::Path;

/// Returns true if `path` is hidden.
///
/// A leading dot always hides. On Windows the hidden attribute from `metadata`
/// also counts; when no metadata is available only the name is checked.
pub fn is_hidden(path: &Path, metadata: Option<&Metadata>) -> bool {
    let dot_name = path
        .file_name()
        .map(|n| n.to_string_lossy().starts_with('.'))
        .unwrap_or(false);
    dot_name || metadata.is_some_and(has_hidden_attribute)
}

#[cfg(windows)]
fn has_hidden_attribute(metadata: &Metadata) -> bool {
    use std::os::windows::fs::MetadataExt;
    const FILE_ATTRIBUTE_HIDDEN: u32 = 0x2;
    metadata.file_attributes() & FILE_ATTRIBUTE_HIDDEN != 0
}

#[cfg(not(windows))]
fn has_hidden_attribute(_metadata: &Metadata) -> bool {
    false
}

/// A simple file-name glob: `*` matches any run, `?` one character.
///
/// Every other character is literal. Matching is anchored and case-insensitive.
#[derive(Debug, Clone)]
pub struct NamePattern {
    source: String,
    regex: Regex,
}

impl NamePattern {
    /// Compiles `glob` into a matcher. An empty glob matches no file name.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the compiled expression is rejected.
    pub fn new(glob: &str) -> OrganizeResult<Self> {
        let mut expr = String::with_capacity(glob.len() + 8);
        expr.push('^');
        for c in glob.chars() {
            match c {
                '*' => expr.push_str(".*"),
                '?' => expr.push('.'),
                other => expr.push_str(&regex::escape(other.encode_utf8(&mut [0u8; 4]))),
            }
        }
        expr.push('$');

        let regex = RegexBuilder::new(&expr)
            .case_insensitive(true)
            .build()
            .map_err(|e| {
                OrganizeError::configuration(format!("invalid pattern '{}': {}", glob, e))
            })?;

        Ok(Self {
            source: glob.to_string(),
            regex,
        })
    }

    /// The glob this matcher was built from.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn matches(&self, file_name: &str) -> bool {
        self.regex.is_match(file_name)
    }
}

/// Compiled qualification rules for one run.
#[derive(Debug, Clone, Default)]
pub struct CompiledFilters {
    include_hidden: bool,
    pattern: Option<NamePattern>,
    exclude_filenames: HashSet<String>,
    exclude_extensions: HashSet<String>,
    exclude_patterns: Vec<Pattern>,
    exclude_regexes: Vec<Regex>,
}

impl CompiledFilters {
    /// Compiles the hidden flag, the name pattern, and the exclude rules.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if any glob or regex is invalid.
    pub fn new(
        include_hidden: bool,
        pattern: Option<&str>,
        exclude: &ExcludeRules,
    ) -> OrganizeResult<Self> {
        let pattern = pattern.map(NamePattern::new).transpose()?;

        let exclude_patterns = exclude
            .patterns
            .iter()
            .map(|p| {
                Pattern::new(p).map_err(|e| {
                    OrganizeError::configuration(format!(
                        "invalid exclude pattern '{}': {}",
                        p, e
                    ))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let exclude_regexes = exclude
            .regex
            .iter()
            .map(|r| {
                Regex::new(r).map_err(|e| {
                    OrganizeError::configuration(format!("invalid exclude regex '{}': {}", r, e))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            include_hidden,
            pattern,
            exclude_filenames: exclude.filenames.iter().cloned().collect(),
            exclude_extensions: exclude
                .extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_lowercase())
                .collect(),
            exclude_patterns,
            exclude_regexes,
        })
    }

    /// Whether the walk may descend into the directory at `path`.
    pub fn should_enter_dir(&self, path: &Path, metadata: Option<&Metadata>) -> bool {
        self.include_hidden || !is_hidden(path, metadata)
    }

    /// Whether a regular file takes part in the run.
    ///
    /// Checks, in order: hidden, name pattern, exact name, extension,
    /// exclude globs, exclude regexes.
    pub fn should_include(&self, path: &Path, metadata: Option<&Metadata>) -> bool {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();

        if !self.include_hidden && is_hidden(path, metadata) {
            return false;
        }

        if let Some(pattern) = &self.pattern
            && !pattern.matches(&file_name)
        {
            return false;
        }

        if self.exclude_filenames.contains(file_name.as_ref()) {
            return false;
        }

        let ext = extension_of(&file_name);
        if !ext.is_empty() && self.exclude_extensions.contains(&ext) {
            return false;
        }

        if self
            .exclude_patterns
            .iter()
            .any(|pattern| pattern.matches(&file_name))
        {
            return false;
        }

        !self
            .exclude_regexes
            .iter()
            .any(|regex| regex.is_match(&file_name))
    }
}
