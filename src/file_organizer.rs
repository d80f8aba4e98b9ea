/// The organizer engine: walks the source tree and places each qualifying file
/// into its destination folder.
///
/// A run has two phases. First the tree is walked and every qualifying file is
/// collected (see [`Organizer::plan`]). Then each file is classified, checked for
/// conflicts, and moved or copied. Because the walk finishes before the first
/// transfer, files placed into a target that lives inside the source are never
/// visited twice.
use crate::config::{OrganizerConfig, TransferMode};
use crate::conflict::{self, Resolution};
use crate::error::{FileError, FileErrorKind, OrganizeError, OrganizeResult};
use crate::file_category::TypeTable;
use crate::file_filter::CompiledFilters;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use walkdir::{DirEntry, WalkDir};

/// A regular file found by the walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub path: PathBuf,
    pub parent: PathBuf,
    pub file_name: String,
    pub modified: SystemTime,
    pub is_file: bool,
}

impl FileEntry {
    /// Reads the entry for the file at `path`.
    pub fn from_path(path: &Path) -> io::Result<Self> {
        let metadata = fs::symlink_metadata(path)?;
        Self::with_metadata(path, &metadata)
    }

    fn with_metadata(path: &Path, metadata: &fs::Metadata) -> io::Result<Self> {
        Ok(Self {
            path: path.to_path_buf(),
            parent: path.parent().map(Path::to_path_buf).unwrap_or_default(),
            file_name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            modified: metadata.modified()?,
            is_file: metadata.is_file(),
        })
    }
}

/// Lazy walk over the qualifying files below a source root.
///
/// Hidden directories (unless enabled) and directories deeper than the
/// effective max depth are not entered. A target directory nested inside the
/// root is entered whatever its depth. Symlinks are neither followed nor
/// yielded. Entries that cannot be read are yielded as errors and the walk
/// goes on.
pub struct TreeWalker<'a> {
    inner: walkdir::FilterEntry<walkdir::IntoIter, Box<dyn FnMut(&DirEntry) -> bool + 'a>>,
    filters: &'a CompiledFilters,
    root: PathBuf,
}

impl<'a> TreeWalker<'a> {
    /// Walks `root` down to `max_depth` directory levels (`None` = unlimited).
    ///
    /// `target`, if it is a directory below `root`, is exempt from the depth
    /// limit but not from hidden-directory pruning.
    pub fn new(
        root: &Path,
        target: Option<&Path>,
        max_depth: Option<u32>,
        filters: &'a CompiledFilters,
    ) -> Self {
        let max_depth = max_depth.map(|depth| depth as usize);
        let target = target.map(|t| fs::canonicalize(t).unwrap_or_else(|_| t.to_path_buf()));

        let predicate: Box<dyn FnMut(&DirEntry) -> bool + 'a> =
            Box::new(move |entry: &DirEntry| -> bool {
                if entry.depth() == 0 || !entry.file_type().is_dir() {
                    return true;
                }
                let metadata = entry.metadata().ok();
                if !filters.should_enter_dir(entry.path(), metadata.as_ref()) {
                    tracing::debug!(dir = %entry.path().display(), "skipping hidden directory");
                    return false;
                }
                match max_depth {
                    Some(limit) if entry.depth() > limit => {
                        let is_target = target
                            .as_deref()
                            .is_some_and(|t| is_same_location(entry.path(), t));
                        if !is_target {
                            tracing::debug!(dir = %entry.path().display(), "below max depth");
                        }
                        is_target
                    }
                    _ => true,
                }
            });

        let walk = WalkDir::new(root).follow_links(false).sort_by_file_name();
        Self {
            inner: walk.into_iter().filter_entry(predicate),
            filters,
            root: root.to_path_buf(),
        }
    }
}

impl Iterator for TreeWalker<'_> {
    type Item = Result<FileEntry, FileError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.inner.next()? {
                Ok(entry) => entry,
                Err(err) => {
                    let path = err
                        .path()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| self.root.clone());
                    return Some(Err(FileError {
                        path,
                        kind: FileErrorKind::Walk,
                        message: err.to_string(),
                    }));
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let metadata = match entry.metadata() {
                Ok(metadata) => metadata,
                Err(err) => {
                    if !self.filters.should_include(entry.path(), None) {
                        continue;
                    }
                    return Some(Err(FileError {
                        path: entry.path().to_path_buf(),
                        kind: FileErrorKind::Metadata,
                        message: err.to_string(),
                    }));
                }
            };

            if !self.filters.should_include(entry.path(), Some(&metadata)) {
                tracing::debug!(file = %entry.path().display(), "filtered out");
                continue;
            }

            return Some(
                FileEntry::with_metadata(entry.path(), &metadata)
                    .map_err(|e| FileError::new(entry.path(), FileErrorKind::Metadata, &e)),
            );
        }
    }
}

/// The files a run would process, collected before anything is touched.
#[derive(Debug, Clone, Default)]
pub struct Plan {
    pub entries: Vec<FileEntry>,
    /// Entries the walk could not read.
    pub errors: Vec<FileError>,
}

impl Plan {
    pub fn len(&self) -> usize {
        self.entries.len() + self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// What happened to one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outcome {
    pub action: TransferMode,
    pub source: PathBuf,
    /// Final destination, or the classified one for previews and skips.
    pub destination: Option<PathBuf>,
    pub result: OutcomeResult,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutcomeResult {
    /// Dry-run preview; nothing was touched.
    Planned,
    /// The file was moved or copied.
    Done,
    /// The file already sits at its destination.
    AlreadyInPlace,
    /// The destination was taken and the strategy is skip.
    SkippedExisting,
    Failed(FileError),
}

/// Counters and outcomes of one run.
///
/// `moved` and `copied` count real transfers only; dry-run previews and files
/// already in place are not counted. `skipped` counts conflict skips and failures.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub moved: usize,
    pub copied: usize,
    pub skipped: usize,
    pub outcomes: Vec<Outcome>,
}

impl RunReport {
    fn record(&mut self, outcome: Outcome) -> &Outcome {
        match (&outcome.result, outcome.action) {
            (OutcomeResult::Done, TransferMode::Move) => self.moved += 1,
            (OutcomeResult::Done, TransferMode::Copy) => self.copied += 1,
            (OutcomeResult::SkippedExisting | OutcomeResult::Failed(_), _) => self.skipped += 1,
            (OutcomeResult::Planned | OutcomeResult::AlreadyInPlace, _) => {}
        }
        self.outcomes.push(outcome);
        &self.outcomes[self.outcomes.len() - 1]
    }

    /// Per-file failures, in processing order.
    pub fn failures(&self) -> impl Iterator<Item = &FileError> {
        self.outcomes.iter().filter_map(|o| match &o.result {
            OutcomeResult::Failed(err) => Some(err),
            _ => None,
        })
    }
}

/// Receives progress while a run is in flight.
pub trait ProgressObserver {
    /// Called once the walk is done, with the number of items to process.
    fn on_start(&mut self, _total: usize) {}
    /// Called after each file has been handled.
    fn on_outcome(&mut self, _outcome: &Outcome) {}
    fn on_finish(&mut self, _report: &RunReport) {}
}

/// Observer that ignores everything.
pub struct NoProgress;

impl ProgressObserver for NoProgress {}

/// Organizes one source tree according to an [`OrganizerConfig`].
///
/// Callers must not run two organizers over overlapping source or target trees
/// at the same time: moves are not locked against each other.
///
/// # Examples
///
/// ```no_run
/// use treetidy::config::OrganizerConfig;
/// use treetidy::file_organizer::Organizer;
///
/// let config = OrganizerConfig::new("/home/me/Downloads").with_dry_run(true);
/// let report = Organizer::new(config)?.run()?;
/// println!("moved {}, skipped {}", report.moved, report.skipped);
/// # Ok::<(), treetidy::OrganizeError>(())
/// ```
pub struct Organizer {
    config: OrganizerConfig,
    filters: CompiledFilters,
    table: TypeTable,
}

impl Organizer {
    /// Validates `config` and prepares the engine.
    ///
    /// # Errors
    ///
    /// Returns `OrganizeError::Configuration` if the config is invalid.
    pub fn new(config: OrganizerConfig) -> OrganizeResult<Self> {
        let filters = config.validate()?;
        Ok(Self {
            config,
            filters,
            table: TypeTable::new(),
        })
    }

    pub fn config(&self) -> &OrganizerConfig {
        &self.config
    }

    /// Lazily walks the source tree, yielding qualifying files.
    pub fn walk(&self) -> TreeWalker<'_> {
        TreeWalker::new(
            &self.config.source,
            Some(&self.config.target),
            self.config.effective_max_depth(),
            &self.filters,
        )
    }

    /// Collects the files a run would process without touching anything.
    ///
    /// # Errors
    ///
    /// Returns `OrganizeError::Structural` if the source is missing, not a
    /// directory, or unreadable.
    pub fn plan(&self) -> OrganizeResult<Plan> {
        self.check_source()?;
        Ok(self.collect_plan())
    }

    fn collect_plan(&self) -> Plan {
        let mut plan = Plan::default();
        for item in self.walk() {
            match item {
                Ok(entry) => plan.entries.push(entry),
                Err(err) => plan.errors.push(err),
            }
        }
        plan
    }

    /// Runs the organizer once.
    pub fn run(&self) -> OrganizeResult<RunReport> {
        self.run_with(&mut NoProgress)
    }

    /// Runs the organizer once, reporting progress to `observer`.
    ///
    /// # Errors
    ///
    /// Only structural problems abort the run, and only before any file has
    /// been touched. Per-file failures are recorded in the report.
    pub fn run_with<O: ProgressObserver>(&self, observer: &mut O) -> OrganizeResult<RunReport> {
        self.check_source()?;
        self.prepare_target()?;

        let plan = self.collect_plan();
        tracing::info!(
            source = %self.config.source.display(),
            target = %self.config.target.display(),
            files = plan.entries.len(),
            dry_run = self.config.dry_run,
            "starting run"
        );
        observer.on_start(plan.len());

        let mut report = RunReport::default();
        for error in plan.errors {
            tracing::warn!(path = %error.path.display(), error = %error, "cannot read entry");
            let outcome = Outcome {
                action: self.config.transfer,
                source: error.path.clone(),
                destination: None,
                result: OutcomeResult::Failed(error),
            };
            observer.on_outcome(report.record(outcome));
        }

        for entry in &plan.entries {
            let outcome = self.process(entry);
            observer.on_outcome(report.record(outcome));
        }

        tracing::info!(
            moved = report.moved,
            copied = report.copied,
            skipped = report.skipped,
            "run finished"
        );
        observer.on_finish(&report);
        Ok(report)
    }

    /// Destination for `entry`: target / folder / original file name.
    pub fn destination_for(&self, entry: &FileEntry) -> PathBuf {
        let folder = self.table.destination_folder(entry, self.config.mode);
        let name = entry
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| entry.file_name.clone().into());
        self.config.target.join(folder).join(name)
    }

    fn check_source(&self) -> OrganizeResult<()> {
        let source = &self.config.source;
        let metadata = fs::metadata(source).map_err(|e| {
            OrganizeError::structural(source, format!("source is not accessible: {}", e))
        })?;
        if !metadata.is_dir() {
            return Err(OrganizeError::structural(source, "source is not a directory"));
        }
        fs::read_dir(source)
            .map_err(|e| OrganizeError::structural(source, format!("cannot read source: {}", e)))?;
        Ok(())
    }

    fn prepare_target(&self) -> OrganizeResult<()> {
        let target = &self.config.target;
        match fs::metadata(target) {
            Ok(metadata) if metadata.is_dir() => Ok(()),
            Ok(_) => Err(OrganizeError::structural(target, "target is not a directory")),
            Err(_) if self.config.dry_run => Ok(()),
            Err(_) => fs::create_dir_all(target).map_err(|e| {
                OrganizeError::structural(target, format!("cannot create target: {}", e))
            }),
        }
    }

    fn process(&self, entry: &FileEntry) -> Outcome {
        let action = self.config.transfer;
        let destination = self.destination_for(entry);
        let outcome = |destination: PathBuf, result: OutcomeResult| Outcome {
            action,
            source: entry.path.clone(),
            destination: Some(destination),
            result,
        };

        if is_same_location(&entry.path, &destination) {
            tracing::debug!(file = %entry.path.display(), "already organized");
            return outcome(destination, OutcomeResult::AlreadyInPlace);
        }

        if self.config.dry_run {
            tracing::debug!(
                file = %entry.path.display(),
                destination = %destination.display(),
                "would {}",
                action.verb()
            );
            return outcome(destination, OutcomeResult::Planned);
        }

        if let Some(parent) = destination.parent()
            && let Err(e) = fs::create_dir_all(parent)
        {
            let error = FileError {
                path: entry.path.clone(),
                kind: FileErrorKind::CreateDir,
                message: format!("cannot create {}: {}", parent.display(), e),
            };
            return self.failed(entry, destination.clone(), error);
        }

        let resolved = match conflict::resolve(&destination, path_exists, self.config.conflict) {
            Resolution::Use(path) => path,
            Resolution::Skip => {
                tracing::info!(destination = %destination.display(), "destination exists, skipping");
                return outcome(destination, OutcomeResult::SkippedExisting);
            }
        };

        let transferred = match action {
            TransferMode::Copy => copy_file(&entry.path, &resolved),
            TransferMode::Move => move_file(&entry.path, &resolved),
        };

        match transferred {
            Ok(()) => {
                tracing::info!(
                    file = %entry.path.display(),
                    destination = %resolved.display(),
                    "{}",
                    if action == TransferMode::Move { "moved" } else { "copied" }
                );
                outcome(resolved, OutcomeResult::Done)
            }
            Err(e) => {
                let error = FileError::new(&entry.path, FileErrorKind::Transfer, &e);
                self.failed(entry, resolved, error)
            }
        }
    }

    fn failed(&self, entry: &FileEntry, destination: PathBuf, error: FileError) -> Outcome {
        tracing::warn!(file = %entry.path.display(), error = %error, "failed to process file");
        Outcome {
            action: self.config.transfer,
            source: entry.path.clone(),
            destination: Some(destination),
            result: OutcomeResult::Failed(error),
        }
    }
}

/// True if something (including a dangling symlink) occupies `path`.
fn path_exists(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

fn is_same_location(source: &Path, destination: &Path) -> bool {
    if source == destination {
        return true;
    }
    match (fs::canonicalize(source), fs::canonicalize(destination)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Copies contents, permissions, and modification time, replacing `dst`.
fn copy_file(src: &Path, dst: &Path) -> io::Result<()> {
    let metadata = fs::metadata(src)?;
    fs::copy(src, dst)?;
    filetime::set_file_mtime(dst, filetime::FileTime::from_last_modification_time(&metadata))
}

/// Renames `src` to `dst`, replacing `dst`. Falls back to copy + remove across devices.
fn move_file(src: &Path, dst: &Path) -> io::Result<()> {
    match fs::rename(src, dst) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            tracing::debug!(file = %src.display(), "rename crosses devices, copying instead");
            copy_file(src, dst)?;
            fs::remove_file(src)
        }
        Err(e) => Err(e),
    }
}
