/// Sorting a folder's files into category subfolders.
///
/// Organizing happens in two phases: [`FileOrganizer::plan`] lists the
/// folder's immediate files and resolves their categories without touching
/// anything, then [`FileOrganizer::execute`] performs the moves, collects one
/// [`MoveOutcome`] per file and writes the move log once at the end.
use crate::config::{ConflictPolicy, OrganizerConfig, SkipFilter};
use crate::error::{OrganizeError, OrganizeResult};
use crate::file_category::{self, Category};
use crate::move_log::{MoveLogStore, MoveRecord};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// A move the organizer intends to make.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedMove {
    /// The file as it currently sits in the folder.
    pub source: PathBuf,
    /// `folder/<category>/<file name>`.
    pub destination: PathBuf,
    pub category: Category,
}

/// Result of attempting one planned move.
#[derive(Debug)]
pub enum MoveOutcome {
    Moved {
        record: MoveRecord,
        category: Category,
    },
    Failed {
        source: PathBuf,
        error: OrganizeError,
    },
}

/// Summary of an organize run.
#[derive(Debug, Default)]
pub struct OrganizeReport {
    /// Completed moves, in move order. This is what was written to the log.
    pub records: Vec<MoveRecord>,
    /// Number of files moved into each category.
    pub category_counts: BTreeMap<Category, usize>,
    /// Files that could not be moved, with the reason.
    pub failures: Vec<(PathBuf, OrganizeError)>,
}

impl OrganizeReport {
    /// Number of files moved.
    pub fn moved_count(&self) -> usize {
        self.records.len()
    }

    fn absorb(&mut self, outcome: MoveOutcome) {
        match outcome {
            MoveOutcome::Moved { record, category } => {
                *self.category_counts.entry(category).or_insert(0) += 1;
                self.records.push(record);
            }
            MoveOutcome::Failed { source, error } => self.failures.push((source, error)),
        }
    }
}

/// Moves the files of a folder into category subfolders and records each move.
#[derive(Debug, Clone)]
pub struct FileOrganizer {
    log: MoveLogStore,
    skip: SkipFilter,
    on_conflict: ConflictPolicy,
}

impl FileOrganizer {
    /// Creates an organizer that writes its log to `log`, skips nothing and
    /// overwrites existing destinations.
    ///
    /// # Arguments
    ///
    /// * `log` - The store the move log is saved to after each run
    pub fn new(log: MoveLogStore) -> Self {
        Self {
            log,
            skip: SkipFilter::default(),
            on_conflict: ConflictPolicy::default(),
        }
    }

    /// Creates an organizer from loaded configuration.
    ///
    /// # Returns
    ///
    /// Returns an error if the configured skip patterns do not compile.
    pub fn from_config(config: &OrganizerConfig) -> OrganizeResult<Self> {
        Ok(Self {
            log: MoveLogStore::new(&config.log.file),
            skip: SkipFilter::compile(&config.skip)?,
            on_conflict: config.organize.on_conflict,
        })
    }

    pub fn with_skip_filter(mut self, skip: SkipFilter) -> Self {
        self.skip = skip;
        self
    }

    pub fn with_conflict_policy(mut self, on_conflict: ConflictPolicy) -> Self {
        self.on_conflict = on_conflict;
        self
    }

    /// The move log this organizer writes.
    pub fn log(&self) -> &MoveLogStore {
        &self.log
    }

    /// Lists the moves organizing `folder` would make, sorted by file name.
    ///
    /// Directories (including category folders from a previous run), skipped
    /// names and the move log itself are left out. Nothing is modified.
    ///
    /// # Errors
    ///
    /// Returns [`OrganizeError::InvalidFolder`] if `folder` is not a directory.
    pub fn plan(&self, folder: &Path) -> OrganizeResult<Vec<PlannedMove>> {
        if !folder.is_dir() {
            return Err(OrganizeError::InvalidFolder {
                path: folder.to_path_buf(),
            });
        }

        let entries = fs::read_dir(folder)
            .map_err(|e| OrganizeError::io("Failed to read directory", folder, e))?;

        let mut plan = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| OrganizeError::io("Failed to read directory", folder, e))?;
            let source = entry.path();
            if source.is_dir() {
                continue;
            }

            let file_name = entry.file_name().to_string_lossy().to_string();
            if self.skip.should_skip(&file_name) || self.log.refers_to(&source) {
                tracing::debug!(file = %file_name, "skipping entry");
                continue;
            }

            let category = file_category::resolve(&file_name);
            let destination = folder.join(category.dir_name()).join(entry.file_name());
            plan.push(PlannedMove {
                source,
                destination,
                category,
            });
        }

        plan.sort_by(|a, b| a.source.cmp(&b.source));
        Ok(plan)
    }

    /// Organizes `folder` and returns what was moved.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use sortdir::file_organizer::FileOrganizer;
    /// use sortdir::move_log::MoveLogStore;
    /// use std::path::Path;
    ///
    /// let organizer = FileOrganizer::new(MoveLogStore::default());
    /// match organizer.organize(Path::new("/home/me/Downloads")) {
    ///     Ok(report) => println!("Moved {} files", report.moved_count()),
    ///     Err(e) => eprintln!("Organize failed: {}", e),
    /// }
    /// ```
    pub fn organize(&self, folder: &Path) -> OrganizeResult<OrganizeReport> {
        let plan = self.plan(folder)?;
        self.execute(&plan, |_| {})
    }

    /// Performs `plan`, calling `on_outcome` after each attempted move, then
    /// replaces the move log with the completed moves.
    ///
    /// A failed move is recorded in the report and does not stop the run.
    /// Failing to write the log does, since the moves could not be undone.
    /// Paths that are not valid UTF-8 fail before they move.
    ///
    /// # Arguments
    ///
    /// * `plan` - Moves as returned by [`FileOrganizer::plan`]
    /// * `on_outcome` - Called once per planned move, in order
    ///
    /// # Returns
    ///
    /// Returns the [`OrganizeReport`] for the run, or an error if the move
    /// log could not be written.
    pub fn execute<F>(&self, plan: &[PlannedMove], mut on_outcome: F) -> OrganizeResult<OrganizeReport>
    where
        F: FnMut(&MoveOutcome),
    {
        let mut report = OrganizeReport::default();

        for planned in plan {
            let outcome = match self.move_into_category(planned) {
                Ok(record) => MoveOutcome::Moved {
                    record,
                    category: planned.category,
                },
                Err(error) => {
                    tracing::warn!(file = %planned.source.display(), %error, "move failed");
                    MoveOutcome::Failed {
                        source: planned.source.clone(),
                        error,
                    }
                }
            };
            on_outcome(&outcome);
            report.absorb(outcome);
        }

        self.log.save(&report.records)?;
        tracing::info!(
            moved = report.moved_count(),
            failed = report.failures.len(),
            log = %self.log.path().display(),
            "organize finished"
        );
        Ok(report)
    }

    fn move_into_category(&self, planned: &PlannedMove) -> OrganizeResult<MoveRecord> {
        // A move the log cannot hold could never be undone.
        for path in [&planned.source, &planned.destination] {
            if path.to_str().is_none() {
                return Err(OrganizeError::UnloggablePath { path: path.clone() });
            }
        }

        if let Some(category_dir) = planned.destination.parent() {
            fs::create_dir_all(category_dir)
                .map_err(|e| OrganizeError::io("Failed to create directory", category_dir, e))?;
        }

        relocate(&planned.source, &planned.destination, self.on_conflict)?;
        tracing::debug!(
            from = %planned.source.display(),
            to = %planned.destination.display(),
            "moved file"
        );
        Ok(MoveRecord::new(&planned.source, &planned.destination))
    }
}

/// Moves `source` to `destination`, applying `policy` if `destination` is taken.
///
/// Falls back to copy and delete when the two paths are on different devices.
///
/// # Returns
///
/// Returns [`OrganizeError::Conflict`] under [`ConflictPolicy::Skip`] when the
/// destination exists, or an [`OrganizeError::Io`] naming the failed step.
pub(crate) fn relocate(source: &Path, destination: &Path, policy: ConflictPolicy) -> OrganizeResult<()> {
    if fs::symlink_metadata(source).is_err() {
        return Err(OrganizeError::io(
            "Failed to move",
            source,
            std::io::Error::new(ErrorKind::NotFound, "file not found"),
        ));
    }

    if fs::symlink_metadata(destination).is_ok() {
        match policy {
            ConflictPolicy::Overwrite => {}
            ConflictPolicy::Skip => {
                return Err(OrganizeError::Conflict {
                    path: destination.to_path_buf(),
                });
            }
            ConflictPolicy::Backup => {
                let backup = backup_path(destination);
                fs::rename(destination, &backup).map_err(|e| {
                    OrganizeError::io("Could not back up conflicting file", destination, e)
                })?;
                tracing::debug!(backup = %backup.display(), "backed up conflicting file");
            }
        }
    }

    match fs::rename(source, destination) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::CrossesDevices => {
            fs::copy(source, destination)
                .map_err(|e| OrganizeError::io("Failed to copy", source, e))?;
            fs::remove_file(source).map_err(|e| OrganizeError::io("Failed to remove", source, e))
        }
        Err(e) => Err(OrganizeError::io("Failed to move", source, e)),
    }
}

/// `file.txt` becomes `file.txt.bak.20251109-143052`.
fn backup_path(path: &Path) -> PathBuf {
    let timestamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "file".to_string());

    path.with_file_name(format!("{}.bak.{}", file_name, timestamp))
}
