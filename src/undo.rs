/// Undo functionality for reverting file organization.
///
/// Replays the move log backwards: every moved file is put back at its
/// original path, category folders left empty are removed, and the log is
/// deleted. A record that cannot be restored is reported and the rest still
/// run.
use crate::config::{ConflictPolicy, OrganizerConfig};
use crate::error::{OrganizeError, OrganizeResult};
use crate::file_organizer::relocate;
use crate::move_log::{MoveLogStore, MoveRecord};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Result of restoring one logged move.
#[derive(Debug)]
pub enum RestoreOutcome {
    Restored(MoveRecord),
    Failed {
        record: MoveRecord,
        error: OrganizeError,
    },
}

/// Represents the result of an undo operation.
#[derive(Debug, Default)]
pub struct UndoReport {
    /// Records whose file is back at its original path.
    pub restored: Vec<MoveRecord>,
    /// Records that could not be restored, with the reason.
    pub failures: Vec<(MoveRecord, OrganizeError)>,
    /// Category folders removed because they were left empty.
    pub removed_dirs: Vec<PathBuf>,
}

impl UndoReport {
    pub fn restored_count(&self) -> usize {
        self.restored.len()
    }

    pub fn failed_count(&self) -> usize {
        self.failures.len()
    }

    /// Returns true if every logged file was restored.
    pub fn is_complete_success(&self) -> bool {
        self.failures.is_empty()
    }

    fn absorb(&mut self, outcome: RestoreOutcome) {
        match outcome {
            RestoreOutcome::Restored(record) => self.restored.push(record),
            RestoreOutcome::Failed { record, error } => self.failures.push((record, error)),
        }
    }
}

/// Manages undo operations for file organization.
#[derive(Debug, Clone)]
pub struct UndoManager {
    log: MoveLogStore,
    on_conflict: ConflictPolicy,
}

impl UndoManager {
    pub fn new(log: MoveLogStore) -> Self {
        Self {
            log,
            on_conflict: ConflictPolicy::default(),
        }
    }

    pub fn from_config(config: &OrganizerConfig) -> Self {
        Self {
            log: MoveLogStore::new(&config.log.file),
            on_conflict: config.organize.on_conflict,
        }
    }

    pub fn with_conflict_policy(mut self, on_conflict: ConflictPolicy) -> Self {
        self.on_conflict = on_conflict;
        self
    }

    /// The move log this manager replays.
    pub fn log(&self) -> &MoveLogStore {
        &self.log
    }

    /// Undoes the organization recorded in the move log.
    ///
    /// # Errors
    ///
    /// * [`OrganizeError::NothingToUndo`] if there is no log or it is empty;
    ///   nothing is changed.
    /// * [`OrganizeError::CorruptLog`] if the log cannot be parsed; nothing is
    ///   changed.
    /// * [`OrganizeError::Io`] if the log cannot be read or deleted.
    ///
    /// Individual restore failures are not errors; they are listed in the
    /// returned [`UndoReport`].
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use sortdir::move_log::MoveLogStore;
    /// use sortdir::undo::UndoManager;
    ///
    /// match UndoManager::new(MoveLogStore::default()).undo() {
    ///     Ok(report) => println!("Restored {} files", report.restored_count()),
    ///     Err(e) => eprintln!("Undo failed: {}", e),
    /// }
    /// ```
    pub fn undo(&self) -> OrganizeResult<UndoReport> {
        self.undo_with_progress(|_| {})
    }

    /// Same as [`UndoManager::undo`], calling `on_outcome` after each record.
    pub fn undo_with_progress<F>(&self, mut on_outcome: F) -> OrganizeResult<UndoReport>
    where
        F: FnMut(&RestoreOutcome),
    {
        let records = self.log.load()?;
        if records.is_empty() {
            return Err(OrganizeError::NothingToUndo {
                path: self.log.path().to_path_buf(),
            });
        }

        let category_dirs: BTreeSet<PathBuf> = records
            .iter()
            .filter_map(|record| record.moved_path.parent().map(Path::to_path_buf))
            .collect();

        let mut report = UndoReport::default();
        for record in records {
            let outcome = match self.restore_file(&record) {
                Ok(()) => RestoreOutcome::Restored(record),
                Err(error) => {
                    tracing::warn!(file = %record.moved_path.display(), %error, "restore failed");
                    RestoreOutcome::Failed { record, error }
                }
            };
            on_outcome(&outcome);
            report.absorb(outcome);
        }

        for dir in category_dirs {
            if remove_if_empty(&dir) {
                report.removed_dirs.push(dir);
            }
        }

        // Dropped even after partial failure; the failures are in the report.
        self.log.delete()?;

        tracing::info!(
            restored = report.restored_count(),
            failed = report.failed_count(),
            removed_dirs = report.removed_dirs.len(),
            "undo finished"
        );
        Ok(report)
    }

    /// Moves one logged file back to where it came from.
    fn restore_file(&self, record: &MoveRecord) -> OrganizeResult<()> {
        if let Some(parent) = record.original_path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .map_err(|e| OrganizeError::io("Failed to create directory", parent, e))?;
        }

        relocate(&record.moved_path, &record.original_path, self.on_conflict)?;
        tracing::debug!(
            from = %record.moved_path.display(),
            to = %record.original_path.display(),
            "restored file"
        );
        Ok(())
    }
}

/// Removes `dir` if it exists and is empty. Any failure is ignored.
fn remove_if_empty(dir: &Path) -> bool {
    let is_empty = match fs::read_dir(dir) {
        Ok(mut entries) => entries.next().is_none(),
        Err(_) => false,
    };

    if is_empty && fs::remove_dir(dir).is_ok() {
        tracing::debug!(dir = %dir.display(), "removed empty directory");
        return true;
    }
    false
}
