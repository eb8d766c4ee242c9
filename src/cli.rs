//! Command-line interface for sortdir.
//!
//! - `sortdir` prompts for a folder, then organizes it.
//! - `sortdir <FOLDER>` organizes without prompting.
//! - `sortdir undo` reverts the last organization recorded in the move log.

use crate::config::OrganizerConfig;
use crate::error::{OrganizeError, OrganizeResult};
use crate::file_category::Category;
use crate::file_organizer::{FileOrganizer, MoveOutcome, OrganizeReport, PlannedMove};
use crate::output::OutputFormatter;
use crate::undo::{RestoreOutcome, UndoManager, UndoReport};
use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

/// Sort the files of a folder into category subfolders, reversibly.
#[derive(Debug, Parser)]
#[command(name = "sortdir", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Folder to organize. Prompted for when omitted. A folder literally
    /// named `undo` must be given as `./undo`.
    pub folder: Option<PathBuf>,

    /// Show what would be moved without moving anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Move log location (overrides the configuration file).
    #[arg(long, global = true, value_name = "PATH")]
    pub log: Option<PathBuf>,

    /// Configuration file to use instead of the default lookup.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Subcommand)]
pub enum Command {
    /// Move every logged file back and remove emptied category folders.
    Undo,
}

/// Represents a resolved command to execute.
#[derive(Debug, Clone)]
pub enum OrganizeCommand {
    /// Organize files in a folder. `None` means ask on stdin.
    Organize {
        folder: Option<PathBuf>,
        dry_run: bool,
    },
    /// Undo the previous organization.
    Undo,
}

impl Cli {
    pub fn command(&self) -> OrganizeCommand {
        match self.command {
            Some(Command::Undo) => OrganizeCommand::Undo,
            None => OrganizeCommand::Organize {
                folder: self.folder.clone(),
                dry_run: self.dry_run,
            },
        }
    }
}

/// Runs the parsed command line.
pub fn run_cli(cli: &Cli) -> OrganizeResult<()> {
    let mut config = OrganizerConfig::load(cli.config.as_deref())?;
    if let Some(log) = &cli.log {
        config.log.file = log.clone();
    }
    run_command(cli.command(), &config)
}

/// Runs `command` with `config`.
pub fn run_command(command: OrganizeCommand, config: &OrganizerConfig) -> OrganizeResult<()> {
    match command {
        OrganizeCommand::Organize { folder, dry_run } => {
            let folder = match folder {
                Some(folder) => folder,
                None => prompt_for_folder(&mut io::stdin().lock(), &mut io::stdout())
                    .map_err(|e| OrganizeError::io("Failed to read folder path from", "stdin", e))?,
            };
            let organizer = FileOrganizer::from_config(config)?;
            if dry_run {
                organize_dry_run(&organizer, &folder)
            } else {
                organize_folder(&organizer, &folder).map(|_| ())
            }
        }
        OrganizeCommand::Undo => undo_organization(&UndoManager::from_config(config)).map(|_| ()),
    }
}

/// Asks for the folder to organize and reads one trimmed line of input.
pub fn prompt_for_folder<R, W>(input: &mut R, output: &mut W) -> io::Result<PathBuf>
where
    R: BufRead,
    W: Write,
{
    write!(output, "Enter the path of the folder to organize: ")?;
    output.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(PathBuf::from(line.trim()))
}

/// Canonical form of `folder`, so logged paths stay valid from any working
/// directory.
fn resolve_folder(folder: &Path) -> OrganizeResult<PathBuf> {
    match fs::canonicalize(folder) {
        Ok(path) if path.is_dir() => Ok(path),
        _ => Err(OrganizeError::InvalidFolder {
            path: folder.to_path_buf(),
        }),
    }
}

/// Organizes `folder`, printing one line per file and a summary.
pub fn organize_folder(organizer: &FileOrganizer, folder: &Path) -> OrganizeResult<OrganizeReport> {
    let folder = resolve_folder(folder)?;
    OutputFormatter::info(&format!("Organizing contents of: {}", folder.display()));

    let plan = organizer.plan(&folder)?;
    let pb = OutputFormatter::create_progress_bar(plan.len() as u64);
    let report = organizer.execute(&plan, |outcome| {
        pb.suspend(|| print_move_outcome(outcome));
        pb.inc(1);
    });
    pb.finish_and_clear();
    let report = report?;

    if report.moved_count() > 0 {
        OutputFormatter::summary_table(&report.category_counts, report.moved_count());
    } else {
        OutputFormatter::plain("No files to organize.");
    }

    if !report.failures.is_empty() {
        OutputFormatter::warning(&format!(
            "{} file(s) could not be organized. Please review errors above.",
            report.failures.len()
        ));
    }

    OutputFormatter::success(&format!(
        "Organization complete. Undo with `sortdir undo` (log: {}).",
        organizer.log().path().display()
    ));
    Ok(report)
}

fn print_move_outcome(outcome: &MoveOutcome) {
    match outcome {
        MoveOutcome::Moved { record, category } => {
            let name = record
                .original_path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            OutputFormatter::success(&format!("Moved {} -> {}/", name, category));
        }
        MoveOutcome::Failed { source, error } => {
            OutputFormatter::error(&format!("Could not move {}: {}", source.display(), error));
        }
    }
}

/// Prints the moves organizing `folder` would make, without making them.
pub fn organize_dry_run(organizer: &FileOrganizer, folder: &Path) -> OrganizeResult<()> {
    let folder = resolve_folder(folder)?;
    OutputFormatter::dry_run_notice(&format!("Analyzing contents of: {}", folder.display()));

    let plan = organizer.plan(&folder)?;
    if plan.is_empty() {
        OutputFormatter::plain("No files found to organize.");
        return Ok(());
    }

    for planned in &plan {
        OutputFormatter::plain(&format!(
            " - {} → would move to {}/",
            display_name(planned),
            planned.category
        ));
    }

    OutputFormatter::summary_table(&plan_counts(&plan), plan.len());
    OutputFormatter::dry_run_notice("No files were modified.");
    Ok(())
}

fn display_name(planned: &PlannedMove) -> String {
    planned
        .source
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

fn plan_counts(plan: &[PlannedMove]) -> BTreeMap<Category, usize> {
    let mut counts = BTreeMap::new();
    for planned in plan {
        *counts.entry(planned.category).or_insert(0) += 1;
    }
    counts
}

/// Undoes the last organization, printing one line per restored file.
pub fn undo_organization(manager: &UndoManager) -> OrganizeResult<UndoReport> {
    OutputFormatter::info("Undoing previous organization...");

    let report = manager.undo_with_progress(print_restore_outcome)?;

    OutputFormatter::header("UNDO SUMMARY");
    OutputFormatter::plain(&format!("  Restored: {}", report.restored_count()));
    if !report.is_complete_success() {
        OutputFormatter::plain(&format!("  Failed: {}", report.failed_count()));
        OutputFormatter::warning(&format!(
            "Move log {} was removed; the failed files must be restored by hand.",
            manager.log().path().display()
        ));
    }
    for dir in &report.removed_dirs {
        OutputFormatter::plain(&format!("  Removed empty folder {}", dir.display()));
    }

    OutputFormatter::success("Undo complete.");
    Ok(report)
}

fn print_restore_outcome(outcome: &RestoreOutcome) {
    match outcome {
        RestoreOutcome::Restored(record) => {
            let name = record
                .moved_path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            OutputFormatter::success(&format!(
                "Restored {} <- {}",
                name,
                record.original_path.display()
            ));
        }
        RestoreOutcome::Failed { record, error } => {
            OutputFormatter::error(&format!(
                "Failed to move {} back to {}: {}",
                record.moved_path.display(),
                record.original_path.display(),
                error
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_no_arguments_prompts_for_folder() {
        let cli = Cli::try_parse_from(["sortdir"]).unwrap();
        assert!(matches!(
            cli.command(),
            OrganizeCommand::Organize {
                folder: None,
                dry_run: false
            }
        ));
    }

    #[test]
    fn test_undo_subcommand() {
        let cli = Cli::try_parse_from(["sortdir", "undo"]).unwrap();
        assert!(matches!(cli.command(), OrganizeCommand::Undo));
    }

    #[test]
    fn test_folder_argument_and_flags() {
        let cli =
            Cli::try_parse_from(["sortdir", "--dry-run", "--log", "moves.json", "/tmp/inbox"]).unwrap();

        assert_eq!(cli.log, Some(PathBuf::from("moves.json")));
        match cli.command() {
            OrganizeCommand::Organize { folder, dry_run } => {
                assert_eq!(folder, Some(PathBuf::from("/tmp/inbox")));
                assert!(dry_run);
            }
            OrganizeCommand::Undo => panic!("expected organize"),
        }
    }

    #[test]
    fn test_global_log_flag_after_undo() {
        let cli = Cli::try_parse_from(["sortdir", "undo", "--log", "moves.json"]).unwrap();
        assert!(matches!(cli.command(), OrganizeCommand::Undo));
        assert_eq!(cli.log, Some(PathBuf::from("moves.json")));
    }

    #[test]
    fn test_prompt_trims_input() {
        let mut input = Cursor::new("  /home/me/Downloads \n");
        let mut output = Vec::new();

        let folder = prompt_for_folder(&mut input, &mut output).unwrap();

        assert_eq!(folder, PathBuf::from("/home/me/Downloads"));
        assert_eq!(
            String::from_utf8(output).unwrap(),
            "Enter the path of the folder to organize: "
        );
    }

    #[test]
    fn test_folder_named_undo_needs_path_prefix() {
        let bare = Cli::try_parse_from(["sortdir", "undo"]).unwrap();
        assert!(matches!(bare.command(), OrganizeCommand::Undo));

        let prefixed = Cli::try_parse_from(["sortdir", "./undo"]).unwrap();
        match prefixed.command() {
            OrganizeCommand::Organize { folder, .. } => {
                assert_eq!(folder, Some(PathBuf::from("./undo")));
            }
            OrganizeCommand::Undo => panic!("expected organize"),
        }
    }

    #[test]
    fn test_resolve_folder_rejects_missing_path() {
        let result = resolve_folder(Path::new("/non/existent/path"));
        assert!(matches!(result, Err(OrganizeError::InvalidFolder { .. })));
    }
}
