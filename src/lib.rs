//! sortdir - sort a folder's files into category subfolders, reversibly
//!
//! Files are grouped by extension into `Images`, `Documents`, `Videos`,
//! `Music`, `Archives` and `Others`. Every move is written to a JSON move log
//! so the whole run can be undone later.

pub mod cli;
pub mod config;
pub mod error;
pub mod file_category;
pub mod file_organizer;
pub mod move_log;
pub mod output;
pub mod undo;

pub use config::{ConfigError, ConflictPolicy, OrganizerConfig, SkipFilter};
pub use error::{OrganizeError, OrganizeResult};
pub use file_category::{Category, resolve};
pub use file_organizer::{FileOrganizer, MoveOutcome, OrganizeReport, PlannedMove};
pub use move_log::{MoveLogStore, MoveRecord};
pub use undo::{RestoreOutcome, UndoManager, UndoReport};

pub use cli::{Cli, OrganizeCommand, run_cli, run_command};
