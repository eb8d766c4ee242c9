/// Persistent move log used to undo an organization run.
///
/// The log is a JSON array of `{"original": ..., "moved": ...}` objects in
/// move order, indented so that it can be read and edited by hand.
use crate::error::{OrganizeError, OrganizeResult};
use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;
use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// File name of the move log when no other location is configured.
pub const DEFAULT_LOG_FILE: &str = "organizer.log.json";

/// One completed file move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecord {
    /// Where the file was before it was moved.
    #[serde(rename = "original")]
    pub original_path: PathBuf,
    /// Where the file was moved to.
    #[serde(rename = "moved")]
    pub moved_path: PathBuf,
}

impl MoveRecord {
    pub fn new(original_path: impl Into<PathBuf>, moved_path: impl Into<PathBuf>) -> Self {
        Self {
            original_path: original_path.into(),
            moved_path: moved_path.into(),
        }
    }
}

/// Loads, saves and deletes the move log at a fixed path.
#[derive(Debug, Clone)]
pub struct MoveLogStore {
    path: PathBuf,
}

impl MoveLogStore {
    /// Creates a store for the log at `path`. Nothing is touched on disk.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the location of the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns true if a log file is present.
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Loads the persisted records.
    ///
    /// A missing log yields an empty list. A log that exists but is not a
    /// list of records yields [`OrganizeError::CorruptLog`].
    pub fn load(&self) -> OrganizeResult<Vec<MoveRecord>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no move log present");
                return Ok(Vec::new());
            }
            Err(e) => return Err(OrganizeError::io("Failed to read move log", &self.path, e)),
        };

        let records: Vec<MoveRecord> =
            serde_json::from_str(&contents).map_err(|e| OrganizeError::CorruptLog {
                path: self.path.clone(),
                reason: e.to_string(),
            })?;

        tracing::debug!(path = %self.path.display(), records = records.len(), "loaded move log");
        Ok(records)
    }

    /// Writes `records` as the whole log, replacing any previous one.
    ///
    /// The log is written to a sibling temporary file and renamed into place,
    /// so an interrupted save leaves the previous log intact.
    pub fn save(&self, records: &[MoveRecord]) -> OrganizeResult<()> {
        let mut buffer = Vec::new();
        let mut serializer =
            serde_json::Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(b"    "));
        records.serialize(&mut serializer).map_err(|e| {
            OrganizeError::io(
                "Failed to serialize move log",
                &self.path,
                std::io::Error::new(ErrorKind::InvalidData, e),
            )
        })?;
        buffer.push(b'\n');

        let staging = self.staging_path();
        if let Err(e) = fs::write(&staging, &buffer) {
            let _ = fs::remove_file(&staging);
            return Err(OrganizeError::io("Failed to write move log", &staging, e));
        }
        if let Err(e) = fs::rename(&staging, &self.path) {
            let _ = fs::remove_file(&staging);
            return Err(OrganizeError::io("Failed to write move log", &self.path, e));
        }

        tracing::debug!(path = %self.path.display(), records = records.len(), "saved move log");
        Ok(())
    }

    /// Removes the log. Does nothing if there is no log.
    pub fn delete(&self) -> OrganizeResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::debug!(path = %self.path.display(), "deleted move log");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(OrganizeError::io("Failed to delete move log", &self.path, e)),
        }
    }

    /// Returns true if `candidate` names this log or its staging file,
    /// whether or not either exists yet.
    pub fn refers_to(&self, candidate: &Path) -> bool {
        let Some(other) = absolute_location(candidate) else {
            return false;
        };
        [self.path.clone(), self.staging_path()]
            .iter()
            .filter_map(|owned| absolute_location(owned))
            .any(|owned| owned == other)
    }

    /// Sibling file the log is written to before being renamed into place.
    pub fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| OsString::from(DEFAULT_LOG_FILE));
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl Default for MoveLogStore {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_FILE)
    }
}

/// Canonical parent directory joined with the file name.
fn absolute_location(path: &Path) -> Option<PathBuf> {
    let file_name = path.file_name()?;
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    Some(fs::canonicalize(parent).ok()?.join(file_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_records(base: &Path) -> Vec<MoveRecord> {
        vec![
            MoveRecord::new(base.join("a.jpg"), base.join("Images").join("a.jpg")),
            MoveRecord::new(base.join("b.txt"), base.join("Documents").join("b.txt")),
        ]
    }

    #[test]
    fn test_load_missing_log_is_empty() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = MoveLogStore::new(temp_dir.path().join(DEFAULT_LOG_FILE));

        assert!(!store.exists());
        assert!(store.load().expect("load failed").is_empty());
    }

    #[test]
    fn test_save_then_load_preserves_order() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = MoveLogStore::new(temp_dir.path().join(DEFAULT_LOG_FILE));
        let records = sample_records(temp_dir.path());

        store.save(&records).expect("save failed");
        assert_eq!(store.load().expect("load failed"), records);
    }

    #[test]
    fn test_save_is_stable_across_round_trip() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = MoveLogStore::new(temp_dir.path().join(DEFAULT_LOG_FILE));

        store
            .save(&sample_records(temp_dir.path()))
            .expect("save failed");
        let first = fs::read(store.path()).expect("read failed");

        let loaded = store.load().expect("load failed");
        store.save(&loaded).expect("second save failed");
        let second = fs::read(store.path()).expect("read failed");

        assert_eq!(first, second);
    }

    #[test]
    fn test_saved_log_uses_original_and_moved_keys() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = MoveLogStore::new(temp_dir.path().join(DEFAULT_LOG_FILE));
        store
            .save(&[MoveRecord::new("a.jpg", "Images/a.jpg")])
            .expect("save failed");

        let text = fs::read_to_string(store.path()).expect("read failed");
        let expected = "[\n    {\n        \"original\": \"a.jpg\",\n        \"moved\": \"Images/a.jpg\"\n    }\n]\n";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_save_overwrites_previous_log() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = MoveLogStore::new(temp_dir.path().join(DEFAULT_LOG_FILE));

        store
            .save(&sample_records(temp_dir.path()))
            .expect("save failed");
        store.save(&[]).expect("empty save failed");

        assert!(store.exists());
        assert!(store.load().expect("load failed").is_empty());
        assert!(!temp_dir.path().join("organizer.log.json.tmp").exists());
    }

    #[test]
    fn test_load_rejects_malformed_log() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = MoveLogStore::new(temp_dir.path().join(DEFAULT_LOG_FILE));

        fs::write(store.path(), "{ not json").expect("write failed");
        assert!(matches!(
            store.load(),
            Err(OrganizeError::CorruptLog { .. })
        ));

        fs::write(store.path(), r#"[{"original": "a.txt"}]"#).expect("write failed");
        assert!(matches!(
            store.load(),
            Err(OrganizeError::CorruptLog { .. })
        ));
    }

    #[test]
    fn test_delete_is_idempotent() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = MoveLogStore::new(temp_dir.path().join(DEFAULT_LOG_FILE));

        store.save(&[]).expect("save failed");
        store.delete().expect("delete failed");
        assert!(!store.exists());
        store.delete().expect("second delete failed");
    }

    #[test]
    fn test_save_into_missing_directory_fails() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = MoveLogStore::new(temp_dir.path().join("missing").join(DEFAULT_LOG_FILE));

        assert!(matches!(store.save(&[]), Err(OrganizeError::Io { .. })));
    }

    #[test]
    fn test_refers_to_matches_before_log_exists() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = MoveLogStore::new(temp_dir.path().join(DEFAULT_LOG_FILE));

        assert!(store.refers_to(&temp_dir.path().join(DEFAULT_LOG_FILE)));
        assert!(!store.refers_to(&temp_dir.path().join("other.json")));
    }

    #[test]
    fn test_refers_to_covers_staging_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = MoveLogStore::new(temp_dir.path().join(DEFAULT_LOG_FILE));

        assert_eq!(
            store.staging_path(),
            temp_dir.path().join("organizer.log.json.tmp")
        );
        assert!(store.refers_to(&store.staging_path()));
    }

    #[test]
    fn test_failed_save_keeps_previous_log() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = MoveLogStore::new(temp_dir.path().join(DEFAULT_LOG_FILE));
        let records = sample_records(temp_dir.path());
        store.save(&records).expect("save failed");

        // A directory squatting on the staging path makes the write fail.
        fs::create_dir(store.staging_path()).expect("mkdir failed");
        assert!(matches!(store.save(&[]), Err(OrganizeError::Io { .. })));

        assert_eq!(store.load().expect("load failed"), records);
    }
}
