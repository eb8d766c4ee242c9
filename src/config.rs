//! Organizer configuration.
//!
//! Settings are read from an optional TOML file. The category table is fixed;
//! configuration only decides where the move log lives, what happens when a
//! destination is already taken, and which entries are left alone.
//!
//! # Configuration File Format
//!
//! ```toml
//! [log]
//! file = "organizer.log.json"
//!
//! [organize]
//! on_conflict = "overwrite"   # or "skip", "backup"
//!
//! [skip]
//! hidden = false
//! filenames = [".DS_Store", "Thumbs.db"]
//! patterns = ["*.part"]
//! regex = []
//! ```

use crate::move_log::DEFAULT_LOG_FILE;
use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the per-directory configuration file.
pub const LOCAL_CONFIG_FILE: &str = ".sortdirrc.toml";

/// Errors that can occur while loading configuration.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),

    #[error("Invalid glob pattern '{pattern}': {reason}")]
    InvalidGlobPattern { pattern: String, reason: String },

    #[error("Invalid regex pattern '{pattern}': {reason}")]
    InvalidRegexPattern { pattern: String, reason: String },

    #[error("IO error reading configuration: {0}")]
    IoError(String),
}

/// What to do when a file already sits at a move destination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictPolicy {
    /// Replace the existing file.
    #[default]
    Overwrite,
    /// Leave the source where it is and report a conflict.
    Skip,
    /// Rename the existing file to `<name>.bak.<timestamp>` first.
    Backup,
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OrganizerConfig {
    pub log: LogSettings,
    pub organize: OrganizeSettings,
    pub skip: SkipRules,
}

/// Where the move log is kept.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Relative paths resolve against the process working directory.
    pub file: PathBuf,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            file: PathBuf::from(DEFAULT_LOG_FILE),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OrganizeSettings {
    pub on_conflict: ConflictPolicy,
}

/// Entries that are never moved. Matched against the file name only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SkipRules {
    /// Skip names starting with ".".
    pub hidden: bool,
    /// Exact names.
    pub filenames: Vec<String>,
    /// Glob patterns such as `*.part`.
    pub patterns: Vec<String>,
    /// Regular expressions.
    pub regex: Vec<String>,
}

impl OrganizerConfig {
    /// Load configuration, falling back to defaults.
    ///
    /// Lookup order:
    /// 1. `config_path`, if given (must exist)
    /// 2. `.sortdirrc.toml` in the current directory
    /// 3. `~/.config/sortdir/config.toml`
    /// 4. Built-in defaults
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("sortdir")
                .join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        let config: Self =
            toml::from_str(&content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }
}

/// Skip rules with patterns compiled once.
#[derive(Debug, Clone, Default)]
pub struct SkipFilter {
    hidden: bool,
    filenames: HashSet<String>,
    patterns: Vec<Pattern>,
    regexes: Vec<Regex>,
}

impl SkipFilter {
    /// Compile skip rules. Fails on the first invalid glob or regex.
    pub fn compile(rules: &SkipRules) -> Result<Self, ConfigError> {
        let patterns = rules
            .patterns
            .iter()
            .map(|pattern| {
                Pattern::new(pattern).map_err(|e| ConfigError::InvalidGlobPattern {
                    pattern: pattern.clone(),
                    reason: e.msg.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let regexes = rules
            .regex
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| ConfigError::InvalidRegexPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            hidden: rules.hidden,
            filenames: rules.filenames.iter().cloned().collect(),
            patterns,
            regexes,
        })
    }

    /// Returns true if the entry called `file_name` must be left in place.
    pub fn should_skip(&self, file_name: &str) -> bool {
        (self.hidden && file_name.starts_with('.'))
            || self.filenames.contains(file_name)
            || self.patterns.iter().any(|p| p.matches(file_name))
            || self.regexes.iter().any(|r| r.is_match(file_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_skips_nothing() {
        let config = OrganizerConfig::default();
        let filter = SkipFilter::compile(&config.skip).unwrap();

        assert_eq!(config.log.file, PathBuf::from(DEFAULT_LOG_FILE));
        assert_eq!(config.organize.on_conflict, ConflictPolicy::Overwrite);
        assert!(!filter.should_skip(".gitignore"));
        assert!(!filter.should_skip("photo.jpg"));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: OrganizerConfig = toml::from_str("[skip]\nhidden = true\n").unwrap();

        assert!(config.skip.hidden);
        assert_eq!(config.log.file, PathBuf::from(DEFAULT_LOG_FILE));
        assert_eq!(config.organize.on_conflict, ConflictPolicy::Overwrite);
    }

    #[test]
    fn test_full_toml() {
        let text = r#"
            [log]
            file = "/tmp/moves.json"

            [organize]
            on_conflict = "backup"

            [skip]
            filenames = ["Thumbs.db"]
            patterns = ["*.part"]
            regex = ['^~\$']
        "#;
        let config: OrganizerConfig = toml::from_str(text).unwrap();

        assert_eq!(config.log.file, PathBuf::from("/tmp/moves.json"));
        assert_eq!(config.organize.on_conflict, ConflictPolicy::Backup);
        assert_eq!(config.skip.filenames, vec!["Thumbs.db".to_string()]);
    }

    #[test]
    fn test_unknown_conflict_policy_is_rejected() {
        let result: Result<OrganizerConfig, _> =
            toml::from_str("[organize]\non_conflict = \"rename\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_skip_hidden() {
        let rules = SkipRules {
            hidden: true,
            ..Default::default()
        };
        let filter = SkipFilter::compile(&rules).unwrap();

        assert!(filter.should_skip(".DS_Store"));
        assert!(!filter.should_skip("visible.txt"));
    }

    #[test]
    fn test_skip_filenames_patterns_and_regex() {
        let rules = SkipRules {
            hidden: false,
            filenames: vec!["Thumbs.db".to_string()],
            patterns: vec!["*.part".to_string(), "[0-9]*.tmp".to_string()],
            regex: vec![r"^~\$".to_string()],
        };
        let filter = SkipFilter::compile(&rules).unwrap();

        assert!(filter.should_skip("Thumbs.db"));
        assert!(filter.should_skip("movie.mkv.part"));
        assert!(filter.should_skip("1cache.tmp"));
        assert!(filter.should_skip("~$report.docx"));
        assert!(!filter.should_skip("cache.tmp"));
        assert!(!filter.should_skip("report.docx"));
    }

    #[test]
    fn test_invalid_patterns_return_error() {
        let bad_glob = SkipRules {
            patterns: vec!["[invalid".to_string()],
            ..Default::default()
        };
        assert!(matches!(
            SkipFilter::compile(&bad_glob),
            Err(ConfigError::InvalidGlobPattern { .. })
        ));

        let bad_regex = SkipRules {
            regex: vec!["[invalid(".to_string()],
            ..Default::default()
        };
        assert!(matches!(
            SkipFilter::compile(&bad_regex),
            Err(ConfigError::InvalidRegexPattern { .. })
        ));
    }

    #[test]
    fn test_load_explicit_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let result = OrganizerConfig::load(Some(&temp_dir.path().join("nope.toml")));
        assert!(matches!(result, Err(ConfigError::ConfigNotFound(_))));
    }

    #[test]
    fn test_load_explicit_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[organize]\non_conflict = \"skip\"\n").unwrap();

        let config = OrganizerConfig::load(Some(&path)).unwrap();
        assert_eq!(config.organize.on_conflict, ConflictPolicy::Skip);
    }

    #[test]
    fn test_load_invalid_toml() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[organize\n").unwrap();

        assert!(matches!(
            OrganizerConfig::load(Some(&path)),
            Err(ConfigError::ConfigInvalid(_))
        ));
    }
}
