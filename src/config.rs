//! Project configuration.
//!
//! A project is a directory with a fixed layout. Every path below is relative
//! to the project root and can be renamed through an optional
//! `tiny-brute.toml` placed in that root:
//!
//! ```text
//! my-site/
//! ├── tiny-brute.toml          # Optional overrides (this module)
//! ├── input/                   # Source tree, mirrored into the output
//! │   ├── index.page.toml      # Page source → index.html
//! │   ├── .htaccess            # Hidden files are copied too
//! │   └── css/site.css         # Assets are copied byte-for-byte
//! ├── templates/page.html      # Templates are named by page sources
//! ├── work-in-progress/        # Output of `generate` / `clean-and-generate`
//! └── published/
//!     ├── 2026-10-18--09-30--12.123456789/
//!     └── current -> 2026-10-18--09-30--12.123456789
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! input_dir = "input"
//! work_in_progress_dir = "work-in-progress"
//! published_dir = "published"
//! page_suffix = ".page.toml"
//! output_suffix = ".html"
//!
//! # Ordered plugin manifest. Transforms run in this order for every page,
//! # finalize passes run in this order once all pages are written.
//! plugins = ["main-content", "home-page-links"]
//!
//! [processing]
//! max_processes = 1         # >1 processes pages in parallel (capped at CPU cores)
//! ```
//!
//! The file is sparse: it is merged key-by-key over the stock defaults, so
//! it only needs the values being changed. Unknown keys are rejected to catch
//! typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the optional project config file in the project root.
pub const CONFIG_FILENAME: &str = "tiny-brute.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("Directory not found: {0}")]
    MissingDirectory(PathBuf),
    #[error("Unknown plugin '{0}' in plugin manifest")]
    UnknownPlugin(String),
    #[error("Unknown command '{0}'. Expected one of generate, clean-and-generate, publish (or nothing)")]
    UnknownCommand(String),
    #[error("Ambiguous command '{0}'. Matches: {1}")]
    AmbiguousCommand(String, String),
}

/// Settings loaded from `tiny-brute.toml`.
///
/// All fields have defaults matching the standard project layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectConfig {
    /// Source tree to process.
    pub input_dir: String,
    /// Output of `generate` and `clean-and-generate`.
    pub work_in_progress_dir: String,
    /// Parent of the timestamped `publish` outputs and the `current` link.
    pub published_dir: String,
    /// Files whose relative path ends with this suffix are page sources.
    pub page_suffix: String,
    /// Replaces `page_suffix` in the output path of a page.
    pub output_suffix: String,
    /// Ordered plugin manifest, resolved against the built-in catalogue.
    pub plugins: Vec<String>,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            input_dir: "input".to_string(),
            work_in_progress_dir: "work-in-progress".to_string(),
            published_dir: "published".to_string(),
            page_suffix: ".page.toml".to_string(),
            output_suffix: ".html".to_string(),
            plugins: vec!["main-content".to_string(), "home-page-links".to_string()],
            processing: ProcessingConfig::default(),
        }
    }
}

impl ProjectConfig {
    /// Validate values that serde cannot check on its own.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_suffix.is_empty() || self.output_suffix.is_empty() {
            return Err(ConfigError::Validation(
                "page_suffix and output_suffix must not be empty".into(),
            ));
        }
        if self.page_suffix == self.output_suffix {
            return Err(ConfigError::Validation(
                "page_suffix and output_suffix must differ".into(),
            ));
        }
        for (key, value) in [
            ("input_dir", &self.input_dir),
            ("work_in_progress_dir", &self.work_in_progress_dir),
            ("published_dir", &self.published_dir),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Validation(format!("{key} must not be empty")));
            }
        }
        if self.work_in_progress_dir == self.published_dir {
            return Err(ConfigError::Validation(
                "work_in_progress_dir and published_dir must differ".into(),
            ));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of pages processed at once.
    /// When absent, pages are processed one at a time in traversal order.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective worker count from config.
///
/// - `None` → 1 (sequential)
/// - `Some(n)` → `min(n, cores)`
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.clamp(1, cores)).unwrap_or(1)
}

/// A project root together with its resolved configuration.
#[derive(Debug, Clone)]
pub struct Project {
    pub root: PathBuf,
    pub config: ProjectConfig,
}

impl Project {
    pub fn input_root(&self) -> PathBuf {
        self.root.join(&self.config.input_dir)
    }

    pub fn work_in_progress_root(&self) -> PathBuf {
        self.root.join(&self.config.work_in_progress_dir)
    }

    pub fn published_root(&self) -> PathBuf {
        self.root.join(&self.config.published_dir)
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(ProjectConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `tiny-brute.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join(CONFIG_FILENAME);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge user values over stock defaults, reject unknown keys, validate.
pub fn load_config(dir: &Path) -> Result<ProjectConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match load_raw_config(dir)? {
        Some(overlay) => merge_toml(base, overlay),
        None => base,
    };
    let config: ProjectConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Resolve a project root and load its configuration.
///
/// `dir` is the value of `-d`; relative paths are taken from the current
/// directory. Both the root and its input directory must exist.
pub fn load_project(dir: Option<&Path>) -> Result<Project, ConfigError> {
    let cwd = std::env::current_dir()?;
    let root = match dir {
        Some(d) if d.is_absolute() => d.to_path_buf(),
        Some(d) => cwd.join(d),
        None => cwd,
    };
    if !root.is_dir() {
        return Err(ConfigError::MissingDirectory(root));
    }
    let config = load_config(&root)?;
    let project = Project { root, config };
    let input = project.input_root();
    if !input.is_dir() {
        return Err(ConfigError::MissingDirectory(input));
    }
    Ok(project)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_matches_standard_layout() {
        let config = ProjectConfig::default();
        assert_eq!(config.input_dir, "input");
        assert_eq!(config.work_in_progress_dir, "work-in-progress");
        assert_eq!(config.published_dir, "published");
        assert_eq!(config.page_suffix, ".page.toml");
        assert_eq!(config.output_suffix, ".html");
        assert_eq!(config.plugins, vec!["main-content", "home-page-links"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parse_partial_config_keeps_defaults() {
        let config: ProjectConfig = toml::from_str(r#"output_suffix = ".htm""#).unwrap();
        assert_eq!(config.output_suffix, ".htm");
        assert_eq!(config.page_suffix, ".page.toml");
    }

    #[test]
    fn unknown_keys_rejected() {
        let result: Result<ProjectConfig, _> = toml::from_str("plugin_dir = \"plugins\"");
        assert!(result.is_err());
    }

    #[test]
    fn validate_rejects_empty_suffix() {
        let config = ProjectConfig {
            page_suffix: String::new(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_rejects_identical_suffixes() {
        let config = ProjectConfig {
            page_suffix: ".html".into(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_shared_output_dirs() {
        let config = ProjectConfig {
            published_dir: "work-in-progress".into(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_processes() {
        let config = ProjectConfig {
            processing: ProcessingConfig {
                max_processes: Some(0),
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn effective_threads_defaults_to_sequential() {
        assert_eq!(effective_threads(&ProcessingConfig::default()), 1);
    }

    #[test]
    fn effective_threads_never_exceeds_cores() {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        let config = ProcessingConfig {
            max_processes: Some(10_000),
        };
        assert_eq!(effective_threads(&config), cores);
    }

    // =========================================================================
    // merge_toml tests
    // =========================================================================

    #[test]
    fn merge_replaces_arrays_wholesale() {
        let base = stock_defaults_value().unwrap();
        let overlay: toml::Value = toml::from_str(r#"plugins = ["main-content"]"#).unwrap();
        let merged: ProjectConfig = merge_toml(base, overlay).try_into().unwrap();
        assert_eq!(merged.plugins, vec!["main-content"]);
    }

    #[test]
    fn merge_nested_table_preserves_siblings() {
        let base: toml::Value = toml::from_str("[a]\nx = 1\ny = 2").unwrap();
        let overlay: toml::Value = toml::from_str("[a]\ny = 3").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["a"]["x"].as_integer(), Some(1));
        assert_eq!(merged["a"]["y"].as_integer(), Some(3));
    }

    // =========================================================================
    // load_config / load_project tests
    // =========================================================================

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config, ProjectConfig::default());
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(CONFIG_FILENAME),
            "input_dir = \"content\"\n[processing]\nmax_processes = 4\n",
        )
        .unwrap();

        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.input_dir, "content");
        assert_eq!(config.processing.max_processes, Some(4));
        assert_eq!(config.published_dir, "published");
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILENAME), "this is not valid toml [[[").unwrap();
        assert!(matches!(load_config(tmp.path()), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn load_project_requires_input_dir() {
        let tmp = TempDir::new().unwrap();
        let result = load_project(Some(tmp.path()));
        assert!(matches!(result, Err(ConfigError::MissingDirectory(p)) if p.ends_with("input")));
    }

    #[test]
    fn load_project_requires_existing_root() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("nope");
        assert!(matches!(
            load_project(Some(&missing)),
            Err(ConfigError::MissingDirectory(_))
        ));
    }

    #[test]
    fn load_project_resolves_layout() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("input")).unwrap();
        let project = load_project(Some(tmp.path())).unwrap();
        assert_eq!(project.input_root(), tmp.path().join("input"));
        assert_eq!(
            project.work_in_progress_root(),
            tmp.path().join("work-in-progress")
        );
        assert_eq!(project.published_root(), tmp.path().join("published"));
    }
}
