//! Tracked file configuration
//!
//! Reads the optional `Evolve.toml` at the target project root to decide
//! which files are tracked across generations and which one is shown by
//! default. The tool must stay usable without it, so every failure turns into
//! a warning plus the built-in default.
//!
//! ```toml
//! [evolution]
//! files = ["src/lib.rs", "README.md"]
//! primary_file = "src/lib.rs"   # optional, wins over files[0]
//! ```

mod error;

pub use error::ConfigError;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Config file name, looked up at the project root
pub const CONFIG_FILENAME: &str = "Evolve.toml";

/// Tracked file used when nothing else is configured
pub const DEFAULT_PRIMARY_FILE: &str = "src/lib.rs";

#[derive(Debug, Default, Deserialize)]
struct EvolveConfig {
    #[serde(default)]
    evolution: EvolutionSection,
}

/// The `[evolution]` section. Keys used by other Evolve tools
/// (`instruction`, `test_command`, ...) are ignored.
#[derive(Debug, Default, Deserialize)]
struct EvolutionSection {
    #[serde(default)]
    files: Vec<String>,
    #[serde(default)]
    primary_file: Option<String>,
}

/// Where a [`TrackedFileSet`] came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    /// Built-in default
    Default,
    /// Parsed from Evolve.toml
    File,
}

/// One tracked path
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackedFile {
    pub path: String,
    pub is_primary: bool,
}

/// Resolved configuration: the ordered tracked files and the primary one
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackedFileSet {
    /// Declared files, in declaration order, without blanks or duplicates
    pub files: Vec<String>,
    /// Explicit primary designation, if any
    pub primary: Option<String>,
    pub source: ConfigSource,
    /// Why the defaults were used, for display
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl Default for TrackedFileSet {
    fn default() -> Self {
        Self {
            files: Vec::new(),
            primary: None,
            source: ConfigSource::Default,
            warning: None,
        }
    }
}

impl TrackedFileSet {
    /// The primary file path
    ///
    /// Explicit designation first, then the first declared file, then
    /// [`DEFAULT_PRIMARY_FILE`].
    pub fn primary_path(&self) -> &str {
        self.primary
            .as_deref()
            .or_else(|| self.files.first().map(String::as_str))
            .unwrap_or(DEFAULT_PRIMARY_FILE)
    }

    /// Every tracked path with its primary flag
    ///
    /// Follows declaration order. An explicitly designated primary that is not
    /// in `files` is put first.
    pub fn tracked(&self) -> Vec<TrackedFile> {
        let primary = self.primary_path();
        let mut tracked: Vec<TrackedFile> = Vec::with_capacity(self.files.len() + 1);

        if !self.files.iter().any(|f| f == primary) {
            tracked.push(TrackedFile {
                path: primary.to_string(),
                is_primary: true,
            });
        }
        tracked.extend(self.files.iter().map(|f| TrackedFile {
            path: f.clone(),
            is_primary: f == primary,
        }));
        tracked
    }
}

/// Load the tracked file set for `project_root`
///
/// Never fails: a missing, unreadable, malformed or empty config yields the
/// default set with `warning` filled in, and the condition is logged at warn
/// level.
pub fn load(project_root: &Path) -> TrackedFileSet {
    match read_config(project_root) {
        Ok(set) => {
            debug!(
                root = %project_root.display(),
                primary = set.primary_path(),
                files = set.files.len(),
                "tracked files loaded from config"
            );
            set
        }
        Err(err) => {
            warn!(
                root = %project_root.display(),
                error = %err,
                default = DEFAULT_PRIMARY_FILE,
                "using default tracked file"
            );
            TrackedFileSet {
                warning: Some(err.to_string()),
                ..TrackedFileSet::default()
            }
        }
    }
}

/// Read and parse `Evolve.toml` under `project_root`
pub fn read_config(project_root: &Path) -> Result<TrackedFileSet, ConfigError> {
    let path = project_root.join(CONFIG_FILENAME);
    if !path.is_file() {
        return Err(ConfigError::Missing(path));
    }

    let content = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
        path: path.clone(),
        source,
    })?;

    parse_config(&content)
}

/// Parse config text into a tracked file set
pub fn parse_config(content: &str) -> Result<TrackedFileSet, ConfigError> {
    let config: EvolveConfig = toml::from_str(content)?;
    let section = config.evolution;

    let mut files: Vec<String> = Vec::with_capacity(section.files.len());
    for file in section.files.iter().map(|f| normalize_path(f)) {
        if !file.is_empty() && !files.contains(&file) {
            files.push(file);
        }
    }

    let primary = section
        .primary_file
        .as_deref()
        .map(normalize_path)
        .filter(|p| !p.is_empty());

    if files.is_empty() && primary.is_none() {
        return Err(ConfigError::NoTrackedFiles);
    }

    Ok(TrackedFileSet {
        files,
        primary,
        source: ConfigSource::File,
        warning: None,
    })
}

/// Repository-relative, `/` separated, no leading `./` or `/`
fn normalize_path(raw: &str) -> String {
    let unified = raw.trim().replace('\\', "/");
    let mut path = unified.as_str();
    loop {
        if let Some(rest) = path.strip_prefix("./") {
            path = rest;
        } else if let Some(rest) = path.strip_prefix('/') {
            path = rest;
        } else {
            break;
        }
    }
    path.to_string()
}
