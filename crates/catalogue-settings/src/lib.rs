//! Settings for catalogue components.
//!
//! Settings are a flat map of dotted keys (`marc4j.jar_dir`, `solrj.jar_dir`)
//! loaded from:
//! 1. Global: ~/.config/catalogue/settings.toml
//! 2. Per-project: .catalogue/settings.toml (overrides global)
//!
//! Nested tables and quoted dotted keys are equivalent:
//! ```toml
//! [marc4j]
//! jar_dir = "/opt/marc4j/lib"
//!
//! "solrj.jar_dir" = "/opt/solrj/lib"
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use toml::Value;

/// Error loading a settings file.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Flat settings map keyed by dotted names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    entries: BTreeMap<String, Value>,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse settings from TOML text, flattening tables into dotted keys.
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        let table: toml::Table = toml::from_str(content)?;
        let mut entries = BTreeMap::new();
        flatten_into(None, table, &mut entries);
        Ok(Self { entries })
    }

    /// Load settings from a single file.
    pub fn load_file(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load settings for a project.
    ///
    /// Loads global settings, then merges per-project settings from
    /// `<root>/.catalogue/settings.toml` on top. Missing files are skipped;
    /// unreadable or malformed files are logged and skipped.
    pub fn load(root: &Path) -> Self {
        Self::load_layered(Self::global_path().as_deref(), root)
    }

    fn load_layered(global: Option<&Path>, root: &Path) -> Self {
        let project = root.join(".catalogue").join("settings.toml");
        global
            .into_iter()
            .chain(std::iter::once(project.as_path()))
            .filter_map(Self::load_optional)
            .fold(Self::new(), Self::merge)
    }

    fn load_optional(path: &Path) -> Option<Self> {
        match Self::load_file(path) {
            Ok(settings) => Some(settings),
            Err(SettingsError::Io { source, .. })
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                None
            }
            Err(e) => {
                log::warn!("ignoring settings file: {e}");
                None
            }
        }
    }

    /// Get the global settings path.
    fn global_path() -> Option<PathBuf> {
        let config_home = std::env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .ok()
            .or_else(|| dirs::home_dir().map(|h| h.join(".config")))?;
        Some(config_home.join("catalogue").join("settings.toml"))
    }

    /// Merge another settings map into this one. Keys in `other` win.
    pub fn merge(mut self, other: Self) -> Self {
        self.entries.extend(other.entries);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Get a string-valued setting.
    ///
    /// Returns None if the key is absent or holds a non-string value.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.entries.get(key)? {
            Value::String(s) => Some(s.as_str()),
            other => {
                log::warn!(
                    "setting {key} is a {}, expected a string",
                    other.type_str()
                );
                None
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Settings {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

fn flatten_into(prefix: Option<&str>, table: toml::Table, out: &mut BTreeMap<String, Value>) {
    for (key, value) in table {
        let key = match prefix {
            Some(prefix) => format!("{prefix}.{key}"),
            None => key,
        };
        match value {
            Value::Table(inner) => flatten_into(Some(&key), inner, out),
            other => {
                out.insert(key, other);
            }
        }
    }
}
