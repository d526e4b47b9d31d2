//! The persisted sort preference.
//!
//! One boolean, stored as YAML next to the credential file. The inventory always lists
//! ascending; this preference only tells the presentation layer whether to reverse it.

use crate::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Direction the library is presented in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn from_ascending(ascending: bool) -> Self {
        if ascending {
            SortOrder::Ascending
        } else {
            SortOrder::Descending
        }
    }

    pub fn is_ascending(&self) -> bool {
        matches!(self, SortOrder::Ascending)
    }

    #[must_use]
    pub fn reversed(&self) -> Self {
        match self {
            SortOrder::Ascending => SortOrder::Descending,
            SortOrder::Descending => SortOrder::Ascending,
        }
    }

    /// Short label for settings screens.
    pub fn label(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "A-Z",
            SortOrder::Descending => "Z-A",
        }
    }
}

impl std::str::FromStr for SortOrder {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" | "a-z" => Ok(SortOrder::Ascending),
            "desc" | "descending" | "z-a" => Ok(SortOrder::Descending),
            other => Err(CoreError::InvalidInput(format!(
                "unknown sort order '{}' (expected 'asc' or 'desc')",
                other
            ))),
        }
    }
}

impl std::fmt::Display for SortOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

fn default_sort_ascending() -> bool {
    true
}

/// Everything persisted in `preferences.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default = "default_sort_ascending")]
    pub sort_ascending: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            sort_ascending: default_sort_ascending(),
        }
    }
}

/// Reads and writes [`Preferences`] in a YAML file.
#[derive(Debug, Clone)]
pub struct PreferencesStore {
    path: PathBuf,
}

impl PreferencesStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the preferences; a missing file yields the defaults.
    pub fn load(&self) -> CoreResult<Preferences> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Preferences::default()),
            Err(source) => {
                return Err(CoreError::StateRead {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        if contents.trim().is_empty() {
            return Ok(Preferences::default());
        }

        serde_yaml::from_str(&contents).map_err(|source| CoreError::YamlDeserialization {
            path: self.path.clone(),
            source,
        })
    }

    pub fn save(&self, preferences: &Preferences) -> CoreResult<()> {
        let yaml = serde_yaml::to_string(preferences).map_err(CoreError::YamlSerialization)?;
        fs::write(&self.path, yaml).map_err(|source| CoreError::StateWrite {
            path: self.path.clone(),
            source,
        })
    }

    /// Returns `true` for ascending.
    ///
    /// An unreadable preferences file is logged and treated as the default.
    pub fn get(&self) -> bool {
        match self.load() {
            Ok(preferences) => preferences.sort_ascending,
            Err(e) => {
                tracing::warn!("using default sort order: {}", e);
                default_sort_ascending()
            }
        }
    }

    pub fn set(&self, ascending: bool) -> CoreResult<()> {
        let mut preferences = self.load().unwrap_or_default();
        preferences.sort_ascending = ascending;
        self.save(&preferences)?;
        tracing::info!("sort order set to {}", SortOrder::from_ascending(ascending));
        Ok(())
    }

    /// Flips the preference and returns the new value.
    pub fn toggle(&self) -> CoreResult<bool> {
        let ascending = !self.get();
        self.set(ascending)?;
        Ok(ascending)
    }

    pub fn sort_order(&self) -> SortOrder {
        SortOrder::from_ascending(self.get())
    }

    pub fn set_sort_order(&self, order: SortOrder) -> CoreResult<()> {
        self.set(order.is_ascending())
    }
}
