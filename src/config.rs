//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/kintree/kintree.toml`
//! 3. Local config: `<project_dir>/.kintree.toml`
//! 4. Environment variables: `KINTREE_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;

/// Raw settings for intermediate parsing (`None` means "not specified").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub data_file: Option<PathBuf>,
    pub collection_keys: Option<Vec<String>>,
    pub tag_prefix: Option<String>,
    pub rescue_parent_cycles: Option<bool>,
    pub show_ids: Option<bool>,
    pub spouse_separator: Option<String>,
}

/// Unified configuration for kintree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Family data document (default: details.json, relative to the project dir)
    pub data_file: PathBuf,
    /// Object keys that may hold the person list, tried in order
    pub collection_keys: Vec<String>,
    /// Prefix of generated marriage tags (f1, f2, ...)
    pub tag_prefix: String,
    /// Show members of parent cycles as roots instead of dropping them
    pub rescue_parent_cycles: bool,
    /// Prefix tree labels with person ids
    pub show_ids: bool,
    /// Placed between a person and their spouse in tree labels
    pub spouse_separator: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from("details.json"),
            collection_keys: vec!["kanagala".into(), "members".into()],
            tag_prefix: "f".into(),
            rescue_parent_cycles: true,
            show_ids: false,
            spouse_separator: " & ".into(),
        }
    }
}

/// Merge list overlays with union semantics and negation support.
///
/// Base order is kept, new items are appended, `!item` removes an item.
///
/// # Examples
/// ```ignore
/// merge_array(&["a", "b"], &["c"])       // → ["a", "b", "c"]
/// merge_array(&["a", "b"], &["!a", "c"]) // → ["b", "c"]
/// ```
pub fn merge_array(base: &[String], overlay: &[String]) -> Vec<String> {
    let mut result: Vec<String> = base.to_vec();

    for pattern in overlay {
        if let Some(negated) = pattern.strip_prefix('!') {
            result.retain(|item| item != negated);
        } else if !result.contains(pattern) {
            result.push(pattern.clone());
        }
    }
    result
}

/// Expand `~`, `$VAR` and `${VAR}`; unknown variables leave the input unchanged.
pub fn expand_env_vars(path: &str) -> String {
    shellexpand::full(path)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| path.to_string())
}

/// Get the XDG config directory for kintree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "kintree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("kintree.toml"))
}

/// Get the path to the local config file in a project directory.
pub fn local_config_path(project_dir: &Path) -> PathBuf {
    project_dir.join(".kintree.toml")
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Absolute location of the family data document.
    ///
    /// Relative `data_file` values are resolved against `project_dir`.
    pub fn data_path(&self, project_dir: Option<&Path>) -> PathBuf {
        match project_dir {
            Some(dir) if self.data_file.is_relative() => dir.join(&self.data_file),
            _ => self.data_file.clone(),
        }
    }

    fn expand_paths(&mut self) {
        let expanded = expand_env_vars(self.data_file.to_string_lossy().as_ref());
        self.data_file = PathBuf::from(expanded);
    }

    /// Scalars: overlay wins if set. Lists: union with negation.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            collection_keys: overlay
                .collection_keys
                .as_ref()
                .map(|o| merge_array(&self.collection_keys, o))
                .unwrap_or_else(|| self.collection_keys.clone()),
            ..self.apply_scalars(overlay)
        }
    }

    /// Scalars: global wins if set. Lists: REPLACE (defaults are only examples).
    fn apply_global(&self, global: &RawSettings) -> Self {
        Self {
            collection_keys: global
                .collection_keys
                .clone()
                .unwrap_or_else(|| self.collection_keys.clone()),
            ..self.apply_scalars(global)
        }
    }

    fn apply_scalars(&self, raw: &RawSettings) -> Self {
        Self {
            data_file: raw
                .data_file
                .clone()
                .unwrap_or_else(|| self.data_file.clone()),
            collection_keys: self.collection_keys.clone(),
            tag_prefix: raw
                .tag_prefix
                .clone()
                .unwrap_or_else(|| self.tag_prefix.clone()),
            rescue_parent_cycles: raw.rescue_parent_cycles.unwrap_or(self.rescue_parent_cycles),
            show_ids: raw.show_ids.unwrap_or(self.show_ids),
            spouse_separator: raw
                .spouse_separator
                .clone()
                .unwrap_or_else(|| self.spouse_separator.clone()),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `project_dir` - Optional project directory holding `.kintree.toml`
    ///
    /// # Precedence (lowest to highest)
    /// 1. Compiled defaults
    /// 2. Global config (lists REPLACE defaults)
    /// 3. Local config (lists UNION with global, `!item` removes)
    /// 4. Environment variables `KINTREE_*` (REPLACE)
    pub fn load(project_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                let raw = load_raw_settings(&global_path)?;
                current = current.apply_global(&raw);
            }
        }

        if let Some(dir) = project_dir {
            let local_path = local_config_path(dir);
            if local_path.exists() {
                let raw = load_raw_settings(&local_path)?;
                current = current.merge_with(&raw);
            }
        }

        current = Self::apply_env_overrides(current)?;
        current.expand_paths();

        Ok(current)
    }

    /// Apply KINTREE_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("KINTREE")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("collection_keys")
                    .try_parsing(true),
            )
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("data_file") {
            settings.data_file = PathBuf::from(val);
        }
        if let Ok(val) = config.get::<Vec<String>>("collection_keys") {
            settings.collection_keys = val;
        }
        if let Ok(val) = config.get_string("tag_prefix") {
            settings.tag_prefix = val;
        }
        if let Ok(val) = config.get_bool("rescue_parent_cycles") {
            settings.rescue_parent_cycles = val;
        }
        if let Ok(val) = config.get_bool("show_ids") {
            settings.show_ids = val;
        }
        if let Ok(val) = config.get_string("spouse_separator") {
            settings.spouse_separator = val;
        }

        Ok(settings)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_no_project_dir_when_loading_then_uses_defaults() {
        let settings = Settings::load(None).expect("load defaults");
        assert!(settings.collection_keys.contains(&"kanagala".to_string()));
        assert!(!settings.tag_prefix.is_empty());
    }

    #[test]
    fn given_negated_item_when_merge_array_then_removes_and_keeps_order() {
        let base = vec!["kanagala".to_string(), "members".to_string()];
        let overlay = vec!["!kanagala".to_string(), "people".to_string()];

        let merged = merge_array(&base, &overlay);

        assert_eq!(merged, vec!["members".to_string(), "people".to_string()]);
    }

    #[test]
    fn given_duplicate_item_when_merge_array_then_not_repeated() {
        let base = vec!["members".to_string()];
        let merged = merge_array(&base, &["members".to_string()]);
        assert_eq!(merged, vec!["members".to_string()]);
    }

    #[test]
    fn given_tilde_in_data_file_when_expand_paths_then_expands_to_home() {
        let mut settings = Settings {
            data_file: PathBuf::from("~/family/details.json"),
            ..Settings::default()
        };

        settings.expand_paths();

        let home = std::env::var("HOME").expect("HOME should be set");
        let data = settings.data_file.to_string_lossy();
        assert!(data.starts_with(&home), "data_file should start with home: {}", data);
        assert!(!data.contains('~'));
    }

    #[test]
    fn given_relative_data_file_when_data_path_then_resolves_against_project_dir() {
        let settings = Settings::default();
        let path = settings.data_path(Some(Path::new("/srv/family")));
        assert_eq!(path, PathBuf::from("/srv/family/details.json"));
    }

    #[test]
    fn given_settings_when_to_toml_then_contains_fields() {
        let toml = Settings::default().to_toml().expect("serialize");
        assert!(toml.contains("data_file"));
        assert!(toml.contains("tag_prefix"));
    }
}
