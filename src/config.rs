use crate::error::{ErrorKind, LoadError, TranslateError};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default cap on script size accepted by the translator (1 MiB)
pub const DEFAULT_MAX_SCRIPT_BYTES: usize = 1 << 20;

/// Default cap on requested component name length
pub const DEFAULT_MAX_TAG_NAME_LENGTH: usize = 250;

lazy_static! {
    static ref IDENTIFIER: Regex = Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").unwrap();
}

pub(crate) fn is_identifier(name: &str) -> bool {
    IDENTIFIER.is_match(name)
}

/// One shorthand lifecycle marker and the custom element callback it stands for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleMarker {
    pub marker: String,
    pub callback: String,
}

impl LifecycleMarker {
    fn new(marker: &str, callback: &str) -> Self {
        Self {
            marker: marker.to_string(),
            callback: callback.to_string(),
        }
    }
}

/// Sugar vocabulary recognised by the translator.
///
/// The default is the dialect component authors write: `::connected(`,
/// `::disconnected(`, `::moved(`, `addChangeListener(` and `::initialized(`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TranslationTable {
    pub lifecycle_prefix: String,
    pub lifecycle: Vec<LifecycleMarker>,
    pub listener_token: String,
    pub old_value_name: String,
    pub new_value_name: String,
    pub load_handler_marker: String,
}

impl Default for TranslationTable {
    fn default() -> Self {
        Self {
            lifecycle_prefix: "::".to_string(),
            lifecycle: vec![
                LifecycleMarker::new("connected", "connectedCallback"),
                LifecycleMarker::new("disconnected", "disconnectedCallback"),
                LifecycleMarker::new("moved", "adoptedCallback"),
            ],
            listener_token: "addChangeListener".to_string(),
            old_value_name: "oldValue".to_string(),
            new_value_name: "newValue".to_string(),
            load_handler_marker: "::initialized".to_string(),
        }
    }
}

impl TranslationTable {
    /// Full marker text for a lifecycle entry, prefix included
    pub fn lifecycle_marker(&self, entry: &LifecycleMarker) -> String {
        format!("{}{}", self.lifecycle_prefix, entry.marker)
    }

    /// Reject tables the passes cannot work with
    pub fn validate(&self) -> Result<(), TranslateError> {
        let invalid = |message: String| -> Result<(), TranslateError> {
            Err(TranslateError::new(ErrorKind::InvalidTable, message))
        };

        if self.listener_token.trim().is_empty() {
            return invalid("Listener token must not be empty".to_string());
        }
        if self.load_handler_marker.trim().is_empty() {
            return invalid("Load handler marker must not be empty".to_string());
        }
        for entry in &self.lifecycle {
            if entry.marker.trim().is_empty() {
                return invalid(format!("Lifecycle marker for `{}` must not be empty", entry.callback));
            }
            if !is_identifier(&entry.callback) {
                return invalid(format!("`{}` is not a valid callback name", entry.callback));
            }
        }
        for name in [&self.old_value_name, &self.new_value_name] {
            if !is_identifier(name) {
                return invalid(format!("`{}` is not a valid parameter name", name));
            }
        }
        if self.old_value_name == self.new_value_name {
            return invalid("Old and new value names must differ".to_string());
        }
        Ok(())
    }
}

/// Component loader settings, read from the `components` section of a JSON config file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoaderConfig {
    pub components_dir_path: PathBuf,
    #[serde(default = "default_max_tag_name_length")]
    pub max_tag_name_length: usize,
    #[serde(default = "default_max_script_bytes")]
    pub max_script_bytes: usize,
    #[serde(default)]
    pub translation: TranslationTable,
}

fn default_max_tag_name_length() -> usize {
    DEFAULT_MAX_TAG_NAME_LENGTH
}

fn default_max_script_bytes() -> usize {
    DEFAULT_MAX_SCRIPT_BYTES
}

#[derive(Deserialize)]
struct ConfigFile {
    components: LoaderConfig,
}

impl LoaderConfig {
    pub fn new(components_dir_path: impl Into<PathBuf>) -> Self {
        Self {
            components_dir_path: components_dir_path.into(),
            max_tag_name_length: DEFAULT_MAX_TAG_NAME_LENGTH,
            max_script_bytes: DEFAULT_MAX_SCRIPT_BYTES,
            translation: TranslationTable::default(),
        }
    }

    /// Parse a config document of the form `{"components": {"componentsDirPath": ...}}`
    pub fn from_json_str(json: &str) -> Result<Self, LoadError> {
        let file: ConfigFile = serde_json::from_str(json)?;
        Ok(file.components)
    }

    /// Read a config file. A relative components path resolves against the file's directory.
    pub fn from_file(path: &Path) -> Result<Self, LoadError> {
        let json = fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_json_str(&json)?;
        if config.components_dir_path.is_relative() {
            if let Some(parent) = path.parent() {
                config.components_dir_path = parent.join(&config.components_dir_path);
            }
        }
        Ok(config)
    }
}
