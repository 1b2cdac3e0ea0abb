//! Component loading.
//!
//! A component named `card` lives in `<componentsDirPath>/card/` as `_card.html`
//! (mandatory), `_card.css` and `_card.js` (both optional). Scripts are translated on
//! first load and the result is cached for the lifetime of the store.

use crate::config::LoaderConfig;
use crate::error::{LoadError, TranslateError};
use crate::{Options, TranslationResult, Translator};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info, warn};

lazy_static! {
    static ref COMPONENT_NAME: Regex = Regex::new(r"^[a-z0-9_-]+$").unwrap();
}

/// A loaded component, ready to hand to the hydration client
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Component {
    pub markup: String,
    pub style: Option<String>,
    pub script: Option<TranslationResult>,
}

/// Body of a component request: `{"components": ["card", "nav-bar"]}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ComponentRequest {
    #[serde(default)]
    pub components: Vec<String>,
}

impl ComponentRequest {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            components: names.into_iter().map(Into::into).collect(),
        }
    }
}

/// Lowercased, trimmed form under which a component is looked up
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Whether `name` is safe to use as a directory name under the components root
pub fn is_component_name(name: &str) -> bool {
    COMPONENT_NAME.is_match(name)
}

pub struct ComponentStore {
    config: LoaderConfig,
    translator: Translator,
    cache: RwLock<HashMap<String, Arc<Component>>>,
}

impl ComponentStore {
    pub fn new(config: LoaderConfig) -> Result<Self, TranslateError> {
        let translator = Translator::new(Options {
            table: config.translation.clone(),
            max_script_bytes: config.max_script_bytes,
        })?;
        Ok(Self {
            config,
            translator,
            cache: RwLock::new(HashMap::new()),
        })
    }

    /// `<dir>/<name>/_<name>.<extension>`
    pub fn part_path(&self, name: &str, extension: &str) -> PathBuf {
        self.config
            .components_dir_path
            .join(name)
            .join(format!("_{}.{}", name, extension))
    }

    /// Load one component by its normalized name.
    ///
    /// `Ok(None)` means the component does not exist: its markup file is missing or empty.
    pub fn load(&self, name: &str) -> Result<Option<Arc<Component>>, LoadError> {
        if let Some(hit) = self.cache.read().unwrap_or_else(PoisonError::into_inner).get(name) {
            debug!(component = name, "cache hit");
            return Ok(Some(Arc::clone(hit)));
        }

        let Some(component) = self.read_component(name)? else {
            return Ok(None);
        };

        // Another thread may have loaded it meanwhile; keep whichever landed first
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        let entry = cache.entry(name.to_string()).or_insert_with(|| Arc::new(component));
        Ok(Some(Arc::clone(entry)))
    }

    fn read_component(&self, name: &str) -> Result<Option<Component>, LoadError> {
        let Some(markup) = read_part(&self.part_path(name, "html"))? else {
            info!(component = name, "no markup found, skipping component");
            return Ok(None);
        };
        let style = read_part(&self.part_path(name, "css"))?;

        let script = match read_part(&self.part_path(name, "js"))? {
            Some(source) => {
                let result = self
                    .translator
                    .translate(&source)
                    .map_err(|error| LoadError::Translate {
                        component: name.to_string(),
                        error,
                    })?;
                for warning in &result.warnings {
                    warn!(component = name, "{}", warning);
                }
                Some(result)
            }
            None => None,
        };

        debug!(
            component = name,
            style = style.is_some(),
            script = script.is_some(),
            "loaded component"
        );
        Ok(Some(Component { markup, style, script }))
    }

    /// Resolve a request into the components that exist.
    ///
    /// Names are deduplicated, names longer than `maxTagNameLength` are dropped, and
    /// the rest are trimmed and lowercased. Components that are missing or fail to load
    /// are skipped. An empty request yields `None`.
    pub fn resolve(&self, request: &ComponentRequest) -> Option<BTreeMap<String, Arc<Component>>> {
        if request.components.is_empty() {
            return None;
        }

        let mut seen = HashSet::new();
        let mut resolved = BTreeMap::new();

        for raw in &request.components {
            if !seen.insert(raw.as_str()) {
                continue;
            }
            if raw.chars().count() > self.config.max_tag_name_length {
                debug!(len = raw.len(), "requested name too long, skipping");
                continue;
            }

            let name = normalize_name(raw);
            if !is_component_name(&name) {
                warn!(component = %raw, "invalid component name, skipping");
                continue;
            }
            if resolved.contains_key(&name) {
                continue;
            }

            match self.load(&name) {
                Ok(Some(component)) => {
                    resolved.insert(name, component);
                }
                Ok(None) => {}
                Err(err) => warn!(component = %name, error = %err, "failed to load component, skipping"),
            }
        }

        Some(resolved)
    }
}

/// Read an optional part. Missing and empty files both count as absent.
fn read_part(path: &Path) -> Result<Option<String>, LoadError> {
    match fs::read_to_string(path) {
        Ok(data) if data.is_empty() => Ok(None),
        Ok(data) => Ok(Some(data)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(LoadError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}
