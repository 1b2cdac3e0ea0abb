//! Translator for component scripts written in the sugar dialect.
//!
//! A component script is a list of class members plus a little sugar:
//!
//! ```text
//! ::connected() { this.render(); }
//! addChangeListener("color", (previous, color) => { this.paint(color); })
//! ::initialized(() => { console.log("ready"); })
//! ```
//!
//! [`translate`] turns it into a plain custom element class body (lifecycle callbacks,
//! an `attributeChangedCallback` dispatcher, a static `observedAttributes` accessor) and
//! returns the `::initialized` body separately as the load handler.

pub mod component;
pub mod config;
pub mod error;
pub mod generate;
pub mod logging;
pub mod scanner;
pub mod transform;

pub use component::{Component, ComponentRequest, ComponentStore};
pub use config::{LifecycleMarker, LoaderConfig, TranslationTable};
pub use error::{ErrorKind, LoadError, TranslateError};
pub use transform::{AttributeListener, ListenerRegistry, Pass, Pipeline, TranslateWarning};

use lazy_static::lazy_static;
use serde::Serialize;

/// Configuration for translation.
#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    /// Sugar vocabulary (default: `::connected`, `addChangeListener`, `::initialized`, ...)
    pub table: TranslationTable,
    /// Scripts longer than this are rejected before scanning
    pub max_script_bytes: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            table: TranslationTable::default(),
            max_script_bytes: config::DEFAULT_MAX_SCRIPT_BYTES,
        }
    }
}

/// Translated script, as handed to the hydration client.
///
/// Serialized as `{"native": ..., "loadHandler": ...}`, the shape the client reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationResult {
    /// Class members to splice into the generated custom element class
    #[serde(rename = "native")]
    pub class_body: String,
    /// Statements to run once after the class is defined
    pub load_handler: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub observed_attributes: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<TranslateWarning>,
}

/// Reusable translator. Holds no per-translation state, so one instance can serve
/// any number of threads.
pub struct Translator {
    options: Options,
    pipeline: Pipeline,
}

impl Translator {
    pub fn new(options: Options) -> Result<Self, TranslateError> {
        options.table.validate()?;
        Ok(Self {
            options,
            pipeline: Pipeline::standard(),
        })
    }

    pub fn translate(&self, script: &str) -> Result<TranslationResult, TranslateError> {
        if script.len() > self.options.max_script_bytes {
            return Err(TranslateError::new(
                ErrorKind::InputTooLarge,
                format!(
                    "Script is {} bytes, the limit is {} bytes",
                    script.len(),
                    self.options.max_script_bytes
                ),
            )
            .with_help("Split the component or raise maxScriptBytes in the configuration"));
        }

        let (class_body, metadata) = self.pipeline.run(script, &self.options.table)?;

        Ok(TranslationResult {
            class_body,
            load_handler: metadata.load_handler,
            observed_attributes: metadata.listeners.observed_attributes(),
            warnings: metadata.warnings,
        })
    }
}

impl Default for Translator {
    fn default() -> Self {
        Self {
            options: Options::default(),
            pipeline: Pipeline::standard(),
        }
    }
}

lazy_static! {
    static ref DEFAULT_TRANSLATOR: Translator = Translator::default();
}

/// Translate with the default vocabulary and limits
pub fn translate(script: &str) -> Result<TranslationResult, TranslateError> {
    DEFAULT_TRANSLATOR.translate(script)
}

pub fn translate_with(script: &str, options: Options) -> Result<TranslationResult, TranslateError> {
    Translator::new(options)?.translate(script)
}
