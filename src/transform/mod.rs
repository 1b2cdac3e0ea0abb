mod lifecycle;
mod listeners;
mod load_handler;
mod metadata;

pub use lifecycle::{LifecyclePass, rewrite_lifecycle, rewrite_lifecycle_mapped};
pub use listeners::{ChangeListenerPass, ListenerExtraction, extract_listeners, rename_identifiers};
pub use load_handler::{LoadHandlerExtraction, LoadHandlerPass, extract_load_handler};
pub use metadata::{AttributeListener, ListenerRegistry, TranslateWarning, TranslationMetadata};

use crate::config::TranslationTable;
use crate::error::TranslateError;
use crate::scanner::{OffsetMap, strip_comments_mapped};
use tracing::trace;

/// One stage of the translation.
///
/// A pass maps the script produced by the previous stage to a new script, recording
/// anything it lifts out of the text in `metadata`. The returned map leads from the new
/// script back to the pass input; errors are positioned against the pass input.
pub trait Pass: Send + Sync {
    fn name(&self) -> &'static str;

    fn run(
        &self,
        script: &str,
        table: &TranslationTable,
        metadata: &mut TranslationMetadata,
    ) -> Result<(String, OffsetMap), TranslateError>;
}

/// Removes comments ahead of every other pass
pub struct StripCommentsPass;

impl Pass for StripCommentsPass {
    fn name(&self) -> &'static str {
        "strip-comments"
    }

    fn run(
        &self,
        script: &str,
        _table: &TranslationTable,
        _metadata: &mut TranslationMetadata,
    ) -> Result<(String, OffsetMap), TranslateError> {
        Ok(strip_comments_mapped(script))
    }
}

/// Ordered list of passes
pub struct Pipeline {
    passes: Vec<Box<dyn Pass>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self { passes: Vec::new() }
    }

    pub fn add<P: Pass + 'static>(mut self, pass: P) -> Self {
        self.passes.push(Box::new(pass));
        self
    }

    /// Comments, lifecycle markers, change listeners, load handler
    pub fn standard() -> Self {
        Pipeline::new()
            .add(StripCommentsPass)
            .add(LifecyclePass)
            .add(ChangeListenerPass)
            .add(LoadHandlerPass)
    }

    pub fn pass_names(&self) -> Vec<&'static str> {
        self.passes.iter().map(|pass| pass.name()).collect()
    }

    /// Run every pass in order over a fresh copy of `script`.
    ///
    /// The metadata is created here and handed back, so nothing carries over between runs.
    /// A failing pass has its error moved back through the maps of the passes before it,
    /// so positions and source lines point into `script` as written.
    pub fn run(
        &self,
        script: &str,
        table: &TranslationTable,
    ) -> Result<(String, TranslationMetadata), TranslateError> {
        let mut metadata = TranslationMetadata::new();
        let mut current = script.to_string();
        let mut maps: Vec<OffsetMap> = Vec::with_capacity(self.passes.len());

        for pass in &self.passes {
            let (output, map) = pass
                .run(&current, table, &mut metadata)
                .map_err(|err| locate_in_source(err, script, &maps))?;
            current = output;
            maps.push(map);
            trace!(pass = pass.name(), len = current.len(), "pass finished");
        }

        Ok((current, metadata))
    }
}

fn locate_in_source(err: TranslateError, source: &str, maps: &[OffsetMap]) -> TranslateError {
    let Some(position) = err.position else {
        return err;
    };
    let offset = maps.iter().rev().fold(position.byte, |offset, map| map.to_input(offset));
    err.at(source, offset)
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}
