use super::{Pass, TranslateWarning, TranslationMetadata};
use crate::config::TranslationTable;
use crate::error::{ErrorKind, TranslateError};
use crate::scanner::{OffsetMap, Rewriter, call_block, extra_argument, find_call, invocation_end};
use tracing::debug;

/// Lifts the `::initialized(...)` block out of the script
pub struct LoadHandlerPass;

impl Pass for LoadHandlerPass {
    fn name(&self) -> &'static str {
        "load-handler"
    }

    fn run(
        &self,
        script: &str,
        table: &TranslationTable,
        metadata: &mut TranslationMetadata,
    ) -> Result<(String, OffsetMap), TranslateError> {
        let extracted = extract_load_handler(script, table)?;
        metadata.load_handler = extracted.handler;
        metadata
            .warnings
            .extend(std::iter::repeat_n(TranslateWarning::IgnoredLoadHandler, extracted.ignored));
        Ok((extracted.script, extracted.map))
    }
}

/// Outcome of load handler extraction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadHandlerExtraction {
    /// Script with the first load handler invocation removed
    pub script: String,
    /// Map from `script` back to the extractor's input
    pub map: OffsetMap,
    /// Trimmed body of that handler
    pub handler: Option<String>,
    /// Further load handler markers, left untouched in `script`
    pub ignored: usize,
}

/// Extract the first load handler. Later markers stay where they are and are counted.
pub fn extract_load_handler(script: &str, table: &TranslationTable) -> Result<LoadHandlerExtraction, TranslateError> {
    let marker = &table.load_handler_marker;
    let Some(call) = find_call(script, 0, marker, false) else {
        return Ok(LoadHandlerExtraction {
            script: script.to_string(),
            map: OffsetMap::identity(script.len()),
            handler: None,
            ignored: 0,
        });
    };

    let Some(block) = call_block(script, call)? else {
        return Err(TranslateError::new(
            ErrorKind::MalformedBlock,
            format!("`{}` has no inline handler block", marker),
        )
        .at(script, call.start)
        .with_help(format!("Write the handler inline: {}(() => {{ ... }})", marker)));
    };
    if let Some(extra) = extra_argument(script, block.end) {
        return Err(TranslateError::new(
            ErrorKind::MalformedBlock,
            format!("`{}` takes no arguments after its handler block", marker),
        )
        .at(script, extra)
        .with_help("Remove the trailing arguments; the handler block must be the last argument"));
    }
    let end = invocation_end(script, block.end);
    let handler = block.body(script).trim().to_string();
    debug!(len = handler.len(), "extracted load handler");

    let mut ignored = 0;
    let mut pos = end;
    while let Some(extra) = find_call(script, pos, marker, pos == end) {
        ignored += 1;
        pos = extra.paren;
    }

    let mut rewriter = Rewriter::new(script);
    rewriter.copy(0..call.start);
    rewriter.copy(end..script.len());
    let (output, map) = rewriter.finish();

    Ok(LoadHandlerExtraction {
        script: output,
        map,
        handler: Some(handler),
        ignored,
    })
}
