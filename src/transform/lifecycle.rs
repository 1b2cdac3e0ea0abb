use super::{Pass, TranslationMetadata};
use crate::config::TranslationTable;
use crate::error::TranslateError;
use crate::scanner::{OffsetMap, Rewriter, find_call};

/// Rewrites `::connected(` style markers to the standard lifecycle callback names
pub struct LifecyclePass;

impl Pass for LifecyclePass {
    fn name(&self) -> &'static str {
        "lifecycle"
    }

    fn run(
        &self,
        script: &str,
        table: &TranslationTable,
        _metadata: &mut TranslationMetadata,
    ) -> Result<(String, OffsetMap), TranslateError> {
        Ok(rewrite_lifecycle_mapped(script, table))
    }
}

/// Replace every lifecycle marker call with its callback name.
///
/// Purely textual: whitespace before the marker is kept, whitespace between the marker
/// and `(` is dropped, and markers glued to a preceding identifier are left alone.
pub fn rewrite_lifecycle(script: &str, table: &TranslationTable) -> String {
    rewrite_lifecycle_mapped(script, table).0
}

/// [`rewrite_lifecycle`], also returning the map back to `script`
pub fn rewrite_lifecycle_mapped(script: &str, table: &TranslationTable) -> (String, OffsetMap) {
    let mut rewriter = Rewriter::new(script);
    let mut cursor = 0;

    loop {
        // Earliest marker of any entry, so one left-to-right sweep covers the table
        let next = table
            .lifecycle
            .iter()
            .filter_map(|entry| {
                find_call(script, cursor, &table.lifecycle_marker(entry), false).map(|call| (call, entry))
            })
            .min_by_key(|(call, _)| call.start);
        let Some((call, entry)) = next else {
            break;
        };

        rewriter.copy(cursor..call.start);
        rewriter.insert(&format!("{}(", entry.callback), call.start);
        cursor = call.paren + 1;
    }

    rewriter.copy(cursor..script.len());
    rewriter.finish()
}
