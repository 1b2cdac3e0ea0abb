//! Hand-rolled scanning over component scripts.
//!
//! Nothing here parses JavaScript. The scanner only knows enough to find balanced
//! `{...}` blocks while stepping over string and template literals.

pub mod comments;
pub mod marker;
pub mod offsets;
pub mod positions;

pub use comments::{strip_comments, strip_comments_mapped};
pub use marker::{CallMarker, extra_argument, find_call, invocation_end};
pub use offsets::{OffsetMap, Rewriter};

use crate::error::{ErrorKind, TranslateError};

/// A balanced `{...}` block located in a script.
///
/// `start` is where the search began (usually the invocation head), `open` the opening
/// brace and `end` the offset just past the matching closing brace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    pub start: usize,
    pub open: usize,
    pub end: usize,
}

impl Block {
    /// Text from the search start through the closing brace
    pub fn text<'a>(&self, script: &'a str) -> &'a str {
        &script[self.start..self.end]
    }

    /// Text between the search start and the opening brace
    pub fn head<'a>(&self, script: &'a str) -> &'a str {
        &script[self.start..self.open]
    }

    /// Text between the braces
    pub fn body<'a>(&self, script: &'a str) -> &'a str {
        &script[self.open + 1..self.end - 1]
    }
}

/// Locate the first `{` at or after `start` and scan to its matching `}`.
///
/// Braces inside `'...'`, `"..."` and `` `...` `` literals are ignored, and a backslash
/// always escapes the following character. Running out of input before the block
/// balances is a `MalformedBlock` error.
pub fn extract_block(script: &str, start: usize) -> Result<Block, TranslateError> {
    let rest = script.get(start..).unwrap_or("");
    let Some(rel) = rest.find('{') else {
        return Err(TranslateError::new(ErrorKind::MalformedBlock, "Expected a `{` block")
            .at(script, start)
            .with_help("Sugar invocations must be followed by a function body in braces"));
    };

    let bytes = script.as_bytes();
    let open = start + rel;
    let mut depth = 1usize;
    let mut quote: Option<(u8, usize)> = None;
    let mut escaped = false;
    let mut i = open + 1;

    while i < bytes.len() {
        let b = bytes[i];
        i += 1;

        if escaped {
            escaped = false;
            continue;
        }

        match (quote, b) {
            (_, b'\\') => escaped = true,
            (Some((q, _)), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, b'"' | b'\'' | b'`') => quote = Some((b, i - 1)),
            (None, b'{') => depth += 1,
            (None, b'}') => {
                depth -= 1;
                if depth == 0 {
                    return Ok(Block { start, open, end: i });
                }
            }
            _ => {}
        }
    }

    Err(match quote {
        Some((q, at)) => TranslateError::new(
            ErrorKind::MalformedBlock,
            format!("Unterminated {} string literal inside block", q as char),
        )
        .at(script, at)
        .with_help(format!("Close the string with a matching {}", q as char)),
        None => TranslateError::new(ErrorKind::MalformedBlock, "Block is never closed")
            .at(script, open)
            .with_help(format!(
                "{} closing brace{} missing before end of script",
                depth,
                if depth == 1 { " is" } else { "s are" }
            )),
    })
}

/// Block holding the inline handler of a sugar call.
///
/// Walks the call's argument list from its `(` and takes the first block opened directly
/// in that list. Returns `None` when the call closes
/// (or the script ends) before any `{` opens, so a block further down the script is
/// never claimed by a call it does not belong to. The returned block starts at the
/// call marker.
pub fn call_block(script: &str, call: CallMarker) -> Result<Option<Block>, TranslateError> {
    let bytes = script.as_bytes();
    let mut depth = 0usize;
    let mut i = call.paren;

    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'"' | b'\'' | b'`' => i = skip_string(bytes, i),
            b'(' => {
                depth += 1;
                i += 1;
            }
            b')' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Ok(None);
                }
                i += 1;
            }
            b'{' => {
                let block = extract_block(script, i)?;
                if depth == 1 {
                    return Ok(Some(Block { start: call.start, ..block }));
                }
                // nested in another argument (destructuring, object literal)
                i = block.end;
            }
            _ => i += 1,
        }
    }

    Ok(None)
}

/// Offset just past the string literal opening at `start` (or the script end)
pub(crate) fn skip_string(bytes: &[u8], start: usize) -> usize {
    let quote = bytes[start];
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b if b == quote => return i + 1,
            _ => i += 1,
        }
    }
    bytes.len()
}
